mod buscalibre;
mod parser;
pub mod price;

pub use buscalibre::BuscalibreParser;
pub use parser::ShopParser;
