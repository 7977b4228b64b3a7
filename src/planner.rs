use crate::configuration::ShopSettings;

/// How many pages to request for `total` books.
///
/// The margin deliberately over-fetches: trailing pages may come back empty,
/// which the parser tolerates.
pub fn number_of_pages(total: u64, shop: &ShopSettings) -> u64 {
    // A zero capacity would only come from a broken config; treat it as one book per page.
    let capacity = shop.page_capacity().max(1);
    total / capacity + shop.page_margin
}
