use std::sync::OnceLock;

use regex::Regex;
use scraper::{ElementRef, Selector};
use tracing::{debug, instrument};

use crate::errors::{CountExtractionError, ExtractionError};
use crate::parser::price::price_info;
use crate::parser::ShopParser;
use crate::types::{BookRecord, ListingPage};

// Element children of a listing's inner container. The markup has no names for
// these, so a layout change on the shop breaks extraction here and only here.
const LINK_POSITION: usize = 0;
const TITLE_POSITION: usize = 1;
const AUTHOR_POSITION: usize = 2;

fn count_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse(".cantidadProductos").unwrap())
}

fn block_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("div.producto").unwrap())
}

fn count_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"Encontramos\s+([\d.]+)\s+resultados").unwrap())
}

/// buscalibre.cl listing pages.
#[derive(Debug, Default)]
pub struct BuscalibreParser;

impl ShopParser for BuscalibreParser {
    fn number_of_books(&self, page: &ListingPage) -> Result<u64, CountExtractionError> {
        let marker = page
            .document
            .select(count_selector())
            .next()
            .ok_or(CountExtractionError::MissingMarker)?;

        parse_count(&marker.text().collect::<String>())
    }

    #[instrument(level = "debug", name = "Extracting books", skip_all, fields(page = page.page))]
    fn books(&self, page: &ListingPage) -> Result<Vec<BookRecord>, ExtractionError> {
        let books = page
            .document
            .select(block_selector())
            .map(book_from_block)
            .collect::<Result<Vec<_>, _>>()?;

        debug!("{} books found", books.len());
        Ok(books)
    }
}

/// `"Encontramos 1.500 resultados"` -> 1500
pub fn parse_count(text: &str) -> Result<u64, CountExtractionError> {
    let captures = count_regex()
        .captures(text)
        .ok_or_else(|| CountExtractionError::UnexpectedText(text.trim().to_string()))?;
    let number = &captures[1];

    number
        .replace('.', "")
        .parse::<u64>()
        .map_err(|source| CountExtractionError::InvalidNumber {
            text: number.to_string(),
            source,
        })
}

fn book_from_block(block: ElementRef) -> Result<BookRecord, ExtractionError> {
    let container = block
        .children()
        .find_map(ElementRef::wrap)
        .ok_or(ExtractionError::MissingContainer)?;
    let fields: Vec<ElementRef> = container.children().filter_map(ElementRef::wrap).collect();

    let title = field_text(&fields, TITLE_POSITION, "title")?;
    let author = field_text(&fields, AUTHOR_POSITION, "author")?;
    let price = price_info(block)?;
    let url = book_url(container, &fields)?;

    Ok(BookRecord {
        title,
        author,
        price,
        url,
    })
}

fn field_text(
    fields: &[ElementRef],
    index: usize,
    field: &'static str,
) -> Result<String, ExtractionError> {
    fields
        .get(index)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .ok_or(ExtractionError::MissingField { field, index })
}

// The container is usually the anchor itself; older markup nests it as the first child.
fn book_url(container: ElementRef, fields: &[ElementRef]) -> Result<String, ExtractionError> {
    container
        .value()
        .attr("href")
        .or_else(|| {
            fields
                .get(LINK_POSITION)
                .and_then(|link| link.value().attr("href"))
        })
        .map(String::from)
        .ok_or(ExtractionError::MissingUrl)
}
