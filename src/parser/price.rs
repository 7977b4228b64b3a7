use std::sync::OnceLock;

use scraper::node::Node;
use scraper::{ElementRef, Selector};

use crate::errors::PriceParseError;
use crate::types::PriceInfo;

fn badge_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("div.box-dcto").unwrap())
}

fn price_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| Selector::parse("h5.precio-antes").unwrap())
}

/// Reads the discount badge and the crossed-out price of one listing block.
///
/// An empty badge means the book is sold at list price, in which case the
/// crossed-out price is not looked at.
pub fn price_info(block: ElementRef) -> Result<PriceInfo, PriceParseError> {
    let badge = block
        .select(badge_selector())
        .next()
        .ok_or(PriceParseError::MissingBadge)?;
    let badge_text = badge.text().collect::<String>();
    let badge_text = badge_text.trim();

    if badge_text.is_empty() {
        return Ok(PriceInfo::NoDiscount);
    }

    let percentage = parse_percentage(badge_text)?;

    let price = block
        .select(price_selector())
        .next()
        .ok_or(PriceParseError::MissingPrice)?;
    let original = parse_original_price(&first_child_text(price))?;

    Ok(PriceInfo::discounted(percentage, original))
}

/// `"35%"` -> 35
pub fn parse_percentage(text: &str) -> Result<u32, PriceParseError> {
    let digits = text.split('%').next().unwrap_or_default().trim();
    let percentage = digits
        .parse::<u32>()
        .map_err(|_| PriceParseError::InvalidPercentage(text.to_string()))?;

    if percentage > 100 {
        return Err(PriceParseError::PercentageOutOfRange(percentage));
    }
    Ok(percentage)
}

/// `"$ 12.990"` -> 12990
pub fn parse_original_price(text: &str) -> Result<u64, PriceParseError> {
    let amount = text
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| PriceParseError::InvalidPrice(text.trim().to_string()))?;

    amount
        .replace('.', "")
        .parse::<u64>()
        .map_err(|_| PriceParseError::InvalidPrice(text.trim().to_string()))
}

// The price element may carry extra markup after the amount; only the first node counts.
fn first_child_text(element: ElementRef) -> String {
    match element.children().next() {
        Some(child) => match child.value() {
            Node::Text(text) => String::from(&**text),
            Node::Element(_) => ElementRef::wrap(child)
                .map(|e| e.text().collect::<String>())
                .unwrap_or_default(),
            _ => String::new(),
        },
        None => String::new(),
    }
}
