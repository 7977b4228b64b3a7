// A fetched page goes through the parser once and yields the books it lists.
use scraper::Html;
use serde::Serialize;

/// One results page, parsed. `page` is 0 for the seed request.
#[derive(Debug)]
pub struct ListingPage {
    pub page: u64,
    pub document: Html,
}

impl ListingPage {
    pub fn parse(page: u64, body: &str) -> Self {
        Self {
            page,
            document: Html::parse_document(body),
        }
    }
}

/// Price breakdown of a listing, in whole currency units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PriceInfo {
    NoDiscount,
    Discounted {
        /// Whole percent, 0..=100.
        percentage: u32,
        discount: u64,
        original: u64,
        with_discount: u64,
    },
}

impl PriceInfo {
    /// Truncates the discount toward zero, so `with_discount` keeps the odd unit.
    pub fn discounted(percentage: u32, original: u64) -> Self {
        let discount = discount_for(original, percentage);
        PriceInfo::Discounted {
            percentage,
            discount,
            original,
            with_discount: original - discount,
        }
    }

    /// Discount as a fraction in `[0, 1]`. Zero when there is no discount.
    pub fn discount_percentage(&self) -> f64 {
        match self {
            PriceInfo::NoDiscount => 0.0,
            PriceInfo::Discounted { percentage, .. } => f64::from(*percentage) / 100.0,
        }
    }
}

pub(crate) fn discount_for(original: u64, percentage: u32) -> u64 {
    // Never larger than `original` for percentage <= 100
    (u128::from(original) * u128::from(percentage) / 100) as u64
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookRecord {
    pub title: String,
    pub author: String,
    pub price: PriceInfo,
    /// As found in the markup, possibly relative.
    pub url: String,
}

/// All records of a run, flattened in page order.
pub type Catalog = Vec<BookRecord>;
