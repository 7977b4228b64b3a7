use crate::errors::{CountExtractionError, ExtractionError};
use crate::types::{BookRecord, ListingPage};

/// Knows how one shop lays out its listing pages.
pub trait ShopParser: Send + Sync {
    /// Total number of books the shop reports for the current query.
    fn number_of_books(&self, page: &ListingPage) -> Result<u64, CountExtractionError>;

    /// Books listed on `page`. A page past the end of the catalog yields no books.
    fn books(&self, page: &ListingPage) -> Result<Vec<BookRecord>, ExtractionError>;
}
