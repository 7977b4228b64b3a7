use thiserror::Error;

/// The seed page did not tell us how many books there are.
#[derive(Debug, Error)]
pub enum CountExtractionError {
    #[error("product count marker not found")]
    MissingMarker,

    #[error("unexpected product count text: {0:?}")]
    UnexpectedText(String),

    #[error("invalid product count {text:?}")]
    InvalidNumber {
        text: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Why a single page could not be fetched.
#[derive(Debug, Error)]
pub enum FetchCause {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("invalid page url: {0}")]
    Url(String),
}

#[derive(Debug, Error)]
#[error("failed to fetch page {page}")]
pub struct PageFetchError {
    /// 0 stands for the seed page.
    pub page: u64,
    #[source]
    pub cause: FetchCause,
}

#[derive(Debug, Error)]
pub enum PriceParseError {
    #[error("discount badge not found")]
    MissingBadge,

    #[error("pre-discount price not found")]
    MissingPrice,

    #[error("invalid discount badge {0:?}")]
    InvalidPercentage(String),

    #[error("discount of {0}% is above 100%")]
    PercentageOutOfRange(u32),

    #[error("invalid pre-discount price {0:?}")]
    InvalidPrice(String),
}

/// A listing block does not have the shape we expect.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("listing block has no inner container")]
    MissingContainer,

    #[error("listing block has no {field} at position {index}")]
    MissingField { field: &'static str, index: usize },

    #[error("listing block has no link")]
    MissingUrl,

    #[error(transparent)]
    Price(#[from] PriceParseError),
}

/// A record that cannot become a CSV row. Recovered by skipping the row.
#[derive(Debug, Error)]
pub enum ExportRowError {
    #[error("inconsistent price breakdown: {0}")]
    InconsistentPrice(String),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to build http client")]
    Client(#[source] reqwest::Error),

    #[error("failed to get total number of available books")]
    Count(#[from] CountExtractionError),

    #[error(transparent)]
    Fetch(#[from] PageFetchError),

    #[error("failed to extract books from page {page}")]
    Extraction {
        page: u64,
        #[source]
        source: ExtractionError,
    },

    #[error("failed to write csv output")]
    Export(#[source] csv::Error),
}
