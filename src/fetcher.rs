use std::time::Duration;

use futures::stream::{self, StreamExt, TryStreamExt};
use reqwest::{Client, Url};
use tracing::{debug, instrument, warn};

use crate::configuration::{FetchPolicy, HttpSettings};
use crate::errors::{FetchCause, PageFetchError};
use crate::types::ListingPage;

/// One client for the whole run; reqwest pools connections across concurrent requests.
pub fn build_client(http: &HttpSettings) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(http.user_agent.as_str())
        .timeout(Duration::from_secs(http.timeout_secs))
        .build()
}

/// Pages that made it, and with `CollectErrors`, the ones that did not.
#[derive(Debug, Default)]
pub struct FetchReport {
    pub pages: Vec<ListingPage>,
    pub failures: Vec<PageFetchError>,
}

#[derive(Debug, Clone)]
pub struct PageFetcher {
    client: Client,
    base_url: String,
}

impl PageFetcher {
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// `base_url` with `page=<n>` appended to its query.
    pub fn page_url(&self, page: u64) -> Result<Url, FetchCause> {
        let mut url = self.seed_url()?;
        url.query_pairs_mut()
            .append_pair("page", &page.to_string());
        Ok(url)
    }

    fn seed_url(&self) -> Result<Url, FetchCause> {
        Url::parse(&self.base_url).map_err(|e| FetchCause::Url(format!("{}: {}", self.base_url, e)))
    }

    /// The bare base URL, reported as page 0.
    pub async fn fetch_seed(&self) -> Result<ListingPage, PageFetchError> {
        let url = self
            .seed_url()
            .map_err(|cause| PageFetchError { page: 0, cause })?;
        self.get(0, url).await
    }

    pub async fn fetch_page(&self, page: u64) -> Result<ListingPage, PageFetchError> {
        let url = self
            .page_url(page)
            .map_err(|cause| PageFetchError { page, cause })?;
        self.get(page, url).await
    }

    #[instrument(level = "debug", name = "Fetching page", skip(self, url))]
    async fn get(&self, page: u64, url: Url) -> Result<ListingPage, PageFetchError> {
        debug!("GET {}", url);

        let body = async {
            let response = self.client.get(url).send().await?.error_for_status()?;
            response.text().await
        }
        .await
        .map_err(|e| PageFetchError {
            page,
            cause: FetchCause::Http(e),
        })?;

        Ok(ListingPage::parse(page, &body))
    }

    /// Fetches pages `1..=count` with at most `max_concurrent` requests in flight
    /// (0 for no limit). Pages come back in page order whatever order they arrive in.
    ///
    /// With `FailFast` the first failed page, in page order, is returned and the
    /// requests still in flight are dropped.
    pub async fn fetch_all(
        &self,
        count: u64,
        max_concurrent: usize,
        policy: FetchPolicy,
    ) -> Result<FetchReport, PageFetchError> {
        let limit = match max_concurrent {
            0 => usize::try_from(count).unwrap_or(usize::MAX).max(1),
            n => n,
        };

        let requests = stream::iter(1..=count)
            .map(|page| self.fetch_page(page))
            .buffered(limit);

        match policy {
            FetchPolicy::FailFast => {
                let pages = requests.try_collect::<Vec<_>>().await?;
                Ok(FetchReport {
                    pages,
                    failures: Vec::new(),
                })
            }
            FetchPolicy::CollectErrors => {
                let mut report = FetchReport::default();
                let results = requests.collect::<Vec<_>>().await;
                for result in results {
                    match result {
                        Ok(page) => report.pages.push(page),
                        Err(e) => {
                            warn!(page = e.page, "Skipping page: {}", e.cause);
                            report.failures.push(e);
                        }
                    }
                }
                Ok(report)
            }
        }
    }
}
