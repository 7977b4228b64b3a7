use std::io::Write;

use tracing::{info, instrument};

use crate::configuration::Settings;
use crate::errors::PipelineError;
use crate::exporter::{export_to_csv, ExportSummary};
use crate::fetcher::{build_client, PageFetcher};
use crate::parser::ShopParser;
use crate::planner::number_of_pages;
use crate::telemetry::DiagnosticsSink;
use crate::types::Catalog;

/// Seed page, page count, every page at once, books, CSV.
pub struct Pipeline {
    settings: Settings,
    fetcher: PageFetcher,
    parser: Box<dyn ShopParser>,
}

impl Pipeline {
    pub fn new(settings: Settings, parser: Box<dyn ShopParser>) -> Result<Self, PipelineError> {
        let client = build_client(&settings.http).map_err(PipelineError::Client)?;
        let fetcher = PageFetcher::new(client, settings.shop.base_url.clone());

        Ok(Self {
            settings,
            fetcher,
            parser,
        })
    }

    /// All books of the catalog, in page order.
    ///
    /// Nothing is returned unless the count, every fetched page and every
    /// listing on them could be read. Under `CollectErrors` pages that could
    /// not be fetched are reported to `sink` and left out instead.
    #[instrument(level = "info", name = "Collecting books", skip_all)]
    pub async fn collect_books(&self, sink: &dyn DiagnosticsSink) -> Result<Catalog, PipelineError> {
        info!("Downloading first page to get total number of available books");
        let seed = self.fetcher.fetch_seed().await?;
        let number_of_books = self.parser.number_of_books(&seed)?;

        info!(number_of_books, "Calculating total number of pages to download");
        let pages = number_of_pages(number_of_books, &self.settings.shop);

        info!(pages, "Downloading all pages concurrently");
        let report = self
            .fetcher
            .fetch_all(
                pages,
                self.settings.http.max_concurrent_fetches,
                self.settings.http.fetch_policy,
            )
            .await?;
        for failure in &report.failures {
            sink.page_dropped(failure);
        }

        info!("Getting books data");
        let mut books = Catalog::new();
        for page in &report.pages {
            let page_books = self
                .parser
                .books(page)
                .map_err(|source| PipelineError::Extraction {
                    page: page.page,
                    source,
                })?;
            books.extend(page_books);
        }

        Ok(books)
    }

    /// Runs the whole crawl and writes the CSV to `out`. `out` is untouched on failure.
    pub async fn run<W: Write>(
        &self,
        out: W,
        sink: &dyn DiagnosticsSink,
    ) -> Result<ExportSummary, PipelineError> {
        let books = self.collect_books(sink).await?;
        export_to_csv(&books, out, sink).map_err(PipelineError::Export)
    }
}
