use tracing::error;
use tracing::subscriber::{set_global_default, SetGlobalDefaultError};
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::Registry;
use tracing_subscriber::{prelude::*, EnvFilter};

use crate::configuration::{LogFormat, TelemetrySettings};
use crate::errors::{ExportRowError, PageFetchError};
use crate::types::BookRecord;

/// Logs go to stderr. Stdout is reserved for the CSV output.
pub fn init_telemetry(settings: &TelemetrySettings) -> Result<(), SetGlobalDefaultError> {
    // Level filter layer to filter traces based on level (trace, debug, info, warn, error).
    let level_filter_layer =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match settings.format {
        LogFormat::Pretty => {
            let formatting_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false);
            let subscriber = Registry::default()
                .with(level_filter_layer)
                .with(formatting_layer);
            set_global_default(subscriber)
        }
        LogFormat::Bunyan => {
            let formatting_layer =
                BunyanFormattingLayer::new(settings.service_name.clone(), std::io::stderr);
            let subscriber = Registry::default()
                .with(level_filter_layer)
                .with(JsonStorageLayer)
                .with(formatting_layer);
            set_global_default(subscriber)
        }
    }
}

/// Where the pipeline reports problems it recovers from.
pub trait DiagnosticsSink: Send + Sync {
    fn record_skipped(&self, record: &BookRecord, error: &ExportRowError);

    fn page_dropped(&self, error: &PageFetchError);
}

/// Forwards diagnostics to the installed tracing subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticsSink for TracingSink {
    fn record_skipped(&self, record: &BookRecord, error: &ExportRowError) {
        let book = serde_json::to_string(record).unwrap_or_else(|_| format!("{:?}", record));
        error!(%book, %error, "Error with book, row skipped");
    }

    fn page_dropped(&self, error: &PageFetchError) {
        error!(page = error.page, cause = %error.cause, "Page dropped from the batch");
    }
}
