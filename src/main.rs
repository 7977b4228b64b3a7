use std::path::PathBuf;

use argh::FromArgs;
use color_eyre::Report;
use shelob::configuration::{get_configuration, FetchPolicy};
use shelob::parser::BuscalibreParser;
use shelob::pipeline::Pipeline;
use shelob::telemetry::{init_telemetry, TracingSink};
use tracing::info;

#[derive(FromArgs)]
/// Crawl the buscalibre.cl catalog and print its books as CSV on stdout.
struct AppParams {
    /// configuration file, ./configuration.* when missing
    #[argh(option)]
    config: Option<PathBuf>,

    /// max pages fetched at the same time, 0 for no limit
    #[argh(option)]
    concurrency: Option<usize>,

    /// export the pages that could be fetched instead of failing the run
    #[argh(switch)]
    keep_going: bool,
}

#[tokio::main]
async fn main() -> Result<(), Report> {
    setup()?;

    // Argument parsing
    let up: AppParams = argh::from_env();

    // Read configuration
    let mut settings = get_configuration(up.config.as_deref())?;
    if let Some(concurrency) = up.concurrency {
        settings.http.max_concurrent_fetches = concurrency;
    }
    if up.keep_going {
        settings.http.fetch_policy = FetchPolicy::CollectErrors;
    }

    init_telemetry(&settings.telemetry)?;

    let pipeline = Pipeline::new(settings, Box::new(BuscalibreParser))?;
    let summary = pipeline.run(std::io::stdout(), &TracingSink).await?;
    info!(
        written = summary.written,
        skipped = summary.skipped,
        "Done"
    );

    Ok(())
}

fn setup() -> Result<(), Report> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "1")
    }
    color_eyre::install()?;

    Ok(())
}
