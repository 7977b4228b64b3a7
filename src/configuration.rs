use std::path::Path;

pub const BASE_URL: &str = "https://www.buscalibre.cl/libros-envio-express-chile_t.html";
pub const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_14_4) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/75.0.3770.100 Safari/537.36";
pub const HTTP_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Settings {
    pub shop: ShopSettings,
    pub http: HttpSettings,
    pub telemetry: TelemetrySettings,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct ShopSettings {
    pub base_url: String,
    pub items_per_row: u64,
    pub rows_per_page: u64,
    /// Extra pages fetched on top of the estimate.
    pub page_margin: u64,
}

impl ShopSettings {
    pub fn page_capacity(&self) -> u64 {
        self.items_per_row * self.rows_per_page
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// 0 lifts the limit.
    pub max_concurrent_fetches: usize,
    pub fetch_policy: FetchPolicy,
}

/// What to do when one page of the batch cannot be fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchPolicy {
    /// Abort the whole batch on the first failed page.
    FailFast,
    /// Keep the pages that arrived and report the others.
    CollectErrors,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct TelemetrySettings {
    pub format: LogFormat,
    pub service_name: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Pretty,
    Bunyan,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shop: ShopSettings {
                base_url: BASE_URL.to_string(),
                items_per_row: 7,
                rows_per_page: 21,
                page_margin: 10,
            },
            http: HttpSettings {
                timeout_secs: HTTP_TIMEOUT_SECS,
                user_agent: USER_AGENT.to_string(),
                max_concurrent_fetches: 32,
                fetch_policy: FetchPolicy::FailFast,
            },
            telemetry: TelemetrySettings {
                format: LogFormat::Pretty,
                service_name: env!("CARGO_PKG_NAME").to_string(),
            },
        }
    }
}

/// Defaults, then `configuration.*` in the working directory (or `path`), then
/// `SHELOB__SECTION__KEY` environment variables.
pub fn get_configuration(path: Option<&Path>) -> Result<Settings, config::ConfigError> {
    let defaults = Settings::default();

    let file = match path {
        Some(path) => config::File::from(path).required(true),
        None => config::File::with_name("configuration").required(false),
    };

    let settings = config::Config::builder()
        .set_default("shop.base_url", defaults.shop.base_url)?
        .set_default("shop.items_per_row", defaults.shop.items_per_row as i64)?
        .set_default("shop.rows_per_page", defaults.shop.rows_per_page as i64)?
        .set_default("shop.page_margin", defaults.shop.page_margin as i64)?
        .set_default("http.timeout_secs", defaults.http.timeout_secs as i64)?
        .set_default("http.user_agent", defaults.http.user_agent)?
        .set_default(
            "http.max_concurrent_fetches",
            defaults.http.max_concurrent_fetches as i64,
        )?
        .set_default("http.fetch_policy", "fail_fast")?
        .set_default("telemetry.format", "pretty")?
        .set_default("telemetry.service_name", defaults.telemetry.service_name)?
        .add_source(file)
        .add_source(
            config::Environment::with_prefix("SHELOB")
                .prefix_separator("__")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize()
}
