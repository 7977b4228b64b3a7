pub mod configuration;
pub mod errors;
pub mod exporter;
pub mod fetcher;
pub mod parser;
pub mod pipeline;
pub mod planner;
pub mod telemetry;
pub mod types;
