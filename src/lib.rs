pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::http::HttpTransport;
pub use config::{cli::LocalStorage, AppConfig};
pub use crate::core::{etl::EtlEngine, fetcher::TenderFetcher, pipeline::TenderPipeline};
pub use utils::error::{EtlError, Result};
