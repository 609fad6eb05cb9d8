pub mod aggregator;
pub mod etl;
pub mod fetcher;
pub mod pipeline;
pub mod report;
pub mod retry;

pub use crate::domain::model::{Tender, TransformResult};
pub use crate::domain::ports::{ConfigProvider, PageTransport, Pipeline, Storage};
pub use crate::utils::error::Result;
