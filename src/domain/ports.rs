use crate::core::retry::RetryPolicy;
use crate::domain::model::{PageResponse, Tender, TenderQuery, TransformResult};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn output_path(&self) -> &str;
    fn edrpou(&self) -> &str;
    fn year(&self) -> i32;
    fn request_timeout(&self) -> Duration;
    fn page_limit(&self) -> u64;
    fn page_delay(&self) -> Duration;
    fn retry_policy(&self) -> RetryPolicy;
}

/// Issues one GET against the tender listing.
///
/// Implementations report every HTTP status as a `PageResponse`; only
/// transport failures (connect, timeout, body read) come back as `Err`.
#[async_trait]
pub trait PageTransport: Send + Sync {
    async fn get_page(&self, query: &TenderQuery) -> Result<PageResponse>;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Tender>>;
    async fn transform(&self, tenders: Vec<Tender>) -> Result<Option<TransformResult>>;
    async fn load(&self, result: TransformResult) -> Result<Vec<String>>;
}
