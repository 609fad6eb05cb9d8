use crate::domain::model::{PageResponse, TenderQuery};
use crate::domain::ports::PageTransport;
use crate::utils::error::Result;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// `PageTransport` over the public tender listing endpoint.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl PageTransport for HttpTransport {
    async fn get_page(&self, query: &TenderQuery) -> Result<PageResponse> {
        tracing::debug!("Making API request to: {}", self.endpoint);

        let response = self
            .client
            .get(&self.endpoint)
            .query(&query.to_params())
            .send()
            .await?;

        let status = response.status().as_u16();
        tracing::debug!("API response status: {}", status);

        let body = response.text().await?;
        Ok(PageResponse { status, body })
    }
}
