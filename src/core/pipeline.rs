use crate::adapters::http::HttpTransport;
use crate::core::aggregator;
use crate::core::fetcher::{FetchSettings, TenderFetcher};
use crate::core::report;
use crate::core::{ConfigProvider, PageTransport, Pipeline, Storage, Tender, TransformResult};
use crate::utils::error::Result;
use std::path::Path;

/// Fetches a buyer's tenders for one year, aggregates them by category and
/// writes both tables as CSV.
pub struct TenderPipeline<S: Storage, C: ConfigProvider, T: PageTransport = HttpTransport> {
    storage: S,
    config: C,
    fetcher: TenderFetcher<T>,
}

impl<S: Storage, C: ConfigProvider> TenderPipeline<S, C, HttpTransport> {
    pub fn new(storage: S, config: C) -> Result<Self> {
        let transport = HttpTransport::new(config.api_endpoint(), config.request_timeout())?;
        Ok(Self::with_transport(storage, config, transport))
    }
}

impl<S: Storage, C: ConfigProvider, T: PageTransport> TenderPipeline<S, C, T> {
    pub fn with_transport(storage: S, config: C, transport: T) -> Self {
        let settings = FetchSettings {
            page_limit: config.page_limit(),
            page_delay: config.page_delay(),
            retry: config.retry_policy(),
        };
        Self {
            storage,
            config,
            fetcher: TenderFetcher::new(transport, settings),
        }
    }
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider, T: PageTransport> Pipeline for TenderPipeline<S, C, T> {
    async fn extract(&self) -> Result<Vec<Tender>> {
        self.fetcher
            .fetch(self.config.edrpou(), self.config.year())
            .await
    }

    async fn transform(&self, tenders: Vec<Tender>) -> Result<Option<TransformResult>> {
        let result = aggregator::analyze(&tenders)?;

        if let Some(result) = &result {
            println!(
                "{}",
                report::render_report(result, self.config.edrpou(), self.config.year())
            );
        }

        Ok(result)
    }

    async fn load(&self, result: TransformResult) -> Result<Vec<String>> {
        let edrpou = self.config.edrpou();
        let year = self.config.year();

        let tenders_name = report::tenders_file_name(edrpou, year);
        let summary_name = report::summary_file_name(edrpou, year);

        let tenders_data = report::tenders_csv(&result.rows)?;
        tracing::debug!("Writing {} ({} bytes)", tenders_name, tenders_data.len());
        self.storage.write_file(&tenders_name, &tenders_data).await?;

        let summary_data = report::summary_csv(&result.summary)?;
        tracing::debug!("Writing {} ({} bytes)", summary_name, summary_data.len());
        self.storage.write_file(&summary_name, &summary_data).await?;

        let written = vec![tenders_name, summary_name];
        println!("{}", report::render_saved_files(&written));

        Ok(written
            .iter()
            .map(|name| {
                Path::new(self.config.output_path())
                    .join(name)
                    .to_string_lossy()
                    .into_owned()
            })
            .collect())
    }
}
