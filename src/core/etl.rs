use crate::core::Pipeline;
use crate::utils::error::Result;

pub struct EtlEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> EtlEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    /// Runs extract, transform and load in order. Returns the written file
    /// paths, or `None` when the source had no tenders.
    pub async fn run(&self) -> Result<Option<Vec<String>>> {
        tracing::info!("Starting ETL process...");

        // Extract
        let tenders = self.pipeline.extract().await?;
        tracing::info!("Extracted {} tenders", tenders.len());

        if tenders.is_empty() {
            return Ok(None);
        }

        // Transform
        let Some(result) = self.pipeline.transform(tenders).await? else {
            return Ok(None);
        };
        tracing::info!(
            "Aggregated {} tenders into {} categories",
            result.tender_count(),
            result.summary.len()
        );

        // Load
        let written = self.pipeline.load(result).await?;
        for path in &written {
            tracing::info!("Output saved to: {}", path);
        }

        Ok(Some(written))
    }
}
