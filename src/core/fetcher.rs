use crate::core::retry::{Attempt, RetryOutcome, RetryPolicy};
use crate::domain::model::{PageResponse, Tender, TenderPage, TenderQuery};
use crate::domain::ports::PageTransport;
use crate::utils::error::Result;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct FetchSettings {
    pub page_limit: u64,
    pub page_delay: Duration,
    pub retry: RetryPolicy,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            page_limit: 10_000_000,
            page_delay: Duration::from_millis(500),
            retry: RetryPolicy::default(),
        }
    }
}

/// Drains the paginated tender listing for one buyer and year.
pub struct TenderFetcher<T: PageTransport> {
    transport: T,
    settings: FetchSettings,
}

impl<T: PageTransport> TenderFetcher<T> {
    pub fn new(transport: T, settings: FetchSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    /// Returns every tender modified during `year` for the buyer, in server
    /// order. A page that keeps failing ends pagination early and whatever
    /// was collected so far is returned. Only an undecodable 200 body is an
    /// error.
    pub async fn fetch(&self, edrpou: &str, year: i32) -> Result<Vec<Tender>> {
        let mut query = TenderQuery::for_year(edrpou, year, self.settings.page_limit)?;
        let mut tenders: Vec<Tender> = Vec::new();
        let mut page_number = 0usize;

        tracing::info!(
            "🚀 Починаємо завантаження тендерів за {} рік для ЄДРПОУ {}...",
            year,
            edrpou
        );

        loop {
            page_number += 1;
            let current = &query;

            let response = match self
                .settings
                .retry
                .run(move |attempt| self.request_page(current, page_number, attempt))
                .await
            {
                RetryOutcome::Success(response) => response,
                RetryOutcome::Exhausted { attempts } => {
                    tracing::error!(
                        "❌ Не вдалося отримати сторінку {} після {} спроб",
                        page_number,
                        attempts
                    );
                    break;
                }
            };

            let page: TenderPage = serde_json::from_str(&response.body)?;
            let (batch, next_offset) = page.into_batch();

            if batch.is_empty() {
                tracing::debug!("Page {} is empty, no more data", page_number);
                break;
            }

            let batch_len = batch.len();
            tenders.extend(batch);
            tracing::info!(
                "📥 Сторінка {}: отримано {} тендерів, всього: {}",
                page_number,
                batch_len,
                tenders.len()
            );

            match next_offset {
                Some(offset) => query.offset = Some(offset),
                None => break,
            }

            tokio::time::sleep(self.settings.page_delay).await;
        }

        tracing::info!("✅ Завершено! Всього отримано {} тендерів.", tenders.len());
        Ok(tenders)
    }

    async fn request_page(
        &self,
        query: &TenderQuery,
        page_number: usize,
        attempt: usize,
    ) -> Attempt<PageResponse> {
        tracing::debug!(
            "Requesting page {} (attempt {}/{}), offset: {:?}",
            page_number,
            attempt,
            self.settings.retry.max_attempts,
            query.offset
        );

        match self.transport.get_page(query).await {
            Ok(response) if response.status == 200 => Attempt::Success(response),
            Ok(response) if response.status == 429 => {
                tracing::warn!(
                    "⏳ Обмеження швидкості, чекаємо {:?}...",
                    self.settings.retry.rate_limit_delay
                );
                Attempt::RateLimited
            }
            Ok(response) => {
                tracing::warn!("⚠️ Помилка {}: {}", response.status, response.body);
                Attempt::Failed(format!("HTTP {}", response.status))
            }
            Err(e) => {
                tracing::warn!("⚠️ Запит не вдався: {}", e);
                Attempt::Failed(e.to_string())
            }
        }
    }
}
