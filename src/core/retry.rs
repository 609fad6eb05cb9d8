use std::future::Future;
use std::time::Duration;

/// What a single attempt produced.
#[derive(Debug)]
pub enum Attempt<T> {
    Success(T),
    RateLimited,
    Failed(String),
}

#[derive(Debug)]
pub enum RetryOutcome<T> {
    Success(T),
    Exhausted { attempts: usize },
}

/// Bounded retry with a fixed delay per failure kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: usize,
    pub rate_limit_delay: Duration,
    pub error_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            rate_limit_delay: Duration::from_secs(10),
            error_delay: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn delay_for<T>(&self, attempt: &Attempt<T>) -> Duration {
        match attempt {
            Attempt::Success(_) => Duration::ZERO,
            Attempt::RateLimited => self.rate_limit_delay,
            Attempt::Failed(_) => self.error_delay,
        }
    }

    /// Calls `op` with the 1-based attempt number until it succeeds or the
    /// attempt budget is spent. No delay follows the final failure.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> RetryOutcome<T>
    where
        F: FnMut(usize) -> Fut,
        Fut: Future<Output = Attempt<T>>,
    {
        for attempt in 1..=self.max_attempts {
            let result = op(attempt).await;
            let delay = self.delay_for(&result);

            match result {
                Attempt::Success(value) => return RetryOutcome::Success(value),
                Attempt::RateLimited => {
                    tracing::debug!("Attempt {}/{} rate limited", attempt, self.max_attempts);
                }
                Attempt::Failed(reason) => {
                    tracing::debug!(
                        "Attempt {}/{} failed: {}",
                        attempt,
                        self.max_attempts,
                        reason
                    );
                }
            }

            if attempt < self.max_attempts {
                tokio::time::sleep(delay).await;
            }
        }

        RetryOutcome::Exhausted {
            attempts: self.max_attempts,
        }
    }
}
