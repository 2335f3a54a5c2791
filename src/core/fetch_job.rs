use crate::core::deadline::Deadline;
use crate::domain::model::{FetchOutcome, FetchRequest, IndustryCountryPair};
use crate::domain::ports::RecordFetcher;
use crate::utils::error::{FetchError, MonitorError, Result};
use std::time::Instant;

/// 針對單一 pair 的補資料工作。不重試，失敗只影響自己。
#[derive(Debug, Clone)]
pub struct FetchJob {
    request: FetchRequest,
}

impl FetchJob {
    pub fn new(pair: IndustryCountryPair, limit: usize) -> Result<Self> {
        if limit == 0 {
            return Err(MonitorError::invalid_argument(
                "limit",
                limit,
                "limit must be a positive integer",
            ));
        }
        Ok(Self {
            request: FetchRequest { pair, limit },
        })
    }

    pub fn pair(&self) -> &IndustryCountryPair {
        &self.request.pair
    }

    pub async fn run<F: RecordFetcher + ?Sized>(
        &self,
        fetcher: &F,
        deadline: &Deadline,
    ) -> FetchOutcome {
        let pair = &self.request.pair;
        if deadline.is_expired() {
            tracing::debug!(%pair, "Skipping fetch, deadline already reached");
            return FetchOutcome::Failed {
                error: FetchError::DeadlineExceeded,
            };
        }

        let started = Instant::now();
        tracing::debug!(%pair, limit = self.request.limit, "🚚 Fetch started");

        match fetcher
            .fetch_and_persist(&self.request, deadline.instant())
            .await
        {
            Ok(records) => {
                let records = records.min(self.request.limit);
                tracing::info!(
                    %pair,
                    records,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "✅ Fetch completed"
                );
                FetchOutcome::Fetched { records }
            }
            Err(error) => {
                tracing::warn!(
                    %pair,
                    error = %error,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "⚠️ Fetch failed"
                );
                FetchOutcome::Failed { error }
            }
        }
    }
}
