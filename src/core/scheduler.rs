use crate::core::deadline::Deadline;
use crate::core::fetch_job::FetchJob;
use crate::domain::model::{BatchPolicy, BatchReport, FetchOutcome, IndustryCountryPair};
use crate::domain::ports::RecordFetcher;
use crate::utils::error::{FetchError, MonitorError, Result};
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use tokio::task::{Id, JoinSet};

/// 以固定數量的 slot 執行 FetchJob。
///
/// 每個 job 完成（成功或失敗）後立刻把 slot 交給下一個待處理的 pair，
/// 啟動順序依輸入順序，完成順序不保證。結果以 pair 為 key 收集。
pub struct BatchScheduler<F: RecordFetcher + ?Sized + 'static> {
    fetcher: Arc<F>,
}

impl<F: RecordFetcher + ?Sized + 'static> BatchScheduler<F> {
    pub fn new(fetcher: Arc<F>) -> Self {
        Self { fetcher }
    }

    /// 對每個 pair 執行一次 FetchJob，全部結束後才回傳。
    ///
    /// 至少一個成功時回傳 `Ok`，失敗記錄在 report 內；全部失敗時回傳
    /// `MonitorError::BatchExhausted`，report 仍保留每個 pair 的原因。
    /// deadline 觸發後不再啟動新的 job，未啟動的 pair 記為 `NotStarted`。
    pub async fn run_batch(
        &self,
        pairs: Vec<IndustryCountryPair>,
        policy: BatchPolicy,
        deadline: &Deadline,
    ) -> Result<BatchReport> {
        validate_policy(&policy)?;

        let mut pending = VecDeque::with_capacity(pairs.len());
        let mut seen = HashSet::with_capacity(pairs.len());
        for pair in pairs {
            if seen.insert(pair.clone()) {
                pending.push_back(FetchJob::new(pair, policy.limit)?);
            } else {
                tracing::warn!(%pair, "Duplicate pair in batch input ignored");
            }
        }

        let submitted = pending.len();
        tracing::info!(
            pairs = submitted,
            max_concurrent = policy.max_concurrent,
            limit = policy.limit,
            "🚀 Starting fetch batch"
        );

        let mut report = BatchReport::default();
        let mut in_flight: JoinSet<FetchOutcome> = JoinSet::new();
        let mut running: HashMap<Id, IndustryCountryPair> = HashMap::new();

        loop {
            while in_flight.len() < policy.max_concurrent && !deadline.is_expired() {
                let Some(job) = pending.pop_front() else {
                    break;
                };
                let pair = job.pair().clone();
                let fetcher = Arc::clone(&self.fetcher);
                let job_deadline = deadline.clone();
                let handle = in_flight.spawn(async move {
                    job.run(fetcher.as_ref(), &job_deadline).await
                });
                running.insert(handle.id(), pair);
            }

            let Some(joined) = in_flight.join_next_with_id().await else {
                break;
            };

            let (pair, outcome) = match joined {
                Ok((id, outcome)) => (running.remove(&id), outcome),
                Err(join_err) => {
                    tracing::error!(error = %join_err, "💥 Fetch task aborted");
                    (
                        running.remove(&join_err.id()),
                        FetchOutcome::Failed {
                            error: FetchError::Aborted {
                                message: join_err.to_string(),
                            },
                        },
                    )
                }
            };
            if let Some(pair) = pair {
                report.outcomes.insert(pair, outcome);
            }
        }

        if !pending.is_empty() {
            tracing::warn!(
                not_started = pending.len(),
                "⏰ Batch deadline reached, remaining pairs were not started"
            );
            for job in pending {
                report.outcomes.insert(
                    job.pair().clone(),
                    FetchOutcome::Failed {
                        error: FetchError::NotStarted,
                    },
                );
            }
        }

        tracing::info!(
            submitted,
            succeeded = report.success_count(),
            failed = report.failure_count(),
            records = report.records_fetched(),
            "📊 Fetch batch finished"
        );

        if !report.is_empty() && report.success_count() == 0 {
            return Err(MonitorError::BatchExhausted { report });
        }
        Ok(report)
    }
}

pub(crate) fn validate_policy(policy: &BatchPolicy) -> Result<()> {
    if policy.max_concurrent == 0 {
        return Err(MonitorError::invalid_argument(
            "max_concurrent",
            policy.max_concurrent,
            "at least one concurrent fetch is required",
        ));
    }
    if policy.limit == 0 {
        return Err(MonitorError::invalid_argument(
            "limit",
            policy.limit,
            "limit must be a positive integer",
        ));
    }
    Ok(())
}
