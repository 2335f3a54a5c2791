use crate::core::deadline::Deadline;
use crate::core::inspector::CoverageInspector;
use crate::core::scheduler::{self, BatchScheduler};
use crate::domain::model::{AutoPopulateParams, AutoPopulateReport, BatchPolicy};
use crate::domain::ports::{CoverageStore, RecordFetcher};
use crate::utils::error::{MonitorError, Result};
use std::sync::Arc;
use std::time::Duration;

/// 偵測 → 合併 → 截斷 → 批次抓取 的完整流程
pub struct AutoPopulateOrchestrator<S, F>
where
    S: CoverageStore + ?Sized,
    F: RecordFetcher + ?Sized + 'static,
{
    inspector: CoverageInspector<S>,
    scheduler: BatchScheduler<F>,
    detection_budget: Duration,
}

impl<S, F> AutoPopulateOrchestrator<S, F>
where
    S: CoverageStore + ?Sized,
    F: RecordFetcher + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, fetcher: Arc<F>, detection_budget: Duration) -> Self {
        Self {
            inspector: CoverageInspector::new(store),
            scheduler: BatchScheduler::new(fetcher),
            detection_budget,
        }
    }

    pub async fn run(
        &self,
        params: AutoPopulateParams,
        deadline: &Deadline,
    ) -> Result<AutoPopulateReport> {
        if params.count == 0 {
            return Err(MonitorError::invalid_argument(
                "count",
                params.count,
                "count must be a positive integer",
            ));
        }
        // 偵測結果為空時不會進到 scheduler，所以先在這裡檢查
        let policy = BatchPolicy {
            max_concurrent: params.max_concurrent,
            limit: params.limit,
        };
        scheduler::validate_policy(&policy)?;

        tracing::info!(
            threshold = params.threshold,
            count = params.count,
            max_concurrent = params.max_concurrent,
            limit = params.limit,
            include_missing = params.include_missing,
            "🔍 Auto-populate started"
        );

        let detection_deadline = deadline.narrowed(self.detection_budget);
        let mut pairs = self
            .inspector
            .detect_low_data(params.threshold, &detection_deadline)
            .await?;
        let low_data_found = pairs.len();

        let mut missing_found = 0;
        if params.include_missing {
            let missing = self.inspector.detect_missing(&detection_deadline).await?;
            missing_found = missing.len();
            // low-data 在前，截斷時優先保留
            pairs.extend(missing);
        }

        pairs.truncate(params.count);

        if pairs.is_empty() {
            tracing::info!(low_data_found, missing_found, "✨ Nothing to populate");
            return Ok(AutoPopulateReport {
                params,
                low_data_found,
                missing_found,
                pairs,
                batch: None,
            });
        }

        tracing::info!(
            low_data_found,
            missing_found,
            selected = pairs.len(),
            "📋 Pairs selected for remediation"
        );

        let report = self
            .scheduler
            .run_batch(pairs.clone(), policy, deadline)
            .await?;

        Ok(AutoPopulateReport {
            params,
            low_data_found,
            missing_found,
            pairs,
            batch: Some(report),
        })
    }
}
