use crate::core::deadline::Deadline;
use crate::core::fetch_job::FetchJob;
use crate::core::inspector::CoverageInspector;
use crate::core::orchestrator::AutoPopulateOrchestrator;
use crate::core::scheduler::BatchScheduler;
use crate::core::stats::PopulationStatsAggregator;
use crate::domain::defaults::{AutoPopulateRequest, Defaults};
use crate::domain::model::{
    AutoPopulateReport, BatchPolicy, BatchReport, FetchOutcome, IndustryCountryPair,
    PopulationStats,
};
use crate::domain::ports::{CoverageStore, RecordFetcher};
use crate::utils::error::{MonitorError, Result};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_DETECTION_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorSettings {
    pub defaults: Defaults,
    pub detection_timeout: Duration,
    pub batch_timeout: Duration,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            defaults: Defaults::default(),
            detection_timeout: DEFAULT_DETECTION_TIMEOUT,
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }
}

/// 對上層（HTTP handler、排程器、CLI）公開的資料擷取監控介面
pub struct DataMonitor<S, F>
where
    S: CoverageStore + ?Sized,
    F: RecordFetcher + ?Sized + 'static,
{
    store: Arc<S>,
    fetcher: Arc<F>,
    settings: MonitorSettings,
}

impl<S, F> DataMonitor<S, F>
where
    S: CoverageStore + ?Sized,
    F: RecordFetcher + ?Sized + 'static,
{
    pub fn new(store: Arc<S>, fetcher: Arc<F>, settings: MonitorSettings) -> Self {
        Self {
            store,
            fetcher,
            settings,
        }
    }

    pub fn settings(&self) -> &MonitorSettings {
        &self.settings
    }

    pub fn detection_deadline(&self) -> Deadline {
        Deadline::after(self.settings.detection_timeout)
    }

    pub fn batch_deadline(&self) -> Deadline {
        Deadline::after(self.settings.batch_timeout)
    }

    pub async fn detect_low_data(
        &self,
        threshold: Option<u64>,
        deadline: &Deadline,
    ) -> Result<Vec<IndustryCountryPair>> {
        let threshold = self.settings.defaults.threshold_or_default(threshold);
        CoverageInspector::new(Arc::clone(&self.store))
            .detect_low_data(threshold, deadline)
            .await
    }

    pub async fn detect_missing(&self, deadline: &Deadline) -> Result<Vec<IndustryCountryPair>> {
        CoverageInspector::new(Arc::clone(&self.store))
            .detect_missing(deadline)
            .await
    }

    /// 單一 pair 的抓取；失敗直接以 FetchFailure 回報
    pub async fn trigger_fetch(
        &self,
        pair: IndustryCountryPair,
        limit: Option<usize>,
        deadline: &Deadline,
    ) -> Result<usize> {
        let limit = self.settings.defaults.limit_or_default(limit);
        let job = FetchJob::new(pair, limit)?;
        match job.run(self.fetcher.as_ref(), deadline).await {
            FetchOutcome::Fetched { records } => Ok(records),
            FetchOutcome::Failed { error } => Err(MonitorError::FetchFailure {
                pair: job.pair().clone(),
                source: error,
            }),
        }
    }

    pub async fn trigger_batch(
        &self,
        pairs: Vec<IndustryCountryPair>,
        limit: Option<usize>,
        max_concurrent: Option<usize>,
        deadline: &Deadline,
    ) -> Result<BatchReport> {
        let policy = BatchPolicy {
            max_concurrent: self.settings.defaults.max_concurrent_or_default(max_concurrent),
            limit: self.settings.defaults.limit_or_default(limit),
        };
        BatchScheduler::new(Arc::clone(&self.fetcher))
            .run_batch(pairs, policy, deadline)
            .await
    }

    pub async fn stats(&self, deadline: &Deadline) -> Result<PopulationStats> {
        PopulationStatsAggregator::new(Arc::clone(&self.store))
            .compute(self.settings.defaults.threshold, deadline)
            .await
    }

    pub async fn auto_populate(
        &self,
        request: AutoPopulateRequest,
        deadline: &Deadline,
    ) -> Result<AutoPopulateReport> {
        let params = request.resolve(&self.settings.defaults);
        AutoPopulateOrchestrator::new(
            Arc::clone(&self.store),
            Arc::clone(&self.fetcher),
            self.settings.detection_timeout,
        )
        .run(params, deadline)
        .await
    }
}
