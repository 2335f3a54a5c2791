use crate::core::deadline::Deadline;
use crate::core::pair_space::PairSpace;
use crate::domain::model::IndustryCountryPair;
use crate::domain::ports::CoverageStore;
use crate::utils::error::{MonitorError, Result, StoreError};
use std::sync::Arc;

/// 一次完整讀取的覆蓋率快照
#[derive(Debug, Clone)]
pub struct CoverageSnapshot {
    pub space: PairSpace,
    /// PairSpace 列舉順序下每個 pair 的記錄數
    pub counts: Vec<(IndustryCountryPair, u64)>,
}

impl CoverageSnapshot {
    pub fn low_data(&self, threshold: u64) -> Vec<IndustryCountryPair> {
        self.counts
            .iter()
            .filter(|(_, count)| *count > 0 && *count < threshold)
            .map(|(pair, _)| pair.clone())
            .collect()
    }

    pub fn missing(&self) -> Vec<IndustryCountryPair> {
        self.counts
            .iter()
            .filter(|(_, count)| *count == 0)
            .map(|(pair, _)| pair.clone())
            .collect()
    }
}

/// 讀取整個 PairSpace 的記錄數。任何讀取錯誤或逾時都讓整次呼叫失敗。
pub async fn survey<S: CoverageStore + ?Sized>(
    store: &S,
    deadline: &Deadline,
    operation: &str,
) -> Result<CoverageSnapshot> {
    let read = async {
        let space = PairSpace::from_store(store).await?;
        let mut counts = Vec::with_capacity(space.len());
        // 每個 pair 只讀一次；0 即代表 missing
        for pair in space.pairs() {
            let count = store.count_for_pair(&pair).await?;
            counts.push((pair, count));
        }
        Ok::<_, StoreError>(CoverageSnapshot { space, counts })
    };

    match deadline.run(read).await {
        Some(Ok(snapshot)) => Ok(snapshot),
        Some(Err(e)) => {
            tracing::error!(operation, error = %e, "❌ Coverage read failed, aborting detection");
            Err(MonitorError::UpstreamRead(e))
        }
        None => {
            tracing::warn!(operation, "⏰ Coverage read did not finish before the deadline");
            Err(MonitorError::DeadlineExceeded {
                operation: operation.to_string(),
            })
        }
    }
}

pub struct CoverageInspector<S: CoverageStore + ?Sized> {
    store: Arc<S>,
}

impl<S: CoverageStore + ?Sized> CoverageInspector<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// 有資料但記錄數低於 threshold 的 pair
    pub async fn detect_low_data(
        &self,
        threshold: u64,
        deadline: &Deadline,
    ) -> Result<Vec<IndustryCountryPair>> {
        if threshold == 0 {
            return Err(MonitorError::invalid_argument(
                "threshold",
                threshold,
                "threshold must be a positive integer",
            ));
        }

        let snapshot = survey(self.store.as_ref(), deadline, "detect_low_data").await?;
        let pairs = snapshot.low_data(threshold);
        tracing::debug!(
            threshold,
            scanned = snapshot.counts.len(),
            found = pairs.len(),
            "Low-data detection finished"
        );
        Ok(pairs)
    }

    /// 完全沒有記錄的 pair
    pub async fn detect_missing(&self, deadline: &Deadline) -> Result<Vec<IndustryCountryPair>> {
        let snapshot = survey(self.store.as_ref(), deadline, "detect_missing").await?;
        let pairs = snapshot.missing();
        tracing::debug!(
            scanned = snapshot.counts.len(),
            found = pairs.len(),
            "Missing-pair detection finished"
        );
        Ok(pairs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryDataset;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::time::Duration;

    fn dataset() -> MemoryDataset {
        MemoryDataset::new(
            vec!["dentists".into(), "plumbers".into()],
            vec!["de".into(), "fr".into(), "it".into()],
        )
        .with_count("dentists", "de", 5)
        .with_count("dentists", "fr", 150)
        .with_count("plumbers", "de", 99)
        .with_count("plumbers", "it", 100)
    }

    fn deadline() -> Deadline {
        Deadline::after(Duration::from_secs(30))
    }

    struct FailingStore;

    #[async_trait]
    impl CoverageStore for FailingStore {
        async fn count_for_pair(&self, pair: &IndustryCountryPair) -> std::result::Result<u64, StoreError> {
            if pair.country == "fr" {
                Err(StoreError::Unavailable("replica down".to_string()))
            } else {
                Ok(1)
            }
        }

        async fn all_known_industries(&self) -> std::result::Result<Vec<String>, StoreError> {
            Ok(vec!["dentists".into()])
        }

        async fn all_known_countries(&self) -> std::result::Result<Vec<String>, StoreError> {
            Ok(vec!["de".into(), "fr".into()])
        }
    }

    #[tokio::test]
    async fn test_detect_low_data_only_returns_sparse_pairs() {
        let inspector = CoverageInspector::new(Arc::new(dataset()));
        let pairs = inspector.detect_low_data(100, &deadline()).await.unwrap();

        assert_eq!(
            pairs,
            vec![
                IndustryCountryPair::new("dentists", "de"),
                IndustryCountryPair::new("plumbers", "de"),
            ]
        );
    }

    #[tokio::test]
    async fn test_low_data_and_missing_are_disjoint_and_cover_space() {
        let store = Arc::new(dataset());
        let inspector = CoverageInspector::new(store.clone());

        for threshold in [1, 6, 100, 101, 1000] {
            let low: HashSet<_> = inspector
                .detect_low_data(threshold, &deadline())
                .await
                .unwrap()
                .into_iter()
                .collect();
            let missing: HashSet<_> = inspector
                .detect_missing(&deadline())
                .await
                .unwrap()
                .into_iter()
                .collect();
            assert!(low.is_disjoint(&missing), "threshold {}", threshold);
        }

        let missing = inspector.detect_missing(&deadline()).await.unwrap();
        let space = PairSpace::from_store(store.as_ref()).await.unwrap();
        let mut populated = Vec::new();
        for pair in space.pairs() {
            if store.has_records(&pair).await.unwrap() {
                populated.push(pair);
            }
        }

        let union: HashSet<_> = missing.iter().chain(populated.iter()).cloned().collect();
        assert_eq!(union.len(), missing.len() + populated.len());
        assert_eq!(union, space.pairs().collect::<HashSet<_>>());
    }

    /// 記錄每個 pair 被讀取的次數
    struct CountingStore {
        inner: MemoryDataset,
        reads: std::sync::Mutex<Vec<IndustryCountryPair>>,
    }

    #[async_trait]
    impl CoverageStore for CountingStore {
        async fn count_for_pair(&self, pair: &IndustryCountryPair) -> std::result::Result<u64, StoreError> {
            self.reads.lock().unwrap().push(pair.clone());
            self.inner.count_for_pair(pair).await
        }

        async fn has_records(&self, pair: &IndustryCountryPair) -> std::result::Result<bool, StoreError> {
            self.reads.lock().unwrap().push(pair.clone());
            self.inner.has_records(pair).await
        }

        async fn all_known_industries(&self) -> std::result::Result<Vec<String>, StoreError> {
            self.inner.all_known_industries().await
        }

        async fn all_known_countries(&self) -> std::result::Result<Vec<String>, StoreError> {
            self.inner.all_known_countries().await
        }
    }

    #[tokio::test]
    async fn test_each_pair_is_read_once_per_detection() {
        let store = Arc::new(CountingStore {
            inner: dataset(),
            reads: std::sync::Mutex::new(Vec::new()),
        });
        let inspector = CoverageInspector::new(store.clone());

        inspector.detect_low_data(100, &deadline()).await.unwrap();

        let reads = store.reads.lock().unwrap().clone();
        let distinct: HashSet<_> = reads.iter().cloned().collect();
        assert_eq!(reads.len(), 6);
        assert_eq!(distinct.len(), 6);
    }

    #[tokio::test]
    async fn test_zero_threshold_is_rejected() {
        let inspector = CoverageInspector::new(Arc::new(dataset()));
        let err = inspector.detect_low_data(0, &deadline()).await.unwrap_err();
        assert!(matches!(err, MonitorError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_store_error_aborts_whole_detection() {
        let inspector = CoverageInspector::new(Arc::new(FailingStore));

        let low = inspector.detect_low_data(100, &deadline()).await;
        assert!(matches!(low, Err(MonitorError::UpstreamRead(_))));

        let missing = inspector.detect_missing(&deadline()).await;
        assert!(matches!(missing, Err(MonitorError::UpstreamRead(_))));
    }

    #[tokio::test]
    async fn test_detection_is_idempotent() {
        let inspector = CoverageInspector::new(Arc::new(dataset()));

        let first = inspector.detect_low_data(100, &deadline()).await.unwrap();
        let second = inspector.detect_low_data(100, &deadline()).await.unwrap();
        assert_eq!(first, second);

        let first = inspector.detect_missing(&deadline()).await.unwrap();
        let second = inspector.detect_missing(&deadline()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_cancelled_deadline_fails_detection() {
        let inspector = CoverageInspector::new(Arc::new(dataset()));
        let deadline = deadline();
        deadline.cancel();

        let result = inspector.detect_missing(&deadline).await;
        assert!(matches!(result, Err(MonitorError::DeadlineExceeded { .. })));
    }
}
