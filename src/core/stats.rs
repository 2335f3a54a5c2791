use crate::core::deadline::Deadline;
use crate::core::inspector::{survey, CoverageSnapshot};
use crate::domain::model::{PopulationStats, TierBreakdown};
use crate::domain::ports::CoverageStore;
use crate::utils::error::{MonitorError, Result};
use std::collections::BTreeMap;
use std::sync::Arc;

/// 整個資料集的統計，僅供觀察用，不影響補資料決策。每次呼叫都重新計算。
pub struct PopulationStatsAggregator<S: CoverageStore + ?Sized> {
    store: Arc<S>,
}

impl<S: CoverageStore + ?Sized> PopulationStatsAggregator<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn compute(&self, low_data_threshold: u64, deadline: &Deadline) -> Result<PopulationStats> {
        if low_data_threshold == 0 {
            return Err(MonitorError::invalid_argument(
                "threshold",
                low_data_threshold,
                "threshold must be a positive integer",
            ));
        }
        let snapshot = survey(self.store.as_ref(), deadline, "stats").await?;
        Ok(aggregate(&snapshot, low_data_threshold))
    }
}

fn aggregate(snapshot: &CoverageSnapshot, threshold: u64) -> PopulationStats {
    let mut per_industry: BTreeMap<String, u64> = snapshot
        .space
        .industries()
        .iter()
        .map(|i| (i.clone(), 0))
        .collect();
    let mut per_country: BTreeMap<String, u64> = snapshot
        .space
        .countries()
        .iter()
        .map(|c| (c.clone(), 0))
        .collect();
    let mut tiers = TierBreakdown::default();
    let mut total_records = 0u64;

    for (pair, count) in &snapshot.counts {
        total_records += count;
        *per_industry.entry(pair.industry.clone()).or_default() += count;
        *per_country.entry(pair.country.clone()).or_default() += count;

        match *count {
            0 => tiers.missing += 1,
            c if c < threshold => tiers.sparse += 1,
            _ => tiers.healthy += 1,
        }
    }

    let total_pairs = snapshot.counts.len();
    let populated_pairs = total_pairs - tiers.missing;
    let coverage_ratio = if total_pairs > 0 {
        populated_pairs as f64 / total_pairs as f64
    } else {
        0.0
    };

    PopulationStats {
        total_records,
        total_pairs,
        populated_pairs,
        coverage_ratio,
        low_data_threshold: threshold,
        tiers,
        per_industry,
        per_country,
        generated_at: chrono::Utc::now(),
    }
}
