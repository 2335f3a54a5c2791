use crate::utils::error::FetchError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// 資料集中的一個 (industry, country) 座標。身分就是 pair 本身。
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct IndustryCountryPair {
    pub industry: String,
    pub country: String,
}

impl IndustryCountryPair {
    pub fn new(industry: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            industry: industry.into(),
            country: country.into(),
        }
    }
}

impl fmt::Display for IndustryCountryPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.industry, self.country)
    }
}

/// 從 provider 抓回來的一筆原始記錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    pub data: serde_json::Map<String, serde_json::Value>,
}

/// 派給 fetch collaborator 的工作單位
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub pair: IndustryCountryPair,
    pub limit: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchPolicy {
    pub max_concurrent: usize,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FetchOutcome {
    Fetched { records: usize },
    Failed { error: FetchError },
}

impl FetchOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchOutcome::Fetched { .. })
    }

    pub fn error(&self) -> Option<&FetchError> {
        match self {
            FetchOutcome::Failed { error } => Some(error),
            FetchOutcome::Fetched { .. } => None,
        }
    }
}

/// 一次 batch 的結果，以 pair 為 key，不保證任何順序。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchReport {
    pub outcomes: HashMap<IndustryCountryPair, FetchOutcome>,
}

impl BatchReport {
    pub fn len(&self) -> usize {
        self.outcomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.outcomes.is_empty()
    }

    pub fn outcome(&self, pair: &IndustryCountryPair) -> Option<&FetchOutcome> {
        self.outcomes.get(pair)
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.values().filter(|o| o.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn records_fetched(&self) -> usize {
        self.outcomes
            .values()
            .map(|o| match o {
                FetchOutcome::Fetched { records } => *records,
                FetchOutcome::Failed { .. } => 0,
            })
            .sum()
    }

    pub fn failures(&self) -> impl Iterator<Item = (&IndustryCountryPair, &FetchError)> {
        self.outcomes
            .iter()
            .filter_map(|(pair, outcome)| outcome.error().map(|e| (pair, e)))
    }

    /// 輸出用的摘要，失敗依 pair 排序方便閱讀
    pub fn summary(&self) -> BatchSummary {
        let mut failures: Vec<FailedPair> = self
            .failures()
            .map(|(pair, error)| FailedPair {
                pair: pair.clone(),
                error: error.clone(),
            })
            .collect();
        failures.sort_by(|a, b| a.pair.cmp(&b.pair));

        BatchSummary {
            submitted: self.len(),
            succeeded: self.success_count(),
            failed: self.failure_count(),
            records_fetched: self.records_fetched(),
            failures,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub submitted: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub records_fetched: usize,
    pub failures: Vec<FailedPair>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailedPair {
    pub pair: IndustryCountryPair,
    pub error: FetchError,
}

/// auto-populate 實際使用的參數（已套用預設值，全部為正數）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AutoPopulateParams {
    pub threshold: u64,
    pub count: usize,
    pub max_concurrent: usize,
    pub limit: usize,
    pub include_missing: bool,
}

#[derive(Debug, Clone)]
pub struct AutoPopulateReport {
    pub params: AutoPopulateParams,
    pub low_data_found: usize,
    pub missing_found: usize,
    pub pairs: Vec<IndustryCountryPair>,
    /// 沒有需要補的 pair 時為 None（no-op）
    pub batch: Option<BatchReport>,
}

impl AutoPopulateReport {
    pub fn is_noop(&self) -> bool {
        self.batch.is_none()
    }

    pub fn count(&self) -> usize {
        self.pairs.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TierBreakdown {
    pub missing: usize,
    pub sparse: usize,
    pub healthy: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct PopulationStats {
    pub total_records: u64,
    pub total_pairs: usize,
    pub populated_pairs: usize,
    pub coverage_ratio: f64,
    pub low_data_threshold: u64,
    pub tiers: TierBreakdown,
    pub per_industry: BTreeMap<String, u64>,
    pub per_country: BTreeMap<String, u64>,
    pub generated_at: DateTime<Utc>,
}
