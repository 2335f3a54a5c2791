use crate::domain::model::AutoPopulateParams;
use serde::{Deserialize, Serialize};

pub const DEFAULT_THRESHOLD: u64 = 100;
pub const DEFAULT_COUNT: usize = 10;
pub const DEFAULT_MAX_CONCURRENT: usize = 3;
pub const DEFAULT_LIMIT: usize = 1000;
pub const DEFAULT_INCLUDE_MISSING: bool = false;

/// 所有未指定（或為 0）參數的預設值，集中在一處明確傳入 orchestrator。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    pub threshold: u64,
    pub count: usize,
    pub max_concurrent: usize,
    pub limit: usize,
    pub include_missing: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            count: DEFAULT_COUNT,
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            limit: DEFAULT_LIMIT,
            include_missing: DEFAULT_INCLUDE_MISSING,
        }
    }
}

impl Defaults {
    pub fn threshold_or_default(&self, value: Option<u64>) -> u64 {
        non_zero(value).unwrap_or(self.threshold)
    }

    pub fn count_or_default(&self, value: Option<usize>) -> usize {
        non_zero(value).unwrap_or(self.count)
    }

    pub fn max_concurrent_or_default(&self, value: Option<usize>) -> usize {
        non_zero(value).unwrap_or(self.max_concurrent)
    }

    pub fn limit_or_default(&self, value: Option<usize>) -> usize {
        non_zero(value).unwrap_or(self.limit)
    }
}

fn non_zero<T: PartialEq + Default>(value: Option<T>) -> Option<T> {
    value.filter(|v| *v != T::default())
}

/// 呼叫端傳入的 auto-populate 參數，None 或 0 代表使用預設值
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct AutoPopulateRequest {
    pub threshold: Option<u64>,
    pub count: Option<usize>,
    pub max_concurrent: Option<usize>,
    pub limit: Option<usize>,
    pub include_missing: Option<bool>,
}

impl AutoPopulateRequest {
    pub fn resolve(&self, defaults: &Defaults) -> AutoPopulateParams {
        AutoPopulateParams {
            threshold: defaults.threshold_or_default(self.threshold),
            count: defaults.count_or_default(self.count),
            max_concurrent: defaults.max_concurrent_or_default(self.max_concurrent),
            limit: defaults.limit_or_default(self.limit),
            include_missing: self.include_missing.unwrap_or(defaults.include_missing),
        }
    }
}
