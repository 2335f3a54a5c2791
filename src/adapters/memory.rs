use crate::domain::model::{IndustryCountryPair, Record};
use crate::domain::ports::{CoverageStore, RecordSink};
use crate::utils::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;

/// 記憶體內的資料集，語意與 LocalDataset 相同
#[derive(Debug, Default)]
pub struct MemoryDataset {
    industries: Vec<String>,
    countries: Vec<String>,
    records: RwLock<HashMap<IndustryCountryPair, Vec<Record>>>,
}

impl MemoryDataset {
    pub fn new(industries: Vec<String>, countries: Vec<String>) -> Self {
        Self {
            industries,
            countries,
            records: RwLock::new(HashMap::new()),
        }
    }

    /// 直接放入 n 筆佔位記錄，方便建立測試情境
    pub fn with_count(self, industry: &str, country: &str, count: usize) -> Self {
        let pair = IndustryCountryPair::new(industry, country);
        let records = (0..count)
            .map(|i| {
                let mut data = serde_json::Map::new();
                data.insert("id".to_string(), serde_json::Value::from(i));
                Record { data }
            })
            .collect();
        if let Ok(mut map) = self.records.write() {
            map.insert(pair, records);
        }
        self
    }

    fn poisoned() -> StoreError {
        StoreError::Unavailable("memory dataset lock poisoned".to_string())
    }
}

#[async_trait]
impl CoverageStore for MemoryDataset {
    async fn count_for_pair(&self, pair: &IndustryCountryPair) -> Result<u64, StoreError> {
        let map = self.records.read().map_err(|_| Self::poisoned())?;
        Ok(map.get(pair).map(|r| r.len() as u64).unwrap_or(0))
    }

    async fn all_known_industries(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.industries.clone())
    }

    async fn all_known_countries(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.countries.clone())
    }
}

#[async_trait]
impl RecordSink for MemoryDataset {
    async fn append_records(
        &self,
        pair: &IndustryCountryPair,
        records: Vec<Record>,
    ) -> Result<usize, StoreError> {
        let written = records.len();
        let mut map = self.records.write().map_err(|_| Self::poisoned())?;
        map.entry(pair.clone()).or_default().extend(records);
        Ok(written)
    }
}
