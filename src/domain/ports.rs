use crate::domain::model::{FetchRequest, IndustryCountryPair, Record};
use crate::utils::error::{FetchError, StoreError};
use async_trait::async_trait;
use tokio::time::Instant;

/// 資料集的唯讀查詢介面
#[async_trait]
pub trait CoverageStore: Send + Sync {
    async fn count_for_pair(&self, pair: &IndustryCountryPair) -> Result<u64, StoreError>;

    async fn has_records(&self, pair: &IndustryCountryPair) -> Result<bool, StoreError> {
        Ok(self.count_for_pair(pair).await? > 0)
    }

    async fn all_known_industries(&self) -> Result<Vec<String>, StoreError>;

    async fn all_known_countries(&self) -> Result<Vec<String>, StoreError>;
}

/// 資料集的寫入端，由 fetch collaborator 使用；core 本身不寫入。
#[async_trait]
pub trait RecordSink: Send + Sync {
    /// 追加記錄並回傳寫入筆數
    async fn append_records(
        &self,
        pair: &IndustryCountryPair,
        records: Vec<Record>,
    ) -> Result<usize, StoreError>;
}

/// 向外部 provider 抓取一個 pair 的記錄並寫入資料集。
///
/// 實作必須遵守傳入的 deadline；成功時回傳實際寫入的筆數（不超過 `request.limit`）。
#[async_trait]
pub trait RecordFetcher: Send + Sync {
    async fn fetch_and_persist(
        &self,
        request: &FetchRequest,
        deadline: Instant,
    ) -> Result<usize, FetchError>;
}
