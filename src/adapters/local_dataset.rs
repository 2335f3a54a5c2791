use crate::domain::model::{IndustryCountryPair, Record};
use crate::domain::ports::{CoverageStore, RecordSink};
use crate::utils::error::StoreError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use url::form_urlencoded;

/// 以檔案保存的資料集：每個 pair 一個 JSON 陣列檔
/// `<root>/<industry>/<country>.json`。不同 pair 寫入不同檔案，互不競爭。
#[derive(Debug, Clone)]
pub struct LocalDataset {
    base_path: PathBuf,
    industries: Vec<String>,
    countries: Vec<String>,
}

impl LocalDataset {
    pub fn new(base_path: impl Into<PathBuf>, industries: Vec<String>, countries: Vec<String>) -> Self {
        Self {
            base_path: base_path.into(),
            industries,
            countries,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn pair_path(&self, pair: &IndustryCountryPair) -> PathBuf {
        self.base_path
            .join(path_segment(&pair.industry))
            .join(format!("{}.json", path_segment(&pair.country)))
    }

    pub async fn read_records(&self, pair: &IndustryCountryPair) -> Result<Vec<Record>, StoreError> {
        let path = self.pair_path(pair);
        let data = match tokio::fs::read(&path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(StoreError::Io(e)),
        };

        serde_json::from_slice(&data).map_err(|e| StoreError::Corrupt {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl CoverageStore for LocalDataset {
    async fn count_for_pair(&self, pair: &IndustryCountryPair) -> Result<u64, StoreError> {
        Ok(self.read_records(pair).await?.len() as u64)
    }

    async fn has_records(&self, pair: &IndustryCountryPair) -> Result<bool, StoreError> {
        if !tokio::fs::try_exists(self.pair_path(pair)).await? {
            return Ok(false);
        }
        Ok(self.count_for_pair(pair).await? > 0)
    }

    async fn all_known_industries(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.industries.clone())
    }

    async fn all_known_countries(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.countries.clone())
    }
}

#[async_trait]
impl RecordSink for LocalDataset {
    async fn append_records(
        &self,
        pair: &IndustryCountryPair,
        records: Vec<Record>,
    ) -> Result<usize, StoreError> {
        let written = records.len();
        let mut existing = self.read_records(pair).await?;
        existing.extend(records);

        let full_path = self.pair_path(pair);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // 先寫暫存檔再 rename，避免中途失敗留下半個檔案
        let tmp_path = full_path.with_extension("json.tmp");
        let data = serde_json::to_vec(&existing).map_err(|e| StoreError::Corrupt {
            path: full_path.display().to_string(),
            reason: e.to_string(),
        })?;
        tokio::fs::write(&tmp_path, data).await?;
        tokio::fs::rename(&tmp_path, &full_path).await?;

        tracing::debug!(%pair, written, total = existing.len(), "Records persisted");
        Ok(written)
    }
}

/// 名稱轉成路徑片段：以 form-urlencoded 編碼，再把 `.`、`*` 與大寫字母也轉成 `%XX`。
/// 不同名稱一定得到不同片段 (大小寫不敏感的檔案系統上也是)，且不會跳出根目錄。
fn path_segment(name: &str) -> String {
    let mut segment = String::new();
    for part in form_urlencoded::byte_serialize(name.trim().as_bytes()) {
        for c in part.chars() {
            if c == '.' || c == '*' || c.is_ascii_uppercase() {
                segment.push_str(&format!("%{:02X}", c as u8));
            } else {
                segment.push(c);
            }
        }
    }
    if segment.is_empty() {
        // 單獨的 `%` 不會由編碼產生
        "%".to_string()
    } else {
        segment
    }
}
