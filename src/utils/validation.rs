use crate::utils::error::{MonitorError, Result};
use std::collections::HashSet;
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

fn invalid(field_name: &str, value: impl ToString, reason: impl Into<String>) -> MonitorError {
    MonitorError::InvalidConfigValueError {
        field: field_name.to_string(),
        value: value.to_string(),
        reason: reason.into(),
    }
}

/// provider endpoint 只接受 http/https
pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(invalid(field_name, url_str, "URL cannot be empty"));
    }

    let url = Url::parse(url_str)
        .map_err(|e| invalid(field_name, url_str, format!("Invalid URL format: {}", e)))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(invalid(
            field_name,
            url_str,
            format!("Unsupported URL scheme: {}", scheme),
        )),
    }
}

/// `${VAR}` 沒被替換代表環境變數未設定
pub fn validate_api_key(field_name: &str, key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(invalid(field_name, key, "API key cannot be empty"));
    }
    if key.starts_with("${") {
        return Err(invalid(field_name, key, "Environment variable is not set"));
    }
    Ok(())
}

/// 資料集根目錄可以還不存在 (第一次寫入時建立)，但存在時必須是目錄
pub fn validate_dataset_root(field_name: &str, path: &str) -> Result<()> {
    if path.trim().is_empty() {
        return Err(invalid(field_name, path, "Path cannot be empty"));
    }
    if path.contains('\0') {
        return Err(invalid(field_name, path, "Path contains null bytes"));
    }
    let root = Path::new(path);
    if root.exists() && !root.is_dir() {
        return Err(invalid(field_name, path, "Path exists but is not a directory"));
    }
    Ok(())
}

/// 名稱清單不可為空、不可有空白項目或重複項目
pub fn validate_name_list(field_name: &str, names: &[String]) -> Result<()> {
    if names.is_empty() {
        return Err(invalid(field_name, "[]", "At least one entry is required"));
    }

    let mut seen = HashSet::new();
    for name in names {
        if name.trim().is_empty() {
            return Err(invalid(field_name, name, "Entry cannot be empty or whitespace-only"));
        }
        if !seen.insert(name.trim()) {
            return Err(invalid(field_name, name, "Duplicate entry"));
        }
    }
    Ok(())
}

/// 正整數，可選上限
pub fn validate_positive(field_name: &str, value: u64, max: Option<u64>) -> Result<()> {
    if value == 0 {
        return Err(invalid(field_name, value, "Value must be at least 1"));
    }
    match max {
        Some(max) if value > max => Err(invalid(
            field_name,
            value,
            format!("Value must be between 1 and {}", max),
        )),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_validate_url() {
        assert!(validate_url("provider.endpoint", "https://example.com").is_ok());
        assert!(validate_url("provider.endpoint", "http://example.com").is_ok());
        assert!(validate_url("provider.endpoint", "").is_err());
        assert!(validate_url("provider.endpoint", "invalid-url").is_err());
        assert!(validate_url("provider.endpoint", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_api_key() {
        assert!(validate_api_key("provider.api_key", "abc123").is_ok());
        assert!(validate_api_key("provider.api_key", "  ").is_err());
        assert!(validate_api_key("provider.api_key", "${PROVIDER_KEY}").is_err());
    }

    #[test]
    fn test_validate_dataset_root() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().display().to_string();
        assert!(validate_dataset_root("dataset.path", &root).is_ok());

        let not_yet = dir.path().join("later").display().to_string();
        assert!(validate_dataset_root("dataset.path", &not_yet).is_ok());

        let file = NamedTempFile::new().unwrap();
        let file_path = file.path().display().to_string();
        assert!(validate_dataset_root("dataset.path", &file_path).is_err());

        assert!(validate_dataset_root("dataset.path", "").is_err());
    }

    #[test]
    fn test_validate_name_list() {
        let names = vec!["dentists".to_string(), "plumbers".to_string()];
        assert!(validate_name_list("dataset.industries", &names).is_ok());
        assert!(validate_name_list("dataset.industries", &[]).is_err());

        let blank = vec!["dentists".to_string(), "  ".to_string()];
        assert!(validate_name_list("dataset.industries", &blank).is_err());

        let duplicate = vec!["de".to_string(), "de ".to_string()];
        assert!(validate_name_list("dataset.countries", &duplicate).is_err());
    }

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive("defaults.limit", 5, None).is_ok());
        assert!(validate_positive("defaults.limit", 0, None).is_err());
        assert!(validate_positive("defaults.max_concurrent", 100, Some(100)).is_ok());
        assert!(validate_positive("defaults.max_concurrent", 101, Some(100)).is_err());
    }
}
