use crate::domain::model::{BatchReport, IndustryCountryPair};
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Invalid argument '{field}' = {value}: {reason}")]
    InvalidArgument {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Coverage store read failed: {0}")]
    UpstreamRead(#[from] StoreError),

    #[error("Fetch for {pair} failed: {source}")]
    FetchFailure {
        pair: IndustryCountryPair,
        #[source]
        source: FetchError,
    },

    #[error("Every pair in the batch failed ({} pairs)", .report.len())]
    BatchExhausted { report: BatchReport },

    #[error("Deadline exceeded during {operation}")]
    DeadlineExceeded { operation: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid configuration value for '{field}' = '{value}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Coverage store 讀取錯誤。偵測階段遇到任何一個都整體失敗。
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Corrupt dataset file {path}: {reason}")]
    Corrupt { path: String, reason: String },

    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

/// 單一 pair 的抓取失敗原因，會被保存在 batch 結果中。
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FetchError {
    #[error("network error: {message}")]
    Network { message: String },

    #[error("provider rate limited the request (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },

    #[error("provider responded with HTTP {status}: {message}")]
    Provider { status: u16, message: String },

    #[error("failed to persist records: {message}")]
    Persistence { message: String },

    #[error("deadline exceeded before the fetch completed")]
    DeadlineExceeded,

    #[error("not started: batch deadline reached or batch cancelled")]
    NotStarted,

    #[error("fetch task aborted: {message}")]
    Aborted { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Upstream,
    Remediation,
    Configuration,
    System,
}

impl MonitorError {
    pub fn invalid_argument(field: &str, value: impl ToString, reason: &str) -> Self {
        MonitorError::InvalidArgument {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            MonitorError::InvalidArgument { .. } => ErrorCategory::Input,
            MonitorError::UpstreamRead(_) | MonitorError::DeadlineExceeded { .. } => {
                ErrorCategory::Upstream
            }
            MonitorError::FetchFailure { .. } | MonitorError::BatchExhausted { .. } => {
                ErrorCategory::Remediation
            }
            MonitorError::ConfigError { .. }
            | MonitorError::ConfigValidationError { .. }
            | MonitorError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            MonitorError::IoError(_) | MonitorError::SerializationError(_) => {
                ErrorCategory::System
            }
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MonitorError::FetchFailure { .. } | MonitorError::DeadlineExceeded { .. } => {
                ErrorSeverity::Medium
            }
            MonitorError::InvalidArgument { .. }
            | MonitorError::BatchExhausted { .. }
            | MonitorError::ConfigError { .. }
            | MonitorError::ConfigValidationError { .. }
            | MonitorError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            MonitorError::UpstreamRead(_)
            | MonitorError::IoError(_)
            | MonitorError::SerializationError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            MonitorError::InvalidArgument { field, .. } => {
                format!("Pass a positive value for '{}' or omit it to use the default", field)
            }
            MonitorError::UpstreamRead(_) => {
                "Check that the dataset directory is readable and its files are valid JSON"
                    .to_string()
            }
            MonitorError::FetchFailure { source, .. } => match source {
                FetchError::RateLimited { .. } => {
                    "The provider is rate limiting; wait before triggering another fetch"
                        .to_string()
                }
                FetchError::Persistence { .. } => {
                    "Check free disk space and permissions of the dataset directory".to_string()
                }
                _ => "Check provider availability and try the fetch again".to_string(),
            },
            MonitorError::BatchExhausted { .. } => {
                "No pair could be fetched; check the provider endpoint and credentials"
                    .to_string()
            }
            MonitorError::DeadlineExceeded { .. } => {
                "Increase the deadline in the [deadlines] section or lower the batch size"
                    .to_string()
            }
            MonitorError::ConfigError { .. }
            | MonitorError::ConfigValidationError { .. }
            | MonitorError::InvalidConfigValueError { .. } => {
                "Fix the configuration file and run `check-config`".to_string()
            }
            MonitorError::IoError(_) => "Check file paths and permissions".to_string(),
            MonitorError::SerializationError(_) => {
                "The data could not be (de)serialized; inspect the input".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            MonitorError::BatchExhausted { report } => format!(
                "All {} fetches failed, no data was acquired",
                report.len()
            ),
            MonitorError::UpstreamRead(e) => format!("Could not read dataset coverage: {}", e),
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_classification() {
        let invalid = MonitorError::invalid_argument("threshold", 0, "must be positive");
        assert_eq!(invalid.severity(), ErrorSeverity::High);
        assert_eq!(invalid.category(), ErrorCategory::Input);

        let upstream = MonitorError::from(StoreError::Unavailable("down".to_string()));
        assert_eq!(upstream.severity(), ErrorSeverity::Critical);
        assert_eq!(upstream.category(), ErrorCategory::Upstream);

        let exhausted = MonitorError::BatchExhausted {
            report: BatchReport::default(),
        };
        assert_eq!(exhausted.category(), ErrorCategory::Remediation);
    }

    #[test]
    fn test_fetch_failure_suggestion_depends_on_cause() {
        let err = MonitorError::FetchFailure {
            pair: IndustryCountryPair::new("dentists", "de"),
            source: FetchError::RateLimited {
                retry_after: Some(Duration::from_secs(30)),
            },
        };
        assert!(err.recovery_suggestion().contains("rate limiting"));
        assert!(err.to_string().contains("dentists/de"));
    }
}
