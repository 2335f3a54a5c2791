use crate::core::monitor::{MonitorSettings, DEFAULT_BATCH_TIMEOUT, DEFAULT_DETECTION_TIMEOUT};
use crate::domain::defaults::Defaults;
use crate::utils::error::{MonitorError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 60;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    pub provider: ProviderConfig,
    pub dataset: DatasetConfig,
    pub defaults: Option<DefaultsConfig>,
    pub deadlines: Option<DeadlineConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetConfig {
    pub path: String,
    pub industries: Vec<String>,
    pub countries: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefaultsConfig {
    pub threshold: Option<u64>,
    pub count: Option<usize>,
    pub max_concurrent: Option<usize>,
    pub limit: Option<usize>,
    pub include_missing: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadlineConfig {
    pub detection_seconds: Option<u64>,
    pub batch_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub json: Option<bool>,
}

impl MonitorConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(MonitorError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| MonitorError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${PROVIDER_API_KEY})，未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| MonitorError::ConfigError {
            message: format!("Invalid env substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("provider.endpoint", &self.provider.endpoint)?;
        if let Some(key) = &self.provider.api_key {
            validation::validate_api_key("provider.api_key", key)?;
        }
        if let Some(timeout) = self.provider.timeout_seconds {
            validation::validate_positive("provider.timeout_seconds", timeout, Some(3600))?;
        }

        validation::validate_dataset_root("dataset.path", &self.dataset.path)?;
        validation::validate_name_list("dataset.industries", &self.dataset.industries)?;
        validation::validate_name_list("dataset.countries", &self.dataset.countries)?;

        if let Some(defaults) = &self.defaults {
            if let Some(threshold) = defaults.threshold {
                validation::validate_positive("defaults.threshold", threshold, None)?;
            }
            if let Some(count) = defaults.count {
                validation::validate_positive("defaults.count", count as u64, None)?;
            }
            if let Some(max_concurrent) = defaults.max_concurrent {
                validation::validate_positive("defaults.max_concurrent", max_concurrent as u64, Some(100))?;
            }
            if let Some(limit) = defaults.limit {
                validation::validate_positive("defaults.limit", limit as u64, None)?;
            }
        }

        if let Some(deadlines) = &self.deadlines {
            if let Some(seconds) = deadlines.detection_seconds {
                validation::validate_positive("deadlines.detection_seconds", seconds, None)?;
            }
            if let Some(seconds) = deadlines.batch_seconds {
                validation::validate_positive("deadlines.batch_seconds", seconds, None)?;
            }
        }

        Ok(())
    }

    /// 檔案中的 [defaults] 覆蓋內建預設值
    pub fn defaults(&self) -> Defaults {
        let builtin = Defaults::default();
        let Some(overrides) = &self.defaults else {
            return builtin;
        };
        Defaults {
            threshold: builtin.threshold_or_default(overrides.threshold),
            count: builtin.count_or_default(overrides.count),
            max_concurrent: builtin.max_concurrent_or_default(overrides.max_concurrent),
            limit: builtin.limit_or_default(overrides.limit),
            include_missing: overrides.include_missing.unwrap_or(builtin.include_missing),
        }
    }

    pub fn settings(&self) -> MonitorSettings {
        let deadlines = self.deadlines.clone().unwrap_or_default();
        MonitorSettings {
            defaults: self.defaults(),
            detection_timeout: deadlines
                .detection_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_DETECTION_TIMEOUT),
            batch_timeout: deadlines
                .batch_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_BATCH_TIMEOUT),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(
            self.provider
                .timeout_seconds
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECONDS),
        )
    }

    pub fn json_logs(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(false)
    }
}

impl Validate for MonitorConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const BASIC: &str = r#"
[provider]
endpoint = "https://provider.example.com/v1/businesses"

[dataset]
path = "./data"
industries = ["dentists", "plumbers"]
countries = ["de", "fr"]
"#;

    #[test]
    fn test_parse_basic_config_uses_builtin_defaults() {
        let config = tokio_test::assert_ok!(MonitorConfig::from_toml_str(BASIC));

        tokio_test::assert_ok!(config.validate());
        assert_eq!(config.defaults(), Defaults::default());

        let settings = config.settings();
        assert_eq!(settings.detection_timeout, Duration::from_secs(30));
        assert_eq!(settings.batch_timeout, Duration::from_secs(600));
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert!(!config.json_logs());
    }

    #[test]
    fn test_defaults_section_overrides() {
        let toml_content = format!(
            "{}\n[defaults]\nthreshold = 50\nmax_concurrent = 8\ninclude_missing = true\n\n[deadlines]\nbatch_seconds = 1200\n",
            BASIC
        );
        let config = MonitorConfig::from_toml_str(&toml_content).unwrap();
        let defaults = config.defaults();

        assert_eq!(defaults.threshold, 50);
        assert_eq!(defaults.count, 10);
        assert_eq!(defaults.max_concurrent, 8);
        assert!(defaults.include_missing);
        assert_eq!(config.settings().batch_timeout, Duration::from_secs(1200));
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("COVERAGE_MONITOR_TEST_KEY", "abc123");

        let toml_content = BASIC.replace(
            "[dataset]",
            "api_key = \"${COVERAGE_MONITOR_TEST_KEY}\"\n\n[dataset]",
        );
        let config = MonitorConfig::from_toml_str(&toml_content).unwrap();
        assert_eq!(config.provider.api_key.as_deref(), Some("abc123"));

        std::env::remove_var("COVERAGE_MONITOR_TEST_KEY");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let toml_content = BASIC.replace(
            "[dataset]",
            "api_key = \"${COVERAGE_MONITOR_SURELY_UNSET}\"\n\n[dataset]",
        );
        let config = MonitorConfig::from_toml_str(&toml_content).unwrap();
        tokio_test::assert_err!(config.validate());
    }

    #[test]
    fn test_config_validation() {
        let invalid_url = BASIC.replace("https://provider.example.com/v1/businesses", "invalid-url");
        let config = MonitorConfig::from_toml_str(&invalid_url).unwrap();
        assert!(config.validate().is_err());

        let no_countries = BASIC.replace("countries = [\"de\", \"fr\"]", "countries = []");
        let config = MonitorConfig::from_toml_str(&no_countries).unwrap();
        assert!(config.validate().is_err());

        let zero_slots = format!("{}\n[defaults]\nmax_concurrent = 0\n", BASIC);
        let config = MonitorConfig::from_toml_str(&zero_slots).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(BASIC.as_bytes()).unwrap();

        let config = MonitorConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.dataset.industries.len(), 2);
    }
}
