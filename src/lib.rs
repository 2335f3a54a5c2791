pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{CliConfig, Command};

pub use adapters::{LocalDataset, MemoryDataset, ProviderFetcher};
pub use config::MonitorConfig;
pub use crate::core::{deadline::Deadline, monitor::DataMonitor, monitor::MonitorSettings};
pub use domain::defaults::{AutoPopulateRequest, Defaults};
pub use domain::model::{
    AutoPopulateReport, BatchReport, FetchOutcome, IndustryCountryPair, PopulationStats,
};
pub use utils::error::{FetchError, MonitorError, Result, StoreError};
