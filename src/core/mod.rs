pub mod deadline;
pub mod fetch_job;
pub mod inspector;
pub mod monitor;
pub mod orchestrator;
pub mod pair_space;
pub mod scheduler;
pub mod stats;

pub use crate::domain::model::{
    AutoPopulateParams, AutoPopulateReport, BatchPolicy, BatchReport, FetchOutcome,
    FetchRequest, IndustryCountryPair, PopulationStats,
};
pub use crate::domain::ports::{CoverageStore, RecordFetcher, RecordSink};
pub use crate::utils::error::Result;
