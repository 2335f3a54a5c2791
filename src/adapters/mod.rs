// Adapters layer: concrete collaborators for the monitor core (dataset storage, provider http).

pub mod local_dataset;
pub mod memory;
pub mod provider;

pub use local_dataset::LocalDataset;
pub use memory::MemoryDataset;
pub use provider::ProviderFetcher;
