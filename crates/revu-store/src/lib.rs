pub mod config;
pub mod error;
pub mod review_store;
pub mod schema;
pub mod store;

pub use config::{AllocationConfig, Config};
pub use error::{Result, StoreError};
pub use review_store::{ReviewStore, default_base_dir};
pub use store::{ReviewLogEntry, ReviewRecord, SessionSummary, Store};
