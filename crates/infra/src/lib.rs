//! Infrastructure layer: record store, guarded record service, configuration.

pub mod config;
pub mod service;
pub mod store;


pub use config::{AuthzConfig, ConfigError};
pub use service::{RecordService, ServiceError};
pub use store::{SchoolStore, StoreError, Stored, Tables};
