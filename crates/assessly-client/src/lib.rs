//! assessly-client: assessment backend integrations.
//!
//! Implements the `AssessmentBackend` trait over the platform's REST API
//! and over local files, plus an in-memory mock for tests.

pub mod config;
pub mod http;
pub mod local;
pub mod mock;

pub use assessly_core::error::BackendError;
pub use config::{create_backend, load_config, load_config_from, AssesslyConfig, BackendConfig};
pub use http::HttpBackend;
pub use local::LocalBackend;
pub use mock::MockBackend;
