pub mod feedback;
pub mod grade;
pub mod init;
pub mod list;
pub mod submissions;
pub mod take;
pub mod validate;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use assessly_client::config::{create_backend, load_config_from};
use assessly_core::traits::AssessmentBackend;

/// Load config (explicit path or the default search) and build its backend.
pub fn open_backend(config_path: Option<&Path>) -> Result<Arc<dyn AssessmentBackend>> {
    let config = load_config_from(config_path)?;
    tracing::debug!(backend = ?config.backend, "using backend");
    Ok(Arc::from(create_backend(&config)?))
}
