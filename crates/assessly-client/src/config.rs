//! Backend configuration and factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use assessly_core::scoring::ShortAnswerPolicy;
use assessly_core::traits::AssessmentBackend;

use crate::http::{HttpBackend, DEFAULT_TIMEOUT_SECS};
use crate::local::LocalBackend;

/// Where assessments come from and where submissions go.
///
/// Note: Custom Debug impl masks the access token to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum BackendConfig {
    Http {
        base_url: String,
        #[serde(default)]
        access_token: String,
        #[serde(default = "default_timeout")]
        timeout_secs: u64,
    },
    Local {
        #[serde(default = "default_assessments_dir")]
        assessments_dir: PathBuf,
        #[serde(default = "default_submissions_file")]
        submissions_file: PathBuf,
    },
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendConfig::Http {
                base_url,
                access_token: _,
                timeout_secs,
            } => f
                .debug_struct("Http")
                .field("base_url", base_url)
                .field("access_token", &"***")
                .field("timeout_secs", timeout_secs)
                .finish(),
            BackendConfig::Local {
                assessments_dir,
                submissions_file,
            } => f
                .debug_struct("Local")
                .field("assessments_dir", assessments_dir)
                .field("submissions_file", submissions_file)
                .finish(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        BackendConfig::Local {
            assessments_dir: default_assessments_dir(),
            submissions_file: default_submissions_file(),
        }
    }
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}
fn default_assessments_dir() -> PathBuf {
    PathBuf::from("./assessments")
}
fn default_submissions_file() -> PathBuf {
    PathBuf::from("./assessly-submissions.json")
}
fn default_user_id() -> String {
    "local-user".to_string()
}

/// Top-level assessly configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssesslyConfig {
    #[serde(default)]
    pub backend: BackendConfig,
    /// Identity recorded on local submissions and feedback.
    #[serde(default = "default_user_id")]
    pub user_id: String,
    /// How the local backend marks short answers.
    #[serde(default)]
    pub short_answer_policy: ShortAnswerPolicy,
}

impl Default for AssesslyConfig {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            user_id: default_user_id(),
            short_answer_policy: ShortAnswerPolicy::default(),
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_backend_config(config: &BackendConfig) -> BackendConfig {
    match config {
        BackendConfig::Http {
            base_url,
            access_token,
            timeout_secs,
        } => BackendConfig::Http {
            base_url: resolve_env_vars(base_url),
            access_token: resolve_env_vars(access_token),
            timeout_secs: *timeout_secs,
        },
        BackendConfig::Local { .. } => config.clone(),
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `assessly.toml` in the current directory
/// 2. `~/.config/assessly/config.toml`
///
/// Environment variable overrides: `ASSESSLY_SERVER_URL` switches to the
/// HTTP backend, `ASSESSLY_ACCESS_TOKEN` sets its token.
pub fn load_config() -> Result<AssesslyConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<AssesslyConfig> {
    let config_path = if let Some(p) = path {
        if p.exists() {
            Some(p.to_path_buf())
        } else {
            anyhow::bail!("config file not found: {}", p.display());
        }
    } else {
        let local = PathBuf::from("assessly.toml");
        if local.exists() {
            Some(local)
        } else {
            dirs_path()
                .map(|home| home.join("config.toml"))
                .filter(|global| global.exists())
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            parse_config(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        }
        None => AssesslyConfig::default(),
    };

    apply_env_overrides(
        &mut config,
        std::env::var("ASSESSLY_SERVER_URL").ok(),
        std::env::var("ASSESSLY_ACCESS_TOKEN").ok(),
    );
    config.backend = resolve_backend_config(&config.backend);

    Ok(config)
}

/// Parse a TOML config string.
pub fn parse_config(content: &str) -> Result<AssesslyConfig> {
    Ok(toml::from_str(content)?)
}

fn apply_env_overrides(
    config: &mut AssesslyConfig,
    server_url: Option<String>,
    access_token: Option<String>,
) {
    if let Some(url) = server_url.filter(|u| !u.is_empty()) {
        match &mut config.backend {
            BackendConfig::Http { base_url, .. } => *base_url = url,
            BackendConfig::Local { .. } => {
                config.backend = BackendConfig::Http {
                    base_url: url,
                    access_token: String::new(),
                    timeout_secs: default_timeout(),
                };
            }
        }
    }

    if let Some(token) = access_token {
        if let BackendConfig::Http { access_token, .. } = &mut config.backend {
            *access_token = token;
        }
    }
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("assessly"))
}

/// Create a backend instance from configuration.
pub fn create_backend(config: &AssesslyConfig) -> Result<Box<dyn AssessmentBackend>> {
    match &config.backend {
        BackendConfig::Http {
            base_url,
            access_token,
            timeout_secs,
        } => {
            if access_token.is_empty() {
                tracing::warn!("no access token configured; requests will be unauthenticated");
            }
            Ok(Box::new(HttpBackend::new(
                base_url,
                access_token,
                Some(*timeout_secs),
            )?))
        }
        BackendConfig::Local {
            assessments_dir,
            submissions_file,
        } => Ok(Box::new(LocalBackend::open(
            assessments_dir,
            submissions_file,
            &config.user_id,
            config.short_answer_policy,
        )?)),
    }
}
