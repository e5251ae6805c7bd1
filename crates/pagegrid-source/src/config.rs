use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::SourceError;

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const PROVISIONAL_COUNT: usize = 100;
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How a grid view is backed by the remote resource.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadStrategy {
    #[default]
    EagerPaged,
    GroupAware,
    VirtualWindowed,
}

#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credentials {
    #[default]
    None,
    Bearer {
        token: String,
    },
    Header {
        name: String,
        value: String,
    },
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::None => write!(f, "None"),
            Credentials::Bearer { .. } => write!(f, "Bearer(<redacted>)"),
            Credentials::Header { name, .. } => write!(f, "Header({name}: <redacted>)"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub credentials: Credentials,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub base_url: String,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_provisional_count")]
    pub provisional_count: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub credentials: Credentials,
    #[serde(default)]
    pub strategy: LoadStrategy,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_provisional_count() -> usize {
    PROVISIONAL_COUNT
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl SourceConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            page_size: DEFAULT_PAGE_SIZE,
            provisional_count: PROVISIONAL_COUNT,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            credentials: Credentials::None,
            strategy: LoadStrategy::EagerPaged,
        }
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SourceError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| SourceError::Config(format!("failed to read {}: {e}", path.display())))?;
        let config: SourceConfig = serde_json::from_str(&content)
            .map_err(|e| SourceError::Config(format!("failed to parse {}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    /// Load from the process environment.
    ///
    /// `PAGEGRID_CONFIG` names a JSON file to start from; without it
    /// `PAGEGRID_BASE_URL` is required. The remaining `PAGEGRID_*` variables
    /// override individual fields.
    pub fn from_env() -> Result<Self, SourceError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SourceError> {
        let mut config = match lookup("PAGEGRID_CONFIG") {
            Some(path) => Self::from_file(path)?,
            None => {
                let base_url = lookup("PAGEGRID_BASE_URL").ok_or_else(|| {
                    SourceError::Config("PAGEGRID_BASE_URL or PAGEGRID_CONFIG is required".into())
                })?;
                Self::new(base_url)
            }
        };

        if let Some(url) = lookup("PAGEGRID_BASE_URL") {
            config.base_url = url;
        }
        if let Some(size) = lookup("PAGEGRID_PAGE_SIZE") {
            config.page_size = parse_var("PAGEGRID_PAGE_SIZE", &size)?;
        }
        if let Some(secs) = lookup("PAGEGRID_TIMEOUT_SECS") {
            config.timeout_secs = parse_var("PAGEGRID_TIMEOUT_SECS", &secs)?;
        }
        if let Some(token) = lookup("PAGEGRID_TOKEN") {
            config.credentials = Credentials::Bearer { token };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SourceError> {
        if self.base_url.is_empty() {
            return Err(SourceError::Config("base_url must not be empty".into()));
        }
        if self.page_size == 0 {
            return Err(SourceError::Config("page_size must be at least 1".into()));
        }
        Ok(())
    }

    pub fn transport_config(&self) -> TransportConfig {
        TransportConfig {
            base_url: self.base_url.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            credentials: self.credentials.clone(),
        }
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, SourceError> {
    value
        .parse()
        .map_err(|_| SourceError::Config(format!("{key} has an invalid value: {value}")))
}
