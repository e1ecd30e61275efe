use std::path::{Path, PathBuf};

use giveth_types::{Address, TxHash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_BLOCK_EXPLORER: &str = "GIVETH_BLOCKEXPLORER";
pub const ENV_LIQUID_PLEDGING_ADDRESS: &str = "GIVETH_LIQUIDPLEDGING_ADDRESS";
pub const ENV_DELEGATE_COUNT_LIMIT: &str = "GIVETH_DELEGATE_COUNT_LIMIT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Settings for the delegation orchestrator.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DelegationConfig {
    /// Block explorer base URL; transaction links are `{explorer_url}tx/{hash}`.
    pub explorer_url: String,
    /// Liquid-pledging contract of the target network.
    pub liquid_pledging_address: Option<Address>,
    /// Gas added on top of the estimate for multi-transfers.
    pub extra_gas: u64,
    /// Maximum number of distinct pledges loaded for one multi-delegation.
    pub delegate_count_limit: usize,
}

impl Default for DelegationConfig {
    fn default() -> Self {
        Self {
            explorer_url: "https://etherscan.io/".into(),
            liquid_pledging_address: None,
            extra_gas: 100_000,
            delegate_count_limit: 10,
        }
    }
}

impl DelegationConfig {
    pub fn from_toml_str(input: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(input)?;
        config.validated()
    }

    /// Read a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&input)?;
        tracing::debug!(path = %path.display(), "loaded delegation config");
        config.with_env()
    }

    /// Apply overrides from the process environment.
    pub fn with_env(self) -> ConfigResult<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up by environment variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> ConfigResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_BLOCK_EXPLORER) {
            self.explorer_url = url;
        }
        if let Some(address) = lookup(ENV_LIQUID_PLEDGING_ADDRESS) {
            let parsed = address.parse().map_err(|e| ConfigError::InvalidValue {
                key: ENV_LIQUID_PLEDGING_ADDRESS.into(),
                reason: format!("{e}"),
            })?;
            self.liquid_pledging_address = Some(parsed);
        }
        if let Some(limit) = lookup(ENV_DELEGATE_COUNT_LIMIT) {
            self.delegate_count_limit = limit.trim().parse().map_err(|e| ConfigError::InvalidValue {
                key: ENV_DELEGATE_COUNT_LIMIT.into(),
                reason: format!("{e}"),
            })?;
        }
        self.validated()
    }

    pub fn validated(mut self) -> ConfigResult<Self> {
        if self.delegate_count_limit == 0 {
            return Err(ConfigError::InvalidValue {
                key: "delegate_count_limit".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.explorer_url.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "explorer_url".into(),
                reason: "must not be empty".into(),
            });
        }
        if !self.explorer_url.ends_with('/') {
            self.explorer_url.push('/');
        }
        Ok(self)
    }

    pub fn tx_link(&self, hash: &TxHash) -> String {
        format!("{}tx/{}", self.explorer_url, hash)
    }
}
