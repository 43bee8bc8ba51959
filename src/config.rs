use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::BranchId;
use crate::error::RosterError;
use crate::import::DEFAULT_CHUNK_SIZE;
use crate::page::DEFAULT_PAGE_SIZE;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub api_base_url: Option<String>,
    #[serde(default)]
    pub messaging_base_url: Option<String>,
    #[serde(default)]
    pub branch: Option<String>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub chunk_size: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub api_base_url: Option<String>,
    pub messaging_base_url: Option<String>,
    pub default_branch: Option<BranchId>,
    pub page_size: usize,
    pub chunk_size: usize,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            schema_version: 1,
            api_base_url: None,
            messaging_base_url: None,
            default_branch: None,
            page_size: DEFAULT_PAGE_SIZE,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, RosterError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from("flock-rm.json"),
        };

        if path.is_none() && !config_path.exists() {
            return Err(RosterError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| RosterError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| RosterError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    /// Like `resolve(None)`, but an absent config file falls back to the
    /// built-in defaults instead of erroring.
    pub fn resolve_optional(path: Option<&str>) -> Result<ResolvedConfig, RosterError> {
        match Self::resolve(path) {
            Err(RosterError::MissingConfig) => Ok(ResolvedConfig::default()),
            other => other,
        }
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, RosterError> {
        let page_size = config.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
        if page_size == 0 {
            return Err(RosterError::InvalidPageSize(page_size));
        }
        let chunk_size = config.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE);
        if chunk_size == 0 {
            return Err(RosterError::InvalidChunkSize(chunk_size));
        }
        let default_branch = config
            .branch
            .as_deref()
            .map(str::parse::<BranchId>)
            .transpose()?;

        Ok(ResolvedConfig {
            schema_version: config.schema_version.unwrap_or(1),
            api_base_url: config.api_base_url,
            messaging_base_url: config.messaging_base_url,
            default_branch,
            page_size,
            chunk_size,
        })
    }
}
