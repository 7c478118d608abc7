//! Configuration schema, defaults, and layered loading.
//!
//! Precedence: defaults < config file < environment

use anyhow::{ensure, Context, Result};
use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::batch::DEFAULT_BATCH_LIMIT;

pub fn config_path() -> PathBuf {
    ProjectDirs::from("", "", "anonsend")
        .map(|p| p.config_dir().join("config.toml"))
        .unwrap_or_else(|| PathBuf::from("anonsend.toml"))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// WebSocket endpoint of the anonymization service.
    pub server_url: String,
    /// Max files per batch. Bounds message size and peak memory only; the
    /// server never sees this number.
    pub batch_limit: usize,
    /// Where the returned archive is written.
    pub output_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "ws://localhost:8080/upload".to_string(),
            batch_limit: DEFAULT_BATCH_LIMIT,
            output_dir: PathBuf::from("."),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path()))
            .merge(Env::prefixed("ANONSEND_"))
            .extract()
            .context("Invalid configuration")?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.batch_limit >= 1, "batch_limit must be at least 1");
        ensure!(
            self.server_url.starts_with("ws://") || self.server_url.starts_with("wss://"),
            "server_url must be a ws:// or wss:// endpoint"
        );
        Ok(())
    }
}
