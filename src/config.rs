//! Runtime configuration.
//!
//! Resolution order, later wins:
//! 1. built-in defaults
//! 2. a TOML file named by `SLUICE_CONFIG`, if set
//! 3. `SLUICE_ADDR`, `SLUICE_UPLOAD_ROOT` and `RUST_LOG`
//!
//! ```toml
//! bind_address = "127.0.0.1:8080"
//! upload_root  = "/var/tmp/sluice"
//! log_filter   = "sluice=debug,info"
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::{Error, Result};

/// Settings for the demo server.
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Listen address (default: 0.0.0.0:3000)
    pub bind_address: SocketAddr,

    /// Directory uploads are written under (default: `temp`)
    pub upload_root: PathBuf,

    /// `tracing_subscriber::EnvFilter` directives (default: `info`)
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([0, 0, 0, 0], 3000)),
            upload_root: PathBuf::from("temp"),
            log_filter: "info".to_owned(),
        }
    }
}

impl Config {
    /// Loads from the process environment.
    pub fn load() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = match var("SLUICE_CONFIG") {
            Some(path) => {
                let contents = std::fs::read_to_string(&path)
                    .map_err(|e| Error::Config(format!("{path}: {e}")))?;
                Self::from_toml(&contents)?
            }
            None => Self::default(),
        };

        if let Some(addr) = var("SLUICE_ADDR") {
            config.bind_address = addr
                .parse()
                .map_err(|e| Error::Config(format!("SLUICE_ADDR `{addr}`: {e}")))?;
        }
        if let Some(root) = var("SLUICE_UPLOAD_ROOT") {
            config.upload_root = PathBuf::from(root);
        }
        if let Some(filter) = var("RUST_LOG") {
            config.log_filter = filter;
        }

        Ok(config)
    }
}
