//! Service configuration, read from the environment (and `.env` if present).

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

use crate::flow::FormVariant;

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres URL of the remote record service. `None` runs on the local mirror alone.
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub bind_addr: SocketAddr,
    /// Root directory of the file-backed local mirror
    pub data_dir: PathBuf,
    pub form_variant: FormVariant,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            db_max_connections: 5,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            data_dir: PathBuf::from("directory"),
            form_variant: FormVariant::Extended,
        }
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Ok(Self {
            database_url: var("DATABASE_URL"),
            db_max_connections: match var("DB_MAX_CONNECTIONS") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("DB_MAX_CONNECTIONS `{}` is not a number", raw))?,
                None => defaults.db_max_connections,
            },
            bind_addr: match var("BIND_ADDR") {
                Some(raw) => raw
                    .trim()
                    .parse()
                    .with_context(|| format!("BIND_ADDR `{}` is not a socket address", raw))?,
                None => defaults.bind_addr,
            },
            data_dir: var("DATA_DIR").map(PathBuf::from).unwrap_or(defaults.data_dir),
            form_variant: match var("FORM_VARIANT") {
                Some(raw) => raw.parse()?,
                None => defaults.form_variant,
            },
        })
    }
}
