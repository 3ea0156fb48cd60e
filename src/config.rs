use std::{env, net::SocketAddr, path::PathBuf};

use anyhow::Context;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://flow_tracker.db";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:5000";
pub const DEFAULT_FRONTEND_PATH: &str = "flow-task-tracker.html";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub frontend_path: PathBuf,
}

impl Config {
    /// Reads `DATABASE_URL`, `BIND_ADDR` and `FRONTEND_PATH`, falling back to defaults.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = lookup("DATABASE_URL").unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());
        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .with_context(|| format!("invalid BIND_ADDR '{bind_addr}'"))?;
        let frontend_path = lookup("FRONTEND_PATH").unwrap_or_else(|| DEFAULT_FRONTEND_PATH.to_string()).into();
        Ok(Self { database_url, bind_addr, frontend_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.bind_addr.port(), 5000);
        assert_eq!(config.frontend_path, PathBuf::from(DEFAULT_FRONTEND_PATH));
    }

    #[test]
    fn overrides_and_rejects_bad_addr() {
        let config = Config::from_lookup(lookup(&[("DATABASE_URL", "sqlite::memory:"), ("BIND_ADDR", "127.0.0.1:8080")])).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_addr.port(), 8080);
        assert!(Config::from_lookup(lookup(&[("BIND_ADDR", "nowhere")])).is_err());
    }
}
