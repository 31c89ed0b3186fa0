use anyhow::{Context, Result, bail};
use std::{env, str::FromStr};

/// Which document store backs the API.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BackendKind {
    MongoDb,
    Memory,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "mongodb" | "mongo" => Ok(BackendKind::MongoDb),
            "memory" | "in-memory" => Ok(BackendKind::Memory),
            other => bail!("unknown STORE_BACKEND '{other}', expected 'mongodb' or 'memory'"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_address: String,
    pub store_backend: BackendKind,
    /// Full connection URL; overrides host, port and credentials when set.
    pub mongo_url: Option<String>,
    pub mongo_host: String,
    pub mongo_port: u16,
    pub mongo_username: Option<String>,
    pub mongo_password: Option<String>,
    pub database_name: String,
    pub bcrypt_cost: u32,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server_address: "0.0.0.0:8084".to_string(),
            store_backend: BackendKind::MongoDb,
            mongo_url: None,
            mongo_host: "localhost".to_string(),
            mongo_port: 27017,
            mongo_username: None,
            mongo_password: None,
            database_name: "candy_store".to_string(),
            bcrypt_cost: bcrypt::DEFAULT_COST,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: '{raw}'")),
        None => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Config::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        Ok(Config {
            server_address: non_empty("SERVER_ADDRESS").unwrap_or(defaults.server_address),
            store_backend: match non_empty("STORE_BACKEND") {
                Some(raw) => raw.parse()?,
                None => defaults.store_backend,
            },
            mongo_url: non_empty("MONGO_URL"),
            mongo_host: non_empty("MONGO_HOST").unwrap_or(defaults.mongo_host),
            mongo_port: parsed(&non_empty, "MONGO_PORT", defaults.mongo_port)?,
            mongo_username: non_empty("MONGO_USERNAME"),
            mongo_password: non_empty("MONGO_PASSWORD"),
            database_name: non_empty("DATABASE_NAME").unwrap_or(defaults.database_name),
            bcrypt_cost: parsed(&non_empty, "BCRYPT_COST", defaults.bcrypt_cost)?,
            max_upload_bytes: parsed(&non_empty, "MAX_UPLOAD_BYTES", defaults.max_upload_bytes)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = Config::from_lookup(|_| None).unwrap();

        assert_eq!(config.server_address, "0.0.0.0:8084");
        assert_eq!(config.store_backend, BackendKind::MongoDb);
        assert_eq!(config.database_name, "candy_store");
        assert_eq!(config.mongo_port, 27017);
        assert!(config.mongo_url.is_none());
    }

    #[test]
    fn values_are_read_and_parsed() {
        let config = Config::from_lookup(lookup(&[
            ("STORE_BACKEND", "memory"),
            ("MONGO_PORT", "27018"),
            ("BCRYPT_COST", "4"),
            ("MONGO_USERNAME", "candy"),
            ("MONGO_URL", ""),
        ]))
        .unwrap();

        assert_eq!(config.store_backend, BackendKind::Memory);
        assert_eq!(config.mongo_port, 27018);
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(config.mongo_username.as_deref(), Some("candy"));
        assert!(config.mongo_url.is_none());
    }

    #[test]
    fn malformed_values_are_errors() {
        assert!(Config::from_lookup(lookup(&[("MONGO_PORT", "lots")])).is_err());
        assert!(Config::from_lookup(lookup(&[("STORE_BACKEND", "postgres")])).is_err());
    }
}
