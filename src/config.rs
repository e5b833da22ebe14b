use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

pub const DEFAULT_BUFFER: usize = 100;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    pub redis: RedisConfig,
    pub files: FilesConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RedisConfig {
    /// `host:port` of the server.
    pub host: String,
    /// Prefix of the two keys written: `<key>:hash` and `<key>:list`.
    pub key: String,
    /// Pipeline buffer size. Read for compatibility; records are sent one by one.
    #[serde(default = "default_buffer")]
    pub buffer: usize,
    /// Send the hash write and sorted-set add of one record as a transaction.
    #[serde(default)]
    pub atomic_insert: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FilesConfig {
    pub csv: PathBuf,
}

fn default_buffer() -> usize {
    DEFAULT_BUFFER
}

impl Config {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Config> {
        let text = fs::read_to_string(path.as_ref()).map_err(|err| {
            Error::Config(format!("cannot read {}: {}", path.as_ref().display(), err))
        })?;
        text.parse()
    }

    /// Checks the fields a run cannot do without. Called once, after command
    /// line overrides are applied.
    pub fn validate(&self) -> Result<()> {
        if self.redis.host.trim().is_empty() {
            return Err(Error::Config("redis.host is empty".to_string()));
        }
        if self.redis.key.is_empty() {
            return Err(Error::Config("redis.key is empty".to_string()));
        }
        Ok(())
    }
}

impl std::str::FromStr for Config {
    type Err = Error;

    fn from_str(s: &str) -> Result<Config> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full() {
        let config: Config = r#"
            [redis]
            host = "10.0.0.1:6380"
            key = "stocks"
            buffer = 8
            atomic_insert = true

            [files]
            csv = "data/stocks.csv"
        "#
        .parse()
        .unwrap();
        assert_eq!(config.redis.host, "10.0.0.1:6380");
        assert_eq!(config.redis.key, "stocks");
        assert_eq!(config.redis.buffer, 8);
        assert!(config.redis.atomic_insert);
        assert_eq!(config.files.csv, PathBuf::from("data/stocks.csv"));
    }

    #[test]
    fn test_defaults() {
        let config: Config = "[redis]\nhost = \"localhost:6379\"\nkey = \"k\"\n[files]\ncsv = \"a.csv\"\n"
            .parse()
            .unwrap();
        assert_eq!(config.redis.buffer, DEFAULT_BUFFER);
        assert!(!config.redis.atomic_insert);
    }

    #[test]
    fn test_missing_section() {
        let err = "[redis]\nhost = \"localhost:6379\"\nkey = \"k\"\n"
            .parse::<Config>()
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_empty_key() {
        let mut config: Config =
            "[redis]\nhost = \"localhost:6379\"\nkey = \"\"\n[files]\ncsv = \"a.csv\"\n"
                .parse()
                .unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        // an override can still supply the key
        config.redis.key = "stocks".to_string();
        config.validate().unwrap();
    }

    #[test]
    fn test_empty_host() {
        let config: Config = "[redis]\nhost = \" \"\nkey = \"k\"\n[files]\ncsv = \"a.csv\"\n"
            .parse()
            .unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn test_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[redis]\nhost = \"h:1\"\nkey = \"k\"\n[files]\ncsv = \"a.csv\"\n",
        )
        .unwrap();
        assert_eq!(Config::from_path(&path).unwrap().redis.host, "h:1");
        assert!(matches!(
            Config::from_path(dir.path().join("nope.toml")),
            Err(Error::Config(_))
        ));
    }
}
