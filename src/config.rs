use serde::Deserialize;
use std::path::PathBuf;

use crate::error::{Result, Unified2Error};
use crate::record::DEFAULT_MAX_RECORD_LENGTH;

/// Top-level configuration loaded from a TOML file.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Spool directory to tail.
    pub spool: SpoolConfig,
}

/// Parameters for tailing one spool directory.
#[derive(Debug, Deserialize, Clone)]
pub struct SpoolConfig {
    /// Directory containing the rotating unified2 files.
    pub directory: PathBuf,
    /// Filename prefix identifying this sensor's files, e.g. `unified2.log`.
    pub prefix: String,
    /// Where the durable (filename, offset) bookmark is kept.
    pub bookmark_path: PathBuf,
    /// How long to sleep between polls when caught up to the end of the
    /// current file, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// Sanity bound on a record's declared body length.
    #[serde(default = "default_max_record_length")]
    pub max_record_length: u32,
}

fn default_poll_interval_ms() -> u64 {
    1000
}

fn default_max_record_length() -> u32 {
    DEFAULT_MAX_RECORD_LENGTH
}

impl Config {
    /// Load configuration from a TOML file at `path`.
    pub fn from_file(path: &std::path::Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Unified2Error::Config(format!("cannot read config file: {e}")))?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| Unified2Error::Config(format!("invalid TOML: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.spool.prefix.is_empty() {
            return Err(Unified2Error::Config("spool.prefix must not be empty".into()));
        }
        if self.spool.poll_interval_ms == 0 {
            return Err(Unified2Error::Config("spool.poll_interval_ms must be > 0".into()));
        }
        if self.spool.max_record_length == 0 {
            return Err(Unified2Error::Config("spool.max_record_length must be > 0".into()));
        }
        Ok(())
    }
}
