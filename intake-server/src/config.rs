//! Server configuration: TOML file plus command-line overrides.
//!
//! Every key is optional; an empty file (or no file) yields the defaults.
//!
//! ```toml
//! bind = "0.0.0.0:8080"
//! endpoint = "/contact"
//! workers = 4
//! data_dir = "/var/lib/contact-intake"
//! utc_offset_minutes = 540
//! back_link = "index.html#contact"
//! ```

use std::path::Path;
use std::path::PathBuf;

use clap::Parser;
use contact_intake_core::HoneypotFilter;
use contact_intake_core::Intake;
use contact_intake_core::Ledger;
use contact_intake_core::OffsetClock;
use contact_intake_core::Pages;
use contact_intake_core::clock::DEFAULT_UTC_OFFSET_MINUTES;
use contact_intake_core::ledger::DEFAULT_LEDGER_FILE;
use contact_intake_core::pages::DEFAULT_SITE_NAME;
use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_ENDPOINT: &str = "/contact";
pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024;
pub const DEFAULT_DATA_DIR: &str = "data";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServerConfig {
    /// Listen address, `host:port`.
    pub bind: String,

    /// Path that receives form posts.
    pub endpoint: String,

    /// Worker threads pulling requests off the listener.
    pub workers: usize,

    /// Request bodies above this size get a 413.
    pub max_body_bytes: usize,

    /// Directory holding the ledger. Created on first accepted submission.
    pub data_dir: PathBuf,

    /// Ledger file name inside `data_dir`.
    pub ledger_file: String,

    /// Fixed offset for `created_at`, in minutes east of UTC.
    pub utc_offset_minutes: i32,

    /// Target of the "back" link on every page.
    pub back_link: String,

    /// Shown in the confirmation page title.
    pub site_name: String,

    /// Hidden form field that must stay blank.
    pub honeypot_field: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: DEFAULT_BIND.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            workers: DEFAULT_WORKERS,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            ledger_file: DEFAULT_LEDGER_FILE.to_string(),
            utc_offset_minutes: DEFAULT_UTC_OFFSET_MINUTES,
            back_link: contact_intake_core::DEFAULT_BACK_LINK.to_string(),
            site_name: DEFAULT_SITE_NAME.to_string(),
            honeypot_field: contact_intake_core::DEFAULT_HONEYPOT_FIELD.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(source)?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Invalid("workers must be at least 1".to_string()));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "max_body_bytes must be at least 1".to_string(),
            ));
        }
        if !self.endpoint.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "endpoint must start with '/': {}",
                self.endpoint
            )));
        }
        let bare_name = Path::new(&self.ledger_file)
            .file_name()
            .is_some_and(|name| name == self.ledger_file.as_str());
        if !bare_name {
            return Err(ConfigError::Invalid(format!(
                "ledger_file must be a plain file name: {}",
                self.ledger_file
            )));
        }
        if self.clock().is_none() {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            )));
        }
        if self.honeypot_field.is_empty() {
            return Err(ConfigError::Invalid(
                "honeypot_field must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ledger(&self) -> Ledger {
        Ledger::in_dir(&self.data_dir, &self.ledger_file)
    }

    fn clock(&self) -> Option<OffsetClock> {
        OffsetClock::from_minutes(self.utc_offset_minutes)
    }

    /// Validate and assemble the handler this config describes.
    pub fn build_intake(&self) -> Result<Intake, ConfigError> {
        self.validate()?;
        let clock = self.clock().ok_or_else(|| {
            ConfigError::Invalid(format!(
                "utc_offset_minutes out of range: {}",
                self.utc_offset_minutes
            ))
        })?;
        Ok(Intake::new(self.ledger())
            .with_spam_filter(HoneypotFilter::new(self.honeypot_field.clone()))
            .with_clock(clock)
            .with_pages(Pages::new(&self.back_link, &self.site_name)))
    }
}

/// Command-line flags. Flags win over the config file.
#[derive(Debug, Parser)]
#[command(name = "contact-intake", version, about = "Contact-form intake server")]
pub struct Cli {
    /// TOML config file.
    #[arg(long, short = 'c', value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Listen address, e.g. 0.0.0.0:8080.
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,

    /// Directory for the CSV ledger.
    #[arg(long, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[arg(long, value_name = "N")]
    pub workers: Option<usize>,
}

impl Cli {
    pub fn resolve(&self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => ServerConfig::load(path)?,
            None => ServerConfig::default(),
        };
        if let Some(bind) = &self.bind {
            config.bind = bind.clone();
        }
        if let Some(dir) = &self.data_dir {
            config.data_dir = dir.clone();
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config.validate()?;
        Ok(config)
    }
}
