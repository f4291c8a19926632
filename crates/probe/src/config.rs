//! Configuration loading and validation for the probe

use crate::engine::EngineConfig;
use crate::job::Job;
use detectors::CheckKind;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use validator::{Validate, ValidationError, ValidationErrors};

/// Configuration error types
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found in search paths")]
    FileNotFound,

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    ParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(#[from] ValidationErrors),

    #[error("No jobs configured")]
    NoJobs,
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Name used in report subjects and as the mail sender name
    pub probe_name: String,

    /// Listening port metadata; not used by the engine
    #[serde(default)]
    pub port: String,

    /// Per-check timeout
    #[serde(default = "default_timeout", with = "humantime_serde")]
    pub timeout: Duration,

    /// Interval between scheduled rounds
    #[serde(with = "humantime_serde")]
    pub detect_interval: Duration,

    /// Mail settings; notifications are enabled when present
    #[serde(default)]
    pub email: Option<EmailSettings>,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub jobs: Vec<JobConfig>,
}

/// Mail delivery settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct EmailSettings {
    #[validate(email)]
    pub to: String,

    #[validate(length(min = 1))]
    pub host: String,

    #[validate(range(min = 1))]
    pub port: u16,

    /// SMTP login, also used as the sender address
    #[validate(email)]
    pub user: String,

    pub authorization_code: String,

    /// Interval between alive reports; absent or zero disables them
    #[serde(default, with = "humantime_serde")]
    pub alive_interval: Option<Duration>,
}

/// One monitored job
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct JobConfig {
    #[validate(length(min = 1))]
    pub name: String,

    pub check: CheckKind,

    #[validate(length(min = 1))]
    pub target: String,
}

/// Logging settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<String>,
}

fn default_timeout() -> Duration {
    Duration::from_secs(2)
}

impl Validate for Config {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.probe_name.trim().is_empty() {
            errors.add("probe_name", ValidationError::new("probe_name_empty"));
        }
        if let Err(e) = validate_timeout(&self.timeout) {
            errors.add("timeout", e);
        }
        if let Err(e) = validate_detect_interval(&self.detect_interval) {
            errors.add("detect_interval", e);
        }
        if let Err(e) = validate_unique_names(&self.jobs) {
            errors.add("jobs", e);
        }
        if !errors.errors().is_empty() {
            return Err(errors);
        }

        if let Some(email) = &self.email {
            email.validate()?;
        }
        for job in &self.jobs {
            job.validate()?;
        }
        Ok(())
    }
}

// Custom validators

fn validate_timeout(timeout: &Duration) -> Result<(), ValidationError> {
    if timeout.is_zero() {
        return Err(ValidationError::new("timeout_zero"));
    }
    Ok(())
}

fn validate_detect_interval(interval: &Duration) -> Result<(), ValidationError> {
    if interval.is_zero() {
        return Err(ValidationError::new("detect_interval_zero"));
    }
    Ok(())
}

fn validate_unique_names(jobs: &[JobConfig]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    if jobs.iter().all(|job| seen.insert(job.name.as_str())) {
        Ok(())
    } else {
        Err(ValidationError::new("duplicate_job_name"))
    }
}

// Configuration loading implementation

impl Config {
    /// Load configuration from `path`, or from the default search paths
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => {
                let path = Self::find_config_file().ok_or(ConfigError::FileNotFound)?;
                Self::load_from_file(&path)
            }
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a YAML document
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(contents)?;
        if config.jobs.is_empty() {
            return Err(ConfigError::NoJobs);
        }
        config.validate()?;
        Ok(config)
    }

    /// Find configuration file in standard locations
    fn find_config_file() -> Option<PathBuf> {
        let mut paths = vec![PathBuf::from("/etc/probe/probe.yaml")];

        if let Some(home_path) = Self::home_config_path() {
            paths.push(home_path);
        }

        paths.push(PathBuf::from("./probe.yaml"));

        paths
            .into_iter()
            .find(|p: &PathBuf| p.exists() && p.is_file())
    }

    /// Get home directory config path
    fn home_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(".config/probe/probe.yaml"))
    }

    /// Whether reports are delivered at all
    pub fn notifications_enabled(&self) -> bool {
        self.email.is_some()
    }

    /// Convert to the engine's immutable settings
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig {
            probe_name: self.probe_name.clone(),
            timeout: self.timeout,
            detect_interval: self.detect_interval,
            alive_interval: self
                .email
                .as_ref()
                .and_then(|email| email.alive_interval)
                .filter(|interval| !interval.is_zero()),
        }
    }

    /// Jobs in configuration order, none of them probed yet
    pub fn to_jobs(&self) -> Vec<Job> {
        self.jobs
            .iter()
            .map(|job| Job::new(job.name.clone(), job.check, job.target.clone()))
            .collect()
    }
}
