//! Detector types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of check a job runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckKind {
    /// TCP connect to `host:port`
    Port,
    /// ICMP echo to a host name or address
    Ping,
    /// HTTP GET of a URL
    Get,
}

impl CheckKind {
    /// Name used in configuration files and reports.
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckKind::Port => "port",
            CheckKind::Ping => "ping",
            CheckKind::Get => "get",
        }
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "port" => Ok(CheckKind::Port),
            "ping" => Ok(CheckKind::Ping),
            "get" => Ok(CheckKind::Get),
            other => Err(format!("unknown check kind: {}", other)),
        }
    }
}

/// Outcome of a single detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Detection {
    /// Whether the target is considered healthy
    pub healthy: bool,

    /// Short status text shown in reports
    pub info: String,

    /// Underlying error, if the detection failed
    pub error: Option<String>,
}

impl Detection {
    /// Create a healthy detection
    pub fn healthy(info: impl Into<String>) -> Self {
        Self {
            healthy: true,
            info: info.into(),
            error: None,
        }
    }

    /// Create an unhealthy detection without an underlying error
    pub fn unhealthy(info: impl Into<String>) -> Self {
        Self {
            healthy: false,
            info: info.into(),
            error: None,
        }
    }

    /// Create an unhealthy detection caused by an error
    pub fn failed(info: impl Into<String>, error: impl fmt::Display) -> Self {
        Self {
            healthy: false,
            info: info.into(),
            error: Some(error.to_string()),
        }
    }
}
