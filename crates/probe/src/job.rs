//! Monitored jobs and the ordered set the engine owns.

use common::{Error, Result};
use detectors::CheckKind;

/// One monitored target and its last known status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    /// Display name
    pub name: String,

    /// Detector kind run against `target`
    pub kind: CheckKind,

    /// Address, host or URL handed to the detector
    pub target: String,

    /// Health reported by the most recent round
    pub last_healthy: bool,

    /// Info text reported by the most recent round
    pub last_info: String,
}

impl Job {
    /// Create a job that has never been probed
    pub fn new(name: impl Into<String>, kind: CheckKind, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            target: target.into(),
            last_healthy: false,
            last_info: String::new(),
        }
    }
}

/// Ordered, non-empty sequence of jobs. A job's identity is its index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobSet {
    jobs: Vec<Job>,
}

impl JobSet {
    /// Build a job set, rejecting an empty one
    pub fn new(jobs: Vec<Job>) -> Result<Self> {
        if jobs.is_empty() {
            return Err(Error::config("no jobs configured"));
        }
        Ok(Self { jobs })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Whether the set has no jobs
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Job> {
        self.jobs.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Job> {
        self.jobs.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Job> {
        self.jobs.iter_mut()
    }

    /// Display names in index order
    pub fn names(&self) -> Vec<&str> {
        self.jobs.iter().map(|job| job.name.as_str()).collect()
    }
}
