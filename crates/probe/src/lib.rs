//! Periodic health-monitoring probe.
//!
//! The probe holds a fixed set of jobs, each pairing a target with a
//! detector kind (`port`, `ping` or `get`). Every detection interval it runs
//! a round: all detectors concurrently, then a diff against the previously
//! stored status. Reports go out only on status changes, plus a start
//! report, optional periodic alive reports and an exit report.
//!
//! # Components
//!
//! - **Job**: one monitored target and its last known status
//! - **Round**: concurrent execution of every job and status diff
//! - **Report**: HTML rendering of job blocks and report subjects
//! - **Ticker**: recurring timer with a cancellation hook
//! - **Notifier**: delivery of rendered reports (SMTP)
//! - **Engine**: owns the jobs and wires rounds, reports and schedules

pub mod config;
pub mod engine;
pub mod job;
pub mod notifier;
pub mod report;
pub mod round;
pub mod ticker;

pub use config::{Config, ConfigError};
pub use engine::{EngineConfig, ProbeEngine, ProbeHandle};
pub use job::{Job, JobSet};
pub use notifier::{Notifier, SmtpNotifier};
pub use round::{RoundResult, run_round};
pub use ticker::Ticker;
