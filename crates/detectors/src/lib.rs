//! Health detectors for the probe.
//!
//! A detector maps a target and a timeout to a [`Detection`]: a healthy flag
//! plus a short human readable info string. Three kinds exist:
//! - `port`: TCP connect reachability
//! - `ping`: ICMP echo latency and loss
//! - `get`: HTTP GET liveness
//!
//! Detectors never fail outright. A network error is folded into an
//! unhealthy [`Detection`] that still carries an info string and the
//! underlying error text.
//!
//! # Example
//!
//! ```no_run
//! use detectors::{CheckKind, Detector, NetworkDetector};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let detector = NetworkDetector::new()?;
//! let detection = detector
//!     .detect(CheckKind::Port, "192.168.1.100:80", Duration::from_secs(2))
//!     .await;
//!
//! println!("healthy={} info={}", detection.healthy, detection.info);
//! # Ok(())
//! # }
//! ```

pub mod checkers;
pub mod types;

pub use checkers::{Detector, HttpGetDetector, NetworkDetector, PingDetector, PortDetector};
pub use types::{CheckKind, Detection};
