//! Detector implementations.

use crate::types::{CheckKind, Detection};
use async_trait::async_trait;
use std::net::IpAddr;
use std::time::{Duration, Instant};
use surge_ping::{Client, Config, ICMP, PingIdentifier, PingSequence};
use tokio::net::TcpStream;
use tokio::time::{timeout, timeout_at};
use tracing::debug;

/// Echo requests sent per ping detection.
const PING_COUNT: u16 = 4;

/// ICMP payload size, same as the classic `ping` default.
const PING_PAYLOAD: [u8; 56] = [0; 56];

/// Detector trait
///
/// Implementations must honor `timeout` and must always return a usable
/// info string, even when the detection fails.
#[async_trait]
pub trait Detector: Send + Sync {
    /// Run the detection of `kind` against `target`
    async fn detect(&self, kind: CheckKind, target: &str, timeout: Duration) -> Detection;
}

/// TCP port detector
#[derive(Debug, Default, Clone)]
pub struct PortDetector;

impl PortDetector {
    /// Connect to `target` (`host:port`) within `timeout_duration`
    pub async fn probe(&self, target: &str, timeout_duration: Duration) -> Detection {
        let start = Instant::now();

        match timeout(timeout_duration, TcpStream::connect(target)).await {
            Ok(Ok(_stream)) => {
                debug!(target = %target, duration_ms = start.elapsed().as_millis(), "TCP connect successful");
                Detection::healthy("Port Open")
            }
            Ok(Err(e)) => Detection::failed("Dial Error", e),
            Err(_) => Detection::failed(
                "Dial Timeout",
                format!("no connection within {:?}", timeout_duration),
            ),
        }
    }
}

/// ICMP echo detector
#[derive(Debug, Default, Clone)]
pub struct PingDetector;

impl PingDetector {
    /// Send a few echo requests to `host` and report average RTT and loss.
    ///
    /// Resolution and every echo request share one deadline of
    /// `timeout_duration`; requests that no longer fit count as lost.
    pub async fn probe(&self, host: &str, timeout_duration: Duration) -> Detection {
        let deadline = tokio::time::Instant::now() + timeout_duration;

        let addr = match timeout_at(deadline, resolve(host)).await {
            Ok(Ok(addr)) => addr,
            Ok(Err(e)) => return Detection::failed("Resolve Error", e),
            Err(_) => {
                return Detection::failed(
                    "Resolve Error",
                    format!("no address within {:?}", timeout_duration),
                );
            }
        };

        let config = match addr {
            IpAddr::V4(_) => Config::default(),
            IpAddr::V6(_) => Config::builder().kind(ICMP::V6).build(),
        };

        // Raw ICMP sockets usually need CAP_NET_RAW or root
        let client = match Client::new(&config) {
            Ok(client) => client,
            Err(e) => return Detection::failed("New Pinger Error", e),
        };

        let mut pinger = client.pinger(addr, PingIdentifier(rand::random())).await;

        let mut rtts = Vec::with_capacity(usize::from(PING_COUNT));
        for seq in 0..PING_COUNT {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let Some(budget) = echo_budget(remaining, PING_COUNT - seq) else {
                debug!(host = %host, seq, "Deadline reached before echo request");
                break;
            };
            pinger.timeout(budget);

            match timeout_at(deadline, pinger.ping(PingSequence(seq), &PING_PAYLOAD)).await {
                Ok(Ok((_packet, rtt))) => rtts.push(rtt),
                Ok(Err(e)) => debug!(host = %host, seq, error = %e, "Echo request lost"),
                Err(_) => debug!(host = %host, seq, "Echo request hit the deadline"),
            }
        }

        if rtts.is_empty() {
            return Detection::unhealthy("Time Out, Loss 100%");
        }

        let received = rtts.len() as u32;
        let avg = rtts.iter().sum::<Duration>() / received;
        let loss = f64::from(u32::from(PING_COUNT) - received) * 100.0 / f64::from(PING_COUNT);
        Detection::healthy(format!("AvgRtt:{}ms, Loss {:.0}%", avg.as_millis(), loss))
    }
}

/// Share of `remaining` for the next of `left` echo requests, `None` once
/// nothing usable is left.
fn echo_budget(remaining: Duration, left: u16) -> Option<Duration> {
    if remaining < Duration::from_millis(1) || left == 0 {
        return None;
    }
    Some((remaining / u32::from(left)).max(Duration::from_millis(1)))
}

async fn resolve(host: &str) -> std::io::Result<IpAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    tokio::net::lookup_host(format!("{}:0", host))
        .await?
        .map(|addr| addr.ip())
        .next()
        .ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("no address for {}", host),
            )
        })
}

/// HTTP GET liveness detector
///
/// Any HTTP response counts as alive, regardless of its status code.
#[derive(Debug, Clone)]
pub struct HttpGetDetector {
    client: reqwest::Client,
}

impl HttpGetDetector {
    /// Create a new HTTP GET detector
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .pool_max_idle_per_host(10)
            .build()?;

        Ok(Self { client })
    }

    /// Fetch `url` within `timeout_duration`
    pub async fn probe(&self, url: &str, timeout_duration: Duration) -> Detection {
        let start = Instant::now();
        let request = self.client.get(url).timeout(timeout_duration);

        match timeout(timeout_duration, request.send()).await {
            Ok(Ok(response)) => {
                debug!(
                    url = %url,
                    status = response.status().as_u16(),
                    duration_ms = start.elapsed().as_millis(),
                    "HTTP GET answered"
                );
                Detection::healthy("Alive")
            }
            Ok(Err(e)) => Detection::failed("Get Error", e),
            Err(_) => Detection::failed(
                "Get Error",
                format!("no response within {:?}", timeout_duration),
            ),
        }
    }
}

/// Default detector registry backed by the network detectors
#[derive(Debug, Clone)]
pub struct NetworkDetector {
    port: PortDetector,
    ping: PingDetector,
    get: HttpGetDetector,
}

impl NetworkDetector {
    /// Create the registry
    pub fn new() -> Result<Self, reqwest::Error> {
        Ok(Self {
            port: PortDetector,
            ping: PingDetector,
            get: HttpGetDetector::new()?,
        })
    }
}

#[async_trait]
impl Detector for NetworkDetector {
    async fn detect(&self, kind: CheckKind, target: &str, timeout: Duration) -> Detection {
        match kind {
            CheckKind::Port => self.port.probe(target, timeout).await,
            CheckKind::Ping => self.ping.probe(target, timeout).await,
            CheckKind::Get => self.get.probe(target, timeout).await,
        }
    }
}
