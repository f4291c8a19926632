//! Probe engine: owns the jobs, runs rounds and drives both schedules.

use crate::config::Config;
use crate::job::JobSet;
use crate::notifier::{Notifier, SmtpNotifier};
use crate::report;
use crate::round::{RoundResult, run_round};
use crate::ticker::Ticker;
use common::{Error, Result};
use detectors::{Detector, NetworkDetector};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

/// Immutable engine settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Name used in report subjects
    pub probe_name: String,

    /// Timeout handed to every detection
    pub timeout: Duration,

    /// Interval between scheduled rounds
    pub detect_interval: Duration,

    /// Interval between alive reports, if enabled
    pub alive_interval: Option<Duration>,
}

/// Periodic probe of a fixed job set.
///
/// The job set sits behind a single lock that is held for a whole round,
/// so rounds never overlap and reports only ever see completed rounds.
/// Outbound delivery is serialised by a second lock.
pub struct ProbeEngine {
    config: EngineConfig,
    jobs: Mutex<JobSet>,
    detector: Arc<dyn Detector>,
    notifier: Option<Arc<dyn Notifier>>,
    send_lock: Mutex<()>,
}

impl ProbeEngine {
    /// Create an engine; notifications are disabled when `notifier` is `None`
    pub fn new(
        config: EngineConfig,
        jobs: JobSet,
        detector: Arc<dyn Detector>,
        notifier: Option<Arc<dyn Notifier>>,
    ) -> Self {
        Self {
            config,
            jobs: Mutex::new(jobs),
            detector,
            notifier,
            send_lock: Mutex::new(()),
        }
    }

    /// Create an engine with the network detectors and, if configured, SMTP delivery
    pub fn from_config(config: &Config) -> Result<Self> {
        let jobs = JobSet::new(config.to_jobs())?;
        let detector = NetworkDetector::new().map_err(Error::detection)?;
        let notifier = match &config.email {
            Some(email) => {
                let smtp = SmtpNotifier::new(&config.probe_name, email)?;
                Some(Arc::new(smtp) as Arc<dyn Notifier>)
            }
            None => None,
        };

        Ok(Self::new(
            config.to_engine_config(),
            jobs,
            Arc::new(detector),
            notifier,
        ))
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifier.is_some()
    }

    /// Copy of the job set as left by the last completed round
    pub async fn snapshot(&self) -> JobSet {
        self.jobs.lock().await.clone()
    }

    /// Run one round. Waits for any round already in progress.
    pub async fn round(&self) -> RoundResult {
        let mut jobs = self.jobs.lock().await;
        run_round(&mut jobs, self.detector.as_ref(), self.config.timeout).await
    }

    /// Render the given jobs (all jobs when empty) from the last completed round
    pub async fn report(&self, indices: &[usize]) -> String {
        let jobs = self.jobs.lock().await;
        report::render_report(&jobs, indices)
    }

    /// Deliver a report. Failures are logged and dropped.
    pub async fn send(&self, subject: &str, body: &str) {
        let Some(notifier) = &self.notifier else {
            return;
        };

        let _guard = self.send_lock.lock().await;
        match notifier.send(subject, body).await {
            Ok(()) => info!(subject = %subject, "Report sent"),
            Err(e) => warn!(subject = %subject, error = %e, "Failed to send report"),
        }
    }

    /// Send a report of the changed jobs, if any changed.
    ///
    /// Returns whether a report was sent.
    pub async fn notify_changes(&self, result: &RoundResult) -> bool {
        if !self.notifications_enabled() || !result.has_changes() {
            return false;
        }

        let body = self.report(&result.changed).await;
        self.send(&report::change_subject(&self.config.probe_name), &body)
            .await;
        true
    }

    /// One tick of the main schedule
    pub async fn scheduled_round(&self) {
        info!("Scheduled detection");
        let result = self.round().await;
        if result.has_changes() {
            info!(changed = ?result.changed, "Job status changed");
        }
        self.notify_changes(&result).await;
    }

    /// Report every job as left by the last completed round
    pub async fn alive_report(&self) {
        let body = self.report(&[]).await;
        self.send(&report::alive_subject(&self.config.probe_name), &body)
            .await;
    }

    /// Shutdown hook of the main schedule
    pub async fn exit_report(&self) {
        self.send(
            &report::exit_subject(&self.config.probe_name),
            report::EXIT_BODY,
        )
        .await;
        info!("Schedule exit");
    }

    /// Run the first round, send the start report and spawn the schedules
    pub async fn start(self: Arc<Self>) -> Result<ProbeHandle> {
        // Build both tickers first so a bad interval fails before any probing
        let main_ticker = Ticker::new(self.config.detect_interval)?;
        let alive_ticker = match self.config.alive_interval {
            Some(period) if self.notifications_enabled() => Some(Ticker::new(period)?),
            _ => None,
        };

        {
            let jobs = self.jobs.lock().await;
            info!(probe = %self.config.probe_name, jobs = ?jobs.names(), "Probe starting");
        }

        info!("First detection");
        let first = self.round().await;
        info!(completed = first.completed, "First detection finished");
        if self.notifications_enabled() {
            let body = self.report(&[]).await;
            self.send(&report::start_subject(&self.config.probe_name), &body)
                .await;
        }

        let alive = alive_ticker.map(|ticker| {
            info!(interval_ms = ticker.period().as_millis(), "Alive reports enabled");
            let engine = self.clone();
            ticker.spawn(
                move || {
                    let engine = engine.clone();
                    async move { engine.alive_report().await }
                },
                || async {},
            )
        });

        let shutdown = main_ticker.token();
        let tick_engine = self.clone();
        let exit_engine = self.clone();
        let main = main_ticker.spawn(
            move || {
                let engine = tick_engine.clone();
                async move { engine.scheduled_round().await }
            },
            move || async move { exit_engine.exit_report().await },
        );

        Ok(ProbeHandle {
            shutdown,
            main: Some(main),
            alive,
        })
    }

    /// Start, wait for `signal`, then shut down.
    ///
    /// If listening for the signal fails the schedules are still shut down
    /// and the error is returned.
    pub async fn run_until<F>(self: Arc<Self>, signal: F) -> Result<()>
    where
        F: Future<Output = std::io::Result<()>>,
    {
        let mut handle = self.start().await?;
        let received = signal.await;
        match &received {
            Ok(()) => info!("Interrupt received, stopping"),
            Err(e) => error!(error = %e, "Failed to listen for interrupt, stopping"),
        }
        handle.shutdown().await;
        received.map_err(Error::from)
    }
}

/// Running schedules of a started engine
pub struct ProbeHandle {
    shutdown: CancellationToken,
    main: Option<JoinHandle<()>>,
    alive: Option<JoinHandle<()>>,
}

impl ProbeHandle {
    /// Token cancelling the main schedule; its exit report still runs once
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop both schedules and wait for the exit report.
    ///
    /// A round in progress finishes first. Calling this again does nothing.
    pub async fn shutdown(&mut self) {
        if let Some(alive) = self.alive.take() {
            alive.abort();
        }

        self.shutdown.cancel();
        if let Some(main) = self.main.take() {
            if let Err(e) = main.await {
                warn!(error = %e, "Main schedule task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::job::Job;
    use crate::notifier::MockNotifier;
    use async_trait::async_trait;
    use detectors::{CheckKind, Detection};

    struct AlwaysUp;

    #[async_trait]
    impl Detector for AlwaysUp {
        async fn detect(&self, _kind: CheckKind, _target: &str, _timeout: Duration) -> Detection {
            Detection::healthy("Port Open")
        }
    }

    fn engine_config() -> EngineConfig {
        EngineConfig {
            probe_name: "office".to_string(),
            timeout: Duration::from_secs(2),
            detect_interval: Duration::from_secs(60),
            alive_interval: Some(Duration::from_secs(300)),
        }
    }

    fn jobs() -> JobSet {
        JobSet::new(vec![
            Job::new("web", CheckKind::Port, "10.0.0.1:80"),
            Job::new("db", CheckKind::Port, "10.0.0.2:5432"),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_notify_changes_gate() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .withf(|subject, body| {
                subject.to_string() == "[office] Notification of status changes"
                    && body.contains("[db]")
                    && !body.contains("[web]")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let engine = ProbeEngine::new(
            engine_config(),
            jobs(),
            Arc::new(AlwaysUp),
            Some(Arc::new(notifier)),
        );

        assert!(!engine.notify_changes(&RoundResult::default()).await);
        let result = RoundResult {
            changed: vec![1],
            completed: 2,
        };
        assert!(engine.notify_changes(&result).await);
    }

    #[tokio::test]
    async fn test_delivery_failure_is_not_fatal() {
        let mut notifier = MockNotifier::new();
        notifier
            .expect_send()
            .times(1)
            .returning(|_, _| Err(Error::notification("relay refused")));

        let engine = ProbeEngine::new(
            engine_config(),
            jobs(),
            Arc::new(AlwaysUp),
            Some(Arc::new(notifier)),
        );

        engine.alive_report().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabled_notifications_skip_every_report() {
        // Without a notifier every report path is a no-op
        let engine = Arc::new(ProbeEngine::new(
            engine_config(),
            jobs(),
            Arc::new(AlwaysUp),
            None,
        ));
        assert!(!engine.notifications_enabled());

        let mut handle = engine.clone().start().await.unwrap();
        let snapshot = engine.snapshot().await;
        assert!(snapshot.iter().all(|job| job.last_healthy));

        tokio::time::sleep(Duration::from_secs(600)).await;
        handle.shutdown().await;

        let result = RoundResult {
            changed: vec![0],
            completed: 2,
        };
        assert!(!engine.notify_changes(&result).await);
    }
}
