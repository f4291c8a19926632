//! Recurring timer with a cancellation hook.

use common::{Error, Result};
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Runs a callback every period until cancelled, then runs an exit callback once.
pub struct Ticker {
    period: Duration,
    token: CancellationToken,
}

impl Ticker {
    /// Create a ticker; a zero period is rejected
    pub fn new(period: Duration) -> Result<Self> {
        if period.is_zero() {
            return Err(Error::schedule("ticker period must be greater than zero"));
        }
        Ok(Self {
            period,
            token: CancellationToken::new(),
        })
    }

    /// Token that stops the ticker when cancelled
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Spawn the timer loop.
    ///
    /// The first tick fires one period after spawning. A tick that is
    /// already running is never interrupted; cancellation is observed
    /// between ticks, after which `on_exit` runs exactly once.
    pub fn spawn<L, LF, E, EF>(self, mut on_tick: L, on_exit: E) -> JoinHandle<()>
    where
        L: FnMut() -> LF + Send + 'static,
        LF: Future<Output = ()> + Send + 'static,
        E: FnOnce() -> EF + Send + 'static,
        EF: Future<Output = ()> + Send + 'static,
    {
        let Self { period, token } = self;

        tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
            ticks.tick().await; // Skip first immediate tick

            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        debug!(period_ms = period.as_millis(), "Ticker cancelled");
                        on_exit().await;
                        break;
                    }
                    _ = ticks.tick() => {
                        on_tick().await;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_zero_period_is_rejected() {
        assert!(Ticker::new(Duration::ZERO).is_err());
        assert!(Ticker::new(Duration::from_millis(1)).is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_then_exits_once() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let exits = Arc::new(AtomicUsize::new(0));

        let ticker = Ticker::new(Duration::from_secs(10)).unwrap();
        let token = ticker.token();
        let handle = {
            let ticks = ticks.clone();
            let exits = exits.clone();
            ticker.spawn(
                move || {
                    let ticks = ticks.clone();
                    async move {
                        ticks.fetch_add(1, Ordering::SeqCst);
                    }
                },
                move || async move {
                    exits.fetch_add(1, Ordering::SeqCst);
                },
            )
        };

        // No immediate tick
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);

        token.cancel();
        token.cancel();
        handle.await.unwrap();
        assert_eq!(exits.load(Ordering::SeqCst), 1);

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }
}
