//! Debounced rescan scheduling.
//!
//! Pages mutate in bursts. Rather than rescanning on every mutation, the
//! [`RescanDebouncer`] collapses a burst into a single notification: each
//! trigger bumps a generation counter and arms a timer, and only the timer
//! whose generation is still current when it fires delivers a
//! notification. Earlier timers wake, observe a newer generation, and drop
//! out silently.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::config::Settings;

/// Collapses bursts of page mutations into single rescan notifications.
///
/// Cloning is cheap; all clones share the same generation counter and
/// notification channel.
#[derive(Debug, Clone)]
pub struct RescanDebouncer {
    quiet_period: Duration,
    generation: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<u64>,
}

impl RescanDebouncer {
    /// Creates a debouncer with the given quiet period and returns it
    /// together with the receiver that observes rescan notifications.
    ///
    /// Each notification carries the generation that survived its quiet
    /// period.
    #[must_use]
    pub fn new(quiet_period: Duration) -> (Self, mpsc::UnboundedReceiver<u64>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                quiet_period,
                generation: Arc::new(AtomicU64::new(0)),
                tx,
            },
            rx,
        )
    }

    /// Builds the debouncer a page host should run, honoring the auto-scan
    /// setting. Returns `None` when automatic rescanning is disabled; the
    /// host then rescans only on explicit request.
    #[must_use]
    pub fn from_settings(
        settings: &Settings,
        quiet_period: Duration,
    ) -> Option<(Self, mpsc::UnboundedReceiver<u64>)> {
        settings.auto_scan.then(|| Self::new(quiet_period))
    }

    /// Records a mutation and (re)arms the quiet-period timer.
    ///
    /// Any timer armed by an earlier trigger is superseded: it still
    /// wakes, but finds its generation stale and delivers nothing.
    pub fn trigger(&self) {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        trace!(generation, "rescan trigger");

        let quiet_period = self.quiet_period;
        let current = Arc::clone(&self.generation);
        let tx = self.tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(quiet_period).await;
            if current.load(Ordering::SeqCst) == generation {
                debug!(generation, "quiet period elapsed, rescan due");
                // Receiver may be gone during shutdown; nothing to do then.
                let _ = tx.send(generation);
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_single_trigger_fires_after_quiet_period() {
        let (debouncer, mut rx) = RescanDebouncer::new(Duration::from_millis(500));
        debouncer.trigger();

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(rx.try_recv().unwrap(), 1);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_collapses_to_latest_generation() {
        let (debouncer, mut rx) = RescanDebouncer::new(Duration::from_millis(500));
        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(100)).await;
        debouncer.trigger();

        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(rx.try_recv().unwrap(), 3);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_nothing_fires_inside_quiet_period() {
        let (debouncer, mut rx) = RescanDebouncer::new(Duration::from_millis(500));
        debouncer.trigger();

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_separate_bursts_fire_separately() {
        let (debouncer, mut rx) = RescanDebouncer::new(Duration::from_millis(500));
        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(rx.try_recv().unwrap(), 1);

        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(rx.try_recv().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_from_settings_honors_auto_scan() {
        let settings = Settings {
            auto_scan: false,
            ..Settings::default()
        };
        assert!(RescanDebouncer::from_settings(&settings, Duration::from_millis(500)).is_none());

        let (debouncer, mut rx) =
            RescanDebouncer::from_settings(&Settings::default(), Duration::from_millis(500))
                .unwrap();
        debouncer.trigger();
        tokio::time::sleep(Duration::from_millis(600)).await;
        assert_eq!(rx.try_recv().unwrap(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropped_receiver_is_tolerated() {
        let (debouncer, rx) = RescanDebouncer::new(Duration::from_millis(500));
        drop(rx);
        debouncer.trigger();
        // Timer fires into a closed channel without panicking.
        tokio::time::sleep(Duration::from_millis(600)).await;
    }
}
