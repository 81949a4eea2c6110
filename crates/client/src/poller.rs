//! Visibility-aware analytics polling.
//!
//! Keeps the aggregate counters fresh on a fixed cadence while the
//! hosting view is foreground-visible, suspends while it is hidden,
//! and resyncs immediately on regaining visibility so data is never
//! stale after a long background period. Refresh failures are recorded
//! for display and the next tick retries unconditionally.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use campusfix_core::model::AnalyticsSummary;
use campusfix_core::types::Timestamp;

use crate::store::AnalyticsSource;

/// How often the armed poller refreshes.
pub const POLL_INTERVAL: Duration = Duration::from_secs(20);

/// The poller's published snapshot.
#[derive(Debug, Clone, Default)]
pub struct AnalyticsView {
    pub summary: Option<AnalyticsSummary>,
    /// The last refresh failure, cleared by the next success.
    pub error: Option<String>,
    pub last_updated: Option<Timestamp>,
}

/// Scheduler over a single async refresh function.
///
/// Exactly one timer may be armed at a time: [`arm`](Self::arm) while
/// already armed is a no-op, [`disarm`](Self::disarm) and drop always
/// tear the timer down.
pub struct AnalyticsPoller {
    source: Arc<dyn AnalyticsSource>,
    interval: Duration,
    view_tx: watch::Sender<AnalyticsView>,
    visible_tx: watch::Sender<bool>,
    armed: Mutex<Option<CancellationToken>>,
}

impl AnalyticsPoller {
    /// Create a poller on the standard 20-second cadence.
    pub fn new(source: Arc<dyn AnalyticsSource>) -> Self {
        Self::with_interval(source, POLL_INTERVAL)
    }

    /// Create a poller with an explicit cadence.
    pub fn with_interval(source: Arc<dyn AnalyticsSource>, interval: Duration) -> Self {
        let (view_tx, _) = watch::channel(AnalyticsView::default());
        let (visible_tx, _) = watch::channel(true);
        Self {
            source,
            interval,
            view_tx,
            visible_tx,
            armed: Mutex::new(None),
        }
    }

    /// Observe the published snapshot.
    pub fn subscribe(&self) -> watch::Receiver<AnalyticsView> {
        self.view_tx.subscribe()
    }

    /// Whether a timer is currently armed.
    pub fn is_armed(&self) -> bool {
        self.armed.lock().expect("poller state lock poisoned").is_some()
    }

    /// Arm the schedule. The first refresh fires immediately; arming
    /// while armed is a no-op.
    pub fn arm(&self) {
        let mut armed = self.armed.lock().expect("poller state lock poisoned");
        if armed.is_some() {
            return;
        }

        let cancel = CancellationToken::new();
        *armed = Some(cancel.clone());

        tokio::spawn(run_loop(
            Arc::clone(&self.source),
            self.interval,
            self.view_tx.clone(),
            self.visible_tx.subscribe(),
            cancel,
        ));
    }

    /// Tear the schedule down.
    pub fn disarm(&self) {
        if let Some(cancel) = self
            .armed
            .lock()
            .expect("poller state lock poisoned")
            .take()
        {
            cancel.cancel();
        }
    }

    /// Report a visibility change of the hosting view.
    ///
    /// Hiding pauses the schedule; becoming visible again triggers one
    /// immediate out-of-band refresh before the cadence resumes.
    /// Repeating the current state is a no-op.
    pub fn set_visible(&self, visible: bool) {
        self.visible_tx.send_if_modified(|v| {
            if *v == visible {
                false
            } else {
                *v = visible;
                true
            }
        });
    }
}

impl Drop for AnalyticsPoller {
    fn drop(&mut self) {
        self.disarm();
    }
}

/// The armed poller's loop: tick while visible, resync on regaining
/// visibility, stop on cancellation.
async fn run_loop(
    source: Arc<dyn AnalyticsSource>,
    interval: Duration,
    view_tx: watch::Sender<AnalyticsView>,
    mut visible_rx: watch::Receiver<bool>,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    tracing::debug!(interval_secs = interval.as_secs(), "Analytics poller armed");

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Analytics poller disarmed");
                break;
            }
            // The first tick completes immediately: the arm-time refresh.
            _ = ticker.tick() => {
                if *visible_rx.borrow() {
                    refresh(&source, &view_tx).await;
                }
            }
            changed = visible_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if *visible_rx.borrow() {
                    // Resync immediately after the background period and
                    // push the next scheduled tick a full interval out.
                    refresh(&source, &view_tx).await;
                    ticker.reset();
                }
            }
        }
    }
}

/// One refresh: fetch the summary and fold the outcome into the view.
async fn refresh(source: &Arc<dyn AnalyticsSource>, view_tx: &watch::Sender<AnalyticsView>) {
    match source.summary().await {
        Ok(summary) => {
            view_tx.send_modify(|view| {
                view.summary = Some(summary);
                view.error = None;
                view.last_updated = Some(chrono::Utc::now());
            });
        }
        Err(e) => {
            tracing::warn!(error = %e, "Analytics refresh failed");
            view_tx.send_modify(|view| {
                view.error = Some(e.to_string());
            });
        }
    }
}
