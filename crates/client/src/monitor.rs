//! Session expiry warning timer.
//!
//! Decodes the active token's expiry and schedules a single warning
//! five minutes before it. Replacing the token (re-login) cancels any
//! previously armed timer before a new one is computed, so a stale
//! timer can never fire against a token that no longer applies.

use std::sync::Mutex;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use campusfix_core::error::CoreError;
use campusfix_core::types::Timestamp;

use crate::session::Session;

/// How long before expiry the warning fires, in seconds.
pub const WARN_BEFORE_SECS: i64 = 5 * 60;

/// The published warning: the session expires at this instant; the UI
/// offers a dismissal and an immediate forced re-authentication.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpiryWarning {
    pub expires_at: Timestamp,
}

/// Arms at most one expiry-warning timer for the process-wide session.
pub struct SessionExpiryMonitor {
    warning_tx: watch::Sender<Option<ExpiryWarning>>,
    armed: Mutex<Option<CancellationToken>>,
}

impl Default for SessionExpiryMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionExpiryMonitor {
    pub fn new() -> Self {
        let (warning_tx, _) = watch::channel(None);
        Self {
            warning_tx,
            armed: Mutex::new(None),
        }
    }

    /// Observe the pending warning, if any.
    pub fn subscribe(&self) -> watch::Receiver<Option<ExpiryWarning>> {
        self.warning_tx.subscribe()
    }

    /// Whether a timer is currently pending.
    pub fn is_armed(&self) -> bool {
        self.armed
            .lock()
            .expect("monitor state lock poisoned")
            .is_some()
    }

    /// Watch a raw bearer token.
    ///
    /// A token whose payload cannot be decoded fails closed: the error
    /// is returned, nothing is armed, and any previous timer stays
    /// cancelled.
    pub fn watch_token(&self, token: &str) -> Result<(), CoreError> {
        let session = Session::from_token(token)?;
        self.watch_session(&session);
        Ok(())
    }

    /// Watch an established session.
    ///
    /// Cancels the previous timer first, then either emits the warning
    /// immediately (already inside the warning window but not yet
    /// expired), arms a timer for `expires_at - 5 minutes`, or does
    /// nothing for an already-expired token.
    pub fn watch_session(&self, session: &Session) {
        // Take the lock for the whole replace so two concurrent logins
        // cannot leave two timers armed.
        let mut armed = self.armed.lock().expect("monitor state lock poisoned");
        if let Some(previous) = armed.take() {
            previous.cancel();
        }
        self.warning_tx.send_modify(|w| *w = None);

        let now = chrono::Utc::now();
        let expires_at = session.expires_at;

        if expires_at <= now {
            tracing::warn!(%expires_at, "Token is already expired; no warning armed");
            return;
        }

        let warn_at = expires_at - chrono::Duration::seconds(WARN_BEFORE_SECS);
        if warn_at <= now {
            tracing::info!(%expires_at, "Session already inside the warning window");
            self.warning_tx
                .send_modify(|w| *w = Some(ExpiryWarning { expires_at }));
            return;
        }

        let delay = (warn_at - now).to_std().unwrap_or_default();
        let cancel = CancellationToken::new();
        *armed = Some(cancel.clone());

        let warning_tx = self.warning_tx.clone();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    tracing::info!(%expires_at, "Session expiry warning fired");
                    warning_tx.send_modify(|w| *w = Some(ExpiryWarning { expires_at }));
                }
            }
        });

        tracing::debug!(%expires_at, delay_secs = delay.as_secs(), "Expiry warning armed");
    }

    /// Dismiss the current warning without touching the session.
    pub fn dismiss(&self) {
        self.warning_tx.send_modify(|w| *w = None);
    }

    /// Cancel any pending timer and clear the warning.
    pub fn disarm(&self) {
        if let Some(cancel) = self
            .armed
            .lock()
            .expect("monitor state lock poisoned")
            .take()
        {
            cancel.cancel();
        }
        self.warning_tx.send_modify(|w| *w = None);
    }
}

impl Drop for SessionExpiryMonitor {
    fn drop(&mut self) {
        self.disarm();
    }
}
