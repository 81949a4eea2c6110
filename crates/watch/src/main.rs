//! `campusfix-watch` -- headless analytics watcher.
//!
//! Signs into the ticket store, keeps the aggregate analytics snapshot
//! fresh through the visibility-aware poller, and warns ahead of
//! session expiry.  Runs until Ctrl-C.
//!
//! # Environment variables
//!
//! | Variable              | Required | Default | Description                                  |
//! |-----------------------|----------|---------|----------------------------------------------|
//! | `CAMPUSFIX_API_URL`   | yes      | --      | Store base URL, e.g. `http://host:8080/api`  |
//! | `CAMPUSFIX_USERNAME`  | yes      | --      | Account to sign in with                      |
//! | `CAMPUSFIX_PASSWORD`  | yes      | --      | Password for the account                     |
//! | `CAMPUSFIX_POLL_SECS` | no       | `20`    | Seconds between analytics refreshes          |

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use campusfix_client::poller::AnalyticsPoller;
use campusfix_client::session::{Session, SessionHandle};
use campusfix_client::store::AnalyticsSource;
use campusfix_client::{SessionExpiryMonitor, TicketApi};

/// Default interval between analytics refreshes.
const DEFAULT_POLL_SECS: u64 = 20;

fn required_env(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        tracing::error!("{name} environment variable is required");
        std::process::exit(1);
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "campusfix_watch=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let api_url = required_env("CAMPUSFIX_API_URL");
    let username = required_env("CAMPUSFIX_USERNAME");
    let password = required_env("CAMPUSFIX_PASSWORD");

    let poll_secs: u64 = std::env::var("CAMPUSFIX_POLL_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_POLL_SECS);

    tracing::info!(api_url = %api_url, username = %username, poll_secs, "Starting campusfix-watch");

    let session = SessionHandle::new();
    let api = Arc::new(TicketApi::new(api_url, session.clone()));

    let auth = api
        .login(&username, &password)
        .await
        .context("login failed")?;
    let active = Session::from_token(auth.token).context("store returned an unusable token")?;
    tracing::info!(
        username = %active.username,
        role = %active.role,
        expires_at = %active.expires_at,
        "Signed in",
    );
    session.set(active.clone());

    let monitor = SessionExpiryMonitor::new();
    let mut warning_rx = monitor.subscribe();
    monitor.watch_session(&active);

    let poller = AnalyticsPoller::with_interval(
        Arc::clone(&api) as Arc<dyn AnalyticsSource>,
        Duration::from_secs(poll_secs),
    );
    let mut view_rx = poller.subscribe();
    poller.arm();

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Shutting down");
                break;
            }
            changed = view_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = view_rx.borrow().clone();
                if let Some(error) = view.error {
                    tracing::warn!(error = %error, "Analytics refresh failed");
                } else if let Some(summary) = view.summary {
                    tracing::info!(
                        total = summary.total_tickets,
                        statuses = summary.by_status.len(),
                        "Analytics snapshot",
                    );
                }
            }
            changed = warning_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                if let Some(warning) = *warning_rx.borrow() {
                    tracing::warn!(
                        expires_at = %warning.expires_at,
                        "Session expires soon; sign in again to keep watching",
                    );
                }
            }
        }
    }

    poller.disarm();
    monitor.disarm();
    Ok(())
}
