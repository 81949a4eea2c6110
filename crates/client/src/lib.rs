//! CampusFix async client layer.
//!
//! Everything that talks to the authoritative ticket store or to the
//! clock lives here:
//!
//! - [`store`] — the [`TicketStore`]/[`AnalyticsSource`] seam and wire
//!   DTOs.
//! - [`api`] — [`TicketApi`], the reqwest implementation of the seam.
//! - [`session`] — the process-wide [`Session`] slot and JWT claim
//!   decoding.
//! - [`executor`] — [`TransitionExecutor`], validate / write /
//!   unconditionally re-read.
//! - [`poller`] — [`AnalyticsPoller`], the visibility-aware refresh
//!   schedule.
//! - [`monitor`] — [`SessionExpiryMonitor`], the five-minute expiry
//!   warning timer.

pub mod api;
pub mod executor;
pub mod monitor;
pub mod poller;
pub mod session;
pub mod store;

pub use api::{AuthResponse, TicketApi};
pub use executor::{ExecuteError, TicketView, TransitionExecutor, TransitionOptions};
pub use monitor::{ExpiryWarning, SessionExpiryMonitor};
pub use poller::{AnalyticsPoller, AnalyticsView, POLL_INTERVAL};
pub use session::{Session, SessionHandle};
pub use store::{
    AnalyticsSource, AssignRequest, CreateTicket, RateRequest, StatusUpdate, StoreError,
    TicketFilter, TicketStore,
};
