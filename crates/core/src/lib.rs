//! CampusFix domain core.
//!
//! Pure decision logic for the maintenance-ticket lifecycle:
//!
//! - [`model`] — tickets, status history, ratings, and the closed
//!   role/status enums in their wire representation.
//! - [`workflow`] — the lifecycle state machine and role gating.
//! - [`rating`] — the one-rating-per-ticket gate.
//! - [`validation`] — free-text field bounds.
//!
//! This crate has zero internal deps and performs no I/O, so both the
//! async client layer and any future tooling can use it directly.

pub mod error;
pub mod model;
pub mod rating;
pub mod types;
pub mod validation;
pub mod workflow;

pub use error::CoreError;
pub use model::{
    AnalyticsSummary, Role, StatusLogEntry, Ticket, TicketCategory, TicketDetail, TicketRating,
    TicketStatus, UrgencyLevel, UserSummary,
};
pub use workflow::{TransitionDenied, TransitionRequest};
