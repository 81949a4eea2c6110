//! Ticket domain entities in their wire representation.
//!
//! Everything here mirrors the JSON the authoritative ticket store
//! produces. Roles and statuses are closed enums so the workflow table
//! can be matched exhaustively instead of comparing strings.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// A user's role, fixed for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Files tickets and rates the outcome.
    Reporter,
    /// Works assigned tickets through to resolution.
    Resolver,
    /// Triages, routes, and closes tickets.
    Reviewer,
}

impl Role {
    /// All declared roles, for exhaustive sweeps in tests.
    pub const ALL: [Role; 3] = [Role::Reporter, Role::Resolver, Role::Reviewer];

    /// The wire name of this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Reporter => "REPORTER",
            Role::Resolver => "RESOLVER",
            Role::Reviewer => "REVIEWER",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The lifecycle status of a ticket.
///
/// `Rejected` and `Closed` are terminal: no ordinary transition leaves
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    Submitted,
    Approved,
    Assigned,
    InProgress,
    Resolved,
    Closed,
    Rejected,
}

impl TicketStatus {
    /// All declared statuses, for exhaustive sweeps in tests.
    pub const ALL: [TicketStatus; 7] = [
        TicketStatus::Submitted,
        TicketStatus::Approved,
        TicketStatus::Assigned,
        TicketStatus::InProgress,
        TicketStatus::Resolved,
        TicketStatus::Closed,
        TicketStatus::Rejected,
    ];

    /// Whether this status has no outgoing ordinary transitions.
    pub fn is_terminal(self) -> bool {
        matches!(self, TicketStatus::Rejected | TicketStatus::Closed)
    }

    /// The wire name of this status.
    pub fn as_str(self) -> &'static str {
        match self {
            TicketStatus::Submitted => "SUBMITTED",
            TicketStatus::Approved => "APPROVED",
            TicketStatus::Assigned => "ASSIGNED",
            TicketStatus::InProgress => "IN_PROGRESS",
            TicketStatus::Resolved => "RESOLVED",
            TicketStatus::Closed => "CLOSED",
            TicketStatus::Rejected => "REJECTED",
        }
    }
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The maintenance category a ticket is filed under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketCategory {
    Electrical,
    Plumbing,
    Hvac,
    Cleaning,
    It,
    Furniture,
    Structural,
    Safety,
    Other,
}

impl TicketCategory {
    /// The wire name of this category.
    pub fn as_str(self) -> &'static str {
        match self {
            TicketCategory::Electrical => "ELECTRICAL",
            TicketCategory::Plumbing => "PLUMBING",
            TicketCategory::Hvac => "HVAC",
            TicketCategory::Cleaning => "CLEANING",
            TicketCategory::It => "IT",
            TicketCategory::Furniture => "FURNITURE",
            TicketCategory::Structural => "STRUCTURAL",
            TicketCategory::Safety => "SAFETY",
            TicketCategory::Other => "OTHER",
        }
    }
}

impl fmt::Display for TicketCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How urgent the reporter judged the issue to be.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UrgencyLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl UrgencyLevel {
    /// The wire name of this urgency level.
    pub fn as_str(self) -> &'static str {
        match self {
            UrgencyLevel::Low => "LOW",
            UrgencyLevel::Medium => "MEDIUM",
            UrgencyLevel::High => "HIGH",
            UrgencyLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for UrgencyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Entities
// ---------------------------------------------------------------------------

/// The identity attached to tickets, log entries, and ratings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: DbId,
    pub username: String,
    pub full_name: String,
    pub role: Role,
}

/// A maintenance ticket as the store reports it.
///
/// `status` is the store's denormalised copy of the latest history
/// entry; read it through [`TicketDetail::current_status`] where the
/// history is available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: DbId,
    pub title: String,
    pub description: String,
    pub category: TicketCategory,
    pub building: String,
    pub location: String,
    pub urgency: UrgencyLevel,
    pub status: TicketStatus,
    pub created_by: UserSummary,
    pub assigned_to: Option<UserSummary>,
    pub image_url: Option<String>,
    pub after_image_url: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
}

impl Ticket {
    /// Whether `user_id` is the ticket's current assignee.
    pub fn is_assignee(&self, user_id: DbId) -> bool {
        self.assigned_to.as_ref().is_some_and(|a| a.id == user_id)
    }

    /// Whether `user_id` created this ticket.
    pub fn is_creator(&self, user_id: DbId) -> bool {
        self.created_by.id == user_id
    }
}

/// One entry of a ticket's append-only audit trail.
///
/// The creation entry has `old_status = None`. Entries are never
/// edited or deleted once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusLogEntry {
    pub id: DbId,
    pub old_status: Option<TicketStatus>,
    pub new_status: TicketStatus,
    pub note: Option<String>,
    pub changed_by: UserSummary,
    pub timestamp: Timestamp,
}

/// A reporter's one-time satisfaction rating for a ticket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRating {
    pub stars: u8,
    pub comment: Option<String>,
    pub rated_by: UserSummary,
    pub created_at: Timestamp,
}

/// The authoritative read shape: ticket, ordered history, and rating.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketDetail {
    pub ticket: Ticket,
    pub logs: Vec<StatusLogEntry>,
    pub rating: Option<TicketRating>,
}

impl TicketDetail {
    /// The ticket's status, derived from the most recent history entry.
    ///
    /// The denormalised `ticket.status` field is only a fallback for a
    /// record the store returned without history.
    pub fn current_status(&self) -> TicketStatus {
        self.logs
            .last()
            .map(|entry| entry.new_status)
            .unwrap_or(self.ticket.status)
    }

    /// Whether `user_id` is the ticket's current assignee.
    pub fn is_assignee(&self, user_id: DbId) -> bool {
        self.ticket.is_assignee(user_id)
    }

    /// Verify the record's internal invariants.
    ///
    /// The denormalised status must equal the latest history entry's
    /// `new_status`, and history timestamps must be monotonically
    /// non-decreasing. A violation means the store handed us a record
    /// that drifted from its own audit trail.
    pub fn check_consistency(&self) -> Result<(), CoreError> {
        if let Some(last) = self.logs.last() {
            if last.new_status != self.ticket.status {
                return Err(CoreError::Conflict(format!(
                    "Ticket {} reports status {} but its latest history entry is {}",
                    self.ticket.id, self.ticket.status, last.new_status
                )));
            }
        }

        for pair in self.logs.windows(2) {
            if pair[1].timestamp < pair[0].timestamp {
                return Err(CoreError::Conflict(format!(
                    "Ticket {} history is out of order at entry {}",
                    self.ticket.id, pair[1].id
                )));
            }
        }

        Ok(())
    }
}

/// Aggregate ticket counters from the analytics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    pub total_tickets: i64,
    pub by_status: HashMap<TicketStatus, i64>,
    pub by_category: HashMap<TicketCategory, i64>,
    pub by_urgency: HashMap<UrgencyLevel, i64>,
}
