//! The ticket store seam: traits and request DTOs.
//!
//! The remote store owns all durable state. Everything that talks to it
//! goes through [`TicketStore`] / [`AnalyticsSource`] so the executor
//! and poller can be driven against an in-memory store in tests.

use async_trait::async_trait;
use serde::Serialize;

use campusfix_core::error::CoreError;
use campusfix_core::model::{
    AnalyticsSummary, Ticket, TicketCategory, TicketDetail, TicketRating, TicketStatus,
    UrgencyLevel,
};
use campusfix_core::types::DbId;
use campusfix_core::validation;

/// Errors from the store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The store answered with a non-2xx status code. The body is the
    /// server's own message, passed through verbatim.
    #[error("Store rejected the request ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },
}

/// Payload for filing a new ticket.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicket {
    pub title: String,
    pub description: String,
    pub category: TicketCategory,
    pub building: String,
    pub location: String,
    pub urgency: UrgencyLevel,
}

impl CreateTicket {
    /// Check the free-text bounds locally before submission.
    pub fn validate(&self) -> Result<(), CoreError> {
        validation::validate_title(&self.title)?;
        validation::validate_description(&self.description)?;
        validation::validate_place("Building", &self.building)?;
        validation::validate_place("Location", &self.location)?;
        Ok(())
    }
}

/// Payload for a status transition.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: TicketStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Marks a reviewer override so history review can separate manual
    /// corrections from organic progress.
    #[serde(rename = "override", skip_serializing_if = "std::ops::Not::not")]
    pub is_override: bool,
}

/// Payload for assigning an approved ticket to a resolver.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub assignee_id: DbId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// Payload for a satisfaction rating.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub stars: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

/// Filters for the reviewer's ticket list.
#[derive(Debug, Clone, Default)]
pub struct TicketFilter {
    pub status: Option<TicketStatus>,
    pub category: Option<TicketCategory>,
    pub urgency: Option<UrgencyLevel>,
    pub assignee_id: Option<DbId>,
    pub search: Option<String>,
}

impl TicketFilter {
    /// Render the set filters as query parameters.
    pub fn to_query(&self) -> Vec<(&'static str, String)> {
        let mut params = Vec::new();
        if let Some(status) = self.status {
            params.push(("status", status.as_str().to_string()));
        }
        if let Some(category) = self.category {
            params.push(("category", category.as_str().to_string()));
        }
        if let Some(urgency) = self.urgency {
            params.push(("urgency", urgency.as_str().to_string()));
        }
        if let Some(assignee_id) = self.assignee_id {
            params.push(("assigneeId", assignee_id.to_string()));
        }
        if let Some(search) = &self.search {
            params.push(("search", search.clone()));
        }
        params
    }
}

/// Operations the authoritative ticket store exposes.
#[async_trait]
pub trait TicketStore: Send + Sync {
    async fn create_ticket(&self, req: &CreateTicket) -> Result<Ticket, StoreError>;

    /// The full record: ticket, ordered history, rating if any.
    async fn ticket_detail(&self, id: DbId) -> Result<TicketDetail, StoreError>;

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StoreError>;

    /// Tickets created by the authenticated reporter.
    async fn my_tickets(&self) -> Result<Vec<Ticket>, StoreError>;

    /// Tickets assigned to the authenticated resolver.
    async fn assigned_tickets(&self) -> Result<Vec<Ticket>, StoreError>;

    async fn update_status(&self, id: DbId, req: &StatusUpdate) -> Result<Ticket, StoreError>;

    async fn assign(&self, id: DbId, req: &AssignRequest) -> Result<Ticket, StoreError>;

    async fn rate(&self, id: DbId, req: &RateRequest) -> Result<TicketRating, StoreError>;
}

/// The analytics poller's refresh function.
#[async_trait]
pub trait AnalyticsSource: Send + Sync {
    async fn summary(&self) -> Result<AnalyticsSummary, StoreError>;
}
