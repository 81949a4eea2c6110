//! The rating gate: who may rate a ticket, and when.
//!
//! A ticket accepts exactly one satisfaction rating, from its original
//! reporter, once it has reached RESOLVED or CLOSED. The store enforces
//! the same rules; this gate keeps doomed requests off the wire.

use crate::error::CoreError;
use crate::model::{TicketDetail, TicketStatus};
use crate::types::DbId;
use crate::validation;

/// Whether `actor_id` may rate this ticket right now.
pub fn can_rate(detail: &TicketDetail, actor_id: DbId) -> bool {
    matches!(
        detail.current_status(),
        TicketStatus::Resolved | TicketStatus::Closed
    ) && detail.rating.is_none()
        && detail.ticket.is_creator(actor_id)
}

/// Full gate for a rating submission, with the specific refusal.
///
/// Check order: stars range, comment length, creator identity, ticket
/// status, duplicate rating.
pub fn check_rate(
    detail: &TicketDetail,
    actor_id: DbId,
    stars: u8,
    comment: Option<&str>,
) -> Result<(), CoreError> {
    validation::validate_stars(stars)?;
    if let Some(comment) = comment {
        validation::validate_comment(comment)?;
    }

    if !detail.ticket.is_creator(actor_id) {
        return Err(CoreError::Forbidden(
            "Only the ticket's reporter may rate it".to_string(),
        ));
    }

    if !matches!(
        detail.current_status(),
        TicketStatus::Resolved | TicketStatus::Closed
    ) {
        return Err(CoreError::Conflict(
            "Only RESOLVED or CLOSED tickets can be rated".to_string(),
        ));
    }

    if detail.rating.is_some() {
        return Err(CoreError::Conflict(
            "Ticket has already been rated".to_string(),
        ));
    }

    Ok(())
}
