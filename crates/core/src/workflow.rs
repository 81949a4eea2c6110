//! Ticket lifecycle state machine and role gating.
//!
//! This module is pure: it never touches the store. Callers resolve the
//! acting user against the ticket (assignee identity, pre-validated
//! assignee id) and hand everything over in a [`TransitionRequest`].
//! The authoritative server runs the same checks again; this engine
//! exists so illegal requests fail locally without a network round trip.

use crate::model::{Role, TicketStatus};
use crate::types::DbId;

/// Everything the engine needs to judge one proposed transition.
#[derive(Debug, Clone, Copy)]
pub struct TransitionRequest<'a> {
    pub current: TicketStatus,
    pub proposed: TicketStatus,
    pub actor_role: Role,
    /// Whether the acting user is the ticket's current assignee.
    pub is_assignee: bool,
    /// Reviewer-requested bypass of the ordinary adjacency rules. The
    /// resulting history entry is marked so manual corrections can be
    /// told apart from organic progress.
    pub override_requested: bool,
    pub note: Option<&'a str>,
    /// Target assignee for APPROVED -> ASSIGNED.
    pub assignee_id: Option<DbId>,
}

/// Why the engine refused a proposed transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransitionDenied {
    #[error("No transition from {from} to {to}")]
    IllegalTransition {
        from: TicketStatus,
        to: TicketStatus,
    },

    #[error("Role {role} may not perform this transition")]
    ForbiddenRole { role: Role },

    #[error("Only the assigned resolver may perform this transition")]
    NotAssignee,

    #[error("A work note is required when resolving a ticket")]
    NoteRequired,

    #[error("An assignee id is required when assigning a ticket")]
    AssigneeRequired,
}

/// Ordinary next statuses reachable from `from`, ignoring roles.
///
/// Terminal states (`CLOSED`, `REJECTED`) return an empty slice; only a
/// reviewer override can move a ticket outside these edges, and nothing
/// at all leaves a terminal state.
pub fn adjacent(from: TicketStatus) -> &'static [TicketStatus] {
    use TicketStatus::*;
    match from {
        Submitted => &[Approved, Rejected],
        Approved => &[Assigned],
        Assigned => &[InProgress],
        InProgress => &[Resolved],
        Resolved => &[Closed],
        Closed | Rejected => &[],
    }
}

/// Whether this edge demands a non-empty free-text note.
///
/// Resolving is the only such edge: the work note becomes the audit
/// trail's record of what was actually done.
pub fn note_required(from: TicketStatus, to: TicketStatus) -> bool {
    matches!(
        (from, to),
        (TicketStatus::InProgress, TicketStatus::Resolved)
    )
}

/// Role gate for one ordinary edge. Assumes the edge is adjacent.
fn check_role(
    from: TicketStatus,
    to: TicketStatus,
    role: Role,
    is_assignee: bool,
) -> Result<(), TransitionDenied> {
    use TicketStatus::*;
    match (from, to) {
        (Submitted, Approved) | (Submitted, Rejected) | (Approved, Assigned) | (Resolved, Closed) => {
            if role == Role::Reviewer {
                Ok(())
            } else {
                Err(TransitionDenied::ForbiddenRole { role })
            }
        }
        (Assigned, InProgress) | (InProgress, Resolved) => {
            if role != Role::Resolver {
                Err(TransitionDenied::ForbiddenRole { role })
            } else if !is_assignee {
                Err(TransitionDenied::NotAssignee)
            } else {
                Ok(())
            }
        }
        // adjacent() admits no other edge
        _ => Err(TransitionDenied::IllegalTransition { from, to }),
    }
}

/// Validate a proposed transition against the lifecycle rules.
///
/// Checks run in a fixed order: self-transition, override gating,
/// adjacency, role, assignee identity, assignee id presence, note
/// presence. The first failure wins.
pub fn validate(req: &TransitionRequest<'_>) -> Result<(), TransitionDenied> {
    let (from, to) = (req.current, req.proposed);

    // The store refuses no-op updates outright, override or not.
    if from == to {
        return Err(TransitionDenied::IllegalTransition { from, to });
    }

    if req.override_requested {
        if req.actor_role != Role::Reviewer {
            return Err(TransitionDenied::ForbiddenRole {
                role: req.actor_role,
            });
        }
        if from.is_terminal() {
            return Err(TransitionDenied::IllegalTransition { from, to });
        }
        return Ok(());
    }

    if !adjacent(from).contains(&to) {
        return Err(TransitionDenied::IllegalTransition { from, to });
    }

    check_role(from, to, req.actor_role, req.is_assignee)?;

    if to == TicketStatus::Assigned && req.assignee_id.is_none() {
        return Err(TransitionDenied::AssigneeRequired);
    }

    if note_required(from, to) && req.note.map(str::trim).unwrap_or("").is_empty() {
        return Err(TransitionDenied::NoteRequired);
    }

    Ok(())
}

/// Ordinary next statuses the acting user may drive the ticket to.
///
/// This is the UI's action list: it applies the role gate but not the
/// fill-in-at-action-time requirements (note text, assignee id), which
/// [`validate`] enforces when the action is actually taken. Overrides
/// are not enumerated.
pub fn legal_transitions(
    current: TicketStatus,
    actor_role: Role,
    is_assignee: bool,
) -> Vec<TicketStatus> {
    adjacent(current)
        .iter()
        .copied()
        .filter(|&to| check_role(current, to, actor_role, is_assignee).is_ok())
        .collect()
}
