//! Transition orchestration: validate, write, unconditionally re-read.
//!
//! The executor never trusts a value echoed back by a write. After
//! every accepted transition (or rating) it re-fetches the full record
//! from the store, so the locally observed state always reflects
//! server-confirmed truth. Two clients racing on the same ticket both
//! get to try; the store accepts one, and the loser's re-fetch reveals
//! the authoritative state instead of a stale optimistic view.

use std::sync::Arc;

use tokio::sync::watch;

use campusfix_core::error::CoreError;
use campusfix_core::model::{TicketDetail, TicketStatus};
use campusfix_core::types::DbId;
use campusfix_core::workflow::{self, TransitionDenied, TransitionRequest};
use campusfix_core::{rating, validation};

use crate::session::SessionHandle;
use crate::store::{AssignRequest, RateRequest, StatusUpdate, StoreError, TicketStore};

/// What the UI observes: the authoritative record, the in-flight flag
/// for the indeterminate window between write and re-fetch, and the
/// last failure.
#[derive(Debug, Clone, Default)]
pub struct TicketView {
    pub detail: Option<TicketDetail>,
    /// True between a store write being issued and its mandatory
    /// re-fetch completing; the ticket must not be rendered as either
    /// the old or a guessed new status while set.
    pub in_flight: bool,
    pub error: Option<String>,
}

/// Caller-supplied knobs for one transition.
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionOptions {
    /// Reviewer override of the ordinary adjacency rules.
    pub override_requested: bool,
    /// Target assignee for APPROVED -> ASSIGNED.
    pub assignee_id: Option<DbId>,
}

/// Why an executor invocation failed.
#[derive(Debug, thiserror::Error)]
pub enum ExecuteError {
    /// The workflow engine refused locally; nothing was sent.
    #[error(transparent)]
    Denied(#[from] TransitionDenied),

    /// Local validation or consistency failure.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The store refused or the request failed; local state unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("No authenticated session")]
    NoSession,
}

/// Drives ticket transitions and ratings against the store.
pub struct TransitionExecutor<S: TicketStore> {
    store: Arc<S>,
    session: SessionHandle,
    view_tx: watch::Sender<TicketView>,
}

impl<S: TicketStore> TransitionExecutor<S> {
    pub fn new(store: Arc<S>, session: SessionHandle) -> Self {
        let (view_tx, _) = watch::channel(TicketView::default());
        Self {
            store,
            session,
            view_tx,
        }
    }

    /// Observe the executor's view of the current ticket.
    pub fn subscribe(&self) -> watch::Receiver<TicketView> {
        self.view_tx.subscribe()
    }

    /// Load a ticket's authoritative record and publish it.
    pub async fn load(&self, ticket_id: DbId) -> Result<TicketDetail, ExecuteError> {
        self.refetch(ticket_id).await
    }

    /// The ordinary next actions the active session may take on
    /// `detail`, for rendering.
    pub fn legal_actions(&self, detail: &TicketDetail) -> Vec<TicketStatus> {
        match self.session.current() {
            Some(session) => workflow::legal_transitions(
                detail.current_status(),
                session.role,
                detail.is_assignee(session.user_id),
            ),
            None => Vec::new(),
        }
    }

    /// Execute one status transition end-to-end.
    ///
    /// Validation failures are synchronous and never touch the network.
    /// Store failures leave the previously published record untouched
    /// and carry the store's message verbatim.
    pub async fn execute(
        &self,
        ticket_id: DbId,
        proposed: TicketStatus,
        note: Option<&str>,
        opts: TransitionOptions,
    ) -> Result<TicketDetail, ExecuteError> {
        let session = self.session.current().ok_or(ExecuteError::NoSession)?;
        let detail = self.held_or_fetch(ticket_id).await?;

        if let Some(note) = note {
            if let Err(e) = validation::validate_note(note) {
                self.publish_error(e.to_string());
                return Err(e.into());
            }
        }

        let request = TransitionRequest {
            current: detail.current_status(),
            proposed,
            actor_role: session.role,
            is_assignee: detail.is_assignee(session.user_id),
            override_requested: opts.override_requested,
            note,
            assignee_id: opts.assignee_id,
        };

        if let Err(denied) = workflow::validate(&request) {
            tracing::debug!(
                ticket_id,
                from = %request.current,
                to = %proposed,
                role = %session.role,
                error = %denied,
                "Transition denied locally",
            );
            self.publish_error(denied.to_string());
            return Err(denied.into());
        }

        self.set_in_flight();

        // APPROVED -> ASSIGNED goes through the dedicated assignment
        // endpoint; everything else (overrides included) is a status
        // update.
        let write = match (proposed, opts.assignee_id, opts.override_requested) {
            (TicketStatus::Assigned, Some(assignee_id), false) => {
                self.store
                    .assign(
                        ticket_id,
                        &AssignRequest {
                            assignee_id,
                            note: note.map(str::to_string),
                        },
                    )
                    .await
            }
            _ => {
                self.store
                    .update_status(
                        ticket_id,
                        &StatusUpdate {
                            status: proposed,
                            note: note.map(str::to_string),
                            is_override: opts.override_requested,
                        },
                    )
                    .await
            }
        };

        match write {
            // Never trust the echoed ticket; re-read the full record.
            Ok(_echo) => {
                let fresh = self.refetch(ticket_id).await?;
                tracing::info!(
                    ticket_id,
                    status = %fresh.current_status(),
                    override_requested = opts.override_requested,
                    "Transition applied",
                );
                Ok(fresh)
            }
            Err(e) => {
                tracing::warn!(ticket_id, error = %e, "Store rejected transition");
                self.publish_error(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Submit the reporter's one-time satisfaction rating.
    pub async fn rate(
        &self,
        ticket_id: DbId,
        stars: u8,
        comment: Option<&str>,
    ) -> Result<TicketDetail, ExecuteError> {
        let session = self.session.current().ok_or(ExecuteError::NoSession)?;
        let detail = self.held_or_fetch(ticket_id).await?;

        if let Err(e) = rating::check_rate(&detail, session.user_id, stars, comment) {
            self.publish_error(e.to_string());
            return Err(e.into());
        }

        self.set_in_flight();

        let write = self
            .store
            .rate(
                ticket_id,
                &RateRequest {
                    stars,
                    comment: comment.map(str::to_string),
                },
            )
            .await;

        match write {
            Ok(_echo) => {
                let fresh = self.refetch(ticket_id).await?;
                tracing::info!(ticket_id, stars, "Rating submitted");
                Ok(fresh)
            }
            Err(e) => {
                tracing::warn!(ticket_id, error = %e, "Store rejected rating");
                self.publish_error(e.to_string());
                Err(e.into())
            }
        }
    }

    // ---- private helpers ----

    /// Reuse the published record when it matches, fetch otherwise.
    async fn held_or_fetch(&self, ticket_id: DbId) -> Result<TicketDetail, ExecuteError> {
        let held = self
            .view_tx
            .borrow()
            .detail
            .as_ref()
            .filter(|d| d.ticket.id == ticket_id)
            .cloned();
        match held {
            Some(detail) => Ok(detail),
            None => self.refetch(ticket_id).await,
        }
    }

    /// Fetch the authoritative record, verify it, publish it.
    async fn refetch(&self, ticket_id: DbId) -> Result<TicketDetail, ExecuteError> {
        match self.store.ticket_detail(ticket_id).await {
            Ok(detail) => {
                if let Err(e) = detail.check_consistency() {
                    self.publish_error(e.to_string());
                    return Err(e.into());
                }
                self.view_tx.send_modify(|view| {
                    view.detail = Some(detail.clone());
                    view.in_flight = false;
                    view.error = None;
                });
                Ok(detail)
            }
            Err(e) => {
                self.publish_error(e.to_string());
                Err(e.into())
            }
        }
    }

    fn set_in_flight(&self) {
        self.view_tx.send_modify(|view| {
            view.in_flight = true;
            view.error = None;
        });
    }

    /// Record a failure without disturbing the published record.
    fn publish_error(&self, message: String) {
        self.view_tx.send_modify(|view| {
            view.in_flight = false;
            view.error = Some(message);
        });
    }
}
