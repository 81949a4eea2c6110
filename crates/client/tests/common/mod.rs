//! In-memory authoritative ticket store for integration tests.
//!
//! Mirrors the real store's behaviour: it re-checks every transition
//! against its *own* current state (so an optimistic client that lost a
//! race gets a conflict, not silent acceptance), appends to the ticket's
//! history on every accepted write, and never mutates existing entries.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use campusfix_client::session::Session;
use campusfix_client::store::{
    AnalyticsSource, AssignRequest, CreateTicket, RateRequest, StatusUpdate, StoreError,
    TicketFilter, TicketStore,
};
use campusfix_core::error::CoreError;
use campusfix_core::model::{
    AnalyticsSummary, Role, StatusLogEntry, Ticket, TicketDetail, TicketRating, TicketStatus,
    UserSummary,
};
use campusfix_core::types::DbId;
use campusfix_core::workflow::{self, TransitionRequest};
use campusfix_core::{rating, validation};

struct StoredTicket {
    ticket: Ticket,
    logs: Vec<StatusLogEntry>,
    rating: Option<TicketRating>,
}

struct State {
    next_ticket_id: DbId,
    next_log_id: DbId,
    users: HashMap<DbId, UserSummary>,
    tickets: HashMap<DbId, StoredTicket>,
    actor: Option<UserSummary>,
}

/// Authoritative in-memory store.
pub struct MemoryStore {
    state: Mutex<State>,
    /// Requests served, reads and writes alike; lets tests assert that
    /// a locally denied action produced no network call.
    pub calls: AtomicUsize,
    /// When set, every request fails with a 503.
    pub offline: AtomicBool,
    /// Analytics summaries served.
    pub refreshes: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State {
                next_ticket_id: 1,
                next_log_id: 1,
                users: HashMap::new(),
                tickets: HashMap::new(),
                actor: None,
            }),
            calls: AtomicUsize::new(0),
            offline: AtomicBool::new(false),
            refreshes: AtomicUsize::new(0),
        }
    }

    /// Register a user the store knows about.
    pub fn add_user(&self, id: DbId, username: &str, role: Role) -> UserSummary {
        let user = UserSummary {
            id,
            username: username.to_string(),
            full_name: format!("{username} {role}"),
            role,
        };
        let mut state = self.state.lock().unwrap();
        state.users.insert(id, user.clone());
        user
    }

    /// Set the authenticated actor the store sees on future requests.
    pub fn set_actor(&self, user: &UserSummary) {
        self.state.lock().unwrap().actor = Some(user.clone());
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn refresh_count(&self) -> usize {
        self.refreshes.load(Ordering::SeqCst)
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn check_online(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(StoreError::Api {
                status: 503,
                body: "store offline".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Map a domain refusal onto the HTTP shape the real store would use.
fn api_error(err: CoreError) -> StoreError {
    let status = match &err {
        CoreError::NotFound { .. } => 404,
        CoreError::Validation(_) => 422,
        CoreError::Forbidden(_) => 403,
        CoreError::Conflict(_) => 409,
    };
    StoreError::Api {
        status,
        body: err.to_string(),
    }
}

impl State {
    fn actor(&self) -> Result<UserSummary, StoreError> {
        self.actor.clone().ok_or(StoreError::Api {
            status: 401,
            body: "no authenticated user".to_string(),
        })
    }

    fn stored(&mut self, id: DbId) -> Result<&mut StoredTicket, StoreError> {
        self.tickets
            .get_mut(&id)
            .ok_or_else(|| api_error(CoreError::NotFound { entity: "Ticket", id }))
    }

    fn append_log(
        &mut self,
        ticket_id: DbId,
        old: Option<TicketStatus>,
        new: TicketStatus,
        actor: &UserSummary,
        note: Option<String>,
    ) {
        let id = self.next_log_id;
        self.next_log_id += 1;
        let entry = StatusLogEntry {
            id,
            old_status: old,
            new_status: new,
            note,
            changed_by: actor.clone(),
            timestamp: Utc::now(),
        };
        if let Some(stored) = self.tickets.get_mut(&ticket_id) {
            stored.logs.push(entry);
        }
    }
}

#[async_trait]
impl TicketStore for MemoryStore {
    async fn create_ticket(&self, req: &CreateTicket) -> Result<Ticket, StoreError> {
        self.check_online()?;
        req.validate().map_err(api_error)?;

        let mut state = self.state.lock().unwrap();
        let actor = state.actor()?;
        if actor.role != Role::Reporter {
            return Err(api_error(CoreError::Forbidden(
                "Only reporters may file tickets".to_string(),
            )));
        }

        let id = state.next_ticket_id;
        state.next_ticket_id += 1;
        let now = Utc::now();
        let ticket = Ticket {
            id,
            title: req.title.trim().to_string(),
            description: req.description.trim().to_string(),
            category: req.category,
            building: req.building.trim().to_string(),
            location: req.location.trim().to_string(),
            urgency: req.urgency,
            status: TicketStatus::Submitted,
            created_by: actor.clone(),
            assigned_to: None,
            image_url: None,
            after_image_url: None,
            created_at: now,
            updated_at: now,
            resolved_at: None,
        };
        state.tickets.insert(
            id,
            StoredTicket {
                ticket: ticket.clone(),
                logs: Vec::new(),
                rating: None,
            },
        );
        state.append_log(
            id,
            None,
            TicketStatus::Submitted,
            &actor,
            Some("Ticket submitted".to_string()),
        );
        Ok(ticket)
    }

    async fn ticket_detail(&self, id: DbId) -> Result<TicketDetail, StoreError> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let stored = state.stored(id)?;
        Ok(TicketDetail {
            ticket: stored.ticket.clone(),
            logs: stored.logs.clone(),
            rating: stored.rating.clone(),
        })
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StoreError> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        let mut tickets: Vec<Ticket> = state
            .tickets
            .values()
            .map(|s| s.ticket.clone())
            .filter(|t| filter.status.map_or(true, |s| t.status == s))
            .filter(|t| filter.category.map_or(true, |c| t.category == c))
            .filter(|t| filter.urgency.map_or(true, |u| t.urgency == u))
            .filter(|t| {
                filter
                    .assignee_id
                    .map_or(true, |id| t.assigned_to.as_ref().is_some_and(|a| a.id == id))
            })
            .collect();
        tickets.sort_by_key(|t| std::cmp::Reverse(t.created_at));
        Ok(tickets)
    }

    async fn my_tickets(&self) -> Result<Vec<Ticket>, StoreError> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        let actor = state.actor()?;
        Ok(state
            .tickets
            .values()
            .filter(|s| s.ticket.created_by.id == actor.id)
            .map(|s| s.ticket.clone())
            .collect())
    }

    async fn assigned_tickets(&self) -> Result<Vec<Ticket>, StoreError> {
        self.check_online()?;
        let state = self.state.lock().unwrap();
        let actor = state.actor()?;
        Ok(state
            .tickets
            .values()
            .filter(|s| s.ticket.is_assignee(actor.id))
            .map(|s| s.ticket.clone())
            .collect())
    }

    async fn update_status(&self, id: DbId, req: &StatusUpdate) -> Result<Ticket, StoreError> {
        self.check_online()?;
        if let Some(note) = &req.note {
            validation::validate_note(note).map_err(api_error)?;
        }

        let mut state = self.state.lock().unwrap();
        let actor = state.actor()?;
        let stored = state.stored(id)?;
        let old_status = stored.ticket.status;

        // The store runs its own authoritative check against its own
        // current state; a stale client loses here.
        let request = TransitionRequest {
            current: old_status,
            proposed: req.status,
            actor_role: actor.role,
            is_assignee: stored.ticket.is_assignee(actor.id),
            override_requested: req.is_override,
            note: req.note.as_deref(),
            assignee_id: stored.ticket.assigned_to.as_ref().map(|a| a.id),
        };
        workflow::validate(&request).map_err(|denied| StoreError::Api {
            status: 409,
            body: denied.to_string(),
        })?;

        let now = Utc::now();
        stored.ticket.status = req.status;
        stored.ticket.updated_at = now;
        if req.status == TicketStatus::Resolved {
            stored.ticket.resolved_at = Some(now);
        } else if old_status == TicketStatus::Resolved && req.status != TicketStatus::Closed {
            stored.ticket.resolved_at = None;
        }
        let ticket = stored.ticket.clone();
        state.append_log(id, Some(old_status), req.status, &actor, req.note.clone());
        Ok(ticket)
    }

    async fn assign(&self, id: DbId, req: &AssignRequest) -> Result<Ticket, StoreError> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let actor = state.actor()?;
        if actor.role != Role::Reviewer {
            return Err(api_error(CoreError::Forbidden(
                "Only reviewers may assign tickets".to_string(),
            )));
        }

        let assignee = state
            .users
            .get(&req.assignee_id)
            .cloned()
            .ok_or_else(|| {
                api_error(CoreError::NotFound {
                    entity: "User",
                    id: req.assignee_id,
                })
            })?;
        if assignee.role != Role::Resolver {
            return Err(api_error(CoreError::Validation(
                "Assignee must hold the RESOLVER role".to_string(),
            )));
        }

        let stored = state.stored(id)?;
        let old_status = stored.ticket.status;
        if old_status != TicketStatus::Approved {
            return Err(api_error(CoreError::Conflict(
                "Ticket must be APPROVED before assignment".to_string(),
            )));
        }

        stored.ticket.assigned_to = Some(assignee);
        stored.ticket.status = TicketStatus::Assigned;
        stored.ticket.updated_at = Utc::now();
        let ticket = stored.ticket.clone();
        let note = req
            .note
            .clone()
            .unwrap_or_else(|| "Ticket assigned".to_string());
        state.append_log(id, Some(old_status), TicketStatus::Assigned, &actor, Some(note));
        Ok(ticket)
    }

    async fn rate(&self, id: DbId, req: &RateRequest) -> Result<TicketRating, StoreError> {
        self.check_online()?;
        let mut state = self.state.lock().unwrap();
        let actor = state.actor()?;
        let stored = state.stored(id)?;

        let detail = TicketDetail {
            ticket: stored.ticket.clone(),
            logs: stored.logs.clone(),
            rating: stored.rating.clone(),
        };
        rating::check_rate(&detail, actor.id, req.stars, req.comment.as_deref())
            .map_err(api_error)?;

        let created = TicketRating {
            stars: req.stars,
            comment: req.comment.clone(),
            rated_by: actor,
            created_at: Utc::now(),
        };
        stored.rating = Some(created.clone());
        Ok(created)
    }
}

#[async_trait]
impl AnalyticsSource for MemoryStore {
    async fn summary(&self) -> Result<AnalyticsSummary, StoreError> {
        self.check_online()?;
        self.refreshes.fetch_add(1, Ordering::SeqCst);

        let state = self.state.lock().unwrap();
        let mut summary = AnalyticsSummary {
            total_tickets: state.tickets.len() as i64,
            ..AnalyticsSummary::default()
        };
        for stored in state.tickets.values() {
            *summary.by_status.entry(stored.ticket.status).or_insert(0) += 1;
            *summary
                .by_category
                .entry(stored.ticket.category)
                .or_insert(0) += 1;
            *summary.by_urgency.entry(stored.ticket.urgency).or_insert(0) += 1;
        }
        Ok(summary)
    }
}

/// Give spawned tasks a chance to run without advancing the paused
/// clock.
pub async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Build a session for a registered user without going through login.
pub fn session_for(user: &UserSummary) -> Session {
    Session {
        token: format!("test-token-{}", user.id),
        username: user.username.clone(),
        user_id: user.id,
        role: user.role,
        expires_at: Utc::now() + chrono::Duration::hours(1),
    }
}
