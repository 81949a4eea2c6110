//! REST client for the ticket store HTTP API.
//!
//! Wraps the store's endpoints (ticket CRUD, transitions, assignment,
//! rating, analytics, login) using [`reqwest`]. Every request carries
//! the active session's bearer token when one is present.

use reqwest::Method;
use serde::{Deserialize, Serialize};

use campusfix_core::model::{AnalyticsSummary, Ticket, TicketDetail, TicketRating};
use campusfix_core::types::DbId;

use crate::session::SessionHandle;
use crate::store::{
    AnalyticsSource, AssignRequest, CreateTicket, RateRequest, StatusUpdate, StoreError,
    TicketFilter, TicketStore,
};

/// HTTP client for a single ticket store instance.
pub struct TicketApi {
    client: reqwest::Client,
    base_url: String,
    session: SessionHandle,
}

/// Login payload for the store's auth endpoint.
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// Response from a successful login.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    /// The bearer token to present on subsequent requests.
    pub token: String,
    pub username: String,
    pub full_name: String,
    pub role: String,
}

impl TicketApi {
    /// Create a new API client.
    ///
    /// * `base_url` - Base HTTP URL including the API prefix, e.g.
    ///   `http://host:8080/api`.
    pub fn new(base_url: impl Into<String>, session: SessionHandle) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            session,
        }
    }

    /// Create an API client reusing an existing [`reqwest::Client`]
    /// (useful for connection pooling).
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        session: SessionHandle,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            session,
        }
    }

    /// Authenticate against the store.
    ///
    /// Returns the raw auth payload; callers build a
    /// [`Session`](crate::session::Session) from its token and publish
    /// it through the shared handle.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthResponse, StoreError> {
        let response = self
            .client
            .post(format!("{}/auth/login", self.base_url))
            .json(&LoginRequest { username, password })
            .send()
            .await?;

        Self::parse_response(response).await
    }

    // ---- private helpers ----

    /// Build a request with the bearer token attached, when present.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .client
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(token) = self.session.token() {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Ensure the response has a success status code. Returns the
    /// response unchanged on success, or a [`StoreError::Api`] carrying
    /// the status and body text on failure.
    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(StoreError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    /// Parse a successful JSON response body into the expected type.
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, StoreError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl TicketStore for TicketApi {
    async fn create_ticket(&self, req: &CreateTicket) -> Result<Ticket, StoreError> {
        let response = self
            .request(Method::POST, "/tickets")
            .json(req)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn ticket_detail(&self, id: DbId) -> Result<TicketDetail, StoreError> {
        let response = self
            .request(Method::GET, &format!("/tickets/{id}"))
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn list_tickets(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, StoreError> {
        let response = self
            .request(Method::GET, "/tickets")
            .query(&filter.to_query())
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn my_tickets(&self) -> Result<Vec<Ticket>, StoreError> {
        let response = self.request(Method::GET, "/tickets/my").send().await?;
        Self::parse_response(response).await
    }

    async fn assigned_tickets(&self) -> Result<Vec<Ticket>, StoreError> {
        let response = self
            .request(Method::GET, "/tickets/assigned")
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn update_status(&self, id: DbId, req: &StatusUpdate) -> Result<Ticket, StoreError> {
        let response = self
            .request(Method::PATCH, &format!("/tickets/{id}/status"))
            .json(req)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn assign(&self, id: DbId, req: &AssignRequest) -> Result<Ticket, StoreError> {
        let response = self
            .request(Method::PATCH, &format!("/tickets/{id}/assign"))
            .json(req)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    async fn rate(&self, id: DbId, req: &RateRequest) -> Result<TicketRating, StoreError> {
        let response = self
            .request(Method::POST, &format!("/tickets/{id}/rate"))
            .json(req)
            .send()
            .await?;
        Self::parse_response(response).await
    }
}

#[async_trait::async_trait]
impl AnalyticsSource for TicketApi {
    async fn summary(&self) -> Result<AnalyticsSummary, StoreError> {
        let response = self
            .request(Method::GET, "/analytics/summary")
            .send()
            .await?;
        Self::parse_response(response).await
    }
}
