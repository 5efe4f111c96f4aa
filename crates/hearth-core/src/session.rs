//! The session seam: one independently-progressing authenticated connection
//! per account. The network layer implements these traits; the core only
//! coordinates access to them.

use std::rc::Rc;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Typed failure from a session-level call. Carried as the cause inside
/// [`CoreError::SessionOperationFailed`](crate::errors::CoreError).
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("network error: {0}")]
    Network(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Clone)]
pub struct LoginInfo {
    pub user_id: String,
    pub token: String,
    pub device_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Profile {
    pub displayname: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MediaPayload {
    pub content_type: String,
    pub data: Vec<u8>,
}

#[async_trait(?Send)]
pub trait Session {
    /// Authenticate with a password; the returned token and device id are
    /// what [`Session::resume`] takes on the next run.
    async fn login(
        &self,
        user: &str,
        password: &str,
        device_id: Option<&str>,
    ) -> Result<LoginInfo, SessionError>;

    /// Pick up a previous login from its saved token.
    async fn resume(&self, user_id: &str, token: &str, device_id: &str)
        -> Result<(), SessionError>;

    async fn logout(&self) -> Result<(), SessionError>;

    /// Whether the session is actively syncing.
    fn is_healthy(&self) -> bool;

    async fn fetch_profile(&self, user_id: &str) -> Result<Profile, SessionError>;

    async fn fetch_thumbnail(
        &self,
        server_name: &str,
        media_id: &str,
        width: u32,
        height: u32,
    ) -> Result<MediaPayload, SessionError>;

    async fn fetch_media(
        &self,
        server_name: &str,
        media_id: &str,
    ) -> Result<MediaPayload, SessionError>;
}

/// Creates sessions for a homeserver; the backend owns one of these and
/// calls it at login and resume time.
pub trait SessionFactory {
    fn create(&self, homeserver: &str) -> Rc<dyn Session>;
}
