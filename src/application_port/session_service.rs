use crate::domain_model::{Session, SessionId, UserId};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("session was not found")]
    NotFound,
    #[error("session has been expired")]
    Expired,
    /// Backend failure. The in-memory store never fails; other backends report here.
    #[error("store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone)]
pub struct InitializeSessionRequest {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// Stores a session, replacing any session with the same ID.
    async fn initialize_session(&self, request: InitializeSessionRequest)
    -> Result<(), SessionError>;
    /// Checks that the session exists and has not expired as of now.
    async fn validate_session(&self, session_id: &SessionId) -> Result<Session, SessionError>;
    /// Removes the session. Succeeds whether or not it existed.
    async fn invalidate_session(&self, session_id: &SessionId) -> Result<(), SessionError>;
}
