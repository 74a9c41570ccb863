use crate::application_port::{InitializeSessionRequest, SessionError, SessionService};
use crate::domain_model::{Session, SessionId};
use crate::domain_port::{Clock, Expirable};
use crate::infra_memory::ExpiringStore;
use std::sync::Arc;

pub struct MemorySessionService {
    sessions: Arc<ExpiringStore<Session>>,
    clock: Arc<dyn Clock>,
}

impl MemorySessionService {
    pub fn new(sessions: Arc<ExpiringStore<Session>>, clock: Arc<dyn Clock>) -> Self {
        Self { sessions, clock }
    }
}

#[async_trait::async_trait]
impl SessionService for MemorySessionService {
    async fn initialize_session(
        &self,
        request: InitializeSessionRequest,
    ) -> Result<(), SessionError> {
        let InitializeSessionRequest {
            session_id,
            user_id,
            expires_at,
        } = request;

        self.sessions.set(
            session_id.0.clone(),
            Session {
                session_id,
                user_id,
                expires_at,
            },
        );
        Ok(())
    }

    async fn validate_session(&self, session_id: &SessionId) -> Result<Session, SessionError> {
        let session = self
            .sessions
            .get(&session_id.0)
            .ok_or(SessionError::NotFound)?;
        // The sweep may not have run yet.
        if session.is_expired(self.clock.now()) {
            return Err(SessionError::Expired);
        }
        Ok(session)
    }

    async fn invalidate_session(&self, session_id: &SessionId) -> Result<(), SessionError> {
        self.sessions.delete(&session_id.0);
        Ok(())
    }
}
