use crate::application_port::SessionError;
use crate::domain_model::{SessionId, UserId};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token invalid: {0}")]
    Invalid(#[source] jsonwebtoken::errors::Error),
    #[error("token expired")]
    Expired,
    #[error("token not yet valid")]
    NotYetValid,
    #[error("claims decode failed: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("validate session: {0}")]
    Session(#[from] SessionError),
    #[error("sign token: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Every rejection of a presented token means the same thing to a client.
    /// Keep the variant for logs and answer "unauthorized" regardless.
    pub fn is_unauthorized(&self) -> bool {
        !matches!(self, TokenError::Signing(_))
    }
}

/// Construction-time misconfiguration of a service.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("signing key seed must be {expected} bytes, got {actual}")]
    InvalidSeedLength { expected: usize, actual: usize },
    #[error("signing key seed is not valid hex: {0}")]
    InvalidSeedEncoding(#[from] hex::FromHexError),
    #[error("invalid signing key: {0}")]
    InvalidKey(String),
    #[error("at least one token audience is required")]
    MissingAudience,
    #[error("{name} is out of range")]
    InvalidDuration { name: &'static str },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthorizationToken(pub String);

#[derive(Debug, Clone)]
pub struct IssueAuthorizationTokenRequest {
    pub user_id: UserId,
    /// Opaque payload carried in the `data` claim.
    pub claims: serde_json::Value,
}

#[derive(Debug, Clone)]
pub struct IssuedAuthorizationToken {
    pub token: AuthorizationToken,
    pub token_id: SessionId,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct ParsedAuthorizationToken<C = serde_json::Value> {
    pub token_id: SessionId,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub claims: C,
}

#[async_trait::async_trait]
pub trait TokenService: Send + Sync {
    /// Signs a new token and registers the session backing it.
    /// No token is returned unless the session was stored.
    async fn issue_authorization_token(
        &self,
        request: IssueAuthorizationTokenRequest,
    ) -> Result<IssuedAuthorizationToken, TokenError>;
    /// Verifies signature and registered claims, then requires a live session.
    async fn parse_authorization_token(
        &self,
        token: &str,
    ) -> Result<ParsedAuthorizationToken, TokenError>;
    /// Deletes the session; every copy of the token stops parsing.
    async fn revoke_authorization_token(&self, token_id: &SessionId) -> Result<(), TokenError>;
}

/// Typed claims on top of any [`TokenService`].
#[async_trait::async_trait]
pub trait TokenServiceExt: TokenService {
    async fn issue_with_claims<C>(
        &self,
        user_id: UserId,
        claims: &C,
    ) -> Result<IssuedAuthorizationToken, TokenError>
    where
        C: Serialize + Sync + ?Sized,
    {
        let claims = serde_json::to_value(claims)?;
        self.issue_authorization_token(IssueAuthorizationTokenRequest { user_id, claims })
            .await
    }

    async fn parse_with_claims<C>(
        &self,
        token: &str,
    ) -> Result<ParsedAuthorizationToken<C>, TokenError>
    where
        C: DeserializeOwned + Send,
    {
        let parsed = self.parse_authorization_token(token).await?;
        let claims = serde_json::from_value(parsed.claims)?;
        Ok(ParsedAuthorizationToken {
            token_id: parsed.token_id,
            user_id: parsed.user_id,
            expires_at: parsed.expires_at,
            claims,
        })
    }
}

impl<S: TokenService + ?Sized> TokenServiceExt for S {}
