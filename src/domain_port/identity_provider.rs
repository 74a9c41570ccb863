use crate::domain_model::{OAuthToken, ProviderId, UserInfo};

#[derive(Debug, thiserror::Error)]
pub enum IdpError {
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(ProviderId),
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status: {status}. {body}")]
    UnexpectedStatus { status: u16, body: String },
    #[error("invalid provider response: {0}")]
    InvalidResponse(String),
}

/// Performs the network side of an OAuth handshake.
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn get_authorization_url(
        &self,
        provider: &ProviderId,
        state: &str,
    ) -> Result<String, IdpError>;

    async fn exchange_code(&self, provider: &ProviderId, code: &str)
    -> Result<OAuthToken, IdpError>;

    async fn get_user_info(
        &self,
        provider: &ProviderId,
        access_token: &str,
    ) -> Result<UserInfo, IdpError>;

    async fn verify_id_token(&self, provider: &ProviderId, token: &str)
    -> Result<UserInfo, IdpError>;
}
