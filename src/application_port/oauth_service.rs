use crate::domain_model::{ProviderId, UserInfo};
use crate::domain_port::IdpError;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    #[error("state not found")]
    StateNotFound,
    #[error("parse redirect URL: {0}")]
    InvalidRedirectUrl(#[from] url::ParseError),
    #[error("identity provider: {0}")]
    Provider(#[from] IdpError),
}

#[derive(Debug, Clone)]
pub struct LoginWithProviderRequest {
    pub provider: ProviderId,
    pub redirect_url: String,
    pub nonce: String,
}

#[derive(Debug, Clone)]
pub struct LoginWithProviderResponse {
    pub authentication_url: String,
}

#[derive(Debug, Clone)]
pub struct ConsumeProviderRequest {
    pub state: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct ConsumeProviderResponse {
    pub provider: ProviderId,
    pub user_info: UserInfo,
    pub redirect_url: Url,
    pub nonce: String,
}

#[derive(Debug, Clone)]
pub struct ExchangeCodeRequest {
    pub provider: ProviderId,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct ExchangeCodeResponse {
    pub user_info: UserInfo,
}

#[derive(Debug, Clone)]
pub struct VerifyIdTokenRequest {
    pub provider: ProviderId,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct VerifyIdTokenResponse {
    pub user_info: UserInfo,
}

#[async_trait::async_trait]
pub trait OAuthService: Send + Sync {
    /// Starts a handshake and returns the provider URL to send the user to.
    async fn login_with_provider(
        &self,
        request: LoginWithProviderRequest,
    ) -> Result<LoginWithProviderResponse, OAuthError>;
    /// Finishes a handshake. Each state can be consumed once.
    async fn consume_provider(
        &self,
        request: ConsumeProviderRequest,
    ) -> Result<ConsumeProviderResponse, OAuthError>;
    async fn exchange_code(
        &self,
        request: ExchangeCodeRequest,
    ) -> Result<ExchangeCodeResponse, OAuthError>;
    async fn verify_id_token(
        &self,
        request: VerifyIdTokenRequest,
    ) -> Result<VerifyIdTokenResponse, OAuthError>;
}
