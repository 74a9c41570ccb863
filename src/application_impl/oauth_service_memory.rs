use crate::application_impl::token_service_jwt::time_delta;
use crate::application_port::{
    ConfigError, ConsumeProviderRequest, ConsumeProviderResponse, ExchangeCodeRequest, ExchangeCodeResponse,
    LoginWithProviderRequest, LoginWithProviderResponse, OAuthError, OAuthService,
    VerifyIdTokenRequest, VerifyIdTokenResponse,
};
use crate::domain_model::{PendingLogin, ProviderId, UserInfo, random_long_id};
use crate::domain_port::{Clock, IdentityProvider};
use crate::infra_memory::ExpiringStore;
use chrono::{DateTime, TimeDelta, Utc};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const DEFAULT_PENDING_LOGIN_TTL: Duration = Duration::from_secs(5 * 60);

/// OAuth handshakes tracked in process memory.
pub struct MemoryOAuthService {
    pending: Arc<ExpiringStore<PendingLogin>>,
    idp: Arc<dyn IdentityProvider>,
    clock: Arc<dyn Clock>,
    pending_login_ttl: TimeDelta,
}

impl MemoryOAuthService {
    pub fn try_new(
        pending: Arc<ExpiringStore<PendingLogin>>,
        idp: Arc<dyn IdentityProvider>,
        clock: Arc<dyn Clock>,
        pending_login_ttl: Duration,
    ) -> Result<Self, ConfigError> {
        let pending_login_ttl = time_delta("pending login ttl", pending_login_ttl, clock.now())?;
        Ok(Self {
            pending,
            idp,
            clock,
            pending_login_ttl,
        })
    }

    async fn fetch_user_info(
        &self,
        provider: &ProviderId,
        code: &str,
    ) -> Result<UserInfo, OAuthError> {
        let token = self.idp.exchange_code(provider, code).await.map_err(|e| {
            tracing::warn!(%provider, error = %e, "code exchange failed");
            e
        })?;
        let user_info = self
            .idp
            .get_user_info(provider, &token.access_token)
            .await
            .map_err(|e| {
                tracing::warn!(%provider, error = %e, "user info request failed");
                e
            })?;
        Ok(user_info)
    }
}

#[async_trait::async_trait]
impl OAuthService for MemoryOAuthService {
    async fn login_with_provider(
        &self,
        request: LoginWithProviderRequest,
    ) -> Result<LoginWithProviderResponse, OAuthError> {
        let redirect_url = Url::parse(&request.redirect_url)?;
        let state = random_long_id();

        let authentication_url = self
            .idp
            .get_authorization_url(&request.provider, &state)
            .await?;

        let pending = PendingLogin {
            provider: request.provider,
            redirect_url,
            nonce: request.nonce,
            expires_at: self
                .clock
                .now()
                .checked_add_signed(self.pending_login_ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        };
        tracing::info!(provider = %pending.provider, expires_at = %pending.expires_at, "oauth login started");
        self.pending.set(state, pending);

        Ok(LoginWithProviderResponse { authentication_url })
    }

    async fn consume_provider(
        &self,
        request: ConsumeProviderRequest,
    ) -> Result<ConsumeProviderResponse, OAuthError> {
        // Absent, already consumed and expired all look the same to the caller.
        let pending = self
            .pending
            .pop_validate(&request.state)
            .ok_or(OAuthError::StateNotFound)?;

        let user_info = self.fetch_user_info(&pending.provider, &request.code).await?;
        tracing::info!(provider = %pending.provider, user = %user_info.id, "oauth login completed");

        Ok(ConsumeProviderResponse {
            provider: pending.provider,
            user_info,
            redirect_url: pending.redirect_url,
            nonce: pending.nonce,
        })
    }

    async fn exchange_code(
        &self,
        request: ExchangeCodeRequest,
    ) -> Result<ExchangeCodeResponse, OAuthError> {
        let user_info = self.fetch_user_info(&request.provider, &request.code).await?;
        Ok(ExchangeCodeResponse { user_info })
    }

    async fn verify_id_token(
        &self,
        request: VerifyIdTokenRequest,
    ) -> Result<VerifyIdTokenResponse, OAuthError> {
        let user_info = self
            .idp
            .verify_id_token(&request.provider, &request.token)
            .await?;
        Ok(VerifyIdTokenResponse { user_info })
    }
}
