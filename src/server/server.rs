use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::{PendingLogin, ProviderId, Session};
use crate::domain_port::*;
use crate::infra_memory::{ExpiringStore, StoreConfig};
use crate::infra_oauth::{FakeIdentityProvider, OAuthIdentityProvider};
use crate::settings::Settings;
use anyhow::anyhow;
use std::sync::Arc;
use std::time::Duration;

/// Owns the stores and wires every service from settings.
pub struct Server {
    pub session_service: Arc<dyn SessionService>,
    pub token_service: Arc<dyn TokenService>,
    pub oauth_service: Arc<dyn OAuthService>,
    sessions: Arc<ExpiringStore<Session>>,
    pending_logins: Arc<ExpiringStore<PendingLogin>>,
}

impl Server {
    /// Must be called from within a Tokio runtime; each store starts its sweep here.
    pub fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        Self::with_clock(settings, Arc::new(SystemClock))
    }

    pub fn with_clock(settings: &Settings, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        let store_config = StoreConfig {
            sweep_interval: settings.store.sweep_interval(),
            ..StoreConfig::default()
        };

        let sessions: Arc<ExpiringStore<Session>> =
            ExpiringStore::new(clock.clone(), store_config.clone())?;
        let session_service: Arc<dyn SessionService> =
            Arc::new(MemorySessionService::new(sessions.clone(), clock.clone()));

        let token = &settings.token;
        let jwt_config = JwtConfig {
            issuer: token.issuer.clone(),
            audience: token.audience.clone(),
            validity: Duration::from_secs(token.validity_secs),
            clock_skew: Duration::from_secs(token.clock_skew_secs),
            signing_key_seed: token.signing_key_seed()?,
        };
        let token_service: Arc<dyn TokenService> = Arc::new(JwtTokenService::try_new(
            jwt_config,
            session_service.clone(),
            clock.clone(),
        )?);

        let oauth = &settings.oauth;
        let idp: Arc<dyn IdentityProvider> = match oauth.backend.as_str() {
            "fake" => Arc::new(FakeIdentityProvider::with_providers(
                oauth
                    .providers
                    .keys()
                    .cloned()
                    .chain(std::iter::once(ProviderId::google())),
            )),
            "real" => Arc::new(OAuthIdentityProvider::try_new(
                oauth.providers.clone(),
                &oauth.user_agent,
            )?),
            other => return Err(anyhow!("unknown oauth backend: {other:?}")),
        };
        let pending_logins: Arc<ExpiringStore<PendingLogin>> =
            ExpiringStore::new(clock.clone(), store_config)?;
        let oauth_service: Arc<dyn OAuthService> = Arc::new(MemoryOAuthService::try_new(
            pending_logins.clone(),
            idp,
            clock,
            Duration::from_secs(oauth.pending_login_ttl_secs),
        )?);

        tracing::info!(
            issuer = %token.issuer,
            oauth_backend = %oauth.backend,
            providers = oauth.providers.len(),
            "services ready"
        );

        Ok(Self {
            session_service,
            token_service,
            oauth_service,
            sessions,
            pending_logins,
        })
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    pub fn pending_logins(&self) -> usize {
        self.pending_logins.len()
    }

    /// Stops both sweeps. Safe to call more than once.
    pub fn shutdown(&self) {
        tracing::info!("Server shutting down...");
        self.sessions.close();
        self.pending_logins.close();
        tracing::info!("store sweeps stopped");
    }

    pub fn is_shut_down(&self) -> bool {
        self.sessions.is_closed() && self.pending_logins.is_closed()
    }
}
