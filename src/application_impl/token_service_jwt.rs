use crate::application_port::{
    AuthorizationToken, ConfigError, InitializeSessionRequest, IssueAuthorizationTokenRequest,
    IssuedAuthorizationToken, ParsedAuthorizationToken, SessionService, TokenError, TokenService,
};
use crate::domain_model::{SessionId, random_long_id};
use crate::domain_port::Clock;
use chrono::{DateTime, SubsecRound, TimeDelta, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::signature::{Ed25519KeyPair, KeyPair};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_TOKEN_VALIDITY: Duration = Duration::from_secs(7 * 24 * 60 * 60);
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::from_secs(60);
pub const SIGNING_KEY_SEED_LEN: usize = 32;

// RFC 8410 PKCS#8 v1 header for a bare Ed25519 seed.
const ED25519_PKCS8_PREFIX: [u8; 16] = [
    0x30, 0x2e, 0x02, 0x01, 0x00, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x04, 0x22, 0x04, 0x20,
];

#[derive(Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: Vec<String>,
    pub validity: Duration,
    /// How far back `nbf` is set from the issue time.
    pub clock_skew: Duration,
    pub signing_key_seed: Vec<u8>,
}

impl JwtConfig {
    pub fn new(issuer: impl Into<String>, audience: Vec<String>, signing_key_seed: Vec<u8>) -> Self {
        Self {
            issuer: issuer.into(),
            audience,
            validity: DEFAULT_TOKEN_VALIDITY,
            clock_skew: DEFAULT_CLOCK_SKEW,
            signing_key_seed,
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("validity", &self.validity)
            .field("clock_skew", &self.clock_skew)
            .field("signing_key_seed", &"<redacted>")
            .finish()
    }
}

/// Converts a configured duration, refusing one that cannot be applied to `now`.
pub(crate) fn time_delta(
    name: &'static str,
    duration: Duration,
    now: DateTime<Utc>,
) -> Result<TimeDelta, ConfigError> {
    let delta =
        TimeDelta::from_std(duration).map_err(|_| ConfigError::InvalidDuration { name })?;
    if now.checked_add_signed(delta).is_none() || now.checked_sub_signed(delta).is_none() {
        return Err(ConfigError::InvalidDuration { name });
    }
    Ok(delta)
}

#[derive(Debug, Serialize, Deserialize)]
struct AuthorizationClaims {
    jti: String, // session id
    iss: String,
    aud: Vec<String>,
    iat: i64,
    nbf: i64,
    exp: i64,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    data: serde_json::Value,
}

/// Ed25519-signed JWTs bound 1:1 to server-side sessions.
pub struct JwtTokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    session_service: Arc<dyn SessionService>,
    clock: Arc<dyn Clock>,
    validity: TimeDelta,
    clock_skew: TimeDelta,
    cfg: JwtConfig,
}

impl JwtTokenService {
    pub fn try_new(
        cfg: JwtConfig,
        session_service: Arc<dyn SessionService>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, ConfigError> {
        if cfg.signing_key_seed.len() != SIGNING_KEY_SEED_LEN {
            return Err(ConfigError::InvalidSeedLength {
                expected: SIGNING_KEY_SEED_LEN,
                actual: cfg.signing_key_seed.len(),
            });
        }
        if cfg.audience.is_empty() {
            return Err(ConfigError::MissingAudience);
        }
        let now = clock.now();
        let validity = time_delta("token validity", cfg.validity, now)?;
        let clock_skew = time_delta("clock skew", cfg.clock_skew, now)?;

        let mut pkcs8 = Vec::with_capacity(ED25519_PKCS8_PREFIX.len() + SIGNING_KEY_SEED_LEN);
        pkcs8.extend_from_slice(&ED25519_PKCS8_PREFIX);
        pkcs8.extend_from_slice(&cfg.signing_key_seed);
        let key_pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(&pkcs8)
            .map_err(|e| ConfigError::InvalidKey(e.to_string()))?;

        let encoding_key = EncodingKey::from_ed_der(&pkcs8);
        let decoding_key = DecodingKey::from_ed_der(key_pair.public_key().as_ref());

        // Only EdDSA is accepted. Time claims are checked against our own clock.
        let mut validation = Validation::new(Algorithm::EdDSA);
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "aud"]);
        validation.set_issuer(&[cfg.issuer.as_str()]);
        validation.set_audience(&cfg.audience);

        Ok(Self {
            encoding_key,
            decoding_key,
            validation,
            session_service,
            clock,
            validity,
            clock_skew,
            cfg,
        })
    }

    async fn verify(&self, token: &str) -> Result<ParsedAuthorizationToken, TokenError> {
        let claims = decode::<AuthorizationClaims>(token, &self.decoding_key, &self.validation)
            .map_err(TokenError::Invalid)?
            .claims;

        let now = self.clock.now().timestamp();
        if claims.exp <= now {
            return Err(TokenError::Expired);
        }
        if claims.nbf > now {
            return Err(TokenError::NotYetValid);
        }

        let session = self
            .session_service
            .validate_session(&SessionId(claims.jti))
            .await?;

        Ok(ParsedAuthorizationToken {
            token_id: session.session_id,
            user_id: session.user_id,
            expires_at: session.expires_at,
            claims: claims.data,
        })
    }
}

#[async_trait::async_trait]
impl TokenService for JwtTokenService {
    async fn issue_authorization_token(
        &self,
        request: IssueAuthorizationTokenRequest,
    ) -> Result<IssuedAuthorizationToken, TokenError> {
        // Whole seconds, so the session expiry is exactly the token's `exp`.
        let now = self.clock.now().trunc_subsecs(0);
        let expires_at = now
            .checked_add_signed(self.validity)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let token_id = random_long_id();

        let claims = AuthorizationClaims {
            jti: token_id.clone(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            iat: now.timestamp(),
            nbf: now
                .checked_sub_signed(self.clock_skew)
                .unwrap_or(DateTime::<Utc>::MIN_UTC)
                .timestamp(),
            exp: expires_at.timestamp(),
            data: request.claims,
        };
        let token = encode(&Header::new(Algorithm::EdDSA), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)?;

        let session_id = SessionId(token_id);
        self.session_service
            .initialize_session(InitializeSessionRequest {
                session_id: session_id.clone(),
                user_id: request.user_id.clone(),
                expires_at,
            })
            .await?;

        tracing::info!(token_id = %session_id, user_id = %request.user_id, %expires_at, "authorization token issued");

        Ok(IssuedAuthorizationToken {
            token: AuthorizationToken(token),
            token_id: session_id,
            expires_at,
        })
    }

    async fn parse_authorization_token(
        &self,
        token: &str,
    ) -> Result<ParsedAuthorizationToken, TokenError> {
        let result = self.verify(token).await;
        if let Err(e) = &result {
            tracing::debug!(error = %e, "authorization token rejected");
        }
        result
    }

    async fn revoke_authorization_token(&self, token_id: &SessionId) -> Result<(), TokenError> {
        self.session_service.invalidate_session(token_id).await?;
        tracing::info!(token_id = %token_id, "authorization token revoked");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::MemorySessionService;
    use crate::application_port::{SessionError, TokenServiceExt};
    use crate::domain_model::{Session, UserId};
    use crate::domain_port::ManualClock;
    use crate::infra_memory::{ExpiringStore, StoreConfig};
    use chrono::Utc;
    use serde_json::json;

    // base64url of {"alg":"none","typ":"JWT"}
    const NONE_HEADER: &str = "eyJhbGciOiJub25lIiwidHlwIjoiSldUIn0";

    struct Harness {
        service: JwtTokenService,
        clock: Arc<ManualClock>,
        sessions: Arc<ExpiringStore<Session>>,
    }

    fn config(seed: u8) -> JwtConfig {
        JwtConfig::new(
            "tollgate.test",
            vec!["web".to_string(), "mobile".to_string()],
            vec![seed; SIGNING_KEY_SEED_LEN],
        )
    }

    fn harness_with(cfg: JwtConfig) -> Harness {
        let clock = Arc::new(ManualClock::new(Utc::now()));
        let sessions = ExpiringStore::new(clock.clone(), StoreConfig::default()).unwrap();
        let session_service = Arc::new(MemorySessionService::new(sessions.clone(), clock.clone()));
        let service = JwtTokenService::try_new(cfg, session_service, clock.clone()).unwrap();
        Harness {
            service,
            clock,
            sessions,
        }
    }

    fn harness() -> Harness {
        harness_with(config(7))
    }

    async fn issue(service: &JwtTokenService, claims: serde_json::Value) -> IssuedAuthorizationToken {
        service
            .issue_authorization_token(IssueAuthorizationTokenRequest {
                user_id: UserId::from("u1"),
                claims,
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn rejects_bad_seed_and_empty_audience() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Utc::now()));
        let store = ExpiringStore::new(clock.clone(), StoreConfig::default()).unwrap();
        let sessions: Arc<dyn SessionService> =
            Arc::new(MemorySessionService::new(store, clock.clone()));

        let mut short = config(1);
        short.signing_key_seed.truncate(16);
        assert!(matches!(
            JwtTokenService::try_new(short, sessions.clone(), clock.clone()),
            Err(ConfigError::InvalidSeedLength { expected: 32, actual: 16 })
        ));

        let mut no_audience = config(1);
        no_audience.audience.clear();
        assert!(matches!(
            JwtTokenService::try_new(no_audience, sessions, clock),
            Err(ConfigError::MissingAudience)
        ));
    }

    #[tokio::test]
    async fn rejects_durations_chrono_cannot_represent() {
        let clock: Arc<dyn Clock> = Arc::new(ManualClock::new(Utc::now()));
        let store = ExpiringStore::new(clock.clone(), StoreConfig::default()).unwrap();
        let sessions: Arc<dyn SessionService> =
            Arc::new(MemorySessionService::new(store, clock.clone()));

        let mut long_validity = config(1);
        long_validity.validity = Duration::from_secs(u64::MAX / 2);
        assert!(matches!(
            JwtTokenService::try_new(long_validity, sessions.clone(), clock.clone()),
            Err(ConfigError::InvalidDuration { name: "token validity" })
        ));

        // Representable as a TimeDelta, but past the last date chrono supports.
        let mut past_max_date = config(1);
        past_max_date.validity = Duration::from_secs(1 << 50);
        assert!(matches!(
            JwtTokenService::try_new(past_max_date, sessions.clone(), clock.clone()),
            Err(ConfigError::InvalidDuration { name: "token validity" })
        ));

        let mut wide_skew = config(1);
        wide_skew.clock_skew = Duration::from_secs(u64::MAX / 2);
        assert!(matches!(
            JwtTokenService::try_new(wide_skew, sessions, clock),
            Err(ConfigError::InvalidDuration { name: "clock skew" })
        ));
    }

    #[test]
    fn debug_output_hides_seed() {
        let output = format!("{:?}", config(0xab));
        assert!(output.contains("<redacted>"));
        assert!(!output.contains("171"));
    }

    #[tokio::test]
    async fn issued_token_registers_matching_session() {
        let h = harness();
        let issued = issue(&h.service, json!({"role": "admin"})).await;

        let session = h.sessions.get(&issued.token_id.0).unwrap();
        assert_eq!(session.user_id, UserId::from("u1"));
        assert_eq!(session.expires_at, issued.expires_at);
        assert_eq!(issued.token_id.0.len(), 24);

        let parsed = h.service.parse_authorization_token(&issued.token.0).await.unwrap();
        assert_eq!(parsed.token_id, issued.token_id);
        assert_eq!(parsed.user_id, UserId::from("u1"));
        assert_eq!(parsed.claims["role"], "admin");
    }

    #[tokio::test]
    async fn issue_fails_when_session_cannot_be_stored() {
        struct BrokenSessions;

        #[async_trait::async_trait]
        impl SessionService for BrokenSessions {
            async fn initialize_session(
                &self,
                _request: InitializeSessionRequest,
            ) -> Result<(), SessionError> {
                Err(SessionError::Store("unavailable".to_string()))
            }

            async fn validate_session(&self, _id: &SessionId) -> Result<Session, SessionError> {
                Err(SessionError::NotFound)
            }

            async fn invalidate_session(&self, _id: &SessionId) -> Result<(), SessionError> {
                Ok(())
            }
        }

        let clock = Arc::new(ManualClock::new(Utc::now()));
        let service =
            JwtTokenService::try_new(config(7), Arc::new(BrokenSessions), clock).unwrap();
        let err = service
            .issue_authorization_token(IssueAuthorizationTokenRequest {
                user_id: UserId::from("u1"),
                claims: json!(null),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, TokenError::Session(SessionError::Store(_))));
    }

    #[tokio::test]
    async fn revoked_token_fails_with_session_not_found() {
        let h = harness();
        let issued = issue(&h.service, json!({})).await;

        h.service.revoke_authorization_token(&issued.token_id).await.unwrap();
        h.service.revoke_authorization_token(&issued.token_id).await.unwrap();

        let err = h
            .service
            .parse_authorization_token(&issued.token.0)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Session(SessionError::NotFound)));
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn rejects_other_algorithms() {
        let h = harness();
        let issued = issue(&h.service, json!({"role": "admin"})).await;
        let now = h.clock.now().timestamp();

        let forged = encode(
            &Header::new(Algorithm::HS256),
            &json!({
                "jti": issued.token_id.0,
                "iss": "tollgate.test",
                "aud": ["web", "mobile"],
                "iat": now,
                "nbf": now - 60,
                "exp": now + 3600,
                "data": {"role": "admin"},
            }),
            &EncodingKey::from_secret(b"guessed-secret"),
        )
        .unwrap();
        let err = h.service.parse_authorization_token(&forged).await.unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));

        let payload = issued.token.0.split('.').nth(1).unwrap();
        let unsigned = format!("{NONE_HEADER}.{payload}.");
        let err = h.service.parse_authorization_token(&unsigned).await.unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[tokio::test]
    async fn rejects_token_signed_by_another_key() {
        let h = harness();
        let other = harness_with(config(8));
        let issued = issue(&other.service, json!({})).await;

        // Even with a live session under that ID the signature must not pass.
        h.sessions.set(
            issued.token_id.0.clone(),
            other.sessions.get(&issued.token_id.0).unwrap(),
        );
        let err = h
            .service
            .parse_authorization_token(&issued.token.0)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[tokio::test]
    async fn rejects_foreign_audience_and_issuer() {
        let h = harness();

        let mut foreign_audience = config(7);
        foreign_audience.audience = vec!["admin-console".to_string()];
        let issuer = harness_with(foreign_audience);
        let issued = issue(&issuer.service, json!({})).await;
        assert!(matches!(
            h.service.parse_authorization_token(&issued.token.0).await,
            Err(TokenError::Invalid(_))
        ));

        let mut foreign_issuer = config(7);
        foreign_issuer.issuer = "someone.else".to_string();
        let issuer = harness_with(foreign_issuer);
        let issued = issue(&issuer.service, json!({})).await;
        assert!(matches!(
            h.service.parse_authorization_token(&issued.token.0).await,
            Err(TokenError::Invalid(_))
        ));
    }

    #[tokio::test]
    async fn expiry_and_not_before_follow_the_clock() {
        let h = harness();
        let issued = issue(&h.service, json!({})).await;

        h.clock.advance(chrono::Duration::minutes(-5));
        assert!(matches!(
            h.service.parse_authorization_token(&issued.token.0).await,
            Err(TokenError::NotYetValid)
        ));

        h.clock.set(issued.expires_at);
        assert!(matches!(
            h.service.parse_authorization_token(&issued.token.0).await,
            Err(TokenError::Expired)
        ));
    }

    #[tokio::test]
    async fn typed_claims_round_trip_and_decode_errors() {
        #[derive(Debug, Serialize, Deserialize, PartialEq)]
        struct Role {
            role: String,
        }

        #[derive(Debug, Deserialize)]
        struct Tenant {
            #[allow(dead_code)]
            tenant_id: u64,
        }

        let h = harness();
        let issued = h
            .service
            .issue_with_claims(UserId::from("u1"), &Role { role: "admin".to_string() })
            .await
            .unwrap();

        let parsed = h.service.parse_with_claims::<Role>(&issued.token.0).await.unwrap();
        assert_eq!(parsed.claims.role, "admin");

        let err = h
            .service
            .parse_with_claims::<Tenant>(&issued.token.0)
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Decode(_)));
    }
}
