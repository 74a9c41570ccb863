use crate::domain_model::{OAuthToken, ProviderId, UserInfo};
use crate::domain_port::{IdentityProvider, IdpError};
use std::collections::HashSet;
use url::Url;

const FAKE_AUTH_URL: &str = "https://idp.fake/authorize";
const ACCESS_TOKEN_PREFIX: &str = "fake-access-token:";
const ID_TOKEN_PREFIX: &str = "fake-id-token:";

/// Deterministic provider for tests and local runs. Never touches the network.
#[derive(Debug)]
pub struct FakeIdentityProvider {
    providers: HashSet<ProviderId>,
}

impl FakeIdentityProvider {
    /// Authorization codes equal to this fail the exchange.
    pub const FAILING_CODE: &'static str = "fail";

    pub fn new() -> Self {
        Self::with_providers([ProviderId::google()])
    }

    pub fn with_providers(providers: impl IntoIterator<Item = ProviderId>) -> Self {
        Self {
            providers: providers.into_iter().collect(),
        }
    }

    fn check(&self, provider: &ProviderId) -> Result<(), IdpError> {
        if self.providers.contains(provider) {
            Ok(())
        } else {
            Err(IdpError::UnsupportedProvider(provider.clone()))
        }
    }
}

impl Default for FakeIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn get_authorization_url(
        &self,
        provider: &ProviderId,
        state: &str,
    ) -> Result<String, IdpError> {
        self.check(provider)?;
        let url = Url::parse_with_params(
            FAKE_AUTH_URL,
            &[("provider", provider.0.as_str()), ("state", state)],
        )?;
        Ok(url.into())
    }

    async fn exchange_code(
        &self,
        provider: &ProviderId,
        code: &str,
    ) -> Result<OAuthToken, IdpError> {
        self.check(provider)?;
        if code == Self::FAILING_CODE {
            return Err(IdpError::InvalidResponse("simulated exchange failure".to_string()));
        }
        Ok(OAuthToken {
            access_token: format!("{ACCESS_TOKEN_PREFIX}{code}"),
            token_type: "Bearer".to_string(),
            expires_in: Some(3600),
            refresh_token: None,
            id_token: Some(format!("{ID_TOKEN_PREFIX}{code}")),
        })
    }

    async fn get_user_info(
        &self,
        provider: &ProviderId,
        access_token: &str,
    ) -> Result<UserInfo, IdpError> {
        self.check(provider)?;
        match access_token.strip_prefix(ACCESS_TOKEN_PREFIX) {
            Some(code) => Ok(get_fake_user(provider, code)),
            None => Err(IdpError::UnexpectedStatus {
                status: 401,
                body: "invalid access token".to_string(),
            }),
        }
    }

    async fn verify_id_token(
        &self,
        provider: &ProviderId,
        token: &str,
    ) -> Result<UserInfo, IdpError> {
        self.check(provider)?;
        match token.strip_prefix(ID_TOKEN_PREFIX) {
            Some(code) => Ok(get_fake_user(provider, code)),
            None => Err(IdpError::InvalidResponse("invalid id token".to_string())),
        }
    }
}

fn get_fake_user(provider: &ProviderId, code: &str) -> UserInfo {
    let id = format!("fake-user:{code}");
    let email = format!("{code}@fake.example");
    UserInfo {
        provider_user_info: serde_json::json!({
            "sub": id,
            "email": email,
            "email_verified": true,
        }),
        id,
        email,
        email_verified: true,
        provider_id: provider.clone(),
    }
}
