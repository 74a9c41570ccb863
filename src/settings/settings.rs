use crate::application_port::ConfigError;
use crate::domain_model::ProviderId;
use crate::infra_oauth::OAuthProviderConfig;
use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub log: Log,
    #[serde(default)]
    pub store: Store,
    pub token: Token,
    pub oauth: OAuth,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Store {
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl Store {
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

#[derive(Deserialize)]
pub struct Token {
    pub issuer: String,
    pub audience: Vec<String>,
    #[serde(default = "default_token_validity_secs")]
    pub validity_secs: u64,
    #[serde(default = "default_clock_skew_secs")]
    pub clock_skew_secs: u64,
    /// Hex-encoded 32-byte Ed25519 seed.
    pub signing_key_seed: String,
}

impl Token {
    pub fn signing_key_seed(&self) -> Result<Vec<u8>, ConfigError> {
        Ok(hex::decode(self.signing_key_seed.trim())?)
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("validity_secs", &self.validity_secs)
            .field("clock_skew_secs", &self.clock_skew_secs)
            .field("signing_key_seed", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct OAuth {
    pub backend: String, // "fake" or "real"
    #[serde(default = "default_pending_login_ttl_secs")]
    pub pending_login_ttl_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default)]
    pub providers: HashMap<ProviderId, OAuthProviderConfig>,
}

fn default_sweep_interval_secs() -> u64 {
    60
}

fn default_token_validity_secs() -> u64 {
    7 * 24 * 60 * 60
}

fn default_clock_skew_secs() -> u64 {
    60
}

fn default_pending_login_ttl_secs() -> u64 {
    5 * 60
}

fn default_user_agent() -> String {
    format!("tollgate/{}", env!("CARGO_PKG_VERSION"))
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

/// Loads the TOML file, then lets `TOLLGATE_<SECTION>__<KEY>` variables override it.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix("TOLLGATE")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dev_settings_load() {
        let settings = parse_settings(Some("settings/dev.toml")).unwrap();

        assert_eq!(settings.oauth.backend, "fake");
        assert_eq!(settings.oauth.pending_login_ttl_secs, 300);
        assert_eq!(settings.store.sweep_interval(), Duration::from_secs(60));
        assert_eq!(settings.token.validity_secs, 7 * 24 * 60 * 60);
        assert_eq!(settings.token.signing_key_seed().unwrap().len(), 32);

        let google = &settings.oauth.providers[&ProviderId::google()];
        assert_eq!(google.extra_params["access_type"], "offline");
    }

    #[test]
    fn missing_file_is_an_error() {
        assert!(parse_settings(Some("settings/does-not-exist.toml")).is_err());
    }

    #[test]
    fn seed_is_redacted_and_validated() {
        let token = Token {
            issuer: "i".to_string(),
            audience: vec!["a".to_string()],
            validity_secs: 1,
            clock_skew_secs: 1,
            signing_key_seed: "zz".to_string(),
        };
        assert!(!format!("{token:?}").contains("zz"));
        assert!(matches!(
            token.signing_key_seed(),
            Err(ConfigError::InvalidSeedEncoding(_))
        ));
    }
}
