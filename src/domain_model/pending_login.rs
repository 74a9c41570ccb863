use crate::domain_model::ProviderId;
use crate::domain_port::Expirable;
use chrono::{DateTime, Utc};
use url::Url;

/// An OAuth handshake waiting for its callback, keyed by the state string.
#[derive(Debug, Clone)]
pub struct PendingLogin {
    pub provider: ProviderId,
    pub redirect_url: Url,
    pub nonce: String,
    pub expires_at: DateTime<Utc>,
}

impl Expirable for PendingLogin {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
