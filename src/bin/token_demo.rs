//! Walks through the credential lifecycle against the configured services:
//! issue → parse → revoke → parse again, then an OAuth handshake.
//!
//! The handshake part expects `oauth.backend = "fake"` (the dev default).
//!
//! $ cargo run --bin token_demo -- --settings=settings/dev.toml

use serde_json::json;
use tollgate::application_port::*;
use tollgate::domain_model::{ProviderId, UserId};
use tollgate::logger::*;
use tollgate::server::Server;
use tollgate::settings::*;
use url::Url;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let logger = Logger::new_bootstrap()?;
    let project_settings = parse_settings(cli.settings.as_deref())?;
    logger.reload_from_config(&LogConfig {
        filter: project_settings.log.filter.clone(),
    })?;

    let server = Server::try_new(&project_settings)?;

    // region token lifecycle

    let issued = server
        .token_service
        .issue_authorization_token(IssueAuthorizationTokenRequest {
            user_id: UserId::from("u1"),
            claims: json!({"role": "admin"}),
        })
        .await?;
    info!(token_id = %issued.token_id, expires_at = %issued.expires_at, "issued");

    let parsed = server
        .token_service
        .parse_authorization_token(&issued.token.0)
        .await?;
    info!(user_id = %parsed.user_id, claims = %parsed.claims, "parsed");

    server
        .token_service
        .revoke_authorization_token(&issued.token_id)
        .await?;

    match server
        .token_service
        .parse_authorization_token(&issued.token.0)
        .await
    {
        Ok(_) => error!("revoked token still parses"),
        Err(e) => info!(error = %e, unauthorized = e.is_unauthorized(), "revoked token rejected"),
    }

    // endregion

    // region oauth handshake

    let login = server
        .oauth_service
        .login_with_provider(LoginWithProviderRequest {
            provider: ProviderId::google(),
            redirect_url: "https://app.example/cb".to_string(),
            nonce: "n1".to_string(),
        })
        .await?;
    info!(url = %login.authentication_url, "redirect the user here");

    let state = Url::parse(&login.authentication_url)?
        .query_pairs()
        .find(|(k, _)| k == "state")
        .map(|(_, v)| v.into_owned())
        .ok_or_else(|| anyhow::anyhow!("authorization URL has no state"))?;

    let consumed = server
        .oauth_service
        .consume_provider(ConsumeProviderRequest {
            state: state.clone(),
            code: "c1".to_string(),
        })
        .await?;
    info!(user = %consumed.user_info.id, nonce = %consumed.nonce, "callback consumed");

    let replay = server
        .oauth_service
        .consume_provider(ConsumeProviderRequest {
            state,
            code: "c1".to_string(),
        })
        .await;
    info!(rejected = replay.is_err(), "callback replay");

    // endregion

    server.shutdown();
    Ok(())
}
