use tollgate::logger::*;
use tollgate::server::*;
use tollgate::settings::*;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let logger = Logger::new_bootstrap()?;

    let project_settings = parse_settings(cli.settings.as_deref())?;
    info!(?project_settings);
    let logger_config = LogConfig {
        filter: project_settings.log.filter.clone(),
    };
    logger.reload_from_config(&logger_config)?;

    let server = Server::try_new(&project_settings)?;

    signal::ctrl_c().await?;

    info!(
        active_sessions = server.active_sessions(),
        pending_logins = server.pending_logins(),
        "received SIGINT"
    );
    server.shutdown();

    Ok(())
}
