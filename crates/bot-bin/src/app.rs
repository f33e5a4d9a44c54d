//! Process entry points for each run mode.

use crate::commands::{self, GenerateHandler, VersionHandler};
use crate::image_client::ImageClient;
use bot_config::Config;
use command_registry::{CommandRegistry, DiscordCommandApi, SyncMode};
use interaction_dispatcher::{BotRuntimeConfig, DiscordFollowupClient, Dispatcher};
use secret_client_factory::{
    LazyClient, MetadataTokenSource, SecretManagerStore, SecretRef, SecretStore,
};
use signature_verifier::SignatureVerifier;
use std::error::Error;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

type AppResult<T> = Result<T, Box<dyn Error>>;

const HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn http_client() -> AppResult<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .connect_timeout(HTTP_CONNECT_TIMEOUT)
        .user_agent(commands::build_identifier())
        .build()?)
}

/// Serve the interaction webhook until SIGTERM or Ctrl-C.
pub async fn run_server(config: Config) -> AppResult<()> {
    let verifier = SignatureVerifier::from_hex(&config.public_key)?;
    let http = http_client()?;

    let tokens = Arc::new(MetadataTokenSource::new(http.clone()));
    let store: Arc<dyn SecretStore> = Arc::new(SecretManagerStore::new(http.clone(), tokens));
    let image_endpoint = config.image_api_url()?;
    let image_http = http.clone();
    let images = Arc::new(LazyClient::new(
        store,
        SecretRef::new(config.project_id.as_str(), config.secret_id.as_str()),
        move |api_key| {
            Ok(ImageClient::new(
                image_http.clone(),
                image_endpoint.clone(),
                api_key,
            ))
        },
    ));

    let runtime = BotRuntimeConfig::builder(
        config.bot_name.as_str(),
        config.application_id.as_str(),
        verifier,
    )
    .command(commands::version_descriptor(), Arc::new(VersionHandler::new()))
    .command(
        commands::generate_descriptor(),
        Arc::new(GenerateHandler::new(images)),
    )
    .port(config.port)
    .secret_id(config.secret_id.as_str())
    .followup_timeout(Duration::from_secs(config.followup_timeout_secs))
    .max_body_bytes(config.max_body_bytes)
    .build()?;

    let transport = Arc::new(DiscordFollowupClient::new(
        http,
        config.api_base_url.as_str(),
        config.application_id.as_str(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(Arc::new(runtime), transport));

    let listener = TcpListener::bind(("0.0.0.0", config.port)).await?;
    info!(
        bot = %config.bot_name,
        commands = dispatcher.config().commands().len(),
        "Bot ready"
    );
    interaction_dispatcher::serve(listener, dispatcher, shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

/// Install or tear down the bot's commands, then return.
pub async fn sync_commands(config: &Config, mode: SyncMode) -> AppResult<()> {
    let bot_token = config
        .bot_token
        .as_deref()
        .ok_or("bot token is required to manage commands")?;
    let api = DiscordCommandApi::new(
        http_client()?,
        config.api_base_url.as_str(),
        config.application_id.as_str(),
        bot_token,
    );
    let registry = CommandRegistry::new(Arc::new(api));
    let report = registry.sync(&commands::descriptors(), mode).await?;
    info!(
        ?mode,
        upserted = report.upserted,
        deleted = report.deleted,
        failed = report.failed,
        "Command sync finished"
    );
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Ctrl-C handler unavailable");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "SIGTERM handler unavailable");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received Ctrl-C, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
