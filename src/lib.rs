pub mod completion;
pub mod config;
pub mod dingtalk;
pub mod error;
pub mod relay;
pub mod server;
pub mod session;
pub mod types;

use std::sync::Arc;

use log::{debug, info, warn};

use completion::OpenAiClient;
use config::Config;
use dingtalk::DingTalkReplier;
use error::Result;
use relay::Relay;
use server::AppState;
use session::InMemorySessionStore;

/// Run the relay until Ctrl-C.
pub async fn run() -> Result<()> {
    info!("Initializing relay");
    let config = Config::from_env()?;

    debug!("Initializing completion client");
    let completion = OpenAiClient::from_config(&config)?;
    let sessions = InMemorySessionStore::new(config.clear_command.clone());
    let relay = Relay::new(Arc::new(completion), Arc::new(sessions));

    let state = Arc::new(AppState {
        relay,
        sink: Arc::new(DingTalkReplier::new(reqwest::Client::new())),
    });

    server::serve(config.listen_addr, state, async {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Shutdown signal received, shutting down..."),
            Err(e) => {
                warn!("Failed to listen for shutdown signal: {e}");
                std::future::pending::<()>().await;
            }
        }
    })
    .await
}
