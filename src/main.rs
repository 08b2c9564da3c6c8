#[tokio::main]
async fn main() -> chatrelay::error::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("chatrelay=info"))
        .init();
    log::info!("Starting chatrelay");

    if rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .is_err()
    {
        log::debug!("TLS crypto provider already installed");
    }

    match chatrelay::run().await {
        Ok(()) => {
            log::info!("Relay shut down successfully");
            Ok(())
        }
        Err(e) => {
            log::error!("Relay encountered an error: {}", e);
            Err(e)
        }
    }
}
