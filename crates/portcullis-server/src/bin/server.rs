//! Portcullis Server Binary

use anyhow::Result;
use portcullis_common_log::LogConfig;
use portcullis_server::config::{load_config, validate_config};
use portcullis_server::Server;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = load_config()?;
    if let Err(errors) = validate_config(&config) {
        for error in &errors {
            eprintln!("configuration error: {error}");
        }
        std::process::exit(2);
    }

    portcullis_common_log::init(
        LogConfig::new(&config.logging.level, &config.logging.format).with_env_overrides(),
    )?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        env = %config.server.env,
        "starting Portcullis server"
    );

    let server = Server::new(config)?;
    server.run().await?;

    info!("server shutdown complete");
    Ok(())
}
