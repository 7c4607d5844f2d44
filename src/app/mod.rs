use crate::api::ApiServer;
use crate::config::Config;
use crate::token::TokenIssuer;
use anyhow::Result;
use tracing::info;

pub async fn run_service() -> Result<()> {
    info!("Starting Quickroom token service");

    let config = Config::load()?;
    let issuer = TokenIssuer::new(
        &config.livekit.url,
        &config.livekit.api_key,
        &config.livekit.api_secret,
    )?;

    let api_server = ApiServer::new(issuer, &config);

    info!("Quickroom is ready!");
    info!(
        "Mint a token: curl 'http://127.0.0.1:{}/token?identity=alice&room=demo'",
        config.server.port
    );
    info!("Join a room: quickroom join --identity alice --room demo");

    api_server.start().await
}
