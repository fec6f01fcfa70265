//! Market News Relay: binary entrypoint.
//! Boots the relay loop and the Telegram command poller in the background and
//! serves health, trigger and metrics routes over Axum.

use market_news_relay::{
    api,
    app::{init_tracing, Relay},
    config::{RelayConfig, RelayRules},
    metrics::Metrics,
};
use shuttle_axum::ShuttleAxum;

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = RelayConfig::from_env()?;
    let rules = RelayRules::load_default()?;
    tracing::info!(?cfg, "relay config loaded");

    let metrics = Metrics::init(cfg.dedup_capacity)?;
    let relay = Relay::build(&cfg, rules).await?;
    let state = relay.spawn();

    let router = api::router(state, &metrics);
    Ok(router.into())
}
