//! Runs a single on-demand pass for every subscriber and prints the report.
//! Handy for checking credentials and rules without starting the service.

use market_news_relay::app::{init_tracing, Relay};
use market_news_relay::config::{RelayConfig, RelayRules};
use market_news_relay::ingest::scheduler::Trigger;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let cfg = RelayConfig::from_env()?;
    let rules = RelayRules::load_default()?;
    let mut relay = Relay::build(&cfg, rules).await?;

    let report = relay.scheduler.run_cycle(Trigger::All).await;
    println!("{report:#?}");
    Ok(())
}
