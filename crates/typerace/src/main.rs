use std::path::PathBuf;

use clap::Parser;
use typerace::prelude::*;

/// Typerace Server - multiplayer typing-race rooms over WebSocket
#[derive(Parser, Debug)]
#[command(name = "typerace-server", version, about)]
struct Args {
    /// Address to bind the server to
    #[arg(short, long, default_value = "0.0.0.0:3000")]
    bind: String,

    /// JSON file of race passages (strings or {"quote": ...} objects)
    #[arg(short, long, default_value = "quotes.json")]
    quotes: PathBuf,

    /// Largest room a client may create
    #[arg(long, default_value_t = 8)]
    max_players: u32,

    /// Race length in seconds
    #[arg(long, default_value_t = 120, value_parser = clap::value_parser!(u32).range(1..))]
    race_seconds: u32,
}

#[tokio::main]
async fn main() -> Result<(), TyperaceError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "typerace_server=info,typerace=info,typerace_room=info".into()),
        )
        .init();

    let args = Args::parse();

    let config = RaceConfig {
        max_players_cap: args.max_players,
        race_duration_ticks: args.race_seconds,
        ..RaceConfig::default()
    };

    let server = TyperaceServer::builder()
        .bind(&args.bind)
        .race_config(config)
        .quotes(QuoteSource::from_file(&args.quotes))
        .build()
        .await?;

    tracing::info!(bind = %args.bind, max_players = args.max_players, "starting typerace server");
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
                std::future::pending::<()>().await;
            }
        })
        .await
}
