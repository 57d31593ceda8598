//! voxhall-relay: UDP rendezvous and signaling relay for Voxhall voice
//! chat. Assigns client identities, tracks room membership, and forwards
//! opaque negotiation payloads between peers. Media never flows through
//! this process.
//!
//! Usage: `voxhall-relay [port]` (defaults to 12345).

use std::process::ExitCode;
use std::time::Duration;

use voxhall_relay::{RelayServerBuilder, DEFAULT_PORT};

const STATS_INTERVAL: Duration = Duration::from_secs(60);

fn port_from_args() -> Result<u16, String> {
    match std::env::args().nth(1) {
        None => Ok(DEFAULT_PORT),
        Some(arg) => arg
            .parse::<u16>()
            .map_err(|_| format!("invalid port '{arg}' (expected 1-65535)")),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voxhall_relay=info".into()),
        )
        .init();

    let port = match port_from_args() {
        Ok(port) => port,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("usage: voxhall-relay [port]");
            return ExitCode::FAILURE;
        }
    };

    let server = match RelayServerBuilder::new()
        .bind(&format!("0.0.0.0:{port}"))
        .build()
        .await
    {
        Ok(server) => server,
        Err(e) => {
            tracing::error!(port, error = %e, "failed to start relay");
            return ExitCode::FAILURE;
        }
    };

    tracing::info!(addr = %server.local_addr(), "voxhall-relay listening");
    let handle = server.spawn();

    let mut stats_timer = tokio::time::interval(STATS_INTERVAL);
    stats_timer.tick().await; // first tick fires immediately; skip it

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                break;
            }
            _ = stats_timer.tick() => {
                let stats = handle.stats().await;
                tracing::info!(clients = stats.clients, rooms = stats.rooms, "relay stats");
            }
        }
    }

    handle.stop().await;
    ExitCode::SUCCESS
}
