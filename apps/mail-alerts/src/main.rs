use core_config::tracing::{init_tracing, install_color_eyre};
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{info, warn};

mod api;
mod config;
mod db;
mod error;
mod shutdown;
mod smtp;
mod state;

use config::Config;
use shutdown::Shutdown;
use state::{AppState, Pipeline};

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // Install color-eyre first for colored error output (before any fallible operations)
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let db = db::connect(&config.database)
        .await
        .map_err(|e| eyre::eyre!("PostgreSQL connection failed: {}", e))?;
    db::migrate(&db)
        .await
        .map_err(|e| eyre::eyre!("Migration failed: {}", e))?;

    let state = AppState::build(db.clone(), &config)?;
    seed_webhook_url(&state, config.seed_webhook_url.as_deref()).await;

    let shutdown = Shutdown::new();
    tokio::spawn(shutdown.clone().listen_for_signals());
    let pruner = tokio::spawn(prune_pending(
        state.pipeline.clone(),
        config.prune.interval,
        config.prune.max_age,
        shutdown.clone(),
    ));

    let addr = config.server.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(%addr, site = %config.site, "Mail alerts listening");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown.wait())
        .await?;

    // The server can also stop on its own; make sure the pruner follows
    shutdown.trigger();
    let _ = pruner.await;

    db.close()
        .await
        .map_err(|e| eyre::eyre!("Failed to close database: {}", e))?;
    info!("Shutdown complete");

    Ok(())
}

/// Store `MAIL_ALERTS_WEBHOOK_URL` when no webhook has been saved through the API yet.
async fn seed_webhook_url(state: &AppState, seed: Option<&str>) {
    let Some(seed) = seed else { return };

    match state.admin.webhook_url().await {
        Ok(Some(_)) => info!("Webhook URL already stored, ignoring MAIL_ALERTS_WEBHOOK_URL"),
        Ok(None) => match state.admin.save_webhook_url(seed).await {
            Ok(_) => info!("Webhook URL seeded from environment"),
            Err(e) => warn!(error = %e, "Ignoring invalid MAIL_ALERTS_WEBHOOK_URL"),
        },
        Err(e) => warn!(error = %e, "Could not read stored webhook URL"),
    }
}

/// Periodically drop correlation tickets whose send never reported an outcome.
async fn prune_pending(pipeline: Pipeline, every: Duration, max_age: Duration, shutdown: Shutdown) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    let stop = shutdown.wait();
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = &mut stop => break,
            _ = ticker.tick() => {
                let pruned = pipeline.prune_stale(max_age).await;
                if pruned > 0 {
                    warn!(pruned, "Dropped sends that never reported an outcome");
                }
            }
        }
    }
}
