use anyhow::{anyhow, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::sync::Notify;

use dashhub::{
    arguments::Cli,
    config::{self, Config},
    logger::{self, LogTag},
    webserver::{self, AppState},
};

/// Main entry point for dashhub
///
/// - loads configuration (file, then command-line overrides)
/// - builds the hub, rate limiter, cache and metrics collector
/// - starts the sweepers and the webserver
/// - on Ctrl+C: stops the hub (closing websocket clients), the server, then the sweepers
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init();

    let config = load_config(&cli)?;
    logger::info(
        LogTag::System,
        &format!(
            "dashhub {} starting (rate limit: {}, {} req/min)",
            env!("CARGO_PKG_VERSION"),
            if config.rate_limit.enabled { "on" } else { "off" },
            config.rate_limit.requests_per_minute
        ),
    );

    let state = AppState::from_config(&config);
    let cache_sweeper = state.cache.spawn_sweeper();
    let limiter_sweeper = state
        .limiter
        .spawn_sweeper(config.rate_limit.sweep_interval());

    // =========================================================================
    // SIGNALS
    // =========================================================================

    let ctrl_c = Arc::new(Notify::new());
    {
        let ctrl_c = ctrl_c.clone();
        ctrlc::set_handler(move || {
            println!("\nReceived Ctrl+C, shutting down...");
            ctrl_c.notify_one();
        })
        .context("failed to install Ctrl+C handler")?;
    }

    // =========================================================================
    // WEBSERVER
    // =========================================================================

    let server_shutdown = Arc::new(Notify::new());
    let mut server = tokio::spawn(webserver::start_server(
        state.clone(),
        server_shutdown.clone(),
    ));

    let server_result = tokio::select! {
        _ = ctrl_c.notified() => None,
        result = &mut server => Some(result),
    };

    // =========================================================================
    // SHUTDOWN
    // =========================================================================

    state.hub.stop().await;

    let server_result = match server_result {
        Some(result) => result,
        None => {
            server_shutdown.notify_one();
            server.await
        }
    };

    cache_sweeper.stop().await;
    limiter_sweeper.stop().await;

    match server_result {
        Ok(Ok(())) => {
            logger::info(LogTag::System, "dashhub stopped");
            Ok(())
        }
        Ok(Err(e)) => {
            logger::error(LogTag::Webserver, &e);
            Err(anyhow!(e))
        }
        Err(e) => Err(anyhow!("webserver task failed: {}", e)),
    }
}

/// Read the config file, apply command-line overrides and publish it globally
fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = config::read_config_file(&cli.config)
        .with_context(|| format!("loading {}", cli.config))?;

    if let Some(host) = &cli.host {
        config.webserver.host = host.clone();
    }
    if let Some(port) = cli.port {
        config.webserver.port = port;
    }
    if let Some(rpm) = cli.rate_limit_rpm {
        config.rate_limit.requests_per_minute = rpm;
    }

    config::init_config(config.clone())?;
    Ok(config)
}
