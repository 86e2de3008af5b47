//! tama - an asynchronous IRC bot.

use std::time::Duration;

use anyhow::Context;
use tama::bot::{Bot, BotHandle, ExitStatus};
use tama::config::Config;
use tama::{plugins, telemetry};
use tracing::{error, info, warn};

/// Pause between a reload request and the restart.
const RELOAD_DELAY: Duration = Duration::from_secs(5);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let mut logging_ready = false;
    loop {
        let config = Config::load(&config_path)
            .with_context(|| format!("failed to load config from {}", config_path))?;

        if !logging_ready {
            telemetry::init(&config.logging).context("failed to initialise logging")?;
            logging_ready = true;
        }
        info!(
            path = %config_path,
            servers = config.server.len(),
            version = env!("CARGO_PKG_VERSION"),
            "starting tama"
        );

        let plugins = plugins::builtin(&config).context("failed to load plugins")?;
        let bot = Bot::new(&config, &plugins).context("failed to build action table")?;

        let signals = tokio::spawn(shutdown_on_signal(bot.handle().clone()));
        let status = bot.run().await;
        signals.abort();

        match status {
            ExitStatus::Quit => {
                info!("goodbye");
                return Ok(());
            }
            ExitStatus::Reload => {
                info!(delay_secs = RELOAD_DELAY.as_secs(), "reloading");
                tokio::time::sleep(RELOAD_DELAY).await;
            }
        }
    }
}

/// Ask the bot to quit on Ctrl-C or SIGTERM.
async fn shutdown_on_signal(bot: BotHandle) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => warn!("interrupted"),
        () = terminate => warn!("terminated"),
    }
    bot.shutdown("Shutting down");
}
