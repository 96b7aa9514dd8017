use balance::{monitor::BalanceMonitor, BalanceReporter};
use clap::Parser;
use config::{CommandTransport, ConfigError};
use explorer::ExplorerClient;
use notify::{webhook_channel, LongPollChannel, TelegramBot, TelegramSink};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tokio::time::{self, MissedTickBehavior};
use tracing::{error, info, warn};
use watcher::{
    config::{Config, Secrets},
    control::{run_commands, Controller},
    metrics::install_prometheus_exporter,
    server::{self, WebhookState},
    BalanceBackend, MonitorState, WatchSettings, Watcher,
};

/// Buffered webhook updates awaiting the command handler.
const WEBHOOK_QUEUE: usize = 64;

#[derive(Parser)]
#[command(name = "watcher")]
#[command(about = "Watch wallets on an Etherscan-compatible explorer and alert on Telegram")]
struct Cli {
    /// Path to the watch file
    #[arg(short, long, default_value = "watcher.toml")]
    config: PathBuf,

    /// HTTP port, overrides `port` in the watch file
    #[arg(long, env = "PORT")]
    port: Option<u16>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,

    #[command(flatten)]
    secrets: Secrets,
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let cli = Cli::parse();
    watcher::init_tracing(cli.log_json);

    info!("Starting wallet watcher");
    info!(path = %cli.config.display(), "Loading config");

    let config = Config::load(&cli.config, cli.secrets)?.with_port(cli.port);
    let network = config.watch.network_config();

    info!("Loaded config:");
    info!("  Network: {:?} (chain {})", network.network_type, network.explorer.chain_id);
    info!("  Explorer: {}", network.explorer.api_url);
    info!("  Wallets: {}", config.watch.wallets.len());
    info!("  Poll interval: {}s", config.watch.poll_interval_secs);
    info!("  Lookback: {:?}", config.watch.lookback());
    info!("  Commands: {:?}", config.watch.command_transport);

    if let Some(port) = config.watch.metrics_port {
        install_prometheus_exporter(port)?;
        info!(port, "Prometheus exporter installed");
    }

    let timeout = Duration::from_secs(config.watch.fetch_timeout_secs);
    let http = client::create_http_client(timeout)?;

    let explorer = ExplorerClient::new(
        http.clone(),
        network.explorer.clone(),
        config.secrets.etherscan_api_key.clone(),
    );
    let bot = TelegramBot::new(http, config.secrets.bot_token.clone());
    let sink = TelegramSink::new(bot.clone(), config.secrets.chat_id.clone());

    let balances = if config.watch.include_balances {
        let backend = match &config.watch.rpc_url {
            Some(url) => {
                info!("Balance summaries from RPC");
                let provider = client::create_provider(url)?;
                BalanceBackend::Rpc(BalanceMonitor::new(provider, timeout))
            }
            None => {
                info!("Balance summaries from the explorer");
                BalanceBackend::Explorer(explorer.clone())
            }
        };
        Some(BalanceReporter::new(
            backend,
            network.explorer.native_symbol.clone(),
            config.watch.tokens.clone(),
        ))
    } else {
        None
    };

    let state = Arc::new(MonitorState::new());
    let watcher = Arc::new(
        Watcher::new(
            explorer,
            sink,
            config.watch.wallets.clone(),
            WatchSettings::from_config(&config.watch),
            Arc::clone(&state),
        )
        .with_balances(balances),
    );

    // Command transport
    let controller = Controller::new(Arc::clone(&state), config.secrets.chat_id.clone());
    let webhook = match config.watch.command_transport {
        CommandTransport::LongPoll => {
            if let Err(e) = bot.delete_webhook().await {
                warn!(error = %e, "Failed to clear webhook before long polling");
            }
            tokio::spawn(run_commands(controller, LongPollChannel::new(bot.clone()), bot));
            None
        }
        CommandTransport::Webhook => {
            let url = config
                .watch
                .webhook_url
                .as_deref()
                .ok_or(ConfigError::Missing("webhook_url"))?;
            let secret = config.webhook_secret().map(str::to_string);

            bot.set_webhook(url, secret.as_deref()).await?;
            info!(%url, "Webhook registered");

            let (sender, channel) = webhook_channel(WEBHOOK_QUEUE);
            tokio::spawn(run_commands(controller, channel, bot));
            Some(WebhookState::new(sender, secret))
        }
    };

    let port = config.watch.port;
    let router = server::router(webhook);
    tokio::spawn(async move {
        if let Err(e) = server::serve(port, router).await {
            error!(error = %e, "HTTP server stopped");
        }
    });

    info!("Starting monitoring loop...");

    let mut interval = time::interval(Duration::from_secs(config.watch.poll_interval_secs));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let watcher = Arc::clone(&watcher);
                tokio::spawn(async move {
                    watcher.run_cycle().await;
                });
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}
