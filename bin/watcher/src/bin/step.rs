//! CLI tool to run individual watcher steps by hand.
//!
//! - `cycle`: run one polling cycle over all configured wallets
//! - `fetch`: print the parsed transfers the explorer returns for an address
//! - `balances`: print the balance summary for an address
//! - `send-test`: send a test message to the configured chat

use alloy_primitives::Address;
use balance::{monitor::BalanceMonitor, BalanceReporter};
use clap::{Parser, Subcommand, ValueEnum};
use config::WatchConfig;
use explorer::{ExplorerClient, TransferSource};
use eyre::eyre;
use notify::{AlertSink, NotifyError, TelegramBot, TelegramSink};
use std::{path::PathBuf, sync::Arc, time::Duration};
use tracing::info;
use transfer::{format_amount, TransferKind};
use watcher::{BalanceBackend, MonitorState, WatchSettings, Watcher};

#[derive(Parser)]
#[command(name = "step")]
#[command(about = "Run individual watcher steps for testing")]
struct Cli {
    /// Path to the watch file
    #[arg(short, long, default_value = "watcher.toml")]
    config: PathBuf,

    /// Etherscan API key
    #[arg(long = "etherscan-api-key", env = "ETHERSCAN_API", hide_env_values = true)]
    etherscan_api_key: String,

    /// Telegram bot token, needed for anything that sends
    #[arg(long, env = "BOT_TOKEN", hide_env_values = true)]
    bot_token: Option<String>,

    /// Chat receiving alerts
    #[arg(long, env = "CHAT_ID")]
    chat_id: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one polling cycle over all configured wallets
    Cycle {
        /// Print alerts instead of sending them
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the transfers the explorer returns for an address
    Fetch {
        address: Address,

        #[arg(long, value_enum, default_value_t = KindArg::Native)]
        kind: KindArg,

        /// First block to include
        #[arg(long, default_value_t = 0)]
        from_block: u64,
    },

    /// Print the balance summary for an address
    Balances { address: Address },

    /// Send a test message to the configured chat
    SendTest,
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Native,
    Token,
}

impl From<KindArg> for TransferKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Native => Self::Native,
            KindArg::Token => Self::Token,
        }
    }
}

/// Writes alerts to stdout.
struct PrintSink;

impl AlertSink for PrintSink {
    async fn send_alert(&self, text: &str) -> Result<(), NotifyError> {
        println!("{text}\n");
        Ok(())
    }
}

impl Cli {
    fn sink(&self, http: reqwest::Client) -> eyre::Result<TelegramSink> {
        let token = self
            .bot_token
            .clone()
            .ok_or_else(|| eyre!("BOT_TOKEN is required to send messages"))?;
        let chat_id = self
            .chat_id
            .clone()
            .ok_or_else(|| eyre!("CHAT_ID is required to send messages"))?;
        Ok(TelegramSink::new(TelegramBot::new(http, token), chat_id))
    }
}

async fn run_cycle<D: AlertSink>(config: &WatchConfig, explorer: ExplorerClient, sink: D) {
    let watcher = Watcher::new(
        explorer,
        sink,
        config.wallets.clone(),
        WatchSettings::from_config(config),
        Arc::new(MonitorState::new()),
    );
    let report = watcher.run_cycle().await;

    info!(
        fetched = report.fetched,
        alerts_sent = report.alerts_sent,
        suppressed = report.suppressed,
        malformed = report.malformed,
        fetch_failures = report.fetch_failures,
        dispatch_failures = report.dispatch_failures,
        "Cycle report"
    );
    for (key, block) in watcher.lanes().await {
        info!(address = %key.address, kind = %key.kind, block, "Cursor");
    }
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    watcher::init_tracing(false);

    let cli = Cli::parse();
    let config = WatchConfig::from_file(&cli.config)?;
    let network = config.network_config();

    info!("Loaded config:");
    info!("  Network: {:?}", network.network_type);
    info!("  Explorer: {}", network.explorer.api_url);
    info!("  Wallets: {}", config.wallets.len());

    let timeout = Duration::from_secs(config.fetch_timeout_secs);
    let http = client::create_http_client(timeout)?;
    let explorer = ExplorerClient::new(
        http.clone(),
        network.explorer.clone(),
        cli.etherscan_api_key.clone(),
    );

    match &cli.command {
        Command::Cycle { dry_run } => {
            info!("Running: cycle");

            if *dry_run {
                info!("  Mode: DRY-RUN (alerts are printed, not sent)");
                run_cycle(&config, explorer, PrintSink).await;
            } else {
                run_cycle(&config, explorer, cli.sink(http)?).await;
            }

            info!("Step completed: cycle");
        }
        Command::Fetch {
            address,
            kind,
            from_block,
        } => {
            info!("Running: fetch");

            let records = explorer
                .transfers(*address, (*kind).into(), *from_block)
                .await?;
            for record in &records {
                let amount = format_amount(&record.raw_amount, record.asset.decimals())
                    .unwrap_or_else(|_| record.raw_amount.clone());
                println!(
                    "{} {:#x} {:?} -> {:?} {} {}",
                    record.block_number,
                    record.tx_hash,
                    record.from,
                    record.to,
                    amount,
                    record.asset.symbol(&network.explorer.native_symbol),
                );
            }

            info!(count = records.len(), "Step completed: fetch");
        }
        Command::Balances { address } => {
            info!("Running: balances");

            let backend = match &config.rpc_url {
                Some(url) => BalanceBackend::Rpc(BalanceMonitor::new(
                    client::create_provider(url)?,
                    timeout,
                )),
                None => BalanceBackend::Explorer(explorer),
            };
            let reporter = BalanceReporter::new(
                backend,
                network.explorer.native_symbol.clone(),
                config.tokens.clone(),
            );
            println!("{}", reporter.render(*address).await?);

            info!("Step completed: balances");
        }
        Command::SendTest => {
            info!("Running: send-test");

            cli.sink(http)?
                .send_alert("✅ Wallet watcher test message")
                .await?;

            info!("Step completed: send-test");
        }
    }

    Ok(())
}
