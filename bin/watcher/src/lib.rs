pub mod config;
pub mod control;
pub mod metrics;
pub mod server;

use crate::metrics::Metrics;
use alloy_primitives::Address;
use alloy_provider::Provider;
use balance::{monitor::BalanceMonitor, Balance, BalanceQuery, Monitor, NoBalances, Report};
use ::config::{ExplorerConfig, WatchConfig, WatchedWallet};
use explorer::{ExplorerClient, TransferSource};
use notify::AlertSink;
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::{Instant, SystemTime, UNIX_EPOCH},
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use transfer::{
    AdvancePolicy, Admission, AlertTemplate, Classification, Classifier, CursorBook, CursorKey,
    NeitherPolicy, SkipReason, TransferKind, TransferRecord, Verdict, WindowPolicy,
};

/// Initialise the global tracing subscriber. `RUST_LOG` overrides the
/// default `info` filter.
pub fn init_tracing(json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Process-wide monitoring switch shared by the poll loop and the command
/// handler.
#[derive(Debug)]
pub struct MonitorState {
    active: AtomicBool,
}

impl Default for MonitorState {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitorState {
    /// Monitoring starts active.
    pub const fn new() -> Self {
        Self {
            active: AtomicBool::new(true),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Set the flag and return its previous value.
    pub fn set_active(&self, active: bool) -> bool {
        self.active.swap(active, Ordering::SeqCst)
    }
}

/// Behaviour knobs for the polling cycle.
#[derive(Debug, Clone)]
pub struct WatchSettings {
    pub template: AlertTemplate,
    pub neither_policy: NeitherPolicy,
    pub window_policy: WindowPolicy,
    pub advance_policy: AdvancePolicy,
    /// Lookback window in seconds, `None` to disable
    pub lookback: Option<u64>,
    /// Seed fresh lanes at the chain head instead of replaying history
    pub skip_history: bool,
}

impl Default for WatchSettings {
    fn default() -> Self {
        Self::for_explorer(&ExplorerConfig::mainnet())
    }
}

impl WatchSettings {
    fn for_explorer(explorer: &ExplorerConfig) -> Self {
        Self {
            template: AlertTemplate::new(explorer.tx_url_base.clone(), explorer.native_symbol.clone()),
            neither_policy: NeitherPolicy::default(),
            window_policy: WindowPolicy::default(),
            advance_policy: AdvancePolicy::default(),
            lookback: Some(3600),
            skip_history: false,
        }
    }

    pub fn from_config(config: &WatchConfig) -> Self {
        let network = config.network_config();
        Self {
            neither_policy: config.neither_policy,
            window_policy: config.window_policy,
            advance_policy: config.advance_policy,
            lookback: config.lookback(),
            skip_history: config.skip_history,
            ..Self::for_explorer(&network.explorer)
        }
    }
}

/// Outcome of one polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Monitoring was paused; nothing ran
    pub skipped_inactive: bool,
    /// A previous cycle still held the cursors; nothing ran
    pub skipped_busy: bool,
    /// Records returned by the explorer
    pub fetched: usize,
    pub alerts_sent: usize,
    /// Records not alerted: duplicates, outside the window, unrelated or malformed
    pub suppressed: usize,
    pub malformed: usize,
    pub fetch_failures: usize,
    pub dispatch_failures: usize,
}

impl CycleReport {
    pub const fn ran(&self) -> bool {
        !self.skipped_inactive && !self.skipped_busy
    }
}

/// Result of handling one lane.
enum LaneOutcome {
    Done,
    /// Stopped at a failed dispatch; the cursor stays below the failed block.
    Halted,
}

/// Current unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Polling cycle orchestrator.
///
/// Per cycle and per wallet it fetches native then token transfers, filters
/// them through the classifier and the wallet's cursor lanes, and sends one
/// alert per fresh transfer in ascending block order.
pub struct Watcher<S, D, B = NoBalances> {
    source: S,
    sink: D,
    balances: B,
    wallets: Vec<WatchedWallet>,
    settings: WatchSettings,
    classifier: Classifier,
    state: Arc<MonitorState>,
    cursors: Mutex<CursorBook>,
    metrics: Metrics,
}

impl<S, D> Watcher<S, D>
where
    S: TransferSource,
    D: AlertSink,
{
    pub fn new(
        source: S,
        sink: D,
        wallets: Vec<WatchedWallet>,
        settings: WatchSettings,
        state: Arc<MonitorState>,
    ) -> Self {
        let cursors = CursorBook::new(settings.lookback, settings.window_policy);
        Self {
            source,
            sink,
            balances: NoBalances,
            wallets,
            classifier: Classifier::new(settings.neither_policy),
            settings,
            state,
            cursors: Mutex::new(cursors),
            metrics: Metrics::new(),
        }
    }
}

impl<S, D, B> Watcher<S, D, B>
where
    S: TransferSource,
    D: AlertSink,
    B: Report,
{
    /// Append balance summaries produced by `balances` to every alert.
    pub fn with_balances<R: Report>(self, balances: R) -> Watcher<S, D, R> {
        Watcher {
            source: self.source,
            sink: self.sink,
            balances,
            wallets: self.wallets,
            settings: self.settings,
            classifier: self.classifier,
            state: self.state,
            cursors: self.cursors,
            metrics: self.metrics,
        }
    }

    pub const fn state(&self) -> &Arc<MonitorState> {
        &self.state
    }

    pub fn wallets(&self) -> &[WatchedWallet] {
        &self.wallets
    }

    /// Last handled block of a lane, `None` if it was never observed.
    pub async fn last_seen(&self, address: Address, kind: TransferKind) -> Option<u64> {
        let key = CursorKey::new(address, kind);
        let cursors = self.cursors.lock().await;
        cursors.contains(key).then(|| cursors.last_seen(key))
    }

    /// Snapshot of all cursor lanes.
    pub async fn lanes(&self) -> Vec<(CursorKey, u64)> {
        self.cursors.lock().await.lanes()
    }

    /// Run one cycle against the wall clock.
    pub async fn run_cycle(&self) -> CycleReport {
        self.run_cycle_at(unix_now()).await
    }

    /// Run one cycle with `now` as the current unix time.
    pub async fn run_cycle_at(&self, now: u64) -> CycleReport {
        if !self.state.is_active() {
            debug!("Monitoring paused, skipping cycle");
            self.metrics.record_cycle_skipped("inactive");
            return CycleReport {
                skipped_inactive: true,
                ..Default::default()
            };
        }

        let Ok(mut cursors) = self.cursors.try_lock() else {
            warn!("Previous cycle still running, skipping");
            self.metrics.record_cycle_skipped("busy");
            return CycleReport {
                skipped_busy: true,
                ..Default::default()
            };
        };

        let started = Instant::now();
        let mut report = CycleReport::default();

        for wallet in &self.wallets {
            for kind in TransferKind::ALL {
                let key = CursorKey::new(wallet.address, kind);
                let outcome = self
                    .process_lane(&mut cursors, wallet, key, now, &mut report)
                    .await;
                if let LaneOutcome::Halted = outcome {
                    debug!(wallet = %wallet.name, kind = %kind, "Lane halted at a failed alert, retrying next cycle");
                }
                if cursors.contains(key) {
                    self.metrics
                        .set_cursor(&wallet.name, kind, cursors.last_seen(key));
                }
            }
        }

        self.metrics.record_cycle(started.elapsed());
        info!(
            wallets = self.wallets.len(),
            fetched = report.fetched,
            alerts_sent = report.alerts_sent,
            suppressed = report.suppressed,
            fetch_failures = report.fetch_failures,
            dispatch_failures = report.dispatch_failures,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Cycle complete"
        );

        report
    }

    /// Fetch, filter and alert one `(wallet, kind)` lane.
    async fn process_lane(
        &self,
        cursors: &mut CursorBook,
        wallet: &WatchedWallet,
        key: CursorKey,
        now: u64,
        report: &mut CycleReport,
    ) -> LaneOutcome {
        if self.settings.skip_history && !cursors.contains(key) {
            match self.source.head_block().await {
                Ok(head) => {
                    info!(wallet = %wallet.name, kind = %key.kind, head, "Seeding cursor at chain head");
                    cursors.seed(key, head);
                }
                Err(e) => {
                    warn!(wallet = %wallet.name, kind = %key.kind, error = %e, "Head block lookup failed, skipping lane");
                    report.fetch_failures += 1;
                    self.metrics.record_fetch_failure(key.kind);
                    return LaneOutcome::Done;
                }
            }
        }

        let floor = cursors.last_seen(key);
        let start_block = if cursors.contains(key) {
            floor.saturating_add(1)
        } else {
            0
        };

        let mut records = match self.source.transfers(key.address, key.kind, start_block).await {
            Ok(records) => records,
            Err(e) => {
                warn!(
                    wallet = %wallet.name,
                    kind = %key.kind,
                    start_block,
                    error = %e,
                    "Transfer fetch failed"
                );
                report.fetch_failures += 1;
                self.metrics.record_fetch_failure(key.kind);
                return LaneOutcome::Done;
            }
        };
        cursors.seed(key, floor);

        debug!(wallet = %wallet.name, kind = %key.kind, start_block, count = records.len(), "Fetched transfers");
        report.fetched += records.len();
        self.metrics.record_fetched(key.kind, records.len());

        records.sort_by_key(|record| record.block_number);

        // A full listing may stop inside its last block. Leave that block for
        // the next fetch so none of its transfers are stepped over.
        if !records.is_empty() && records.len() >= self.source.listing_limit() {
            let first = records.first().map(|record| record.block_number);
            let last = records.last().map(|record| record.block_number);
            if first != last {
                records.retain(|record| Some(record.block_number) != last);
                warn!(
                    wallet = %wallet.name,
                    kind = %key.kind,
                    deferred_block = last,
                    kept = records.len(),
                    "Listing hit the explorer limit, deferring its last block"
                );
            } else {
                warn!(
                    wallet = %wallet.name,
                    kind = %key.kind,
                    block = first,
                    "Listing limit filled by a single block, later transfers in it are lost"
                );
            }
        }

        for group in records.chunk_by(|a, b| a.block_number == b.block_number) {
            let block = group[0].block_number;
            let mut moves_cursor = false;

            for record in group {
                let classification = match self.classifier.classify(record, wallet.address) {
                    Verdict::Alert(classification) => classification,
                    Verdict::Skip(reason) => {
                        if reason == SkipReason::Malformed {
                            warn!(wallet = %wallet.name, tx = %record.tx_hash, "Skipping transfer with missing counterparty");
                            report.malformed += 1;
                            self.metrics.record_malformed(key.kind);
                        }
                        report.suppressed += 1;
                        continue;
                    }
                };

                // Judged against the lane as it stood before this batch so
                // records sharing a block are all seen.
                let admission = Admission::judge(
                    floor,
                    record.block_number,
                    record.timestamp,
                    now,
                    cursors.lookback(),
                );
                if admission.advances(cursors.policy()) {
                    moves_cursor = true;
                }
                if admission != Admission::Fresh {
                    if admission == Admission::OutsideWindow {
                        debug!(wallet = %wallet.name, tx = %record.tx_hash, block, "Transfer outside lookback window");
                    }
                    report.suppressed += 1;
                    continue;
                }

                if self.settings.advance_policy == AdvancePolicy::OnAdmit {
                    cursors.advance(key, block);
                }

                match self.dispatch(wallet, &classification, record).await {
                    Ok(true) => {
                        report.alerts_sent += 1;
                        self.metrics.record_alert_sent(key.kind);
                    }
                    Ok(false) => {
                        report.malformed += 1;
                        self.metrics.record_malformed(key.kind);
                    }
                    Err(e) if e.is_rejected_message() => {
                        warn!(
                            wallet = %wallet.name,
                            tx = %record.tx_hash,
                            block,
                            error = %e,
                            "Alert rejected by the bot API, skipping transfer"
                        );
                        report.malformed += 1;
                        self.metrics.record_malformed(key.kind);
                    }
                    Err(e) => {
                        warn!(
                            wallet = %wallet.name,
                            tx = %record.tx_hash,
                            block,
                            error = %e,
                            "Alert dispatch failed"
                        );
                        report.dispatch_failures += 1;
                        self.metrics.record_dispatch_failure();
                        if self.settings.advance_policy == AdvancePolicy::AfterDispatch {
                            return LaneOutcome::Halted;
                        }
                    }
                }
            }

            if moves_cursor {
                cursors.advance(key, block);
            }
        }

        LaneOutcome::Done
    }

    /// Render and send one alert. `Ok(false)` when the record cannot be
    /// rendered; such a record is treated as handled.
    async fn dispatch(
        &self,
        wallet: &WatchedWallet,
        classification: &Classification,
        record: &TransferRecord,
    ) -> Result<bool, notify::NotifyError> {
        let summary = match self.balances.summarize(wallet.address).await {
            Ok(summary) => summary,
            Err(e) => {
                warn!(wallet = %wallet.name, error = %e, "Balance summary failed, sending alert without it");
                None
            }
        };

        let text = match self.settings.template.render(
            classification,
            record,
            &wallet.name,
            summary.as_deref(),
        ) {
            Ok(text) => text,
            Err(e) => {
                warn!(wallet = %wallet.name, tx = %record.tx_hash, error = %e, "Cannot render transfer amount");
                return Ok(false);
            }
        };

        self.sink.send_alert(&text).await?;
        info!(
            wallet = %wallet.name,
            kind = %record.kind,
            direction = ?classification.direction,
            block = record.block_number,
            tx = %record.tx_hash,
            "Alert sent"
        );
        Ok(true)
    }
}

/// Balance backend chosen at startup: an RPC node when configured, else the
/// explorer.
pub enum BalanceBackend<P> {
    Rpc(BalanceMonitor<P>),
    Explorer(ExplorerClient),
}

impl<P> Monitor for BalanceBackend<P>
where
    P: Provider + Clone,
{
    async fn query_balance(&self, query: BalanceQuery) -> eyre::Result<Balance> {
        match self {
            Self::Rpc(monitor) => monitor.query_balance(query).await,
            Self::Explorer(explorer) => explorer.query_balance(query).await,
        }
    }
}
