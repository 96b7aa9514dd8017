//! In-memory collaborators shared across integration tests.
#![allow(dead_code)] // each test file uses a different subset

use alloy_primitives::{address, Address, B256};
use config::WatchedWallet;
use explorer::{ExplorerError, TransferSource};
use notify::{AlertSink, NotifyError};
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};
use transfer::{Asset, TransferKind, TransferRecord};
use watcher::{MonitorState, WatchSettings, Watcher};

pub const WALLET: Address = address!("857c67c421d3e94dac5abb0eaa4d34b26722b4fb");
pub const SECOND_WALLET: Address = address!("2222222222222222222222222222222222222222");
pub const COUNTERPARTY: Address = address!("1111111111111111111111111111111111111111");
pub const STRANGER: Address = address!("3333333333333333333333333333333333333333");
pub const USDC: Address = address!("a0b86991c6218b36c1d19d4a2e9eb0ce3606eb48");

/// Fixed "current time" for cycles.
pub const NOW: u64 = 1_700_000_000;

// ─────────────────────────────────────────────────────────────────────────────
// Transfer source
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SourceInner {
    transfers: Mutex<HashMap<(Address, TransferKind), Vec<TransferRecord>>>,
    failing: Mutex<HashSet<(Address, TransferKind)>>,
    head: Mutex<Option<u64>>,
    ignore_start_block: AtomicBool,
    delay: Mutex<Option<Duration>>,
    limit: Mutex<Option<usize>>,
    requests: Mutex<Vec<(Address, TransferKind, u64)>>,
}

/// Explorer stand-in serving canned transfers. Clones share state.
#[derive(Clone, Default)]
pub struct MockSource {
    inner: Arc<SourceInner>,
}

impl MockSource {
    pub fn push(&self, address: Address, record: TransferRecord) {
        self.inner
            .transfers
            .lock()
            .unwrap()
            .entry((address, record.kind))
            .or_default()
            .push(record);
    }

    pub fn fail(&self, address: Address, kind: TransferKind) {
        self.inner.failing.lock().unwrap().insert((address, kind));
    }

    pub fn recover(&self, address: Address, kind: TransferKind) {
        self.inner.failing.lock().unwrap().remove(&(address, kind));
    }

    pub fn set_head(&self, head: Option<u64>) {
        *self.inner.head.lock().unwrap() = head;
    }

    /// Return every stored record regardless of the requested start block.
    pub fn ignore_start_block(&self) {
        self.inner.ignore_start_block.store(true, Ordering::SeqCst);
    }

    pub fn set_delay(&self, delay: Duration) {
        *self.inner.delay.lock().unwrap() = Some(delay);
    }

    /// Cut every listing off after `limit` records, like the explorer does.
    pub fn set_limit(&self, limit: usize) {
        *self.inner.limit.lock().unwrap() = Some(limit);
    }

    /// `(address, kind, start_block)` of every transfer request so far.
    pub fn requests(&self) -> Vec<(Address, TransferKind, u64)> {
        self.inner.requests.lock().unwrap().clone()
    }
}

impl TransferSource for MockSource {
    async fn transfers(
        &self,
        address: Address,
        kind: TransferKind,
        start_block: u64,
    ) -> Result<Vec<TransferRecord>, ExplorerError> {
        let delay = *self.inner.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        self.inner
            .requests
            .lock()
            .unwrap()
            .push((address, kind, start_block));

        if self.inner.failing.lock().unwrap().contains(&(address, kind)) {
            return Err(ExplorerError::Api {
                message: "NOTOK".to_string(),
                result: "Max rate limit reached".to_string(),
            });
        }

        let ignore_start = self.inner.ignore_start_block.load(Ordering::SeqCst);
        let records = self
            .inner
            .transfers
            .lock()
            .unwrap()
            .get(&(address, kind))
            .cloned()
            .unwrap_or_default();

        let limit = self.listing_limit();
        Ok(records
            .into_iter()
            .filter(|record| ignore_start || record.block_number >= start_block)
            .take(limit)
            .collect())
    }

    fn listing_limit(&self) -> usize {
        self.inner
            .limit
            .lock()
            .unwrap()
            .unwrap_or(explorer::MAX_RECORDS)
    }

    async fn head_block(&self) -> Result<u64, ExplorerError> {
        let head = *self.inner.head.lock().unwrap();
        head.ok_or_else(|| ExplorerError::InvalidResult("head block unavailable".to_string()))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Alert sink
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct SinkInner {
    sent: Mutex<Vec<String>>,
    attempts: AtomicUsize,
    fail_next: AtomicUsize,
    fail_on: Mutex<HashSet<usize>>,
    reject_on: Mutex<HashSet<usize>>,
    fail_always: AtomicBool,
}

/// Records delivered alerts; can be told to reject sends. Clones share state.
#[derive(Clone, Default)]
pub struct MockSink {
    inner: Arc<SinkInner>,
}

impl MockSink {
    pub fn sent(&self) -> Vec<String> {
        self.inner.sent.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> usize {
        self.inner.attempts.load(Ordering::SeqCst)
    }

    /// Reject the next `count` sends.
    pub fn fail_next(&self, count: usize) {
        self.inner.fail_next.store(count, Ordering::SeqCst);
    }

    /// Reject the sends with these 1-based attempt numbers.
    pub fn fail_attempts(&self, attempts: &[usize]) {
        self.inner.fail_on.lock().unwrap().extend(attempts);
    }

    /// Answer these 1-based attempts with a 400 for unparseable entities.
    pub fn reject_attempts(&self, attempts: &[usize]) {
        self.inner.reject_on.lock().unwrap().extend(attempts);
    }

    pub fn fail_always(&self, fail: bool) {
        self.inner.fail_always.store(fail, Ordering::SeqCst);
    }
}

impl AlertSink for MockSink {
    async fn send_alert(&self, text: &str) -> Result<(), NotifyError> {
        let attempt = self.inner.attempts.fetch_add(1, Ordering::SeqCst) + 1;

        let scheduled = self
            .inner
            .fail_next
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if self.inner.reject_on.lock().unwrap().contains(&attempt) {
            return Err(NotifyError::Api {
                code: 400,
                description: "Bad Request: can't parse entities: Can't find end of the entity starting at byte offset 61".to_string(),
            });
        }

        let targeted = self.inner.fail_on.lock().unwrap().contains(&attempt);
        if scheduled || targeted || self.inner.fail_always.load(Ordering::SeqCst) {
            return Err(NotifyError::Api {
                code: 429,
                description: "Too Many Requests: retry after 5".to_string(),
            });
        }

        self.inner.sent.lock().unwrap().push(text.to_string());
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builders
// ─────────────────────────────────────────────────────────────────────────────

pub fn wallet(name: &str, address: Address) -> WatchedWallet {
    WatchedWallet {
        name: name.to_string(),
        address,
    }
}

fn tx_hash(block: u64, salt: u8) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[23..31].copy_from_slice(&block.to_be_bytes());
    bytes[31] = salt;
    B256::from(bytes)
}

pub fn native(block: u64, timestamp: u64, from: Address, to: Address, wei: &str) -> TransferRecord {
    TransferRecord {
        kind: TransferKind::Native,
        block_number: block,
        timestamp,
        tx_hash: tx_hash(block, 0),
        from: Some(from),
        to: Some(to),
        raw_amount: wei.to_string(),
        asset: Asset::Native,
    }
}

pub fn usdc(block: u64, salt: u8, timestamp: u64, from: Address, to: Address, raw: &str) -> TransferRecord {
    TransferRecord {
        kind: TransferKind::Token,
        block_number: block,
        timestamp,
        tx_hash: tx_hash(block, salt),
        from: Some(from),
        to: Some(to),
        raw_amount: raw.to_string(),
        asset: Asset::Token {
            symbol: "USDC".to_string(),
            decimals: 6,
            contract: Some(USDC),
        },
    }
}

/// Watcher over mock collaborators with the given settings.
pub fn build_watcher(
    source: &MockSource,
    sink: &MockSink,
    wallets: Vec<WatchedWallet>,
    settings: WatchSettings,
) -> Watcher<MockSource, MockSink> {
    Watcher::new(
        source.clone(),
        sink.clone(),
        wallets,
        settings,
        Arc::new(MonitorState::new()),
    )
}

/// Watcher over one wallet named "Treasury" with default settings.
pub fn treasury_watcher(source: &MockSource, sink: &MockSink) -> Watcher<MockSource, MockSink> {
    build_watcher(
        source,
        sink,
        vec![wallet("Treasury", WALLET)],
        WatchSettings::default(),
    )
}
