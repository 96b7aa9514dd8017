//! Checkpoint cursors deciding which transfers are new.
//!
//! Each watched wallet has one lane per [`TransferKind`]. A lane stores the
//! highest block already handled; anything at or below it is a duplicate.
//! Lanes only ever move forward and live for the process lifetime.

use crate::types::TransferKind;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Identifies one cursor lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CursorKey {
    pub address: Address,
    pub kind: TransferKind,
}

impl CursorKey {
    pub const fn new(address: Address, kind: TransferKind) -> Self {
        Self { address, kind }
    }
}

/// Whether records that are new by block but older than the lookback window
/// still move the cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowPolicy {
    /// Advance on block order; the window only suppresses the alert.
    #[default]
    BlockGated,
    /// Records outside the window leave the cursor untouched.
    TimeGated,
}

/// When a fresh record moves the cursor relative to sending its alert.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvancePolicy {
    /// Only after the block's alerts were all delivered. A failed send is
    /// retried next cycle.
    #[default]
    AfterDispatch,
    /// As soon as the record is admitted. A failed send is lost.
    OnAdmit,
}

/// Outcome of checking one record against a lane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// At or below the lane's block.
    Duplicate,
    /// New by block, but older than the lookback window.
    OutsideWindow,
    /// New and recent enough to alert.
    Fresh,
}

impl Admission {
    /// Judge a record against an explicit floor block.
    ///
    /// `lookback` of `None` disables the time window.
    pub const fn judge(
        floor: u64,
        block_number: u64,
        timestamp: u64,
        now: u64,
        lookback: Option<u64>,
    ) -> Self {
        if block_number <= floor {
            return Self::Duplicate;
        }
        if let Some(window) = lookback {
            if timestamp < now.saturating_sub(window) {
                return Self::OutsideWindow;
            }
        }
        Self::Fresh
    }

    /// Whether this admission moves the cursor under `policy`.
    pub const fn advances(&self, policy: WindowPolicy) -> bool {
        match self {
            Self::Duplicate => false,
            Self::Fresh => true,
            Self::OutsideWindow => matches!(policy, WindowPolicy::BlockGated),
        }
    }
}

/// In-memory cursor lanes for all watched wallets.
#[derive(Debug, Clone, Default)]
pub struct CursorBook {
    lanes: HashMap<CursorKey, u64>,
    lookback: Option<u64>,
    policy: WindowPolicy,
}

impl CursorBook {
    /// Create an empty book. `lookback` is the window in seconds, `None` to
    /// alert on any new block regardless of age.
    pub fn new(lookback: Option<u64>, policy: WindowPolicy) -> Self {
        Self {
            lanes: HashMap::new(),
            lookback,
            policy,
        }
    }

    pub const fn lookback(&self) -> Option<u64> {
        self.lookback
    }

    pub const fn policy(&self) -> WindowPolicy {
        self.policy
    }

    /// Last handled block for the lane, 0 if never observed.
    pub fn last_seen(&self, key: CursorKey) -> u64 {
        self.lanes.get(&key).copied().unwrap_or(0)
    }

    /// Whether the lane has been observed yet.
    pub fn contains(&self, key: CursorKey) -> bool {
        self.lanes.contains_key(&key)
    }

    /// Initialise a lane on first observation. Has no effect on a lane that
    /// already exists.
    pub fn seed(&mut self, key: CursorKey, block_number: u64) {
        self.lanes.entry(key).or_insert(block_number);
    }

    /// Move the lane forward to `block_number`, never backward. Returns the
    /// lane's block after the call.
    pub fn advance(&mut self, key: CursorKey, block_number: u64) -> u64 {
        let lane = self.lanes.entry(key).or_insert(0);
        *lane = (*lane).max(block_number);
        *lane
    }

    /// Check a record against the lane without changing it.
    pub fn evaluate(&self, key: CursorKey, block_number: u64, timestamp: u64, now: u64) -> Admission {
        Admission::judge(self.last_seen(key), block_number, timestamp, now, self.lookback)
    }

    /// Check a record and advance the lane as the window policy dictates.
    ///
    /// Returns true when the record should be alerted.
    pub fn admit(&mut self, key: CursorKey, block_number: u64, timestamp: u64, now: u64) -> bool {
        let admission = self.evaluate(key, block_number, timestamp, now);
        if admission.advances(self.policy) {
            self.advance(key, block_number);
        }
        admission == Admission::Fresh
    }

    /// Snapshot of all lanes, ordered for stable display.
    pub fn lanes(&self) -> Vec<(CursorKey, u64)> {
        let mut lanes: Vec<_> = self.lanes.iter().map(|(k, v)| (*k, *v)).collect();
        lanes.sort_by_key(|(k, _)| (k.address, k.kind));
        lanes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::address;

    const WALLET: Address = address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa");

    fn key() -> CursorKey {
        CursorKey::new(WALLET, TransferKind::Native)
    }

    #[test]
    fn test_fresh_lane_starts_at_zero() {
        let book = CursorBook::default();
        assert_eq!(book.last_seen(key()), 0);
        assert!(!book.contains(key()));
    }

    #[test]
    fn test_admit_rejects_at_or_below_cursor() {
        let mut book = CursorBook::new(None, WindowPolicy::BlockGated);
        book.seed(key(), 100);

        assert!(!book.admit(key(), 99, 0, 0));
        assert!(!book.admit(key(), 100, 0, 0));
        assert_eq!(book.last_seen(key()), 100);

        assert!(book.admit(key(), 101, 0, 0));
        assert_eq!(book.last_seen(key()), 101);

        // Same block again is a duplicate.
        assert!(!book.admit(key(), 101, 0, 0));
    }

    #[test]
    fn test_block_gated_advances_outside_window() {
        let now = 1_700_000_000;
        let mut book = CursorBook::new(Some(3600), WindowPolicy::BlockGated);

        assert!(!book.admit(key(), 150, now - 7200, now));
        assert_eq!(book.last_seen(key()), 150);
    }

    #[test]
    fn test_time_gated_keeps_cursor_outside_window() {
        let now = 1_700_000_000;
        let mut book = CursorBook::new(Some(3600), WindowPolicy::TimeGated);

        assert!(!book.admit(key(), 150, now - 7200, now));
        assert_eq!(book.last_seen(key()), 0);

        assert!(book.admit(key(), 151, now - 60, now));
        assert_eq!(book.last_seen(key()), 151);
    }

    #[test]
    fn test_window_boundary_is_inclusive() {
        let now = 10_000;
        let book = CursorBook::new(Some(3600), WindowPolicy::BlockGated);
        assert_eq!(book.evaluate(key(), 1, now - 3600, now), Admission::Fresh);
        assert_eq!(
            book.evaluate(key(), 1, now - 3601, now),
            Admission::OutsideWindow
        );
    }

    #[test]
    fn test_advance_is_monotonic() {
        let mut book = CursorBook::default();
        assert_eq!(book.advance(key(), 10), 10);
        assert_eq!(book.advance(key(), 5), 10);
        assert_eq!(book.advance(key(), 12), 12);
    }

    #[test]
    fn test_seed_only_applies_once() {
        let mut book = CursorBook::default();
        book.seed(key(), 500);
        book.seed(key(), 900);
        assert_eq!(book.last_seen(key()), 500);
    }

    #[test]
    fn test_lanes_are_independent() {
        let mut book = CursorBook::default();
        let token = CursorKey::new(WALLET, TransferKind::Token);

        book.advance(key(), 200);
        assert_eq!(book.last_seen(token), 0);
        assert!(book.admit(token, 150, 0, 0));
        assert_eq!(book.lanes().len(), 2);
    }
}
