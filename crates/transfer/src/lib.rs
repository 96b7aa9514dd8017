//! Transfer detection core.
//!
//! This crate provides:
//! - Transfer record types shared by the explorer client and the watcher
//! - Amount and address formatting
//! - Direction classification against a watched wallet
//! - Checkpoint cursors for de-duplicating records across polls
//! - Alert message rendering

pub mod address;
pub mod amount;
pub mod classify;
pub mod cursor;
pub mod render;
pub mod types;

pub use address::shorten;
pub use amount::{format_amount, AmountError};
pub use classify::{Classification, Classifier, Direction, NeitherPolicy, SkipReason, Verdict};
pub use cursor::{AdvancePolicy, Admission, CursorBook, CursorKey, WindowPolicy};
pub use render::AlertTemplate;
pub use types::{normalized, Asset, TransferKind, TransferRecord, NATIVE_DECIMALS};
