//! Chat message rendering for detected transfers.
//!
//! Headlines read "Received <symbol>" for deposits, "Sent <symbol>" for
//! withdrawals and "Swap/Transfer <symbol>" for self-transfers and
//! transfers the wallet is not a party to.
//!
//! Messages use legacy Telegram Markdown, where a backslash escape is only
//! honoured outside an entity. Wallet labels and symbols come from config
//! and token deployers, so they are escaped and never placed inside bold.

use crate::{
    address::shorten,
    amount::{format_amount, AmountError},
    classify::{Classification, Direction},
    types::{normalized, TransferRecord},
};
use chrono::DateTime;
use std::fmt::Write;

/// Network-specific pieces of the alert template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlertTemplate {
    /// Prefix a transaction hash is appended to, e.g. `https://etherscan.io/tx/`
    pub tx_url_base: String,
    /// Symbol of the native currency
    pub native_symbol: String,
}

impl AlertTemplate {
    pub fn new(tx_url_base: impl Into<String>, native_symbol: impl Into<String>) -> Self {
        Self {
            tx_url_base: tx_url_base.into(),
            native_symbol: native_symbol.into(),
        }
    }

    /// Render a Markdown alert for a classified transfer.
    ///
    /// Fails only when the raw amount cannot be formatted.
    pub fn render(
        &self,
        classification: &Classification,
        record: &TransferRecord,
        wallet_label: &str,
        balance_summary: Option<&str>,
    ) -> Result<String, AmountError> {
        let symbol = record.asset.symbol(&self.native_symbol);
        let amount = format_amount(&record.raw_amount, record.asset.decimals())?;

        let from = record.from.as_ref().map(normalized);
        let to = record.to.as_ref().map(normalized);

        let mut message = String::with_capacity(512);
        // Writing into a String cannot fail.
        let _ = writeln!(
            message,
            "{} {}",
            headline(classification),
            escape_markdown(symbol)
        );
        let _ = writeln!(message);
        let _ = writeln!(message, "👤 Wallet: {}", escape_markdown(wallet_label));
        let _ = writeln!(message, "💰 Amount: *{amount}* {}", escape_markdown(symbol));
        let _ = writeln!(message, "📤 From: {}", shorten(from.as_deref()));
        let _ = writeln!(message, "📥 To: {}", shorten(to.as_deref()));
        let _ = writeln!(
            message,
            "🧾 [View TX]({}{:#x})",
            self.tx_url_base, record.tx_hash
        );
        let _ = write!(message, "🕐 {}", format_timestamp(record.timestamp));

        if let Some(summary) = balance_summary.filter(|s| !s.trim().is_empty()) {
            let _ = write!(message, "\n\n{summary}");
        }

        Ok(message)
    }
}

const fn headline(classification: &Classification) -> &'static str {
    if classification.is_swap() {
        return "🔄 Swap/Transfer";
    }
    match classification.direction {
        Direction::Inbound => "🟢 Received",
        Direction::Outbound => "🔴 Sent",
        Direction::Neither => "🔄 Swap/Transfer",
    }
}

/// Human-readable UTC time for a unix timestamp.
pub fn format_timestamp(timestamp: u64) -> String {
    i64::try_from(timestamp)
        .ok()
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| format!("unix {timestamp}"))
}

/// Escape characters that legacy Telegram Markdown treats as entities.
/// Only valid outside an entity.
pub fn escape_markdown(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '_' | '*' | '`' | '[') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
