//! Decoding of explorer API responses into transfer records.

use crate::ExplorerError;
use alloy_primitives::{Address, TxHash, U256};
use serde::Deserialize;
use serde_json::Value;
use tracing::warn;
use transfer::{Asset, TransferKind, TransferRecord};

/// Message the API pairs with `status = "0"` when a listing is empty.
const NO_TRANSACTIONS: &str = "No transactions found";

/// Decimals assumed when a token listing omits them.
const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Standard `{status, message, result}` envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    status: String,
    message: String,
    result: Value,
}

/// One entry of a `txlist` or `tokentx` listing.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTransfer {
    block_number: String,
    time_stamp: String,
    hash: String,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    value: String,
    #[serde(default)]
    is_error: Option<String>,
    #[serde(default)]
    contract_address: Option<String>,
    #[serde(default)]
    token_symbol: Option<String>,
    #[serde(default)]
    token_decimal: Option<String>,
}

/// Unwrap the envelope, mapping the empty-listing case to an empty array.
fn unwrap_envelope(body: &str) -> Result<Value, ExplorerError> {
    let envelope: Envelope = serde_json::from_str(body)?;
    if envelope.status == "1" {
        return Ok(envelope.result);
    }
    if envelope.message.starts_with(NO_TRANSACTIONS) {
        return Ok(Value::Array(Vec::new()));
    }
    let result = match envelope.result {
        Value::String(s) => s,
        other => other.to_string(),
    };
    Err(ExplorerError::Api {
        message: envelope.message,
        result,
    })
}

/// Decode a transfer listing.
///
/// Entries that cannot be decoded are logged and dropped; the rest of the
/// listing is kept. Failed native transactions are dropped since they move
/// no value.
pub fn parse_transfers(body: &str, kind: TransferKind) -> Result<Vec<TransferRecord>, ExplorerError> {
    let Value::Array(entries) = unwrap_envelope(body)? else {
        return Err(ExplorerError::InvalidResult(
            "transfer listing is not an array".to_string(),
        ));
    };

    let mut records = Vec::with_capacity(entries.len());
    for entry in entries {
        let raw: RawTransfer = match serde_json::from_value(entry) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%kind, error = %e, "Dropping undecodable explorer entry");
                continue;
            }
        };
        match raw.into_record(kind) {
            Ok(Some(record)) => records.push(record),
            Ok(None) => {}
            Err(reason) => warn!(%kind, %reason, "Dropping malformed explorer entry"),
        }
    }

    Ok(records)
}

impl RawTransfer {
    fn into_record(self, kind: TransferKind) -> Result<Option<TransferRecord>, String> {
        if kind == TransferKind::Native && self.is_error.as_deref() == Some("1") {
            return Ok(None);
        }

        let block_number = self
            .block_number
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("blockNumber {:?}: {e}", self.block_number))?;
        let timestamp = self
            .time_stamp
            .trim()
            .parse::<u64>()
            .map_err(|e| format!("timeStamp {:?}: {e}", self.time_stamp))?;
        let tx_hash = self
            .hash
            .trim()
            .parse::<TxHash>()
            .map_err(|e| format!("hash {:?}: {e}", self.hash))?;

        let asset = match kind {
            TransferKind::Native => Asset::Native,
            TransferKind::Token => Asset::Token {
                symbol: self
                    .token_symbol
                    .filter(|s| !s.trim().is_empty())
                    .unwrap_or_else(|| "Unknown".to_string()),
                decimals: self
                    .token_decimal
                    .as_deref()
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(|s| s.parse::<u8>())
                    .transpose()
                    .map_err(|e| format!("tokenDecimal: {e}"))?
                    .unwrap_or(DEFAULT_TOKEN_DECIMALS),
                contract: parse_address(self.contract_address.as_deref()),
            },
        };

        Ok(Some(TransferRecord {
            kind,
            block_number,
            timestamp,
            tx_hash,
            from: parse_address(self.from.as_deref()),
            to: parse_address(self.to.as_deref()),
            raw_amount: self.value.trim().to_string(),
            asset,
        }))
    }
}

/// Empty or non-address strings become `None`.
fn parse_address(raw: Option<&str>) -> Option<Address> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse().ok())
}

/// Decode `proxy/eth_blockNumber`, a JSON-RPC style `{"result": "0x.."}`.
pub fn parse_head_block(body: &str) -> Result<u64, ExplorerError> {
    let value: Value = serde_json::from_str(body)?;

    if value.get("status").and_then(Value::as_str) == Some("0") {
        return Err(ExplorerError::Api {
            message: value
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("NOTOK")
                .to_string(),
            result: value
                .get("result")
                .map(|r| r.as_str().map_or_else(|| r.to_string(), str::to_string))
                .unwrap_or_default(),
        });
    }
    if let Some(error) = value.get("error") {
        return Err(ExplorerError::Api {
            message: "JSON-RPC error".to_string(),
            result: error.to_string(),
        });
    }

    let hex = value
        .get("result")
        .and_then(Value::as_str)
        .ok_or_else(|| ExplorerError::InvalidResult("missing block number".to_string()))?;
    u64::from_str_radix(hex.trim_start_matches("0x"), 16)
        .map_err(|e| ExplorerError::InvalidResult(format!("block number {hex:?}: {e}")))
}

/// Decode `account/balance` or `account/tokenbalance`.
pub fn parse_balance(body: &str) -> Result<U256, ExplorerError> {
    let result = unwrap_envelope(body)?;
    let raw = result
        .as_str()
        .ok_or_else(|| ExplorerError::InvalidResult(format!("balance {result}")))?;
    U256::from_str_radix(raw.trim(), 10)
        .map_err(|e| ExplorerError::InvalidResult(format!("balance {raw:?}: {e}")))
}
