//! Direction labelling of transfers relative to a watched wallet.

use crate::types::TransferRecord;
use alloy_primitives::Address;
use serde::{Deserialize, Serialize};

/// Which side of the transfer the watched wallet is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Inbound,
    Outbound,
    /// The wallet is neither sender nor recipient (router pass-through).
    Neither,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
    pub direction: Direction,
    /// Sender and recipient coincide.
    pub is_self_transfer: bool,
}

impl Classification {
    /// Alerts for self transfers and pass-through records share one category.
    pub const fn is_swap(&self) -> bool {
        self.is_self_transfer || matches!(self.direction, Direction::Neither)
    }
}

/// Reason a record is not alerted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// `from` or `to` missing.
    Malformed,
    /// The wallet is not a party and [`NeitherPolicy::Drop`] is in force.
    Unrelated,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Alert(Classification),
    Skip(SkipReason),
}

/// What to do with records in which the wallet is neither party.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NeitherPolicy {
    /// Alert them as a swap/transfer-through.
    #[default]
    Surface,
    /// Ignore them.
    Drop,
}

/// Classifies records against a single watched wallet.
#[derive(Debug, Clone, Copy, Default)]
pub struct Classifier {
    neither: NeitherPolicy,
}

impl Classifier {
    pub const fn new(neither: NeitherPolicy) -> Self {
        Self { neither }
    }

    /// Classify `record` from the point of view of `watched`.
    ///
    /// `Address` equality is byte equality, so mixed-case inputs were
    /// already normalised when the record was parsed.
    pub fn classify(&self, record: &TransferRecord, watched: Address) -> Verdict {
        let (Some(from), Some(to)) = (record.from, record.to) else {
            return Verdict::Skip(SkipReason::Malformed);
        };

        let direction = if to == watched {
            Direction::Inbound
        } else if from == watched {
            Direction::Outbound
        } else {
            Direction::Neither
        };

        if direction == Direction::Neither && self.neither == NeitherPolicy::Drop {
            return Verdict::Skip(SkipReason::Unrelated);
        }

        Verdict::Alert(Classification {
            direction,
            is_self_transfer: from == to,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Asset, TransferKind};
    use alloy_primitives::{address, TxHash};

    const WATCHED: Address = address!("abcabcabcabcabcabcabcabcabcabcabcabcabca");
    const OTHER: Address = address!("defdefdefdefdefdefdefdefdefdefdefdefdefd");
    const THIRD: Address = address!("1111111111111111111111111111111111111111");

    fn record(from: Option<Address>, to: Option<Address>) -> TransferRecord {
        TransferRecord {
            kind: TransferKind::Token,
            block_number: 1,
            timestamp: 0,
            tx_hash: TxHash::ZERO,
            from,
            to,
            raw_amount: "1".to_string(),
            asset: Asset::Native,
        }
    }

    #[test]
    fn test_inbound() {
        let verdict = Classifier::default().classify(&record(Some(OTHER), Some(WATCHED)), WATCHED);
        assert_eq!(
            verdict,
            Verdict::Alert(Classification {
                direction: Direction::Inbound,
                is_self_transfer: false,
            })
        );
    }

    #[test]
    fn test_outbound() {
        let verdict = Classifier::default().classify(&record(Some(WATCHED), Some(OTHER)), WATCHED);
        assert_eq!(
            verdict,
            Verdict::Alert(Classification {
                direction: Direction::Outbound,
                is_self_transfer: false,
            })
        );
    }

    #[test]
    fn test_self_transfer() {
        let verdict =
            Classifier::default().classify(&record(Some(WATCHED), Some(WATCHED)), WATCHED);
        let Verdict::Alert(classification) = verdict else {
            panic!("self transfer should alert");
        };
        assert_eq!(classification.direction, Direction::Inbound);
        assert!(classification.is_self_transfer);
        assert!(classification.is_swap());
    }

    #[test]
    fn test_mixed_case_parse_matches() {
        let upper: Address = "0xABCABCABCABCABCABCABCABCABCABCABCABCABCA".parse().unwrap();
        let verdict = Classifier::default().classify(&record(Some(OTHER), Some(upper)), WATCHED);
        assert!(matches!(
            verdict,
            Verdict::Alert(Classification {
                direction: Direction::Inbound,
                ..
            })
        ));
    }

    #[test]
    fn test_neither_surfaced_by_default() {
        let verdict = Classifier::default().classify(&record(Some(OTHER), Some(THIRD)), WATCHED);
        let Verdict::Alert(classification) = verdict else {
            panic!("neither should be surfaced");
        };
        assert_eq!(classification.direction, Direction::Neither);
        assert!(classification.is_swap());
    }

    #[test]
    fn test_neither_dropped() {
        let classifier = Classifier::new(NeitherPolicy::Drop);
        assert_eq!(
            classifier.classify(&record(Some(OTHER), Some(THIRD)), WATCHED),
            Verdict::Skip(SkipReason::Unrelated)
        );
    }

    #[test]
    fn test_missing_party_is_malformed() {
        let classifier = Classifier::default();
        assert_eq!(
            classifier.classify(&record(None, Some(WATCHED)), WATCHED),
            Verdict::Skip(SkipReason::Malformed)
        );
        assert_eq!(
            classifier.classify(&record(Some(WATCHED), None), WATCHED),
            Verdict::Skip(SkipReason::Malformed)
        );
    }
}
