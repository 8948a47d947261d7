// o2ul/core/economics/src/history.rs

//! Append-only adjustment history stored in ledger slots.
//!
//! A counter slot holds the number of records; record `i` occupies the seven
//! `adjustment_<i>_*` slots. Records are written once and never rewritten.

use crate::keys::{HistoryField, StateKey};
use crate::params::ULTRASTABLE_SYSTEM_ADDRESS;
use crate::seigniorage::{AdjustmentKind, HistoryRecord};
use o2ul_execution::{Address, Ledger, LedgerError, Word};
use tracing::{debug, error};

#[derive(Debug, thiserror::Error)]
pub enum JournalError {
    #[error("history record {index} is unreadable: {reason}")]
    Corrupted { index: u64, reason: String },

    #[error("refusing to record a {0} adjustment")]
    Unrecordable(AdjustmentKind),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

pub struct HistoryJournal {
    account: Address,
}

impl Default for HistoryJournal {
    fn default() -> Self {
        Self::new(ULTRASTABLE_SYSTEM_ADDRESS)
    }
}

impl HistoryJournal {
    pub fn new(account: Address) -> Self {
        Self { account }
    }

    /// Number of records written so far
    pub fn count(&self, ledger: &dyn Ledger) -> Result<u64, JournalError> {
        let word = ledger.get_state(&self.account, &StateKey::HistoryCount.hash())?;
        word.to_u64().map_err(|e| JournalError::Corrupted {
            index: 0,
            reason: format!("history counter: {e}"),
        })
    }

    /// Write `record` at the next index and bump the counter. The index field
    /// of the argument is ignored; the stored record is returned.
    pub fn append(
        &self,
        ledger: &dyn Ledger,
        mut record: HistoryRecord,
    ) -> Result<HistoryRecord, JournalError> {
        if record.kind == AdjustmentKind::None {
            return Err(JournalError::Unrecordable(record.kind));
        }

        let index = self.count(ledger)?;
        let next = index.checked_add(1).ok_or_else(|| JournalError::Corrupted {
            index,
            reason: "history counter exhausted".to_string(),
        })?;
        record.index = index;

        for field in HistoryField::ALL {
            let value = match field {
                HistoryField::Type => Word::from_u64(record.kind.code()),
                HistoryField::Amount => Word::from_u256(record.supply_delta),
                HistoryField::ValueTokens => Word::from_u256(record.counterpart_amount),
                HistoryField::Deviation => Word::from_i64(record.deviation_bps),
                HistoryField::NewSupply => Word::from_u256(record.resulting_supply),
                HistoryField::ClaimedSupply => Word::from_u256(record.claimed_supply),
                HistoryField::Timestamp => Word::from_u64(record.timestamp),
            };
            ledger.set_state(self.account, field.key(index), value)?;
        }
        ledger.set_state(
            self.account,
            StateKey::HistoryCount.hash(),
            Word::from_u64(next),
        )?;

        debug!(index, kind = %record.kind, "Updated adjustment history");
        Ok(record)
    }

    /// Up to `max_entries` most recent records, oldest first
    pub fn query(
        &self,
        ledger: &dyn Ledger,
        max_entries: usize,
    ) -> Result<Vec<HistoryRecord>, JournalError> {
        let count = self.count(ledger)?;
        let start = count.saturating_sub(max_entries as u64);

        (start..count)
            .map(|index| {
                self.read(ledger, index).map_err(|e| {
                    error!(index, error = %e, "Adjustment history is corrupted");
                    e
                })
            })
            .collect()
    }

    /// Read record `index`; slots below the counter must decode cleanly
    pub fn read(&self, ledger: &dyn Ledger, index: u64) -> Result<HistoryRecord, JournalError> {
        let slot = |field: HistoryField| ledger.get_state(&self.account, &field.key(index));
        let corrupted = |reason: String| JournalError::Corrupted { index, reason };

        let code = slot(HistoryField::Type)?
            .to_u64()
            .map_err(|e| corrupted(format!("type: {e}")))?;
        let kind = match AdjustmentKind::from_code(code) {
            Some(AdjustmentKind::None) | None => {
                return Err(corrupted(format!("unknown adjustment type {code}")))
            }
            Some(kind) => kind,
        };

        Ok(HistoryRecord {
            index,
            kind,
            supply_delta: slot(HistoryField::Amount)?.to_u256(),
            counterpart_amount: slot(HistoryField::ValueTokens)?.to_u256(),
            deviation_bps: slot(HistoryField::Deviation)?
                .to_i64()
                .map_err(|e| corrupted(format!("deviation: {e}")))?,
            resulting_supply: slot(HistoryField::NewSupply)?.to_u256(),
            claimed_supply: slot(HistoryField::ClaimedSupply)?.to_u256(),
            timestamp: slot(HistoryField::Timestamp)?
                .to_u64()
                .map_err(|e| corrupted(format!("timestamp: {e}")))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use o2ul_execution::StateDB;
    use primitive_types::U256;

    fn record(kind: AdjustmentKind, delta: u64, deviation_bps: i64) -> HistoryRecord {
        HistoryRecord {
            index: 999,
            kind,
            supply_delta: U256::from(delta),
            counterpart_amount: U256::from(delta / 2),
            deviation_bps,
            resulting_supply: U256::from(1_000 + delta),
            claimed_supply: U256::from(1_000 + delta),
            timestamp: 1_700_000_000 + delta,
        }
    }

    #[test]
    fn test_empty_journal() {
        let db = StateDB::new();
        let journal = HistoryJournal::default();
        assert_eq!(journal.count(&db).unwrap(), 0);
        assert!(journal.query(&db, 10).unwrap().is_empty());
    }

    #[test]
    fn test_append_assigns_sequential_indices() {
        let db = StateDB::new();
        let journal = HistoryJournal::default();

        let first = journal
            .append(&db, record(AdjustmentKind::Expansion, 10, 120))
            .unwrap();
        let second = journal
            .append(&db, record(AdjustmentKind::Contraction, 20, -300))
            .unwrap();

        assert_eq!(first.index, 0);
        assert_eq!(second.index, 1);
        assert_eq!(journal.count(&db).unwrap(), 2);
        assert_eq!(journal.read(&db, 1).unwrap(), second);
    }

    #[test]
    fn test_query_returns_most_recent_window_in_order() {
        let db = StateDB::new();
        let journal = HistoryJournal::default();
        for i in 0..5 {
            journal
                .append(&db, record(AdjustmentKind::Expansion, i + 1, i as i64))
                .unwrap();
        }

        let window = journal.query(&db, 3).unwrap();
        let indices: Vec<u64> = window.iter().map(|r| r.index).collect();
        assert_eq!(indices, vec![2, 3, 4]);

        assert_eq!(journal.query(&db, 50).unwrap().len(), 5);
        assert!(journal.query(&db, 0).unwrap().is_empty());
    }

    #[test]
    fn test_none_is_not_recordable() {
        let db = StateDB::new();
        let journal = HistoryJournal::default();
        let err = journal
            .append(&db, record(AdjustmentKind::None, 0, 0))
            .unwrap_err();
        assert!(matches!(err, JournalError::Unrecordable(AdjustmentKind::None)));
        assert_eq!(journal.count(&db).unwrap(), 0);
    }

    #[test]
    fn test_missing_slot_is_reported_not_skipped() {
        let db = StateDB::new();
        let journal = HistoryJournal::default();
        journal
            .append(&db, record(AdjustmentKind::Expansion, 1, 0))
            .unwrap();

        // Counter claims two records but only one was written
        StateKey::HistoryCount.write(&db, Word::from_u64(2)).unwrap();

        let err = journal.query(&db, 10).unwrap_err();
        assert!(matches!(err, JournalError::Corrupted { index: 1, .. }));
    }
}
