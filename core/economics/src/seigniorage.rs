// o2ul/core/economics/src/seigniorage.rs

//! Supply adjustment data model shared by the decision source, the
//! adjustment engine and the history journal.

use crate::history::JournalError;
use o2ul_execution::{Address, LedgerError};
use primitive_types::{U256, U512};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a supply adjustment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AdjustmentKind {
    None,
    /// Mint stable supply, burn value tokens from the treasury
    Expansion,
    /// Burn stable supply, mint value tokens to the treasury
    Contraction,
}

impl AdjustmentKind {
    /// Code persisted in the `adjustment_<i>_type` slot
    pub fn code(&self) -> u64 {
        match self {
            AdjustmentKind::None => 0,
            AdjustmentKind::Expansion => 1,
            AdjustmentKind::Contraction => 2,
        }
    }

    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(AdjustmentKind::None),
            1 => Some(AdjustmentKind::Expansion),
            2 => Some(AdjustmentKind::Contraction),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdjustmentKind::None => "none",
            AdjustmentKind::Expansion => "expansion",
            AdjustmentKind::Contraction => "contraction",
        }
    }
}

impl fmt::Display for AdjustmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output of a decision source.
///
/// Quantities are `U512` so that a source can express amounts that do not fit
/// a ledger word; the engine rejects those before touching state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustmentDecision {
    pub kind: AdjustmentKind,
    /// Stable tokens to mint (expansion) or burn (contraction)
    pub supply_delta: U512,
    /// Value tokens to burn from (expansion) or mint to (contraction) the treasury
    pub counterpart_amount: U512,
    /// Signed deviation of current value from target, in basis points
    pub deviation_bps: i64,
    /// Supply the source expects after the adjustment
    pub resulting_supply: U512,
    /// Unix seconds
    pub timestamp: u64,
}

impl AdjustmentDecision {
    /// A decision that leaves the ledger untouched
    pub fn none(current_supply: U256, deviation_bps: i64, timestamp: u64) -> Self {
        Self {
            kind: AdjustmentKind::None,
            supply_delta: U512::zero(),
            counterpart_amount: U512::zero(),
            deviation_bps,
            resulting_supply: U512::from(current_supply),
            timestamp,
        }
    }

    pub fn is_none(&self) -> bool {
        self.kind == AdjustmentKind::None
    }
}

/// One entry of the adjustment history journal
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Position in the journal, starting at 0
    pub index: u64,
    pub kind: AdjustmentKind,
    pub supply_delta: U256,
    pub counterpart_amount: U256,
    pub deviation_bps: i64,
    /// Stable supply read back from the ledger after the mutation
    pub resulting_supply: U256,
    /// Supply the decision source expected, kept for audit
    pub claimed_supply: U256,
    /// Unix seconds of the decision
    pub timestamp: u64,
}

/// What an applied adjustment actually did to the ledger
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedAdjustment {
    pub record: HistoryRecord,
    pub treasury: Address,
    pub previous_supply: U256,
    pub treasury_balance_before: U256,
    pub treasury_balance_after: U256,
}

/// Result of a successful `apply` call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The decision was `None`
    NoChange,
    /// The feasibility check declined the decision; nothing was written
    Skipped { reason: String },
    Applied(AppliedAdjustment),
}

impl ApplyOutcome {
    pub fn applied(&self) -> Option<&AppliedAdjustment> {
        match self {
            ApplyOutcome::Applied(applied) => Some(applied),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ApplyOutcome::NoChange => "no_change",
            ApplyOutcome::Skipped { .. } => "skipped",
            ApplyOutcome::Applied(_) => "applied",
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AdjustmentError {
    #[error("treasury {treasury} holds {balance}, adjustment needs {required}")]
    InsufficientBalance {
        treasury: Address,
        balance: U256,
        required: U256,
    },

    #[error("contracting {delta} from supply {current} breaches minimum supply {minimum}")]
    SupplyUnderflow {
        current: U256,
        delta: U256,
        minimum: U256,
    },

    #[error("{0} overflows a ledger word")]
    Overflow(&'static str),

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("history journal error: {0}")]
    Journal(#[from] JournalError),
}
