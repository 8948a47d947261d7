// o2ul/core/economics/src/lib.rs

// Token economics: genesis seeding and the UltraStable supply controller
pub mod engine;
pub mod events;
pub mod genesis;
pub mod history;
pub mod keys;
pub mod manager;
pub mod metrics;
pub mod params;
pub mod seigniorage;
pub mod source;
pub mod token;

pub use engine::SupplyAdjustmentEngine;
pub use events::{EventNotifier, Subscription, ValueUpdate};
pub use genesis::{GenesisAccounts, GenesisError, GenesisReport};
pub use history::{HistoryJournal, JournalError};
pub use keys::{HistoryField, StateKey};
pub use manager::{SchedulerState, UltraStableConfig, UltraStableManager, UpdateError, UpdateReport};
pub use seigniorage::{
    AdjustmentDecision, AdjustmentError, AdjustmentKind, AppliedAdjustment, ApplyOutcome,
    HistoryRecord,
};
pub use source::{DecisionSource, Feasibility, PegBandConfig, PegBandSource, SourceError};
pub use token::{units, StableTokenConfig, StakingConfig, TokenError, ValueTokenConfig, DECIMALS};
