// o2ul/core/economics/src/keys.rs

//! Persisted storage layout.
//!
//! Every token-economic parameter lives in a named slot of one of the system
//! accounts in [`crate::params`]. The slot key is keccak256 of the slot name,
//! so the names below are part of the on-chain layout and must not change.
//! Code outside this module addresses slots only through [`StateKey`] and
//! [`HistoryField`], never through raw strings.

use crate::params::{STAKING_SYSTEM_ADDRESS, ULTRASTABLE_SYSTEM_ADDRESS, VALUE_TOKEN_SYSTEM_ADDRESS};
use o2ul_execution::{Address, Hash, Ledger, LedgerError, Word};
use primitive_types::U256;
use std::borrow::Cow;

/// A named storage slot together with the system account that owns it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateKey<'a> {
    // UltraStable account
    TokenName,
    TokenSymbol,
    TokenDecimals,
    InitialSupply,
    CurrentSupply,
    MinimumSupply,
    UpdateFrequency,
    InitialValue,
    CurrentValue,
    TargetValue,
    LastUpdateTime,
    MarketVolatility,
    HistoryCount,
    TreasuryAddress,
    ContinentalWeight(&'a str),
    TimeframeWeight(&'a str),
    SmoothingWindow(&'a str),

    // Value token account
    ValueTokenPrice,
    ValueTokenName,
    ValueTokenSymbol,
    ValueTokenDecimals,
    ValueMaxSupply,

    // Staking account
    StakingRewardPercentage,
    MinimumStakingPeriod,
    StakingUnlockPeriod,
    TotalStakedAmount,
    LastRewardBlock,
}

impl StateKey<'_> {
    pub fn name(&self) -> Cow<'static, str> {
        let fixed = match self {
            StateKey::TokenName => "ultrastable_token_name",
            StateKey::TokenSymbol => "ultrastable_token_symbol",
            StateKey::TokenDecimals => "ultrastable_token_decimals",
            StateKey::InitialSupply => "ultrastable_initial_supply",
            StateKey::CurrentSupply => "ultrastable_current_supply",
            StateKey::MinimumSupply => "ultrastable_minimum_supply",
            StateKey::UpdateFrequency => "ultrastable_update_frequency",
            StateKey::InitialValue => "ultrastable_initial_value",
            StateKey::CurrentValue => "ultrastable_current_value",
            StateKey::TargetValue => "ultrastable_target_value",
            StateKey::LastUpdateTime => "ultrastable_last_update_time",
            StateKey::MarketVolatility => "market_volatility",
            StateKey::HistoryCount => "adjustment_history_count",
            StateKey::TreasuryAddress => "treasury_address",
            StateKey::ContinentalWeight(region) => {
                return Cow::Owned(format!("continental_weight_{region}"))
            }
            StateKey::TimeframeWeight(frame) => {
                return Cow::Owned(format!("timeframe_weight_{frame}"))
            }
            StateKey::SmoothingWindow(frame) => {
                return Cow::Owned(format!("smoothing_window_{frame}"))
            }
            StateKey::ValueTokenPrice => "value_token_price",
            StateKey::ValueTokenName => "o2ul_token_name",
            StateKey::ValueTokenSymbol => "o2ul_token_symbol",
            StateKey::ValueTokenDecimals => "o2ul_token_decimals",
            StateKey::ValueMaxSupply => "o2ul_max_supply",
            StateKey::StakingRewardPercentage => "staking_reward_percentage",
            StateKey::MinimumStakingPeriod => "minimum_staking_period",
            StateKey::StakingUnlockPeriod => "staking_unlock_period",
            StateKey::TotalStakedAmount => "total_staked_amount",
            StateKey::LastRewardBlock => "last_reward_block",
        };
        Cow::Borrowed(fixed)
    }

    pub fn account(&self) -> Address {
        match self {
            StateKey::ValueTokenPrice
            | StateKey::ValueTokenName
            | StateKey::ValueTokenSymbol
            | StateKey::ValueTokenDecimals
            | StateKey::ValueMaxSupply => VALUE_TOKEN_SYSTEM_ADDRESS,
            StateKey::StakingRewardPercentage
            | StateKey::MinimumStakingPeriod
            | StateKey::StakingUnlockPeriod
            | StateKey::TotalStakedAmount
            | StateKey::LastRewardBlock => STAKING_SYSTEM_ADDRESS,
            _ => ULTRASTABLE_SYSTEM_ADDRESS,
        }
    }

    pub fn hash(&self) -> Hash {
        Hash::from_key_name(&self.name())
    }

    pub fn read(&self, ledger: &dyn Ledger) -> Result<Word, LedgerError> {
        ledger.get_state(&self.account(), &self.hash())
    }

    pub fn read_u256(&self, ledger: &dyn Ledger) -> Result<U256, LedgerError> {
        Ok(self.read(ledger)?.to_u256())
    }

    pub fn write(&self, ledger: &dyn Ledger, value: Word) -> Result<(), LedgerError> {
        ledger.set_state(self.account(), self.hash(), value)
    }
}

/// Per-record fields of the adjustment history
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryField {
    Type,
    Amount,
    ValueTokens,
    Deviation,
    NewSupply,
    ClaimedSupply,
    Timestamp,
}

impl HistoryField {
    pub const ALL: [HistoryField; 7] = [
        HistoryField::Type,
        HistoryField::Amount,
        HistoryField::ValueTokens,
        HistoryField::Deviation,
        HistoryField::NewSupply,
        HistoryField::ClaimedSupply,
        HistoryField::Timestamp,
    ];

    fn suffix(&self) -> &'static str {
        match self {
            HistoryField::Type => "type",
            HistoryField::Amount => "amount",
            HistoryField::ValueTokens => "value_tokens",
            HistoryField::Deviation => "deviation",
            HistoryField::NewSupply => "new_supply",
            HistoryField::ClaimedSupply => "claimed_supply",
            HistoryField::Timestamp => "timestamp",
        }
    }

    /// Slot name of this field for history record `index`
    pub fn name(&self, index: u64) -> String {
        format!("adjustment_{}_{}", index, self.suffix())
    }

    pub fn key(&self, index: u64) -> Hash {
        Hash::from_key_name(&self.name(index))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_slot_names() {
        assert_eq!(StateKey::CurrentSupply.name(), "ultrastable_current_supply");
        assert_eq!(
            StateKey::ContinentalWeight("Europe").name(),
            "continental_weight_Europe"
        );
        assert_eq!(HistoryField::ValueTokens.name(12), "adjustment_12_value_tokens");
    }

    #[test]
    fn test_slot_owners() {
        assert_eq!(StateKey::CurrentSupply.account(), ULTRASTABLE_SYSTEM_ADDRESS);
        assert_eq!(StateKey::ValueTokenPrice.account(), VALUE_TOKEN_SYSTEM_ADDRESS);
        assert_eq!(StateKey::LastRewardBlock.account(), STAKING_SYSTEM_ADDRESS);
    }

    #[test]
    fn test_history_keys_never_collide() {
        let mut seen = HashSet::new();
        for index in 0..50u64 {
            for field in HistoryField::ALL {
                assert!(seen.insert(field.key(index)), "{}", field.name(index));
            }
        }
        assert!(!seen.contains(&StateKey::HistoryCount.hash()));
    }
}
