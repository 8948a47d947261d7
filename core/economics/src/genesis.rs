// o2ul/core/economics/src/genesis.rs

//! Genesis seeding for the two native tokens and the staking system.

use crate::keys::StateKey;
use crate::token::{units, StableTokenConfig, StakingConfig, TokenError, ValueTokenConfig};
use o2ul_execution::{Address, BalanceChangeReason, Ledger, LedgerError, Word, WordError};
use primitive_types::U256;
use serde::Serialize;
use tracing::info;

#[derive(Debug, thiserror::Error)]
pub enum GenesisError {
    #[error("invalid token configuration: {0}")]
    Config(#[from] TokenError),

    #[error("cannot encode {field}: {source}")]
    Encoding {
        field: &'static str,
        #[source]
        source: WordError,
    },

    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Summary of what genesis wrote, for logging and `genesis-info`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenesisReport {
    pub founder: Address,
    pub founder_balance: U256,
    pub reserve: Address,
    pub reserve_balance: U256,
    pub treasury: Address,
    pub stable_supply: U256,
    pub minimum_stable_supply: U256,
    pub genesis_time: u64,
}

fn short_str(field: &'static str, value: &str) -> Result<Word, GenesisError> {
    Word::from_short_str(value).map_err(|source| GenesisError::Encoding { field, source })
}

/// Credit the founder and reserve allocations and record token metadata
pub fn setup_value_token(
    ledger: &dyn Ledger,
    config: &ValueTokenConfig,
    founder: Address,
    reserve: Address,
) -> Result<(U256, U256), GenesisError> {
    config.validate()?;
    info!(
        max_supply = %config.max_supply,
        founder_allocation = %config.founder_allocation,
        reserve_allocation = %config.reserve_allocation,
        "Initializing O2UL token supply"
    );

    ledger.add_balance(founder, config.founder_allocation, BalanceChangeReason::GenesisInit)?;
    ledger.add_balance(reserve, config.reserve_allocation, BalanceChangeReason::GenesisInit)?;

    StateKey::ValueMaxSupply.write(ledger, Word::from_u256(config.max_supply))?;
    StateKey::ValueTokenName.write(ledger, short_str("o2ul token name", &config.name)?)?;
    StateKey::ValueTokenSymbol.write(ledger, short_str("o2ul token symbol", &config.symbol)?)?;
    StateKey::ValueTokenDecimals.write(ledger, Word::from_u64(config.decimals.into()))?;
    StateKey::ValueTokenPrice.write(ledger, Word::from_u256(units(1)))?;

    let founder_balance = ledger.get_balance(&founder)?;
    let reserve_balance = ledger.get_balance(&reserve)?;
    info!(
        %founder,
        %founder_balance,
        %reserve,
        %reserve_balance,
        "Completed O2UL token allocation"
    );
    Ok((founder_balance, reserve_balance))
}

/// Write every UltraStable parameter. The supply is a counter in storage;
/// nobody's native balance is credited.
pub fn setup_ultrastable_token(
    ledger: &dyn Ledger,
    treasury: Address,
    config: &StableTokenConfig,
    now: u64,
) -> Result<(), GenesisError> {
    config.validate()?;
    info!(
        initial_supply = %config.initial_supply,
        update_frequency = config.update_frequency_secs,
        %treasury,
        "Initializing UltraStable token"
    );

    let value = Word::from_u256(config.initial_value);
    let params = [
        (StateKey::TokenName, short_str("ultrastable token name", &config.name)?),
        (StateKey::TokenSymbol, short_str("ultrastable token symbol", &config.symbol)?),
        (StateKey::TokenDecimals, Word::from_u64(config.decimals.into())),
        (StateKey::InitialSupply, Word::from_u256(config.initial_supply)),
        (StateKey::CurrentSupply, Word::from_u256(config.initial_supply)),
        (StateKey::MinimumSupply, Word::from_u256(config.minimum_supply)),
        (StateKey::UpdateFrequency, Word::from_u64(config.update_frequency_secs)),
        (StateKey::InitialValue, value),
        (StateKey::CurrentValue, value),
        (StateKey::TargetValue, value),
        (StateKey::LastUpdateTime, Word::from_u64(now)),
        (StateKey::MarketVolatility, Word::from_u64(config.initial_volatility.into())),
        (StateKey::HistoryCount, Word::from_u64(0)),
        (StateKey::TreasuryAddress, Word::from_address(&treasury)),
    ];
    for (key, word) in params {
        key.write(ledger, word)?;
    }

    for (region, weight) in &config.continental_weights {
        StateKey::ContinentalWeight(region).write(ledger, Word::from_u64((*weight).into()))?;
    }
    for (frame, weight) in &config.timeframe_weights {
        StateKey::TimeframeWeight(frame).write(ledger, Word::from_u64((*weight).into()))?;
    }
    for (frame, days) in &config.smoothing_windows {
        StateKey::SmoothingWindow(frame).write(ledger, Word::from_u64((*days).into()))?;
    }

    Ok(())
}

pub fn setup_staking_system(ledger: &dyn Ledger, config: &StakingConfig) -> Result<(), GenesisError> {
    info!(
        reward_bps = config.reward_bps,
        minimum_staking_period = config.minimum_staking_period,
        unlock_period = config.unlock_period,
        "Initializing O2UL staking system"
    );

    StateKey::StakingRewardPercentage.write(ledger, Word::from_u64(config.reward_bps))?;
    StateKey::MinimumStakingPeriod.write(ledger, Word::from_u64(config.minimum_staking_period))?;
    StateKey::StakingUnlockPeriod.write(ledger, Word::from_u64(config.unlock_period))?;
    StateKey::TotalStakedAmount.write(ledger, Word::ZERO)?;
    StateKey::LastRewardBlock.write(ledger, Word::ZERO)?;
    Ok(())
}

/// Accounts funded or referenced at genesis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenesisAccounts {
    pub founder: Address,
    pub reserve: Address,
    pub treasury: Address,
}

/// Run every seeder against `ledger`
pub fn initialize(
    ledger: &dyn Ledger,
    accounts: GenesisAccounts,
    value: &ValueTokenConfig,
    stable: &StableTokenConfig,
    staking: &StakingConfig,
    now: u64,
) -> Result<GenesisReport, GenesisError> {
    let (founder_balance, reserve_balance) =
        setup_value_token(ledger, value, accounts.founder, accounts.reserve)?;
    setup_ultrastable_token(ledger, accounts.treasury, stable, now)?;
    setup_staking_system(ledger, staking)?;

    Ok(GenesisReport {
        founder: accounts.founder,
        founder_balance,
        reserve: accounts.reserve,
        reserve_balance,
        treasury: accounts.treasury,
        stable_supply: StateKey::CurrentSupply.read_u256(ledger)?,
        minimum_stable_supply: StateKey::MinimumSupply.read_u256(ledger)?,
        genesis_time: now,
    })
}
