// o2ul/core/economics/src/token.rs

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number of decimals for both native tokens
pub const DECIMALS: u32 = 18;

/// `whole` tokens expressed in base units
pub fn units(whole: u64) -> U256 {
    U256::from(whole) * U256::from(10).pow(U256::from(DECIMALS))
}

/// Value token (O2UL) configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueTokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub max_supply: U256,
    /// Credited to the founder account at genesis (60 %)
    pub founder_allocation: U256,
    /// Credited to the reserve account at genesis (40 %)
    pub reserve_allocation: U256,
}

impl Default for ValueTokenConfig {
    fn default() -> Self {
        Self {
            name: "Orbis Omnira Unitas Lex".to_string(),
            symbol: "O2UL".to_string(),
            decimals: DECIMALS,
            max_supply: units(21_000_000),
            founder_allocation: units(12_600_000),
            reserve_allocation: units(8_400_000),
        }
    }
}

impl ValueTokenConfig {
    pub fn validate(&self) -> Result<(), TokenError> {
        let allocated = self
            .founder_allocation
            .checked_add(self.reserve_allocation)
            .ok_or(TokenError::ExceedsSupply)?;
        if allocated > self.max_supply {
            return Err(TokenError::ExceedsSupply);
        }
        Ok(())
    }
}

/// UltraStable token (USUL) configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StableTokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
    pub initial_supply: U256,
    /// Contractions never take the supply below this
    pub minimum_supply: U256,
    /// Seconds between oracle refreshes
    pub update_frequency_secs: u64,
    /// Initial, current and target value at genesis (1.0 in base units)
    pub initial_value: U256,
    /// Market volatility score, 0-100
    pub initial_volatility: u8,
    pub continental_weights: BTreeMap<String, u8>,
    pub timeframe_weights: BTreeMap<String, u8>,
    /// Smoothing window per timeframe, in days
    pub smoothing_windows: BTreeMap<String, u32>,
}

impl Default for StableTokenConfig {
    fn default() -> Self {
        let continental_weights = [
            ("NorthAmerica", 32),
            ("Europe", 16),
            ("Asia", 8),
            ("Africa", 4),
            ("SouthAmerica", 2),
            ("Oceania", 1),
        ];
        let timeframe_weights = [
            ("Current", 1),
            ("3Day", 2),
            ("1Week", 4),
            ("1Month", 8),
            ("3Month", 16),
            ("6Month", 32),
            ("1Year", 64),
        ];
        let smoothing_windows = [
            ("Current", 1),
            ("3Day", 3),
            ("1Week", 7),
            ("1Month", 30),
            ("3Month", 90),
            ("6Month", 180),
            ("1Year", 365),
        ];

        Self {
            name: "UltraStable".to_string(),
            symbol: "USUL".to_string(),
            decimals: DECIMALS,
            initial_supply: units(1_000_000),
            minimum_supply: units(1),
            update_frequency_secs: 6 * 60 * 60,
            initial_value: units(1),
            initial_volatility: 25,
            continental_weights: continental_weights
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            timeframe_weights: timeframe_weights
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
            smoothing_windows: smoothing_windows
                .iter()
                .map(|(k, v)| (k.to_string(), *v))
                .collect(),
        }
    }
}

impl StableTokenConfig {
    pub fn validate(&self) -> Result<(), TokenError> {
        if self.minimum_supply > self.initial_supply {
            return Err(TokenError::InvalidAmount);
        }
        if self.initial_volatility > 100 {
            return Err(TokenError::InvalidAmount);
        }
        Ok(())
    }
}

/// Staking system parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingConfig {
    /// Share of transaction fees paid to stakers, in basis points
    pub reward_bps: u64,
    /// Blocks a stake must stay locked (~1 week at 15s)
    pub minimum_staking_period: u64,
    /// Blocks needed to unlock a stake (~1 day at 15s)
    pub unlock_period: u64,
}

impl Default for StakingConfig {
    fn default() -> Self {
        Self {
            reward_bps: 25,
            minimum_staking_period: 40_320,
            unlock_period: 5_760,
        }
    }
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("Allocations would exceed total supply")]
    ExceedsSupply,

    #[error("Invalid amount")]
    InvalidAmount,
}
