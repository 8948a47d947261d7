use o2ul_economics::params::SEIGNIORAGE_SYSTEM_ADDRESS;
use o2ul_economics::{PegBandConfig, StableTokenConfig, UltraStableConfig};
use o2ul_execution::Address;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Devnet chain ID, used unless `O2UL_CHAIN_ID` says otherwise
pub const DEFAULT_CHAIN_ID: u64 = 20215;

/// Node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Chain configuration
    pub chain: ChainConfig,

    /// Genesis accounts
    #[serde(default)]
    pub genesis: GenesisSettings,

    /// UltraStable scheduler and peg controller
    #[serde(default)]
    pub ultrastable: UltraStableSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    /// Chain ID
    pub chain_id: u64,
}

/// Accounts funded at genesis, as 0x-prefixed hex addresses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenesisSettings {
    pub founder: String,
    pub reserve: String,
    /// Counterparty of supply adjustments; must hold value tokens to fund
    /// expansions, so it defaults to the reserve
    pub treasury: String,
    /// Fixed genesis time in unix seconds; the current time when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
}

impl Default for GenesisSettings {
    fn default() -> Self {
        Self {
            founder: Address::system(0x2001).to_string(),
            reserve: Address::system(0x2002).to_string(),
            treasury: Address::system(0x2002).to_string(),
            timestamp: None,
        }
    }
}

impl GenesisSettings {
    pub fn founder_address(&self) -> anyhow::Result<Address> {
        parse_address("genesis.founder", &self.founder)
    }

    pub fn reserve_address(&self) -> anyhow::Result<Address> {
        parse_address("genesis.reserve", &self.reserve)
    }

    pub fn treasury_address(&self) -> anyhow::Result<Address> {
        parse_address("genesis.treasury", &self.treasury)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UltraStableSettings {
    /// Scheduler tick in seconds
    #[serde(default = "default_update_interval")]
    pub update_interval_secs: u64,

    /// Bound on the oracle refresh opening each tick, in seconds
    #[serde(default = "default_oracle_timeout")]
    pub oracle_timeout_secs: u64,

    /// Overrides the treasury recorded at genesis
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub treasury: Option<String>,

    /// Per-subscriber event buffer
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,

    /// Deviation tolerated before any adjustment, in basis points
    #[serde(default = "default_deadband")]
    pub deadband_bps: u64,

    /// Largest single adjustment, in basis points of supply
    #[serde(default = "default_max_step")]
    pub max_step_bps: u64,
}

fn default_update_interval() -> u64 {
    60
}

fn default_oracle_timeout() -> u64 {
    30
}

fn default_event_capacity() -> usize {
    256
}

fn default_deadband() -> u64 {
    50
}

fn default_max_step() -> u64 {
    500
}

impl Default for UltraStableSettings {
    fn default() -> Self {
        Self {
            update_interval_secs: default_update_interval(),
            oracle_timeout_secs: default_oracle_timeout(),
            treasury: None,
            event_capacity: default_event_capacity(),
            deadband_bps: default_deadband(),
            max_step_bps: default_max_step(),
        }
    }
}

impl UltraStableSettings {
    pub fn manager_config(&self) -> anyhow::Result<UltraStableConfig> {
        let treasury = self
            .treasury
            .as_deref()
            .map(|t| parse_address("ultrastable.treasury", t))
            .transpose()?;

        Ok(UltraStableConfig {
            update_interval: Duration::from_secs(self.update_interval_secs),
            oracle_timeout: Duration::from_secs(self.oracle_timeout_secs),
            treasury,
            event_capacity: self.event_capacity,
        })
    }

    pub fn peg_band(&self, stable: StableTokenConfig) -> PegBandConfig {
        PegBandConfig {
            deadband_bps: self.deadband_bps,
            max_step_bps: self.max_step_bps,
            stable,
        }
    }
}

fn parse_address(field: &str, value: &str) -> anyhow::Result<Address> {
    value
        .parse::<Address>()
        .map_err(|e| anyhow::anyhow!("Invalid address in {}: {}", field, e))
}

impl Default for NodeConfig {
    fn default() -> Self {
        // Chain ID can come from the environment, default devnet
        let chain_id = std::env::var("O2UL_CHAIN_ID")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_CHAIN_ID);

        Self {
            chain: ChainConfig { chain_id },
            genesis: GenesisSettings::default(),
            ultrastable: UltraStableSettings::default(),
        }
    }
}

impl NodeConfig {
    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), String> {
        for (field, value) in [
            ("genesis.founder", &self.genesis.founder),
            ("genesis.reserve", &self.genesis.reserve),
            ("genesis.treasury", &self.genesis.treasury),
        ] {
            parse_address(field, value).map_err(|e| e.to_string())?;
        }
        if let Some(treasury) = &self.ultrastable.treasury {
            let address =
                parse_address("ultrastable.treasury", treasury).map_err(|e| e.to_string())?;
            if address == SEIGNIORAGE_SYSTEM_ADDRESS || address.is_zero() {
                return Err(format!("ultrastable.treasury cannot be {}", address));
            }
        }
        if self.ultrastable.update_interval_secs == 0 {
            return Err("ultrastable.update_interval_secs must be positive".to_string());
        }
        if self.ultrastable.oracle_timeout_secs == 0 {
            return Err("ultrastable.oracle_timeout_secs must be positive".to_string());
        }
        if self.ultrastable.deadband_bps >= 10_000 || self.ultrastable.max_step_bps > 10_000 {
            return Err("ultrastable basis points must stay below 10000".to_string());
        }
        Ok(())
    }

    /// Create devnet configuration with a fast scheduler
    /// Chain ID can be overridden via O2UL_CHAIN_ID environment variable
    pub fn devnet() -> Self {
        let mut config = Self::default();
        config.ultrastable.update_interval_secs = 10;
        config
    }

    /// Load from file
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: NodeConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save to file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
