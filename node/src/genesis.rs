use crate::config::NodeConfig;
use o2ul_economics::genesis::{self, GenesisAccounts, GenesisReport};
use o2ul_economics::{StableTokenConfig, StakingConfig, ValueTokenConfig};
use o2ul_execution::StateDB;
use std::sync::Arc;
use tracing::info;

/// Freshly seeded in-memory chain state
pub struct Bootstrap {
    pub state: Arc<StateDB>,
    pub report: GenesisReport,
}

/// Build a new `StateDB` and run every genesis seeder against it
pub fn bootstrap(config: &NodeConfig, now: u64) -> anyhow::Result<Bootstrap> {
    let accounts = GenesisAccounts {
        founder: config.genesis.founder_address()?,
        reserve: config.genesis.reserve_address()?,
        treasury: config.genesis.treasury_address()?,
    };
    let genesis_time = config.genesis.timestamp.unwrap_or(now);

    let state = Arc::new(StateDB::new());
    let report = genesis::initialize(
        state.as_ref(),
        accounts,
        &ValueTokenConfig::default(),
        &StableTokenConfig::default(),
        &StakingConfig::default(),
        genesis_time,
    )?;
    let root = state.commit();

    info!(
        chain_id = config.chain.chain_id,
        state_root = %root,
        treasury = %report.treasury,
        "Genesis state initialized"
    );
    Ok(Bootstrap { state, report })
}
