// Startup banner and chain summary
use o2ul_economics::{units, StableTokenConfig, ValueTokenConfig};
use primitive_types::U256;
use tracing::info;

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const CYAN: &str = "\x1b[36m";

const RULE_WIDTH: usize = 73;

const LOGO: [&str; 10] = [
    "╔═════════════════════════════════════════════════════╗",
    "║                                                     ║",
    "║          █████╗  ██████╗  ██╗   ██╗██╗              ║",
    "║         ██╔═══██╗╚════██╗ ██║   ██║██║              ║",
    "║         ██║   ██║ █████╔╝ ██║   ██║██║              ║",
    "║         ██║   ██║██╔═══╝  ██║   ██║██║              ║",
    "║         ╚██████╔╝███████╗ ╚██████╔╝███████╗         ║",
    "║          ╚═════╝ ╚══════╝  ╚═════╝ ╚══════╝         ║",
    "║                                                     ║",
    "╚═════════════════════════════════════════════════════╝",
];

/// Network name for the well-known chain IDs
pub fn network_name(chain_id: u64) -> &'static str {
    match chain_id {
        20213 => "mainnet",
        20214 => "testnet",
        20215 => "devnet",
        20216 => "stagenet",
        _ => "unknown",
    }
}

pub fn log_banner() {
    for line in LOGO {
        info!(" {}", line);
    }
    info!("");
    info!("               ORBIS OMNIRA UNITAS LEX");
    info!("               THE UNIVERSAL CURRENCY");
}

fn whole_tokens(amount: U256) -> U256 {
    amount / units(1)
}

/// Chain and token summary, one line per entry, without colour
pub fn chain_description_lines(
    chain_id: u64,
    version: &str,
    value: &ValueTokenConfig,
    stable: &StableTokenConfig,
) -> Vec<String> {
    let hours = stable.update_frequency_secs / 3600;
    vec![
        format!("Chain ID:     {}", chain_id),
        format!("Network:      {}", network_name(chain_id)),
        format!("Version:      {}", version),
        format!(
            "Value token:  {} ({}), max supply {}",
            value.name,
            value.symbol,
            whole_tokens(value.max_supply)
        ),
        format!(
            "Stable token: {} ({}), initial supply {}, minimum {}",
            stable.name,
            stable.symbol,
            whole_tokens(stable.initial_supply),
            whole_tokens(stable.minimum_supply)
        ),
        format!(
            "Stability:    {}-hour oracle updates over {} regions and {} timeframes",
            hours,
            stable.continental_weights.len(),
            stable.timeframe_weights.len()
        ),
    ]
}

pub fn log_chain_description(
    chain_id: u64,
    version: &str,
    value: &ValueTokenConfig,
    stable: &StableTokenConfig,
) {
    info!("{}", "─".repeat(RULE_WIDTH));
    for line in chain_description_lines(chain_id, version, value, stable) {
        info!(" {}", line);
    }
    info!("{}", "─".repeat(RULE_WIDTH));
}

/// Coloured summary for terminal output
pub fn chain_description(
    chain_id: u64,
    version: &str,
    value: &ValueTokenConfig,
    stable: &StableTokenConfig,
) -> String {
    let mut out = format!("{DIM}{}{RESET}\n", "─".repeat(RULE_WIDTH));
    out.push_str(&format!("{BOLD}{CYAN}Blockchain Information{RESET}\n"));
    for line in chain_description_lines(chain_id, version, value, stable) {
        match line.split_once(':') {
            Some((label, rest)) => {
                out.push_str(&format!("  {BOLD}{}:{RESET}{}\n", label, rest));
            }
            None => out.push_str(&format!("  {}\n", line)),
        }
    }
    out.push_str(&format!("{DIM}{}{RESET}", "─".repeat(RULE_WIDTH)));
    out
}
