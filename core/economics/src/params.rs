// o2ul/core/economics/src/params.rs

//! Reserved system accounts. Token parameters live in the storage of these
//! accounts rather than in contracts.

use o2ul_execution::Address;

/// Value token (O2UL) parameters
pub const VALUE_TOKEN_SYSTEM_ADDRESS: Address = Address::system(0x1001);

/// UltraStable token parameters, supply counter and adjustment history
pub const ULTRASTABLE_SYSTEM_ADDRESS: Address = Address::system(0x1002);

/// Staking parameters
pub const STAKING_SYSTEM_ADDRESS: Address = Address::system(0x1003);

/// AI oracle operations
pub const ORACLE_SYSTEM_ADDRESS: Address = Address::system(0x1004);

/// Seigniorage operations
pub const SEIGNIORAGE_SYSTEM_ADDRESS: Address = Address::system(0x1005);

/// Governance operations
pub const GOVERNANCE_SYSTEM_ADDRESS: Address = Address::system(0x1006);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_addresses_are_sequential() {
        let all = [
            VALUE_TOKEN_SYSTEM_ADDRESS,
            ULTRASTABLE_SYSTEM_ADDRESS,
            STAKING_SYSTEM_ADDRESS,
            ORACLE_SYSTEM_ADDRESS,
            SEIGNIORAGE_SYSTEM_ADDRESS,
            GOVERNANCE_SYSTEM_ADDRESS,
        ];
        for (i, addr) in all.iter().enumerate() {
            assert_eq!(*addr, Address::system(0x1001 + i as u16));
        }
        assert_eq!(
            ULTRASTABLE_SYSTEM_ADDRESS.to_string(),
            "0x0000000000000000000000000000000000001002"
        );
    }
}
