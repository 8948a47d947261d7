// o2ul/core/execution/src/types.rs

// Types for representing addresses, storage keys and storage words
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Account address (20 bytes, similar to Ethereum)
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct Address(pub [u8; 20]);

impl Address {
    pub fn zero() -> Self {
        Address([0u8; 20])
    }

    /// Address of a reserved system account, `0x00..00<id>`
    pub const fn system(id: u16) -> Self {
        let mut bytes = [0u8; 20];
        let be = id.to_be_bytes();
        bytes[18] = be[0];
        bytes[19] = be[1];
        Address(bytes)
    }

    /// Get the underlying bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = WordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim_start_matches("0x").trim_start_matches("0X");
        let bytes = hex::decode(raw).map_err(|e| WordError::InvalidHex(e.to_string()))?;
        if bytes.len() != 20 {
            return Err(WordError::InvalidLength {
                expected: 20,
                actual: bytes.len(),
            });
        }
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&bytes);
        Ok(Address(addr))
    }
}

/// 32-byte storage key
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, PartialOrd, Ord,
)]
pub struct Hash([u8; 32]);

impl Hash {
    pub fn new(data: [u8; 32]) -> Self {
        Self(data)
    }

    /// Derive the storage key of a named slot: keccak256 of the UTF-8 name.
    pub fn from_key_name(name: &str) -> Self {
        Self(keccak256(name.as_bytes()))
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..8])
    }
}

pub(crate) fn keccak256(data: &[u8]) -> [u8; 32] {
    use sha3::{Digest, Keccak256};
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Errors decoding a storage word into a narrower type
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WordError {
    #[error("word does not fit in {0}")]
    OutOfRange(&'static str),

    #[error("invalid utf-8 in word")]
    InvalidUtf8,

    #[error("string of {0} bytes does not fit in a word")]
    TooLong(usize),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// 32-byte big-endian storage value.
///
/// Narrow values are right-aligned, the way an EVM storage slot holds them.
/// Signed integers use two's complement sign extension over the full word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Word(pub [u8; 32]);

impl Word {
    pub const ZERO: Word = Word([0u8; 32]);

    pub fn is_zero(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }

    pub fn from_u256(value: U256) -> Self {
        let mut bytes = [0u8; 32];
        value.to_big_endian(&mut bytes);
        Word(bytes)
    }

    pub fn to_u256(&self) -> U256 {
        U256::from_big_endian(&self.0)
    }

    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Word(bytes)
    }

    pub fn to_u64(&self) -> Result<u64, WordError> {
        if self.0[..24].iter().any(|&b| b != 0) {
            return Err(WordError::OutOfRange("u64"));
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[24..]);
        Ok(u64::from_be_bytes(buf))
    }

    pub fn from_i64(value: i64) -> Self {
        let fill = if value < 0 { 0xff } else { 0x00 };
        let mut bytes = [fill; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Word(bytes)
    }

    pub fn to_i64(&self) -> Result<i64, WordError> {
        let negative = self.0[24] & 0x80 != 0;
        let fill = if negative { 0xff } else { 0x00 };
        if self.0[..24].iter().any(|&b| b != fill) {
            return Err(WordError::OutOfRange("i64"));
        }
        let mut buf = [0u8; 8];
        buf.copy_from_slice(&self.0[24..]);
        Ok(i64::from_be_bytes(buf))
    }

    pub fn from_address(address: &Address) -> Self {
        let mut bytes = [0u8; 32];
        bytes[12..].copy_from_slice(&address.0);
        Word(bytes)
    }

    pub fn to_address(&self) -> Result<Address, WordError> {
        if self.0[..12].iter().any(|&b| b != 0) {
            return Err(WordError::OutOfRange("address"));
        }
        let mut addr = [0u8; 20];
        addr.copy_from_slice(&self.0[12..]);
        Ok(Address(addr))
    }

    pub fn from_short_str(value: &str) -> Result<Self, WordError> {
        let raw = value.as_bytes();
        if raw.len() > 32 {
            return Err(WordError::TooLong(raw.len()));
        }
        let mut bytes = [0u8; 32];
        bytes[32 - raw.len()..].copy_from_slice(raw);
        Ok(Word(bytes))
    }

    pub fn to_short_str(&self) -> Result<String, WordError> {
        let start = self.0.iter().position(|&b| b != 0).unwrap_or(32);
        String::from_utf8(self.0[start..].to_vec()).map_err(|_| WordError::InvalidUtf8)
    }
}

impl From<U256> for Word {
    fn from(value: U256) -> Self {
        Word::from_u256(value)
    }
}

/// Why a balance changed; carried through to ledger logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum BalanceChangeReason {
    GenesisInit = 0,
    StablecoinAdjustment = 1,
}

impl fmt::Display for BalanceChangeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BalanceChangeReason::GenesisInit => write!(f, "genesis_init"),
            BalanceChangeReason::StablecoinAdjustment => write!(f, "stablecoin_adjustment"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_system_address_layout() {
        let addr = Address::system(0x1002);
        assert_eq!(
            addr.to_string(),
            "0x0000000000000000000000000000000000001002"
        );
        assert_eq!(addr, "0x0000000000000000000000000000000000001002".parse().unwrap());
    }

    #[test]
    fn test_address_parse_rejects_bad_length() {
        let err = "0x1234".parse::<Address>().unwrap_err();
        assert_eq!(
            err,
            WordError::InvalidLength {
                expected: 20,
                actual: 2
            }
        );
        assert!("0xzz".parse::<Address>().is_err());
    }

    #[test]
    fn test_key_names_are_distinct() {
        // Keys that share a hex-looking prefix must still land in separate slots
        let a = Hash::from_key_name("adjustment_0_amount");
        let b = Hash::from_key_name("adjustment_0_deviation");
        let c = Hash::from_key_name("ultrastable_current_supply");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_eq!(a, Hash::from_key_name("adjustment_0_amount"));
    }

    #[test]
    fn test_keccak_of_empty_input() {
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_negative_word_sign_extends() {
        let word = Word::from_i64(-250);
        assert!(word.0[..24].iter().all(|&b| b == 0xff));
        assert_eq!(word.to_i64().unwrap(), -250);
        // Unsigned view of a negative word must not silently fit a u64
        assert_eq!(word.to_u64(), Err(WordError::OutOfRange("u64")));
    }

    #[test]
    fn test_wide_word_rejected_as_u64() {
        let word = Word::from_u256(U256::from(u64::MAX) + U256::one());
        assert!(word.to_u64().is_err());
        assert!(word.to_i64().is_err());
    }

    #[test]
    fn test_short_string_word() {
        let word = Word::from_short_str("UltraStable").unwrap();
        assert_eq!(word.0[31], b'e');
        assert_eq!(word.to_short_str().unwrap(), "UltraStable");
        assert_eq!(
            Word::from_short_str(&"x".repeat(33)),
            Err(WordError::TooLong(33))
        );
    }

    #[test]
    fn test_address_word() {
        let addr = Address([7u8; 20]);
        let word = Word::from_address(&addr);
        assert_eq!(word.to_address().unwrap(), addr);
        assert!(Word::from_u256(U256::MAX).to_address().is_err());
    }

    proptest! {
        #[test]
        fn prop_signed_words_preserve_value(v in any::<i64>()) {
            prop_assert_eq!(Word::from_i64(v).to_i64().unwrap(), v);
        }

        #[test]
        fn prop_u256_word_is_big_endian(hi in any::<u64>(), lo in any::<u64>()) {
            let value = (U256::from(hi) << 64) + U256::from(lo);
            let word = Word::from_u256(value);
            prop_assert_eq!(word.to_u256(), value);
            prop_assert!(word.0[..16].iter().all(|&b| b == 0));
        }
    }
}
