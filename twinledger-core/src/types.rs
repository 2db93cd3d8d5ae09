use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

use crate::error::{LedgerError, Result};

/// Token identifiers are plain sequential integers, assigned by the minting
/// contract.
pub type TokenId = u64;

/// Game identifiers are chosen by the players; any value works, including
/// ids of games that were never touched (reads return the default record).
pub type GameId = u64;

/// Parse a 32-byte value from a hex string, with or without a `0x` prefix.
pub fn parse_hex32(s: &str) -> Result<[u8; 32]> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|_| LedgerError::InvalidHex(s.to_string()))?;
    if bytes.len() != 32 {
        return Err(LedgerError::InvalidHex(s.to_string()));
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}

/// 32-byte account or contract address. The zero address means "unset",
/// matching contract storage defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(pub [u8; 32]);

impl Address {
    pub const ZERO: Address = Address([0u8; 32]);

    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }

    /// Fresh random address for a new account or contract deployment.
    pub fn random() -> Self {
        let mut bytes = [0u8; 32];
        rand::RngCore::fill_bytes(&mut rand::thread_rng(), &mut bytes);
        Address(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        parse_hex32(s)
            .map(Address)
            .map_err(|_| LedgerError::InvalidAddress(s.to_string()))
    }

    /// Abbreviated form for table output.
    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}..{}", &full[..6], &full[full.len() - 6..])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Address {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        Address::from_hex(s)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Address::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// One element of a cross-layer message payload. Payloads carry addresses
/// and token ids as 32-byte words, big-endian for integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Word(pub [u8; 32]);

impl Word {
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn as_address(&self) -> Address {
        Address(self.0)
    }

    /// Returns `None` when the word does not fit in a `u64`.
    pub fn as_u64(&self) -> Option<u64> {
        if self.0[..24].iter().any(|b| *b != 0) {
            return None;
        }
        let mut tail = [0u8; 8];
        tail.copy_from_slice(&self.0[24..]);
        Some(u64::from_be_bytes(tail))
    }
}

impl From<Address> for Word {
    fn from(addr: Address) -> Self {
        Word(addr.0)
    }
}

impl From<u64> for Word {
    fn from(value: u64) -> Self {
        let mut bytes = [0u8; 32];
        bytes[24..].copy_from_slice(&value.to_be_bytes());
        Word(bytes)
    }
}

impl fmt::Display for Word {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl Serialize for Word {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Word {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        parse_hex32(&s).map(Word).map_err(serde::de::Error::custom)
    }
}

/// Transaction hash, derived from the invocation label and a per-network
/// nonce rather than from real signed transaction bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHash(pub [u8; 32]);

impl TxHash {
    pub fn digest(parts: &[&[u8]]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part);
        }
        TxHash(hasher.finalize().into())
    }

    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        parse_hex32(s).map(TxHash)
    }

    pub fn short(&self) -> String {
        let full = hex::encode(self.0);
        format!("0x{}..{}", &full[..6], &full[full.len() - 6..])
    }
}

impl fmt::Display for TxHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for TxHash {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        TxHash::from_hex(s)
    }
}

impl Serialize for TxHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for TxHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TxHash::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Which of the two ledgers an invocation executed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    L1,
    L2,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::L1 => "l1",
            Layer::L2 => "l2",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "l1" | "L1" => Ok(Layer::L1),
            "l2" | "L2" => Ok(Layer::L2),
            other => Err(LedgerError::config(format!("unknown layer: {}", other))),
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Pending,
    AcceptedOnL1,
    AcceptedOnL2,
    Rejected,
}

impl TxStatus {
    pub fn is_final(&self) -> bool {
        !matches!(self, TxStatus::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Pending => "pending",
            TxStatus::AcceptedOnL1 => "accepted_on_l1",
            TxStatus::AcceptedOnL2 => "accepted_on_l2",
            TxStatus::Rejected => "rejected",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(TxStatus::Pending),
            "accepted_on_l1" => Ok(TxStatus::AcceptedOnL1),
            "accepted_on_l2" => Ok(TxStatus::AcceptedOnL2),
            "rejected" => Ok(TxStatus::Rejected),
            other => Err(LedgerError::internal(format!("unknown tx status: {}", other))),
        }
    }
}

impl fmt::Display for TxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxReceipt {
    pub hash: TxHash,
    pub layer: Layer,
    pub status: TxStatus,
    pub block: Option<u64>,
    pub reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl TxReceipt {
    pub fn pending(hash: TxHash, layer: Layer) -> Self {
        Self {
            hash,
            layer,
            status: TxStatus::Pending,
            block: None,
            reason: None,
            timestamp: Utc::now(),
        }
    }

    pub fn rejected(hash: TxHash, layer: Layer, reason: impl Into<String>) -> Self {
        Self {
            hash,
            layer,
            status: TxStatus::Rejected,
            block: None,
            reason: Some(reason.into()),
            timestamp: Utc::now(),
        }
    }
}

/// Named devnet instance. Every persisted row and the deployment artifacts
/// are keyed by the network name, so several devnets can share a data dir.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Network {
    Devnet,
    Testnet,
    Custom(String),
}

impl Network {
    pub fn as_str(&self) -> &str {
        match self {
            Network::Devnet => "devnet",
            Network::Testnet => "testnet",
            Network::Custom(name) => name,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Network {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "" => Err(LedgerError::config("network name cannot be empty")),
            "devnet" => Ok(Network::Devnet),
            "testnet" => Ok(Network::Testnet),
            other => Ok(Network::Custom(other.to_string())),
        }
    }
}
