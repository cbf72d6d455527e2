//! Core types: the parsed wire transaction and its decoded display view

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::*;

/// Hash type: 256-bit hash
pub type Hash = [u8; 32];

/// Byte string type
pub type ByteString = Vec<u8>;

/// Witness stack of a single input
pub type Witness = Vec<ByteString>;

/// Previous output reference, hash kept in wire order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OutPoint {
    pub hash: Hash,
    pub index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionInput {
    pub prevout: OutPoint,
    pub script_sig: ByteString,
    pub sequence: u32,
    pub witness: Witness,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionOutput {
    pub value: u64,
    pub script_pubkey: ByteString,
}

/// A transaction as read off the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub version: i32,
    pub inputs: Vec<TransactionInput>,
    pub outputs: Vec<TransactionOutput>,
    pub lock_time: u32,
}

impl Transaction {
    /// True when any input carries witness data
    pub fn has_witness(&self) -> bool {
        self.inputs.iter().any(|input| !input.witness.is_empty())
    }
}

/// Network selecting address version bytes and bech32 prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Network {
    #[default]
    Mainnet,
    Testnet,
}

impl Network {
    pub fn p2pkh_version(&self) -> u8 {
        match self {
            Network::Mainnet => P2PKH_VERSION_MAINNET,
            Network::Testnet => P2PKH_VERSION_TESTNET,
        }
    }

    pub fn p2sh_version(&self) -> u8 {
        match self {
            Network::Mainnet => P2SH_VERSION_MAINNET,
            Network::Testnet => P2SH_VERSION_TESTNET,
        }
    }

    /// Bech32 human-readable part
    pub fn bech32_hrp(&self) -> &'static str {
        match self {
            Network::Mainnet => "bc",
            Network::Testnet => "tb",
        }
    }

    /// Parse network from string.
    pub fn from_name(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Some(Network::Mainnet),
            "testnet" | "test" | "testnet3" | "testnet4" | "signet" => Some(Network::Testnet),
            _ => None,
        }
    }
}

/// Output script template
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScriptClass {
    P2PK,
    P2PKH,
    P2MS,
    P2WPKH,
    P2SH,
    #[serde(rename = "nonstandard")]
    NonStandard,
}

impl ScriptClass {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptClass::P2PK => "P2PK",
            ScriptClass::P2PKH => "P2PKH",
            ScriptClass::P2MS => "P2MS",
            ScriptClass::P2WPKH => "P2WPKH",
            ScriptClass::P2SH => "P2SH",
            ScriptClass::NonStandard => "nonstandard",
        }
    }
}

impl fmt::Display for ScriptClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Disassembled and classified script
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedScript {
    pub asm_tokens: Vec<String>,
    pub raw_hex: String,
    pub classification: ScriptClass,
}

impl DecodedScript {
    /// Tokens joined with single spaces
    pub fn asm(&self) -> String {
        self.asm_tokens.join(" ")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedInput {
    /// Previous txid in display (reversed) order
    pub previous_txid: String,
    pub output_index: u32,
    pub script_sig: DecodedScript,
    pub sequence: u32,
    /// Hex-encoded witness items, empty for legacy inputs
    pub witness: Vec<String>,
    pub is_coinbase: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedOutput {
    pub value_satoshis: u64,
    /// Fixed 8-decimal BTC amount
    pub value_btc: String,
    pub output_index: u32,
    pub script_pubkey: DecodedScript,
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecodedTransaction {
    pub txid: String,
    pub wtxid: String,
    pub version: i32,
    pub locktime: u32,
    pub inputs: Vec<DecodedInput>,
    pub outputs: Vec<DecodedOutput>,
    pub is_segwit: bool,
    pub size: usize,
    pub vsize: usize,
    pub weight: usize,
}

impl DecodedTransaction {
    /// Sum of all output values in satoshis
    pub fn total_output_value(&self) -> u64 {
        self.outputs
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.value_satoshis))
    }
}
