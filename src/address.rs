//! Base58Check address encoding and output-script address derivation.
//!
//! Supports:
//! - P2SH (Pay to Script Hash) - addresses starting with 3 (mainnet) or 2 (testnet)
//! - P2PKH (Pay to Public Key Hash) - addresses starting with 1 (mainnet) or m/n (testnet)
//! - P2WPKH (Native SegWit v0) - bc1q.../tb1q...

use log::debug;
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{DecodingError, Result};
use crate::hash::{hash160, hash256};
use crate::script::{is_p2pkh, is_p2sh, is_p2wpkh};
use crate::types::Network;

/// A P2SH address together with the checksum that was appended to it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct P2shAddress {
    pub address: String,
    pub checksum: [u8; CHECKSUM_LEN],
}

/// True for the two P2SH version bytes the encoder accepts
pub fn is_valid_p2sh_prefix(prefix: u8) -> bool {
    prefix == P2SH_VERSION_MAINNET || prefix == P2SH_VERSION_TESTNET
}

/// First four bytes of HASH256(payload)
pub fn checksum(payload: &[u8]) -> [u8; CHECKSUM_LEN] {
    let mut out = [0u8; CHECKSUM_LEN];
    out.copy_from_slice(&hash256(payload)[..CHECKSUM_LEN]);
    out
}

/// Base58(payload ‖ checksum(payload))
pub fn base58check_encode(payload: &[u8]) -> String {
    let mut bytes = Vec::with_capacity(payload.len() + CHECKSUM_LEN);
    bytes.extend_from_slice(payload);
    bytes.extend_from_slice(&checksum(payload));
    bs58::encode(bytes).into_string()
}

/// Decode a Base58Check string into its version byte and body
pub fn decode_base58check(address: &str) -> Result<(u8, Vec<u8>)> {
    let decoded = bs58::decode(address.trim())
        .into_vec()
        .map_err(|e| DecodingError::InvalidBase58(e.to_string()))?;

    if decoded.len() < 1 + CHECKSUM_LEN {
        return Err(DecodingError::InvalidBase58(format!("too short: {} bytes", decoded.len())));
    }

    let (payload, check) = decoded.split_at(decoded.len() - CHECKSUM_LEN);
    if check != checksum(payload) {
        return Err(DecodingError::InvalidChecksum);
    }

    Ok((payload[0], payload[1..].to_vec()))
}

/// Encode a P2SH address from a version prefix and a 20-byte script hash
pub fn encode_p2sh(prefix: u8, script_hash: &[u8]) -> Result<P2shAddress> {
    if !is_valid_p2sh_prefix(prefix) {
        return Err(DecodingError::InvalidPrefix(prefix));
    }
    if script_hash.len() != HASH160_LEN {
        return Err(DecodingError::InvalidScriptHashLength(script_hash.len()));
    }

    let mut payload = Vec::with_capacity(1 + HASH160_LEN);
    payload.push(prefix);
    payload.extend_from_slice(script_hash);

    let address = base58check_encode(&payload);
    debug!("encoded P2SH address {} (prefix 0x{:02x})", address, prefix);
    Ok(P2shAddress { address, checksum: checksum(&payload) })
}

/// Encoder entry point for the UI: `None` whenever a precondition fails
pub fn encode_p2sh_address(prefix: u8, script_hash: &[u8]) -> Option<String> {
    encode_p2sh(prefix, script_hash).ok().map(|p2sh| p2sh.address)
}

/// P2SH address of a redeem script
pub fn p2sh_address_for_script(redeem_script: &[u8], network: Network) -> String {
    let mut payload = vec![network.p2sh_version()];
    payload.extend_from_slice(&hash160(redeem_script));
    base58check_encode(&payload)
}

/// Snapshot of the address-encoder form.
///
/// Derived fields are recomputed from scratch by [`AddressEncodingState::compute`]
/// and are `None` unless both inputs are valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressEncodingState {
    pub version_prefix: u8,
    pub script_hash: Vec<u8>,
    pub prefix_valid: bool,
    pub checksum: Option<[u8; CHECKSUM_LEN]>,
    pub address: Option<String>,
}

impl AddressEncodingState {
    /// Recompute the state from the raw form inputs.
    ///
    /// Invalid hex leaves `script_hash` empty.
    pub fn compute(version_prefix: u8, script_hash_hex: &str) -> Self {
        let script_hash = hex::decode(script_hash_hex.trim()).unwrap_or_default();
        match encode_p2sh(version_prefix, &script_hash) {
            Ok(p2sh) => Self {
                version_prefix,
                script_hash,
                prefix_valid: true,
                checksum: Some(p2sh.checksum),
                address: Some(p2sh.address),
            },
            Err(_) => Self {
                version_prefix,
                script_hash,
                prefix_valid: is_valid_p2sh_prefix(version_prefix),
                checksum: None,
                address: None,
            },
        }
    }

    pub fn checksum_hex(&self) -> Option<String> {
        self.checksum.map(hex::encode)
    }
}

/// Address for an output script, if its template has one.
///
/// Only P2PKH, P2SH and P2WPKH outputs produce an address.
pub fn address_from_script(script_pubkey: &[u8], network: Network) -> Option<String> {
    if is_p2pkh(script_pubkey) {
        let mut payload = vec![network.p2pkh_version()];
        payload.extend_from_slice(&script_pubkey[3..23]);
        Some(base58check_encode(&payload))
    } else if is_p2sh(script_pubkey) {
        let mut payload = vec![network.p2sh_version()];
        payload.extend_from_slice(&script_pubkey[2..22]);
        Some(base58check_encode(&payload))
    } else if is_p2wpkh(script_pubkey) {
        Some(bech32_encode_segwit_v0(network.bech32_hrp(), &script_pubkey[2..]))
    } else {
        None
    }
}

// ============================================================================
// Bech32 encoding (BIP-173, witness version 0)
// ============================================================================

const BECH32_CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Encode a witness v0 program as a bech32 address
pub fn bech32_encode_segwit_v0(hrp: &str, program: &[u8]) -> String {
    let mut data = vec![0u8];
    data.extend(convert_bits(program, 8, 5));

    let mut values = hrp_expand(hrp);
    values.extend_from_slice(&data);
    values.extend_from_slice(&[0u8; 6]);
    let polymod = bech32_polymod(&values) ^ 1;

    let mut address = String::with_capacity(hrp.len() + 1 + data.len() + 6);
    address.push_str(hrp);
    address.push('1');
    for value in data {
        address.push(BECH32_CHARSET[value as usize] as char);
    }
    for i in 0..6 {
        let value = (polymod >> (5 * (5 - i))) & 31;
        address.push(BECH32_CHARSET[value as usize] as char);
    }
    address
}

fn hrp_expand(hrp: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(hrp.len() * 2 + 1);
    result.extend(hrp.bytes().map(|c| c >> 5));
    result.push(0);
    result.extend(hrp.bytes().map(|c| c & 31));
    result
}

fn bech32_polymod(values: &[u8]) -> u32 {
    const GEN: [u32; 5] = [0x3b6a57b2, 0x26508e6d, 0x1ea119fa, 0x3d4233dd, 0x2a1462b3];

    let mut chk: u32 = 1;
    for &value in values {
        let top = chk >> 25;
        chk = ((chk & 0x1ffffff) << 5) ^ (value as u32);
        for (i, &g) in GEN.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }
    chk
}

/// Regroup bits with padding; input values must fit in `from_bits`
fn convert_bits(data: &[u8], from_bits: u32, to_bits: u32) -> Vec<u8> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let mut result = Vec::with_capacity(data.len() * from_bits as usize / to_bits as usize + 1);
    let max_value = (1u32 << to_bits) - 1;

    for &value in data {
        acc = (acc << from_bits) | value as u32;
        bits += from_bits;
        while bits >= to_bits {
            bits -= to_bits;
            result.push(((acc >> bits) & max_value) as u8);
        }
    }
    if bits > 0 {
        result.push(((acc << (to_bits - bits)) & max_value) as u8);
    }
    result
}
