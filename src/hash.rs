//! Hashing primitives shared by the decoder, encoder and simulator

use bitcoin_hashes::{sha256d, Hash as BitcoinHash};
use ripemd::Ripemd160;
use sha2::{Digest, Sha256};

use crate::types::Hash;

/// Single SHA256 hash.
pub fn sha256(data: &[u8]) -> Hash {
    let mut hash = [0u8; 32];
    hash.copy_from_slice(&Sha256::digest(data));
    hash
}

/// RIPEMD160 hash.
pub fn ripemd160(data: &[u8]) -> [u8; 20] {
    let mut hash = [0u8; 20];
    hash.copy_from_slice(&Ripemd160::digest(data));
    hash
}

/// HASH160: RIPEMD160(SHA256(x))
///
/// Used for P2PKH/P2SH/P2WPKH commitments and by the simulator's `HASH160`.
pub fn hash160(data: &[u8]) -> [u8; 20] {
    ripemd160(&sha256(data))
}

/// HASH256: SHA256(SHA256(x))
///
/// Used for txids and Base58Check checksums.
pub fn hash256(data: &[u8]) -> Hash {
    sha256d::Hash::hash(data).into_inner()
}

/// Reverse a hash into the byte order block explorers display
pub fn to_display_hex(hash: &Hash) -> String {
    let mut reversed = *hash;
    reversed.reverse();
    hex::encode(reversed)
}
