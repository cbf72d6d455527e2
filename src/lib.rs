//! # Decoding Bitcoin
//!
//! The computational core of an interactive Bitcoin teaching site.
//!
//! This crate provides small, deterministic functions that expose how Bitcoin
//! data is built and taken apart: hashing, Base58Check address encoding, raw
//! transaction decoding with Script disassembly, and a toy stack machine for
//! experimenting with opcodes.
//!
//! ## Architecture
//!
//! - Hashing and wire primitives (`hash`, `wire`)
//! - Script disassembly and classification (`opcodes`, `script`)
//! - Address encoding (`address`)
//! - Transaction decoding and size accounting (`transaction`, `segwit`)
//! - The Script simulator (`stack`)
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: decoding and encoding never touch global state
//! 2. **Fail Fast**: malformed input is rejected with a typed error, never a partial result
//! 3. **In-band Simulator Errors**: a failing opcode leaves a visible marker instead of aborting
//! 4. **Exact Version Pinning**: hashing and signature crates are pinned to exact versions
//!
//! ## Usage
//!
//! ```rust
//! use decoding_bitcoin::DecodingBitcoin;
//!
//! let site = DecodingBitcoin::new();
//! let address = site.encode_p2sh_address(0x05, &[0u8; 20]).unwrap();
//! assert_eq!(address, "31h1vYVSYuKP6AhS86fbRdMw9XHieotbST");
//! ```

pub mod types;
pub mod constants;
pub mod error;
pub mod hash;
pub mod wire;
pub mod opcodes;
pub mod script;
pub mod address;
pub mod transaction;
pub mod segwit;
pub mod stack;

// Re-export commonly used types
pub use types::*;
pub use constants::*;
pub use error::{DecodingError, Result, StackError};
pub use stack::{StackItem, StackSession};

/// Entry point for the site's decoders and simulator
///
/// # Examples
///
/// ```
/// use decoding_bitcoin::DecodingBitcoin;
/// use decoding_bitcoin::ScriptClass;
///
/// let site = DecodingBitcoin::new();
///
/// // Bitcoin's first person-to-person transaction (block 170)
/// let raw = "0100000001c997a5e56e104102fa209c6a852dd90660a20b2d9c352423edce25857fcd3704000000004847304402204e45e16932b8af514961a1d3a1a25fdf3f4f7732e9d624c6c61548ab5fb8cd410220181522ec8eca07de4860a4acdd12909d831cc56cbbac4622082221a8768d1d0901ffffffff0200ca9a3b00000000434104ae1a62fe09c5f51b13905f07f06b99a2f7159b2225f374cd378d71302fa28414e7aab37397f554a7df5f142c21c1b7303b8a0626f1baded5c72a704f7e6cd84cac00286bee0000000043410411db93e1dcdb8a016b49840f8c53bc1eb68a382e97b1482ecad7b148a6909a5cb2e0eaddfb84ccf9744464f82e160bfa9b8b64f9d4c03f999b8643f656b412a3ac00000000";
///
/// let tx = site.decode_transaction(raw).unwrap();
/// assert_eq!(tx.txid, "f4184fc596403b9d638783cf57adfe4c75c605f6356fbc91338530e9831e9e16");
/// assert_eq!(tx.outputs.len(), 2);
/// assert_eq!(tx.outputs[0].value_btc, "10.00000000");
/// assert_eq!(tx.outputs[0].script_pubkey.classification, ScriptClass::P2PK);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodingBitcoin {
    network: Network,
}

impl DecodingBitcoin {
    /// Create an instance that derives mainnet addresses
    ///
    /// # Examples
    ///
    /// ```
    /// use decoding_bitcoin::{DecodingBitcoin, Network};
    ///
    /// let site = DecodingBitcoin::new();
    /// assert_eq!(site.network(), Network::Mainnet);
    /// ```
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an instance for a specific network
    pub fn with_network(network: Network) -> Self {
        Self { network }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Decode a raw transaction hex string
    ///
    /// # Examples
    ///
    /// ```
    /// use decoding_bitcoin::{DecodingBitcoin, DecodingError};
    ///
    /// let site = DecodingBitcoin::new();
    /// assert!(matches!(site.decode_transaction("zz"), Err(DecodingError::InvalidHex(_))));
    /// ```
    pub fn decode_transaction(&self, raw_tx_hex: &str) -> Result<DecodedTransaction> {
        transaction::decode_transaction(raw_tx_hex, self.network)
    }

    /// Encode a 20-byte script hash as a P2SH address.
    ///
    /// Returns `None` for an unknown prefix or a hash of the wrong length.
    ///
    /// # Examples
    ///
    /// ```
    /// use decoding_bitcoin::DecodingBitcoin;
    ///
    /// let site = DecodingBitcoin::new();
    /// assert!(site.encode_p2sh_address(0x00, &[0u8; 20]).is_none());
    /// assert!(site.encode_p2sh_address(0xc4, &[0u8; 20]).unwrap().starts_with('2'));
    /// ```
    pub fn encode_p2sh_address(&self, prefix: u8, script_hash: &[u8]) -> Option<String> {
        address::encode_p2sh_address(prefix, script_hash)
    }

    /// Form state for the address-encoding widget
    pub fn address_encoding_state(&self, prefix: u8, script_hash_hex: &str) -> address::AddressEncodingState {
        address::AddressEncodingState::compute(prefix, script_hash_hex)
    }

    /// Disassemble and classify a script
    ///
    /// # Examples
    ///
    /// ```
    /// use decoding_bitcoin::{DecodingBitcoin, ScriptClass};
    ///
    /// let site = DecodingBitcoin::new();
    /// let script = site.decode_script(&[0x00, 0x14].iter().copied().chain([0u8; 20]).collect::<Vec<_>>());
    /// assert_eq!(script.classification, ScriptClass::P2WPKH);
    /// assert_eq!(script.asm_tokens[0], "OP_0");
    /// ```
    pub fn decode_script(&self, bytes: &[u8]) -> DecodedScript {
        script::decode_script(bytes)
    }

    /// Start a fresh simulator session
    ///
    /// # Examples
    ///
    /// ```
    /// use decoding_bitcoin::DecodingBitcoin;
    ///
    /// let mut session = DecodingBitcoin::new().stack_session();
    /// session.push("5");
    /// session.push("3");
    /// session.execute("OP_ADD");
    /// assert_eq!(session.display(), vec!["8"]);
    /// ```
    pub fn stack_session(&self) -> StackSession {
        StackSession::new()
    }
}
