//! Protocol constants used by the decoder, encoder and simulator

/// Satoshis per BTC
pub const SATOSHIS_PER_BTC: u64 = 100_000_000;

/// P2PKH version byte (mainnet)
pub const P2PKH_VERSION_MAINNET: u8 = 0x00;

/// P2PKH version byte (testnet)
pub const P2PKH_VERSION_TESTNET: u8 = 0x6f;

/// P2SH version byte (mainnet), addresses start with `3`
pub const P2SH_VERSION_MAINNET: u8 = 0x05;

/// P2SH version byte (testnet), addresses start with `2`
pub const P2SH_VERSION_TESTNET: u8 = 0xc4;

/// Length of a HASH160 digest
pub const HASH160_LEN: usize = 20;

/// Length of a Base58Check checksum
pub const CHECKSUM_LEN: usize = 4;

/// Message signed over by the simulator's CHECKSIG family.
pub const PLACEHOLDER_MESSAGE: &[u8] = b"message to sign";

/// Maximum number of public keys in a bare multisig script
pub const MAX_PUBKEYS_PER_MULTISIG: usize = 16;

/// Maximum count accepted by the simulator's CHECKMULTISIG
pub const MAX_SIMULATOR_MULTISIG_COUNT: usize = 20;

/// Segwit marker and flag bytes following the version
pub const SEGWIT_MARKER: u8 = 0x00;
pub const SEGWIT_FLAG: u8 = 0x01;

/// Witness scale factor used for weight/vsize
pub const WITNESS_SCALE_FACTOR: usize = 4;

/// Previous-output index used by coinbase inputs
pub const COINBASE_OUTPUT_INDEX: u32 = 0xffffffff;

// Opcode bytes referenced by templates and disassembly
pub const OP_0: u8 = 0x00;
pub const OP_PUSHBYTES_MAX: u8 = 0x4b;
pub const OP_PUSHDATA1: u8 = 0x4c;
pub const OP_PUSHDATA2: u8 = 0x4d;
pub const OP_PUSHDATA4: u8 = 0x4e;
pub const OP_1NEGATE: u8 = 0x4f;
pub const OP_1: u8 = 0x51;
pub const OP_16: u8 = 0x60;
pub const OP_DUP: u8 = 0x76;
pub const OP_EQUAL: u8 = 0x87;
pub const OP_EQUALVERIFY: u8 = 0x88;
pub const OP_HASH160: u8 = 0xa9;
pub const OP_CHECKSIG: u8 = 0xac;
pub const OP_CHECKMULTISIG: u8 = 0xae;
