//! Raw transaction parsing and the decoded display view

use log::debug;

use crate::address::address_from_script;
use crate::constants::*;
use crate::error::{DecodingError, Result};
use crate::hash::{hash256, to_display_hex};
use crate::script::decode_script;
use crate::segwit;
use crate::types::*;
use crate::wire::{encode_var_bytes, encode_varint, Reader};

/// Smallest possible serialized input: outpoint, empty script, sequence
const MIN_INPUT_SIZE: usize = 32 + 4 + 1 + 4;

/// Smallest possible serialized output: value and empty script
const MIN_OUTPUT_SIZE: usize = 8 + 1;

/// Parse a serialized transaction.
///
/// Accepts the legacy layout and the BIP-144 witness layout. The whole buffer
/// must be consumed.
pub fn parse_transaction(bytes: &[u8]) -> Result<Transaction> {
    let mut reader = Reader::new(bytes);

    let version = reader.read_i32_le()?;

    let has_witness = reader.peek(2) == Some(&[SEGWIT_MARKER, SEGWIT_FLAG][..]);
    if has_witness {
        reader.read_bytes(2)?;
    }

    let input_count = reader.read_count(MIN_INPUT_SIZE)?;
    let mut inputs = Vec::with_capacity(input_count);
    for _ in 0..input_count {
        let hash = reader.read_hash()?;
        let index = reader.read_u32_le()?;
        let script_sig = reader.read_var_bytes()?.to_vec();
        let sequence = reader.read_u32_le()?;
        inputs.push(TransactionInput {
            prevout: OutPoint { hash, index },
            script_sig,
            sequence,
            witness: Vec::new(),
        });
    }

    let output_count = reader.read_count(MIN_OUTPUT_SIZE)?;
    let mut outputs = Vec::with_capacity(output_count);
    for _ in 0..output_count {
        let value = reader.read_u64_le()?;
        let script_pubkey = reader.read_var_bytes()?.to_vec();
        outputs.push(TransactionOutput { value, script_pubkey });
    }

    if has_witness {
        for input in inputs.iter_mut() {
            let item_count = reader.read_count(1)?;
            let mut witness = Vec::with_capacity(item_count);
            for _ in 0..item_count {
                witness.push(reader.read_var_bytes()?.to_vec());
            }
            input.witness = witness;
        }
        // Marker and flag with nothing but empty stacks behind them
        if inputs.iter().all(|input| input.witness.is_empty()) {
            return Err(DecodingError::SuperfluousWitness);
        }
    }

    let lock_time = reader.read_u32_le()?;

    if reader.remaining() > 0 {
        return Err(DecodingError::TrailingBytes(reader.remaining()));
    }

    Ok(Transaction { version, inputs, outputs, lock_time })
}

/// Serialize a transaction, optionally in the witness layout
pub fn serialize_transaction(tx: &Transaction, include_witness: bool) -> Vec<u8> {
    let include_witness = include_witness && tx.has_witness();
    let mut data = Vec::new();

    // Version (4 bytes, little-endian)
    data.extend_from_slice(&tx.version.to_le_bytes());

    if include_witness {
        data.push(SEGWIT_MARKER);
        data.push(SEGWIT_FLAG);
    }

    encode_varint(tx.inputs.len() as u64, &mut data);
    for input in &tx.inputs {
        data.extend_from_slice(&input.prevout.hash);
        data.extend_from_slice(&input.prevout.index.to_le_bytes());
        encode_var_bytes(&input.script_sig, &mut data);
        data.extend_from_slice(&input.sequence.to_le_bytes());
    }

    encode_varint(tx.outputs.len() as u64, &mut data);
    for output in &tx.outputs {
        data.extend_from_slice(&output.value.to_le_bytes());
        encode_var_bytes(&output.script_pubkey, &mut data);
    }

    if include_witness {
        for input in &tx.inputs {
            encode_varint(input.witness.len() as u64, &mut data);
            for item in &input.witness {
                encode_var_bytes(item, &mut data);
            }
        }
    }

    // Lock time (4 bytes, little-endian)
    data.extend_from_slice(&tx.lock_time.to_le_bytes());
    data
}

/// HASH256 of the non-witness serialization, in wire order
pub fn compute_txid(tx: &Transaction) -> Hash {
    hash256(&serialize_transaction(tx, false))
}

/// Check if transaction is coinbase
pub fn is_coinbase(tx: &Transaction) -> bool {
    tx.inputs.len() == 1 && is_coinbase_outpoint(&tx.inputs[0].prevout)
}

fn is_coinbase_outpoint(prevout: &OutPoint) -> bool {
    prevout.hash == [0u8; 32] && prevout.index == COINBASE_OUTPUT_INDEX
}

/// Render satoshis as BTC with exactly eight decimals
pub fn format_btc(satoshis: u64) -> String {
    format!("{}.{:08}", satoshis / SATOSHIS_PER_BTC, satoshis % SATOSHIS_PER_BTC)
}

/// Decode a raw transaction hex string into its display structure.
///
/// Fails on the first malformation; no partial result is produced.
pub fn decode_transaction(raw_tx_hex: &str, network: Network) -> Result<DecodedTransaction> {
    let bytes = hex::decode(raw_tx_hex.trim())?;
    let tx = parse_transaction(&bytes).map_err(|e| {
        debug!("transaction decode failed: {}", e);
        e
    })?;

    let coinbase = is_coinbase(&tx);
    let inputs = tx
        .inputs
        .iter()
        .map(|input| DecodedInput {
            previous_txid: to_display_hex(&input.prevout.hash),
            output_index: input.prevout.index,
            script_sig: decode_script(&input.script_sig),
            sequence: input.sequence,
            witness: input.witness.iter().map(hex::encode).collect(),
            is_coinbase: coinbase,
        })
        .collect();

    let outputs = tx
        .outputs
        .iter()
        .enumerate()
        .map(|(index, output)| DecodedOutput {
            value_satoshis: output.value,
            value_btc: format_btc(output.value),
            output_index: index as u32,
            script_pubkey: decode_script(&output.script_pubkey),
            address: address_from_script(&output.script_pubkey, network),
        })
        .collect();

    let weight = segwit::calculate_transaction_weight(&tx);
    let decoded = DecodedTransaction {
        txid: to_display_hex(&compute_txid(&tx)),
        wtxid: to_display_hex(&segwit::compute_wtxid(&tx)),
        version: tx.version,
        locktime: tx.lock_time,
        inputs,
        outputs,
        is_segwit: tx.has_witness(),
        size: bytes.len(),
        vsize: segwit::weight_to_vsize(weight),
        weight,
    };
    debug!(
        "decoded transaction {} ({} inputs, {} outputs)",
        decoded.txid,
        decoded.inputs.len(),
        decoded.outputs.len()
    );
    Ok(decoded)
}
