//! Segregated Witness size accounting

use crate::constants::WITNESS_SCALE_FACTOR;
use crate::hash::hash256;
use crate::transaction::serialize_transaction;
use crate::types::*;

/// Calculate transaction weight
/// Weight(tx) = 3 × |Serialize(tx ∖ witness)| + |Serialize(tx)|
pub fn calculate_transaction_weight(tx: &Transaction) -> usize {
    let base_size = calculate_base_size(tx);
    let total_size = calculate_total_size(tx);
    (WITNESS_SCALE_FACTOR - 1) * base_size + total_size
}

/// Size of the transaction without witness data
pub fn calculate_base_size(tx: &Transaction) -> usize {
    serialize_transaction(tx, false).len()
}

/// Size of the transaction including witness data
pub fn calculate_total_size(tx: &Transaction) -> usize {
    serialize_transaction(tx, true).len()
}

/// Virtual size: weight / 4, rounded up
pub fn weight_to_vsize(weight: usize) -> usize {
    weight.div_ceil(WITNESS_SCALE_FACTOR)
}

/// HASH256 of the witness serialization, in wire order
pub fn compute_wtxid(tx: &Transaction) -> Hash {
    hash256(&serialize_transaction(tx, true))
}
