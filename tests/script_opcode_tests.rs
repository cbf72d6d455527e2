//! Script classification and the stack simulator through the public API

use decoding_bitcoin::hash::hash160;
use decoding_bitcoin::script::{classify_output_script, decode_script, to_custom_asm};
use decoding_bitcoin::stack::{opcodes, placeholder_message, SessionState};
use decoding_bitcoin::*;
use num_bigint::BigInt;
use secp256k1::{PublicKey, Secp256k1, SecretKey};

const PUBKEY_HASH: &str = "751e76e8199196d454941c45d1b3a323f1433bd6";

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn int(n: i64) -> StackItem {
    StackItem::Int(BigInt::from(n))
}

#[test]
fn test_p2pkh_classification() {
    let script = hex::decode(format!("76a914{}88ac", PUBKEY_HASH)).unwrap();
    let decoded = decode_script(&script);
    assert_eq!(decoded.classification, ScriptClass::P2PKH);
    assert_eq!(decoded.classification.to_string(), "P2PKH");
    assert_eq!(
        decoded.asm(),
        format!("OP_DUP OP_HASH160 OP_PUSHBYTES_20 {} OP_EQUALVERIFY OP_CHECKSIG", PUBKEY_HASH)
    );
}

#[test]
fn test_classification_order_and_fallback() {
    let cases = [
        (format!("a914{}87", PUBKEY_HASH), ScriptClass::P2SH),
        (format!("0014{}", PUBKEY_HASH), ScriptClass::P2WPKH),
        // P2WSH is outside the recognized set
        (format!("0020{}", "00".repeat(32)), ScriptClass::NonStandard),
        ("6a0568656c6c6f".to_string(), ScriptClass::NonStandard),
    ];
    for (script_hex, expected) in cases {
        let script = hex::decode(&script_hex).unwrap();
        assert_eq!(classify_output_script(&script), expected, "{}", script_hex);
    }
}

#[test]
fn test_nonstandard_serializes_lowercase() {
    let json = serde_json::to_string(&ScriptClass::NonStandard).unwrap();
    assert_eq!(json, "\"nonstandard\"");
}

#[test]
fn test_add_scenario() {
    init_logging();
    let mut session = DecodingBitcoin::new().stack_session();
    session.push("5");
    session.push("3");
    session.execute("OP_ADD");
    assert_eq!(session.stack(), &[int(8)]);
    assert_eq!(session.display(), vec!["8"]);
}

#[test]
fn test_equal_with_too_few_items() {
    let mut session = StackSession::new();
    session.execute("OP_EQUAL");
    assert_eq!(session.display(), vec!["Error: Insufficient items"]);

    let mut session = StackSession::new();
    session.push("0xab");
    session.execute("OP_EQUAL");
    assert_eq!(session.display(), vec!["0xab", "Error: Insufficient items"]);
}

#[test]
fn test_failed_opcode_keeps_every_existing_item() {
    for opcode in opcodes() {
        let mut session = StackSession::new();
        session.push("true");
        let before = session.stack().to_vec();
        session.execute(opcode.name);

        let after = session.stack();
        if after.last().map_or(false, StackItem::is_error) {
            assert_eq!(&after[..after.len() - 1], &before[..], "{}", opcode.name);
        }
    }
}

#[test]
fn test_errors_accumulate() {
    let mut session = StackSession::new();
    session.execute("OP_ADD");
    session.execute("OP_NOSUCHTHING");
    assert_eq!(
        session.display(),
        vec!["Error: Insufficient items", "Error: Unknown opcode OP_NOSUCHTHING"]
    );
    // A marker is a normal item and can be popped
    session.pop();
    assert_eq!(session.len(), 1);
}

#[test]
fn test_p2pkh_spend_in_simulator() {
    let secp = Secp256k1::new();
    let secret = SecretKey::from_slice(&[0x21; 32]).unwrap();
    let pubkey = PublicKey::from_secret_key(&secp, &secret).serialize();
    let signature = secp.sign_ecdsa(&placeholder_message(), &secret).serialize_der();

    // scriptSig followed by a P2PKH scriptPubKey for this key
    let mut script = Vec::new();
    script.push(signature.len() as u8);
    script.extend_from_slice(&signature);
    script.push(pubkey.len() as u8);
    script.extend_from_slice(&pubkey);
    script.extend_from_slice(&[OP_DUP, OP_HASH160, 20]);
    script.extend_from_slice(&hash160(&pubkey));
    script.extend_from_slice(&[OP_EQUALVERIFY, OP_CHECKSIG]);

    let mut session = StackSession::new();
    session.run_asm(&to_custom_asm(&script));
    assert_eq!(session.stack(), &[StackItem::Bool(true)]);
}

#[test]
fn test_p2pkh_spend_with_wrong_key_fails() {
    let secp = Secp256k1::new();
    let signer = SecretKey::from_slice(&[0x22; 32]).unwrap();
    let other = SecretKey::from_slice(&[0x23; 32]).unwrap();
    let pubkey = PublicKey::from_secret_key(&secp, &other).serialize();
    let signature = secp.sign_ecdsa(&placeholder_message(), &signer).serialize_der();

    let mut session = StackSession::new();
    session.push(&format!("0x{}", hex::encode(&*signature)));
    session.push(&format!("0x{}", hex::encode(pubkey)));
    session.execute("OP_CHECKSIG");
    assert_eq!(session.stack(), &[StackItem::Bool(false)]);
}

#[test]
fn test_multisig_counts_valid_signatures_against_threshold() {
    let secp = Secp256k1::new();
    let key_a = SecretKey::from_slice(&[0x31; 32]).unwrap();
    let key_b = SecretKey::from_slice(&[0x32; 32]).unwrap();
    let pub_b = PublicKey::from_secret_key(&secp, &key_b).serialize();
    let sig_a = secp.sign_ecdsa(&placeholder_message(), &key_a).serialize_der();
    let sig_b = secp.sign_ecdsa(&placeholder_message(), &key_b).serialize_der();

    // Layout, bottom to top: <sigs> n <pubkeys> m
    let mut session = StackSession::new();
    session.push(&format!("0x{}", hex::encode(&*sig_a)));
    session.push(&format!("0x{}", hex::encode(&*sig_b)));
    session.push("2");
    session.push(&format!("0x{}", hex::encode(pub_b)));
    session.push("1");
    session.execute("OP_CHECKMULTISIG");
    assert_eq!(session.stack(), &[StackItem::Bool(true)]);
}

#[test]
fn test_session_lifecycle() {
    let mut session = StackSession::new();
    assert_eq!(session.state(), SessionState::Idle);

    session.push("hello");
    session.execute("OP_SHA256");
    assert_eq!(session.state(), SessionState::Populated);
    assert_eq!(session.history().len(), 2);

    session.reset();
    assert_eq!(session.state(), SessionState::Idle);
    assert!(session.stack().is_empty());
    assert!(session.history().is_empty());
}

#[test]
fn test_session_serializes_to_json() {
    let mut session = StackSession::new();
    session.push("true");
    session.push("-12");
    session.push("0x00ff");
    session.execute("OP_FOO");

    let json = serde_json::to_string(&session).unwrap();
    let back: StackSession = serde_json::from_str(&json).unwrap();
    assert_eq!(back, session);
}
