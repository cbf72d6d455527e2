//! Base58Check encoding through the public API

use decoding_bitcoin::address::*;
use decoding_bitcoin::hash::{hash160, hash256};
use decoding_bitcoin::*;

#[test]
fn test_zero_hash_mainnet_address() {
    let script_hash = [0u8; 20];
    let p2sh = encode_p2sh(0x05, &script_hash).unwrap();

    let mut payload = vec![0x05];
    payload.extend_from_slice(&script_hash);
    assert_eq!(p2sh.checksum[..], hash256(&payload)[..4]);
    assert_eq!(hex::encode(p2sh.checksum), "dc8c61c4");
    assert_eq!(p2sh.address, "31h1vYVSYuKP6AhS86fbRdMw9XHieotbST");

    // Reproducible
    assert_eq!(encode_p2sh(0x05, &script_hash).unwrap(), p2sh);
}

#[test]
fn test_zero_hash_testnet_address() {
    let p2sh = encode_p2sh(0xc4, &[0u8; 20]).unwrap();
    assert_eq!(hex::encode(p2sh.checksum), "24c7ff28");
    assert_eq!(p2sh.address, "2MsFDzHRUAMpjHxKyoEHU3aMCMsVtMqs1PV");
}

#[test]
fn test_encode_then_decode_recovers_payload() {
    let script_hash = hash160(b"redeem script");
    for prefix in [0x05, 0xc4] {
        let address = encode_p2sh_address(prefix, &script_hash).unwrap();
        let (version, payload) = decode_base58check(&address).unwrap();
        assert_eq!(version, prefix);
        assert_eq!(payload, script_hash.to_vec());
    }
}

#[test]
fn test_rejects_other_prefixes() {
    for prefix in [0x00, 0x6f, 0x80, 0xff] {
        assert_eq!(
            encode_p2sh(prefix, &[0u8; 20]),
            Err(DecodingError::InvalidPrefix(prefix))
        );
        assert_eq!(encode_p2sh_address(prefix, &[0u8; 20]), None);
    }
}

#[test]
fn test_rejects_wrong_hash_length() {
    assert_eq!(
        encode_p2sh(0x05, &[0u8; 19]),
        Err(DecodingError::InvalidScriptHashLength(19))
    );
    assert_eq!(encode_p2sh_address(0x05, &[0u8; 32]), None);
}

#[test]
fn test_corrupted_address_fails_checksum() {
    assert_eq!(
        decode_base58check("31h1vYVSYuKP6AhS86fbRdMw9XHieotbSU"),
        Err(DecodingError::InvalidChecksum)
    );
}

#[test]
fn test_decode_rejects_non_base58() {
    assert!(matches!(
        decode_base58check("0OIl"),
        Err(DecodingError::InvalidBase58(_))
    ));
}

#[test]
fn test_p2sh_for_redeem_script_matches_manual_hash() {
    let redeem_script = [0x51];
    let expected = encode_p2sh_address(0x05, &hash160(&redeem_script)).unwrap();
    assert_eq!(p2sh_address_for_script(&redeem_script, Network::Mainnet), expected);
}

#[test]
fn test_form_state_valid_inputs() {
    let state = AddressEncodingState::compute(0x05, &"00".repeat(20));
    assert!(state.prefix_valid);
    assert_eq!(state.checksum_hex().as_deref(), Some("dc8c61c4"));
    assert_eq!(state.address.as_deref(), Some("31h1vYVSYuKP6AhS86fbRdMw9XHieotbST"));
}

#[test]
fn test_form_state_recomputes_without_stale_values() {
    let valid = AddressEncodingState::compute(0x05, &"00".repeat(20));
    assert!(valid.address.is_some());

    // Same hash, unsupported prefix
    let invalid = AddressEncodingState::compute(0x00, &"00".repeat(20));
    assert!(!invalid.prefix_valid);
    assert_eq!(invalid.checksum, None);
    assert_eq!(invalid.address, None);

    // Bad hex
    let bad_hex = AddressEncodingState::compute(0x05, "not hex");
    assert!(bad_hex.prefix_valid);
    assert!(bad_hex.script_hash.is_empty());
    assert_eq!(bad_hex.address, None);
}

#[test]
fn test_facade_matches_module() {
    let site = DecodingBitcoin::new();
    assert_eq!(
        site.encode_p2sh_address(0x05, &[0u8; 20]),
        encode_p2sh_address(0x05, &[0u8; 20])
    );
    assert_eq!(
        site.address_encoding_state(0xc4, &"00".repeat(20)).address.as_deref(),
        Some("2MsFDzHRUAMpjHxKyoEHU3aMCMsVtMqs1PV")
    );
}
