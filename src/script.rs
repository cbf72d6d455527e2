//! Script disassembly and output-script classification

use crate::constants::*;
use crate::opcodes::{is_push, opcode_name, small_integer};
use crate::types::*;

/// One parsed element of a script
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction<'a> {
    /// Any non-push opcode (OP_0 included)
    Op(u8),
    /// A data push and its payload
    Push { opcode: u8, data: &'a [u8] },
    /// A push whose declared length runs past the end of the script
    PushPastEnd { opcode: u8 },
}

/// Iterator over the instructions of a script; stops after a truncated push.
pub struct Instructions<'a> {
    script: &'a [u8],
    pos: usize,
    done: bool,
}

/// Iterate a script's instructions
pub fn instructions(script: &[u8]) -> Instructions<'_> {
    Instructions { script, pos: 0, done: false }
}

impl<'a> Instructions<'a> {
    fn read_le(&mut self, width: usize) -> Option<usize> {
        let bytes = self.script.get(self.pos..self.pos.checked_add(width)?)?;
        self.pos += width;
        Some(bytes.iter().rev().fold(0usize, |acc, &b| (acc << 8) | b as usize))
    }
}

impl<'a> Iterator for Instructions<'a> {
    type Item = Instruction<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.script.len() {
            return None;
        }
        let opcode = self.script[self.pos];
        self.pos += 1;

        if !is_push(opcode) {
            return Some(Instruction::Op(opcode));
        }

        let len = match opcode {
            OP_PUSHDATA1 => self.read_le(1),
            OP_PUSHDATA2 => self.read_le(2),
            OP_PUSHDATA4 => self.read_le(4),
            n => Some(n as usize),
        };
        let data = len.and_then(|len| self.script.get(self.pos..self.pos.checked_add(len)?));
        match data {
            Some(data) => {
                self.pos += data.len();
                Some(Instruction::Push { opcode, data })
            }
            None => {
                self.done = true;
                Some(Instruction::PushPastEnd { opcode })
            }
        }
    }
}

/// Token emitted in place of the payload of a truncated push
pub const PUSH_PAST_END: &str = "<push past end>";

/// Disassemble a script into ASM-like tokens.
///
/// Direct pushes render as `OP_PUSHBYTES_<n>` followed by the hex payload,
/// unlike Bitcoin Core's ASM which prints only the payload.
pub fn to_custom_asm(script: &[u8]) -> Vec<String> {
    let mut tokens = Vec::new();
    for instruction in instructions(script) {
        match instruction {
            Instruction::Op(opcode) => tokens.push(opcode_name(opcode).to_string()),
            Instruction::Push { opcode, data } => {
                tokens.push(push_mnemonic(opcode));
                if !data.is_empty() {
                    tokens.push(hex::encode(data));
                }
            }
            Instruction::PushPastEnd { opcode } => {
                tokens.push(push_mnemonic(opcode));
                tokens.push(PUSH_PAST_END.to_string());
            }
        }
    }
    tokens
}

fn push_mnemonic(opcode: u8) -> String {
    if opcode <= OP_PUSHBYTES_MAX {
        format!("OP_PUSHBYTES_{}", opcode)
    } else {
        opcode_name(opcode).to_string()
    }
}

/// Classify an output script.
///
/// Templates are tried in a fixed order and the first match wins.
pub fn classify_output_script(script: &[u8]) -> ScriptClass {
    const TEMPLATES: [(ScriptClass, fn(&[u8]) -> bool); 5] = [
        (ScriptClass::P2PK, is_p2pk),
        (ScriptClass::P2PKH, is_p2pkh),
        (ScriptClass::P2MS, is_p2ms),
        (ScriptClass::P2WPKH, is_p2wpkh),
        (ScriptClass::P2SH, is_p2sh),
    ];
    TEMPLATES
        .iter()
        .find(|(_, matches)| matches(script))
        .map(|(class, _)| *class)
        .unwrap_or(ScriptClass::NonStandard)
}

/// Disassemble and classify in one step
pub fn decode_script(script: &[u8]) -> DecodedScript {
    DecodedScript {
        asm_tokens: to_custom_asm(script),
        raw_hex: hex::encode(script),
        classification: classify_output_script(script),
    }
}

fn is_pubkey(key: &[u8]) -> bool {
    match key.len() {
        33 => key[0] == 0x02 || key[0] == 0x03,
        65 => key[0] == 0x04,
        _ => false,
    }
}

/// `<pubkey> OP_CHECKSIG`
pub fn is_p2pk(script: &[u8]) -> bool {
    match script.split_last() {
        Some((&OP_CHECKSIG, rest)) => match rest.split_first() {
            Some((&len, key)) => len as usize == key.len() && is_pubkey(key),
            None => false,
        },
        _ => false,
    }
}

/// `OP_DUP OP_HASH160 <20 bytes> OP_EQUALVERIFY OP_CHECKSIG`
pub fn is_p2pkh(script: &[u8]) -> bool {
    script.len() == 25
        && script[0] == OP_DUP
        && script[1] == OP_HASH160
        && script[2] == HASH160_LEN as u8
        && script[23] == OP_EQUALVERIFY
        && script[24] == OP_CHECKSIG
}

/// `OP_m <pubkey>... OP_n OP_CHECKMULTISIG` with 1 <= m <= n <= 16
pub fn is_p2ms(script: &[u8]) -> bool {
    if script.len() < 3 || script[script.len() - 1] != OP_CHECKMULTISIG {
        return false;
    }
    let (m, n) = match (small_integer(script[0]), small_integer(script[script.len() - 2])) {
        (Some(m), Some(n)) if m <= n => (m as usize, n as usize),
        _ => return false,
    };
    if n > MAX_PUBKEYS_PER_MULTISIG || m == 0 {
        return false;
    }

    let mut keys = 0;
    for instruction in instructions(&script[1..script.len() - 2]) {
        match instruction {
            Instruction::Push { opcode, data } if opcode <= OP_PUSHBYTES_MAX && is_pubkey(data) => {
                keys += 1;
            }
            _ => return false,
        }
    }
    keys == n
}

/// `OP_0 <20 bytes>`
pub fn is_p2wpkh(script: &[u8]) -> bool {
    script.len() == 22 && script[0] == OP_0 && script[1] == HASH160_LEN as u8
}

/// `OP_HASH160 <20 bytes> OP_EQUAL`
pub fn is_p2sh(script: &[u8]) -> bool {
    script.len() == 23
        && script[0] == OP_HASH160
        && script[1] == HASH160_LEN as u8
        && script[22] == OP_EQUAL
}
