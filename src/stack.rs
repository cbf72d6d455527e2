//! Toy stack machine for the Script simulator.
//!
//! This is a teaching tool, not a validating interpreter: items are typed
//! (booleans, integers, byte strings), signature opcodes sign over a fixed
//! placeholder message, and a failing opcode leaves the stack untouched apart
//! from one appended error marker.

use std::fmt;

use log::trace;
use num_bigint::BigInt;
use num_traits::{ToPrimitive, Zero};
use secp256k1::{ecdsa::Signature, Message, PublicKey, Secp256k1, Verification};
use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::StackError;
use crate::hash::{hash160, hash256, ripemd160, sha256};
use crate::script::PUSH_PAST_END;
use crate::types::ByteString;

type OpResult = std::result::Result<Vec<StackItem>, StackError>;

/// A value on the simulator stack
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StackItem {
    Bool(bool),
    Int(BigInt),
    Bytes(ByteString),
    /// In-band marker left by a failed operation
    Error(String),
}

impl StackItem {
    /// Classify a user-typed literal.
    ///
    /// Precedence: boolean, integer, `0x` hex, Base58, raw UTF-8 bytes.
    pub fn from_literal(raw: &str) -> Self {
        let literal = raw.trim();

        match literal {
            "true" => return StackItem::Bool(true),
            "false" => return StackItem::Bool(false),
            _ => {}
        }

        if is_integer_literal(literal) {
            if let Ok(n) = literal.parse::<BigInt>() {
                return StackItem::Int(n);
            }
        }

        if let Some(digits) = literal.strip_prefix("0x").or_else(|| literal.strip_prefix("0X")) {
            if let Ok(bytes) = hex::decode(digits) {
                return StackItem::Bytes(bytes);
            }
        }

        if !literal.is_empty() {
            if let Ok(bytes) = bs58::decode(literal).into_vec() {
                return StackItem::Bytes(bytes);
            }
        }

        StackItem::Bytes(literal.as_bytes().to_vec())
    }

    /// Script-style truthiness
    pub fn is_truthy(&self) -> bool {
        match self {
            StackItem::Bool(b) => *b,
            StackItem::Int(n) => !n.is_zero(),
            StackItem::Bytes(bytes) => match bytes.split_last() {
                // 0x80 as the last byte with all others zero is negative zero
                Some((&last, rest)) => rest.iter().any(|&b| b != 0) || (last != 0 && last != 0x80),
                None => false,
            },
            StackItem::Error(_) => false,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, StackItem::Error(_))
    }
}

impl fmt::Display for StackItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StackItem::Bool(b) => write!(f, "{}", b),
            StackItem::Int(n) => write!(f, "{}", n),
            StackItem::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            StackItem::Error(message) => f.write_str(message),
        }
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

// ============================================================================
// Opcode registry
// ============================================================================

/// A named, pure transformation of a stack snapshot
pub struct Opcode {
    pub name: &'static str,
    pub execute: fn(&[StackItem]) -> OpResult,
}

impl fmt::Debug for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Opcode").field("name", &self.name).finish()
    }
}

static OPCODES: [Opcode; 16] = [
    Opcode { name: "ADD", execute: op_add },
    Opcode { name: "SUB", execute: op_sub },
    Opcode { name: "EQUAL", execute: op_equal },
    Opcode { name: "VERIFY", execute: op_verify },
    Opcode { name: "EQUALVERIFY", execute: op_equalverify },
    Opcode { name: "DUP", execute: op_dup },
    Opcode { name: "DROP", execute: op_drop },
    Opcode { name: "SWAP", execute: op_swap },
    Opcode { name: "SIZE", execute: op_size },
    Opcode { name: "SHA256", execute: op_sha256 },
    Opcode { name: "RIPEMD160", execute: op_ripemd160 },
    Opcode { name: "HASH160", execute: op_hash160 },
    Opcode { name: "HASH256", execute: op_hash256 },
    Opcode { name: "CHECKSIG", execute: op_checksig },
    Opcode { name: "CHECKSIGVERIFY", execute: op_checksigverify },
    Opcode { name: "CHECKMULTISIG", execute: op_checkmultisig },
];

/// All opcodes the simulator understands
pub fn opcodes() -> &'static [Opcode] {
    &OPCODES
}

/// Look up an opcode by name; `OP_` prefix optional, case-insensitive
pub fn find_opcode(name: &str) -> Option<&'static Opcode> {
    let upper = name.trim().to_ascii_uppercase();
    let bare = upper.strip_prefix("OP_").unwrap_or(upper.as_str());
    OPCODES.iter().find(|op| op.name == bare)
}

/// Split off the top `n` items, failing if the stack is too short
fn split_top(stack: &[StackItem], n: usize) -> Result<(&[StackItem], &[StackItem]), StackError> {
    if stack.len() < n {
        return Err(StackError::InsufficientItems);
    }
    Ok(stack.split_at(stack.len() - n))
}

fn with_pushed<I: IntoIterator<Item = StackItem>>(rest: &[StackItem], items: I) -> Vec<StackItem> {
    let mut out = rest.to_vec();
    out.extend(items);
    out
}

fn as_int(item: &StackItem) -> Result<&BigInt, StackError> {
    match item {
        StackItem::Int(n) => Ok(n),
        _ => Err(StackError::ExpectedInteger),
    }
}

fn as_bytes(item: &StackItem) -> Result<&[u8], StackError> {
    match item {
        StackItem::Bytes(bytes) => Ok(bytes),
        _ => Err(StackError::ExpectedBytes),
    }
}

fn op_add(stack: &[StackItem]) -> OpResult {
    let (rest, top) = split_top(stack, 2)?;
    let sum = as_int(&top[0])? + as_int(&top[1])?;
    Ok(with_pushed(rest, [StackItem::Int(sum)]))
}

fn op_sub(stack: &[StackItem]) -> OpResult {
    let (rest, top) = split_top(stack, 2)?;
    let difference = as_int(&top[0])? - as_int(&top[1])?;
    Ok(with_pushed(rest, [StackItem::Int(difference)]))
}

fn op_equal(stack: &[StackItem]) -> OpResult {
    let (rest, top) = split_top(stack, 2)?;
    Ok(with_pushed(rest, [StackItem::Bool(top[0] == top[1])]))
}

fn op_verify(stack: &[StackItem]) -> OpResult {
    let (rest, top) = split_top(stack, 1)?;
    if top[0].is_truthy() {
        Ok(rest.to_vec())
    } else {
        Err(StackError::VerifyFailed)
    }
}

fn op_equalverify(stack: &[StackItem]) -> OpResult {
    op_verify(&op_equal(stack)?)
}

fn op_dup(stack: &[StackItem]) -> OpResult {
    let (_, top) = split_top(stack, 1)?;
    Ok(with_pushed(stack, [top[0].clone()]))
}

fn op_drop(stack: &[StackItem]) -> OpResult {
    let (rest, _) = split_top(stack, 1)?;
    Ok(rest.to_vec())
}

fn op_swap(stack: &[StackItem]) -> OpResult {
    let (rest, top) = split_top(stack, 2)?;
    Ok(with_pushed(rest, [top[1].clone(), top[0].clone()]))
}

fn op_size(stack: &[StackItem]) -> OpResult {
    let (_, top) = split_top(stack, 1)?;
    let len = as_bytes(&top[0])?.len();
    Ok(with_pushed(stack, [StackItem::Int(BigInt::from(len))]))
}

fn unary_hash(stack: &[StackItem], hash: fn(&[u8]) -> Vec<u8>) -> OpResult {
    let (rest, top) = split_top(stack, 1)?;
    let digest = hash(as_bytes(&top[0])?);
    Ok(with_pushed(rest, [StackItem::Bytes(digest)]))
}

fn op_sha256(stack: &[StackItem]) -> OpResult {
    unary_hash(stack, |data| sha256(data).to_vec())
}

fn op_ripemd160(stack: &[StackItem]) -> OpResult {
    unary_hash(stack, |data| ripemd160(data).to_vec())
}

fn op_hash160(stack: &[StackItem]) -> OpResult {
    unary_hash(stack, |data| hash160(data).to_vec())
}

fn op_hash256(stack: &[StackItem]) -> OpResult {
    unary_hash(stack, |data| hash256(data).to_vec())
}

// ============================================================================
// Signature opcodes
// ============================================================================

/// Digest every simulator signature commits to
pub fn placeholder_message() -> Message {
    Message::from_digest(sha256(PLACEHOLDER_MESSAGE))
}

fn parse_public_key(item: &StackItem) -> Result<PublicKey, StackError> {
    let bytes = as_bytes(item).map_err(|_| StackError::InvalidPublicKey)?;
    PublicKey::from_slice(bytes).map_err(|_| StackError::InvalidPublicKey)
}

/// Accepts DER, DER with a trailing sighash byte, or 64-byte compact
fn parse_signature(item: &StackItem) -> Result<Signature, StackError> {
    let bytes = as_bytes(item).map_err(|_| StackError::InvalidSignature)?;
    let parsed = Signature::from_der(bytes)
        .or_else(|e| match bytes.split_last() {
            Some((_, der)) if !der.is_empty() => Signature::from_der(der),
            _ => Err(e),
        })
        .or_else(|e| if bytes.len() == 64 { Signature::from_compact(bytes) } else { Err(e) });

    let mut signature = parsed.map_err(|_| StackError::InvalidSignature)?;
    signature.normalize_s();
    Ok(signature)
}

fn verify_signature<C: Verification>(secp: &Secp256k1<C>, signature: &Signature, pubkey: &PublicKey) -> bool {
    secp.verify_ecdsa(&placeholder_message(), signature, pubkey).is_ok()
}

fn op_checksig(stack: &[StackItem]) -> OpResult {
    let (rest, top) = split_top(stack, 2)?;
    let pubkey = parse_public_key(&top[1])?;
    let signature = parse_signature(&top[0])?;

    let secp = Secp256k1::verification_only();
    let valid = verify_signature(&secp, &signature, &pubkey);
    Ok(with_pushed(rest, [StackItem::Bool(valid)]))
}

fn op_checksigverify(stack: &[StackItem]) -> OpResult {
    op_verify(&op_checksig(stack)?)
}

/// Read the count just below `cursor` and move the cursor past it
fn take_count(stack: &[StackItem], cursor: &mut usize) -> Result<usize, StackError> {
    if *cursor == 0 {
        return Err(StackError::InsufficientItems);
    }
    *cursor -= 1;
    let count = match &stack[*cursor] {
        StackItem::Int(n) => n.to_usize().ok_or(StackError::InvalidCount)?,
        _ => return Err(StackError::InvalidCount),
    };
    if count > MAX_SIMULATOR_MULTISIG_COUNT {
        return Err(StackError::InvalidCount);
    }
    Ok(count)
}

fn take_items<'a>(stack: &'a [StackItem], cursor: &mut usize, n: usize) -> Result<&'a [StackItem], StackError> {
    if *cursor < n {
        return Err(StackError::InsufficientItems);
    }
    *cursor -= n;
    Ok(&stack[*cursor..*cursor + n])
}

/// Pops m, m pubkeys, n, n signatures; true when at least m signatures verify.
///
/// A pubkey may satisfy more than one signature.
fn op_checkmultisig(stack: &[StackItem]) -> OpResult {
    let mut cursor = stack.len();
    let m = take_count(stack, &mut cursor)?;
    let pubkey_items = take_items(stack, &mut cursor, m)?;
    let n = take_count(stack, &mut cursor)?;
    let signature_items = take_items(stack, &mut cursor, n)?;

    let pubkeys = pubkey_items
        .iter()
        .map(parse_public_key)
        .collect::<Result<Vec<_>, _>>()?;
    let signatures = signature_items
        .iter()
        .map(parse_signature)
        .collect::<Result<Vec<_>, _>>()?;

    let secp = Secp256k1::verification_only();
    let valid_count = signatures
        .iter()
        .filter(|signature| pubkeys.iter().any(|pubkey| verify_signature(&secp, signature, pubkey)))
        .count();

    Ok(with_pushed(&stack[..cursor], [StackItem::Bool(valid_count >= m)]))
}

// ============================================================================
// Session
// ============================================================================

/// One user action, as recorded in the session history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionEvent {
    Push(StackItem),
    Pop,
    Execute(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    Idle,
    Populated,
}

/// A simulator session owning its stack
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackSession {
    stack: Vec<StackItem>,
    history: Vec<SessionEvent>,
}

impl StackSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify and push a user literal. Never fails.
    pub fn push(&mut self, raw: &str) {
        self.push_item(StackItem::from_literal(raw));
    }

    pub fn push_item(&mut self, item: StackItem) {
        trace!("push {}", item);
        self.history.push(SessionEvent::Push(item.clone()));
        self.stack.push(item);
    }

    /// Remove the top item; no-op on an empty stack
    pub fn pop(&mut self) -> Option<StackItem> {
        let popped = self.stack.pop()?;
        trace!("pop {}", popped);
        self.history.push(SessionEvent::Pop);
        Some(popped)
    }

    /// Apply a named opcode.
    ///
    /// On failure the stack keeps its contents and gains one error marker.
    pub fn execute(&mut self, name: &str) {
        self.history.push(SessionEvent::Execute(name.trim().to_string()));

        let outcome = match find_opcode(name) {
            Some(opcode) => (opcode.execute)(&self.stack),
            None => Err(StackError::UnknownOpcode(name.trim().to_string())),
        };

        match outcome {
            Ok(stack) => {
                trace!("{} -> {} items", name, stack.len());
                self.stack = stack;
            }
            Err(err) => {
                trace!("{} failed: {}", name, err);
                self.stack.push(StackItem::Error(err.to_string()));
            }
        }
    }

    /// Replay a disassembly produced by [`crate::script::to_custom_asm`]
    pub fn run_asm<S: AsRef<str>>(&mut self, tokens: &[S]) {
        let mut iter = tokens.iter().map(|token| token.as_ref()).peekable();
        while let Some(token) = iter.next() {
            if token.starts_with("OP_PUSHBYTES_") || token.starts_with("OP_PUSHDATA") {
                // Disassembly ends at a truncated push, and so does replay
                if iter.peek() == Some(&PUSH_PAST_END) {
                    trace!("{} runs past the end of the script", token);
                    break;
                }
                let payload = iter.peek().and_then(|next| hex::decode(next).ok());
                if payload.is_some() {
                    iter.next();
                }
                self.push_item(StackItem::Bytes(payload.unwrap_or_default()));
                continue;
            }
            match token {
                "OP_0" | "OP_FALSE" => self.push_item(StackItem::Bytes(Vec::new())),
                "OP_1NEGATE" => self.push_item(StackItem::Int(BigInt::from(-1))),
                _ => match small_integer_token(token) {
                    Some(n) => self.push_item(StackItem::Int(BigInt::from(n))),
                    None => self.execute(token),
                },
            }
        }
    }

    pub fn reset(&mut self) {
        self.stack.clear();
        self.history.clear();
    }

    pub fn state(&self) -> SessionState {
        if self.stack.is_empty() {
            SessionState::Idle
        } else {
            SessionState::Populated
        }
    }

    /// Bottom-to-top view of the stack
    pub fn stack(&self) -> &[StackItem] {
        &self.stack
    }

    pub fn top(&self) -> Option<&StackItem> {
        self.stack.last()
    }

    pub fn len(&self) -> usize {
        self.stack.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stack.is_empty()
    }

    pub fn history(&self) -> &[SessionEvent] {
        &self.history
    }

    /// Display strings, bottom to top
    pub fn display(&self) -> Vec<String> {
        self.stack.iter().map(ToString::to_string).collect()
    }
}

/// `OP_1`..`OP_16`, spelled exactly
fn small_integer_token(token: &str) -> Option<u8> {
    let digits = token.strip_prefix("OP_")?;
    (1..=16u8).find(|n| n.to_string() == digits)
}
