// CALL PAYLOAD CODEC
//
// Payload = 4-byte selector ++ argument block of 32-byte words.
// Static arguments occupy one head word. Dynamic arguments (`string`,
// `address[]`) store an offset into the argument block; the tail holds a
// length word followed by the data padded to a word boundary.
//
// SAFETY INVARIANTS:
// 1. Every byte of a static word is either value or checked padding
// 2. Offsets and lengths are bounds-checked before any slice is taken
// 3. encode(decode(x)) is a fixed point: encoding the decoded values
//    and decoding again yields the same values and the same bytes

use crate::methods::MethodSchema;
use ethers_core::abi::{self, Token};
use ethers_core::types::{H160, U256};
use mergemine_core::{Address, Hash};
use serde_json::Value as JsonValue;
use thiserror::Error;

pub const WORD: usize = 32;
pub const SELECTOR_LEN: usize = 4;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AbiError {
    #[error("Payload of {0} bytes is shorter than a selector")]
    ShortPayload(usize),

    #[error("Unknown method selector 0x{0}")]
    UnknownSelector(String),

    #[error("No method named {0}")]
    UnknownMethod(String),

    #[error("Payload selects {found} but {expected} was expected")]
    SelectorMismatch { expected: &'static str, found: &'static str },

    #[error("Argument block truncated: need {needed} bytes, got {got}")]
    Truncated { needed: usize, got: usize },

    #[error("Invalid padding in argument {index} ({param})")]
    InvalidPadding { index: usize, param: &'static str },

    #[error("Offset of argument {index} is out of range")]
    OffsetOutOfRange { index: usize },

    #[error("Length of argument {index} is out of range")]
    LengthOutOfRange { index: usize },

    #[error("Argument {index} is not valid UTF-8")]
    InvalidUtf8 { index: usize },

    #[error("Expected {expected} arguments, got {got}")]
    ArgumentCount { expected: usize, got: usize },

    #[error("Argument {index} should be {expected}")]
    TypeMismatch { index: usize, expected: &'static str },

    #[error("Argument {index} cannot be parsed from JSON: {reason}")]
    InvalidJsonArgument { index: usize, reason: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Int32,
    Uint8,
    Uint32,
    Bool,
    Hash,
    Address,
    AddressArray,
    String,
}

impl ParamType {
    pub fn canonical_name(&self) -> &'static str {
        match self {
            ParamType::Int32 => "int32",
            ParamType::Uint8 => "uint8",
            ParamType::Uint32 => "uint32",
            ParamType::Bool => "bool",
            ParamType::Hash => "hash",
            ParamType::Address => "address",
            ParamType::AddressArray => "address[]",
            ParamType::String => "string",
        }
    }

    pub fn is_dynamic(&self) -> bool {
        matches!(self, ParamType::AddressArray | ParamType::String)
    }

    /// Parse a JSON argument (numbers, booleans, hex strings, arrays of hex strings).
    pub fn parse_json(&self, index: usize, json: &JsonValue) -> Result<Value, AbiError> {
        let fail = |reason: &str| AbiError::InvalidJsonArgument {
            index,
            reason: reason.to_string(),
        };
        let value = match self {
            ParamType::Int32 => json
                .as_i64()
                .and_then(|n| i32::try_from(n).ok())
                .map(Value::Int32)
                .ok_or_else(|| fail("expected int32"))?,
            ParamType::Uint8 => json
                .as_u64()
                .and_then(|n| u8::try_from(n).ok())
                .map(Value::Uint8)
                .ok_or_else(|| fail("expected uint8"))?,
            ParamType::Uint32 => json
                .as_u64()
                .and_then(|n| u32::try_from(n).ok())
                .map(Value::Uint32)
                .ok_or_else(|| fail("expected uint32"))?,
            ParamType::Bool => json.as_bool().map(Value::Bool).ok_or_else(|| fail("expected bool"))?,
            ParamType::Hash => {
                let s = json.as_str().ok_or_else(|| fail("expected hex string"))?;
                Value::Hash(Hash::from_hex(s).map_err(|e| fail(&e.to_string()))?)
            }
            ParamType::Address => {
                let s = json.as_str().ok_or_else(|| fail("expected hex string"))?;
                Value::Address(Address::from_hex(s).map_err(|e| fail(&e.to_string()))?)
            }
            ParamType::AddressArray => {
                let items = json.as_array().ok_or_else(|| fail("expected array"))?;
                let mut addresses = Vec::with_capacity(items.len());
                for item in items {
                    let s = item.as_str().ok_or_else(|| fail("expected hex string"))?;
                    addresses.push(Address::from_hex(s).map_err(|e| fail(&e.to_string()))?);
                }
                Value::AddressArray(addresses)
            }
            ParamType::String => Value::String(
                json.as_str().ok_or_else(|| fail("expected string"))?.to_string(),
            ),
        };
        Ok(value)
    }
}

/// A decoded argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int32(i32),
    Uint8(u8),
    Uint32(u32),
    Bool(bool),
    Hash(Hash),
    Address(Address),
    AddressArray(Vec<Address>),
    String(String),
}

impl Value {
    pub fn param_type(&self) -> ParamType {
        match self {
            Value::Int32(_) => ParamType::Int32,
            Value::Uint8(_) => ParamType::Uint8,
            Value::Uint32(_) => ParamType::Uint32,
            Value::Bool(_) => ParamType::Bool,
            Value::Hash(_) => ParamType::Hash,
            Value::Address(_) => ParamType::Address,
            Value::AddressArray(_) => ParamType::AddressArray,
            Value::String(_) => ParamType::String,
        }
    }
}

/// A payload decoded against its method schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedCall {
    pub method: &'static MethodSchema,
    pub args: Vec<Value>,
}

macro_rules! typed_getter {
    ($fn_name:ident, $variant:ident, $ty:ty, $label:literal) => {
        pub fn $fn_name(&self, index: usize) -> Result<$ty, AbiError> {
            match self.args.get(index) {
                Some(Value::$variant(v)) => Ok(v.clone()),
                _ => Err(AbiError::TypeMismatch { index, expected: $label }),
            }
        }
    };
}

impl DecodedCall {
    typed_getter!(int32, Int32, i32, "int32");
    typed_getter!(uint8, Uint8, u8, "uint8");
    typed_getter!(uint32, Uint32, u32, "uint32");
    typed_getter!(boolean, Bool, bool, "bool");
    typed_getter!(hash, Hash, Hash, "hash");
    typed_getter!(address, Address, Address, "address");
    typed_getter!(addresses, AddressArray, Vec<Address>, "address[]");
    typed_getter!(string, String, String, "string");

    pub fn name(&self) -> &'static str {
        self.method.name
    }

    /// Canonical payload bytes for these arguments.
    pub fn encode(&self) -> Result<Vec<u8>, AbiError> {
        encode_call(self.method, &self.args)
    }
}

// ── Encoding ─────────────────────────────────────────────────────────────────

/// Two's-complement 256-bit word for a signed argument.
fn int_word(value: i32) -> U256 {
    if value >= 0 {
        U256::from(value as u32)
    } else {
        !U256::from(!value as u32)
    }
}

fn to_token(value: &Value) -> Token {
    match value {
        Value::Int32(v) => Token::Int(int_word(*v)),
        Value::Uint8(v) => Token::Uint(U256::from(*v)),
        Value::Uint32(v) => Token::Uint(U256::from(*v)),
        Value::Bool(v) => Token::Bool(*v),
        Value::Hash(h) => Token::FixedBytes(h.as_bytes().to_vec()),
        Value::Address(a) => Token::Address(H160::from(a.0)),
        Value::AddressArray(addresses) => {
            Token::Array(addresses.iter().map(|a| Token::Address(H160::from(a.0))).collect())
        }
        Value::String(s) => Token::String(s.clone()),
    }
}

/// Encode `args` for `method`: selector, head words, then tails in argument order.
pub fn encode_call(method: &MethodSchema, args: &[Value]) -> Result<Vec<u8>, AbiError> {
    if args.len() != method.inputs.len() {
        return Err(AbiError::ArgumentCount {
            expected: method.inputs.len(),
            got: args.len(),
        });
    }
    for (index, ((_, expected), value)) in method.inputs.iter().zip(args).enumerate() {
        if value.param_type() != *expected {
            return Err(AbiError::TypeMismatch {
                index,
                expected: expected.canonical_name(),
            });
        }
    }

    let tokens: Vec<Token> = args.iter().map(to_token).collect();
    let block = abi::encode(&tokens);
    let mut payload = Vec::with_capacity(SELECTOR_LEN + block.len());
    payload.extend_from_slice(&method.selector());
    payload.extend_from_slice(&block);
    Ok(payload)
}

/// Encode by method name; used by clients and the replay tool.
pub fn encode_by_name(name: &str, args: &[Value]) -> Result<Vec<u8>, AbiError> {
    let method = MethodSchema::by_name(name).ok_or_else(|| AbiError::UnknownMethod(name.to_string()))?;
    encode_call(method, args)
}

// ── Decoding ─────────────────────────────────────────────────────────────────
//
// Hand-walked rather than `abi::decode`: every padding byte of every word,
// array elements included, must be checked and reported by argument index.

fn word_at(block: &[u8], offset: usize) -> Result<&[u8], AbiError> {
    let end = offset.checked_add(WORD).ok_or(AbiError::Truncated {
        needed: usize::MAX,
        got: block.len(),
    })?;
    block.get(offset..end).ok_or(AbiError::Truncated {
        needed: end,
        got: block.len(),
    })
}

fn all_equal(bytes: &[u8], fill: u8) -> bool {
    bytes.iter().all(|b| *b == fill)
}

/// Read a word as an unsigned integer that must fit in `usize`.
fn word_as_usize(word: &[u8]) -> Option<usize> {
    if !all_equal(&word[..WORD - 8], 0) {
        return None;
    }
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(buf)).ok()
}

fn decode_address_word(word: &[u8], index: usize) -> Result<Address, AbiError> {
    if !all_equal(&word[..WORD - Address::LEN], 0) {
        return Err(AbiError::InvalidPadding { index, param: "address" });
    }
    let mut bytes = [0u8; Address::LEN];
    bytes.copy_from_slice(&word[WORD - Address::LEN..]);
    Ok(Address(bytes))
}

fn decode_static(param: ParamType, word: &[u8], index: usize) -> Result<Value, AbiError> {
    let padding = |param: &'static str| AbiError::InvalidPadding { index, param };
    match param {
        ParamType::Int32 => {
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&word[WORD - 4..]);
            let v = i32::from_be_bytes(buf);
            let fill = if v < 0 { 0xff } else { 0x00 };
            if !all_equal(&word[..WORD - 4], fill) {
                return Err(padding("int32"));
            }
            Ok(Value::Int32(v))
        }
        ParamType::Uint8 => {
            if !all_equal(&word[..WORD - 1], 0) {
                return Err(padding("uint8"));
            }
            Ok(Value::Uint8(word[WORD - 1]))
        }
        ParamType::Uint32 => {
            if !all_equal(&word[..WORD - 4], 0) {
                return Err(padding("uint32"));
            }
            let mut buf = [0u8; 4];
            buf.copy_from_slice(&word[WORD - 4..]);
            Ok(Value::Uint32(u32::from_be_bytes(buf)))
        }
        ParamType::Bool => {
            if !all_equal(&word[..WORD - 1], 0) || word[WORD - 1] > 1 {
                return Err(padding("bool"));
            }
            Ok(Value::Bool(word[WORD - 1] == 1))
        }
        ParamType::Hash => {
            let mut bytes = [0u8; 32];
            bytes.copy_from_slice(word);
            Ok(Value::Hash(Hash(bytes)))
        }
        ParamType::Address => decode_address_word(word, index).map(Value::Address),
        ParamType::AddressArray | ParamType::String => Err(AbiError::TypeMismatch {
            index,
            expected: "static type",
        }),
    }
}

fn decode_dynamic(param: ParamType, block: &[u8], head: &[u8], index: usize) -> Result<Value, AbiError> {
    let offset = word_as_usize(head).ok_or(AbiError::OffsetOutOfRange { index })?;
    let length_word = word_at(block, offset).map_err(|_| AbiError::OffsetOutOfRange { index })?;
    let length = word_as_usize(length_word).ok_or(AbiError::LengthOutOfRange { index })?;
    let data_start = offset + WORD;

    match param {
        ParamType::String => {
            let data_end = data_start
                .checked_add(length)
                .filter(|end| *end <= block.len())
                .ok_or(AbiError::LengthOutOfRange { index })?;
            let s = std::str::from_utf8(&block[data_start..data_end])
                .map_err(|_| AbiError::InvalidUtf8 { index })?;
            Ok(Value::String(s.to_string()))
        }
        ParamType::AddressArray => {
            let data_end = length
                .checked_mul(WORD)
                .and_then(|n| data_start.checked_add(n))
                .filter(|end| *end <= block.len())
                .ok_or(AbiError::LengthOutOfRange { index })?;
            let addresses = block[data_start..data_end]
                .chunks_exact(WORD)
                .map(|word| decode_address_word(word, index))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(Value::AddressArray(addresses))
        }
        _ => Err(AbiError::TypeMismatch {
            index,
            expected: "dynamic type",
        }),
    }
}

/// Decode a payload, selecting the method by its selector.
pub fn decode_call(payload: &[u8]) -> Result<DecodedCall, AbiError> {
    if payload.len() < SELECTOR_LEN {
        return Err(AbiError::ShortPayload(payload.len()));
    }
    let (selector, block) = payload.split_at(SELECTOR_LEN);
    let method = MethodSchema::by_selector(selector)
        .ok_or_else(|| AbiError::UnknownSelector(hex::encode(selector)))?;

    let head_len = method.inputs.len() * WORD;
    if block.len() < head_len {
        return Err(AbiError::Truncated {
            needed: head_len,
            got: block.len(),
        });
    }

    let mut args = Vec::with_capacity(method.inputs.len());
    for (index, (_, param)) in method.inputs.iter().enumerate() {
        let head = &block[index * WORD..(index + 1) * WORD];
        let value = if param.is_dynamic() {
            decode_dynamic(*param, block, head, index)?
        } else {
            decode_static(*param, head, index)?
        };
        args.push(value);
    }
    Ok(DecodedCall { method, args })
}

/// Decode a payload that must select `name`.
pub fn decode_method(name: &str, payload: &[u8]) -> Result<DecodedCall, AbiError> {
    let call = decode_call(payload)?;
    match MethodSchema::by_name(name) {
        Some(expected) if expected.name == call.method.name => Ok(call),
        Some(expected) => Err(AbiError::SelectorMismatch {
            expected: expected.name,
            found: call.method.name,
        }),
        None => Err(AbiError::UnknownMethod(name.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::*;

    fn set_share_chain(id: u8, bits: u32, multiplier: u32) -> Vec<u8> {
        encode_by_name(
            SET_SHARE_CHAIN,
            &[Value::Uint8(id), Value::Uint32(bits), Value::Uint32(multiplier)],
        )
        .unwrap()
    }

    #[test]
    fn test_static_layout() {
        let payload = set_share_chain(7, 0x1d00ffff, 3);
        assert_eq!(payload.len(), SELECTOR_LEN + 3 * WORD);
        assert_eq!(payload[SELECTOR_LEN + WORD - 1], 7);
        assert_eq!(&payload[SELECTOR_LEN + 2 * WORD - 4..SELECTOR_LEN + 2 * WORD], &[0x1d, 0x00, 0xff, 0xff]);
    }

    #[test]
    fn test_negative_int32_is_sign_extended() {
        let method = MethodSchema::by_name(ADD_BITCOIN_BLOCK_HEADER).unwrap();
        let args = vec![
            Value::Int32(-2),
            Value::Hash(Hash([1u8; 32])),
            Value::Hash(Hash([2u8; 32])),
            Value::Uint32(1),
            Value::Uint32(2),
            Value::Uint32(3),
        ];
        let payload = encode_call(method, &args).unwrap();
        assert!(payload[SELECTOR_LEN..SELECTOR_LEN + WORD - 1].iter().all(|b| *b == 0xff));
        assert_eq!(decode_call(&payload).unwrap().args, args);

        let mut bad = payload.clone();
        bad[SELECTOR_LEN] = 0x00;
        assert_eq!(
            decode_call(&bad),
            Err(AbiError::InvalidPadding { index: 0, param: "int32" })
        );
    }

    #[test]
    fn test_dirty_padding_rejected() {
        let mut payload = set_share_chain(7, 1, 1);
        payload[SELECTOR_LEN] = 1;
        assert_eq!(
            decode_call(&payload),
            Err(AbiError::InvalidPadding { index: 0, param: "uint8" })
        );
    }

    #[test]
    fn test_bool_must_be_zero_or_one() {
        let method = MethodSchema::by_name(ADD_SHARE).unwrap();
        let mut args = vec![Value::Uint8(1), Value::Bool(true), Value::Int32(4)];
        args.extend([Value::Hash(Hash::ZERO), Value::Hash(Hash::ZERO)]);
        args.extend([Value::Uint32(5), Value::Uint32(6)]);
        args.extend((0..5).map(|i| Value::Hash(Hash([i; 32]))));
        let mut payload = encode_call(method, &args).unwrap();
        assert_eq!(decode_call(&payload).unwrap().args, args);

        payload[SELECTOR_LEN + 2 * WORD - 1] = 2;
        assert_eq!(
            decode_call(&payload),
            Err(AbiError::InvalidPadding { index: 1, param: "bool" })
        );
    }

    #[test]
    fn test_string_layout_and_decode() {
        let payload = encode_by_name(SET_MERGE_MINING_METADATA, &[Value::String("{\"a\":1}".into())]).unwrap();
        // head offset, length word, one padded data word
        assert_eq!(payload.len(), SELECTOR_LEN + 3 * WORD);
        assert_eq!(payload[SELECTOR_LEN + WORD - 1], WORD as u8);
        let call = decode_call(&payload).unwrap();
        assert_eq!(call.string(0).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn test_address_array_decode() {
        let guardians: Vec<Address> = (1..=3).map(|i| Address([i; 20])).collect();
        let payload = encode_by_name(NOMINATE_GUARDIANS, &[Value::AddressArray(guardians.clone())]).unwrap();
        assert_eq!(decode_call(&payload).unwrap().addresses(0).unwrap(), guardians);
    }

    #[test]
    fn test_dirty_address_padding_in_array_rejected() {
        let guardians: Vec<Address> = (1..=2).map(|i| Address([i; 20])).collect();
        let mut payload = encode_by_name(NOMINATE_GUARDIANS, &[Value::AddressArray(guardians)]).unwrap();
        // offset word, length word, then the first element's padding
        payload[SELECTOR_LEN + 2 * WORD] = 1;
        assert_eq!(
            decode_call(&payload),
            Err(AbiError::InvalidPadding { index: 0, param: "address" })
        );
    }

    #[test]
    fn test_empty_string_has_no_data_word() {
        let payload = encode_by_name(SET_MERGE_MINING_METADATA, &[Value::String(String::new())]).unwrap();
        assert_eq!(payload.len(), SELECTOR_LEN + 2 * WORD);
        assert_eq!(decode_call(&payload).unwrap().string(0).unwrap(), "");
    }

    #[test]
    fn test_oversized_length_rejected() {
        let mut payload = encode_by_name(SET_MERGE_MINING_METADATA, &[Value::String("x".into())]).unwrap();
        // length word lives at block offset 32
        payload[SELECTOR_LEN + 2 * WORD - 1] = 0xff;
        assert_eq!(
            decode_call(&payload),
            Err(AbiError::LengthOutOfRange { index: 0 })
        );
    }

    #[test]
    fn test_offset_out_of_range() {
        let mut payload = encode_by_name(NOMINATE_GUARDIANS, &[Value::AddressArray(vec![])]).unwrap();
        payload[SELECTOR_LEN + WORD - 1] = 0xf0;
        assert_eq!(
            decode_call(&payload),
            Err(AbiError::OffsetOutOfRange { index: 0 })
        );
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let mut payload = encode_by_name(SET_MERGE_MINING_METADATA, &[Value::String("ab".into())]).unwrap();
        payload[SELECTOR_LEN + 2 * WORD] = 0xff;
        assert_eq!(decode_call(&payload), Err(AbiError::InvalidUtf8 { index: 0 }));
    }

    #[test]
    fn test_short_and_unknown_payloads() {
        assert_eq!(decode_call(&[1, 2]), Err(AbiError::ShortPayload(2)));
        assert_eq!(
            decode_call(&[0xde, 0xad, 0xbe, 0xef]),
            Err(AbiError::UnknownSelector("deadbeef".into()))
        );
        let payload = set_share_chain(1, 1, 1);
        assert!(matches!(
            decode_call(&payload[..payload.len() - 1]),
            Err(AbiError::Truncated { .. })
        ));
    }

    #[test]
    fn test_decode_method_checks_name() {
        let payload = set_share_chain(1, 1, 1);
        assert!(decode_method(SET_SHARE_CHAIN, &payload).is_ok());
        assert_eq!(
            decode_method(ADD_SHARE, &payload),
            Err(AbiError::SelectorMismatch { expected: ADD_SHARE, found: SET_SHARE_CHAIN })
        );
    }

    #[test]
    fn test_encode_checks_types() {
        assert_eq!(
            encode_by_name(SET_SHARE_CHAIN, &[Value::Uint8(1)]),
            Err(AbiError::ArgumentCount { expected: 3, got: 1 })
        );
        assert_eq!(
            encode_by_name(SET_SHARE_CHAIN, &[Value::Uint32(1), Value::Uint32(1), Value::Uint32(1)]),
            Err(AbiError::TypeMismatch { index: 0, expected: "uint8" })
        );
    }

    #[test]
    fn test_parse_json_arguments() {
        let json: JsonValue = serde_json::json!(["0x0101010101010101010101010101010101010101"]);
        let value = ParamType::AddressArray.parse_json(0, &json).unwrap();
        assert_eq!(value, Value::AddressArray(vec![Address([1u8; 20])]));
        assert!(ParamType::Uint8.parse_json(0, &serde_json::json!(256)).is_err());
        assert_eq!(
            ParamType::Int32.parse_json(0, &serde_json::json!(-5)).unwrap(),
            Value::Int32(-5)
        );
    }
}
