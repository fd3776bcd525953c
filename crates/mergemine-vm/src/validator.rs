// CALL VALIDATOR / CANONICALIZER
//
// Runs before any handler: decodes the payload against the method table,
// enforces the attached-amount policy, and rewrites the payload in
// canonical form so the call record is hashed over canonical bytes.
//
// SAFETY INVARIANTS:
// 1. validate_call is pure apart from rewriting `call.data`
// 2. Re-validating an already canonical call leaves `call.data` unchanged
// 3. A call that fails validation is left untouched

use crate::abi::{decode_call, encode_call, DecodedCall, Value};
use crate::errors::ContractError;
use crate::methods::MethodSchema;
use mergemine_core::Address;
use serde::Serialize;
use tracing::{debug, warn};

/// A call as recorded by the host: sender, attached amount and raw payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContractCall {
    pub sender: Address,

    /// Attached token amount in base units
    pub amount: u128,

    #[serde(with = "hex_bytes")]
    pub data: Vec<u8>,
}

impl ContractCall {
    pub fn new(sender: Address, amount: u128, data: Vec<u8>) -> Self {
        ContractCall { sender, amount, data }
    }

    /// Build a call from a method name and its arguments.
    pub fn encode(sender: Address, amount: u128, method: &str, args: &[Value]) -> Result<Self, ContractError> {
        let schema = MethodSchema::by_name(method).ok_or_else(|| ContractError::UnknownMethod(method.to_string()))?;
        let data = encode_call(schema, args)?;
        Ok(ContractCall::new(sender, amount, data))
    }
}

/// Decode, check the amount policy, and canonicalize `call.data` in place.
pub fn validate_call(call: &mut ContractCall) -> Result<DecodedCall, ContractError> {
    let decoded = decode_call(&call.data).map_err(|e| {
        warn!("Rejected call from {}: {}", call.sender, e);
        ContractError::from(e)
    })?;

    // No method of this contract accepts funds.
    if call.amount != 0 {
        warn!("{} called with non-zero amount {}", decoded.name(), call.amount);
        return Err(ContractError::InvalidTokenOrAmount);
    }

    let canonical = decoded.encode()?;
    if canonical != call.data {
        debug!(
            "Canonicalized {} payload ({} -> {} bytes)",
            decoded.name(),
            call.data.len(),
            canonical.len()
        );
        call.data = canonical;
    }
    Ok(decoded)
}

mod hex_bytes {
    use serde::Serializer;

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }
}
