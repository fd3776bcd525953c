// CALL REPLAY
//
// Applies a recorded sequence of calls to a storage backend, in order,
// the way the host's block-sequencing layer would. Ordinary failures are
// recorded and the replay moves on; a fatal error stops the replay.

use log::{error, info};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use mergemine_core::{Address, HeaderChainInfo};
use mergemine_state::{load_header_chain_info, ContractStorage};
use mergemine_vm::methods::MethodSchema;
use mergemine_vm::{AbiError, CallEffect, ContractCall, ContractError, Momentum, Value};

use crate::contract::MergeMiningContract;

/// One call as written in a replay file.
#[derive(Debug, Clone, Deserialize)]
pub struct ReplayCall {
    pub sender: Address,

    #[serde(default)]
    pub amount: u64,

    pub method: String,

    /// Arguments in method-table order
    #[serde(default)]
    pub args: Vec<JsonValue>,

    pub momentum_height: u64,

    #[serde(default = "default_spork_active")]
    pub spork_active: bool,
}

fn default_spork_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReplayRecord {
    pub index: usize,
    pub method: String,
    pub momentum_height: u64,

    /// Canonical payload, when the arguments encoded
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<CallEffect>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub records: Vec<ReplayRecord>,
    pub header_chain: HeaderChainInfo,
}

/// Convert JSON arguments into typed values for `method`.
pub fn parse_json_args(method: &str, args: &[JsonValue]) -> Result<Vec<Value>, ContractError> {
    let schema = MethodSchema::by_name(method).ok_or_else(|| ContractError::UnknownMethod(method.to_string()))?;
    if schema.inputs.len() != args.len() {
        return Err(AbiError::ArgumentCount {
            expected: schema.inputs.len(),
            got: args.len(),
        }
        .into());
    }
    let mut values = Vec::with_capacity(args.len());
    for (index, ((_, param), json)) in schema.inputs.iter().zip(args).enumerate() {
        values.push(param.parse_json(index, json)?);
    }
    Ok(values)
}

/// Apply `calls` in order. Returns the first fatal error, if any.
pub fn replay(
    contract: &MergeMiningContract,
    storage: &mut dyn ContractStorage,
    calls: &[ReplayCall],
) -> Result<ReplaySummary, ContractError> {
    let mut records = Vec::with_capacity(calls.len());

    for (index, entry) in calls.iter().enumerate() {
        let mut record = ReplayRecord {
            index,
            method: entry.method.clone(),
            momentum_height: entry.momentum_height,
            data: None,
            effect: None,
            error: None,
        };

        let encoded = parse_json_args(&entry.method, &entry.args)
            .and_then(|args| ContractCall::encode(entry.sender, u128::from(entry.amount), &entry.method, &args));
        let mut call = match encoded {
            Ok(call) => call,
            Err(e) => {
                record.error = Some(e.to_string());
                records.push(record);
                continue;
            }
        };

        let host = Momentum {
            height: entry.momentum_height,
            merge_mining_active: entry.spork_active,
        };
        let outcome = contract.execute(storage, &host, &mut call);
        record.data = Some(hex::encode(&call.data));
        match outcome {
            Ok(effect) => record.effect = Some(effect),
            Err(e) if e.is_fatal() => {
                error!("Replay stopped at call {} ({}): {}", index, entry.method, e);
                return Err(e);
            }
            Err(e) => record.error = Some(e.to_string()),
        }
        records.push(record);
    }

    let header_chain = load_header_chain_info(storage)?;
    info!(
        "Replayed {} calls; tip {} at height {}",
        records.len(),
        header_chain.tip,
        header_chain.tip_height
    );
    Ok(ReplaySummary { records, header_chain })
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergemine_core::ProtocolParams;
    use mergemine_state::{MemoryStorage, StateError};
    use mergemine_vm::methods::{EMERGENCY, SET_MERGE_MINING_METADATA, SET_SHARE_CHAIN};

    fn admin() -> Address {
        Address([0xAD; 20])
    }

    fn contract() -> MergeMiningContract {
        MergeMiningContract::new(ProtocolParams::regtest(admin())).unwrap()
    }

    fn parse(json: &str) -> Vec<ReplayCall> {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_replay_call_defaults() {
        let calls = parse(&format!(
            r#"[{{"sender": "{}", "method": "Emergency", "momentum_height": 7}}]"#,
            admin()
        ));
        assert_eq!(calls[0].amount, 0);
        assert!(calls[0].args.is_empty());
        assert!(calls[0].spork_active);
    }

    #[test]
    fn test_parse_json_args_checks_arity_and_types() {
        let err = parse_json_args(SET_SHARE_CHAIN, &[serde_json::json!(1)]).unwrap_err();
        assert_eq!(
            err,
            ContractError::DecodeError(AbiError::ArgumentCount { expected: 3, got: 1 })
        );

        let err = parse_json_args(SET_SHARE_CHAIN, &[serde_json::json!(256), serde_json::json!(1), serde_json::json!(1)])
            .unwrap_err();
        assert!(matches!(err, ContractError::DecodeError(AbiError::InvalidJsonArgument { index: 0, .. })));

        let values = parse_json_args(SET_SHARE_CHAIN, &[serde_json::json!(1), serde_json::json!(2), serde_json::json!(3)])
            .unwrap();
        assert_eq!(values, vec![Value::Uint8(1), Value::Uint32(2), Value::Uint32(3)]);

        assert_eq!(
            parse_json_args("Mint", &[]).unwrap_err(),
            ContractError::UnknownMethod("Mint".to_string())
        );
    }

    #[test]
    fn test_replay_records_failures_and_continues() {
        let calls = vec![
            ReplayCall {
                sender: admin(),
                amount: 0,
                method: "Mint".to_string(),
                args: vec![],
                momentum_height: 1,
                spork_active: true,
            },
            ReplayCall {
                sender: admin(),
                amount: 5,
                method: EMERGENCY.to_string(),
                args: vec![],
                momentum_height: 2,
                spork_active: true,
            },
            ReplayCall {
                sender: admin(),
                amount: 0,
                method: SET_MERGE_MINING_METADATA.to_string(),
                args: vec![serde_json::json!("{\"name\":\"pool\"}")],
                momentum_height: 3,
                spork_active: true,
            },
        ];
        let mut storage = MemoryStorage::new();
        let summary = replay(&contract(), &mut storage, &calls).unwrap();

        assert_eq!(summary.records.len(), 3);
        assert!(summary.records[0].data.is_none());
        assert!(summary.records[0].error.is_some());
        assert_eq!(
            summary.records[1].error.as_deref(),
            Some(ContractError::InvalidTokenOrAmount.to_string().as_str())
        );
        assert_eq!(summary.records[2].effect, Some(CallEffect::Applied));
        assert!(!summary.header_chain.is_initialized());
    }

    struct BrokenStorage;

    impl ContractStorage for BrokenStorage {
        fn get(&self, _key: &[u8]) -> Result<Option<Vec<u8>>, StateError> {
            Err(StateError::Backend("unreachable backend".to_string()))
        }

        fn put(&mut self, _key: &[u8], _value: &[u8]) -> Result<(), StateError> {
            Err(StateError::Backend("unreachable backend".to_string()))
        }
    }

    #[test]
    fn test_replay_stops_on_fatal_error() {
        let calls = vec![ReplayCall {
            sender: admin(),
            amount: 0,
            method: SET_MERGE_MINING_METADATA.to_string(),
            args: vec![serde_json::json!("{}")],
            momentum_height: 3,
            spork_active: true,
        }];
        let err = replay(&contract(), &mut BrokenStorage, &calls).unwrap_err();
        assert!(err.is_fatal());
    }
}
