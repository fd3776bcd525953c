// Typed views over the contract's key-value namespace.
//
// Key layout (first byte is the record prefix):
//   [1]                    MergeMiningInfo
//   [2]                    HeaderChainInfo
//   [3] ++ id              ShareChainInfo
//   [4] ++ hash(32)        BlockHeader
//   [5]                    SecurityInfo
//   [6] ++ method name     TimeChallengeInfo
//
// Values are bincode-encoded.

use crate::storage::{ContractStorage, StateError};
use log::trace;
use mergemine_core::{
    BlockHeader, Hash, HeaderChainInfo, MergeMiningInfo, ProtocolParams, SecurityInfo,
    ShareChainInfo, TimeChallengeInfo,
};
use serde::{de::DeserializeOwned, Serialize};

pub const MERGE_MINING_INFO_PREFIX: u8 = 1;
pub const HEADER_CHAIN_INFO_PREFIX: u8 = 2;
pub const SHARE_CHAIN_INFO_PREFIX: u8 = 3;
pub const BLOCK_HEADER_PREFIX: u8 = 4;
pub const SECURITY_INFO_PREFIX: u8 = 5;
pub const TIME_CHALLENGE_INFO_PREFIX: u8 = 6;

pub fn share_chain_key(id: u8) -> Vec<u8> {
    vec![SHARE_CHAIN_INFO_PREFIX, id]
}

pub fn block_header_key(hash: &Hash) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + Hash::LEN);
    key.push(BLOCK_HEADER_PREFIX);
    key.extend_from_slice(hash.as_bytes());
    key
}

pub fn time_challenge_key(method_name: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(1 + method_name.len());
    key.push(TIME_CHALLENGE_INFO_PREFIX);
    key.extend_from_slice(method_name.as_bytes());
    key
}

fn load<T: DeserializeOwned>(
    storage: &dyn ContractStorage,
    key: &[u8],
    record: &'static str,
) -> Result<Option<T>, StateError> {
    match storage.get(key)? {
        None => Ok(None),
        Some(bytes) => bincode::deserialize(&bytes)
            .map(Some)
            .map_err(|e| StateError::Corrupted {
                record,
                key: hex::encode(key),
                reason: e.to_string(),
            }),
    }
}

fn store<T: Serialize>(
    storage: &mut dyn ContractStorage,
    key: &[u8],
    value: &T,
    record: &'static str,
) -> Result<(), StateError> {
    let bytes = bincode::serialize(value).map_err(|e| StateError::Encode {
        record,
        reason: e.to_string(),
    })?;
    trace!("Writing {} ({} bytes) at {}", record, bytes.len(), hex::encode(key));
    storage.put(key, &bytes)
}

/// Reads as the configured initial administrator with no TSS key when never written.
pub fn load_merge_mining_info(
    storage: &dyn ContractStorage,
    params: &ProtocolParams,
) -> Result<MergeMiningInfo, StateError> {
    Ok(load(storage, &[MERGE_MINING_INFO_PREFIX], "MergeMiningInfo")?
        .unwrap_or_else(|| MergeMiningInfo::with_administrator(params.initial_administrator)))
}

pub fn save_merge_mining_info(
    storage: &mut dyn ContractStorage,
    info: &MergeMiningInfo,
) -> Result<(), StateError> {
    store(storage, &[MERGE_MINING_INFO_PREFIX], info, "MergeMiningInfo")
}

pub fn load_header_chain_info(storage: &dyn ContractStorage) -> Result<HeaderChainInfo, StateError> {
    Ok(load(storage, &[HEADER_CHAIN_INFO_PREFIX], "HeaderChainInfo")?.unwrap_or_default())
}

pub fn save_header_chain_info(
    storage: &mut dyn ContractStorage,
    info: &HeaderChainInfo,
) -> Result<(), StateError> {
    store(storage, &[HEADER_CHAIN_INFO_PREFIX], info, "HeaderChainInfo")
}

pub fn load_share_chain_info(
    storage: &dyn ContractStorage,
    id: u8,
) -> Result<Option<ShareChainInfo>, StateError> {
    load(storage, &share_chain_key(id), "ShareChainInfo")
}

pub fn save_share_chain_info(
    storage: &mut dyn ContractStorage,
    info: &ShareChainInfo,
) -> Result<(), StateError> {
    store(storage, &share_chain_key(info.id), info, "ShareChainInfo")
}

/// All configured share chains in id order.
pub fn load_share_chains(storage: &dyn ContractStorage) -> Result<Vec<ShareChainInfo>, StateError> {
    let mut chains = Vec::new();
    for id in u8::MIN..=u8::MAX {
        if let Some(info) = load_share_chain_info(storage, id)? {
            chains.push(info);
        }
    }
    Ok(chains)
}

pub fn load_block_header(
    storage: &dyn ContractStorage,
    hash: &Hash,
) -> Result<Option<BlockHeader>, StateError> {
    load(storage, &block_header_key(hash), "BlockHeader")
}

/// Stored under the header's own hash.
pub fn save_block_header(
    storage: &mut dyn ContractStorage,
    header: &BlockHeader,
) -> Result<(), StateError> {
    store(storage, &block_header_key(&header.hash()), header, "BlockHeader")
}

/// Reads as an empty guardian set with the minimum delays when never written.
pub fn load_security_info(
    storage: &dyn ContractStorage,
    params: &ProtocolParams,
) -> Result<SecurityInfo, StateError> {
    Ok(load(storage, &[SECURITY_INFO_PREFIX], "SecurityInfo")?.unwrap_or_else(|| {
        SecurityInfo::new(params.min_administrator_delay, params.min_soft_delay)
    }))
}

pub fn save_security_info(
    storage: &mut dyn ContractStorage,
    info: &SecurityInfo,
) -> Result<(), StateError> {
    store(storage, &[SECURITY_INFO_PREFIX], info, "SecurityInfo")
}

pub fn load_time_challenge_info(
    storage: &dyn ContractStorage,
    method_name: &str,
) -> Result<Option<TimeChallengeInfo>, StateError> {
    load(storage, &time_challenge_key(method_name), "TimeChallengeInfo")
}

pub fn save_time_challenge_info(
    storage: &mut dyn ContractStorage,
    info: &TimeChallengeInfo,
) -> Result<(), StateError> {
    store(storage, &time_challenge_key(&info.method_name), info, "TimeChallengeInfo")
}
