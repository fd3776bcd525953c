// Administrator-gated configuration: administrator handover, TSS key
// rotation and free-form metadata.

use crate::access::{check_security_initialized, ensure_administrator};
use crate::time_challenge::time_challenge;
use log::info;
use mergemine_core::Hash;
use mergemine_crypto::{decode_compressed_pubkey, decompress_pubkey, encode_key, sha3_256};
use mergemine_state::{load_merge_mining_info, save_merge_mining_info};
use mergemine_vm::methods::{CHANGE_ADMINISTRATOR, CHANGE_TSS_ECDSA_PUB_KEY};
use mergemine_vm::{CallEffect, ContractError, DecodedCall, ExecutionContext};

pub fn change_administrator(ctx: &mut ExecutionContext<'_>, call: &DecodedCall) -> Result<CallEffect, ContractError> {
    let new_administrator = call.address(0)?;
    if new_administrator.is_zero() {
        return Err(ContractError::ForbiddenParam("administrator address is zero"));
    }

    let mut merge_mining = load_merge_mining_info(&*ctx.storage, ctx.params)?;
    ensure_administrator(&ctx.sender, &merge_mining)?;
    let security = check_security_initialized(ctx)?;

    let params_hash = Hash(sha3_256(new_administrator.as_bytes()));
    let outcome = time_challenge(ctx, CHANGE_ADMINISTRATOR, params_hash, security.administrator_delay)?;
    if let Some(effect) = outcome.deferred_effect(params_hash) {
        return Ok(effect);
    }

    merge_mining.administrator = new_administrator;
    save_merge_mining_info(ctx.storage, &merge_mining)?;
    info!("Administrator changed to {}", new_administrator);
    Ok(CallEffect::Applied)
}

/// Rotate the TSS key. The signature arguments are canonicalized with the
/// call but not verified: the path is administrator-gated and delayed.
pub fn change_tss_ecdsa_pub_key(ctx: &mut ExecutionContext<'_>, call: &DecodedCall) -> Result<CallEffect, ContractError> {
    let pub_key = call.string(0)?;
    let compressed = decode_compressed_pubkey(&pub_key)?;
    let uncompressed = decompress_pubkey(&compressed)?;

    let security = check_security_initialized(ctx)?;
    let mut merge_mining = load_merge_mining_info(&*ctx.storage, ctx.params)?;
    ensure_administrator(&ctx.sender, &merge_mining)?;

    let params_hash = Hash(sha3_256(&uncompressed));
    let outcome = time_challenge(ctx, CHANGE_TSS_ECDSA_PUB_KEY, params_hash, security.soft_delay)?;
    if let Some(effect) = outcome.deferred_effect(params_hash) {
        return Ok(effect);
    }

    merge_mining.compressed_tss_ecdsa_pub_key = pub_key;
    merge_mining.decompressed_tss_ecdsa_pub_key = encode_key(&uncompressed);
    save_merge_mining_info(ctx.storage, &merge_mining)?;
    info!("TSS key changed to {}", merge_mining.compressed_tss_ecdsa_pub_key);
    Ok(CallEffect::Applied)
}

/// Replace the metadata; any well-formed JSON document is accepted.
pub fn set_merge_mining_metadata(ctx: &mut ExecutionContext<'_>, call: &DecodedCall) -> Result<CallEffect, ContractError> {
    let metadata = call.string(0)?;
    if serde_json::from_str::<serde_json::Value>(&metadata).is_err() {
        return Err(ContractError::InvalidJsonContent);
    }

    let mut merge_mining = load_merge_mining_info(&*ctx.storage, ctx.params)?;
    ensure_administrator(&ctx.sender, &merge_mining)?;

    merge_mining.metadata = metadata;
    save_merge_mining_info(ctx.storage, &merge_mining)?;
    info!("Merge-mining metadata updated ({} bytes)", merge_mining.metadata.len());
    Ok(CallEffect::Applied)
}
