// Share-chain registry and share admission.
//
// Shares are validated against their share chain's difficulty and then
// dropped; nothing about an accepted share is persisted.

use crate::pow_engine::check_proof_of_work;
use log::{debug, info};
use mergemine_core::{Hash, Share, ShareChainInfo, SHARE_PROOF_COUNT};
use mergemine_crypto::sha3_256;
use mergemine_governance::{
    can_perform_merge_mining, check_header_chain_initialized, check_merge_mining_initialized,
    check_security_initialized, ensure_administrator, time_challenge,
};
use mergemine_state::{load_block_header, load_share_chain_info, save_share_chain_info};
use mergemine_vm::methods::SET_SHARE_CHAIN;
use mergemine_vm::{CallEffect, ContractError, DecodedCall, ExecutionContext};

pub fn share_from_call(call: &DecodedCall) -> Result<Share, ContractError> {
    let mut proofs = [Hash::ZERO; SHARE_PROOF_COUNT];
    for (i, proof) in proofs.iter_mut().enumerate() {
        *proof = call.hash(7 + i)?;
    }
    Ok(Share {
        share_chain_id: call.uint8(0)?,
        witness: call.boolean(1)?,
        version: call.int32(2)?,
        prev_block: call.hash(3)?,
        merkle_root: call.hash(4)?,
        timestamp: call.uint32(5)?,
        nonce: call.uint32(6)?,
        proofs,
        additional_data: call.hash(7 + SHARE_PROOF_COUNT)?,
    })
}

fn share_chain_fingerprint(info: &ShareChainInfo) -> Hash {
    let mut bytes = Vec::with_capacity(9);
    bytes.push(info.id);
    bytes.extend_from_slice(&info.bits.to_le_bytes());
    bytes.extend_from_slice(&info.reward_multiplier.to_le_bytes());
    Hash(sha3_256(&bytes))
}

/// Create or update a share chain, delayed by the soft delay.
pub fn set_share_chain(ctx: &mut ExecutionContext<'_>, call: &DecodedCall) -> Result<CallEffect, ContractError> {
    let security = check_security_initialized(ctx)?;
    let merge_mining = check_merge_mining_initialized(ctx)?;
    ensure_administrator(&ctx.sender, &merge_mining)?;

    let info = ShareChainInfo {
        id: call.uint8(0)?,
        bits: call.uint32(1)?,
        reward_multiplier: call.uint32(2)?,
    };
    let params_hash = share_chain_fingerprint(&info);
    let outcome = time_challenge(ctx, SET_SHARE_CHAIN, params_hash, security.soft_delay)?;
    if let Some(effect) = outcome.deferred_effect(params_hash) {
        return Ok(effect);
    }

    save_share_chain_info(ctx.storage, &info)?;
    info!(
        "Share chain {} set: bits {:#x}, reward multiplier {}",
        info.id, info.bits, info.reward_multiplier
    );
    Ok(CallEffect::Applied)
}

/// Validate a share against its share chain. Open to any caller.
pub fn add_share(ctx: &mut ExecutionContext<'_>, call: &DecodedCall) -> Result<CallEffect, ContractError> {
    can_perform_merge_mining(ctx)?;
    let chain = check_header_chain_initialized(ctx)?;

    let share = share_from_call(call)?;
    let share_chain = load_share_chain_info(&*ctx.storage, share.share_chain_id)?
        .ok_or(ContractError::ShareChainNonExistent)?;
    let prev = load_block_header(&*ctx.storage, &share.prev_block)?
        .ok_or(ContractError::PrevBlockNonExistent)?;

    // At most one block behind the tip.
    if u64::from(prev.height) + 1 < u64::from(chain.tip_height) {
        debug!("Share references height {}, tip is {}", prev.height, chain.tip_height);
        return Err(ContractError::ForbiddenParam("share references a stale block"));
    }
    if share.timestamp < prev.header.timestamp {
        return Err(ContractError::ForbiddenParam("timestamp precedes previous block"));
    }

    let base = share.base_header(prev.header.bits);
    check_proof_of_work(&base, share_chain.bits, &ctx.params.pow_limit())?;

    // TODO: attribute the share to a rewarder once reward accounting exists.
    info!(
        "Accepted share {} for chain {} on {}",
        base.block_hash(),
        share.share_chain_id,
        share.prev_block
    );
    Ok(CallEffect::Applied)
}
