// HEADER-CHAIN RELAY
// Mirrors the headers of an external proof-of-work chain and tracks the
// heaviest known tip.
//
// SAFETY CONSTRAINTS:
// 1. The relay is seeded exactly once, by the administrator
// 2. Every stored header has height = predecessor height + 1 and
//    work_sum = predecessor work_sum + work(bits)
// 3. The tip moves only to a header with strictly more cumulative work
// 4. Headers are content-addressed and never overwritten

use crate::pow_engine::{check_difficulty_floor, check_proof_of_work};
use log::{debug, info, warn};
use mergemine_core::{calc_work, BaseHeader, BlockHeader, HeaderChainInfo};
use mergemine_governance::{can_perform_merge_mining, check_header_chain_initialized, ensure_administrator};
use mergemine_state::{load_block_header, load_header_chain_info, save_block_header, save_header_chain_info};
use mergemine_vm::{CallEffect, ContractError, DecodedCall, ExecutionContext};

/// Read the six header fields starting at argument `first`.
pub fn base_header_from_call(call: &DecodedCall, first: usize) -> Result<BaseHeader, ContractError> {
    Ok(BaseHeader {
        version: call.int32(first)?,
        prev_block: call.hash(first + 1)?,
        merkle_root: call.hash(first + 2)?,
        timestamp: call.uint32(first + 3)?,
        bits: call.uint32(first + 4)?,
        nonce: call.uint32(first + 5)?,
    })
}

/// Seed the relay with a trusted header. A second seed is accepted and ignored.
pub fn set_initial_bitcoin_block_header(
    ctx: &mut ExecutionContext<'_>,
    call: &DecodedCall,
) -> Result<CallEffect, ContractError> {
    let merge_mining = can_perform_merge_mining(ctx)?;
    ensure_administrator(&ctx.sender, &merge_mining)?;

    let header = base_header_from_call(call, 0)?;
    let height = call.uint32(6)?;
    if height == 0 {
        return Err(ContractError::ForbiddenParam("genesis height must be positive"));
    }
    check_proof_of_work(&header, header.bits, &ctx.params.pow_limit())?;
    let hash = header.block_hash();

    let chain = load_header_chain_info(&*ctx.storage)?;
    if chain.is_initialized() {
        info!("Header chain already initialized at {}; ignoring genesis {}", chain.tip, hash);
        return Ok(CallEffect::Ignored);
    }

    let work_sum = calc_work(header.bits);
    let genesis = BlockHeader {
        header,
        height,
        work_sum: work_sum.clone(),
    };
    save_block_header(ctx.storage, &genesis)?;
    save_header_chain_info(
        ctx.storage,
        &HeaderChainInfo {
            tip: hash,
            tip_height: height,
            tip_work_sum: work_sum,
        },
    )?;
    info!("Header chain initialized at {} (height {})", hash, height);
    Ok(CallEffect::Applied)
}

/// Admit a successor header from any caller and apply heaviest-chain fork choice.
pub fn add_bitcoin_block_header(ctx: &mut ExecutionContext<'_>, call: &DecodedCall) -> Result<CallEffect, ContractError> {
    can_perform_merge_mining(ctx)?;
    let mut chain = check_header_chain_initialized(ctx)?;

    let header = base_header_from_call(call, 0)?;
    check_proof_of_work(&header, header.bits, &ctx.params.pow_limit())?;

    let prev = load_block_header(&*ctx.storage, &header.prev_block)?
        .ok_or(ContractError::PrevBlockNonExistent)?;
    if header.timestamp < prev.header.timestamp {
        warn!("Header timestamp {} precedes predecessor {}", header.timestamp, prev.header.timestamp);
        return Err(ContractError::ForbiddenParam("timestamp precedes previous block"));
    }
    let elapsed = u64::from(header.timestamp - prev.header.timestamp);
    check_difficulty_floor(prev.header.bits, header.bits, elapsed, ctx.params)?;

    let hash = header.block_hash();
    if load_block_header(&*ctx.storage, &hash)?.is_some() {
        return Err(ContractError::ForbiddenParam("duplicate header"));
    }

    let height = prev
        .height
        .checked_add(1)
        .ok_or(ContractError::ForbiddenParam("height overflow"))?;
    let admitted = BlockHeader {
        work_sum: &prev.work_sum + calc_work(header.bits),
        header,
        height,
    };
    save_block_header(ctx.storage, &admitted)?;

    if admitted.work_sum > chain.tip_work_sum {
        chain.tip = hash;
        chain.tip_height = admitted.height;
        chain.tip_work_sum = admitted.work_sum.clone();
        save_header_chain_info(ctx.storage, &chain)?;
        info!("New tip {} at height {}", hash, admitted.height);
    } else {
        debug!("Stored side-chain header {} at height {}", hash, admitted.height);
    }
    Ok(CallEffect::Applied)
}
