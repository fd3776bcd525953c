// GUARDIAN QUORUM SUCCESSION
//
// The administrator nominates a guardian set (time-challenge gated with the
// administrator delay). While the administrator is zero (emergency mode)
// guardians vote for a successor; a strict majority installs it.
//
// SAFETY INVARIANTS:
// 1. Nomination resets every vote
// 2. Votes are only accepted in emergency mode, and only from guardians
// 3. The first candidate whose count exceeds len/2 wins, in vote-array order
// 4. Votes are cleared the moment a successor is installed

use crate::access::{check_security_initialized, ensure_administrator};
use crate::time_challenge::time_challenge;
use log::{info, warn};
use mergemine_core::{Address, Hash, SecurityInfo};
use mergemine_crypto::sha3_256;
use mergemine_state::{
    load_merge_mining_info, load_security_info, save_merge_mining_info, save_security_info, StateError,
    SECURITY_INFO_PREFIX,
};
use mergemine_vm::methods::NOMINATE_GUARDIANS;
use mergemine_vm::{CallEffect, ContractError, DecodedCall, ExecutionContext};

/// Sort, then reject short lists, zero addresses and duplicates.
fn normalize_guardians(mut guardians: Vec<Address>, min: usize) -> Result<Vec<Address>, ContractError> {
    if guardians.len() < min {
        return Err(ContractError::InvalidGuardians {
            got: guardians.len(),
            min,
        });
    }
    if guardians.iter().any(Address::is_zero) {
        return Err(ContractError::ForbiddenParam("guardian address is zero"));
    }
    guardians.sort();
    if guardians.windows(2).any(|pair| pair[0] == pair[1]) {
        return Err(ContractError::ForbiddenParam("duplicate guardian"));
    }
    Ok(guardians)
}

/// Fingerprint of a sorted guardian list.
pub fn guardians_fingerprint(guardians: &[Address]) -> Hash {
    let bytes: Vec<u8> = guardians.iter().flat_map(|g| g.as_bytes().iter().copied()).collect();
    Hash(sha3_256(&bytes))
}

pub fn nominate_guardians(ctx: &mut ExecutionContext<'_>, call: &DecodedCall) -> Result<CallEffect, ContractError> {
    let guardians = normalize_guardians(call.addresses(0)?, ctx.params.min_guardians)?;

    let merge_mining = load_merge_mining_info(&*ctx.storage, ctx.params)?;
    ensure_administrator(&ctx.sender, &merge_mining)?;

    let mut security = load_security_info(&*ctx.storage, ctx.params)?;
    let params_hash = guardians_fingerprint(&guardians);
    let outcome = time_challenge(ctx, NOMINATE_GUARDIANS, params_hash, security.administrator_delay)?;
    if let Some(effect) = outcome.deferred_effect(params_hash) {
        return Ok(effect);
    }

    security.guardians = guardians;
    security.clear_votes();
    save_security_info(ctx.storage, &security)?;
    info!("Nominated {} guardians", security.guardians.len());
    Ok(CallEffect::Applied)
}

/// First candidate, in vote order, whose count exceeds half the guardian set.
pub fn tally_votes(security: &SecurityInfo) -> Option<Address> {
    let threshold = security.guardians.len() / 2;
    let mut counts: Vec<(Address, usize)> = Vec::new();
    for vote in security.guardians_votes.iter().filter(|v| !v.is_zero()) {
        let count = match counts.iter_mut().find(|(candidate, _)| candidate == vote) {
            Some((_, count)) => {
                *count += 1;
                *count
            }
            None => {
                counts.push((*vote, 1));
                1
            }
        };
        if count > threshold {
            return Some(*vote);
        }
    }
    None
}

pub fn propose_administrator(ctx: &mut ExecutionContext<'_>, call: &DecodedCall) -> Result<CallEffect, ContractError> {
    let proposed = call.address(0)?;
    if proposed.is_zero() {
        return Err(ContractError::ForbiddenParam("proposed administrator is zero"));
    }

    let mut merge_mining = load_merge_mining_info(&*ctx.storage, ctx.params)?;
    if !merge_mining.is_emergency() {
        return Err(ContractError::NotEmergency);
    }

    let mut security = load_security_info(&*ctx.storage, ctx.params)?;
    let index = security.guardian_index(&ctx.sender).ok_or_else(|| {
        warn!("{} is not a guardian", ctx.sender);
        ContractError::NotGuardian
    })?;
    let slot = security.guardians_votes.get_mut(index).ok_or_else(|| StateError::Corrupted {
        record: "SecurityInfo",
        key: format!("{:02x}", SECURITY_INFO_PREFIX),
        reason: format!("no vote slot for guardian {}", index),
    })?;
    *slot = proposed;
    info!("Guardian {} voted for {}", ctx.sender, proposed);

    if let Some(winner) = tally_votes(&security) {
        merge_mining.administrator = winner;
        save_merge_mining_info(ctx.storage, &merge_mining)?;
        security.clear_votes();
        info!("Guardian quorum installed administrator {}", winner);
    }
    save_security_info(ctx.storage, &security)?;
    Ok(CallEffect::Applied)
}

/// The administrator gives up its role, entering emergency mode.
pub fn emergency(ctx: &mut ExecutionContext<'_>, _call: &DecodedCall) -> Result<CallEffect, ContractError> {
    let mut merge_mining = load_merge_mining_info(&*ctx.storage, ctx.params)?;
    check_security_initialized(ctx)?;
    ensure_administrator(&ctx.sender, &merge_mining)?;

    merge_mining.administrator = Address::ZERO;
    save_merge_mining_info(ctx.storage, &merge_mining)?;
    warn!("Emergency mode entered by {}", ctx.sender);
    Ok(CallEffect::Applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn security_with_votes(votes: &[u8]) -> SecurityInfo {
        let mut security = SecurityInfo::new(20, 10);
        security.guardians = (1..=votes.len() as u8).map(|i| Address([i; 20])).collect();
        security.guardians_votes = votes
            .iter()
            .map(|v| if *v == 0 { Address::ZERO } else { Address([0x80 + v; 20]) })
            .collect();
        security
    }

    #[test]
    fn test_tally_needs_strict_majority() {
        // 5 guardians: threshold 2, three votes needed
        assert_eq!(tally_votes(&security_with_votes(&[1, 1, 0, 0, 0])), None);
        assert_eq!(tally_votes(&security_with_votes(&[1, 1, 0, 1, 0])), Some(Address([0x81; 20])));
        // 4 guardians: threshold 2, three votes needed
        assert_eq!(tally_votes(&security_with_votes(&[1, 1, 2, 2])), None);
    }

    #[test]
    fn test_tally_ignores_empty_votes() {
        assert_eq!(tally_votes(&security_with_votes(&[0, 0, 0])), None);
    }

    #[test]
    fn test_tally_first_to_exceed_wins() {
        // Only reachable with inconsistent state, but the pass must stop at the first winner.
        let mut security = security_with_votes(&[1, 2, 1, 2, 1, 2]);
        security.guardians.truncate(2);
        assert_eq!(tally_votes(&security), Some(Address([0x81; 20])));
    }

    #[test]
    fn test_normalize_guardians() {
        let list = vec![Address([3u8; 20]), Address([1u8; 20]), Address([2u8; 20])];
        assert_eq!(
            normalize_guardians(list.clone(), 3).unwrap(),
            vec![Address([1u8; 20]), Address([2u8; 20]), Address([3u8; 20])]
        );
        assert_eq!(
            normalize_guardians(list, 4),
            Err(ContractError::InvalidGuardians { got: 3, min: 4 })
        );
        assert!(matches!(
            normalize_guardians(vec![Address([1u8; 20]), Address::ZERO], 2),
            Err(ContractError::ForbiddenParam(_))
        ));
        assert!(matches!(
            normalize_guardians(vec![Address([1u8; 20]), Address([1u8; 20])], 2),
            Err(ContractError::ForbiddenParam(_))
        ));
    }

    #[test]
    fn test_fingerprint_is_order_sensitive_after_sort() {
        let a = vec![Address([1u8; 20]), Address([2u8; 20])];
        let b = vec![Address([2u8; 20]), Address([1u8; 20])];
        assert_ne!(guardians_fingerprint(&a), guardians_fingerprint(&b));
        assert_eq!(
            guardians_fingerprint(&normalize_guardians(b, 2).unwrap()),
            guardians_fingerprint(&a)
        );
    }
}
