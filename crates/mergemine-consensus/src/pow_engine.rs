// PROOF-OF-WORK VERIFICATION
// Header and share PoW checks, and the easiest-difficulty bound that keeps
// a relayed header from claiming less work than its predecessor allows.
//
// SAFETY CONSTRAINTS:
// 1. Targets are compared as integers, never as compact encodings
// 2. A target above the protocol limit is never accepted
// 3. Difficulty may only relax by the adjustment factor once per full
//    retarget interval of elapsed time

use log::debug;
use mergemine_core::{big_to_compact, compact_to_big, is_met_by, BaseHeader, ProtocolParams};
use mergemine_vm::ContractError;
use num_bigint::{BigInt, Sign};

/// Verify that `header` hashes at or below the target encoded by `target_bits`.
///
/// `target_bits` is the header's own bits for relayed blocks and the share
/// chain's bits for shares.
pub fn check_proof_of_work(header: &BaseHeader, target_bits: u32, pow_limit: &BigInt) -> Result<(), ContractError> {
    let hash = header.block_hash();
    let target = compact_to_big(target_bits);
    if target.sign() != Sign::Plus {
        return Err(ContractError::TargetDifficultyLessThanZero);
    }
    if !is_met_by(&target, &hash) {
        debug!("Hash {} above target {:#x}", hash, target_bits);
        return Err(ContractError::InvalidNonce);
    }
    if target > *pow_limit {
        return Err(ContractError::PowLimitExceeded);
    }
    Ok(())
}

/// Easiest target reachable from `bits` after `elapsed_secs`, rounded through compact form.
pub fn easiest_target(bits: u32, elapsed_secs: u64, params: &ProtocolParams) -> BigInt {
    let limit = params.pow_limit();
    let factor = BigInt::from(params.retarget_adjustment_factor);
    let timespan = params.max_retarget_timespan_secs().max(1);

    let mut intervals = elapsed_secs / timespan;
    let mut target = compact_to_big(bits);
    while intervals > 0 && target < limit {
        target *= &factor;
        intervals -= 1;
    }
    if target > limit {
        target = limit;
    }
    match big_to_compact(&target) {
        Some(compact) => compact_to_big(compact),
        None => target,
    }
}

/// Reject `bits` if its target is looser than the easiest one reachable from `prev_bits`.
pub fn check_difficulty_floor(
    prev_bits: u32,
    bits: u32,
    elapsed_secs: u64,
    params: &ProtocolParams,
) -> Result<(), ContractError> {
    let easiest = easiest_target(prev_bits, elapsed_secs, params);
    if compact_to_big(bits) > easiest {
        debug!(
            "Bits {:#x} easier than {:#x} after {}s",
            bits,
            easiest,
            elapsed_secs
        );
        return Err(ContractError::DifficultyLessThanMin);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mergemine_core::{Address, Hash};
    use proptest::prelude::*;

    const MAINNET_BITS: u32 = 386097875;

    fn h0() -> BaseHeader {
        BaseHeader {
            version: 644612096,
            prev_block: Hash::from_hex("0000000000000000000090937d63bfb7b27a1cf1073d6bd309195c62753c87b3").unwrap(),
            merkle_root: Hash::from_hex("a76c7189bc34c9614d8848cc4074037db2f7cab329f646a23ad27a5628a573b1").unwrap(),
            timestamp: 1712573645,
            bits: MAINNET_BITS,
            nonce: 1731415048,
        }
    }

    fn mainnet() -> ProtocolParams {
        ProtocolParams::mainnet(Address([1u8; 20]))
    }

    fn regtest() -> ProtocolParams {
        ProtocolParams::regtest(Address([1u8; 20]))
    }

    /// Bump the nonce until the header meets `bits`.
    fn mine(mut header: BaseHeader, bits: u32, limit: &BigInt) -> BaseHeader {
        header.bits = bits;
        while check_proof_of_work(&header, bits, limit).is_err() {
            header.nonce += 1;
        }
        header
    }

    #[test]
    fn test_mainnet_header_passes() {
        assert!(check_proof_of_work(&h0(), MAINNET_BITS, &mainnet().pow_limit()).is_ok());
    }

    #[test]
    fn test_wrong_nonce_rejected() {
        let mut header = h0();
        header.nonce += 1;
        assert_eq!(
            check_proof_of_work(&header, MAINNET_BITS, &mainnet().pow_limit()),
            Err(ContractError::InvalidNonce)
        );
    }

    #[test]
    fn test_non_positive_target_rejected() {
        let limit = mainnet().pow_limit();
        assert_eq!(check_proof_of_work(&h0(), 0, &limit), Err(ContractError::TargetDifficultyLessThanZero));
        // sign bit set
        assert_eq!(
            check_proof_of_work(&h0(), 0x1d80_ffff, &limit),
            Err(ContractError::TargetDifficultyLessThanZero)
        );
    }

    #[test]
    fn test_target_above_limit_rejected() {
        let header = mine(h0(), 0x207f_ffff, &regtest().pow_limit());
        assert_eq!(
            check_proof_of_work(&header, 0x207f_ffff, &mainnet().pow_limit()),
            Err(ContractError::PowLimitExceeded)
        );
    }

    #[test]
    fn test_easiest_difficulty_without_elapsed_interval() {
        let params = mainnet();
        let timespan = params.max_retarget_timespan_secs();
        let base = compact_to_big(MAINNET_BITS);
        assert_eq!(easiest_target(MAINNET_BITS, 0, &params), base);
        assert_eq!(easiest_target(MAINNET_BITS, timespan - 1, &params), base);
    }

    #[test]
    fn test_easiest_difficulty_relaxes_per_interval() {
        let params = mainnet();
        let timespan = params.max_retarget_timespan_secs();
        let base = compact_to_big(MAINNET_BITS);
        assert_eq!(easiest_target(MAINNET_BITS, timespan, &params), &base * 4);
        assert_eq!(easiest_target(MAINNET_BITS, 2 * timespan + 5, &params), &base * 16);
    }

    #[test]
    fn test_easiest_difficulty_clamps_to_limit() {
        let params = mainnet();
        let timespan = params.max_retarget_timespan_secs();
        let easiest = easiest_target(0x1c7f_ffff, 100 * timespan, &params);
        assert_eq!(big_to_compact(&easiest), Some(0x1d00_ffff));
    }

    #[test]
    fn test_difficulty_floor() {
        let params = mainnet();
        let timespan = params.max_retarget_timespan_secs();
        assert!(check_difficulty_floor(MAINNET_BITS, MAINNET_BITS, 0, &params).is_ok());
        // harder is always fine
        assert!(check_difficulty_floor(MAINNET_BITS, 0x1700_0001, 0, &params).is_ok());

        let relaxed = big_to_compact(&(compact_to_big(MAINNET_BITS) * 4)).unwrap();
        assert_eq!(
            check_difficulty_floor(MAINNET_BITS, relaxed, 0, &params),
            Err(ContractError::DifficultyLessThanMin)
        );
        assert!(check_difficulty_floor(MAINNET_BITS, relaxed, timespan, &params).is_ok());

        let too_easy = big_to_compact(&(compact_to_big(MAINNET_BITS) * 5)).unwrap();
        assert_eq!(
            check_difficulty_floor(MAINNET_BITS, too_easy, timespan, &params),
            Err(ContractError::DifficultyLessThanMin)
        );
    }

    #[test]
    fn test_regtest_floor_reaches_limit_after_four_intervals() {
        let params = regtest();
        let timespan = params.max_retarget_timespan_secs();
        assert_eq!(
            check_difficulty_floor(0x2000_ffff, 0x207f_ffff, 3 * timespan, &params),
            Err(ContractError::DifficultyLessThanMin)
        );
        assert!(check_difficulty_floor(0x2000_ffff, 0x207f_ffff, 4 * timespan, &params).is_ok());
    }

    proptest! {
        #[test]
        fn prop_hash_above_target_is_invalid_nonce(
            version in any::<i32>(),
            prev in any::<[u8; 32]>(),
            merkle in any::<[u8; 32]>(),
            timestamp in any::<u32>(),
            nonce in any::<u32>(),
            bits in prop::sample::select(vec![MAINNET_BITS, 0x1d00_ffff, 0x1b04_04cb, 0x0300_0001]),
        ) {
            let header = BaseHeader {
                version,
                prev_block: Hash(prev),
                merkle_root: Hash(merkle),
                timestamp,
                bits,
                nonce,
            };
            prop_assume!(!is_met_by(&compact_to_big(bits), &header.block_hash()));
            prop_assert_eq!(
                check_proof_of_work(&header, bits, &mainnet().pow_limit()),
                Err(ContractError::InvalidNonce)
            );
        }
    }
}
