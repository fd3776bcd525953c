// Compact difficulty ("bits") arithmetic.
//
// The compact form packs a target as an 8-bit base-256 exponent, a sign bit
// and a 23-bit mantissa: target = mantissa * 256^(exponent - 3).
//
// SAFETY INVARIANTS:
// 1. compact_to_big and big_to_compact agree with the relayed chain's reference node
// 2. calc_work is zero for non-positive targets and strictly decreasing in the target

use crate::types::Hash;
use bitcoin::{BlockHash, Target};
use num_bigint::{BigInt, BigUint, Sign};
use num_traits::Zero;

const MANTISSA_MASK: u32 = 0x007f_ffff;
const SIGN_BIT: u32 = 0x0080_0000;

/// Expand a compact difficulty into its (possibly negative) target.
///
/// Kept on `BigInt` because a set sign bit yields a negative target that
/// must be rejected, not reinterpreted as a huge unsigned one.
pub fn compact_to_big(compact: u32) -> BigInt {
    let mantissa = compact & MANTISSA_MASK;
    let negative = compact & SIGN_BIT != 0;
    let exponent = compact >> 24;

    let value = if exponent <= 3 {
        BigInt::from(mantissa >> (8 * (3 - exponent)))
    } else {
        BigInt::from(mantissa) << (8 * (exponent - 3)) as usize
    };

    if negative {
        -value
    } else {
        value
    }
}

/// The 256-bit target for a non-negative value; `None` when negative or wider than 256 bits.
pub fn to_target(n: &BigInt) -> Option<Target> {
    if n.sign() == Sign::Minus {
        return None;
    }
    let magnitude = n.magnitude().to_bytes_be();
    if magnitude.len() > 32 {
        return None;
    }
    let mut bytes = [0u8; 32];
    bytes[32 - magnitude.len()..].copy_from_slice(&magnitude);
    Some(Target::from_be_bytes(bytes))
}

/// Pack a target into compact form. Precision below the top three bytes is dropped.
pub fn big_to_compact(n: &BigInt) -> Option<u32> {
    to_target(n).map(|target| target.to_compact_lossy().to_consensus())
}

/// Expected number of hashes needed to meet the target: 2^256 / (target + 1).
pub fn calc_work(bits: u32) -> BigUint {
    let target = compact_to_big(bits);
    if target.sign() != Sign::Plus {
        return BigUint::zero();
    }
    match to_target(&target) {
        Some(target) => BigUint::from_bytes_be(&target.to_work().to_be_bytes()),
        None => BigUint::zero(),
    }
}

/// Whether a header identifier is at or below the target.
pub fn is_met_by(target: &BigInt, hash: &Hash) -> bool {
    match to_target(target) {
        Some(target) => target.is_met_by(BlockHash::from(*hash)),
        // wider than any 256-bit hash
        None => target.sign() == Sign::Plus,
    }
}
