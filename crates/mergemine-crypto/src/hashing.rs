// Hash primitives shared by the call router, share chains and the governance gate.
//
// SAFETY INVARIANTS:
// 1. Parameter fingerprints are single SHA3-256 over the canonical bytes
// 2. The digest is pure; the same input yields the same digest on every node

use sha3::{Digest, Sha3_256};

/// Raw 32-byte digest, in the byte order the hash function produced it.
pub type Digest32 = [u8; 32];

/// SHA3-256 fingerprint used for method selectors and time-challenge parameters.
pub fn sha3_256(data: &[u8]) -> Digest32 {
    Sha3_256::digest(data).into()
}
