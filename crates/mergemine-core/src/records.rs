// Persistent records owned by the merge-mining contract.
//
// SAFETY INVARIANTS:
// 1. Singletons (HeaderChainInfo, MergeMiningInfo, SecurityInfo) have a well-defined
//    zero value; an absent record reads as that value, never as an error
// 2. guardians and guardians_votes always have the same length
// 3. A zero params_hash in a TimeChallengeInfo means "no challenge in flight"

use crate::types::{Address, Hash};
use num_bigint::BigUint;
use num_traits::Zero;
use serde::{Deserialize, Serialize};

/// Best-chain pointer of the header relay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct HeaderChainInfo {
    /// Identifier of the heaviest known header
    pub tip: Hash,

    pub tip_height: u32,

    /// Cumulative work of `tip`
    pub tip_work_sum: BigUint,
}

impl HeaderChainInfo {
    /// The relay is initialized once a genesis header has been installed.
    /// Height zero is the uninitialized sentinel, so genesis heights must be positive.
    pub fn is_initialized(&self) -> bool {
        !self.tip.is_zero() && self.tip_height != 0 && !self.tip_work_sum.is_zero()
    }
}

/// Administrator and TSS key of the merge-mining contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeMiningInfo {
    /// Zero means no administrator: governance is in emergency mode
    pub administrator: Address,

    /// Base64 compressed ECDSA key produced by the orchestrator's key-gen ceremony
    pub compressed_tss_ecdsa_pub_key: String,

    /// Base64 uncompressed form of the same key
    pub decompressed_tss_ecdsa_pub_key: String,

    /// Free-form JSON metadata
    pub metadata: String,
}

impl MergeMiningInfo {
    pub fn with_administrator(administrator: Address) -> Self {
        MergeMiningInfo {
            administrator,
            compressed_tss_ecdsa_pub_key: String::new(),
            decompressed_tss_ecdsa_pub_key: String::new(),
            metadata: String::new(),
        }
    }

    pub fn is_emergency(&self) -> bool {
        self.administrator.is_zero()
    }

    pub fn has_tss_key(&self) -> bool {
        !self.compressed_tss_ecdsa_pub_key.is_empty()
    }
}

/// Difficulty and reward configuration of one share chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareChainInfo {
    pub id: u8,

    /// Compact target shares must meet
    pub bits: u32,

    pub reward_multiplier: u32,
}

/// Guardian set, their votes, and the governance delays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityInfo {
    pub guardians: Vec<Address>,

    /// Parallel to `guardians`; `Address::ZERO` means no vote cast
    pub guardians_votes: Vec<Address>,

    /// Delay (in momentum heights) for administrator and guardian changes
    pub administrator_delay: u64,

    /// Delay (in momentum heights) for parameter changes
    pub soft_delay: u64,
}

impl SecurityInfo {
    pub fn new(administrator_delay: u64, soft_delay: u64) -> Self {
        SecurityInfo {
            guardians: Vec::new(),
            guardians_votes: Vec::new(),
            administrator_delay,
            soft_delay,
        }
    }

    pub fn guardian_index(&self, address: &Address) -> Option<usize> {
        self.guardians.iter().position(|g| g == address)
    }

    pub fn clear_votes(&mut self) {
        self.guardians_votes = vec![Address::ZERO; self.guardians.len()];
    }
}

/// In-flight delayed change for one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeChallengeInfo {
    pub method_name: String,

    /// Fingerprint of the proposed parameters; zero once committed
    pub params_hash: Hash,

    /// Momentum height at which the current proposal was first seen
    pub challenge_start_height: u64,
}
