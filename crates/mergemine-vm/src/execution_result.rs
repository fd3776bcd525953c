use mergemine_core::Hash;
use serde::Serialize;

/// Successful outcome of a contract invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum CallEffect {
    /// The mutation was committed.
    Applied,

    /// A delayed change was recorded; resubmit the same parameters once
    /// `commit_height` is reached.
    ChallengeStarted { params_hash: Hash, commit_height: u64 },

    /// The same change is already waiting for its delay to elapse.
    ChallengePending { params_hash: Hash, commit_height: u64 },

    /// Accepted without effect.
    Ignored,
}
