// TIME-CHALLENGE GATE
//
// Sensitive changes are a two-submission protocol: the first submission
// records a fingerprint of the parameters and the current momentum height;
// resubmitting the identical parameters once `delay` heights have passed
// confirms the change.
//
// SAFETY INVARIANTS:
// 1. A change commits only on a resubmission at height >= start + delay
// 2. Different parameters restart the challenge at the current height
// 3. Resubmitting before the delay changes nothing
// 4. A confirmed challenge is cleared (zero fingerprint, start height kept)

use log::{debug, info};
use mergemine_core::{Hash, TimeChallengeInfo};
use mergemine_state::{load_time_challenge_info, save_time_challenge_info};
use mergemine_vm::{CallEffect, ContractError, ExecutionContext};

/// Verdict of the gate for one submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChallengeOutcome {
    /// A new challenge was recorded.
    Started { commit_height: u64 },

    /// The same parameters are already waiting.
    Pending { commit_height: u64 },

    /// The delay has elapsed; the caller may apply the change.
    Confirmed,
}

impl ChallengeOutcome {
    /// The call effect to return when the change must not be applied yet.
    pub fn deferred_effect(&self, params_hash: Hash) -> Option<CallEffect> {
        match *self {
            ChallengeOutcome::Started { commit_height } => Some(CallEffect::ChallengeStarted {
                params_hash,
                commit_height,
            }),
            ChallengeOutcome::Pending { commit_height } => Some(CallEffect::ChallengePending {
                params_hash,
                commit_height,
            }),
            ChallengeOutcome::Confirmed => None,
        }
    }
}

pub fn time_challenge(
    ctx: &mut ExecutionContext<'_>,
    method_name: &str,
    params_hash: Hash,
    delay: u64,
) -> Result<ChallengeOutcome, ContractError> {
    let height = ctx.momentum_height;
    let existing = load_time_challenge_info(&*ctx.storage, method_name)?;

    match existing {
        Some(mut challenge) if challenge.params_hash == params_hash => {
            let commit_height = challenge.challenge_start_height.saturating_add(delay);
            if height < commit_height {
                debug!(
                    "{} challenge {} pending until height {} (now {})",
                    method_name, params_hash, commit_height, height
                );
                return Ok(ChallengeOutcome::Pending { commit_height });
            }
            challenge.params_hash = Hash::ZERO;
            save_time_challenge_info(ctx.storage, &challenge)?;
            info!("{} challenge {} confirmed at height {}", method_name, params_hash, height);
            Ok(ChallengeOutcome::Confirmed)
        }
        _ => {
            let challenge = TimeChallengeInfo {
                method_name: method_name.to_string(),
                params_hash,
                challenge_start_height: height,
            };
            save_time_challenge_info(ctx.storage, &challenge)?;
            let commit_height = height.saturating_add(delay);
            debug!(
                "{} challenge {} started at height {}, commits at {}",
                method_name, params_hash, height, commit_height
            );
            Ok(ChallengeOutcome::Started { commit_height })
        }
    }
}
