// Execution context handed to every method handler.
//
// The host supplies the momentum height and feature activation; the
// dispatcher wraps the contract's storage in a write overlay before
// building the context, so handlers write freely and the dispatcher
// decides whether anything is kept.

use crate::abi::DecodedCall;
use crate::errors::ContractError;
use crate::execution_result::CallEffect;
use mergemine_core::{Address, ProtocolParams};
use mergemine_state::ContractStorage;

/// Facts the host chain provides about the block being applied.
pub trait HostContext {
    /// Height of the momentum containing the call.
    fn momentum_height(&self) -> u64;

    /// Whether the merge-mining protocol upgrade is active at this height.
    fn is_merge_mining_active(&self) -> bool;
}

/// Plain host context, used by tests and replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Momentum {
    pub height: u64,
    pub merge_mining_active: bool,
}

impl Momentum {
    pub fn active_at(height: u64) -> Self {
        Momentum {
            height,
            merge_mining_active: true,
        }
    }
}

impl HostContext for Momentum {
    fn momentum_height(&self) -> u64 {
        self.height
    }

    fn is_merge_mining_active(&self) -> bool {
        self.merge_mining_active
    }
}

pub struct ExecutionContext<'a> {
    pub storage: &'a mut dyn ContractStorage,
    pub params: &'a ProtocolParams,
    pub sender: Address,
    pub momentum_height: u64,
}

impl<'a> ExecutionContext<'a> {
    pub fn new(
        storage: &'a mut dyn ContractStorage,
        params: &'a ProtocolParams,
        sender: Address,
        momentum_height: u64,
    ) -> Self {
        ExecutionContext {
            storage,
            params,
            sender,
            momentum_height,
        }
    }
}

/// Signature shared by every contract method handler.
pub type MethodHandler = fn(&mut ExecutionContext<'_>, &DecodedCall) -> Result<CallEffect, ContractError>;
