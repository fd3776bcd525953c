use log::{debug, error, info, warn};

use mergemine_consensus::{add_bitcoin_block_header, add_share, set_initial_bitcoin_block_header, set_share_chain};
use mergemine_core::{ParamsError, ProtocolParams};
use mergemine_governance::{
    change_administrator, change_tss_ecdsa_pub_key, emergency, nominate_guardians, propose_administrator,
    set_merge_mining_metadata,
};
use mergemine_state::{ContractStorage, StorageOverlay};
use mergemine_vm::methods::*;
use mergemine_vm::{validate_call, CallEffect, ContractCall, ContractError, ExecutionContext, HostContext, MethodHandler};

/// Resolve the handler for a method of the contract's table.
pub fn handler_for(method: &str) -> Option<MethodHandler> {
    let handler: MethodHandler = match method {
        SET_INITIAL_BITCOIN_BLOCK_HEADER => set_initial_bitcoin_block_header,
        ADD_BITCOIN_BLOCK_HEADER => add_bitcoin_block_header,
        SET_SHARE_CHAIN => set_share_chain,
        ADD_SHARE => add_share,
        NOMINATE_GUARDIANS => nominate_guardians,
        PROPOSE_ADMINISTRATOR => propose_administrator,
        EMERGENCY => emergency,
        CHANGE_ADMINISTRATOR => change_administrator,
        CHANGE_TSS_ECDSA_PUB_KEY => change_tss_ecdsa_pub_key,
        SET_MERGE_MINING_METADATA => set_merge_mining_metadata,
        _ => return None,
    };
    Some(handler)
}

/// The merge-mining embedded contract.
///
/// Each call runs against a write overlay over the contract's storage.
/// The overlay is committed only when the handler succeeds, so a failed
/// call leaves storage exactly as it found it.
#[derive(Debug, Clone)]
pub struct MergeMiningContract {
    params: ProtocolParams,
}

impl MergeMiningContract {
    pub fn new(params: ProtocolParams) -> Result<Self, ParamsError> {
        params.validate()?;
        Ok(MergeMiningContract { params })
    }

    pub fn params(&self) -> &ProtocolParams {
        &self.params
    }

    /// Apply one call. `call.data` is rewritten in canonical form once it
    /// decodes, even if the handler later rejects the call.
    pub fn execute(
        &self,
        storage: &mut dyn ContractStorage,
        host: &dyn HostContext,
        call: &mut ContractCall,
    ) -> Result<CallEffect, ContractError> {
        if !host.is_merge_mining_active() {
            warn!("Merge-mining call from {} before activation", call.sender);
            return Err(ContractError::FeatureNotActive);
        }

        let decoded = validate_call(call)?;
        let handler = handler_for(decoded.name()).ok_or_else(|| ContractError::UnknownMethod(decoded.name().to_string()))?;

        let mut overlay = StorageOverlay::new(storage);
        let result = {
            let mut ctx = ExecutionContext::new(&mut overlay, &self.params, call.sender, host.momentum_height());
            handler(&mut ctx, &decoded)
        };

        match result {
            Ok(effect) => {
                let writes = overlay.commit()?;
                debug!("{} committed {} writes", decoded.name(), writes);
                info!("{} from {} at height {}: {:?}", decoded.name(), call.sender, host.momentum_height(), effect);
                Ok(effect)
            }
            Err(e) if e.is_fatal() => {
                error!("{} aborted at height {}: {}", decoded.name(), host.momentum_height(), e);
                Err(e)
            }
            Err(e) => {
                warn!("{} from {} rejected: {}", decoded.name(), call.sender, e);
                Err(e)
            }
        }
    }
}
