// Access guards shared by every method handler.

use log::warn;
use mergemine_core::{Address, HeaderChainInfo, MergeMiningInfo, SecurityInfo};
use mergemine_state::{load_header_chain_info, load_merge_mining_info, load_security_info};
use mergemine_vm::{ContractError, ExecutionContext};

/// Guardians and delays must be configured before sensitive methods run.
pub fn check_security_initialized(ctx: &ExecutionContext<'_>) -> Result<SecurityInfo, ContractError> {
    let security = load_security_info(&*ctx.storage, ctx.params)?;
    if security.guardians.len() < ctx.params.min_guardians
        || security.administrator_delay == 0
        || security.soft_delay == 0
    {
        warn!(
            "Security not initialized: {} guardians, {} required",
            security.guardians.len(),
            ctx.params.min_guardians
        );
        return Err(ContractError::SecurityNotInitialized);
    }
    Ok(security)
}

/// Merge-mining is live once the TSS key has been set.
pub fn check_merge_mining_initialized(ctx: &ExecutionContext<'_>) -> Result<MergeMiningInfo, ContractError> {
    let info = load_merge_mining_info(&*ctx.storage, ctx.params)?;
    if !info.has_tss_key() {
        warn!("Merge-mining not initialized: TSS key unset");
        return Err(ContractError::MergeMiningNotInitialized);
    }
    Ok(info)
}

pub fn check_header_chain_initialized(ctx: &ExecutionContext<'_>) -> Result<HeaderChainInfo, ContractError> {
    let info = load_header_chain_info(&*ctx.storage)?;
    if !info.is_initialized() {
        return Err(ContractError::HeaderChainNotInitialized);
    }
    Ok(info)
}

/// Security and merge-mining initialized, returning the merge-mining record.
pub fn can_perform_merge_mining(ctx: &ExecutionContext<'_>) -> Result<MergeMiningInfo, ContractError> {
    check_security_initialized(ctx)?;
    check_merge_mining_initialized(ctx)
}

/// Byte-exact comparison with the stored administrator. Nobody is
/// administrator while the contract is in emergency mode.
pub fn ensure_administrator(sender: &Address, info: &MergeMiningInfo) -> Result<(), ContractError> {
    if info.is_emergency() || *sender != info.administrator {
        warn!("Permission denied for {}", sender);
        return Err(ContractError::PermissionDenied);
    }
    Ok(())
}
