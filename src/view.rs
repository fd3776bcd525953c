// Read-only queries over the contract's storage.

use mergemine_core::{
    BlockHeader, Hash, HeaderChainInfo, MergeMiningInfo, ProtocolParams, SecurityInfo, ShareChainInfo,
    TimeChallengeInfo,
};
use mergemine_state::{
    load_block_header, load_header_chain_info, load_merge_mining_info, load_security_info, load_share_chain_info,
    load_share_chains, load_time_challenge_info, ContractStorage, StateError,
};
use mergemine_vm::METHODS;

pub struct MergeMiningView<'a> {
    storage: &'a dyn ContractStorage,
    params: &'a ProtocolParams,
}

impl<'a> MergeMiningView<'a> {
    pub fn new(storage: &'a dyn ContractStorage, params: &'a ProtocolParams) -> Self {
        MergeMiningView { storage, params }
    }

    pub fn header_chain_info(&self) -> Result<HeaderChainInfo, StateError> {
        load_header_chain_info(self.storage)
    }

    pub fn block_header(&self, hash: &Hash) -> Result<Option<BlockHeader>, StateError> {
        load_block_header(self.storage, hash)
    }

    /// Header at the tip of the best chain, if the relay is initialized.
    pub fn tip_header(&self) -> Result<Option<BlockHeader>, StateError> {
        let info = self.header_chain_info()?;
        if !info.is_initialized() {
            return Ok(None);
        }
        self.block_header(&info.tip)
    }

    /// Walk back from the tip, newest first, stopping at the first
    /// unknown predecessor.
    pub fn best_chain(&self, limit: usize) -> Result<Vec<BlockHeader>, StateError> {
        let mut chain = Vec::new();
        let mut next = self.tip_header()?;
        while let Some(header) = next {
            if chain.len() == limit {
                break;
            }
            next = self.block_header(&header.header.prev_block)?;
            chain.push(header);
        }
        Ok(chain)
    }

    pub fn merge_mining_info(&self) -> Result<MergeMiningInfo, StateError> {
        load_merge_mining_info(self.storage, self.params)
    }

    pub fn security_info(&self) -> Result<SecurityInfo, StateError> {
        load_security_info(self.storage, self.params)
    }

    pub fn share_chain(&self, id: u8) -> Result<Option<ShareChainInfo>, StateError> {
        load_share_chain_info(self.storage, id)
    }

    pub fn share_chains(&self) -> Result<Vec<ShareChainInfo>, StateError> {
        load_share_chains(self.storage)
    }

    pub fn time_challenge(&self, method_name: &str) -> Result<Option<TimeChallengeInfo>, StateError> {
        load_time_challenge_info(self.storage, method_name)
    }

    /// Every recorded challenge, in method-table order.
    pub fn time_challenges(&self) -> Result<Vec<TimeChallengeInfo>, StateError> {
        let mut challenges = Vec::new();
        for method in METHODS.iter() {
            if let Some(info) = self.time_challenge(method.name)? {
                challenges.push(info);
            }
        }
        Ok(challenges)
    }
}
