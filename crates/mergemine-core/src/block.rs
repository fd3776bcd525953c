// Relayed proof-of-work headers and merge-mining shares.
//
// SAFETY INVARIANTS:
// 1. A header's identifier is always recomputed from its fields, never trusted from input
// 2. Stored headers are immutable: height and work_sum are fixed at admission
// 3. height(child) = height(parent) + 1, work_sum(child) = work_sum(parent) + work(child.bits)

use crate::types::Hash;
use bitcoin::block::{Header, Version};
use bitcoin::CompactTarget;
use num_bigint::BigUint;
use serde::{Deserialize, Serialize};

/// Number of auxiliary proof hashes carried by a share.
pub const SHARE_PROOF_COUNT: usize = 4;

/// The six consensus fields of a relayed header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaseHeader {
    /// Block version (not the protocol version)
    pub version: i32,

    /// Identifier of the previous header in the relayed chain
    pub prev_block: Hash,

    /// Merkle root of the block's transactions
    pub merkle_root: Hash,

    /// Block time in seconds; a u32 on the wire, so it wraps in 2106
    pub timestamp: u32,

    /// Compact difficulty target
    pub bits: u32,

    pub nonce: u32,
}

impl BaseHeader {
    /// The same fields as a Bitcoin consensus header.
    pub fn to_bitcoin(&self) -> Header {
        Header {
            version: Version::from_consensus(self.version),
            prev_blockhash: self.prev_block.into(),
            merkle_root: self.merkle_root.into(),
            time: self.timestamp,
            bits: CompactTarget::from_consensus(self.bits),
            nonce: self.nonce,
        }
    }

    /// Header identifier: double SHA-256 of the 80-byte wire header, in display order.
    pub fn block_hash(&self) -> Hash {
        self.to_bitcoin().block_hash().into()
    }
}

/// A header admitted into the relay, with its position in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub header: BaseHeader,

    /// Height in the relayed chain
    pub height: u32,

    /// Cumulative proof-of-work from the genesis header to this one, inclusive
    pub work_sum: BigUint,
}

impl BlockHeader {
    pub fn hash(&self) -> Hash {
        self.header.block_hash()
    }
}

/// A lower-difficulty proof-of-work submission for a share chain.
///
/// Shares are validated and discarded; nothing about them is persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub share_chain_id: u8,
    pub witness: bool,
    pub version: i32,
    pub prev_block: Hash,
    pub merkle_root: Hash,
    pub timestamp: u32,
    pub nonce: u32,
    pub proofs: [Hash; SHARE_PROOF_COUNT],
    pub additional_data: Hash,
}

impl Share {
    /// Header-shaped view of the share, using the referenced block's bits.
    pub fn base_header(&self, bits: u32) -> BaseHeader {
        BaseHeader {
            version: self.version,
            prev_block: self.prev_block,
            merkle_root: self.merkle_root,
            timestamp: self.timestamp,
            bits,
            nonce: self.nonce,
        }
    }
}
