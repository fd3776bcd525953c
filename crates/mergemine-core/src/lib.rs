// === Primitive Types ===
pub mod types;

// === Relayed Headers and Shares ===
pub mod block;
pub mod difficulty;

// === Persistent Contract Records ===
pub mod records;

// === Protocol Parameters ===
pub mod config;

// === Re-exports for broader ecosystem access ===
pub use types::{Address, Hash, PrimitiveError};
pub use block::{BaseHeader, BlockHeader, Share, SHARE_PROOF_COUNT};
pub use difficulty::{big_to_compact, calc_work, compact_to_big, is_met_by, to_target};
pub use records::{
    HeaderChainInfo, MergeMiningInfo, SecurityInfo, ShareChainInfo, TimeChallengeInfo,
};
pub use config::{ParamsError, ProtocolParams};
