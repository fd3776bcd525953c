pub mod header_chain;
pub mod pow_engine;
pub mod shares;

pub use header_chain::{add_bitcoin_block_header, base_header_from_call, set_initial_bitcoin_block_header};
pub use pow_engine::{check_difficulty_floor, check_proof_of_work, easiest_target};
pub use shares::{add_share, set_share_chain, share_from_call};
