pub mod access;
pub mod administration;
pub mod guardians;
pub mod time_challenge;

pub use access::{
    can_perform_merge_mining, check_header_chain_initialized, check_merge_mining_initialized,
    check_security_initialized, ensure_administrator,
};
pub use administration::{change_administrator, change_tss_ecdsa_pub_key, set_merge_mining_metadata};
pub use guardians::{emergency, nominate_guardians, propose_administrator, tally_votes};
pub use time_challenge::{time_challenge, ChallengeOutcome};
