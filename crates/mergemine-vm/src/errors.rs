use crate::abi::AbiError;
use mergemine_crypto::KeyError;
use mergemine_state::StateError;
use thiserror::Error;

/// Outcome of a rejected contract invocation.
///
/// Every variant except [`ContractError::State`] is an ordinary failure
/// surfaced to the caller; nothing the invocation wrote is kept.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContractError {
    #[error("Decode error: {0}")]
    DecodeError(#[from] AbiError),

    #[error("Invalid token or amount")]
    InvalidTokenOrAmount,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Unknown method {0}")]
    UnknownMethod(String),

    #[error("Merge-mining feature is not active")]
    FeatureNotActive,

    #[error("Security module not initialized")]
    SecurityNotInitialized,

    #[error("Merge-mining not initialized")]
    MergeMiningNotInitialized,

    #[error("Header chain not initialized")]
    HeaderChainNotInitialized,

    #[error("Previous block does not exist")]
    PrevBlockNonExistent,

    #[error("Share chain does not exist")]
    ShareChainNonExistent,

    #[error("Forbidden parameter: {0}")]
    ForbiddenParam(&'static str),

    #[error("Difficulty is less than the minimum allowed")]
    DifficultyLessThanMin,

    #[error("Target difficulty is less than or equal to zero")]
    TargetDifficultyLessThanZero,

    #[error("Block hash is above the target")]
    InvalidNonce,

    #[error("Target exceeds the proof-of-work limit")]
    PowLimitExceeded,

    #[error("Invalid guardians: {got} nominated, at least {min} required")]
    InvalidGuardians { got: usize, min: usize },

    #[error("Not in emergency mode")]
    NotEmergency,

    #[error("Sender is not a guardian")]
    NotGuardian,

    #[error("Invalid base64 encoding")]
    InvalidB64Decode,

    #[error("Compressed ECDSA public key must be 33 bytes, got {0}")]
    InvalidCompressedEcdsaPubKeyLength(usize),

    #[error("Invalid compressed ECDSA public key")]
    InvalidCompressedEcdsaPubKey,

    #[error("Invalid JSON content")]
    InvalidJsonContent,

    #[error("State error: {0}")]
    State(#[from] StateError),
}

impl ContractError {
    /// Storage corruption or a codec failure on a record this contract wrote.
    /// The host must abort the whole call instead of reporting a normal failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ContractError::State(_))
    }
}

impl From<KeyError> for ContractError {
    fn from(err: KeyError) -> Self {
        match err {
            KeyError::InvalidBase64 => ContractError::InvalidB64Decode,
            KeyError::InvalidLength { got, .. } => ContractError::InvalidCompressedEcdsaPubKeyLength(got),
            KeyError::InvalidPoint => ContractError::InvalidCompressedEcdsaPubKey,
        }
    }
}
