// Protocol parameters of the merge-mining contract.
//
// SAFETY: These parameters are consensus-critical. Every node replaying the
// host chain must run the contract with identical values.

use crate::difficulty::{compact_to_big, to_target};
use crate::types::Address;
use log::info;
use num_bigint::{BigInt, Sign};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Bitcoin mainnet proof-of-work limit (2^224 - 1, compact 0x1d00ffff).
pub const MAINNET_POW_LIMIT_BITS: u32 = 0x1d00_ffff;
/// Regression-test limit: roughly half of all hashes meet it.
pub const REGTEST_POW_LIMIT_BITS: u32 = 0x207f_ffff;
/// Two weeks in seconds.
pub const TARGET_TIMESPAN_SECS: u64 = 14 * 24 * 60 * 60;
pub const RETARGET_ADJUSTMENT_FACTOR: u32 = 4;

#[derive(Debug, Error)]
pub enum ParamsError {
    #[error("Failed to load protocol parameters: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid protocol parameter: {0}")]
    Invalid(String),
}

fn default_pow_limit_bits() -> u32 {
    MAINNET_POW_LIMIT_BITS
}
fn default_target_timespan_secs() -> u64 {
    TARGET_TIMESPAN_SECS
}
fn default_retarget_adjustment_factor() -> u32 {
    RETARGET_ADJUSTMENT_FACTOR
}
fn default_min_guardians() -> usize {
    5
}
fn default_min_administrator_delay() -> u64 {
    8_640
}
fn default_min_soft_delay() -> u64 {
    4_320
}

/// Constants the contract is deployed with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolParams {
    /// Compact encoding of the loosest target a relayed header may declare
    #[serde(default = "default_pow_limit_bits")]
    pub pow_limit_bits: u32,

    /// Retarget interval of the relayed chain, in seconds
    #[serde(default = "default_target_timespan_secs")]
    pub target_timespan_secs: u64,

    /// Maximum relaxation of the target per retarget interval
    #[serde(default = "default_retarget_adjustment_factor")]
    pub retarget_adjustment_factor: u32,

    /// Smallest guardian set the administrator may nominate
    #[serde(default = "default_min_guardians")]
    pub min_guardians: usize,

    /// Administrator delay before any SecurityInfo has been stored
    #[serde(default = "default_min_administrator_delay")]
    pub min_administrator_delay: u64,

    /// Soft delay before any SecurityInfo has been stored
    #[serde(default = "default_min_soft_delay")]
    pub min_soft_delay: u64,

    /// Administrator before any MergeMiningInfo has been stored
    pub initial_administrator: Address,
}

impl ProtocolParams {
    pub fn mainnet(initial_administrator: Address) -> Self {
        ProtocolParams {
            pow_limit_bits: MAINNET_POW_LIMIT_BITS,
            target_timespan_secs: TARGET_TIMESPAN_SECS,
            retarget_adjustment_factor: RETARGET_ADJUSTMENT_FACTOR,
            min_guardians: default_min_guardians(),
            min_administrator_delay: default_min_administrator_delay(),
            min_soft_delay: default_min_soft_delay(),
            initial_administrator,
        }
    }

    /// Easy proof-of-work and short delays, for tests and local replays.
    pub fn regtest(initial_administrator: Address) -> Self {
        ProtocolParams {
            pow_limit_bits: REGTEST_POW_LIMIT_BITS,
            min_guardians: 3,
            min_administrator_delay: 20,
            min_soft_delay: 10,
            ..ProtocolParams::mainnet(initial_administrator)
        }
    }

    /// Load parameters from a TOML, YAML or JSON file (format from the extension).
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ParamsError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .build()?;
        let params: ProtocolParams = settings.try_deserialize()?;
        params.validate()?;
        info!(
            "Loaded protocol parameters from {} (pow limit {:#010x})",
            path.as_ref().display(),
            params.pow_limit_bits
        );
        Ok(params)
    }

    pub fn validate(&self) -> Result<(), ParamsError> {
        if self.initial_administrator.is_zero() {
            return Err(ParamsError::Invalid("initial_administrator must be non-zero".into()));
        }
        if self.target_timespan_secs == 0 {
            return Err(ParamsError::Invalid("target_timespan_secs must be > 0".into()));
        }
        if self.retarget_adjustment_factor < 2 {
            return Err(ParamsError::Invalid("retarget_adjustment_factor must be >= 2".into()));
        }
        if self.pow_limit().sign() != Sign::Plus {
            return Err(ParamsError::Invalid(format!(
                "pow_limit_bits {:#010x} does not encode a positive target",
                self.pow_limit_bits
            )));
        }
        if to_target(&self.pow_limit()).is_none() {
            return Err(ParamsError::Invalid(format!(
                "pow_limit_bits {:#010x} exceeds 256 bits",
                self.pow_limit_bits
            )));
        }
        if self
            .target_timespan_secs
            .checked_mul(u64::from(self.retarget_adjustment_factor))
            .is_none()
        {
            return Err(ParamsError::Invalid(
                "target_timespan_secs * retarget_adjustment_factor overflows".into(),
            ));
        }
        if self.min_guardians == 0 {
            return Err(ParamsError::Invalid("min_guardians must be > 0".into()));
        }
        // Zero delays never satisfy the security-initialized check.
        if self.min_administrator_delay == 0 || self.min_soft_delay == 0 {
            return Err(ParamsError::Invalid(
                "min_administrator_delay and min_soft_delay must be > 0".into(),
            ));
        }
        Ok(())
    }

    pub fn pow_limit(&self) -> BigInt {
        compact_to_big(self.pow_limit_bits)
    }

    /// Elapsed time that permits one relaxation step of the difficulty floor.
    pub fn max_retarget_timespan_secs(&self) -> u64 {
        self.target_timespan_secs
            .saturating_mul(u64::from(self.retarget_adjustment_factor))
    }
}
