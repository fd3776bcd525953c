// TSS ECDSA public key handling.
//
// The orchestrator publishes its threshold key as a base64 compressed SEC1
// point. The contract stores both the compressed and the uncompressed form.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use k256::elliptic_curve::sec1::ToEncodedPoint;
use k256::PublicKey;
use log::debug;
use thiserror::Error;

pub const COMPRESSED_PUBKEY_LEN: usize = 33;
pub const UNCOMPRESSED_PUBKEY_LEN: usize = 65;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("Invalid base64 encoding")]
    InvalidBase64,

    #[error("Invalid compressed public key length: expected {expected}, got {got}")]
    InvalidLength { expected: usize, got: usize },

    #[error("Bytes are not a valid secp256k1 point")]
    InvalidPoint,
}

/// Decode a base64 compressed public key and check its length.
///
/// Does not check that the bytes are on the curve; use [`decompress_pubkey`] for that.
pub fn decode_compressed_pubkey(encoded: &str) -> Result<Vec<u8>, KeyError> {
    let raw = STANDARD.decode(encoded).map_err(|_| KeyError::InvalidBase64)?;
    if raw.len() != COMPRESSED_PUBKEY_LEN {
        return Err(KeyError::InvalidLength {
            expected: COMPRESSED_PUBKEY_LEN,
            got: raw.len(),
        });
    }
    Ok(raw)
}

/// Recover the 65-byte uncompressed SEC1 encoding (`0x04 || X || Y`).
pub fn decompress_pubkey(compressed: &[u8]) -> Result<[u8; UNCOMPRESSED_PUBKEY_LEN], KeyError> {
    if compressed.len() != COMPRESSED_PUBKEY_LEN {
        return Err(KeyError::InvalidLength {
            expected: COMPRESSED_PUBKEY_LEN,
            got: compressed.len(),
        });
    }
    let key = PublicKey::from_sec1_bytes(compressed).map_err(|_| KeyError::InvalidPoint)?;
    let point = key.to_encoded_point(false);

    let mut out = [0u8; UNCOMPRESSED_PUBKEY_LEN];
    out.copy_from_slice(point.as_bytes());
    debug!("Decompressed TSS key {}", hex::encode(&out[1..9]));
    Ok(out)
}

/// Base64 (standard alphabet, padded) encoding used for stored keys.
pub fn encode_key(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}
