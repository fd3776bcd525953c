pub mod hashing;
pub mod ecdsa_keys;

pub use hashing::{sha3_256, Digest32};
pub use ecdsa_keys::{
    decode_compressed_pubkey, decompress_pubkey, encode_key, KeyError, COMPRESSED_PUBKEY_LEN,
    UNCOMPRESSED_PUBKEY_LEN,
};
