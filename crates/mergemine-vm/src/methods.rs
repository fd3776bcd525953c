// Declarative method table of the merge-mining contract.
//
// Each entry maps a method name to its ordered input types. The 4-byte
// selector is derived from the canonical signature, so the table is the
// single source of truth for both decoding and encoding.

use crate::abi::ParamType;
use mergemine_crypto::sha3_256;

pub const SET_INITIAL_BITCOIN_BLOCK_HEADER: &str = "SetInitialBitcoinBlockHeader";
pub const ADD_BITCOIN_BLOCK_HEADER: &str = "AddBitcoinBlockHeader";
pub const SET_SHARE_CHAIN: &str = "SetShareChain";
pub const ADD_SHARE: &str = "AddShare";
pub const NOMINATE_GUARDIANS: &str = "NominateGuardians";
pub const PROPOSE_ADMINISTRATOR: &str = "ProposeAdministrator";
pub const EMERGENCY: &str = "Emergency";
pub const CHANGE_ADMINISTRATOR: &str = "ChangeAdministrator";
pub const CHANGE_TSS_ECDSA_PUB_KEY: &str = "ChangeTssECDSAPubKey";
pub const SET_MERGE_MINING_METADATA: &str = "SetMergeMiningMetadata";

/// Name and ordered inputs of one contract method.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MethodSchema {
    pub name: &'static str,
    pub inputs: &'static [(&'static str, ParamType)],
}

impl MethodSchema {
    /// `Name(type1,type2,...)`
    pub fn signature(&self) -> String {
        let types: Vec<&str> = self.inputs.iter().map(|(_, t)| t.canonical_name()).collect();
        format!("{}({})", self.name, types.join(","))
    }

    pub fn selector(&self) -> [u8; 4] {
        let digest = sha3_256(self.signature().as_bytes());
        [digest[0], digest[1], digest[2], digest[3]]
    }

    pub fn by_name(name: &str) -> Option<&'static MethodSchema> {
        METHODS.iter().find(|m| m.name == name)
    }

    pub fn by_selector(selector: &[u8]) -> Option<&'static MethodSchema> {
        METHODS.iter().find(|m| m.selector()[..] == *selector)
    }
}

const HEADER_FIELDS: [(&str, ParamType); 6] = [
    ("version", ParamType::Int32),
    ("prevBlock", ParamType::Hash),
    ("merkleRoot", ParamType::Hash),
    ("timestamp", ParamType::Uint32),
    ("bits", ParamType::Uint32),
    ("nonce", ParamType::Uint32),
];

pub static METHODS: &[MethodSchema] = &[
    MethodSchema {
        name: SET_INITIAL_BITCOIN_BLOCK_HEADER,
        inputs: &[
            HEADER_FIELDS[0],
            HEADER_FIELDS[1],
            HEADER_FIELDS[2],
            HEADER_FIELDS[3],
            HEADER_FIELDS[4],
            HEADER_FIELDS[5],
            ("height", ParamType::Uint32),
        ],
    },
    MethodSchema {
        name: ADD_BITCOIN_BLOCK_HEADER,
        inputs: &HEADER_FIELDS,
    },
    MethodSchema {
        name: SET_SHARE_CHAIN,
        inputs: &[
            ("id", ParamType::Uint8),
            ("bits", ParamType::Uint32),
            ("rewardMultiplier", ParamType::Uint32),
        ],
    },
    MethodSchema {
        name: ADD_SHARE,
        inputs: &[
            ("shareChainId", ParamType::Uint8),
            ("witness", ParamType::Bool),
            ("version", ParamType::Int32),
            ("prevBlock", ParamType::Hash),
            ("merkleRoot", ParamType::Hash),
            ("timestamp", ParamType::Uint32),
            ("nonce", ParamType::Uint32),
            ("proof1", ParamType::Hash),
            ("proof2", ParamType::Hash),
            ("proof3", ParamType::Hash),
            ("proof4", ParamType::Hash),
            ("additionalData", ParamType::Hash),
        ],
    },
    MethodSchema {
        name: NOMINATE_GUARDIANS,
        inputs: &[("guardians", ParamType::AddressArray)],
    },
    MethodSchema {
        name: PROPOSE_ADMINISTRATOR,
        inputs: &[("address", ParamType::Address)],
    },
    MethodSchema {
        name: EMERGENCY,
        inputs: &[],
    },
    MethodSchema {
        name: CHANGE_ADMINISTRATOR,
        inputs: &[("administrator", ParamType::Address)],
    },
    MethodSchema {
        name: CHANGE_TSS_ECDSA_PUB_KEY,
        inputs: &[
            ("pubKey", ParamType::String),
            ("oldPubKeySignature", ParamType::String),
            ("newPubKeySignature", ParamType::String),
        ],
    },
    MethodSchema {
        name: SET_MERGE_MINING_METADATA,
        inputs: &[("metadata", ParamType::String)],
    },
];
