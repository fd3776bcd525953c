// Shared fixtures for the relay and share integration tests.

#![allow(dead_code)]

use mergemine_consensus::{
    add_bitcoin_block_header, add_share, check_proof_of_work, set_initial_bitcoin_block_header, set_share_chain,
};
use mergemine_core::{Address, BaseHeader, Hash, MergeMiningInfo, ProtocolParams, SecurityInfo, Share};
use mergemine_state::{save_merge_mining_info, save_security_info, MemoryStorage, StorageOverlay};
use mergemine_vm::methods::*;
use mergemine_vm::{validate_call, CallEffect, ContractCall, ContractError, ExecutionContext, MethodHandler, Value};

pub const MAINNET_BITS: u32 = 386097875;
pub const REGTEST_BITS: u32 = 0x207f_ffff;
pub const TSS_KEY: &str = "AsAQx1M3LVXCuozDOqO5b9adj/PItYgwZFG/xTDBiZzT";

pub fn admin() -> Address {
    Address([0xad; 20])
}

pub fn miner() -> Address {
    Address([0x3e; 20])
}

/// Bitcoin mainnet block 838288.
pub fn h0() -> BaseHeader {
    BaseHeader {
        version: 644612096,
        prev_block: Hash::from_hex("0000000000000000000090937d63bfb7b27a1cf1073d6bd309195c62753c87b3").unwrap(),
        merkle_root: Hash::from_hex("a76c7189bc34c9614d8848cc4074037db2f7cab329f646a23ad27a5628a573b1").unwrap(),
        timestamp: 1712573645,
        bits: MAINNET_BITS,
        nonce: 1731415048,
    }
}

/// Bitcoin mainnet block 838289.
pub fn h1() -> BaseHeader {
    BaseHeader {
        version: 551550976,
        prev_block: h0().block_hash(),
        merkle_root: Hash::from_hex("7fad6c9b3fd2af85f631b5c0e13d6653a9e5ff268c60a78138a98da5e4cddf69").unwrap(),
        timestamp: 1712575802,
        bits: MAINNET_BITS,
        nonce: 2118989352,
    }
}

/// A share on top of block 838289 meeting mainnet difficulty.
pub fn mainnet_share(share_chain_id: u8) -> Share {
    Share {
        share_chain_id,
        witness: false,
        version: 536928256,
        prev_block: h1().block_hash(),
        merkle_root: Hash::from_hex("2a3bfcafb862755d613d95bcefb7fea39e6afabf6f2f6f50c9de7413b9971e67").unwrap(),
        timestamp: 1712576075,
        nonce: 1999714395,
        proofs: [Hash::ZERO; 4],
        additional_data: Hash::ZERO,
    }
}

/// Bump the nonce until `header` meets its own bits under the regtest limit.
pub fn mine(mut header: BaseHeader) -> BaseHeader {
    let limit = ProtocolParams::regtest(admin()).pow_limit();
    while check_proof_of_work(&header, header.bits, &limit).is_err() {
        header.nonce = header.nonce.wrapping_add(1);
    }
    header
}

/// Mine a share whose base header meets `share_bits`.
pub fn mine_share(mut share: Share, prev_bits: u32, share_bits: u32) -> Share {
    let limit = ProtocolParams::regtest(admin()).pow_limit();
    while check_proof_of_work(&share.base_header(prev_bits), share_bits, &limit).is_err() {
        share.nonce = share.nonce.wrapping_add(1);
    }
    share
}

pub fn regtest_genesis() -> BaseHeader {
    mine(BaseHeader {
        version: 1,
        prev_block: Hash([0x11; 32]),
        merkle_root: Hash([0x22; 32]),
        timestamp: 1_700_000_000,
        bits: REGTEST_BITS,
        nonce: 0,
    })
}

/// A mined child of `parent`; `tag` distinguishes sibling branches.
pub fn child(parent: &BaseHeader, tag: u8, bits: u32, delay_secs: u32) -> BaseHeader {
    mine(BaseHeader {
        version: 2,
        prev_block: parent.block_hash(),
        merkle_root: Hash([tag; 32]),
        timestamp: parent.timestamp + delay_secs,
        bits,
        nonce: 0,
    })
}

pub fn header_args(header: &BaseHeader) -> Vec<Value> {
    vec![
        Value::Int32(header.version),
        Value::Hash(header.prev_block),
        Value::Hash(header.merkle_root),
        Value::Uint32(header.timestamp),
        Value::Uint32(header.bits),
        Value::Uint32(header.nonce),
    ]
}

pub fn share_args(share: &Share) -> Vec<Value> {
    let mut args = vec![
        Value::Uint8(share.share_chain_id),
        Value::Bool(share.witness),
        Value::Int32(share.version),
        Value::Hash(share.prev_block),
        Value::Hash(share.merkle_root),
        Value::Uint32(share.timestamp),
        Value::Uint32(share.nonce),
    ];
    args.extend(share.proofs.iter().map(|p| Value::Hash(*p)));
    args.push(Value::Hash(share.additional_data));
    args
}

pub struct Relay {
    pub storage: MemoryStorage,
    pub params: ProtocolParams,
    pub height: u64,
}

impl Relay {
    /// Guardians nominated and TSS key set, relay not yet seeded.
    pub fn bootstrapped(params: ProtocolParams) -> Self {
        let mut storage = MemoryStorage::new();
        let mut security = SecurityInfo::new(params.min_administrator_delay, params.min_soft_delay);
        security.guardians = (1..=params.min_guardians as u8).map(|i| Address([i; 20])).collect();
        security.clear_votes();
        save_security_info(&mut storage, &security).unwrap();

        let mut info = MergeMiningInfo::with_administrator(admin());
        info.compressed_tss_ecdsa_pub_key = TSS_KEY.to_string();
        save_merge_mining_info(&mut storage, &info).unwrap();

        Relay { storage, params, height: 100 }
    }

    pub fn mainnet() -> Self {
        Relay::bootstrapped(ProtocolParams::mainnet(admin()))
    }

    pub fn regtest() -> Self {
        Relay::bootstrapped(ProtocolParams::regtest(admin()))
    }

    pub fn call(&mut self, sender: Address, method: &str, args: Vec<Value>) -> Result<CallEffect, ContractError> {
        let mut call = ContractCall::encode(sender, 0, method, &args)?;
        let decoded = validate_call(&mut call)?;
        let handler: MethodHandler = match method {
            SET_INITIAL_BITCOIN_BLOCK_HEADER => set_initial_bitcoin_block_header,
            ADD_BITCOIN_BLOCK_HEADER => add_bitcoin_block_header,
            SET_SHARE_CHAIN => set_share_chain,
            ADD_SHARE => add_share,
            other => return Err(ContractError::UnknownMethod(other.to_string())),
        };

        let mut overlay = StorageOverlay::new(&mut self.storage);
        let result = {
            let mut ctx = ExecutionContext::new(&mut overlay, &self.params, sender, self.height);
            handler(&mut ctx, &decoded)
        };
        if result.is_ok() {
            overlay.commit()?;
        }
        result
    }

    pub fn genesis(&mut self, header: &BaseHeader, height: u32) -> Result<CallEffect, ContractError> {
        let mut args = header_args(header);
        args.push(Value::Uint32(height));
        self.call(admin(), SET_INITIAL_BITCOIN_BLOCK_HEADER, args)
    }

    pub fn add(&mut self, header: &BaseHeader) -> Result<CallEffect, ContractError> {
        self.call(miner(), ADD_BITCOIN_BLOCK_HEADER, header_args(header))
    }

    pub fn share(&mut self, share: &Share) -> Result<CallEffect, ContractError> {
        self.call(miner(), ADD_SHARE, share_args(share))
    }

    /// Configure a share chain, waiting out the soft delay.
    pub fn configure_share_chain(&mut self, id: u8, bits: u32, reward_multiplier: u32) {
        let args = vec![Value::Uint8(id), Value::Uint32(bits), Value::Uint32(reward_multiplier)];
        self.call(admin(), SET_SHARE_CHAIN, args.clone()).unwrap();
        self.height += self.params.min_soft_delay;
        assert_eq!(self.call(admin(), SET_SHARE_CHAIN, args).unwrap(), CallEffect::Applied);
    }
}
