//! The EVM host interface (`spec.md` §4.8/§6): the capability surface a
//! `CallProof` verifier replays an `eth_call` against. Mirrors EVMC
//! semantics, as the spec requires. No EVM implementation ships here —
//! that is an out-of-scope external collaborator (`spec.md` §1) — this
//! module only defines the trait and the bookkeeping the call-proof
//! verifier needs to ensure every state access the EVM performs is backed
//! by an accompanying account or storage proof.

use alloy_primitives::{Address, Bytes, B256, U256};

/// The transaction/block context an `eth_call` replay runs against.
#[derive(Clone, Debug)]
pub struct TxContext {
    pub origin: Address,
    pub gas_price: U256,
    pub block_number: u64,
    pub block_timestamp: u64,
    pub block_gas_limit: u64,
    pub block_base_fee: U256,
    pub chain_id: u64,
}

/// One emitted log during call replay.
#[derive(Clone, Debug)]
pub struct EmittedLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
}

/// Every piece of state the replayed EVM reads must be backed by an
/// accompanying account or storage proof (`spec.md` §4.8); an
/// implementation of this trait is expected to return an error from the
/// relevant accessor when no such backing proof was supplied, which the
/// call-proof verifier (C8) maps to `VerifyError::DataMismatch`.
pub trait EvmHost {
    fn account_exists(&self, address: &Address) -> bool;
    fn get_storage(&self, address: &Address, key: &B256) -> Option<B256>;
    fn set_storage(&mut self, address: &Address, key: &B256, value: B256);
    fn get_balance(&self, address: &Address) -> Option<U256>;
    fn get_code(&self, address: &Address) -> Option<Bytes>;
    fn get_code_hash(&self, address: &Address) -> Option<B256>;
    fn copy_code(&self, address: &Address, offset: usize, len: usize) -> Vec<u8>;
    fn selfdestruct(&mut self, address: &Address, beneficiary: &Address);
    fn call(&mut self, to: &Address, input: &[u8], value: U256, gas: u64) -> Result<Bytes, String>;
    fn get_tx_context(&self) -> TxContext;
    fn get_block_hash(&self, block_number: u64) -> Option<B256>;
    fn emit_log(&mut self, log: EmittedLog);
    /// Declares that `address`'s account state is about to be read;
    /// implementations backed by a fixed proof set use this to check the
    /// read is covered, returning `false` to abort verification otherwise.
    fn access_account(&self, address: &Address) -> bool;
    fn access_storage(&self, address: &Address, key: &B256) -> bool;
    /// Dispatch a call to a precompiled contract address, if `address` is
    /// one; `None` means it isn't a precompile and an ordinary call should
    /// proceed instead.
    fn precompile_call(&mut self, address: &Address, input: &[u8]) -> Option<Result<Bytes, String>>;
}
