use alloy_primitives::{Address, B256, U256};

// A direct value transfer lifted out of a transaction's call tree.
// Created once during extraction and persisted as-is; `call_index` is
// dense over the transaction's emitted records in depth-first order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalTransaction {
    pub tx_hash: B256,
    pub block_hash: B256,
    pub block_number: u64,
    pub tx_index: u32,
    pub call_index: u32,
    pub from: Address,
    pub to: Address,
    pub value: U256,
}
