use alloy_primitives::B256;

// Identity of a finished block plus its executed transactions in order;
// `tx_hashes` maps a trace tree's position to its transaction.
#[derive(Debug, Clone)]
pub struct BlockRef {
    pub number: u64,
    pub hash: B256,
    pub tx_hashes: Vec<B256>,
}
