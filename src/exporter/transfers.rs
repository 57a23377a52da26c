use alloy_primitives::{Address, B256, U256};
use tracing::warn;

use crate::models::blocks::BlockRef;
use crate::models::frames::{CallFrame, CallKind};
use crate::models::transfers::InternalTransaction;

/// Walks every decoded call tree depth-first and lifts out the direct
/// value transfers: plain CALLs between two non-zero addresses carrying
/// a value greater than zero, at any depth. Only qualifying frames
/// consume a `call_index`, so the index sequence is dense over the
/// emitted records of each transaction.
pub fn extract_internal_transactions(
    block: &BlockRef,
    trees: &[Vec<CallFrame>],
) -> Vec<InternalTransaction> {
    let mut records = Vec::new();
    for (tx_index, tree) in trees.iter().enumerate() {
        let Some(tx_hash) = block.tx_hashes.get(tx_index) else {
            warn!(
                "No transaction hash at index {} in block {} ({}); skipping its call tree",
                tx_index, block.number, block.hash
            );
            continue;
        };
        let mut call_index = 0u32;
        for frame in tree {
            visit_frame(
                block,
                *tx_hash,
                tx_index as u32,
                &mut call_index,
                frame,
                &mut records,
            );
        }
    }
    records
}

fn visit_frame(
    block: &BlockRef,
    tx_hash: B256,
    tx_index: u32,
    call_index: &mut u32,
    frame: &CallFrame,
    records: &mut Vec<InternalTransaction>,
) {
    if let Some((to, value)) = transfer_of(frame) {
        records.push(InternalTransaction {
            tx_hash,
            block_hash: block.hash,
            block_number: block.number,
            tx_index,
            call_index: *call_index,
            from: frame.from,
            to,
            value,
        });
        *call_index += 1;
    }
    for call in &frame.calls {
        visit_frame(block, tx_hash, tx_index, call_index, call, records);
    }
}

fn transfer_of(frame: &CallFrame) -> Option<(Address, U256)> {
    if frame.kind != CallKind::Call || frame.from == Address::ZERO {
        return None;
    }
    let to = frame.to.filter(|to| *to != Address::ZERO)?;
    let value = frame.value.filter(|value| !value.is_zero())?;
    Some((to, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(n: u8) -> Address {
        Address::repeat_byte(n)
    }

    fn hash(n: u8) -> B256 {
        B256::repeat_byte(n)
    }

    fn block(tx_count: u8) -> BlockRef {
        BlockRef {
            number: 7,
            hash: hash(0xbb),
            tx_hashes: (0..tx_count).map(|i| hash(0xa0 + i)).collect(),
        }
    }

    fn transfer(from: u8, to: u8, value: u64) -> CallFrame {
        CallFrame {
            kind: CallKind::Call,
            from: addr(from),
            to: Some(addr(to)),
            value: Some(U256::from(value)),
            ..Default::default()
        }
    }

    #[test]
    fn emits_value_bearing_calls_in_visitation_order() {
        // Root Call A->B value 5, child Call B->C value 3, grandchild
        // StaticCall C->D value 0: the static call is excluded.
        let grandchild = CallFrame {
            kind: CallKind::StaticCall,
            from: addr(3),
            to: Some(addr(4)),
            value: Some(U256::ZERO),
            ..Default::default()
        };
        let mut child = transfer(2, 3, 3);
        child.calls = vec![grandchild];
        let mut root = transfer(1, 2, 5);
        root.calls = vec![child];

        let records = extract_internal_transactions(&block(1), &[vec![root]]);

        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0],
            InternalTransaction {
                tx_hash: hash(0xa0),
                block_hash: hash(0xbb),
                block_number: 7,
                tx_index: 0,
                call_index: 0,
                from: addr(1),
                to: addr(2),
                value: U256::from(5),
            }
        );
        assert_eq!(records[1].call_index, 1);
        assert_eq!(records[1].from, addr(2));
        assert_eq!(records[1].to, addr(3));
        assert_eq!(records[1].value, U256::from(3));
    }

    #[test]
    fn call_index_is_dense_over_emitted_records_only() {
        // Qualifying frames interleaved with non-qualifying ones at
        // several depths; the indices must still come out 0..k-1.
        let mut root = transfer(1, 2, 10);
        root.calls = vec![
            CallFrame {
                kind: CallKind::StaticCall,
                from: addr(2),
                to: Some(addr(3)),
                // A qualifying frame below a non-qualifying parent still emits.
                calls: vec![transfer(3, 4, 1)],
                ..Default::default()
            },
            transfer(2, 5, 2),
            CallFrame {
                kind: CallKind::Call,
                from: addr(2),
                to: Some(addr(6)),
                value: None,
                ..Default::default()
            },
            transfer(2, 7, 3),
        ];

        let records = extract_internal_transactions(&block(1), &[vec![root]]);

        let indices: Vec<u32> = records.iter().map(|r| r.call_index).collect();
        assert_eq!(indices, vec![0, 1, 2, 3]);
        let values: Vec<u64> = records.iter().map(|r| r.value.to::<u64>()).collect();
        assert_eq!(values, vec![10, 1, 2, 3]);
    }

    #[test]
    fn disqualifying_fields_never_emit() {
        let cases = vec![
            CallFrame {
                kind: CallKind::DelegateCall,
                ..transfer(1, 2, 5)
            },
            CallFrame {
                from: Address::ZERO,
                ..transfer(1, 2, 5)
            },
            CallFrame {
                to: None,
                ..transfer(1, 2, 5)
            },
            CallFrame {
                to: Some(Address::ZERO),
                ..transfer(1, 2, 5)
            },
            CallFrame {
                value: None,
                ..transfer(1, 2, 5)
            },
            CallFrame {
                value: Some(U256::ZERO),
                ..transfer(1, 2, 5)
            },
        ];
        for case in cases {
            let records = extract_internal_transactions(&block(1), &[vec![case]]);
            assert!(records.is_empty());
        }
    }

    #[test]
    fn call_index_restarts_per_transaction() {
        let trees = vec![vec![transfer(1, 2, 5)], vec![transfer(3, 4, 7)]];

        let records = extract_internal_transactions(&block(2), &trees);

        assert_eq!(records.len(), 2);
        assert_eq!((records[0].tx_index, records[0].call_index), (0, 0));
        assert_eq!((records[1].tx_index, records[1].call_index), (1, 0));
        assert_eq!(records[0].tx_hash, hash(0xa0));
        assert_eq!(records[1].tx_hash, hash(0xa1));
    }

    #[test]
    fn tree_without_a_transaction_hash_is_skipped() {
        let trees = vec![vec![transfer(1, 2, 5)], vec![transfer(3, 4, 7)]];

        // Only one known transaction; the orphan tree contributes nothing.
        let records = extract_internal_transactions(&block(1), &trees);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].tx_hash, hash(0xa0));
    }
}
