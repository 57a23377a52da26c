use alloy_primitives::{Address, B256, Bytes, U256};
use serde::{Deserialize, Serialize};

// Solidity `Error(string)` selector, the payload shape of a standard revert.
const REVERT_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

// Operation that opened a call scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallKind {
    #[default]
    #[serde(rename = "CALL")]
    Call,
    #[serde(rename = "STATICCALL")]
    StaticCall,
    #[serde(rename = "DELEGATECALL")]
    DelegateCall,
    #[serde(rename = "CALLCODE")]
    CallCode,
    #[serde(rename = "CREATE")]
    Create,
    #[serde(rename = "CREATE2")]
    Create2,
    #[serde(rename = "SELFDESTRUCT")]
    SelfDestruct,
}

// One node of a transaction's call tree. Sub-calls are attached to
// `calls` in call order when their scope exits; a frame is never
// serialized while still open.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallFrame {
    #[serde(rename = "type")]
    pub kind: CallKind,
    pub from: Address,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<Address>,
    #[serde(with = "alloy_serde::quantity")]
    pub gas: u64,
    #[serde(with = "alloy_serde::quantity")]
    pub gas_used: u64,
    pub input: Bytes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revert_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub calls: Vec<CallFrame>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<CallLog>,
    // Absent for non-value-bearing call kinds; present-and-zero is distinct.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<U256>,
}

// Event emitted while a frame was the open scope. `position` is the
// number of the frame's sub-calls that had already completed when the
// log was recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CallLog {
    pub address: Address,
    pub topics: Vec<B256>,
    pub data: Bytes,
    #[serde(with = "alloy_serde::quantity")]
    pub position: u64,
}

impl CallFrame {
    // Attaches the scope's result when it exits. Output bytes are
    // copied; an empty output on success is stored as empty, not
    // dropped. A failed contract creation loses its `to`.
    pub(crate) fn process_output(&mut self, output: &[u8], err: Option<&str>, reverted: bool) {
        let output = Bytes::copy_from_slice(output);
        let Some(err) = err else {
            self.output = Some(output);
            return;
        };
        self.error = Some(err.to_string());
        if matches!(self.kind, CallKind::Create | CallKind::Create2) {
            self.to = None;
        }
        if !reverted || output.is_empty() {
            return;
        }
        self.revert_reason = decode_revert_reason(&output);
        self.output = Some(output);
    }

    pub fn failed(&self) -> bool {
        self.error.is_some()
    }
}

// Removes logs from every frame on a failed execution path; events from
// a reverted scope (or anything beneath it) were rolled back.
pub(crate) fn clear_failed_logs(frame: &mut CallFrame, parent_failed: bool) {
    let failed = frame.failed() || parent_failed;
    if failed {
        frame.logs.clear();
    }
    for call in &mut frame.calls {
        clear_failed_logs(call, failed);
    }
}

// Decodes an ABI-encoded `Error(string)` revert payload, if that is what
// the output holds.
fn decode_revert_reason(output: &[u8]) -> Option<String> {
    let payload = output.strip_prefix(REVERT_SELECTOR.as_slice())?;
    let offset: usize = U256::from_be_slice(payload.get(..32)?).try_into().ok()?;
    let len: usize = U256::from_be_slice(payload.get(offset..offset.checked_add(32)?)?)
        .try_into()
        .ok()?;
    let start = offset.checked_add(32)?;
    let reason = payload.get(start..start.checked_add(len)?)?;
    Some(String::from_utf8_lossy(reason).into_owned())
}
