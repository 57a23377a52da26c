//! Byte form of a per-block trace: a JSON array with one entry per
//! executed transaction, each entry the transaction's finished frame
//! stack (one root frame, nesting depth-first through `calls`). The
//! encode side feeds storage; the decode side feeds extraction, so the
//! bytes are a shared boundary format rather than a procedure call.

use crate::models::errors::TraceDecodeError;
use crate::models::frames::CallFrame;

pub fn encode(trees: &[Vec<CallFrame>]) -> Result<Vec<u8>, serde_json::Error> {
    serde_json::to_vec(trees)
}

pub fn decode(bytes: &[u8]) -> Result<Vec<Vec<CallFrame>>, TraceDecodeError> {
    Ok(serde_json::from_slice(bytes)?)
}
