pub mod encoding;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use alloy_primitives::{Address, B256, U256};

use crate::models::errors::TracerError;
use crate::models::frames::{CallFrame, CallKind, CallLog, clear_failed_logs};

#[derive(Debug, Clone, Copy, Default)]
pub struct CallTracerConfig {
    pub only_top_call: bool, // If true, the tracer won't collect any subcalls
    pub with_log: bool,      // If true, the tracer will collect event logs
}

/// Reconstructs the call tree of every transaction in a block from the
/// engine's enter/exit/log hooks. The engine drives the hooks
/// single-threaded and in strict depth-first order, one block at a time;
/// malformed hook sequences are absorbed into a partial or empty tree
/// rather than propagated back into the engine.
pub struct CallTracer {
    config: CallTracerConfig,
    callstacks: Vec<Vec<CallFrame>>,
    callstack: Vec<CallFrame>,
    gas_limit: u64,
    depth: usize,
    interrupt: Arc<AtomicBool>,
    reason: Arc<Mutex<Option<String>>>,
}

// Cloneable handle for interrupting a CallTracer from another thread,
// e.g. a supervisory timeout.
#[derive(Clone)]
pub struct StopHandle {
    interrupt: Arc<AtomicBool>,
    reason: Arc<Mutex<Option<String>>>,
}

impl StopHandle {
    // Stops capture at the first opportune moment. Idempotent; the first
    // reason wins. Frames that are already open still exit and pop
    // normally, so the stack winds down instead of leaking.
    pub fn stop(&self, reason: impl Into<String>) {
        if let Ok(mut slot) = self.reason.lock() {
            slot.get_or_insert_with(|| reason.into());
        }
        self.interrupt.store(true, Ordering::Relaxed);
    }
}

impl CallTracer {
    pub fn new(config: CallTracerConfig) -> Self {
        Self {
            config,
            callstacks: Vec::new(),
            callstack: Vec::new(),
            gas_limit: 0,
            depth: 0,
            interrupt: Arc::new(AtomicBool::new(false)),
            reason: Arc::new(Mutex::new(None)),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            interrupt: self.interrupt.clone(),
            reason: self.reason.clone(),
        }
    }

    pub fn on_block_start(&mut self) {
        self.callstacks.clear();
        self.interrupt.store(false, Ordering::Relaxed);
        if let Ok(mut reason) = self.reason.lock() {
            *reason = None;
        }
    }

    // Opens a fresh stack holding the root placeholder; on_enter at
    // depth 0 re-opens it with the real root frame.
    pub fn on_tx_start(&mut self, gas_limit: u64) {
        self.callstack = vec![CallFrame {
            gas: gas_limit,
            ..Default::default()
        }];
        self.gas_limit = gas_limit;
        self.depth = 0;
    }

    pub fn on_enter(
        &mut self,
        depth: usize,
        kind: CallKind,
        from: Address,
        to: Option<Address>,
        input: &[u8],
        gas: u64,
        value: Option<U256>,
    ) {
        self.depth = depth;
        if self.config.only_top_call && depth > 0 {
            return;
        }
        if self.interrupt.load(Ordering::Relaxed) {
            return;
        }

        // The engine may reuse its input buffer; take an owned copy.
        let mut call = CallFrame {
            kind,
            from,
            to,
            input: input.to_vec().into(),
            gas,
            value,
            ..Default::default()
        };
        if depth == 0 {
            // Top-level gas accounting is transaction-relative.
            call.gas = self.gas_limit;
            self.callstack = vec![call];
        } else {
            self.callstack.push(call);
        }
    }

    pub fn on_exit(
        &mut self,
        depth: usize,
        output: &[u8],
        gas_used: u64,
        err: Option<&str>,
        reverted: bool,
    ) {
        if depth == 0 {
            self.finish_root(output, err, reverted);
            return;
        }

        self.depth = depth - 1;
        if self.config.only_top_call {
            return;
        }
        // Fewer than two open frames means the exit has no matching enter
        // (interrupted or malformed sequence); drop it.
        if self.callstack.len() < 2 {
            return;
        }
        let Some(mut call) = self.callstack.pop() else {
            return;
        };
        call.gas_used = gas_used;
        call.process_output(output, err, reverted);
        if let Some(parent) = self.callstack.last_mut() {
            parent.calls.push(call);
        }
    }

    // Terminal transition for the transaction's tree. The root's
    // gas_used is attached later from the receipt total in `on_tx_end`.
    fn finish_root(&mut self, output: &[u8], err: Option<&str>, reverted: bool) {
        if self.callstack.len() != 1 {
            return;
        }
        let root = &mut self.callstack[0];
        // A finalized root has its output or error set; a repeated
        // depth-0 exit must not reopen it.
        if root.output.is_some() || root.error.is_some() {
            return;
        }
        root.process_output(output, err, reverted);
    }

    pub fn on_log(&mut self, address: Address, topics: Vec<B256>, data: &[u8]) {
        if !self.config.with_log {
            return;
        }
        if self.config.only_top_call && self.depth > 0 {
            return;
        }
        if self.interrupt.load(Ordering::Relaxed) {
            return;
        }
        let Some(top) = self.callstack.last_mut() else {
            return;
        };
        let position = top.calls.len() as u64;
        top.logs.push(CallLog {
            address,
            topics,
            data: data.to_vec().into(),
            position,
        });
    }

    pub fn on_tx_end(&mut self, gas_used: u64, err: Option<&str>) {
        // Error happened during tx validation; the tree is discarded.
        if err.is_some() {
            self.callstack.clear();
            return;
        }
        if let Some(root) = self.callstack.first_mut() {
            root.gas_used = gas_used;
        }
        if self.config.with_log {
            // Logs are not emitted when the call fails.
            for frame in &mut self.callstack {
                clear_failed_logs(frame, false);
            }
        }
        if !self.callstack.is_empty() {
            self.callstacks.push(std::mem::take(&mut self.callstack));
        }
    }

    /// Returns the encoded per-block list of call trees, or the error the
    /// tracer was stopped with. Valid only after the engine has emitted
    /// every callback for the block; not retryable mid-block.
    pub fn get_result(&self) -> Result<Vec<u8>, TracerError> {
        if let Some(reason) = self.interrupt_reason() {
            return Err(TracerError::Interrupted(reason));
        }
        Ok(encoding::encode(&self.callstacks)?)
    }

    fn interrupt_reason(&self) -> Option<String> {
        if !self.interrupt.load(Ordering::Relaxed) {
            return None;
        }
        let reason = self.reason.lock().ok().and_then(|slot| slot.clone());
        Some(reason.unwrap_or_default())
    }
}
