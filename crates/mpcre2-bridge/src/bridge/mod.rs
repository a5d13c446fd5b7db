//! The bridge: host-shaped operations over a `RegexEngine`
//!
//! Each operation takes the host's view of its arguments (handle tokens,
//! option strings, byte slices) and returns either the engine's answer or a
//! `BridgeError` when the bridge refused to make the call. Turning that error
//! into the host's sentinel is left to the exported layer, which reports it
//! through `Bridge::settle`.
//!
//! Operations are grouped by area:
//! - `contexts`: general, compile and match contexts
//! - `matching`: compile, match data, the three matchers, substitute
//! - `substrings`: substring copy/get/list and the buffer helpers
//! - `jit`: JIT compile and stacks
//! - `serialize`: pattern serialization
//! - `misc`: pattern info, error messages, character tables, callouts

mod contexts;
mod jit;
mod matching;
mod misc;
mod serialize;
mod substrings;

use crate::context::ContextManager;
use crate::diagnostic::DiagnosticSink;
use crate::engine::{GeneralContextPtr, RegexEngine};
use crate::error::{BridgeError, BridgeResult};
use crate::handle::table::TableEntry;
use crate::handle::{HandleTable, Resource, ResourceKind};
use crate::host::{HostMemory, MemoryError};
use std::sync::Arc;

pub use matching::{CompileOutcome, MatchCall};
pub use serialize::CODE_LIST_SEPARATOR;

/// Bridge state for one process
pub struct Bridge<E: RegexEngine> {
    engine: E,
    memory: Arc<dyn HostMemory>,
    handles: HandleTable,
    contexts: ContextManager,
    diagnostics: Box<dyn DiagnosticSink>,
}

impl<E: RegexEngine> Bridge<E> {
    pub fn new(
        engine: E,
        memory: Arc<dyn HostMemory>,
        diagnostics: Box<dyn DiagnosticSink>,
    ) -> Self {
        Self {
            engine,
            memory,
            handles: HandleTable::new(),
            contexts: ContextManager::new(),
            diagnostics,
        }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn handles(&self) -> &HandleTable {
        &self.handles
    }

    /// The default general context, once something has needed it
    pub fn default_general_context(&self) -> Option<GeneralContextPtr> {
        self.contexts.default_context()
    }

    /// Emit the diagnostic for `error`
    pub fn report(&self, operation: &str, error: &BridgeError) {
        self.diagnostics.emit(&error.to_diagnostic(operation));
    }

    /// Unwrap an operation result, reporting a failure and substituting the
    /// host sentinel chosen by `fallback`
    pub fn settle<T>(
        &self,
        operation: &str,
        result: BridgeResult<T>,
        fallback: impl FnOnce(&BridgeError) -> T,
    ) -> T {
        match result {
            Ok(value) => value,
            Err(error) => {
                self.report(operation, &error);
                fallback(&error)
            }
        }
    }

    /// The general context for `token`, the default one for a sentinel
    fn general(&mut self, token: &str) -> BridgeResult<GeneralContextPtr> {
        Ok(self
            .contexts
            .general(&self.engine, &*self.memory, &self.handles, token)?)
    }

    /// Register a newly created engine object
    fn register(&mut self, resource: Option<Resource>, kind: ResourceKind) -> BridgeResult<String> {
        let resource = resource.ok_or(BridgeError::Unavailable(kind))?;
        Ok(self.handles.insert(resource).token())
    }

    /// Remove a host-owned object from the table so it can be freed
    fn release<T: TableEntry>(&mut self, token: &str) -> BridgeResult<Option<T>> {
        Ok(self
            .handles
            .take(token, T::KIND)?
            .and_then(T::from_resource))
    }
}

/// A `len`-element buffer filled with `fill`, sized by the host
///
/// The length comes straight from a call argument, so the reservation is
/// fallible: an impossible size becomes an error instead of an abort.
fn host_sized<T: Clone>(len: usize, fill: T) -> Result<Vec<T>, MemoryError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| MemoryError::Exhausted {
            size: len.saturating_mul(std::mem::size_of::<T>()),
        })?;
    buffer.resize(len, fill);
    Ok(buffer)
}
