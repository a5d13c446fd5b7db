//! The exported call-in surface
//!
//! The host calls `mpcre2_*` functions through its external call table. Each
//! export decodes its arguments, runs one bridge operation under the process
//! lock and turns a refusal into the host sentinel for that operation (`-1`,
//! `"0"` or an operation-specific status). Nothing unwinds into the host:
//! panics are caught here and reported like any other error.
//!
//! The process bridge is built on first use from the configuration. If that
//! fails (no PCRE2 library, bad config file) every call reports the same
//! error and returns its sentinel.

mod exports;
pub mod host;

pub use exports::*;
pub use host::HostString;

use crate::bridge::Bridge;
use crate::diagnostic::{DiagnosticSink, StderrSink};
use crate::engine::{LibraryLoader, Pcre2Library, RegexEngine};
use crate::error::{BridgeError, BridgeResult};
use crate::handle::codec;
use crate::host::ProcessAllocator;
use crate::options::OptionError;
use mpcre2_config::ConfigLoader;
use std::any::Any;
use std::ffi::c_long;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

/// A bridge, or the reason it could not be built, behind the call lock
pub type BridgeState<E> = Mutex<Result<Bridge<E>, Unbuilt>>;

/// Why the bridge is missing, with the sink every refused call reports to
pub struct Unbuilt {
    pub error: BridgeError,
    sink: Box<dyn DiagnosticSink>,
}

impl Unbuilt {
    pub fn new(error: BridgeError, sink: Box<dyn DiagnosticSink>) -> Self {
        Self { error, sink }
    }
}

impl fmt::Debug for Unbuilt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Unbuilt").field("error", &self.error).finish_non_exhaustive()
    }
}

/// Status returned when the bridge refused a call
pub const FAILURE: c_long = -1;

static BRIDGE: OnceLock<BridgeState<Pcre2Library>> = OnceLock::new();

/// The process bridge, built on first use
pub fn bridge() -> &'static BridgeState<Pcre2Library> {
    BRIDGE.get_or_init(|| {
        let state = build();
        if let Err(unbuilt) = &state {
            log::error!("bridge unavailable: {}", unbuilt.error);
        }
        Mutex::new(state)
    })
}

/// A configuration that failed to load cannot say how to report that, so
/// only then do diagnostics fall back to the default stderr rendering
fn build() -> Result<Bridge<Pcre2Library>, Unbuilt> {
    let config = ConfigLoader::new()
        .load()
        .map_err(|e| Unbuilt::new(e.into(), Box::new(StderrSink::default())))?;
    let sink = StderrSink::from_config(&config);
    let engine = match Pcre2Library::load(&LibraryLoader::from_config(&config)) {
        Ok(engine) => engine,
        Err(e) => return Err(Unbuilt::new(e.into(), sink)),
    };
    log::info!("PCRE2 loaded from {}", engine.label());

    let memory = Arc::new(ProcessAllocator::new(config.callin_variable()));
    Ok(Bridge::new(engine, memory, sink))
}

/// Run one operation against `state`
///
/// Errors returned by `body`, panics inside it and a bridge that failed to
/// build are all reported as diagnostics naming `operation`, and the host
/// gets `fallback(error)` instead of a value.
pub fn dispatch<E: RegexEngine, T>(
    state: &BridgeState<E>,
    operation: &str,
    fallback: impl FnOnce(&BridgeError) -> T,
    body: impl FnOnce(&mut Bridge<E>) -> BridgeResult<T>,
) -> T {
    let mut guard = state.lock().unwrap_or_else(PoisonError::into_inner);
    let bridge = match guard.as_mut() {
        Ok(bridge) => bridge,
        Err(unbuilt) => {
            unbuilt.sink.emit(&unbuilt.error.to_diagnostic(operation));
            return fallback(&unbuilt.error);
        }
    };

    let result = match panic::catch_unwind(AssertUnwindSafe(|| body(&mut *bridge))) {
        Ok(result) => result,
        Err(payload) => Err(BridgeError::Panic(panic_message(payload.as_ref()))),
    };
    bridge.settle(operation, result, fallback)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Sentinel for operations returning a status
pub fn failure(_: &BridgeError) -> c_long {
    FAILURE
}

/// Sentinel for operations returning a handle
pub fn null_token(_: &BridgeError) -> String {
    codec::NULL_TOKEN.to_string()
}

/// Unknown option names yield `status`, other refusals [`FAILURE`]
pub fn option_failure(status: c_long) -> impl FnOnce(&BridgeError) -> c_long {
    move |error| match error {
        BridgeError::Option(OptionError::UnknownOption { .. }) => status,
        _ => FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::constants::ERROR_BADDATA;
    use crate::handle::HandleError;
    use crate::host::MemoryError;

    #[test]
    fn test_panic_message_payloads() {
        let text: Box<dyn Any + Send> = Box::new("boom");
        let owned: Box<dyn Any + Send> = Box::new(String::from("bang"));
        let other: Box<dyn Any + Send> = Box::new(7u8);

        assert_eq!(panic_message(text.as_ref()), "boom");
        assert_eq!(panic_message(owned.as_ref()), "bang");
        assert_eq!(panic_message(other.as_ref()), "unknown panic payload");
    }

    #[test]
    fn test_option_failure_only_for_unknown_names() {
        let unknown = BridgeError::Option(OptionError::UnknownOption {
            tag: "bsr",
            token: "BOGUS".to_string(),
        });
        let memory = BridgeError::Option(OptionError::Memory(MemoryError::Exhausted { size: 6 }));
        let handle = BridgeError::Handle(HandleError::Malformed("x".to_string()));

        assert_eq!(option_failure(c_long::from(ERROR_BADDATA))(&unknown), -29);
        assert_eq!(option_failure(c_long::from(ERROR_BADDATA))(&memory), FAILURE);
        assert_eq!(option_failure(0)(&handle), FAILURE);
    }
}
