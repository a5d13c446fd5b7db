//! mpcre2 - PCRE2 for the GT.M / YottaDB host runtime
//!
//! This library lets M code call PCRE2 through the host's external call
//! table. It provides:
//! - Exported `mpcre2_*` call-in functions
//! - Decimal handle tokens for engine objects, checked on every use
//! - Option lists (`"PCRE2_CASELESS|PCRE2_UTF"`) parsed into bitmasks
//! - Engine allocations routed to the host allocator
//! - Default and per-call engine contexts

/// mpcre2 version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod bridge;
pub mod callin;
pub mod context;
pub mod diagnostic;
pub mod engine;
pub mod error;
pub mod extract;
pub mod handle;
pub mod host;
pub mod options;

// Re-export commonly used types
pub use bridge::{Bridge, CompileOutcome, MatchCall, CODE_LIST_SEPARATOR};
pub use callin::{dispatch, BridgeState, HostString, Unbuilt};
pub use context::{ContextManager, ScopedContext};
pub use diagnostic::{error_codes, Diagnostic, DiagnosticLevel, DiagnosticSink, DIAG_VERSION};
pub use engine::{Pcre2Library, RegexEngine, Status};
pub use error::{BridgeError, BridgeResult};
pub use handle::{Handle, HandleError, HandleTable, Resource, ResourceKind};
pub use host::{HostMemory, ProcessAllocator};
