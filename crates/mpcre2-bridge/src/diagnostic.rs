//! Diagnostic system for bridge failures
//!
//! Every failure the bridge detects on its own (bad handle, unknown option,
//! missing host allocator) is reported through a `Diagnostic` before the
//! exported call returns its sentinel. Engine error codes are never turned
//! into diagnostics; they are passed through to the host unchanged.

pub mod formatter;
pub mod sink;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use formatter::{ColorMode, DiagnosticFormatter};
pub use sink::{DiagnosticSink, MemorySink, SilentSink, StderrSink};

/// Diagnostic schema version
pub const DIAG_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticLevel {
    /// The call returned its failure sentinel
    Error,
    /// The call went ahead with a fallback
    Warning,
}

impl DiagnosticLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            DiagnosticLevel::Error => "error",
            DiagnosticLevel::Warning => "warning",
        }
    }
}

impl fmt::Display for DiagnosticLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One report about a refused or failed call
///
/// The serialized form is what `MPCRE2_DIAGNOSTICS=json` writes, one object
/// per line; `diag_version` lets consumers detect schema changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub diag_version: u32,
    pub level: DiagnosticLevel,
    /// Stable code from [`error_codes`]
    pub code: String,
    pub message: String,
    /// Exported function name, such as `mpcre2_compile`
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub operation: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub notes: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub help: Option<String>,
}

impl Diagnostic {
    fn new(level: DiagnosticLevel, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            diag_version: DIAG_VERSION,
            level,
            code: code.into(),
            message: message.into(),
            operation: None,
            notes: Vec::new(),
            help: None,
        }
    }

    pub fn error_with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Error, code, message)
    }

    pub fn warning_with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(DiagnosticLevel::Warning, code, message)
    }

    /// An error under [`error_codes::GENERIC_ERROR`]
    pub fn error(message: impl Into<String>) -> Self {
        Self::error_with_code(error_codes::GENERIC_ERROR, message)
    }

    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The uncoloured terminal rendering
    pub fn to_human_string(&self) -> String {
        let bytes = DiagnosticFormatter::plain().format_to_buffer(self);
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Single-line JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Error code registry
pub mod error_codes {
    // MP00xx - Host environment and allocator
    pub const CALLIN_VARIABLE_UNSET: &str = "MP0001";
    pub const CALLIN_ADDRESS_UNPARSABLE: &str = "MP0002";
    pub const CALLIN_TABLE_INVALID: &str = "MP0003";
    pub const HOST_ALLOCATION_FAILED: &str = "MP0010";

    // MP01xx - Handles
    pub const HANDLE_MALFORMED: &str = "MP0100";
    pub const HANDLE_STALE: &str = "MP0101";
    pub const HANDLE_UNKNOWN: &str = "MP0102";
    pub const HANDLE_KIND_MISMATCH: &str = "MP0103";
    pub const HANDLE_REQUIRED: &str = "MP0104";
    pub const HANDLE_PINNED: &str = "MP0105";

    // MP02xx - Options
    pub const UNKNOWN_OPTION: &str = "MP0200";
    pub const INVALID_SELECTOR: &str = "MP0201";

    // MP03xx - Contexts and engine resources
    pub const CONTEXT_UNAVAILABLE: &str = "MP0300";
    pub const RESOURCE_UNAVAILABLE: &str = "MP0301";

    // MP04xx - Result extraction
    pub const INDEX_OUT_OF_RANGE: &str = "MP0400";
    pub const HOST_BUFFER_TOO_SMALL: &str = "MP0401";

    // MP05xx - Engine library
    pub const LIBRARY_NOT_FOUND: &str = "MP0500";
    pub const SYMBOL_NOT_FOUND: &str = "MP0501";
    pub const CONFIG_ERROR: &str = "MP0502";

    // MP9xxx - Internal
    pub const INTERNAL_PANIC: &str = "MP9998";
    pub const GENERIC_ERROR: &str = "MP9999";
}
