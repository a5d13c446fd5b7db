//! Bridge error type
//!
//! A `BridgeError` means the bridge refused to reach the engine: a handle did
//! not resolve, an option string did not parse, memory was unavailable. Each
//! one maps to a diagnostic code. Engine status codes are not errors here;
//! they travel back to the host as ordinary values.

use crate::context::ContextError;
use crate::diagnostic::{error_codes, Diagnostic};
use crate::engine::LoadError;
use crate::extract::ExtractError;
use crate::handle::{HandleError, ResourceKind};
use crate::host::{AllocatorError, MemoryError};
use crate::options::OptionError;
use mpcre2_config::ConfigError;
use thiserror::Error;

pub type BridgeResult<T> = Result<T, BridgeError>;

#[derive(Debug, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error(transparent)]
    Option(#[from] OptionError),

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error(transparent)]
    Extract(#[from] ExtractError),

    /// The engine returned null from a create or copy call
    #[error("the engine could not provide a {0}")]
    Unavailable(ResourceKind),

    #[error("'{value}' names {count} selectors; pattern_info takes exactly one")]
    InvalidSelector { value: String, count: usize },

    #[error("invalid {name}: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    #[error("handle {lengths} is not the length array of substring list {list}")]
    UnrelatedLengths { list: String, lengths: String },

    #[error("{needed} bytes needed in a host buffer of {available}")]
    HostBufferTooSmall { needed: usize, available: usize },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("internal panic: {0}")]
    Panic(String),
}

impl From<ContextError> for BridgeError {
    fn from(error: ContextError) -> Self {
        match error {
            ContextError::Handle(e) => BridgeError::Handle(e),
            ContextError::Memory(e) => BridgeError::Memory(e),
            ContextError::Unavailable(kind) => BridgeError::Unavailable(kind),
        }
    }
}

impl BridgeError {
    pub fn invalid_argument(name: &'static str, reason: impl ToString) -> Self {
        Self::InvalidArgument {
            name,
            reason: reason.to_string(),
        }
    }

    /// Stable diagnostic code
    pub fn code(&self) -> &'static str {
        match self {
            BridgeError::Handle(e) => match e {
                HandleError::Malformed(_) => error_codes::HANDLE_MALFORMED,
                HandleError::Invalid(_) => error_codes::HANDLE_UNKNOWN,
                HandleError::Stale(_) => error_codes::HANDLE_STALE,
                HandleError::KindMismatch { .. } => error_codes::HANDLE_KIND_MISMATCH,
                HandleError::Required(_) => error_codes::HANDLE_REQUIRED,
                HandleError::Pinned(_) => error_codes::HANDLE_PINNED,
            },
            BridgeError::Option(OptionError::UnknownOption { .. }) => error_codes::UNKNOWN_OPTION,
            BridgeError::Option(OptionError::Memory(e)) | BridgeError::Memory(e) => memory_code(e),
            BridgeError::Extract(ExtractError::IndexOutOfRange { .. }) => {
                error_codes::INDEX_OUT_OF_RANGE
            }
            BridgeError::Extract(ExtractError::LengthOutOfRange { .. }) => {
                error_codes::HOST_BUFFER_TOO_SMALL
            }
            BridgeError::Unavailable(
                ResourceKind::GeneralContext
                | ResourceKind::CompileContext
                | ResourceKind::MatchContext,
            ) => error_codes::CONTEXT_UNAVAILABLE,
            BridgeError::Unavailable(_) => error_codes::RESOURCE_UNAVAILABLE,
            BridgeError::InvalidSelector { .. } => error_codes::INVALID_SELECTOR,
            BridgeError::UnrelatedLengths { .. } => error_codes::HANDLE_KIND_MISMATCH,
            BridgeError::HostBufferTooSmall { .. } => error_codes::HOST_BUFFER_TOO_SMALL,
            BridgeError::Load(LoadError::SymbolNotFound { .. }) => error_codes::SYMBOL_NOT_FOUND,
            BridgeError::Load(_) => error_codes::LIBRARY_NOT_FOUND,
            BridgeError::Config(_) => error_codes::CONFIG_ERROR,
            BridgeError::Panic(_) => error_codes::INTERNAL_PANIC,
            BridgeError::InvalidArgument { .. } => error_codes::GENERIC_ERROR,
        }
    }

    /// The diagnostic reported for this error in `operation`
    pub fn to_diagnostic(&self, operation: &str) -> Diagnostic {
        let diag = Diagnostic::error_with_code(self.code(), self.to_string()).with_operation(operation);

        match self {
            BridgeError::Option(OptionError::UnknownOption { .. }) => {
                diag.with_note("option names are case-sensitive and joined with '|'")
            }
            BridgeError::Handle(HandleError::Stale(_)) => {
                diag.with_note("the resource was freed by an earlier call")
            }
            BridgeError::Handle(HandleError::Pinned(_)) => {
                diag.with_help("the default general context lives as long as the process")
            }
            BridgeError::Memory(MemoryError::Unavailable(AllocatorError::NotSet { variable }))
            | BridgeError::Option(OptionError::Memory(MemoryError::Unavailable(
                AllocatorError::NotSet { variable },
            ))) => diag.with_help(format!(
                "{} is set by the host runtime; call the bridge from a host process",
                variable
            )),
            _ => diag,
        }
    }
}

fn memory_code(error: &MemoryError) -> &'static str {
    match error {
        MemoryError::Unavailable(AllocatorError::NotSet { .. }) => error_codes::CALLIN_VARIABLE_UNSET,
        MemoryError::Unavailable(AllocatorError::Unparsable { .. }) => {
            error_codes::CALLIN_ADDRESS_UNPARSABLE
        }
        MemoryError::Unavailable(AllocatorError::NullTable { .. } | AllocatorError::NullSlot { .. }) => {
            error_codes::CALLIN_TABLE_INVALID
        }
        MemoryError::Exhausted { .. } => error_codes::HOST_ALLOCATION_FAILED,
    }
}
