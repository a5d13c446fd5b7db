//! The host runtime's memory domain
//!
//! The engine and the bridge's own scratch buffers allocate through the host
//! runtime's allocator, which is published as a function table whose address
//! arrives in an environment variable. This module:
//! - Describes that table (`HostFunctionTable`)
//! - Resolves it once per process (`resolve`, `resolve_with`)
//! - Adapts it to the engine's allocator hook signatures

pub mod allocator;
pub mod table;

use crate::engine::types::AllocatorHooks;
use std::ptr::NonNull;
use thiserror::Error;

pub use allocator::{resolve, resolve_with, HostAllocator, ProcessAllocator};
pub use table::{HostFunctionTable, TableLayout, CALLIN_LAYOUT};

/// Failures locating the host function table
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocatorError {
    #[error("{variable} is not set; the host allocator is unavailable")]
    NotSet { variable: String },

    #[error("{variable}={value} is not a decimal address")]
    Unparsable { variable: String, value: String },

    #[error("{variable} holds a null function table address")]
    NullTable { variable: String },

    #[error("host function table slot {slot} is empty")]
    NullSlot { slot: usize },
}

/// Failures of a single allocation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MemoryError {
    #[error(transparent)]
    Unavailable(#[from] AllocatorError),

    #[error("host allocator could not provide {size} bytes")]
    Exhausted { size: usize },
}

/// Memory the bridge allocates in the host's domain
pub trait HostMemory: Send + Sync {
    /// Allocate `size` bytes
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, MemoryError>;

    /// Return memory obtained from [`HostMemory::allocate`]
    ///
    /// # Safety
    ///
    /// `ptr` must come from `allocate` on the same memory and must not have
    /// been released already.
    unsafe fn release(&self, ptr: NonNull<u8>);

    /// Hooks that route the engine's own allocations to this memory
    fn engine_hooks(&self) -> Result<AllocatorHooks, MemoryError>;
}
