//! Process-wide host allocator binding
//!
//! The table address is read from the environment the first time any
//! operation needs memory, then cached for the life of the process. The
//! outcome of that first resolution, success or failure, is final.

use super::table::{HostFunctionTable, CALLIN_LAYOUT};
use super::{AllocatorError, HostMemory, MemoryError};
use crate::engine::types::AllocatorHooks;
use mpcre2_config::DEFAULT_CALLIN_VARIABLE;
use std::ffi::c_void;
use std::ptr::{null_mut, NonNull};
use std::sync::OnceLock;

static BINDING: OnceLock<Result<HostAllocator, AllocatorError>> = OnceLock::new();

/// Resolve the binding from `GTM_CALLIN_START`
pub fn resolve() -> Result<&'static HostAllocator, AllocatorError> {
    resolve_with(DEFAULT_CALLIN_VARIABLE)
}

/// Resolve the binding from `variable`
///
/// Only the first call in a process reads the environment; later calls
/// return the cached outcome whatever variable they name.
pub fn resolve_with(variable: &str) -> Result<&'static HostAllocator, AllocatorError> {
    BINDING
        .get_or_init(|| {
            let outcome = HostAllocator::from_env(variable);
            match &outcome {
                Ok(_) => log::debug!("host allocator bound from {}", variable),
                Err(e) => log::warn!("host allocator unavailable: {}", e),
            }
            outcome
        })
        .as_ref()
        .map_err(Clone::clone)
}

/// The host's allocate/free entry points
#[derive(Debug, Clone, Copy)]
pub struct HostAllocator {
    table: HostFunctionTable,
}

impl HostAllocator {
    pub fn from_table(table: HostFunctionTable) -> Self {
        Self { table }
    }

    /// Read the table address from the environment
    pub fn from_env(variable: &str) -> Result<Self, AllocatorError> {
        Self::from_env_value(variable, std::env::var(variable).ok().as_deref())
    }

    /// Bind from the value of the table variable
    ///
    /// The value must be the decimal address the host runtime published for
    /// its own table; any other non-zero number is undefined behavior.
    pub fn from_env_value(variable: &str, value: Option<&str>) -> Result<Self, AllocatorError> {
        let value = value.ok_or_else(|| AllocatorError::NotSet {
            variable: variable.to_string(),
        })?;
        let base = value
            .trim()
            .parse::<usize>()
            .map_err(|_| AllocatorError::Unparsable {
                variable: variable.to_string(),
                value: value.to_string(),
            })?;
        if base == 0 {
            return Err(AllocatorError::NullTable {
                variable: variable.to_string(),
            });
        }

        // Safety: the host publishes a live table at this address
        let table = unsafe { HostFunctionTable::read(base, &CALLIN_LAYOUT)? };
        Ok(Self::from_table(table))
    }

    pub fn table(&self) -> HostFunctionTable {
        self.table
    }

    /// Allocate through the host
    pub fn allocate_raw(&self, size: usize) -> *mut c_void {
        // Safety: the host allocator accepts any size and signals failure with null
        unsafe { (self.table.allocate)(size) }
    }

    /// Free through the host
    ///
    /// # Safety
    ///
    /// `ptr` must have come from `allocate_raw` and must not be used again.
    pub unsafe fn free_raw(&self, ptr: *mut c_void) {
        (self.table.free)(ptr)
    }
}

/// Engine allocator hook; the user data argument is ignored
///
/// # Safety
///
/// Called by the engine only.
pub unsafe extern "C" fn host_malloc(size: usize, _data: *mut c_void) -> *mut c_void {
    match BINDING.get() {
        Some(Ok(allocator)) => allocator.allocate_raw(size),
        _ => null_mut(),
    }
}

/// Engine free hook; the user data argument is ignored
///
/// # Safety
///
/// Called by the engine only, with memory from [`host_malloc`].
pub unsafe extern "C" fn host_free(ptr: *mut c_void, _data: *mut c_void) {
    if ptr.is_null() {
        return;
    }
    if let Some(Ok(allocator)) = BINDING.get() {
        allocator.free_raw(ptr);
    }
}

/// `HostMemory` backed by the process-wide binding
#[derive(Debug, Clone)]
pub struct ProcessAllocator {
    variable: String,
}

impl ProcessAllocator {
    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }

    pub fn binding(&self) -> Result<&'static HostAllocator, AllocatorError> {
        resolve_with(&self.variable)
    }
}

impl Default for ProcessAllocator {
    fn default() -> Self {
        Self::new(DEFAULT_CALLIN_VARIABLE)
    }
}

impl HostMemory for ProcessAllocator {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, MemoryError> {
        let raw = self.binding()?.allocate_raw(size);
        NonNull::new(raw.cast::<u8>()).ok_or(MemoryError::Exhausted { size })
    }

    unsafe fn release(&self, ptr: NonNull<u8>) {
        if let Ok(allocator) = self.binding() {
            allocator.free_raw(ptr.as_ptr().cast());
        }
    }

    fn engine_hooks(&self) -> Result<AllocatorHooks, MemoryError> {
        self.binding()?;
        Ok(AllocatorHooks {
            malloc: Some(host_malloc),
            free: Some(host_free),
            data: null_mut(),
        })
    }
}
