//! Host function table descriptor
//!
//! The host runtime exposes a contiguous array of function pointers at
//! process start. Only the allocation entry points are used here; their slot
//! numbers are fixed by the host and are named in `CALLIN_LAYOUT`.

use super::AllocatorError;
use std::ffi::c_void;

/// `void *(*)(size_t)`
pub type HostAllocFn = unsafe extern "C" fn(usize) -> *mut c_void;
/// `void (*)(void *)`
pub type HostFreeFn = unsafe extern "C" fn(*mut c_void);

/// Slot assignment of one revision of the host table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableLayout {
    pub version: u32,
    pub allocate_slot: usize,
    pub free_slot: usize,
}

/// The call-in table layout: allocate in slot 4, free in slot 5
pub const CALLIN_LAYOUT: TableLayout = TableLayout {
    version: 1,
    allocate_slot: 4,
    free_slot: 5,
};

/// The host entry points the bridge needs
#[derive(Debug, Clone, Copy)]
pub struct HostFunctionTable {
    pub allocate: HostAllocFn,
    pub free: HostFreeFn,
}

impl HostFunctionTable {
    /// Read the allocation slots of the table at `base`
    ///
    /// # Safety
    ///
    /// `base` must be the address of a live array of at least
    /// `max(allocate_slot, free_slot) + 1` function pointers laid out as
    /// `layout` describes.
    pub unsafe fn read(base: usize, layout: &TableLayout) -> Result<Self, AllocatorError> {
        let slots = base as *const Option<unsafe extern "C" fn()>;
        let allocate = (*slots.add(layout.allocate_slot)).ok_or(AllocatorError::NullSlot {
            slot: layout.allocate_slot,
        })?;
        let free = (*slots.add(layout.free_slot)).ok_or(AllocatorError::NullSlot {
            slot: layout.free_slot,
        })?;

        Ok(Self {
            allocate: std::mem::transmute::<unsafe extern "C" fn(), HostAllocFn>(allocate),
            free: std::mem::transmute::<unsafe extern "C" fn(), HostFreeFn>(free),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn never_alloc(_size: usize) -> *mut c_void {
        std::ptr::null_mut()
    }

    unsafe extern "C" fn never_free(_ptr: *mut c_void) {}

    fn table_with(alloc: usize, free: usize) -> [usize; 8] {
        let mut slots = [0usize; 8];
        slots[CALLIN_LAYOUT.allocate_slot] = alloc;
        slots[CALLIN_LAYOUT.free_slot] = free;
        slots
    }

    #[test]
    fn test_reads_named_slots() {
        let slots = table_with(never_alloc as usize, never_free as usize);

        let table = unsafe { HostFunctionTable::read(slots.as_ptr() as usize, &CALLIN_LAYOUT) }
            .unwrap();

        assert_eq!(table.allocate as usize, never_alloc as usize);
        assert_eq!(table.free as usize, never_free as usize);
    }

    #[test]
    fn test_empty_slot_rejected() {
        let slots = table_with(never_alloc as usize, 0);

        let err = unsafe { HostFunctionTable::read(slots.as_ptr() as usize, &CALLIN_LAYOUT) }
            .unwrap_err();

        assert_eq!(err, AllocatorError::NullSlot { slot: 5 });
    }

    #[test]
    fn test_layout_slots() {
        assert_eq!(CALLIN_LAYOUT.allocate_slot, 4);
        assert_eq!(CALLIN_LAYOUT.free_slot, 5);
    }
}
