//! Engine-side types crossing the foreign boundary
//!
//! Defines:
//! - Opaque pointer newtypes for every engine object the host can hold
//! - `ForeignBytes`: an engine-owned byte buffer with a known length
//! - Callback signatures the engine accepts
//!
//! The newtypes are never constructed from host input directly; they come
//! out of the engine and are stored in the handle table.

use std::ffi::{c_int, c_void};
use std::ptr::NonNull;

macro_rules! foreign_pointer {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(transparent)]
        pub struct $name(NonNull<c_void>);

        impl $name {
            /// Wrap a pointer returned by the engine
            ///
            /// # Safety
            ///
            /// `ptr` must be null or point to a live engine object of this kind.
            pub unsafe fn from_raw(ptr: *mut c_void) -> Option<Self> {
                NonNull::new(ptr).map(Self)
            }

            pub fn as_ptr(self) -> *mut c_void {
                self.0.as_ptr()
            }

            pub fn addr(self) -> usize {
                self.0.as_ptr() as usize
            }
        }

        // Safety: the engine objects carry no thread affinity; the bridge
        // serializes every access behind one lock.
        unsafe impl Send for $name {}
    };
}

foreign_pointer!(
    /// `pcre2_general_context *`
    GeneralContextPtr
);
foreign_pointer!(
    /// `pcre2_compile_context *`
    CompileContextPtr
);
foreign_pointer!(
    /// `pcre2_match_context *`
    MatchContextPtr
);
foreign_pointer!(
    /// `pcre2_code *`
    CodePtr
);
foreign_pointer!(
    /// `pcre2_match_data *`
    MatchDataPtr
);
foreign_pointer!(
    /// `pcre2_jit_stack *`
    JitStackPtr
);

/// Engine-owned bytes with a known length
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignBytes {
    pub ptr: NonNull<u8>,
    pub len: usize,
}

impl ForeignBytes {
    /// # Safety
    ///
    /// `ptr` must be null or valid for reads of `len` bytes for as long as
    /// the value is used.
    pub unsafe fn from_raw(ptr: *const u8, len: usize) -> Option<Self> {
        NonNull::new(ptr as *mut u8).map(|ptr| Self { ptr, len })
    }

    /// View the bytes
    ///
    /// # Safety
    ///
    /// The engine must not have freed the buffer.
    pub unsafe fn as_slice<'a>(self) -> &'a [u8] {
        std::slice::from_raw_parts(self.ptr.as_ptr(), self.len)
    }
}

// Safety: see `foreign_pointer!`
unsafe impl Send for ForeignBytes {}

/// The ovector of one match data block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OvectorPtr {
    pub match_data: MatchDataPtr,
    pub pairs: NonNull<usize>,
}

unsafe impl Send for OvectorPtr {}

/// Result of `pcre2_substring_list_get`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstringListPtr {
    /// NULL-terminated array of substring pointers
    pub list: NonNull<*mut u8>,
    /// Parallel array of lengths
    pub lengths: NonNull<usize>,
}

unsafe impl Send for SubstringListPtr {}

/// `int (*)(pcre2_callout_block *, void *)`
pub type CalloutFn = unsafe extern "C" fn(*mut c_void, *mut c_void) -> c_int;
/// `int (*)(pcre2_callout_enumerate_block *, void *)`
pub type CalloutEnumerateFn = unsafe extern "C" fn(*mut c_void, *mut c_void) -> c_int;
/// `int (*)(uint32_t, void *)`
pub type RecursionGuardFn = unsafe extern "C" fn(u32, *mut c_void) -> c_int;
/// `pcre2_jit_stack *(*)(void *)`
pub type JitCallbackFn = unsafe extern "C" fn(*mut c_void) -> *mut c_void;
/// `void *(*)(PCRE2_SIZE, void *)`
pub type PrivateMallocFn = unsafe extern "C" fn(usize, *mut c_void) -> *mut c_void;
/// `void (*)(void *, void *)`
pub type PrivateFreeFn = unsafe extern "C" fn(*mut c_void, *mut c_void);

/// Custom allocator handed to `pcre2_general_context_create`
#[derive(Debug, Clone, Copy)]
pub struct AllocatorHooks {
    pub malloc: Option<PrivateMallocFn>,
    pub free: Option<PrivateFreeFn>,
    pub data: *mut c_void,
}

unsafe impl Send for AllocatorHooks {}

impl AllocatorHooks {
    /// The engine's own allocator
    pub fn system() -> Self {
        Self {
            malloc: None,
            free: None,
            data: std::ptr::null_mut(),
        }
    }
}

/// Reinterpret a host-supplied address as a callback
///
/// # Safety
///
/// `addr` must be the address of a function with signature `F`. The host
/// passes these addresses through unchanged from its own call table.
pub unsafe fn callback_from_addr<F: Copy>(addr: Option<usize>) -> Option<F> {
    debug_assert_eq!(std::mem::size_of::<F>(), std::mem::size_of::<usize>());
    addr.map(|addr| std::mem::transmute_copy::<usize, F>(&addr))
}

#[cfg(test)]
mod tests {
    use super::*;

    unsafe extern "C" fn guard(_depth: u32, _data: *mut c_void) -> c_int {
        7
    }

    #[test]
    fn test_foreign_pointer_rejects_null() {
        assert!(unsafe { CodePtr::from_raw(std::ptr::null_mut()) }.is_none());
    }

    #[test]
    fn test_foreign_pointer_addr() {
        let mut slot = 0u8;
        let ptr = unsafe { MatchDataPtr::from_raw(&mut slot as *mut u8 as *mut c_void) }.unwrap();
        assert_eq!(ptr.addr(), &slot as *const u8 as usize);
    }

    #[test]
    fn test_callback_round_trip() {
        let addr = guard as RecursionGuardFn as usize;
        let callback: RecursionGuardFn = unsafe { callback_from_addr(Some(addr)) }.unwrap();
        assert_eq!(unsafe { callback(1, std::ptr::null_mut()) }, 7);
        assert!(unsafe { callback_from_addr::<RecursionGuardFn>(None) }.is_none());
    }

    #[test]
    fn test_foreign_bytes_slice() {
        let data = b"abc";
        let bytes = unsafe { ForeignBytes::from_raw(data.as_ptr(), 3) }.unwrap();
        assert_eq!(unsafe { bytes.as_slice() }, b"abc");
    }
}
