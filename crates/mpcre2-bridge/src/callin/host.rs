//! Arguments and results in the host's representation
//!
//! The host passes integers as `long`, handles and option lists as
//! NUL-terminated strings, and binary data as length-prefixed strings. Results
//! that the host reads after the call returns (tokens, string views) live in
//! per-thread slots and stay valid until the next call of the same shape on
//! that thread.

use crate::engine::ForeignBytes;
use crate::error::{BridgeError, BridgeResult};
use crate::extract::MarkSpan;
use std::borrow::Cow;
use std::cell::RefCell;
use std::ffi::{c_char, c_long, CStr, CString};
use std::ptr::null_mut;

/// The host's length-prefixed string (`gtm_string_t`)
///
/// As an input the length is the number of bytes at `address`. As an
/// output buffer the length is the capacity on entry and is overwritten with
/// the number of bytes written.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct HostString {
    pub length: c_long,
    pub address: *mut c_char,
}

impl HostString {
    pub const EMPTY: HostString = HostString {
        length: 0,
        address: null_mut(),
    };

    /// A view of engine-owned bytes; nothing is copied
    pub fn over(bytes: ForeignBytes) -> Self {
        Self {
            length: to_long(bytes.len),
            address: bytes.ptr.as_ptr().cast(),
        }
    }
}

impl From<MarkSpan> for HostString {
    fn from(mark: MarkSpan) -> Self {
        match mark.ptr {
            Some(ptr) => Self {
                length: to_long(mark.len),
                address: ptr.as_ptr().cast(),
            },
            None => Self::EMPTY,
        }
    }
}

thread_local! {
    static TOKEN: RefCell<CString> = RefCell::new(CString::default());
    static STRING: RefCell<HostString> = const { RefCell::new(HostString::EMPTY) };
}

/// Hand a token back to the host
pub fn return_token(token: String) -> *const c_char {
    let token = CString::new(token).unwrap_or_default();
    TOKEN.with(|slot| {
        let mut slot = slot.borrow_mut();
        *slot = token;
        slot.as_ptr()
    })
}

/// Hand a string view back to the host
pub fn return_string(value: HostString) -> *mut HostString {
    STRING.with(|slot| {
        *slot.borrow_mut() = value;
        slot.as_ptr()
    })
}

/// Saturating conversion for lengths reported to the host
pub fn to_long(value: usize) -> c_long {
    c_long::try_from(value).unwrap_or(c_long::MAX)
}

/// A host integer that must fit `T`
pub fn narrow<T: TryFrom<c_long>>(name: &'static str, value: c_long) -> BridgeResult<T> {
    T::try_from(value)
        .map_err(|_| BridgeError::invalid_argument(name, format!("{} is out of range", value)))
}

/// A NUL-terminated argument
///
/// # Safety
///
/// `ptr` must be null or point to a NUL-terminated string.
pub unsafe fn c_str<'a>(name: &'static str, ptr: *const c_char) -> BridgeResult<&'a CStr> {
    if ptr.is_null() {
        return Err(BridgeError::invalid_argument(name, "null string"));
    }
    Ok(CStr::from_ptr(ptr))
}

/// A NUL-terminated argument as text (tokens, option lists)
///
/// # Safety
///
/// See [`c_str`].
pub unsafe fn text<'a>(name: &'static str, ptr: *const c_char) -> BridgeResult<Cow<'a, str>> {
    Ok(c_str(name, ptr)?.to_string_lossy())
}

/// The bytes of a host string argument
///
/// # Safety
///
/// `string` must be null or point to a host string whose address is valid
/// for `length` bytes.
pub unsafe fn bytes<'a>(name: &'static str, string: *const HostString) -> BridgeResult<&'a [u8]> {
    let string = string
        .as_ref()
        .ok_or_else(|| BridgeError::invalid_argument(name, "null host string"))?;
    let len: usize = narrow(name, string.length)?;
    if len == 0 {
        return Ok(&[]);
    }
    if string.address.is_null() {
        return Err(BridgeError::invalid_argument(
            name,
            format!("null address with length {}", len),
        ));
    }
    Ok(std::slice::from_raw_parts(string.address.cast::<u8>(), len))
}

/// The writable storage of a host string; its length is the capacity
///
/// # Safety
///
/// As for [`bytes`], and the storage must be writable.
pub unsafe fn buffer<'a>(
    name: &'static str,
    string: *mut HostString,
) -> BridgeResult<&'a mut [u8]> {
    let string = string
        .as_ref()
        .ok_or_else(|| BridgeError::invalid_argument(name, "null host string"))?;
    let len: usize = narrow(name, string.length)?;
    if len == 0 {
        return Ok(&mut []);
    }
    if string.address.is_null() {
        return Err(BridgeError::invalid_argument(
            name,
            format!("null address with capacity {}", len),
        ));
    }
    Ok(std::slice::from_raw_parts_mut(string.address.cast::<u8>(), len))
}

/// Report how many bytes of a host buffer are valid
///
/// # Safety
///
/// `string` must be null or point to a writable host string.
pub unsafe fn set_length(string: *mut HostString, len: usize) {
    if let Some(string) = string.as_mut() {
        string.length = to_long(len);
    }
}

/// Copy `text` into a host buffer and set its length
///
/// # Safety
///
/// See [`buffer`].
pub unsafe fn write_text(name: &'static str, string: *mut HostString, text: &str) -> BridgeResult<()> {
    let storage = buffer(name, string)?;
    let text = text.as_bytes();
    if text.len() > storage.len() {
        return Err(BridgeError::HostBufferTooSmall {
            needed: text.len(),
            available: storage.len(),
        });
    }
    storage[..text.len()].copy_from_slice(text);
    set_length(string, text.len());
    Ok(())
}

/// Write through an output pointer; null pointers are skipped
///
/// # Safety
///
/// `out` must be null or valid for writes.
pub unsafe fn store<T>(out: *mut T, value: T) {
    if let Some(slot) = out.as_mut() {
        *slot = value;
    }
}
