//! Reading engine-owned match results
//!
//! Everything here reads memory the engine wrote: ovector pairs, substring
//! lists and mark names. Each read is bounded by a length the engine itself
//! reported, never by a terminator alone.

use crate::engine::{ForeignBytes, OvectorPtr, RegexEngine, SubstringListPtr};
use std::ptr::NonNull;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ExtractError {
    #[error("index {index} is out of range; {len} entries are available")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("{requested} bytes requested from a buffer of {available}")]
    LengthOutOfRange { requested: usize, available: usize },
}

/// A mark name inside the compiled pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkSpan {
    pub ptr: Option<NonNull<u8>>,
    pub len: usize,
}

impl MarkSpan {
    pub const EMPTY: MarkSpan = MarkSpan { ptr: None, len: 0 };

    /// # Safety
    ///
    /// The pattern the mark points into must still be alive.
    pub unsafe fn as_bytes<'a>(&self) -> &'a [u8] {
        match self.ptr {
            Some(ptr) => std::slice::from_raw_parts(ptr.as_ptr(), self.len),
            None => &[],
        }
    }
}

/// Read a mark returned by `get_mark`
///
/// The engine stores the mark length in the code unit before the name. The
/// name may contain binary zeros, so the terminator is not used.
///
/// # Safety
///
/// `mark` must be null or a pointer returned by `pcre2_get_mark`.
pub unsafe fn read_mark(mark: *const u8) -> MarkSpan {
    match NonNull::new(mark as *mut u8) {
        None => MarkSpan::EMPTY,
        Some(ptr) => MarkSpan {
            ptr: Some(ptr),
            len: usize::from(*mark.sub(1)),
        },
    }
}

/// Start and end offsets of capture pair `index`
pub fn ovector_pair<E: RegexEngine + ?Sized>(
    engine: &E,
    ovector: OvectorPtr,
    index: usize,
) -> Result<(usize, usize), ExtractError> {
    let len = engine.get_ovector_count(ovector.match_data) as usize;
    if index >= len {
        return Err(ExtractError::IndexOutOfRange { index, len });
    }
    // Safety: the ovector holds `len` pairs while its match data is alive
    unsafe {
        let pair = ovector.pairs.as_ptr().add(index * 2);
        Ok((*pair, *pair.add(1)))
    }
}

/// Number of entries before the NULL terminator
///
/// # Safety
///
/// `list` must come from `pcre2_substring_list_get` and not have been freed.
pub unsafe fn substring_count(list: SubstringListPtr) -> usize {
    let mut count = 0;
    while !(*list.list.as_ptr().add(count)).is_null() {
        count += 1;
    }
    count
}

/// Entry `index` of a substring list
///
/// # Safety
///
/// As for [`substring_count`]; `list.lengths` must be the lengths array
/// returned with the same list.
pub unsafe fn substring_entry(
    list: SubstringListPtr,
    index: usize,
) -> Result<ForeignBytes, ExtractError> {
    let len = substring_count(list);
    if index >= len {
        return Err(ExtractError::IndexOutOfRange { index, len });
    }
    let ptr = *list.list.as_ptr().add(index);
    let length = *list.lengths.as_ptr().add(index);
    ForeignBytes::from_raw(ptr, length).ok_or(ExtractError::IndexOutOfRange { index, len })
}

/// The first `len` bytes of a buffer whose length the bridge recorded
pub fn buffer_prefix(bytes: ForeignBytes, len: usize) -> Result<ForeignBytes, ExtractError> {
    if len > bytes.len {
        return Err(ExtractError::LengthOutOfRange {
            requested: len,
            available: bytes.len,
        });
    }
    Ok(ForeignBytes { ptr: bytes.ptr, len })
}
