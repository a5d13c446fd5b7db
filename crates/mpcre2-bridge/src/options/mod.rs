//! Symbolic option strings
//!
//! The host spells option bitmasks the way C code does, as engine macro names
//! joined with `|`:
//!
//! ```text
//! PCRE2_CASELESS|PCRE2_MULTILINE
//! ```
//!
//! `"0"` means no options. The working copy of the input lives in host memory
//! for the duration of the parse and is released on every exit path.

pub mod tables;

use crate::engine::constants::{
    INFO_FIRSTBITMAP, INFO_FRAMESIZE, INFO_JITSIZE, INFO_NAMETABLE, INFO_SIZE,
};
use crate::host::{HostMemory, MemoryError};
use std::ptr::NonNull;
use thiserror::Error;

pub use tables::{BSR, COMPILE, EXTRA_COMPILE, INFO, JIT, MATCH, NEWLINE};

/// Input meaning "no options"
pub const NO_OPTIONS: &str = "0";

/// Token separator
pub const SEPARATOR: u8 = b'|';

/// One option family: names to bit values
#[derive(Debug)]
pub struct OptionTable {
    /// Family name used in diagnostics
    pub tag: &'static str,
    pub entries: &'static [(&'static str, u32)],
}

impl OptionTable {
    pub fn lookup(&self, name: &[u8]) -> Option<u32> {
        self.entries
            .iter()
            .find(|(candidate, _)| candidate.as_bytes() == name)
            .map(|(_, value)| *value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OptionError {
    #[error("Unknown {tag} option {token}")]
    UnknownOption { tag: &'static str, token: String },

    #[error(transparent)]
    Memory(#[from] MemoryError),
}

/// Parse `input` against `table`
///
/// Duplicate names are harmless and order does not matter. Empty tokens
/// (`"A||B"`, a trailing `|`) are skipped. The first unknown name fails the
/// whole parse; no partial mask is ever returned.
pub fn parse(table: &OptionTable, input: &str, memory: &dyn HostMemory) -> Result<u32, OptionError> {
    if input == NO_OPTIONS {
        return Ok(0);
    }

    let scratch = ScratchBuffer::copy_of(input.as_bytes(), memory)?;
    let mut mask = 0u32;
    for token in scratch.bytes().split(|b| *b == SEPARATOR) {
        if token.is_empty() {
            continue;
        }
        match table.lookup(token) {
            Some(value) => mask |= value,
            None => {
                return Err(OptionError::UnknownOption {
                    tag: table.tag,
                    token: String::from_utf8_lossy(token).into_owned(),
                })
            }
        }
    }
    Ok(mask)
}

/// A NUL-terminated copy of a host string in host memory
struct ScratchBuffer<'m> {
    ptr: NonNull<u8>,
    len: usize,
    memory: &'m dyn HostMemory,
}

impl<'m> ScratchBuffer<'m> {
    fn copy_of(bytes: &[u8], memory: &'m dyn HostMemory) -> Result<Self, MemoryError> {
        let ptr = memory.allocate(bytes.len() + 1)?;
        // Safety: the allocation holds len + 1 bytes and cannot overlap `bytes`
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), ptr.as_ptr(), bytes.len());
            *ptr.as_ptr().add(bytes.len()) = 0;
        }
        Ok(Self {
            ptr,
            len: bytes.len(),
            memory,
        })
    }

    fn bytes(&self) -> &[u8] {
        // Safety: initialized in `copy_of`, alive until drop
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for ScratchBuffer<'_> {
    fn drop(&mut self) {
        // Safety: allocated from `memory` in `copy_of` and released only here
        unsafe { self.memory.release(self.ptr) }
    }
}

/// How `pattern_info` writes its answer for a selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoValue {
    /// `uint32_t`
    U32,
    /// `size_t`
    Size,
    /// Pointer into the compiled pattern
    Bytes,
}

impl InfoValue {
    pub fn of(what: u32) -> Self {
        match what {
            INFO_FIRSTBITMAP | INFO_NAMETABLE => InfoValue::Bytes,
            INFO_FRAMESIZE | INFO_JITSIZE | INFO_SIZE => InfoValue::Size,
            _ => InfoValue::U32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::constants::{CASELESS, INFO_CAPTURECOUNT, MULTILINE, NEWLINE_CRLF, UTF};
    use crate::engine::types::AllocatorHooks;
    use rstest::rstest;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Heap-backed memory that counts live allocations
    #[derive(Default)]
    struct Tracked {
        allocations: AtomicUsize,
        live: AtomicUsize,
    }

    impl HostMemory for Tracked {
        fn allocate(&self, size: usize) -> Result<NonNull<u8>, MemoryError> {
            self.allocations.fetch_add(1, Ordering::SeqCst);
            self.live.fetch_add(1, Ordering::SeqCst);
            let boxed = vec![0u8; size].into_boxed_slice();
            // Leaked on purpose; only the counters matter here
            Ok(NonNull::new(Box::leak(boxed).as_mut_ptr()).unwrap())
        }

        unsafe fn release(&self, _ptr: NonNull<u8>) {
            self.live.fetch_sub(1, Ordering::SeqCst);
        }

        fn engine_hooks(&self) -> Result<AllocatorHooks, MemoryError> {
            Ok(AllocatorHooks::system())
        }
    }

    #[test]
    fn test_zero_needs_no_memory() {
        let memory = Tracked::default();
        assert_eq!(parse(&COMPILE, "0", &memory).unwrap(), 0);
        assert_eq!(memory.allocations.load(Ordering::SeqCst), 0);
    }

    #[rstest]
    #[case("PCRE2_CASELESS", CASELESS)]
    #[case("PCRE2_CASELESS|PCRE2_UTF", CASELESS | UTF)]
    #[case("PCRE2_UTF|PCRE2_CASELESS|PCRE2_UTF", CASELESS | UTF)]
    #[case("|PCRE2_MULTILINE||PCRE2_CASELESS|", CASELESS | MULTILINE)]
    #[case("", 0)]
    fn test_compile_masks(#[case] input: &str, #[case] expected: u32) {
        let memory = Tracked::default();
        assert_eq!(parse(&COMPILE, input, &memory).unwrap(), expected);
        assert_eq!(memory.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_unknown_token_releases_scratch() {
        let memory = Tracked::default();

        let err = parse(&COMPILE, "PCRE2_CASELESS|BOGUS|PCRE2_UTF", &memory).unwrap_err();

        assert_eq!(err.to_string(), "Unknown compile option BOGUS");
        assert_eq!(memory.allocations.load(Ordering::SeqCst), 1);
        assert_eq!(memory.live.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_names_are_case_sensitive() {
        let memory = Tracked::default();
        assert!(parse(&NEWLINE, "pcre2_newline_crlf", &memory).is_err());
        assert_eq!(parse(&NEWLINE, "PCRE2_NEWLINE_CRLF", &memory).unwrap(), NEWLINE_CRLF);
    }

    #[test]
    fn test_info_tag_in_message() {
        let memory = Tracked::default();
        let err = parse(&INFO, "PCRE2_INFO_NOPE", &memory).unwrap_err();
        assert_eq!(err.to_string(), "Unknown info option PCRE2_INFO_NOPE");
    }

    #[rstest]
    #[case(INFO_CAPTURECOUNT, InfoValue::U32)]
    #[case(INFO_SIZE, InfoValue::Size)]
    #[case(INFO_JITSIZE, InfoValue::Size)]
    #[case(INFO_NAMETABLE, InfoValue::Bytes)]
    #[case(INFO_FIRSTBITMAP, InfoValue::Bytes)]
    fn test_info_value_kinds(#[case] what: u32, #[case] expected: InfoValue) {
        assert_eq!(InfoValue::of(what), expected);
    }
}
