//! The regex engine seen through its C interface
//!
//! The bridge never matches anything itself. It drives a `RegexEngine`, which
//! in production is the PCRE2 8-bit library loaded at runtime (`Pcre2Library`)
//! and in tests is an in-process fake.
//!
//! Methods mirror the `pcre2_*_8` functions one to one. Status codes are
//! returned untouched; the bridge passes them through to the host.

pub mod constants;
pub mod loader;
pub mod pcre2;
pub mod types;

use std::ffi::{c_int, c_void, CStr};

pub use loader::{LibraryLoader, LoadError};
pub use pcre2::Pcre2Library;
pub use types::{
    AllocatorHooks, CalloutEnumerateFn, CalloutFn, CodePtr, CompileContextPtr, ForeignBytes,
    GeneralContextPtr, JitCallbackFn, JitStackPtr, MatchContextPtr, MatchDataPtr, OvectorPtr,
    RecursionGuardFn, SubstringListPtr,
};

/// Arguments shared by `match`, `dfa_match` and `jit_match`
#[derive(Debug, Clone, Copy)]
pub struct MatchRequest<'a> {
    pub code: CodePtr,
    pub subject: &'a [u8],
    pub start_offset: usize,
    pub options: u32,
    pub match_data: MatchDataPtr,
    pub context: Option<MatchContextPtr>,
}

/// Arguments to `substitute`
#[derive(Debug, Clone, Copy)]
pub struct SubstituteRequest<'a> {
    pub code: CodePtr,
    pub subject: &'a [u8],
    pub start_offset: usize,
    pub options: u32,
    /// `None` lets the engine create its own match data
    pub match_data: Option<MatchDataPtr>,
    pub context: Option<MatchContextPtr>,
    pub replacement: &'a [u8],
}

/// Failed compile: engine error code and pattern offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompileFailure {
    pub code: c_int,
    pub offset: usize,
}

/// A status code together with the value the engine wrote alongside it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status<T> {
    pub rc: c_int,
    pub value: T,
}

impl<T> Status<T> {
    pub fn new(rc: c_int, value: T) -> Self {
        Self { rc, value }
    }

    pub fn is_ok(&self) -> bool {
        self.rc >= 0
    }
}

/// The PCRE2 operations the bridge relies on
pub trait RegexEngine {
    // General contexts
    fn general_context_create(&self, hooks: AllocatorHooks) -> Option<GeneralContextPtr>;
    fn general_context_copy(&self, gcontext: GeneralContextPtr) -> Option<GeneralContextPtr>;
    fn general_context_free(&self, gcontext: GeneralContextPtr);

    // Compile contexts
    fn compile_context_create(
        &self,
        gcontext: Option<GeneralContextPtr>,
    ) -> Option<CompileContextPtr>;
    fn compile_context_copy(&self, ccontext: CompileContextPtr) -> Option<CompileContextPtr>;
    fn compile_context_free(&self, ccontext: CompileContextPtr);
    fn set_bsr(&self, ccontext: CompileContextPtr, value: u32) -> c_int;
    fn set_character_tables(&self, ccontext: CompileContextPtr, tables: *const u8) -> c_int;
    fn set_compile_extra_options(&self, ccontext: CompileContextPtr, options: u32) -> c_int;
    fn set_max_pattern_length(&self, ccontext: CompileContextPtr, length: usize) -> c_int;
    fn set_newline(&self, ccontext: CompileContextPtr, value: u32) -> c_int;
    fn set_parens_nest_limit(&self, ccontext: CompileContextPtr, limit: u32) -> c_int;
    fn set_compile_recursion_guard(
        &self,
        ccontext: CompileContextPtr,
        guard: Option<RecursionGuardFn>,
        data: *mut c_void,
    ) -> c_int;

    // Match contexts
    fn match_context_create(&self, gcontext: Option<GeneralContextPtr>)
        -> Option<MatchContextPtr>;
    fn match_context_copy(&self, mcontext: MatchContextPtr) -> Option<MatchContextPtr>;
    fn match_context_free(&self, mcontext: MatchContextPtr);
    fn set_callout(
        &self,
        mcontext: MatchContextPtr,
        callout: Option<CalloutFn>,
        data: *mut c_void,
    ) -> c_int;
    fn set_offset_limit(&self, mcontext: MatchContextPtr, limit: usize) -> c_int;
    fn set_heap_limit(&self, mcontext: MatchContextPtr, limit: u32) -> c_int;
    fn set_match_limit(&self, mcontext: MatchContextPtr, limit: u32) -> c_int;
    fn set_depth_limit(&self, mcontext: MatchContextPtr, limit: u32) -> c_int;

    // Compiled patterns
    fn compile(
        &self,
        pattern: &[u8],
        options: u32,
        ccontext: Option<CompileContextPtr>,
    ) -> Result<CodePtr, CompileFailure>;
    fn code_free(&self, code: CodePtr);
    fn code_copy(&self, code: CodePtr) -> Option<CodePtr>;
    fn code_copy_with_tables(&self, code: CodePtr) -> Option<CodePtr>;
    fn pattern_info(&self, code: CodePtr, what: u32, slot: *mut c_void) -> c_int;
    fn callout_enumerate(
        &self,
        code: CodePtr,
        callback: Option<CalloutEnumerateFn>,
        data: *mut c_void,
    ) -> c_int;

    // Matching
    fn match_data_create(
        &self,
        pairs: u32,
        gcontext: Option<GeneralContextPtr>,
    ) -> Option<MatchDataPtr>;
    fn match_data_create_from_pattern(
        &self,
        code: CodePtr,
        gcontext: Option<GeneralContextPtr>,
    ) -> Option<MatchDataPtr>;
    fn match_data_free(&self, match_data: MatchDataPtr);
    fn match_pattern(&self, request: MatchRequest<'_>) -> c_int;
    fn dfa_match(&self, request: MatchRequest<'_>, workspace: &mut [c_int]) -> c_int;
    fn get_mark(&self, match_data: MatchDataPtr) -> *const u8;
    fn get_ovector_count(&self, match_data: MatchDataPtr) -> u32;
    fn get_ovector_pointer(&self, match_data: MatchDataPtr) -> *mut usize;
    fn get_startchar(&self, match_data: MatchDataPtr) -> usize;

    // Substrings
    fn substring_copy_byname(
        &self,
        match_data: MatchDataPtr,
        name: &CStr,
        buffer: &mut [u8],
    ) -> Status<usize>;
    fn substring_copy_bynumber(
        &self,
        match_data: MatchDataPtr,
        number: u32,
        buffer: &mut [u8],
    ) -> Status<usize>;
    fn substring_get_byname(
        &self,
        match_data: MatchDataPtr,
        name: &CStr,
    ) -> Status<Option<ForeignBytes>>;
    fn substring_get_bynumber(
        &self,
        match_data: MatchDataPtr,
        number: u32,
    ) -> Status<Option<ForeignBytes>>;
    fn substring_free(&self, buffer: *mut u8);
    fn substring_length_byname(&self, match_data: MatchDataPtr, name: &CStr) -> Status<usize>;
    fn substring_length_bynumber(&self, match_data: MatchDataPtr, number: u32) -> Status<usize>;
    fn substring_number_from_name(&self, code: CodePtr, name: &CStr) -> c_int;
    fn substring_list_get(&self, match_data: MatchDataPtr) -> Status<Option<SubstringListPtr>>;
    fn substring_list_free(&self, list: *mut *mut u8);

    // Substitution
    /// `value` is the length the engine reported through `outlengthptr`
    fn substitute(&self, request: SubstituteRequest<'_>, output: &mut [u8]) -> Status<usize>;

    // JIT
    fn jit_compile(&self, code: CodePtr, options: u32) -> c_int;
    fn jit_match(&self, request: MatchRequest<'_>) -> c_int;
    fn jit_free_unused_memory(&self, gcontext: Option<GeneralContextPtr>);
    fn jit_stack_create(
        &self,
        start_size: usize,
        max_size: usize,
        gcontext: Option<GeneralContextPtr>,
    ) -> Option<JitStackPtr>;
    fn jit_stack_assign(
        &self,
        mcontext: MatchContextPtr,
        callback: Option<JitCallbackFn>,
        data: *mut c_void,
    );
    fn jit_stack_free(&self, stack: JitStackPtr);

    // Serialization
    fn serialize_encode(
        &self,
        codes: &[CodePtr],
        gcontext: Option<GeneralContextPtr>,
    ) -> Status<Option<ForeignBytes>>;
    /// Writes up to `codes.len()` decoded patterns into `codes`
    fn serialize_decode(
        &self,
        codes: &mut [*mut c_void],
        bytes: *const u8,
        gcontext: Option<GeneralContextPtr>,
    ) -> c_int;
    fn serialize_free(&self, bytes: *mut u8);
    fn serialize_get_number_of_codes(&self, bytes: *const u8) -> c_int;

    // Miscellaneous
    fn get_error_message(&self, code: c_int, buffer: &mut [u8]) -> c_int;
    fn maketables(&self, gcontext: Option<GeneralContextPtr>) -> *const u8;
}
