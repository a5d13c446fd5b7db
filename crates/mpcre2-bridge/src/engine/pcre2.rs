//! `RegexEngine` backed by the PCRE2 shared library
//!
//! All `pcre2_*_8` symbols are resolved once when the library is opened, so a
//! library missing any entry point is rejected up front instead of failing
//! halfway through a host call.

use super::loader::{LibraryLoader, LoadError};
use super::types::*;
use super::{CompileFailure, MatchRequest, RegexEngine, Status, SubstituteRequest};
use libloading::Library;
use std::ffi::{c_int, c_void, CStr};
use std::ptr::{null_mut, NonNull};

type Sptr = *const u8;
type Opaque = *mut c_void;

macro_rules! pcre2_api {
    ($($field:ident: $symbol:literal => $ty:ty;)*) => {
        /// Resolved `pcre2_*_8` entry points
        #[derive(Clone, Copy)]
        struct Api {
            $($field: $ty,)*
        }

        impl Api {
            /// # Safety
            ///
            /// Every symbol must have the signature declared for it here.
            unsafe fn resolve(library: &Library, label: &str) -> Result<Self, LoadError> {
                Ok(Self {
                    $($field: *library
                        .get::<$ty>(concat!($symbol, "\0").as_bytes())
                        .map_err(|_| LoadError::SymbolNotFound {
                            library: label.to_string(),
                            symbol: $symbol.to_string(),
                        })?,)*
                })
            }
        }
    };
}

pcre2_api! {
    general_context_create: "pcre2_general_context_create_8"
        => unsafe extern "C" fn(Option<PrivateMallocFn>, Option<PrivateFreeFn>, Opaque) -> Opaque;
    general_context_copy: "pcre2_general_context_copy_8" => unsafe extern "C" fn(Opaque) -> Opaque;
    general_context_free: "pcre2_general_context_free_8" => unsafe extern "C" fn(Opaque);

    compile_context_create: "pcre2_compile_context_create_8" => unsafe extern "C" fn(Opaque) -> Opaque;
    compile_context_copy: "pcre2_compile_context_copy_8" => unsafe extern "C" fn(Opaque) -> Opaque;
    compile_context_free: "pcre2_compile_context_free_8" => unsafe extern "C" fn(Opaque);
    set_bsr: "pcre2_set_bsr_8" => unsafe extern "C" fn(Opaque, u32) -> c_int;
    set_character_tables: "pcre2_set_character_tables_8" => unsafe extern "C" fn(Opaque, Sptr) -> c_int;
    set_compile_extra_options: "pcre2_set_compile_extra_options_8"
        => unsafe extern "C" fn(Opaque, u32) -> c_int;
    set_max_pattern_length: "pcre2_set_max_pattern_length_8"
        => unsafe extern "C" fn(Opaque, usize) -> c_int;
    set_newline: "pcre2_set_newline_8" => unsafe extern "C" fn(Opaque, u32) -> c_int;
    set_parens_nest_limit: "pcre2_set_parens_nest_limit_8"
        => unsafe extern "C" fn(Opaque, u32) -> c_int;
    set_compile_recursion_guard: "pcre2_set_compile_recursion_guard_8"
        => unsafe extern "C" fn(Opaque, Option<RecursionGuardFn>, Opaque) -> c_int;

    match_context_create: "pcre2_match_context_create_8" => unsafe extern "C" fn(Opaque) -> Opaque;
    match_context_copy: "pcre2_match_context_copy_8" => unsafe extern "C" fn(Opaque) -> Opaque;
    match_context_free: "pcre2_match_context_free_8" => unsafe extern "C" fn(Opaque);
    set_callout: "pcre2_set_callout_8"
        => unsafe extern "C" fn(Opaque, Option<CalloutFn>, Opaque) -> c_int;
    set_offset_limit: "pcre2_set_offset_limit_8" => unsafe extern "C" fn(Opaque, usize) -> c_int;
    set_heap_limit: "pcre2_set_heap_limit_8" => unsafe extern "C" fn(Opaque, u32) -> c_int;
    set_match_limit: "pcre2_set_match_limit_8" => unsafe extern "C" fn(Opaque, u32) -> c_int;
    set_depth_limit: "pcre2_set_depth_limit_8" => unsafe extern "C" fn(Opaque, u32) -> c_int;

    compile: "pcre2_compile_8"
        => unsafe extern "C" fn(Sptr, usize, u32, *mut c_int, *mut usize, Opaque) -> Opaque;
    code_free: "pcre2_code_free_8" => unsafe extern "C" fn(Opaque);
    code_copy: "pcre2_code_copy_8" => unsafe extern "C" fn(Opaque) -> Opaque;
    code_copy_with_tables: "pcre2_code_copy_with_tables_8" => unsafe extern "C" fn(Opaque) -> Opaque;
    pattern_info: "pcre2_pattern_info_8" => unsafe extern "C" fn(Opaque, u32, Opaque) -> c_int;
    callout_enumerate: "pcre2_callout_enumerate_8"
        => unsafe extern "C" fn(Opaque, Option<CalloutEnumerateFn>, Opaque) -> c_int;

    match_data_create: "pcre2_match_data_create_8" => unsafe extern "C" fn(u32, Opaque) -> Opaque;
    match_data_create_from_pattern: "pcre2_match_data_create_from_pattern_8"
        => unsafe extern "C" fn(Opaque, Opaque) -> Opaque;
    match_data_free: "pcre2_match_data_free_8" => unsafe extern "C" fn(Opaque);
    match_pattern: "pcre2_match_8"
        => unsafe extern "C" fn(Opaque, Sptr, usize, usize, u32, Opaque, Opaque) -> c_int;
    dfa_match: "pcre2_dfa_match_8"
        => unsafe extern "C" fn(Opaque, Sptr, usize, usize, u32, Opaque, Opaque, *mut c_int, usize) -> c_int;
    get_mark: "pcre2_get_mark_8" => unsafe extern "C" fn(Opaque) -> Sptr;
    get_ovector_count: "pcre2_get_ovector_count_8" => unsafe extern "C" fn(Opaque) -> u32;
    get_ovector_pointer: "pcre2_get_ovector_pointer_8" => unsafe extern "C" fn(Opaque) -> *mut usize;
    get_startchar: "pcre2_get_startchar_8" => unsafe extern "C" fn(Opaque) -> usize;

    substring_copy_byname: "pcre2_substring_copy_byname_8"
        => unsafe extern "C" fn(Opaque, Sptr, *mut u8, *mut usize) -> c_int;
    substring_copy_bynumber: "pcre2_substring_copy_bynumber_8"
        => unsafe extern "C" fn(Opaque, u32, *mut u8, *mut usize) -> c_int;
    substring_get_byname: "pcre2_substring_get_byname_8"
        => unsafe extern "C" fn(Opaque, Sptr, *mut *mut u8, *mut usize) -> c_int;
    substring_get_bynumber: "pcre2_substring_get_bynumber_8"
        => unsafe extern "C" fn(Opaque, u32, *mut *mut u8, *mut usize) -> c_int;
    substring_free: "pcre2_substring_free_8" => unsafe extern "C" fn(*mut u8);
    substring_length_byname: "pcre2_substring_length_byname_8"
        => unsafe extern "C" fn(Opaque, Sptr, *mut usize) -> c_int;
    substring_length_bynumber: "pcre2_substring_length_bynumber_8"
        => unsafe extern "C" fn(Opaque, u32, *mut usize) -> c_int;
    substring_number_from_name: "pcre2_substring_number_from_name_8"
        => unsafe extern "C" fn(Opaque, Sptr) -> c_int;
    substring_list_get: "pcre2_substring_list_get_8"
        => unsafe extern "C" fn(Opaque, *mut *mut *mut u8, *mut *mut usize) -> c_int;
    substring_list_free: "pcre2_substring_list_free_8" => unsafe extern "C" fn(*mut *mut u8);

    substitute: "pcre2_substitute_8"
        => unsafe extern "C" fn(Opaque, Sptr, usize, usize, u32, Opaque, Opaque, Sptr, usize, *mut u8, *mut usize) -> c_int;

    jit_compile: "pcre2_jit_compile_8" => unsafe extern "C" fn(Opaque, u32) -> c_int;
    jit_match: "pcre2_jit_match_8"
        => unsafe extern "C" fn(Opaque, Sptr, usize, usize, u32, Opaque, Opaque) -> c_int;
    jit_free_unused_memory: "pcre2_jit_free_unused_memory_8" => unsafe extern "C" fn(Opaque);
    jit_stack_create: "pcre2_jit_stack_create_8" => unsafe extern "C" fn(usize, usize, Opaque) -> Opaque;
    jit_stack_assign: "pcre2_jit_stack_assign_8"
        => unsafe extern "C" fn(Opaque, Option<JitCallbackFn>, Opaque);
    jit_stack_free: "pcre2_jit_stack_free_8" => unsafe extern "C" fn(Opaque);

    serialize_encode: "pcre2_serialize_encode_8"
        => unsafe extern "C" fn(*const Opaque, i32, *mut *mut u8, *mut usize, Opaque) -> i32;
    serialize_decode: "pcre2_serialize_decode_8"
        => unsafe extern "C" fn(*mut Opaque, i32, *const u8, Opaque) -> i32;
    serialize_free: "pcre2_serialize_free_8" => unsafe extern "C" fn(*mut u8);
    serialize_get_number_of_codes: "pcre2_serialize_get_number_of_codes_8"
        => unsafe extern "C" fn(*const u8) -> i32;

    get_error_message: "pcre2_get_error_message_8" => unsafe extern "C" fn(c_int, *mut u8, usize) -> c_int;
    maketables: "pcre2_maketables_8" => unsafe extern "C" fn(Opaque) -> Sptr;
}

/// The PCRE2 8-bit library opened at runtime
pub struct Pcre2Library {
    api: Api,
    label: String,
    // Keeps every pointer in `api` valid
    _library: Library,
}

// Safety: `Api` holds plain function pointers into `_library`, which is Send.
unsafe impl Send for Pcre2Library {}

impl Pcre2Library {
    /// Find, open and resolve the library
    pub fn load(loader: &LibraryLoader) -> Result<Self, LoadError> {
        let (library, label) = loader.load()?;
        Self::from_library(library, label)
    }

    /// Resolve every entry point from an already opened library
    pub fn from_library(library: Library, label: String) -> Result<Self, LoadError> {
        // Safety: signatures follow pcre2.h for the 8-bit code unit width
        let api = unsafe { Api::resolve(&library, &label)? };
        Ok(Self {
            api,
            label,
            _library: library,
        })
    }

    /// Where the library was loaded from
    pub fn label(&self) -> &str {
        &self.label
    }
}

fn gc(gcontext: Option<GeneralContextPtr>) -> Opaque {
    gcontext.map_or(null_mut(), GeneralContextPtr::as_ptr)
}

fn mc(mcontext: Option<MatchContextPtr>) -> Opaque {
    mcontext.map_or(null_mut(), MatchContextPtr::as_ptr)
}

// Safety for every method below: pointer arguments come from the handle
// table, which only stores values the engine returned and drops them once
// freed. Slices carry their own lengths.
impl RegexEngine for Pcre2Library {
    fn general_context_create(&self, hooks: AllocatorHooks) -> Option<GeneralContextPtr> {
        unsafe {
            GeneralContextPtr::from_raw((self.api.general_context_create)(
                hooks.malloc,
                hooks.free,
                hooks.data,
            ))
        }
    }

    fn general_context_copy(&self, gcontext: GeneralContextPtr) -> Option<GeneralContextPtr> {
        unsafe { GeneralContextPtr::from_raw((self.api.general_context_copy)(gcontext.as_ptr())) }
    }

    fn general_context_free(&self, gcontext: GeneralContextPtr) {
        unsafe { (self.api.general_context_free)(gcontext.as_ptr()) }
    }

    fn compile_context_create(
        &self,
        gcontext: Option<GeneralContextPtr>,
    ) -> Option<CompileContextPtr> {
        unsafe { CompileContextPtr::from_raw((self.api.compile_context_create)(gc(gcontext))) }
    }

    fn compile_context_copy(&self, ccontext: CompileContextPtr) -> Option<CompileContextPtr> {
        unsafe { CompileContextPtr::from_raw((self.api.compile_context_copy)(ccontext.as_ptr())) }
    }

    fn compile_context_free(&self, ccontext: CompileContextPtr) {
        unsafe { (self.api.compile_context_free)(ccontext.as_ptr()) }
    }

    fn set_bsr(&self, ccontext: CompileContextPtr, value: u32) -> c_int {
        unsafe { (self.api.set_bsr)(ccontext.as_ptr(), value) }
    }

    fn set_character_tables(&self, ccontext: CompileContextPtr, tables: *const u8) -> c_int {
        unsafe { (self.api.set_character_tables)(ccontext.as_ptr(), tables) }
    }

    fn set_compile_extra_options(&self, ccontext: CompileContextPtr, options: u32) -> c_int {
        unsafe { (self.api.set_compile_extra_options)(ccontext.as_ptr(), options) }
    }

    fn set_max_pattern_length(&self, ccontext: CompileContextPtr, length: usize) -> c_int {
        unsafe { (self.api.set_max_pattern_length)(ccontext.as_ptr(), length) }
    }

    fn set_newline(&self, ccontext: CompileContextPtr, value: u32) -> c_int {
        unsafe { (self.api.set_newline)(ccontext.as_ptr(), value) }
    }

    fn set_parens_nest_limit(&self, ccontext: CompileContextPtr, limit: u32) -> c_int {
        unsafe { (self.api.set_parens_nest_limit)(ccontext.as_ptr(), limit) }
    }

    fn set_compile_recursion_guard(
        &self,
        ccontext: CompileContextPtr,
        guard: Option<RecursionGuardFn>,
        data: *mut c_void,
    ) -> c_int {
        unsafe { (self.api.set_compile_recursion_guard)(ccontext.as_ptr(), guard, data) }
    }

    fn match_context_create(
        &self,
        gcontext: Option<GeneralContextPtr>,
    ) -> Option<MatchContextPtr> {
        unsafe { MatchContextPtr::from_raw((self.api.match_context_create)(gc(gcontext))) }
    }

    fn match_context_copy(&self, mcontext: MatchContextPtr) -> Option<MatchContextPtr> {
        unsafe { MatchContextPtr::from_raw((self.api.match_context_copy)(mcontext.as_ptr())) }
    }

    fn match_context_free(&self, mcontext: MatchContextPtr) {
        unsafe { (self.api.match_context_free)(mcontext.as_ptr()) }
    }

    fn set_callout(
        &self,
        mcontext: MatchContextPtr,
        callout: Option<CalloutFn>,
        data: *mut c_void,
    ) -> c_int {
        unsafe { (self.api.set_callout)(mcontext.as_ptr(), callout, data) }
    }

    fn set_offset_limit(&self, mcontext: MatchContextPtr, limit: usize) -> c_int {
        unsafe { (self.api.set_offset_limit)(mcontext.as_ptr(), limit) }
    }

    fn set_heap_limit(&self, mcontext: MatchContextPtr, limit: u32) -> c_int {
        unsafe { (self.api.set_heap_limit)(mcontext.as_ptr(), limit) }
    }

    fn set_match_limit(&self, mcontext: MatchContextPtr, limit: u32) -> c_int {
        unsafe { (self.api.set_match_limit)(mcontext.as_ptr(), limit) }
    }

    fn set_depth_limit(&self, mcontext: MatchContextPtr, limit: u32) -> c_int {
        unsafe { (self.api.set_depth_limit)(mcontext.as_ptr(), limit) }
    }

    fn compile(
        &self,
        pattern: &[u8],
        options: u32,
        ccontext: Option<CompileContextPtr>,
    ) -> Result<CodePtr, CompileFailure> {
        let mut code: c_int = 0;
        let mut offset: usize = 0;
        let raw = unsafe {
            (self.api.compile)(
                pattern.as_ptr(),
                pattern.len(),
                options,
                &mut code,
                &mut offset,
                ccontext.map_or(null_mut(), CompileContextPtr::as_ptr),
            )
        };
        unsafe { CodePtr::from_raw(raw) }.ok_or(CompileFailure { code, offset })
    }

    fn code_free(&self, code: CodePtr) {
        unsafe { (self.api.code_free)(code.as_ptr()) }
    }

    fn code_copy(&self, code: CodePtr) -> Option<CodePtr> {
        unsafe { CodePtr::from_raw((self.api.code_copy)(code.as_ptr())) }
    }

    fn code_copy_with_tables(&self, code: CodePtr) -> Option<CodePtr> {
        unsafe { CodePtr::from_raw((self.api.code_copy_with_tables)(code.as_ptr())) }
    }

    fn pattern_info(&self, code: CodePtr, what: u32, slot: *mut c_void) -> c_int {
        unsafe { (self.api.pattern_info)(code.as_ptr(), what, slot) }
    }

    fn callout_enumerate(
        &self,
        code: CodePtr,
        callback: Option<CalloutEnumerateFn>,
        data: *mut c_void,
    ) -> c_int {
        unsafe { (self.api.callout_enumerate)(code.as_ptr(), callback, data) }
    }

    fn match_data_create(
        &self,
        pairs: u32,
        gcontext: Option<GeneralContextPtr>,
    ) -> Option<MatchDataPtr> {
        unsafe { MatchDataPtr::from_raw((self.api.match_data_create)(pairs, gc(gcontext))) }
    }

    fn match_data_create_from_pattern(
        &self,
        code: CodePtr,
        gcontext: Option<GeneralContextPtr>,
    ) -> Option<MatchDataPtr> {
        unsafe {
            MatchDataPtr::from_raw((self.api.match_data_create_from_pattern)(
                code.as_ptr(),
                gc(gcontext),
            ))
        }
    }

    fn match_data_free(&self, match_data: MatchDataPtr) {
        unsafe { (self.api.match_data_free)(match_data.as_ptr()) }
    }

    fn match_pattern(&self, request: MatchRequest<'_>) -> c_int {
        unsafe {
            (self.api.match_pattern)(
                request.code.as_ptr(),
                request.subject.as_ptr(),
                request.subject.len(),
                request.start_offset,
                request.options,
                request.match_data.as_ptr(),
                mc(request.context),
            )
        }
    }

    fn dfa_match(&self, request: MatchRequest<'_>, workspace: &mut [c_int]) -> c_int {
        unsafe {
            (self.api.dfa_match)(
                request.code.as_ptr(),
                request.subject.as_ptr(),
                request.subject.len(),
                request.start_offset,
                request.options,
                request.match_data.as_ptr(),
                mc(request.context),
                workspace.as_mut_ptr(),
                workspace.len(),
            )
        }
    }

    fn get_mark(&self, match_data: MatchDataPtr) -> *const u8 {
        unsafe { (self.api.get_mark)(match_data.as_ptr()) }
    }

    fn get_ovector_count(&self, match_data: MatchDataPtr) -> u32 {
        unsafe { (self.api.get_ovector_count)(match_data.as_ptr()) }
    }

    fn get_ovector_pointer(&self, match_data: MatchDataPtr) -> *mut usize {
        unsafe { (self.api.get_ovector_pointer)(match_data.as_ptr()) }
    }

    fn get_startchar(&self, match_data: MatchDataPtr) -> usize {
        unsafe { (self.api.get_startchar)(match_data.as_ptr()) }
    }

    fn substring_copy_byname(
        &self,
        match_data: MatchDataPtr,
        name: &CStr,
        buffer: &mut [u8],
    ) -> Status<usize> {
        let mut length = buffer.len();
        let rc = unsafe {
            (self.api.substring_copy_byname)(
                match_data.as_ptr(),
                name.as_ptr().cast(),
                buffer.as_mut_ptr(),
                &mut length,
            )
        };
        Status::new(rc, length)
    }

    fn substring_copy_bynumber(
        &self,
        match_data: MatchDataPtr,
        number: u32,
        buffer: &mut [u8],
    ) -> Status<usize> {
        let mut length = buffer.len();
        let rc = unsafe {
            (self.api.substring_copy_bynumber)(
                match_data.as_ptr(),
                number,
                buffer.as_mut_ptr(),
                &mut length,
            )
        };
        Status::new(rc, length)
    }

    fn substring_get_byname(
        &self,
        match_data: MatchDataPtr,
        name: &CStr,
    ) -> Status<Option<ForeignBytes>> {
        let mut buffer: *mut u8 = null_mut();
        let mut length = 0usize;
        let rc = unsafe {
            (self.api.substring_get_byname)(
                match_data.as_ptr(),
                name.as_ptr().cast(),
                &mut buffer,
                &mut length,
            )
        };
        Status::new(rc, unsafe { ForeignBytes::from_raw(buffer, length) })
    }

    fn substring_get_bynumber(
        &self,
        match_data: MatchDataPtr,
        number: u32,
    ) -> Status<Option<ForeignBytes>> {
        let mut buffer: *mut u8 = null_mut();
        let mut length = 0usize;
        let rc = unsafe {
            (self.api.substring_get_bynumber)(
                match_data.as_ptr(),
                number,
                &mut buffer,
                &mut length,
            )
        };
        Status::new(rc, unsafe { ForeignBytes::from_raw(buffer, length) })
    }

    fn substring_free(&self, buffer: *mut u8) {
        unsafe { (self.api.substring_free)(buffer) }
    }

    fn substring_length_byname(&self, match_data: MatchDataPtr, name: &CStr) -> Status<usize> {
        let mut length = 0usize;
        let rc = unsafe {
            (self.api.substring_length_byname)(
                match_data.as_ptr(),
                name.as_ptr().cast(),
                &mut length,
            )
        };
        Status::new(rc, length)
    }

    fn substring_length_bynumber(&self, match_data: MatchDataPtr, number: u32) -> Status<usize> {
        let mut length = 0usize;
        let rc = unsafe {
            (self.api.substring_length_bynumber)(match_data.as_ptr(), number, &mut length)
        };
        Status::new(rc, length)
    }

    fn substring_number_from_name(&self, code: CodePtr, name: &CStr) -> c_int {
        unsafe { (self.api.substring_number_from_name)(code.as_ptr(), name.as_ptr().cast()) }
    }

    fn substring_list_get(&self, match_data: MatchDataPtr) -> Status<Option<SubstringListPtr>> {
        let mut list: *mut *mut u8 = null_mut();
        let mut lengths: *mut usize = null_mut();
        let rc = unsafe {
            (self.api.substring_list_get)(match_data.as_ptr(), &mut list, &mut lengths)
        };
        let value = match (NonNull::new(list), NonNull::new(lengths)) {
            (Some(list), Some(lengths)) if rc >= 0 => Some(SubstringListPtr { list, lengths }),
            _ => None,
        };
        Status::new(rc, value)
    }

    fn substring_list_free(&self, list: *mut *mut u8) {
        unsafe { (self.api.substring_list_free)(list) }
    }

    fn substitute(&self, request: SubstituteRequest<'_>, output: &mut [u8]) -> Status<usize> {
        let mut length = output.len();
        let rc = unsafe {
            (self.api.substitute)(
                request.code.as_ptr(),
                request.subject.as_ptr(),
                request.subject.len(),
                request.start_offset,
                request.options,
                request.match_data.map_or(null_mut(), MatchDataPtr::as_ptr),
                mc(request.context),
                request.replacement.as_ptr(),
                request.replacement.len(),
                output.as_mut_ptr(),
                &mut length,
            )
        };
        Status::new(rc, length)
    }

    fn jit_compile(&self, code: CodePtr, options: u32) -> c_int {
        unsafe { (self.api.jit_compile)(code.as_ptr(), options) }
    }

    fn jit_match(&self, request: MatchRequest<'_>) -> c_int {
        unsafe {
            (self.api.jit_match)(
                request.code.as_ptr(),
                request.subject.as_ptr(),
                request.subject.len(),
                request.start_offset,
                request.options,
                request.match_data.as_ptr(),
                mc(request.context),
            )
        }
    }

    fn jit_free_unused_memory(&self, gcontext: Option<GeneralContextPtr>) {
        unsafe { (self.api.jit_free_unused_memory)(gc(gcontext)) }
    }

    fn jit_stack_create(
        &self,
        start_size: usize,
        max_size: usize,
        gcontext: Option<GeneralContextPtr>,
    ) -> Option<JitStackPtr> {
        unsafe {
            JitStackPtr::from_raw((self.api.jit_stack_create)(
                start_size,
                max_size,
                gc(gcontext),
            ))
        }
    }

    fn jit_stack_assign(
        &self,
        mcontext: MatchContextPtr,
        callback: Option<JitCallbackFn>,
        data: *mut c_void,
    ) {
        unsafe { (self.api.jit_stack_assign)(mcontext.as_ptr(), callback, data) }
    }

    fn jit_stack_free(&self, stack: JitStackPtr) {
        unsafe { (self.api.jit_stack_free)(stack.as_ptr()) }
    }

    fn serialize_encode(
        &self,
        codes: &[CodePtr],
        gcontext: Option<GeneralContextPtr>,
    ) -> Status<Option<ForeignBytes>> {
        let raw: Vec<Opaque> = codes.iter().map(|code| code.as_ptr()).collect();
        let count = i32::try_from(raw.len()).unwrap_or(i32::MAX);
        let mut bytes: *mut u8 = null_mut();
        let mut size = 0usize;
        let rc = unsafe {
            (self.api.serialize_encode)(raw.as_ptr(), count, &mut bytes, &mut size, gc(gcontext))
        };
        Status::new(rc, unsafe { ForeignBytes::from_raw(bytes, size) })
    }

    fn serialize_decode(
        &self,
        codes: &mut [*mut c_void],
        bytes: *const u8,
        gcontext: Option<GeneralContextPtr>,
    ) -> c_int {
        let count = i32::try_from(codes.len()).unwrap_or(i32::MAX);
        unsafe { (self.api.serialize_decode)(codes.as_mut_ptr(), count, bytes, gc(gcontext)) }
    }

    fn serialize_free(&self, bytes: *mut u8) {
        unsafe { (self.api.serialize_free)(bytes) }
    }

    fn serialize_get_number_of_codes(&self, bytes: *const u8) -> c_int {
        unsafe { (self.api.serialize_get_number_of_codes)(bytes) }
    }

    fn get_error_message(&self, code: c_int, buffer: &mut [u8]) -> c_int {
        unsafe { (self.api.get_error_message)(code, buffer.as_mut_ptr(), buffer.len()) }
    }

    fn maketables(&self, gcontext: Option<GeneralContextPtr>) -> *const u8 {
        unsafe { (self.api.maketables)(gc(gcontext)) }
    }
}
