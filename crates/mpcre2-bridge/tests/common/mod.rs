//! Shared test doubles for the bridge
//!
//! `FakeEngine` stands in for PCRE2. Patterns are literals with optional
//! capture groups `( )` and named groups `(?<name> )`, and may start with
//! `(*MARK:NAME)`. A `[` is a compile error. Every object it hands out is
//! recorded in a ledger that counts creates and frees per kind and panics on
//! a double free.
//!
//! `CountingMemory` stands in for the host allocator.

#![allow(dead_code)]

use mpcre2_bridge::diagnostic::MemorySink;
use mpcre2_bridge::engine::constants::*;
use mpcre2_bridge::engine::{
    AllocatorHooks, CalloutEnumerateFn, CalloutFn, CodePtr, CompileContextPtr, CompileFailure,
    ForeignBytes, GeneralContextPtr, JitCallbackFn, JitStackPtr, MatchContextPtr, MatchDataPtr,
    MatchRequest, RecursionGuardFn, RegexEngine, Status, SubstituteRequest, SubstringListPtr,
};
use mpcre2_bridge::host::{AllocatorError, HostMemory, MemoryError};
use mpcre2_bridge::{Bridge, HostString, ResourceKind};
use std::collections::HashMap;
use std::ffi::{c_int, c_long, c_void, CStr};
use std::ptr::{null, null_mut, NonNull};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// `PCRE2_ERROR_JIT_BADOPTION`
pub const ERROR_JIT_BADOPTION: c_int = -45;
/// `PCRE2_ERROR_BADOFFSET`
pub const ERROR_BADOFFSET: c_int = -33;
/// Compile error for `[`: missing terminating ]
pub const COMPILE_ERROR_BRACKET: c_int = 106;

// ===== Ledger =====

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Lifecycle {
    pub created: usize,
    pub freed: usize,
}

/// One call to a matcher or to substitute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRecord {
    pub matcher: &'static str,
    pub options: u32,
    pub context: Option<usize>,
    pub match_data: Option<usize>,
    pub workspace: usize,
}

#[derive(Debug, Default)]
pub struct Ledger {
    lifecycles: HashMap<ResourceKind, Lifecycle>,
    /// Live address -> byte length (0 for objects)
    live: HashMap<usize, usize>,
    /// Substring lists: list address -> (pointer array, lengths, strings)
    lists: HashMap<usize, (Box<[usize]>, Box<[usize]>, Vec<Box<[u8]>>)>,
    /// Whether each general context got allocator hooks
    pub general_hooks: Vec<bool>,
    /// General context each compile context was created from
    pub compile_parents: Vec<Option<usize>>,
    pub compile_options: Vec<u32>,
    pub match_calls: Vec<MatchRecord>,
    pub jit_options: Vec<u32>,
    /// (callback given, data address)
    pub jit_assignments: Vec<(bool, usize)>,
    pub unused_jit_frees: usize,
}

impl Ledger {
    fn created(&mut self, kind: ResourceKind, addr: usize, len: usize) {
        self.lifecycles.entry(kind).or_default().created += 1;
        self.live.insert(addr, len);
    }

    fn freed(&mut self, kind: ResourceKind, addr: usize) -> usize {
        let len = self
            .live
            .remove(&addr)
            .unwrap_or_else(|| panic!("{} at {:#x} freed twice or never created", kind, addr));
        self.lifecycles.entry(kind).or_default().freed += 1;
        len
    }
}

// ===== Fake engine objects =====

#[derive(Debug, Clone, Copy)]
pub struct FakeGeneralContext {
    pub has_hooks: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeCompileContext {
    pub bsr: u32,
    pub newline: u32,
    pub extra_options: u32,
    pub max_pattern_length: Option<usize>,
    pub parens_nest_limit: u32,
    pub tables: usize,
    pub recursion_guard: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FakeMatchContext {
    pub offset_limit: usize,
    pub heap_limit: u32,
    pub match_limit: u32,
    pub depth_limit: u32,
    pub callout: bool,
}

#[derive(Debug, Clone)]
struct Group {
    name: Option<String>,
    start: usize,
    end: usize,
}

#[derive(Debug, Clone)]
struct FakeCode {
    source: Vec<u8>,
    options: u32,
    literal: Vec<u8>,
    groups: Vec<Group>,
    /// `[len][name][0]`, as PCRE2 stores marks
    mark: Option<Box<[u8]>>,
    name_table: Vec<u8>,
    name_count: u32,
    name_entry_size: u32,
    bitmap: [u8; FIRSTBITMAP_LENGTH],
    jit: bool,
}

#[derive(Debug)]
struct FakeMatchData {
    ovector: Vec<usize>,
    mark: usize,
    subject: Vec<u8>,
    code: usize,
    rc: c_int,
}

#[derive(Debug, Clone, Copy)]
struct FakeJitStack {
    start: usize,
    max: usize,
}

fn parse_pattern(pattern: &[u8], options: u32) -> Result<FakeCode, CompileFailure> {
    let mut rest = pattern;
    let mut mark = None;
    if let Some(after) = rest.strip_prefix(b"(*MARK:") {
        let close = after.iter().position(|b| *b == b')').ok_or(CompileFailure {
            code: 160,
            offset: pattern.len(),
        })?;
        let name = &after[..close];
        let mut stored = vec![name.len() as u8];
        stored.extend_from_slice(name);
        stored.push(0);
        mark = Some(stored.into_boxed_slice());
        rest = &after[close + 1..];
    }
    let base = pattern.len() - rest.len();

    let mut literal = Vec::new();
    let mut groups = Vec::new();
    let mut open: Option<(Option<String>, usize)> = None;
    let mut i = 0;
    while i < rest.len() {
        match rest[i] {
            b'[' => {
                return Err(CompileFailure {
                    code: COMPILE_ERROR_BRACKET,
                    offset: base + i,
                })
            }
            b'(' if open.is_none() => {
                if rest[i + 1..].starts_with(b"?<") {
                    let name_start = i + 3;
                    let name_end = rest[name_start..]
                        .iter()
                        .position(|b| *b == b'>')
                        .ok_or(CompileFailure {
                            code: 142,
                            offset: base + i,
                        })?
                        + name_start;
                    let name = String::from_utf8_lossy(&rest[name_start..name_end]).into_owned();
                    open = Some((Some(name), literal.len()));
                    i = name_end + 1;
                    continue;
                }
                open = Some((None, literal.len()));
            }
            b')' => match open.take() {
                Some((name, start)) => groups.push(Group {
                    name,
                    start,
                    end: literal.len(),
                }),
                None => {
                    return Err(CompileFailure {
                        code: 122,
                        offset: base + i,
                    })
                }
            },
            byte => literal.push(byte),
        }
        i += 1;
    }
    if open.is_some() {
        return Err(CompileFailure {
            code: 114,
            offset: pattern.len(),
        });
    }

    let mut named: Vec<(u16, &str)> = groups
        .iter()
        .enumerate()
        .filter_map(|(i, g)| g.name.as_deref().map(|name| ((i + 1) as u16, name)))
        .collect();
    named.sort_by(|a, b| a.1.cmp(b.1));
    let entry_size = named.iter().map(|(_, name)| name.len() + 3).max().unwrap_or(0);
    let mut name_table = Vec::new();
    for (number, name) in &named {
        let start = name_table.len();
        name_table.extend_from_slice(&number.to_be_bytes());
        name_table.extend_from_slice(name.as_bytes());
        name_table.resize(start + entry_size, 0);
    }
    let name_count = named.len() as u32;

    let mut bitmap = [0u8; FIRSTBITMAP_LENGTH];
    if let Some(first) = literal.first() {
        bitmap[usize::from(*first / 8)] |= 1 << (first % 8);
    }

    Ok(FakeCode {
        source: pattern.to_vec(),
        options,
        literal,
        groups,
        mark,
        name_table,
        name_count,
        name_entry_size: entry_size as u32,
        bitmap,
        jit: false,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

unsafe fn object<'a, T>(ptr: *mut c_void) -> &'a mut T {
    &mut *(ptr as *mut T)
}

// ===== Fake engine =====

/// In-process stand-in for the PCRE2 library
#[derive(Debug, Default)]
pub struct FakeEngine {
    ledger: Mutex<Ledger>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ledger(&self) -> MutexGuard<'_, Ledger> {
        self.ledger.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn lifecycle(&self, kind: ResourceKind) -> Lifecycle {
        self.ledger()
            .lifecycles
            .get(&kind)
            .copied()
            .unwrap_or_default()
    }

    /// Objects and buffers created and not yet freed
    pub fn live_objects(&self) -> usize {
        self.ledger().live.len()
    }

    pub fn compile_context(&self, context: CompileContextPtr) -> FakeCompileContext {
        unsafe { object::<FakeCompileContext>(context.as_ptr()) }.clone()
    }

    pub fn match_context(&self, context: MatchContextPtr) -> FakeMatchContext {
        unsafe { object::<FakeMatchContext>(context.as_ptr()) }.clone()
    }

    pub fn general_context(&self, context: GeneralContextPtr) -> FakeGeneralContext {
        *unsafe { object::<FakeGeneralContext>(context.as_ptr()) }
    }

    fn create<T>(&self, kind: ResourceKind, value: T) -> *mut c_void {
        let ptr = Box::into_raw(Box::new(value)) as *mut c_void;
        self.ledger().created(kind, ptr as usize, 0);
        ptr
    }

    fn destroy<T>(&self, kind: ResourceKind, ptr: *mut c_void) {
        self.ledger().freed(kind, ptr as usize);
        drop(unsafe { Box::from_raw(ptr as *mut T) });
    }

    /// A NUL-terminated engine buffer holding `content`
    fn buffer(&self, kind: ResourceKind, content: &[u8]) -> ForeignBytes {
        let mut storage = content.to_vec();
        storage.push(0);
        let len = storage.len();
        let ptr = Box::into_raw(storage.into_boxed_slice()) as *mut u8;
        self.ledger().created(kind, ptr as usize, len);
        unsafe { ForeignBytes::from_raw(ptr, content.len()) }.unwrap()
    }

    fn free_buffer(&self, kind: ResourceKind, ptr: *mut u8) {
        let len = self.ledger().freed(kind, ptr as usize);
        drop(unsafe { Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr, len)) });
    }

    fn record(&self, matcher: &'static str, request: &MatchRequest<'_>, workspace: usize) {
        self.ledger().match_calls.push(MatchRecord {
            matcher,
            options: request.options,
            context: request.context.map(MatchContextPtr::addr),
            match_data: Some(request.match_data.addr()),
            workspace,
        });
    }

    fn run_match(&self, request: MatchRequest<'_>) -> c_int {
        let code = unsafe { object::<FakeCode>(request.code.as_ptr()) };
        let md = unsafe { object::<FakeMatchData>(request.match_data.as_ptr()) };
        md.ovector.fill(UNSET);
        md.mark = 0;
        md.code = request.code.addr();
        md.subject = request.subject.to_vec();

        md.rc = match request.subject.get(request.start_offset..) {
            None => ERROR_BADOFFSET,
            Some(tail) => match find(tail, &code.literal).map(|p| p + request.start_offset) {
                Some(at) if request.options & ANCHORED == 0 || at == request.start_offset => {
                    md.mark = code.mark.as_ref().map_or(0, |m| m.as_ptr() as usize + 1);
                    let mut spans = vec![(at, at + code.literal.len())];
                    spans.extend(code.groups.iter().map(|g| (at + g.start, at + g.end)));

                    let pairs = md.ovector.len() / 2;
                    for (i, (start, end)) in spans.iter().enumerate().take(pairs) {
                        md.ovector[2 * i] = *start;
                        md.ovector[2 * i + 1] = *end;
                    }
                    if spans.len() > pairs {
                        0
                    } else {
                        spans.len() as c_int
                    }
                }
                _ => ERROR_NOMATCH,
            },
        };
        md.rc
    }

    fn group_number(&self, md: &FakeMatchData, name: &CStr) -> Result<u32, c_int> {
        if md.code == 0 {
            return Err(ERROR_NOSUBSTRING);
        }
        let code = unsafe { object::<FakeCode>(md.code as *mut c_void) };
        let name = name.to_string_lossy();
        code.groups
            .iter()
            .position(|g| g.name.as_deref() == Some(&*name))
            .map(|i| (i + 1) as u32)
            .ok_or(ERROR_NOSUBSTRING)
    }

    fn group_bytes<'a>(&self, md: &'a FakeMatchData, number: u32) -> Result<&'a [u8], c_int> {
        let number = number as usize;
        if number >= md.ovector.len() / 2 {
            return Err(ERROR_UNAVAILABLE);
        }
        let (start, end) = (md.ovector[2 * number], md.ovector[2 * number + 1]);
        if start == UNSET {
            return Err(ERROR_UNSET);
        }
        Ok(&md.subject[start..end])
    }

    fn copy_group(&self, md: MatchDataPtr, number: Result<u32, c_int>, buffer: &mut [u8]) -> Status<usize> {
        let md = unsafe { object::<FakeMatchData>(md.as_ptr()) };
        match number.and_then(|n| self.group_bytes(md, n)) {
            Err(rc) => Status::new(rc, buffer.len()),
            Ok(bytes) if bytes.len() + 1 > buffer.len() => Status::new(ERROR_NOMEMORY, buffer.len()),
            Ok(bytes) => {
                buffer[..bytes.len()].copy_from_slice(bytes);
                buffer[bytes.len()] = 0;
                Status::new(0, bytes.len())
            }
        }
    }

    fn get_group(&self, md: MatchDataPtr, number: Result<u32, c_int>) -> Status<Option<ForeignBytes>> {
        let md = unsafe { object::<FakeMatchData>(md.as_ptr()) };
        match number.and_then(|n| self.group_bytes(md, n)) {
            Err(rc) => Status::new(rc, None),
            Ok(bytes) => {
                let bytes = bytes.to_vec();
                Status::new(0, Some(self.buffer(ResourceKind::Substring, &bytes)))
            }
        }
    }

    fn group_length(&self, md: MatchDataPtr, number: Result<u32, c_int>) -> Status<usize> {
        let md = unsafe { object::<FakeMatchData>(md.as_ptr()) };
        match number.and_then(|n| self.group_bytes(md, n)) {
            Err(rc) => Status::new(rc, 0),
            Ok(bytes) => Status::new(0, bytes.len()),
        }
    }
}

impl RegexEngine for FakeEngine {
    fn general_context_create(&self, hooks: AllocatorHooks) -> Option<GeneralContextPtr> {
        let has_hooks = hooks.malloc.is_some();
        self.ledger().general_hooks.push(has_hooks);
        let ptr = self.create(ResourceKind::GeneralContext, FakeGeneralContext { has_hooks });
        unsafe { GeneralContextPtr::from_raw(ptr) }
    }

    fn general_context_copy(&self, gcontext: GeneralContextPtr) -> Option<GeneralContextPtr> {
        let copy = self.general_context(gcontext);
        let ptr = self.create(ResourceKind::GeneralContext, copy);
        unsafe { GeneralContextPtr::from_raw(ptr) }
    }

    fn general_context_free(&self, gcontext: GeneralContextPtr) {
        self.destroy::<FakeGeneralContext>(ResourceKind::GeneralContext, gcontext.as_ptr())
    }

    fn compile_context_create(&self, gcontext: Option<GeneralContextPtr>) -> Option<CompileContextPtr> {
        self.ledger()
            .compile_parents
            .push(gcontext.map(GeneralContextPtr::addr));
        let ptr = self.create(ResourceKind::CompileContext, FakeCompileContext::default());
        unsafe { CompileContextPtr::from_raw(ptr) }
    }

    fn compile_context_copy(&self, ccontext: CompileContextPtr) -> Option<CompileContextPtr> {
        let copy = self.compile_context(ccontext);
        let ptr = self.create(ResourceKind::CompileContext, copy);
        unsafe { CompileContextPtr::from_raw(ptr) }
    }

    fn compile_context_free(&self, ccontext: CompileContextPtr) {
        self.destroy::<FakeCompileContext>(ResourceKind::CompileContext, ccontext.as_ptr())
    }

    fn set_bsr(&self, ccontext: CompileContextPtr, value: u32) -> c_int {
        if value != BSR_UNICODE && value != BSR_ANYCRLF {
            return ERROR_BADDATA;
        }
        unsafe { object::<FakeCompileContext>(ccontext.as_ptr()) }.bsr = value;
        0
    }

    fn set_character_tables(&self, ccontext: CompileContextPtr, tables: *const u8) -> c_int {
        unsafe { object::<FakeCompileContext>(ccontext.as_ptr()) }.tables = tables as usize;
        0
    }

    fn set_compile_extra_options(&self, ccontext: CompileContextPtr, options: u32) -> c_int {
        unsafe { object::<FakeCompileContext>(ccontext.as_ptr()) }.extra_options = options;
        0
    }

    fn set_max_pattern_length(&self, ccontext: CompileContextPtr, length: usize) -> c_int {
        unsafe { object::<FakeCompileContext>(ccontext.as_ptr()) }.max_pattern_length = Some(length);
        0
    }

    fn set_newline(&self, ccontext: CompileContextPtr, value: u32) -> c_int {
        if !(NEWLINE_CR..=NEWLINE_NUL).contains(&value) {
            return ERROR_BADDATA;
        }
        unsafe { object::<FakeCompileContext>(ccontext.as_ptr()) }.newline = value;
        0
    }

    fn set_parens_nest_limit(&self, ccontext: CompileContextPtr, limit: u32) -> c_int {
        unsafe { object::<FakeCompileContext>(ccontext.as_ptr()) }.parens_nest_limit = limit;
        0
    }

    fn set_compile_recursion_guard(
        &self,
        ccontext: CompileContextPtr,
        guard: Option<RecursionGuardFn>,
        _data: *mut c_void,
    ) -> c_int {
        unsafe { object::<FakeCompileContext>(ccontext.as_ptr()) }.recursion_guard = guard.is_some();
        0
    }

    fn match_context_create(&self, _gcontext: Option<GeneralContextPtr>) -> Option<MatchContextPtr> {
        let ptr = self.create(ResourceKind::MatchContext, FakeMatchContext::default());
        unsafe { MatchContextPtr::from_raw(ptr) }
    }

    fn match_context_copy(&self, mcontext: MatchContextPtr) -> Option<MatchContextPtr> {
        let copy = self.match_context(mcontext);
        let ptr = self.create(ResourceKind::MatchContext, copy);
        unsafe { MatchContextPtr::from_raw(ptr) }
    }

    fn match_context_free(&self, mcontext: MatchContextPtr) {
        self.destroy::<FakeMatchContext>(ResourceKind::MatchContext, mcontext.as_ptr())
    }

    fn set_callout(&self, mcontext: MatchContextPtr, callout: Option<CalloutFn>, _data: *mut c_void) -> c_int {
        unsafe { object::<FakeMatchContext>(mcontext.as_ptr()) }.callout = callout.is_some();
        0
    }

    fn set_offset_limit(&self, mcontext: MatchContextPtr, limit: usize) -> c_int {
        unsafe { object::<FakeMatchContext>(mcontext.as_ptr()) }.offset_limit = limit;
        0
    }

    fn set_heap_limit(&self, mcontext: MatchContextPtr, limit: u32) -> c_int {
        unsafe { object::<FakeMatchContext>(mcontext.as_ptr()) }.heap_limit = limit;
        0
    }

    fn set_match_limit(&self, mcontext: MatchContextPtr, limit: u32) -> c_int {
        unsafe { object::<FakeMatchContext>(mcontext.as_ptr()) }.match_limit = limit;
        0
    }

    fn set_depth_limit(&self, mcontext: MatchContextPtr, limit: u32) -> c_int {
        unsafe { object::<FakeMatchContext>(mcontext.as_ptr()) }.depth_limit = limit;
        0
    }

    fn compile(
        &self,
        pattern: &[u8],
        options: u32,
        ccontext: Option<CompileContextPtr>,
    ) -> Result<CodePtr, CompileFailure> {
        self.ledger().compile_options.push(options);
        if let Some(limit) = ccontext.and_then(|c| self.compile_context(c).max_pattern_length) {
            if pattern.len() > limit {
                return Err(CompileFailure { code: 188, offset: 0 });
            }
        }
        let code = parse_pattern(pattern, options)?;
        let ptr = self.create(ResourceKind::Code, code);
        Ok(unsafe { CodePtr::from_raw(ptr) }.unwrap())
    }

    fn code_free(&self, code: CodePtr) {
        self.destroy::<FakeCode>(ResourceKind::Code, code.as_ptr())
    }

    fn code_copy(&self, code: CodePtr) -> Option<CodePtr> {
        let copy = unsafe { object::<FakeCode>(code.as_ptr()) }.clone();
        let ptr = self.create(ResourceKind::Code, copy);
        unsafe { CodePtr::from_raw(ptr) }
    }

    fn code_copy_with_tables(&self, code: CodePtr) -> Option<CodePtr> {
        self.code_copy(code)
    }

    fn pattern_info(&self, code: CodePtr, what: u32, slot: *mut c_void) -> c_int {
        let code = unsafe { object::<FakeCode>(code.as_ptr()) };
        unsafe {
            match what {
                INFO_ALLOPTIONS => *(slot as *mut u32) = code.options,
                INFO_CAPTURECOUNT => *(slot as *mut u32) = code.groups.len() as u32,
                INFO_NAMECOUNT => *(slot as *mut u32) = code.name_count,
                INFO_NAMEENTRYSIZE => *(slot as *mut u32) = code.name_entry_size,
                INFO_SIZE => *(slot as *mut usize) = 64 + code.source.len(),
                INFO_JITSIZE => *(slot as *mut usize) = if code.jit { 256 } else { 0 },
                INFO_FIRSTBITMAP => {
                    *(slot as *mut *const u8) = if code.literal.is_empty() {
                        null()
                    } else {
                        code.bitmap.as_ptr()
                    }
                }
                INFO_NAMETABLE => {
                    *(slot as *mut *const u8) = if code.name_table.is_empty() {
                        null()
                    } else {
                        code.name_table.as_ptr()
                    }
                }
                _ => return ERROR_BADOPTION,
            }
        }
        0
    }

    fn callout_enumerate(
        &self,
        _code: CodePtr,
        callback: Option<CalloutEnumerateFn>,
        data: *mut c_void,
    ) -> c_int {
        match callback {
            Some(callback) => unsafe { callback(null_mut(), data) },
            None => ERROR_NULL,
        }
    }

    fn match_data_create(&self, pairs: u32, _gcontext: Option<GeneralContextPtr>) -> Option<MatchDataPtr> {
        let pairs = pairs.max(1) as usize;
        let md = FakeMatchData {
            ovector: vec![UNSET; 2 * pairs],
            mark: 0,
            subject: Vec::new(),
            code: 0,
            rc: ERROR_NOMATCH,
        };
        let ptr = self.create(ResourceKind::MatchData, md);
        unsafe { MatchDataPtr::from_raw(ptr) }
    }

    fn match_data_create_from_pattern(
        &self,
        code: CodePtr,
        gcontext: Option<GeneralContextPtr>,
    ) -> Option<MatchDataPtr> {
        let groups = unsafe { object::<FakeCode>(code.as_ptr()) }.groups.len();
        self.match_data_create(groups as u32 + 1, gcontext)
    }

    fn match_data_free(&self, match_data: MatchDataPtr) {
        self.destroy::<FakeMatchData>(ResourceKind::MatchData, match_data.as_ptr())
    }

    fn match_pattern(&self, request: MatchRequest<'_>) -> c_int {
        self.record("match", &request, 0);
        self.run_match(request)
    }

    fn dfa_match(&self, request: MatchRequest<'_>, workspace: &mut [c_int]) -> c_int {
        self.record("dfa", &request, workspace.len());
        self.run_match(request)
    }

    fn get_mark(&self, match_data: MatchDataPtr) -> *const u8 {
        unsafe { object::<FakeMatchData>(match_data.as_ptr()) }.mark as *const u8
    }

    fn get_ovector_count(&self, match_data: MatchDataPtr) -> u32 {
        (unsafe { object::<FakeMatchData>(match_data.as_ptr()) }.ovector.len() / 2) as u32
    }

    fn get_ovector_pointer(&self, match_data: MatchDataPtr) -> *mut usize {
        unsafe { object::<FakeMatchData>(match_data.as_ptr()) }
            .ovector
            .as_mut_ptr()
    }

    fn get_startchar(&self, match_data: MatchDataPtr) -> usize {
        let start = unsafe { object::<FakeMatchData>(match_data.as_ptr()) }.ovector[0];
        if start == UNSET {
            0
        } else {
            start
        }
    }

    fn substring_copy_byname(&self, match_data: MatchDataPtr, name: &CStr, buffer: &mut [u8]) -> Status<usize> {
        let number = self.group_number(unsafe { object::<FakeMatchData>(match_data.as_ptr()) }, name);
        self.copy_group(match_data, number, buffer)
    }

    fn substring_copy_bynumber(&self, match_data: MatchDataPtr, number: u32, buffer: &mut [u8]) -> Status<usize> {
        self.copy_group(match_data, Ok(number), buffer)
    }

    fn substring_get_byname(&self, match_data: MatchDataPtr, name: &CStr) -> Status<Option<ForeignBytes>> {
        let number = self.group_number(unsafe { object::<FakeMatchData>(match_data.as_ptr()) }, name);
        self.get_group(match_data, number)
    }

    fn substring_get_bynumber(&self, match_data: MatchDataPtr, number: u32) -> Status<Option<ForeignBytes>> {
        self.get_group(match_data, Ok(number))
    }

    fn substring_free(&self, buffer: *mut u8) {
        self.free_buffer(ResourceKind::Substring, buffer)
    }

    fn substring_length_byname(&self, match_data: MatchDataPtr, name: &CStr) -> Status<usize> {
        let number = self.group_number(unsafe { object::<FakeMatchData>(match_data.as_ptr()) }, name);
        self.group_length(match_data, number)
    }

    fn substring_length_bynumber(&self, match_data: MatchDataPtr, number: u32) -> Status<usize> {
        self.group_length(match_data, Ok(number))
    }

    fn substring_number_from_name(&self, code: CodePtr, name: &CStr) -> c_int {
        let code = unsafe { object::<FakeCode>(code.as_ptr()) };
        let name = name.to_string_lossy();
        code.groups
            .iter()
            .position(|g| g.name.as_deref() == Some(&*name))
            .map_or(ERROR_NOSUBSTRING, |i| (i + 1) as c_int)
    }

    fn substring_list_get(&self, match_data: MatchDataPtr) -> Status<Option<SubstringListPtr>> {
        let md = unsafe { object::<FakeMatchData>(match_data.as_ptr()) };
        if md.rc < 0 {
            return Status::new(md.rc, None);
        }
        let pairs = md.ovector.len() / 2;
        let count = if md.rc == 0 { pairs } else { md.rc as usize };

        let strings: Vec<Box<[u8]>> = (0..count)
            .map(|n| {
                let mut bytes = self.group_bytes(md, n as u32).unwrap_or(&[]).to_vec();
                bytes.push(0);
                bytes.into_boxed_slice()
            })
            .collect();
        let lengths: Box<[usize]> = strings.iter().map(|s| s.len() - 1).collect();
        let list: Box<[usize]> = strings
            .iter()
            .map(|s| s.as_ptr() as usize)
            .chain(std::iter::once(0))
            .collect();

        let result = SubstringListPtr {
            list: NonNull::new(list.as_ptr() as *mut *mut u8).unwrap(),
            lengths: NonNull::new(lengths.as_ptr() as *mut usize).unwrap(),
        };
        let mut ledger = self.ledger();
        let addr = list.as_ptr() as usize;
        ledger.created(ResourceKind::SubstringList, addr, 0);
        ledger.lists.insert(addr, (list, lengths, strings));
        Status::new(0, Some(result))
    }

    fn substring_list_free(&self, list: *mut *mut u8) {
        let mut ledger = self.ledger();
        ledger.freed(ResourceKind::SubstringList, list as usize);
        ledger.lists.remove(&(list as usize));
    }

    fn substitute(&self, request: SubstituteRequest<'_>, output: &mut [u8]) -> Status<usize> {
        self.ledger().match_calls.push(MatchRecord {
            matcher: "substitute",
            options: request.options,
            context: request.context.map(MatchContextPtr::addr),
            match_data: request.match_data.map(MatchDataPtr::addr),
            workspace: 0,
        });
        let code = unsafe { object::<FakeCode>(request.code.as_ptr()) };
        let subject = request.subject;
        if request.start_offset > subject.len() {
            return Status::new(ERROR_BADOFFSET, UNSET);
        }

        let global = request.options & SUBSTITUTE_GLOBAL != 0;
        let mut result = subject[..request.start_offset].to_vec();
        let mut cursor = request.start_offset;
        let mut count = 0;
        while !code.literal.is_empty() {
            let Some(p) = find(&subject[cursor..], &code.literal) else {
                break;
            };
            let at = cursor + p;
            result.extend_from_slice(&subject[cursor..at]);
            result.extend_from_slice(request.replacement);
            cursor = at + code.literal.len();
            count += 1;
            if !global {
                break;
            }
        }
        result.extend_from_slice(&subject[cursor..]);

        if result.len() + 1 > output.len() {
            let needed = if request.options & SUBSTITUTE_OVERFLOW_LENGTH != 0 {
                result.len() + 1
            } else {
                UNSET
            };
            return Status::new(ERROR_NOMEMORY, needed);
        }
        output[..result.len()].copy_from_slice(&result);
        output[result.len()] = 0;
        Status::new(count, result.len())
    }

    fn jit_compile(&self, code: CodePtr, options: u32) -> c_int {
        self.ledger().jit_options.push(options);
        if options == 0 {
            return ERROR_JIT_BADOPTION;
        }
        unsafe { object::<FakeCode>(code.as_ptr()) }.jit = true;
        0
    }

    fn jit_match(&self, request: MatchRequest<'_>) -> c_int {
        self.record("jit", &request, 0);
        if !unsafe { object::<FakeCode>(request.code.as_ptr()) }.jit {
            return ERROR_JIT_BADOPTION;
        }
        self.run_match(request)
    }

    fn jit_free_unused_memory(&self, _gcontext: Option<GeneralContextPtr>) {
        self.ledger().unused_jit_frees += 1;
    }

    fn jit_stack_create(
        &self,
        start_size: usize,
        max_size: usize,
        _gcontext: Option<GeneralContextPtr>,
    ) -> Option<JitStackPtr> {
        if start_size > max_size {
            return None;
        }
        let ptr = self.create(
            ResourceKind::JitStack,
            FakeJitStack {
                start: start_size,
                max: max_size,
            },
        );
        unsafe { JitStackPtr::from_raw(ptr) }
    }

    fn jit_stack_assign(&self, _mcontext: MatchContextPtr, callback: Option<JitCallbackFn>, data: *mut c_void) {
        self.ledger()
            .jit_assignments
            .push((callback.is_some(), data as usize));
    }

    fn jit_stack_free(&self, stack: JitStackPtr) {
        self.destroy::<FakeJitStack>(ResourceKind::JitStack, stack.as_ptr())
    }

    fn serialize_encode(&self, codes: &[CodePtr], _gcontext: Option<GeneralContextPtr>) -> Status<Option<ForeignBytes>> {
        if codes.is_empty() {
            return Status::new(ERROR_BADDATA, None);
        }
        let mut bytes = vec![codes.len() as u8];
        for code in codes {
            let source = &unsafe { object::<FakeCode>(code.as_ptr()) }.source;
            bytes.extend_from_slice(&(source.len() as u16).to_be_bytes());
            bytes.extend_from_slice(source);
        }
        let buffer = self.buffer(ResourceKind::Serialized, &bytes);
        Status::new(codes.len() as c_int, Some(buffer))
    }

    fn serialize_decode(&self, codes: &mut [*mut c_void], bytes: *const u8, _gcontext: Option<GeneralContextPtr>) -> c_int {
        if bytes.is_null() {
            return ERROR_NULL;
        }
        if codes.is_empty() {
            return ERROR_BADDATA;
        }
        let count = usize::from(unsafe { *bytes }).min(codes.len());
        let mut cursor = unsafe { bytes.add(1) };
        for slot in codes.iter_mut().take(count) {
            let len = unsafe { u16::from_be_bytes([*cursor, *cursor.add(1)]) } as usize;
            let source = unsafe { std::slice::from_raw_parts(cursor.add(2), len) };
            cursor = unsafe { cursor.add(2 + len) };
            match self.compile(source, 0, None) {
                Ok(code) => *slot = code.as_ptr(),
                Err(failure) => return failure.code.min(-1),
            }
        }
        count as c_int
    }

    fn serialize_free(&self, bytes: *mut u8) {
        self.free_buffer(ResourceKind::Serialized, bytes)
    }

    fn serialize_get_number_of_codes(&self, bytes: *const u8) -> c_int {
        if bytes.is_null() {
            return ERROR_NULL;
        }
        c_int::from(unsafe { *bytes })
    }

    fn get_error_message(&self, code: c_int, buffer: &mut [u8]) -> c_int {
        let message: &[u8] = match code {
            COMPILE_SUCCESS => b"no error",
            COMPILE_ERROR_BRACKET => b"missing terminating ] for character class",
            ERROR_NOMATCH => b"no match",
            ERROR_BADDATA => b"bad data value",
            ERROR_BADOPTION => b"bad option value",
            ERROR_NOMEMORY => b"no more memory",
            _ => return ERROR_BADDATA,
        };
        if message.len() + 1 > buffer.len() {
            return ERROR_NOMEMORY;
        }
        buffer[..message.len()].copy_from_slice(message);
        buffer[message.len()] = 0;
        message.len() as c_int
    }

    fn maketables(&self, _gcontext: Option<GeneralContextPtr>) -> *const u8 {
        self.buffer(ResourceKind::Tables, &[0u8; TABLES_LENGTH])
            .ptr
            .as_ptr()
    }
}

// ===== Host memory =====

#[derive(Debug, Default)]
struct Counters {
    allocations: AtomicUsize,
    releases: AtomicUsize,
    sizes: Mutex<HashMap<usize, usize>>,
}

/// Host memory that counts every allocation and release
///
/// Clones share the same counters, so a test can keep one while the bridge
/// owns another.
#[derive(Debug, Clone, Default)]
pub struct CountingMemory {
    counters: Arc<Counters>,
    unavailable: bool,
}

impl CountingMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory that behaves like an unset `GTM_CALLIN_START`
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    pub fn allocations(&self) -> usize {
        self.counters.allocations.load(Ordering::SeqCst)
    }

    pub fn releases(&self) -> usize {
        self.counters.releases.load(Ordering::SeqCst)
    }

    pub fn outstanding(&self) -> usize {
        self.allocations() - self.releases()
    }

    fn missing() -> MemoryError {
        AllocatorError::NotSet {
            variable: "GTM_CALLIN_START".to_string(),
        }
        .into()
    }
}

/// Never called: the fake engine does not allocate through its hooks
unsafe extern "C" fn hook_malloc(_size: usize, _data: *mut c_void) -> *mut c_void {
    null_mut()
}

unsafe extern "C" fn hook_free(_ptr: *mut c_void, _data: *mut c_void) {}

impl HostMemory for CountingMemory {
    fn allocate(&self, size: usize) -> Result<NonNull<u8>, MemoryError> {
        if self.unavailable {
            return Err(Self::missing());
        }
        let ptr = Box::into_raw(vec![0u8; size].into_boxed_slice()) as *mut u8;
        self.counters
            .sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(ptr as usize, size);
        self.counters.allocations.fetch_add(1, Ordering::SeqCst);
        Ok(NonNull::new(ptr).unwrap())
    }

    unsafe fn release(&self, ptr: NonNull<u8>) {
        let size = self
            .counters
            .sizes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&(ptr.as_ptr() as usize))
            .expect("released memory that was not allocated here");
        drop(Box::from_raw(std::ptr::slice_from_raw_parts_mut(ptr.as_ptr(), size)));
        self.counters.releases.fetch_add(1, Ordering::SeqCst);
    }

    fn engine_hooks(&self) -> Result<AllocatorHooks, MemoryError> {
        if self.unavailable {
            return Err(Self::missing());
        }
        Ok(AllocatorHooks {
            malloc: Some(hook_malloc),
            free: Some(hook_free),
            data: null_mut(),
        })
    }
}

// ===== Fixtures =====

/// A bridge over the fake engine, with its memory and diagnostics
pub struct Harness {
    pub bridge: Bridge<FakeEngine>,
    pub memory: CountingMemory,
    pub sink: MemorySink,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_memory(CountingMemory::new())
    }

    pub fn with_memory(memory: CountingMemory) -> Self {
        let sink = MemorySink::new();
        let bridge = Bridge::new(
            FakeEngine::new(),
            Arc::new(memory.clone()),
            Box::new(sink.clone()),
        );
        Self { bridge, memory, sink }
    }

    pub fn engine(&self) -> &FakeEngine {
        self.bridge.engine()
    }

    /// Compile `pattern` with defaults, panicking on failure
    pub fn compile(&mut self, pattern: &str) -> String {
        let outcome = self.bridge.compile(pattern.as_bytes(), "0", "0").unwrap();
        outcome.code.expect("pattern compiles")
    }

    /// Compile, create match data from the pattern and run one match
    pub fn matched(&mut self, pattern: &str, subject: &str) -> (String, String, c_int) {
        let code = self.compile(pattern);
        let match_data = self.bridge.match_data_create_from_pattern(&code, "0").unwrap();
        let rc = self
            .bridge
            .match_pattern(mpcre2_bridge::MatchCall {
                code: &code,
                subject: subject.as_bytes(),
                start_offset: 0,
                options: "0",
                match_data: &match_data,
                context: "0",
            })
            .unwrap();
        (code, match_data, rc)
    }
}

/// A host string over `storage`; the storage length is the capacity
pub fn host_string(storage: &mut [u8]) -> HostString {
    HostString {
        length: storage.len() as c_long,
        address: storage.as_mut_ptr().cast(),
    }
}
