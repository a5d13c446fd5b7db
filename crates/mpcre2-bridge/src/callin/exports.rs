//! `extern "C"` entry points, one per host-visible operation
//!
//! # Safety
//!
//! Every export trusts the host for its pointer arguments: strings are
//! NUL-terminated, host strings are valid for their length, and output
//! pointers are writable or null. The leading `count` argument is the host's
//! argument count and is ignored.

#![allow(clippy::missing_safety_doc)]

use super::host::{self, HostString};
use super::{bridge, dispatch, failure, null_token, option_failure, FAILURE};
use crate::bridge::{Bridge, CompileOutcome, MatchCall, CODE_LIST_SEPARATOR};
use crate::engine::constants::{ERROR_BADDATA, ERROR_BADOPTION, UNSET};
use crate::engine::Pcre2Library;
use crate::error::{BridgeError, BridgeResult};
use crate::handle::codec;
use std::ffi::{c_char, c_int, c_long, c_ulong};

type Process = Bridge<Pcre2Library>;

fn run<T>(
    operation: &str,
    fallback: impl FnOnce(&BridgeError) -> T,
    body: impl FnOnce(&mut Process) -> BridgeResult<T>,
) -> T {
    dispatch(bridge(), operation, fallback, body)
}

fn widen(rc: c_int) -> c_long {
    c_long::from(rc)
}

/// Ovector offsets as the host sees them; unset groups are -1
fn offset(value: usize) -> c_long {
    if value == UNSET {
        FAILURE
    } else {
        host::to_long(value)
    }
}

/// One handle in, one handle out
unsafe fn token_call(
    operation: &str,
    name: &'static str,
    arg: *const c_char,
    op: impl FnOnce(&mut Process, &str) -> BridgeResult<String>,
) -> *const c_char {
    host::return_token(run(operation, null_token, |bridge| {
        let arg = host::text(name, arg)?;
        op(bridge, &arg)
    }))
}

/// One handle in, nothing out
unsafe fn void_call(
    operation: &str,
    name: &'static str,
    arg: *const c_char,
    op: impl FnOnce(&mut Process, &str) -> BridgeResult<()>,
) {
    run(operation, |_| (), |bridge| {
        let arg = host::text(name, arg)?;
        op(bridge, &arg)
    })
}

/// A context handle and an option list, status out
unsafe fn option_call(
    operation: &str,
    rejected: c_long,
    context: *const c_char,
    value: *const c_char,
    op: impl FnOnce(&mut Process, &str, &str) -> BridgeResult<c_int>,
) -> c_long {
    run(operation, option_failure(rejected), |bridge| {
        let context = host::text("ccontext", context)?;
        let value = host::text("value", value)?;
        op(bridge, &context, &value).map(widen)
    })
}

/// A context handle and a numeric limit, status out
unsafe fn limit_call<T: TryFrom<c_long>>(
    operation: &str,
    name: &'static str,
    context: *const c_char,
    value: c_long,
    op: impl FnOnce(&mut Process, &str, T) -> BridgeResult<c_int>,
) -> c_long {
    run(operation, failure, |bridge| {
        let context = host::text(name, context)?;
        op(bridge, &context, host::narrow("value", value)?).map(widen)
    })
}

/// A handle, a function address and user data, status out
unsafe fn callback_call(
    operation: &str,
    name: &'static str,
    target: *const c_char,
    function: *const c_char,
    data: *const c_char,
    op: impl FnOnce(&mut Process, &str, &str, &str) -> BridgeResult<c_int>,
) -> c_long {
    run(operation, failure, |bridge| {
        let target = host::text(name, target)?;
        let function = host::text("function", function)?;
        let data = host::text("data", data)?;
        op(bridge, &target, &function, &data).map(widen)
    })
}

/// Arguments shared by the matchers and substitute, as the host passed them
#[derive(Clone, Copy)]
struct MatchArgs {
    code: *const c_char,
    subject: *const HostString,
    start_offset: c_long,
    options: *const c_char,
    match_data: *const c_char,
    context: *const c_char,
}

impl MatchArgs {
    unsafe fn decode<T>(self, body: impl FnOnce(MatchCall<'_>) -> BridgeResult<T>) -> BridgeResult<T> {
        let code = host::text("code", self.code)?;
        let options = host::text("options", self.options)?;
        let match_data = host::text("match_data", self.match_data)?;
        let context = host::text("mcontext", self.context)?;
        body(MatchCall {
            code: &code,
            subject: host::bytes("subject", self.subject)?,
            start_offset: host::narrow("startoffset", self.start_offset)?,
            options: &options,
            match_data: &match_data,
            context: &context,
        })
    }
}

// Helpers

#[no_mangle]
pub unsafe extern "C" fn mpcre2_get_general_context(_count: c_int) -> *const c_char {
    host::return_token(run(
        "mpcre2_get_general_context",
        null_token,
        Bridge::get_general_context,
    ))
}

/// Start and end of one ovector pair; both are -1 when unset or refused
#[no_mangle]
pub unsafe extern "C" fn mpcre2_get_ov_pair(
    _count: c_int,
    ovector: *const c_char,
    index: c_long,
    start: *mut c_long,
    end: *mut c_long,
) {
    let (first, last) = run("mpcre2_get_ov_pair", |_| (UNSET, UNSET), |bridge| {
        let ovector = host::text("ovector", ovector)?;
        bridge.get_ov_pair(&ovector, host::narrow("index", index)?)
    });
    host::store(start, offset(first));
    host::store(end, offset(last));
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_get_mstring_from_buf(
    _count: c_int,
    buffer: *const c_char,
    len: c_long,
) -> *mut HostString {
    host::return_string(run(
        "mpcre2_get_mstring_from_buf",
        |_| HostString::EMPTY,
        |bridge| {
            let buffer = host::text("buffer", buffer)?;
            let bytes = bridge.get_mstring_from_buf(&buffer, host::narrow("len", len)?)?;
            Ok(HostString::over(bytes))
        },
    ))
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_get_substring_list_count(
    _count: c_int,
    list: *const c_char,
) -> c_long {
    run("mpcre2_get_substring_list_count", failure, |bridge| {
        let list = host::text("list", list)?;
        bridge.get_substring_list_count(&list).map(host::to_long)
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_get_mstring_from_substring_list(
    _count: c_int,
    list: *const c_char,
    lengths: *const c_char,
    index: c_long,
) -> *mut HostString {
    host::return_string(run(
        "mpcre2_get_mstring_from_substring_list",
        |_| HostString::EMPTY,
        |bridge| {
            let list = host::text("list", list)?;
            let lengths = host::text("lengths", lengths)?;
            let entry =
                bridge.get_mstring_from_substring_list(&list, &lengths, host::narrow("index", index)?)?;
            Ok(HostString::over(entry))
        },
    ))
}

// Compile and match

/// Compile `pattern`; the engine's error code and offset are always written
#[no_mangle]
pub unsafe extern "C" fn mpcre2_compile(
    _count: c_int,
    pattern: *const HostString,
    options: *const c_char,
    errorcode: *mut c_long,
    erroroffset: *mut c_ulong,
    ccontext: *const c_char,
) -> *const c_char {
    let refused = |error: &BridgeError| CompileOutcome {
        code: None,
        error_code: match error {
            BridgeError::Option(_) => ERROR_BADOPTION,
            _ => FAILURE as c_int,
        },
        error_offset: 0,
    };
    let outcome = run("mpcre2_compile", refused, |bridge| {
        let pattern = host::bytes("pattern", pattern)?;
        let options = host::text("options", options)?;
        let ccontext = host::text("ccontext", ccontext)?;
        bridge.compile(pattern, &options, &ccontext)
    });

    host::store(errorcode, widen(outcome.error_code));
    host::store(
        erroroffset,
        c_ulong::try_from(outcome.error_offset).unwrap_or(c_ulong::MAX),
    );
    host::return_token(
        outcome
            .code
            .unwrap_or_else(|| codec::NULL_TOKEN.to_string()),
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_code_free(_count: c_int, code: *const c_char) {
    void_call("mpcre2_code_free", "code", code, Bridge::code_free)
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_code_copy(_count: c_int, code: *const c_char) -> *const c_char {
    token_call("mpcre2_code_copy", "code", code, Bridge::code_copy)
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_code_copy_with_tables(
    _count: c_int,
    code: *const c_char,
) -> *const c_char {
    token_call(
        "mpcre2_code_copy_with_tables",
        "code",
        code,
        Bridge::code_copy_with_tables,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_match_data_create(
    _count: c_int,
    pairs: c_long,
    gcontext: *const c_char,
) -> *const c_char {
    host::return_token(run("mpcre2_match_data_create", null_token, |bridge| {
        let gcontext = host::text("gcontext", gcontext)?;
        bridge.match_data_create(host::narrow("ovecsize", pairs)?, &gcontext)
    }))
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_match_data_create_from_pattern(
    _count: c_int,
    code: *const c_char,
    gcontext: *const c_char,
) -> *const c_char {
    host::return_token(run(
        "mpcre2_match_data_create_from_pattern",
        null_token,
        |bridge| {
            let code = host::text("code", code)?;
            let gcontext = host::text("gcontext", gcontext)?;
            bridge.match_data_create_from_pattern(&code, &gcontext)
        },
    ))
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_match_data_free(_count: c_int, match_data: *const c_char) {
    void_call(
        "mpcre2_match_data_free",
        "match_data",
        match_data,
        Bridge::match_data_free,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_match(
    _count: c_int,
    code: *const c_char,
    subject: *const HostString,
    start_offset: c_long,
    options: *const c_char,
    match_data: *const c_char,
    mcontext: *const c_char,
) -> c_long {
    let args = MatchArgs {
        code,
        subject,
        start_offset,
        options,
        match_data,
        context: mcontext,
    };
    run("mpcre2_match", failure, |bridge| {
        args.decode(|call| bridge.match_pattern(call)).map(widen)
    })
}

/// `workspace` ints are allocated for this call only
#[no_mangle]
pub unsafe extern "C" fn mpcre2_dfa_match(
    _count: c_int,
    code: *const c_char,
    subject: *const HostString,
    start_offset: c_long,
    options: *const c_char,
    match_data: *const c_char,
    mcontext: *const c_char,
    workspace: c_long,
) -> c_long {
    let args = MatchArgs {
        code,
        subject,
        start_offset,
        options,
        match_data,
        context: mcontext,
    };
    run("mpcre2_dfa_match", failure, |bridge| {
        let workspace = host::narrow("wscount", workspace)?;
        args.decode(|call| bridge.dfa_match(call, workspace))
            .map(widen)
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_get_mark(_count: c_int, match_data: *const c_char) -> *mut HostString {
    host::return_string(run("mpcre2_get_mark", |_| HostString::EMPTY, |bridge| {
        let match_data = host::text("match_data", match_data)?;
        Ok(HostString::from(bridge.get_mark(&match_data)?))
    }))
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_get_ovector_count(_count: c_int, match_data: *const c_char) -> c_long {
    run("mpcre2_get_ovector_count", failure, |bridge| {
        let match_data = host::text("match_data", match_data)?;
        bridge.get_ovector_count(&match_data).map(c_long::from)
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_get_ovector_pointer(
    _count: c_int,
    match_data: *const c_char,
) -> *const c_char {
    token_call(
        "mpcre2_get_ovector_pointer",
        "match_data",
        match_data,
        Bridge::get_ovector_pointer,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_get_startchar(_count: c_int, match_data: *const c_char) -> c_long {
    run("mpcre2_get_startchar", failure, |bridge| {
        let match_data = host::text("match_data", match_data)?;
        bridge.get_startchar(&match_data).map(host::to_long)
    })
}

// General contexts

#[no_mangle]
pub unsafe extern "C" fn mpcre2_general_context_create(
    _count: c_int,
    malloc: *const c_char,
    free: *const c_char,
    data: *const c_char,
) -> *const c_char {
    host::return_token(run("mpcre2_general_context_create", null_token, |bridge| {
        let malloc = host::text("malloc", malloc)?;
        let free = host::text("free", free)?;
        let data = host::text("data", data)?;
        bridge.general_context_create(&malloc, &free, &data)
    }))
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_general_context_copy(
    _count: c_int,
    gcontext: *const c_char,
) -> *const c_char {
    token_call(
        "mpcre2_general_context_copy",
        "gcontext",
        gcontext,
        Bridge::general_context_copy,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_general_context_free(_count: c_int, gcontext: *const c_char) {
    void_call(
        "mpcre2_general_context_free",
        "gcontext",
        gcontext,
        Bridge::general_context_free,
    )
}

// Compile contexts

#[no_mangle]
pub unsafe extern "C" fn mpcre2_compile_context_create(
    _count: c_int,
    gcontext: *const c_char,
) -> *const c_char {
    token_call(
        "mpcre2_compile_context_create",
        "gcontext",
        gcontext,
        Bridge::compile_context_create,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_compile_context_copy(
    _count: c_int,
    ccontext: *const c_char,
) -> *const c_char {
    token_call(
        "mpcre2_compile_context_copy",
        "ccontext",
        ccontext,
        Bridge::compile_context_copy,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_compile_context_free(_count: c_int, ccontext: *const c_char) {
    void_call(
        "mpcre2_compile_context_free",
        "ccontext",
        ccontext,
        Bridge::compile_context_free,
    )
}

/// Unknown names return `PCRE2_ERROR_BADDATA`
#[no_mangle]
pub unsafe extern "C" fn mpcre2_set_bsr(
    _count: c_int,
    ccontext: *const c_char,
    value: *const c_char,
) -> c_long {
    option_call(
        "mpcre2_set_bsr",
        widen(ERROR_BADDATA),
        ccontext,
        value,
        Bridge::set_bsr,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_set_character_tables(
    _count: c_int,
    ccontext: *const c_char,
    tables: *const c_char,
) -> c_long {
    run("mpcre2_set_character_tables", failure, |bridge| {
        let ccontext = host::text("ccontext", ccontext)?;
        let tables = host::text("tables", tables)?;
        bridge.set_character_tables(&ccontext, &tables).map(widen)
    })
}

/// Unknown names return 0
#[no_mangle]
pub unsafe extern "C" fn mpcre2_set_compile_extra_options(
    _count: c_int,
    ccontext: *const c_char,
    extra: *const c_char,
) -> c_long {
    option_call(
        "mpcre2_set_compile_extra_options",
        0,
        ccontext,
        extra,
        Bridge::set_compile_extra_options,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_set_max_pattern_length(
    _count: c_int,
    ccontext: *const c_char,
    value: c_long,
) -> c_long {
    limit_call(
        "mpcre2_set_max_pattern_length",
        "ccontext",
        ccontext,
        value,
        Bridge::set_max_pattern_length,
    )
}

/// Unknown names return `PCRE2_ERROR_BADDATA`
#[no_mangle]
pub unsafe extern "C" fn mpcre2_set_newline(
    _count: c_int,
    ccontext: *const c_char,
    value: *const c_char,
) -> c_long {
    option_call(
        "mpcre2_set_newline",
        widen(ERROR_BADDATA),
        ccontext,
        value,
        Bridge::set_newline,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_set_parens_nest_limit(
    _count: c_int,
    ccontext: *const c_char,
    value: c_long,
) -> c_long {
    limit_call(
        "mpcre2_set_parens_nest_limit",
        "ccontext",
        ccontext,
        value,
        Bridge::set_parens_nest_limit,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_set_compile_recursion_guard(
    _count: c_int,
    ccontext: *const c_char,
    guard: *const c_char,
    data: *const c_char,
) -> c_long {
    callback_call(
        "mpcre2_set_compile_recursion_guard",
        "ccontext",
        ccontext,
        guard,
        data,
        Bridge::set_compile_recursion_guard,
    )
}

// Match contexts

#[no_mangle]
pub unsafe extern "C" fn mpcre2_match_context_create(
    _count: c_int,
    gcontext: *const c_char,
) -> *const c_char {
    token_call(
        "mpcre2_match_context_create",
        "gcontext",
        gcontext,
        Bridge::match_context_create,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_match_context_copy(
    _count: c_int,
    mcontext: *const c_char,
) -> *const c_char {
    token_call(
        "mpcre2_match_context_copy",
        "mcontext",
        mcontext,
        Bridge::match_context_copy,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_match_context_free(_count: c_int, mcontext: *const c_char) {
    void_call(
        "mpcre2_match_context_free",
        "mcontext",
        mcontext,
        Bridge::match_context_free,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_set_callout(
    _count: c_int,
    mcontext: *const c_char,
    callout: *const c_char,
    data: *const c_char,
) -> c_long {
    callback_call(
        "mpcre2_set_callout",
        "mcontext",
        mcontext,
        callout,
        data,
        Bridge::set_callout,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_set_offset_limit(
    _count: c_int,
    mcontext: *const c_char,
    value: c_long,
) -> c_long {
    limit_call(
        "mpcre2_set_offset_limit",
        "mcontext",
        mcontext,
        value,
        Bridge::set_offset_limit,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_set_heap_limit(
    _count: c_int,
    mcontext: *const c_char,
    value: c_long,
) -> c_long {
    limit_call(
        "mpcre2_set_heap_limit",
        "mcontext",
        mcontext,
        value,
        Bridge::set_heap_limit,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_set_match_limit(
    _count: c_int,
    mcontext: *const c_char,
    value: c_long,
) -> c_long {
    limit_call(
        "mpcre2_set_match_limit",
        "mcontext",
        mcontext,
        value,
        Bridge::set_match_limit,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_set_depth_limit(
    _count: c_int,
    mcontext: *const c_char,
    value: c_long,
) -> c_long {
    limit_call(
        "mpcre2_set_depth_limit",
        "mcontext",
        mcontext,
        value,
        Bridge::set_depth_limit,
    )
}

// Substrings

/// Copy a named group into `buffer`, whose length is updated
#[no_mangle]
pub unsafe extern "C" fn mpcre2_substring_copy_byname(
    _count: c_int,
    match_data: *const c_char,
    name: *const c_char,
    buffer: *mut HostString,
) -> c_long {
    run("mpcre2_substring_copy_byname", failure, |bridge| {
        let match_data = host::text("match_data", match_data)?;
        let name = host::c_str("name", name)?;
        let storage = host::buffer("buffer", buffer)?;
        let status = bridge.substring_copy_byname(&match_data, name, storage)?;
        host::set_length(buffer, status.value);
        Ok(widen(status.rc))
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_substring_copy_bynumber(
    _count: c_int,
    match_data: *const c_char,
    number: c_long,
    buffer: *mut HostString,
) -> c_long {
    run("mpcre2_substring_copy_bynumber", failure, |bridge| {
        let match_data = host::text("match_data", match_data)?;
        let number = host::narrow("number", number)?;
        let storage = host::buffer("buffer", buffer)?;
        let status = bridge.substring_copy_bynumber(&match_data, number, storage)?;
        host::set_length(buffer, status.value);
        Ok(widen(status.rc))
    })
}

/// Hand a new substring token to the host, freeing it if it does not fit
unsafe fn publish_substring(
    bridge: &mut Process,
    (token, len): (String, usize),
    out: *mut HostString,
    out_len: *mut c_long,
) -> BridgeResult<()> {
    if let Err(error) = host::write_text("bufferptr", out, &token) {
        bridge.substring_free(&token)?;
        return Err(error);
    }
    host::store(out_len, host::to_long(len));
    Ok(())
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_substring_get_byname(
    _count: c_int,
    match_data: *const c_char,
    name: *const c_char,
    bufferptr: *mut HostString,
    bufflen: *mut c_long,
) -> c_int {
    run("mpcre2_substring_get_byname", |_| FAILURE as c_int, |bridge| {
        let match_data = host::text("match_data", match_data)?;
        let name = host::c_str("name", name)?;
        let status = bridge.substring_get_byname(&match_data, name)?;
        publish_substring(bridge, status.value, bufferptr, bufflen)?;
        Ok(status.rc)
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_substring_get_bynumber(
    _count: c_int,
    match_data: *const c_char,
    number: c_long,
    bufferptr: *mut HostString,
    bufflen: *mut c_long,
) -> c_int {
    run("mpcre2_substring_get_bynumber", |_| FAILURE as c_int, |bridge| {
        let match_data = host::text("match_data", match_data)?;
        let status = bridge.substring_get_bynumber(&match_data, host::narrow("number", number)?)?;
        publish_substring(bridge, status.value, bufferptr, bufflen)?;
        Ok(status.rc)
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_substring_free(_count: c_int, buffer: *const c_char) {
    void_call(
        "mpcre2_substring_free",
        "buffer",
        buffer,
        Bridge::substring_free,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_substring_length_byname(
    _count: c_int,
    match_data: *const c_char,
    name: *const c_char,
    length: *mut c_long,
) -> c_long {
    run("mpcre2_substring_length_byname", failure, |bridge| {
        let match_data = host::text("match_data", match_data)?;
        let name = host::c_str("name", name)?;
        let status = bridge.substring_length_byname(&match_data, name)?;
        host::store(length, host::to_long(status.value));
        Ok(widen(status.rc))
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_substring_length_bynumber(
    _count: c_int,
    match_data: *const c_char,
    number: c_long,
    length: *mut c_long,
) -> c_long {
    run("mpcre2_substring_length_bynumber", failure, |bridge| {
        let match_data = host::text("match_data", match_data)?;
        let status =
            bridge.substring_length_bynumber(&match_data, host::narrow("number", number)?)?;
        host::store(length, host::to_long(status.value));
        Ok(widen(status.rc))
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_substring_number_from_name(
    _count: c_int,
    code: *const c_char,
    name: *const c_char,
) -> c_long {
    run("mpcre2_substring_number_from_name", failure, |bridge| {
        let code = host::text("code", code)?;
        let name = host::c_str("name", name)?;
        bridge.substring_number_from_name(&code, name).map(widen)
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_substring_list_free(_count: c_int, list: *const c_char) {
    void_call(
        "mpcre2_substring_list_free",
        "list",
        list,
        Bridge::substring_list_free,
    )
}

/// Tokens for the list and its lengths array go into the two host buffers
#[no_mangle]
pub unsafe extern "C" fn mpcre2_substring_list_get(
    _count: c_int,
    match_data: *const c_char,
    listptr: *mut HostString,
    lengthsptr: *mut HostString,
) -> c_long {
    run("mpcre2_substring_list_get", failure, |bridge| {
        let match_data = host::text("match_data", match_data)?;
        let status = bridge.substring_list_get(&match_data)?;
        let (list, lengths) = &status.value;

        let written = host::write_text("listptr", listptr, list)
            .and_then(|()| host::write_text("lengthsptr", lengthsptr, lengths));
        if let Err(error) = written {
            bridge.substring_list_free(list)?;
            return Err(error);
        }
        Ok(widen(status.rc))
    })
}

// Substitute

/// Substitute into `output`
///
/// `output` keeps 0 bytes when the status is negative. `output_length` always
/// receives the length the engine reported, which after an overflow with
/// `PCRE2_SUBSTITUTE_OVERFLOW_LENGTH` is the length it would have needed.
#[no_mangle]
pub unsafe extern "C" fn mpcre2_substitute(
    _count: c_int,
    code: *const c_char,
    subject: *const HostString,
    start_offset: c_long,
    options: *const c_char,
    match_data: *const c_char,
    mcontext: *const c_char,
    replacement: *const HostString,
    output: *mut HostString,
    output_length: *mut c_long,
) -> c_long {
    let args = MatchArgs {
        code,
        subject,
        start_offset,
        options,
        match_data,
        context: mcontext,
    };
    run("mpcre2_substitute", failure, |bridge| {
        let replacement = host::bytes("replacement", replacement)?;
        let storage = host::buffer("outputbuffer", output)?;
        let status = args.decode(|call| bridge.substitute(call, replacement, storage))?;

        host::set_length(output, if status.is_ok() { status.value } else { 0 });
        host::store(output_length, host::to_long(status.value));
        Ok(widen(status.rc))
    })
}

// JIT

#[no_mangle]
pub unsafe extern "C" fn mpcre2_jit_compile(
    _count: c_int,
    code: *const c_char,
    options: *const c_char,
) -> c_long {
    run("mpcre2_jit_compile", failure, |bridge| {
        let code = host::text("code", code)?;
        let options = host::text("options", options)?;
        bridge.jit_compile(&code, &options).map(widen)
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_jit_match(
    _count: c_int,
    code: *const c_char,
    subject: *const HostString,
    start_offset: c_long,
    options: *const c_char,
    match_data: *const c_char,
    mcontext: *const c_char,
) -> c_long {
    let args = MatchArgs {
        code,
        subject,
        start_offset,
        options,
        match_data,
        context: mcontext,
    };
    run("mpcre2_jit_match", failure, |bridge| {
        args.decode(|call| bridge.jit_match(call)).map(widen)
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_jit_free_unused_memory(_count: c_int, gcontext: *const c_char) {
    void_call(
        "mpcre2_jit_free_unused_memory",
        "gcontext",
        gcontext,
        Bridge::jit_free_unused_memory,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_jit_stack_create(
    _count: c_int,
    start_size: c_long,
    max_size: c_long,
    gcontext: *const c_char,
) -> *const c_char {
    host::return_token(run("mpcre2_jit_stack_create", null_token, |bridge| {
        let gcontext = host::text("gcontext", gcontext)?;
        bridge.jit_stack_create(
            host::narrow("startsize", start_size)?,
            host::narrow("maxsize", max_size)?,
            &gcontext,
        )
    }))
}

/// Without a callback, `data` names a stack from `mpcre2_jit_stack_create`
#[no_mangle]
pub unsafe extern "C" fn mpcre2_jit_stack_assign(
    _count: c_int,
    mcontext: *const c_char,
    callback: *const c_char,
    data: *const c_char,
) {
    run("mpcre2_jit_stack_assign", |_| (), |bridge| {
        let mcontext = host::text("mcontext", mcontext)?;
        let callback = host::text("callback", callback)?;
        let data = host::text("data", data)?;
        bridge.jit_stack_assign(&mcontext, &callback, &data)
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_jit_stack_free(_count: c_int, stack: *const c_char) {
    void_call(
        "mpcre2_jit_stack_free",
        "jit_stack",
        stack,
        Bridge::jit_stack_free,
    )
}

// Serialization

/// Decoded pattern tokens are written to `codes`, comma separated
#[no_mangle]
pub unsafe extern "C" fn mpcre2_serialize_decode(
    _count: c_int,
    codes: *mut HostString,
    number_of_codes: c_long,
    bytes: *const c_char,
    gcontext: *const c_char,
) -> c_long {
    run("mpcre2_serialize_decode", failure, |bridge| {
        let bytes = host::text("bytes", bytes)?;
        let gcontext = host::text("gcontext", gcontext)?;
        let count = host::narrow("number_of_codes", number_of_codes)?;
        let status = bridge.serialize_decode(count, &bytes, &gcontext)?;

        if let Err(error) = host::write_text("codes", codes, &status.value.join(CODE_LIST_SEPARATOR))
        {
            for code in &status.value {
                bridge.code_free(code)?;
            }
            return Err(error);
        }
        Ok(widen(status.rc))
    })
}

/// `codes` is a comma-separated list of pattern tokens
#[no_mangle]
pub unsafe extern "C" fn mpcre2_serialize_encode(
    _count: c_int,
    codes: *const c_char,
    number_of_codes: c_long,
    bytes: *mut HostString,
    size: *mut c_long,
    gcontext: *const c_char,
) -> c_long {
    run("mpcre2_serialize_encode", failure, |bridge| {
        let codes = host::text("codes", codes)?;
        let gcontext = host::text("gcontext", gcontext)?;
        let count = host::narrow("number_of_codes", number_of_codes)?;
        let status = bridge.serialize_encode(&codes, count, &gcontext)?;
        let (token, serialized_size) = &status.value;

        if let Err(error) = host::write_text("bytes", bytes, token) {
            bridge.serialize_free(token)?;
            return Err(error);
        }
        host::store(size, host::to_long(*serialized_size));
        Ok(widen(status.rc))
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_serialize_free(_count: c_int, bytes: *const c_char) {
    void_call(
        "mpcre2_serialize_free",
        "bytes",
        bytes,
        Bridge::serialize_free,
    )
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_serialize_get_number_of_codes(
    _count: c_int,
    bytes: *const c_char,
) -> c_long {
    run("mpcre2_serialize_get_number_of_codes", failure, |bridge| {
        let bytes = host::text("bytes", bytes)?;
        bridge.serialize_get_number_of_codes(&bytes).map(widen)
    })
}

// Miscellaneous

/// Message text goes into `buffer`; its length is 0 on a negative result
#[no_mangle]
pub unsafe extern "C" fn mpcre2_get_error_message(
    _count: c_int,
    errorcode: c_long,
    buffer: *mut HostString,
) -> c_long {
    run("mpcre2_get_error_message", failure, |bridge| {
        let code = c_int::try_from(errorcode).map_err(|_| {
            BridgeError::invalid_argument("errorcode", format!("{} is out of range", errorcode))
        })?;
        let storage = host::buffer("buffer", buffer)?;
        let rc = bridge.get_error_message(code, storage);
        host::set_length(buffer, usize::try_from(rc).unwrap_or(0));
        Ok(widen(rc))
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_maketables(_count: c_int, gcontext: *const c_char) -> *const c_char {
    token_call("mpcre2_maketables", "gcontext", gcontext, Bridge::maketables)
}

/// The answer to one `PCRE2_INFO_*` query, as text, goes into `answer`
///
/// Unknown or multiple selectors return `PCRE2_ERROR_BADOPTION`.
#[no_mangle]
pub unsafe extern "C" fn mpcre2_pattern_info(
    _count: c_int,
    code: *const c_char,
    what: *const c_char,
    answer: *mut HostString,
) -> c_long {
    let refused = |error: &BridgeError| match error {
        BridgeError::Option(_) | BridgeError::InvalidSelector { .. } => widen(ERROR_BADOPTION),
        _ => FAILURE,
    };
    run("mpcre2_pattern_info", refused, |bridge| {
        let code = host::text("code", code)?;
        let what = host::text("what", what)?;
        bridge.pattern_info_with(&code, &what, |status| {
            if status.is_ok() {
                host::write_text("where", answer, &status.value)?;
            } else {
                host::set_length(answer, 0);
            }
            Ok(widen(status.rc))
        })
    })
}

#[no_mangle]
pub unsafe extern "C" fn mpcre2_callout_enumerate(
    _count: c_int,
    code: *const c_char,
    callback: *const c_char,
    data: *const c_char,
) -> c_long {
    callback_call(
        "mpcre2_callout_enumerate",
        "code",
        code,
        callback,
        data,
        |bridge, code, callback, data| bridge.callout_enumerate(code, callback, data),
    )
}
