//! PCRE2 numeric constants (pcre2.h, 8-bit library)

use std::ffi::c_int;

// Options shared by compile, match and JIT
pub const ANCHORED: u32 = 0x8000_0000;
pub const NO_UTF_CHECK: u32 = 0x4000_0000;
pub const ENDANCHORED: u32 = 0x2000_0000;

// Compile options
pub const ALLOW_EMPTY_CLASS: u32 = 0x0000_0001;
pub const ALT_BSUX: u32 = 0x0000_0002;
pub const AUTO_CALLOUT: u32 = 0x0000_0004;
pub const CASELESS: u32 = 0x0000_0008;
pub const DOLLAR_ENDONLY: u32 = 0x0000_0010;
pub const DOTALL: u32 = 0x0000_0020;
pub const DUPNAMES: u32 = 0x0000_0040;
pub const EXTENDED: u32 = 0x0000_0080;
pub const FIRSTLINE: u32 = 0x0000_0100;
pub const MATCH_UNSET_BACKREF: u32 = 0x0000_0200;
pub const MULTILINE: u32 = 0x0000_0400;
pub const NEVER_UCP: u32 = 0x0000_0800;
pub const NEVER_UTF: u32 = 0x0000_1000;
pub const NO_AUTO_CAPTURE: u32 = 0x0000_2000;
pub const NO_AUTO_POSSESS: u32 = 0x0000_4000;
pub const NO_DOTSTAR_ANCHOR: u32 = 0x0000_8000;
pub const NO_START_OPTIMIZE: u32 = 0x0001_0000;
pub const UCP: u32 = 0x0002_0000;
pub const UNGREEDY: u32 = 0x0004_0000;
pub const UTF: u32 = 0x0008_0000;
pub const NEVER_BACKSLASH_C: u32 = 0x0010_0000;
pub const ALT_CIRCUMFLEX: u32 = 0x0020_0000;
pub const ALT_VERBNAMES: u32 = 0x0040_0000;
pub const USE_OFFSET_LIMIT: u32 = 0x0080_0000;
pub const EXTENDED_MORE: u32 = 0x0100_0000;
pub const LITERAL: u32 = 0x0200_0000;

// Extra compile options
pub const EXTRA_ALLOW_SURROGATE_ESCAPES: u32 = 0x0000_0001;
pub const EXTRA_BAD_ESCAPE_IS_LITERAL: u32 = 0x0000_0002;
pub const EXTRA_MATCH_WORD: u32 = 0x0000_0004;
pub const EXTRA_MATCH_LINE: u32 = 0x0000_0008;

// JIT options
pub const JIT_COMPLETE: u32 = 0x0000_0001;
pub const JIT_PARTIAL_SOFT: u32 = 0x0000_0002;
pub const JIT_PARTIAL_HARD: u32 = 0x0000_0004;

// Match and substitute options
pub const NOTBOL: u32 = 0x0000_0001;
pub const NOTEOL: u32 = 0x0000_0002;
pub const NOTEMPTY: u32 = 0x0000_0004;
pub const NOTEMPTY_ATSTART: u32 = 0x0000_0008;
pub const PARTIAL_SOFT: u32 = 0x0000_0010;
pub const PARTIAL_HARD: u32 = 0x0000_0020;
pub const DFA_RESTART: u32 = 0x0000_0040;
pub const DFA_SHORTEST: u32 = 0x0000_0080;
pub const SUBSTITUTE_GLOBAL: u32 = 0x0000_0100;
pub const SUBSTITUTE_EXTENDED: u32 = 0x0000_0200;
pub const SUBSTITUTE_UNSET_EMPTY: u32 = 0x0000_0400;
pub const SUBSTITUTE_UNKNOWN_UNSET: u32 = 0x0000_0800;
pub const SUBSTITUTE_OVERFLOW_LENGTH: u32 = 0x0000_1000;
pub const NO_JIT: u32 = 0x0000_2000;

// Newline conventions
pub const NEWLINE_CR: u32 = 1;
pub const NEWLINE_LF: u32 = 2;
pub const NEWLINE_CRLF: u32 = 3;
pub const NEWLINE_ANY: u32 = 4;
pub const NEWLINE_ANYCRLF: u32 = 5;
pub const NEWLINE_NUL: u32 = 6;

// \R conventions
pub const BSR_UNICODE: u32 = 1;
pub const BSR_ANYCRLF: u32 = 2;

// pattern_info selectors
pub const INFO_ALLOPTIONS: u32 = 0;
pub const INFO_ARGOPTIONS: u32 = 1;
pub const INFO_BACKREFMAX: u32 = 2;
pub const INFO_BSR: u32 = 3;
pub const INFO_CAPTURECOUNT: u32 = 4;
pub const INFO_FIRSTCODEUNIT: u32 = 5;
pub const INFO_FIRSTCODETYPE: u32 = 6;
pub const INFO_FIRSTBITMAP: u32 = 7;
pub const INFO_HASCRORLF: u32 = 8;
pub const INFO_JCHANGED: u32 = 9;
pub const INFO_JITSIZE: u32 = 10;
pub const INFO_LASTCODEUNIT: u32 = 11;
pub const INFO_LASTCODETYPE: u32 = 12;
pub const INFO_MATCHEMPTY: u32 = 13;
pub const INFO_MATCHLIMIT: u32 = 14;
pub const INFO_MAXLOOKBEHIND: u32 = 15;
pub const INFO_MINLENGTH: u32 = 16;
pub const INFO_NAMECOUNT: u32 = 17;
pub const INFO_NAMEENTRYSIZE: u32 = 18;
pub const INFO_NAMETABLE: u32 = 19;
pub const INFO_NEWLINE: u32 = 20;
pub const INFO_DEPTHLIMIT: u32 = 21;
pub const INFO_RECURSIONLIMIT: u32 = 21;
pub const INFO_SIZE: u32 = 22;
pub const INFO_HASBACKSLASHC: u32 = 23;
pub const INFO_FRAMESIZE: u32 = 24;
pub const INFO_HEAPLIMIT: u32 = 25;
pub const INFO_EXTRAOPTIONS: u32 = 26;

// Error codes the bridge itself returns
pub const ERROR_NOMATCH: c_int = -1;
pub const ERROR_BADDATA: c_int = -29;
pub const ERROR_BADOPTION: c_int = -34;
pub const ERROR_NOMEMORY: c_int = -48;
pub const ERROR_NOSUBSTRING: c_int = -49;
pub const ERROR_NULL: c_int = -51;
pub const ERROR_UNAVAILABLE: c_int = -54;
pub const ERROR_UNSET: c_int = -55;

/// `errorcode` value after a successful compile
pub const COMPILE_SUCCESS: c_int = 100;

/// Ovector entry of a group that did not participate
pub const UNSET: usize = usize::MAX;

/// Length of the tables built by `pcre2_maketables`
pub const TABLES_LENGTH: usize = 1088;

/// Length of the `INFO_FIRSTBITMAP` bitmap
pub const FIRSTBITMAP_LENGTH: usize = 32;
