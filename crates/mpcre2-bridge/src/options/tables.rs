//! Option families accepted from the host
//!
//! Names are the engine's own macro names, matched case-sensitively.

use super::OptionTable;
use crate::engine::constants::*;

pub static COMPILE: OptionTable = OptionTable {
    tag: "compile",
    entries: &[
        ("PCRE2_ANCHORED", ANCHORED),
        ("PCRE2_ALLOW_EMPTY_CLASS", ALLOW_EMPTY_CLASS),
        ("PCRE2_ALT_BSUX", ALT_BSUX),
        ("PCRE2_ALT_CIRCUMFLEX", ALT_CIRCUMFLEX),
        ("PCRE2_ALT_VERBNAMES", ALT_VERBNAMES),
        ("PCRE2_AUTO_CALLOUT", AUTO_CALLOUT),
        ("PCRE2_CASELESS", CASELESS),
        ("PCRE2_DOLLAR_ENDONLY", DOLLAR_ENDONLY),
        ("PCRE2_DOTALL", DOTALL),
        ("PCRE2_DUPNAMES", DUPNAMES),
        ("PCRE2_ENDANCHORED", ENDANCHORED),
        ("PCRE2_EXTENDED", EXTENDED),
        ("PCRE2_EXTENDED_MORE", EXTENDED_MORE),
        ("PCRE2_FIRSTLINE", FIRSTLINE),
        ("PCRE2_LITERAL", LITERAL),
        ("PCRE2_MATCH_UNSET_BACKREF", MATCH_UNSET_BACKREF),
        ("PCRE2_MULTILINE", MULTILINE),
        ("PCRE2_NEVER_BACKSLASH_C", NEVER_BACKSLASH_C),
        ("PCRE2_NEVER_UCP", NEVER_UCP),
        ("PCRE2_NEVER_UTF", NEVER_UTF),
        ("PCRE2_NO_AUTO_CAPTURE", NO_AUTO_CAPTURE),
        ("PCRE2_NO_AUTO_POSSESS", NO_AUTO_POSSESS),
        ("PCRE2_NO_DOTSTAR_ANCHOR", NO_DOTSTAR_ANCHOR),
        ("PCRE2_NO_START_OPTIMIZE", NO_START_OPTIMIZE),
        ("PCRE2_NO_UTF_CHECK", NO_UTF_CHECK),
        ("PCRE2_UCP", UCP),
        ("PCRE2_UNGREEDY", UNGREEDY),
        ("PCRE2_USE_OFFSET_LIMIT", USE_OFFSET_LIMIT),
        ("PCRE2_UTF", UTF),
    ],
};

pub static EXTRA_COMPILE: OptionTable = OptionTable {
    tag: "extra compile",
    entries: &[
        ("PCRE2_EXTRA_ALLOW_SURROGATE_ESCAPES", EXTRA_ALLOW_SURROGATE_ESCAPES),
        ("PCRE2_EXTRA_BAD_ESCAPE_IS_LITERAL", EXTRA_BAD_ESCAPE_IS_LITERAL),
        ("PCRE2_EXTRA_MATCH_LINE", EXTRA_MATCH_LINE),
        ("PCRE2_EXTRA_MATCH_WORD", EXTRA_MATCH_WORD),
    ],
};

/// Shared by `match`, `dfa_match`, `jit_match` and `substitute`
pub static MATCH: OptionTable = OptionTable {
    tag: "match",
    entries: &[
        ("PCRE2_ANCHORED", ANCHORED),
        ("PCRE2_ENDANCHORED", ENDANCHORED),
        ("PCRE2_NOTBOL", NOTBOL),
        ("PCRE2_NOTEOL", NOTEOL),
        ("PCRE2_NOTEMPTY", NOTEMPTY),
        ("PCRE2_NOTEMPTY_ATSTART", NOTEMPTY_ATSTART),
        ("PCRE2_NO_JIT", NO_JIT),
        ("PCRE2_NO_UTF_CHECK", NO_UTF_CHECK),
        ("PCRE2_PARTIAL_HARD", PARTIAL_HARD),
        ("PCRE2_PARTIAL_SOFT", PARTIAL_SOFT),
        ("PCRE2_DFA_RESTART", DFA_RESTART),
        ("PCRE2_DFA_SHORTEST", DFA_SHORTEST),
        ("PCRE2_SUBSTITUTE_EXTENDED", SUBSTITUTE_EXTENDED),
        ("PCRE2_SUBSTITUTE_GLOBAL", SUBSTITUTE_GLOBAL),
        ("PCRE2_SUBSTITUTE_OVERFLOW_LENGTH", SUBSTITUTE_OVERFLOW_LENGTH),
        ("PCRE2_SUBSTITUTE_UNKNOWN_UNSET", SUBSTITUTE_UNKNOWN_UNSET),
        ("PCRE2_SUBSTITUTE_UNSET_EMPTY", SUBSTITUTE_UNSET_EMPTY),
    ],
};

pub static JIT: OptionTable = OptionTable {
    tag: "jit",
    entries: &[
        ("PCRE2_JIT_COMPLETE", JIT_COMPLETE),
        ("PCRE2_JIT_PARTIAL_SOFT", JIT_PARTIAL_SOFT),
        ("PCRE2_JIT_PARTIAL_HARD", JIT_PARTIAL_HARD),
    ],
};

pub static BSR: OptionTable = OptionTable {
    tag: "bsr",
    entries: &[
        ("PCRE2_BSR_ANYCRLF", BSR_ANYCRLF),
        ("PCRE2_BSR_UNICODE", BSR_UNICODE),
    ],
};

pub static NEWLINE: OptionTable = OptionTable {
    tag: "newline",
    entries: &[
        ("PCRE2_NEWLINE_CR", NEWLINE_CR),
        ("PCRE2_NEWLINE_LF", NEWLINE_LF),
        ("PCRE2_NEWLINE_CRLF", NEWLINE_CRLF),
        ("PCRE2_NEWLINE_ANYCRLF", NEWLINE_ANYCRLF),
        ("PCRE2_NEWLINE_ANY", NEWLINE_ANY),
        ("PCRE2_NEWLINE_NUL", NEWLINE_NUL),
    ],
};

/// `pattern_info` selectors
pub static INFO: OptionTable = OptionTable {
    tag: "info",
    entries: &[
        ("PCRE2_INFO_ALLOPTIONS", INFO_ALLOPTIONS),
        ("PCRE2_INFO_ARGOPTIONS", INFO_ARGOPTIONS),
        ("PCRE2_INFO_BACKREFMAX", INFO_BACKREFMAX),
        ("PCRE2_INFO_BSR", INFO_BSR),
        ("PCRE2_INFO_CAPTURECOUNT", INFO_CAPTURECOUNT),
        ("PCRE2_INFO_FIRSTCODEUNIT", INFO_FIRSTCODEUNIT),
        ("PCRE2_INFO_FIRSTCODETYPE", INFO_FIRSTCODETYPE),
        ("PCRE2_INFO_FIRSTBITMAP", INFO_FIRSTBITMAP),
        ("PCRE2_INFO_HASCRORLF", INFO_HASCRORLF),
        ("PCRE2_INFO_JCHANGED", INFO_JCHANGED),
        ("PCRE2_INFO_JITSIZE", INFO_JITSIZE),
        ("PCRE2_INFO_LASTCODEUNIT", INFO_LASTCODEUNIT),
        ("PCRE2_INFO_LASTCODETYPE", INFO_LASTCODETYPE),
        ("PCRE2_INFO_MATCHEMPTY", INFO_MATCHEMPTY),
        ("PCRE2_INFO_MATCHLIMIT", INFO_MATCHLIMIT),
        ("PCRE2_INFO_MAXLOOKBEHIND", INFO_MAXLOOKBEHIND),
        ("PCRE2_INFO_MINLENGTH", INFO_MINLENGTH),
        ("PCRE2_INFO_NAMECOUNT", INFO_NAMECOUNT),
        ("PCRE2_INFO_NAMEENTRYSIZE", INFO_NAMEENTRYSIZE),
        ("PCRE2_INFO_NAMETABLE", INFO_NAMETABLE),
        ("PCRE2_INFO_NEWLINE", INFO_NEWLINE),
        ("PCRE2_INFO_DEPTHLIMIT", INFO_DEPTHLIMIT),
        ("PCRE2_INFO_RECURSIONLIMIT", INFO_RECURSIONLIMIT),
        ("PCRE2_INFO_SIZE", INFO_SIZE),
        ("PCRE2_INFO_HASBACKSLASHC", INFO_HASBACKSLASHC),
        ("PCRE2_INFO_FRAMESIZE", INFO_FRAMESIZE),
        ("PCRE2_INFO_HEAPLIMIT", INFO_HEAPLIMIT),
        ("PCRE2_INFO_EXTRAOPTIONS", INFO_EXTRAOPTIONS),
    ],
};

/// Every family, for lookups by tag
pub static ALL: [&OptionTable; 7] = [&COMPILE, &EXTRA_COMPILE, &MATCH, &JIT, &BSR, &NEWLINE, &INFO];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_names_unique_within_family() {
        for table in ALL {
            let mut seen = HashSet::new();
            for (name, _) in table.entries {
                assert!(seen.insert(*name), "{} repeated in {}", name, table.tag);
            }
        }
    }

    #[test]
    fn test_tags() {
        let tags: Vec<&str> = ALL.iter().map(|table| table.tag).collect();
        assert_eq!(
            tags,
            ["compile", "extra compile", "match", "jit", "bsr", "newline", "info"]
        );
    }

    #[test]
    fn test_flag_families_have_single_bits() {
        for table in [&COMPILE, &EXTRA_COMPILE, &MATCH, &JIT] {
            for (name, value) in table.entries {
                assert_eq!(value.count_ones(), 1, "{} is not a single flag", name);
            }
        }
    }
}
