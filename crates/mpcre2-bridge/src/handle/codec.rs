//! Textual encoding of native values
//!
//! Tokens are unsigned decimal integers. Both directions use base 10; no
//! other base is accepted. `"0"` and `"NULL"` are the absent sentinels.

use super::HandleError;

/// Sentinel tokens meaning "absent / use the default"
pub const SENTINELS: [&str; 2] = ["0", "NULL"];

/// The canonical absent token
pub const NULL_TOKEN: &str = "0";

/// Longest token `encode` can produce (`u64::MAX` has 20 digits)
pub const MAX_TOKEN_LEN: usize = 20;

/// True for `"0"` and `"NULL"`
pub fn is_sentinel(token: &str) -> bool {
    SENTINELS.contains(&token)
}

/// Encode a value as a decimal token
pub fn encode(value: u64) -> String {
    value.to_string()
}

/// Decode a token produced by [`encode`]
///
/// Returns `Ok(None)` for a sentinel and `HandleError::Malformed` for
/// anything that is not a plain decimal `u64`. Signs, whitespace and
/// hexadecimal prefixes are rejected.
pub fn decode(token: &str) -> Result<Option<u64>, HandleError> {
    if is_sentinel(token) {
        return Ok(None);
    }
    if token.is_empty() || token.len() > MAX_TOKEN_LEN || !token.bytes().all(|b| b.is_ascii_digit())
    {
        return Err(HandleError::Malformed(token.to_string()));
    }
    match token.parse::<u64>() {
        Ok(0) | Err(_) => Err(HandleError::Malformed(token.to_string())),
        Ok(value) => Ok(Some(value)),
    }
}

/// Decode a raw host address (function pointers, user data)
pub fn decode_address(token: &str) -> Result<Option<usize>, HandleError> {
    decode(token)?
        .map(|value| usize::try_from(value).map_err(|_| HandleError::Malformed(token.to_string())))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    #[rstest]
    #[case("0")]
    #[case("NULL")]
    fn test_sentinels_decode_to_absent(#[case] token: &str) {
        assert_eq!(decode(token).unwrap(), None);
        assert_eq!(decode_address(token).unwrap(), None);
    }

    #[rstest]
    #[case("")]
    #[case("null")]
    #[case("0x1f")]
    #[case("-5")]
    #[case("+5")]
    #[case(" 42")]
    #[case("42 ")]
    #[case("00")]
    #[case("18446744073709551616")]
    #[case("123456789012345678901")]
    fn test_malformed_tokens(#[case] token: &str) {
        assert_eq!(decode(token), Err(HandleError::Malformed(token.to_string())));
    }

    #[test]
    fn test_extremes() {
        assert_eq!(encode(u64::MAX), "18446744073709551615");
        assert_eq!(encode(u64::MAX).len(), MAX_TOKEN_LEN);
        assert_eq!(decode("18446744073709551615").unwrap(), Some(u64::MAX));
        assert_eq!(decode("1").unwrap(), Some(1));
    }

    proptest! {
        #[test]
        fn prop_round_trip(value in 1u64..) {
            prop_assert_eq!(decode(&encode(value)).unwrap(), Some(value));
        }

        #[test]
        fn prop_decode_never_panics(token in "\\PC{0,24}") {
            let _ = decode(&token);
        }
    }
}
