//! Anonymous visitor identity carried in the long-lived `vid` cookie.

use std::collections::HashMap;

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::RngCore;

pub const VISITOR_COOKIE: &str = "vid";

/// One year, in seconds.
pub const VISITOR_COOKIE_MAX_AGE: u64 = 60 * 60 * 24 * 365;

/// Stored ids shorter than this are treated as absent and replaced.
pub const MIN_VISITOR_ID_LEN: usize = 16;

/// Characters left untouched by `encodeURIComponent`-style cookie encoding.
const COOKIE_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Result of resolving the visitor behind a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisitorIdentity {
    pub visitor_id: String,
    /// `true` when the id was minted for this request and the caller must
    /// send it back with [`set_cookie_value`].
    pub is_new: bool,
}

/// Parse a `Cookie` header into a name → value map.
///
/// Pairs without `=` or with an empty name are skipped. Values are
/// percent-decoded, falling back to the raw text when the decoded bytes are
/// not UTF-8. A repeated name keeps its last value.
pub fn parse_cookies(header: &str) -> HashMap<String, String> {
    let mut out = HashMap::new();
    for part in header.split(';') {
        let Some((name, value)) = part.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        let value = value.trim();
        let decoded = percent_decode_str(value)
            .decode_utf8()
            .map(|v| v.into_owned())
            .unwrap_or_else(|_| value.to_string());
        out.insert(name.to_string(), decoded);
    }
    out
}

/// Reuse the `vid` cookie when it is long enough, otherwise mint a new id.
pub fn resolve_visitor(cookie_header: Option<&str>) -> VisitorIdentity {
    let existing = cookie_header
        .map(parse_cookies)
        .and_then(|mut cookies| cookies.remove(VISITOR_COOKIE))
        .filter(|vid| vid.chars().count() >= MIN_VISITOR_ID_LEN);

    match existing {
        Some(visitor_id) => VisitorIdentity {
            visitor_id,
            is_new: false,
        },
        None => VisitorIdentity {
            visitor_id: new_visitor_id(),
            is_new: true,
        },
    }
}

/// 16 random bytes from the thread CSPRNG, hex encoded (32 chars).
pub fn new_visitor_id() -> String {
    let mut buf = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}

/// `Set-Cookie` value persisting `visitor_id` for a year.
pub fn set_cookie_value(visitor_id: &str) -> String {
    format!(
        "{}={}; Max-Age={}; Path=/; HttpOnly; SameSite=Lax; Secure",
        VISITOR_COOKIE,
        utf8_percent_encode(visitor_id, COOKIE_VALUE),
        VISITOR_COOKIE_MAX_AGE
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn is_token(id: &str) -> bool {
        id.len() == 32 && id.chars().all(|c| matches!(c, '0'..='9' | 'a'..='f'))
    }

    #[test]
    fn parses_trimmed_pairs_and_keeps_last_duplicate() {
        let cookies = parse_cookies(" a=1 ;b = two; a=3; junk; =nameless");
        assert_eq!(cookies.get("a").map(String::as_str), Some("3"));
        assert_eq!(cookies.get("b").map(String::as_str), Some("two"));
        assert_eq!(cookies.len(), 2);
    }

    #[test]
    fn decodes_percent_escapes_and_falls_back_on_bad_utf8() {
        let cookies = parse_cookies("name=hello%20world; raw=%FF%FE");
        assert_eq!(cookies["name"], "hello world");
        assert_eq!(cookies["raw"], "%FF%FE");
    }

    #[test]
    fn value_may_contain_equals_sign() {
        let cookies = parse_cookies("token=abc=def");
        assert_eq!(cookies["token"], "abc=def");
    }

    #[test]
    fn reuses_long_enough_vid() {
        let identity = resolve_visitor(Some("theme=dark; vid=0123456789abcdef"));
        assert_eq!(identity.visitor_id, "0123456789abcdef");
        assert!(!identity.is_new);
    }

    #[test]
    fn mints_token_when_vid_missing_short_or_header_absent() {
        for header in [None, Some(""), Some("other=1"), Some("vid=short"), Some(";;;")] {
            let identity = resolve_visitor(header);
            assert!(identity.is_new, "header {header:?} should mint a new id");
            assert!(is_token(&identity.visitor_id), "{}", identity.visitor_id);
        }
    }

    #[test]
    fn minted_ids_differ() {
        assert_ne!(new_visitor_id(), new_visitor_id());
    }

    #[test]
    fn set_cookie_carries_all_attributes() {
        let value = set_cookie_value("abc");
        assert_eq!(
            value,
            "vid=abc; Max-Age=31536000; Path=/; HttpOnly; SameSite=Lax; Secure"
        );
    }

    #[test]
    fn set_cookie_percent_encodes_reserved_characters() {
        let value = set_cookie_value("a b;c");
        assert!(value.starts_with("vid=a%20b%3Bc;"), "{value}");
    }
}
