//! Reading the `next` redirect chain out of a logout URL.
//!
//! A logout URL may carry several `next` parameters:
//!
//! ```text
//! https://auth.example.com/logout?next=https%3A%2F%2Fa.com%2Flogout&next=https%3A%2F%2Fb.com
//! ```
//!
//! The first one is where the user goes now. The others are forwarded
//! untouched, so the page at the first target can run its own logout and
//! pass the user further down the chain. The non-standard
//! `/logout&next=...` form, with no `?` at all, is accepted as well.

use crate::error::UrlError;
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

static NEXT_PARAM: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]next=([^&]*)").expect("valid next regex"));

static CHAINED_PARAMS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[?&]next=[^&]*(&next=.*)$").expect("valid chain regex"));

/// Decodes a percent-encoded URI component, rejecting stray `%` signs and
/// byte sequences that aren't UTF-8.
pub fn decode_component(value: &str) -> Result<String, UrlError> {
    let bytes = value.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .map(|hex| hex.iter().all(u8::is_ascii_hexdigit))
                .unwrap_or(false);
            if !valid {
                return Err(UrlError::Decode(value.to_string()));
            }
            i += 3;
        } else {
            i += 1;
        }
    }

    percent_decode_str(value)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|_| UrlError::Decode(value.to_string()))
}

/// The immediate redirect target carried by `href`, if any.
pub fn next_url(href: &str) -> Result<Option<String>, UrlError> {
    let url = Url::parse(href)?;

    let raw = url
        .query_pairs()
        .find(|(key, _)| key == "next")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
        .or_else(|| after_logout(href));

    raw.map(|value| decode_component(&value)).transpose()
}

fn after_logout(href: &str) -> Option<String> {
    let (_, rest) = href.split_once("logout")?;

    NEXT_PARAM
        .captures(rest)
        .and_then(|captures| captures.get(1))
        .map(|value| value.as_str())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Every `next` parameter after the first, as a raw query fragment without
/// a leading `&`.
pub fn remaining_next_params(href: &str) -> Option<&str> {
    CHAINED_PARAMS
        .captures(href)
        .and_then(|captures| captures.get(1))
        .map(|chain| &chain.as_str()[1..])
}

/// Appends the forwarded chain to `next_url`.
pub fn append_params(next_url: &str, params: Option<&str>) -> String {
    match params {
        Some(params) if !params.is_empty() => {
            let separator = if next_url.contains('?') { '&' } else { '?' };
            format!("{}{}{}", next_url, separator, params)
        }
        _ => next_url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_next_param() {
        let next = next_url("https://x/logout?next=https%3A%2F%2Fy.com").unwrap();

        assert_eq!(next.as_deref(), Some("https://y.com"));
    }

    #[test]
    fn next_param_without_question_mark() {
        let next = next_url("https://x/logout&next=https%3A%2F%2Fy.com").unwrap();

        assert_eq!(next.as_deref(), Some("https://y.com"));
    }

    #[test]
    fn next_param_after_other_params() {
        let next = next_url("https://x/logout?lang=th&next=https%3A%2F%2Fy.com").unwrap();

        assert_eq!(next.as_deref(), Some("https://y.com"));
    }

    #[test]
    fn empty_first_next_counts_as_missing() {
        let next = next_url("https://x/logout?next=&next=https%3A%2F%2Fy.com").unwrap();

        assert_eq!(next, None);
    }

    #[test]
    fn next_param_is_decoded_twice() {
        let next = next_url("https://x/logout?next=https%253A%252F%252Fy.com").unwrap();

        assert_eq!(next.as_deref(), Some("https://y.com"));
    }

    #[test]
    fn missing_next_param() {
        assert_eq!(next_url("https://x/logout").unwrap(), None);
        assert_eq!(next_url("https://x/logout?after=https%3A%2F%2Fy.com").unwrap(), None);
        assert_eq!(next_url("https://x/signout&next=https%3A%2F%2Fy.com").unwrap(), None);
    }

    #[test]
    fn malformed_url_is_an_error() {
        assert!(matches!(next_url("not a url"), Err(UrlError::Parse(_))));
    }

    #[test]
    fn stray_percent_is_an_error() {
        assert!(matches!(
            next_url("https://x/logout?next=100%25"),
            Err(UrlError::Decode(_))
        ));
    }

    #[test]
    fn decode_rejects_invalid_utf8() {
        assert!(decode_component("%FF").is_err());
        assert_eq!(decode_component("a%20b").unwrap(), "a b");
    }

    #[test]
    fn remaining_params_are_kept_verbatim() {
        let href = "https://x/logout?next=https%3A%2F%2Fa.com&next=https%3A%2F%2Fb.com&next=https%3A%2F%2Fc.com";

        assert_eq!(
            remaining_next_params(href),
            Some("next=https%3A%2F%2Fb.com&next=https%3A%2F%2Fc.com")
        );
    }

    #[test]
    fn no_remaining_params_for_single_next() {
        assert_eq!(remaining_next_params("https://x/logout?next=https%3A%2F%2Fa.com"), None);
    }

    #[test]
    fn chain_must_directly_follow_first_next() {
        let href = "https://x/logout?next=a&lang=th&next=b";

        assert_eq!(remaining_next_params(href), None);
    }

    #[test]
    fn builds_chained_url() {
        let href = "https://x/logout?next=https://a.com&next=https://b.com";
        let next = next_url(href).unwrap().unwrap();

        assert_eq!(
            append_params(&next, remaining_next_params(href)),
            "https://a.com?next=https://b.com"
        );
    }

    #[test]
    fn appends_to_existing_query() {
        assert_eq!(
            append_params("https://a.com/logout?x=1", Some("next=b")),
            "https://a.com/logout?x=1&next=b"
        );
        assert_eq!(append_params("https://a.com", None), "https://a.com");
    }
}
