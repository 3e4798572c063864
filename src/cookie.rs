use crate::config::CookieOptions;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// An `expires` date far enough in the past to remove any cookie.
pub const EXPIRED_DATE: &str = "Thu, 01 Jan 1970 00:00:00 GMT";

/// Everything but the characters `encodeURIComponent` leaves alone.
pub(crate) const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Builds the directive that expires cookie `name`.
pub fn deletion_directive(name: &str, options: &CookieOptions) -> String {
    let mut directive = format!(
        "{}=; expires={}",
        utf8_percent_encode(name, COMPONENT),
        EXPIRED_DATE
    );

    if let Some(path) = options.path.as_deref().filter(|path| !path.is_empty()) {
        directive.push_str("; path=");
        directive.push_str(path);
    }

    if let Some(domain) = options.domain.as_deref().filter(|domain| !domain.is_empty()) {
        directive.push_str("; domain=");
        directive.push_str(domain);
    }

    if options.secure {
        directive.push_str("; secure");
    }

    if let Some(same_site) = options.same_site {
        directive.push_str(&format!("; samesite={}", same_site));
    }

    directive
}

/// Distinct names present in a cookie header, in order of first
/// appearance. Empty names left over from stray separators are skipped.
pub fn cookie_names(header: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for pair in header.split(';') {
        let name = pair.trim().split('=').next().unwrap_or_default();
        if !name.is_empty() && !names.iter().any(|seen| seen == name) {
            names.push(name.to_string());
        }
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SameSite;

    #[test]
    fn names_in_header_order() {
        assert_eq!(cookie_names("a=1; b=2; c=3"), vec!["a", "b", "c"]);
    }

    #[test]
    fn repeated_name_listed_once() {
        assert_eq!(cookie_names("a=1; b=2; a=3"), vec!["a", "b"]);
    }

    #[test]
    fn names_skip_empty_pieces() {
        assert_eq!(cookie_names(""), Vec::<String>::new());
        assert_eq!(cookie_names(";; =orphan; token=x=y;"), vec!["token"]);
    }

    #[test]
    fn directive_with_default_options() {
        let directive = deletion_directive("session", &CookieOptions::default());

        assert_eq!(
            directive,
            "session=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/; samesite=Lax"
        );
    }

    #[test]
    fn directive_with_every_attribute() {
        let options = CookieOptions {
            path: Some("/app".to_string()),
            domain: Some(".example.com".to_string()),
            secure: true,
            same_site: Some(SameSite::None),
        };

        assert_eq!(
            deletion_directive("id", &options),
            "id=; expires=Thu, 01 Jan 1970 00:00:00 GMT; path=/app; domain=.example.com; secure; samesite=None"
        );
    }

    #[test]
    fn directive_without_attributes() {
        let options = CookieOptions {
            path: None,
            domain: None,
            secure: false,
            same_site: None,
        };

        assert_eq!(
            deletion_directive("id", &options),
            "id=; expires=Thu, 01 Jan 1970 00:00:00 GMT"
        );
    }

    #[test]
    fn directive_encodes_name() {
        let directive = deletion_directive("a b;c(1)", &CookieOptions::default());

        assert!(directive.starts_with("a%20b%3Bc(1)=;"));
    }
}
