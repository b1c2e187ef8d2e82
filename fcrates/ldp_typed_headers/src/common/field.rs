//! I define rules for splitting and validating header field values.
//!

use headers::HeaderValue;

/// Split a string on a separator char, ignoring separators that
/// occur inside quoted strings.
pub(crate) fn split_quote_aware(value_str: &str, sep: char) -> impl Iterator<Item = &str> {
    let mut in_quotes = false;
    value_str
        .split(move |c| {
            if in_quotes {
                if c == '"' {
                    in_quotes = false;
                }
                false
            } else if c == sep {
                true
            } else {
                if c == '"' {
                    in_quotes = true;
                }
                false
            }
        })
        .map(|item| item.trim())
        .filter(|item| !item.is_empty())
}

/// Split a header value on top level commas, respecting quoted strings.
pub(crate) fn split_csv(value: &HeaderValue) -> impl Iterator<Item = &str> {
    value
        .to_str()
        .ok()
        .into_iter()
        .flat_map(|value_str| split_quote_aware(value_str, ','))
}

/// Split a field value on top level semicolons, respecting quoted strings.
#[inline]
pub(crate) fn split_semis(value_str: &str) -> impl Iterator<Item = &str> {
    split_quote_aware(value_str, ';')
}

/// Check if a string is a valid `token` as per
/// [rfc9110](https://www.rfc-editor.org/rfc/rfc9110.html#name-tokens).
pub(crate) fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#'
                        | b'$'
                        | b'%'
                        | b'&'
                        | b'\''
                        | b'*'
                        | b'+'
                        | b'-'
                        | b'.'
                        | b'^'
                        | b'_'
                        | b'`'
                        | b'|'
                        | b'~'
                )
        })
}

/// Strip surrounding dquotes and unescape quoted pairs. A bare
/// (unquoted) value is returned as is.
pub(crate) fn unquote(s: &str) -> String {
    let s = s.trim();
    if s.len() >= 2 && s.starts_with('"') && s.ends_with('"') {
        let inner = &s[1..s.len() - 1];
        let mut out = String::with_capacity(inner.len());
        let mut escaped = false;
        for c in inner.chars() {
            if escaped {
                out.push(c);
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else {
                out.push(c);
            }
        }
        out
    } else {
        s.to_owned()
    }
}

/// Parse a `name[=value]` parameter, trimming whitespace and
/// unquoting the value. Returns `None` if the name is not a token.
pub(crate) fn parse_param(s: &str) -> Option<(String, String)> {
    let (name, value) = match s.split_once('=') {
        Some((name, value)) => (name.trim(), unquote(value)),
        None => (s.trim(), String::new()),
    };

    if !is_token(name) {
        return None;
    }
    Some((name.to_ascii_lowercase(), value))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_split_respects_quotes() {
        let val = HeaderValue::from_static("foo=\"bar,baz\", sherlock=holmes");
        let mut values = split_csv(&val);
        assert_eq!(values.next(), Some("foo=\"bar,baz\""));
        assert_eq!(values.next(), Some("sherlock=holmes"));
        assert_eq!(values.next(), None);
    }

    #[test]
    fn semi_split_respects_quotes() {
        let mut values = split_semis("a; b=\"c;d\"; e");
        assert_eq!(values.next(), Some("a"));
        assert_eq!(values.next(), Some("b=\"c;d\""));
        assert_eq!(values.next(), Some("e"));
        assert_eq!(values.next(), None);
    }

    #[test]
    fn quoted_pairs_are_unescaped() {
        assert_eq!(unquote(r#""some \"quoted\" value""#), "some \"quoted\" value");
        assert_eq!(unquote("bare"), "bare");
    }

    #[test]
    fn param_names_are_lowercased() {
        assert_eq!(
            parse_param("Rel=type"),
            Some(("rel".to_owned(), "type".to_owned()))
        );
        assert_eq!(parse_param("re l=type"), None);
    }
}
