//! Query-string serialization for GET mappings.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters left unescaped in a URI component: `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Percent-encode a single key or value.
pub fn encode_component(input: &str) -> String {
    utf8_percent_encode(input, COMPONENT).to_string()
}

/// Serialize `pairs` into `k=v&k=v`, skipping pairs whose value is `None`.
pub fn serialize<'a, I>(pairs: I) -> String
where
    I: IntoIterator<Item = (&'a str, Option<&'a str>)>,
{
    pairs
        .into_iter()
        .filter_map(|(key, value)| {
            value.map(|value| format!("{}={}", encode_component(key), encode_component(value)))
        })
        .collect::<Vec<_>>()
        .join("&")
}

/// Append a serialized query to `url`, using `&` when `url` already has a query.
///
/// An empty query leaves `url` untouched.
pub fn append(url: &str, query: &str) -> String {
    if query.is_empty() {
        return url.to_string();
    }
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{query}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_in_order() {
        let query = serialize([("a", Some("1")), ("b", Some("2"))]);
        assert_eq!(query, "a=1&b=2");
    }

    #[test]
    fn none_values_contribute_nothing() {
        let query = serialize([("a", None), ("b", Some("2")), ("c", None)]);
        assert_eq!(query, "b=2");
        assert_eq!(serialize([("only", None)]), "");
    }

    #[test]
    fn keys_and_values_are_percent_encoded() {
        let query = serialize([("a b", Some("x&y=z")), ("ü", Some("it's (ok)!"))]);
        assert_eq!(query, "a%20b=x%26y%3Dz&%C3%BC=it's%20(ok)!");
    }

    #[test]
    fn append_picks_separator() {
        assert_eq!(append("test", "a=1"), "test?a=1");
        assert_eq!(append("test?a=1", "b=2"), "test?a=1&b=2");
        assert_eq!(append("test", ""), "test");
    }
}
