//! Request URL parsing
//!
//! Splits a request URI into path segments and query parameters.

use std::collections::HashMap;

/// Query parameters, last value wins for repeated keys
pub type QueryParams = HashMap<String, String>;

/// Path segments with the leading empty segment kept, so index 1 is the
/// controller name and index 2 the action name
pub fn path_segments(path: &str) -> Vec<&str> {
    path.split('/').collect()
}

/// Non-empty segment at `index`
pub fn segment<'a>(segments: &[&'a str], index: usize) -> Option<&'a str> {
    segments.get(index).copied().filter(|s| !s.is_empty())
}

/// Parse an `a=1&b=2` query string
pub fn parse_query(query: Option<&str>) -> QueryParams {
    let Some(query) = query else {
        return QueryParams::new();
    };

    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode(key), decode(value)),
            None => (decode(pair), String::new()),
        })
        .collect()
}

/// Decode `+` and `%XX` escapes; malformed escapes are kept verbatim
fn decode(input: &str) -> String {
    let spaced = input.replace('+', " ");
    String::from_utf8_lossy(&urlencoding::decode_binary(spaced.as_bytes())).into_owned()
}
