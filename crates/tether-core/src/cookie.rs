//! Minimal Set-Cookie parsing.
//!
//! Only the leading `name=value` pair of each header is kept; attributes such
//! as `Path`, `Expires` or `HttpOnly` are dropped. This is not a cookie jar.

use std::collections::BTreeMap;

use crate::types::ResponseDescriptor;

/// Cookie name → value, built fresh from one response.
pub type CookieMap = BTreeMap<String, String>;

/// Parse Set-Cookie header values into a flat map.
///
/// `None` (no header present) yields an empty map. Later duplicates overwrite
/// earlier ones. Names are trimmed; values are kept exactly as sent.
pub fn parse_set_cookies<I, S>(header: Option<I>) -> CookieMap
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut cookies = CookieMap::new();
    for raw in header.into_iter().flatten() {
        let pair = raw.as_ref().split(';').next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            continue;
        };
        let name = name.trim();
        if name.is_empty() {
            continue;
        }
        cookies.insert(name.to_string(), value.to_string());
    }
    cookies
}

/// Parse the `set-cookie` header(s) of a response.
pub fn cookies_from_response(response: &ResponseDescriptor) -> CookieMap {
    parse_set_cookies(response.header("set-cookie").map(|v| v.values()))
}
