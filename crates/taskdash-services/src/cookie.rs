//! Cookie string helpers.

/// Look up `name` in a `Cookie` header value (`a=1; csrftoken=abc`).
///
/// Values are returned percent-decoded, the way browsers hand them to
/// scripts.
pub fn get_cookie(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .map(str::trim)
        .filter_map(|pair| pair.split_once('='))
        .find(|(key, _)| key.trim() == name)
        .map(|(_, value)| {
            percent_encoding::percent_decode_str(value.trim())
                .decode_utf8_lossy()
                .into_owned()
        })
}
