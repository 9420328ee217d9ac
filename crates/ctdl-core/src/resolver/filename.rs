//! Filename discovery from the resolved content URL.

use percent_encoding::percent_decode_str;

/// Used when the final URL carries no usable `downname`.
pub const DEFAULT_FILENAME: &str = "download_file";

const FILENAME_KEY: &str = "downname";
const NAME_MAX: usize = 255;

/// Extracts and decodes the `downname` query parameter of `url`.
///
/// Falls back to [`DEFAULT_FILENAME`] when the URL cannot be parsed or has no
/// non-empty `downname`. A value that does not decode cleanly (stray `%`,
/// invalid UTF-8) is returned still encoded.
pub fn filename_from_redirect(url: &str) -> String {
    match downname_param(url) {
        Some(raw) if !raw.is_empty() => decode_query_value(&raw),
        _ => {
            tracing::debug!(url, "no downname in final URL, using default filename");
            DEFAULT_FILENAME.to_string()
        }
    }
}

/// Raw (still encoded) value of the first `downname` pair.
fn downname_param(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let query = parsed.query()?;
    query.split('&').find_map(|pair| {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        (key == FILENAME_KEY).then(|| value.to_string())
    })
}

fn decode_query_value(raw: &str) -> String {
    if !has_valid_escapes(raw) {
        tracing::warn!(raw, "malformed percent escape in filename, keeping it encoded");
        return raw.to_string();
    }
    let spaced = raw.replace('+', " ");
    match percent_decode_str(&spaced).decode_utf8() {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => {
            tracing::warn!(raw, "filename is not UTF-8 after decoding, keeping it encoded");
            raw.to_string()
        }
    }
}

/// Every `%` must start a two-digit hex escape.
fn has_valid_escapes(raw: &str) -> bool {
    let bytes = raw.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let ok = bytes.len() > i + 2
                && bytes[i + 1].is_ascii_hexdigit()
                && bytes[i + 2].is_ascii_hexdigit();
            if !ok {
                return false;
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    true
}

/// Makes a remote filename safe to create in the working directory.
///
/// - Replaces NUL, `/`, `\`, and control characters with `_`
/// - Trims surrounding whitespace
/// - Limits length to 255 bytes (NAME_MAX)
/// - Falls back to [`DEFAULT_FILENAME`] for empty, `.` or `..`
pub fn local_filename(name: &str) -> String {
    let replaced: String = name
        .chars()
        .map(|c| {
            if c == '\0' || c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    let trimmed = replaced.trim();

    let mut take = trimmed.len().min(NAME_MAX);
    while take > 0 && !trimmed.is_char_boundary(take) {
        take -= 1;
    }
    let out = &trimmed[..take];

    if out.is_empty() || out == "." || out == ".." {
        DEFAULT_FILENAME.to_string()
    } else {
        out.to_string()
    }
}
