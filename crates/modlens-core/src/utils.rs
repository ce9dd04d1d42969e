//! Path and identifier helpers shared by the resolver and the analyzer.

use std::path::Path;

use url::Url;

use crate::builtins::BuiltinModules;
use crate::error::Error;

pub use modlens_util::path::normalize_slash;

/// Convert a `file://` URL to a slash-normalized path.
///
/// Anything that is not a file URL is slash-normalized and returned as-is.
pub fn file_url_to_path(id: &str) -> Result<String, Error> {
    if !id.starts_with("file://") {
        return Ok(normalize_slash(id));
    }
    let url = Url::parse(id).map_err(|e| Error::invalid_specifier(id, e.to_string()))?;
    let path = url
        .to_file_path()
        .map_err(|()| Error::invalid_specifier(id, "not a valid file URL"))?;
    Ok(normalize_slash(&path.to_string_lossy()))
}

/// Convert a path (or file URL) to a `file://` URL string.
///
/// Relative paths are made absolute against the working directory.
/// Reserved characters such as `#`, `?` and `%` are percent-encoded.
pub fn path_to_file_url(id: &str) -> Result<String, Error> {
    let path = file_url_to_path(id)?;
    let absolute = std::path::absolute(Path::new(&path))?;
    Url::from_file_path(&absolute)
        .map(String::from)
        .map_err(|()| Error::invalid_specifier(id, "cannot be expressed as a file URL"))
}

const ID_PROTOCOLS: &[&str] = &["node:", "data:", "http:", "https:", "file:"];

/// Give an id a protocol: builtins become `node:<id>`, paths become
/// URI-encoded `file://` URLs, ids with a known protocol are unchanged.
#[must_use]
pub fn normalize_id(id: &str, builtins: &BuiltinModules) -> String {
    if ID_PROTOCOLS.iter().any(|protocol| id.starts_with(protocol)) {
        return id.to_string();
    }
    if builtins.contains(id) && !id.contains('/') {
        return format!("node:{id}");
    }
    format!("file://{}", encode_uri(&normalize_slash(id)))
}

/// Percent-encode everything `encodeURI` would: all but unreserved and
/// reserved URI characters.
fn encode_uri(input: &str) -> String {
    const KEEP: &[u8] = b"-_.!~*'();/?:@&=+$,#";
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        if byte.is_ascii_alphanumeric() || KEEP.contains(&byte) {
            out.push(char::from(byte));
        } else {
            out.push_str(&format!("%{byte:02X}"));
        }
    }
    out
}

/// Whether `id` names a builtin module, with or without `node:` and subpath.
#[must_use]
pub fn is_node_builtin(id: &str, builtins: &BuiltinModules) -> bool {
    builtins.contains(id)
}

/// The protocol of `id`, if any.
///
/// A protocol is at least two characters, so a Windows drive letter
/// (`C:/x`) is not one. The text after the colon must be non-empty.
#[must_use]
pub fn get_protocol(id: &str) -> Option<&str> {
    if id.contains(['\n', '\r', '\u{2028}', '\u{2029}']) {
        return None;
    }
    for (i, _) in id.match_indices(':') {
        if id[..i].chars().count() >= 2 {
            return (i + 1 < id.len()).then(|| &id[..i]);
        }
    }
    None
}

fn is_invalid_uri_char(c: char) -> bool {
    c.is_ascii_control() || "\"#$&*+,/:;<=>?@[]^`{|}".contains(c)
}

/// Replace runs of characters that are not valid in a URI component, and
/// every `%xx` escape, with `replacement`.
#[must_use]
pub fn sanitize_uri_component(name: &str, replacement: &str) -> String {
    let mut collapsed = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.chars() {
        if is_invalid_uri_char(c) {
            if !in_run {
                collapsed.push_str(replacement);
            }
            in_run = true;
        } else {
            collapsed.push(c);
            in_run = false;
        }
    }

    let mut out = String::with_capacity(collapsed.len());
    let mut rest = collapsed.as_str();
    while let Some(i) = rest.find('%') {
        out.push_str(&rest[..i]);
        let escape = &rest[i..];
        match escape.char_indices().nth(3) {
            Some((end, _)) => {
                out.push_str(replacement);
                rest = &escape[end..];
            }
            None if escape.chars().count() == 3 => {
                out.push_str(replacement);
                rest = "";
            }
            None => {
                out.push_str(escape);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Sanitize every segment of a file path, dropping any query string.
#[must_use]
pub fn sanitize_file_path(file_path: &str) -> String {
    let without_query = file_path.split('?').next().unwrap_or_default();
    let joined = without_query
        .split(['/', '\\'])
        .map(|segment| sanitize_uri_component(segment, "_"))
        .collect::<Vec<_>>()
        .join("/");

    let bytes = joined.as_bytes();
    if bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && &bytes[1..3] == b"_/" {
        format!("{}:{}", &joined[..1], &joined[2..])
    } else {
        joined
    }
}

/// Read the UTF-8 text at a file URL or path.
pub fn load_url_sync(url: &str) -> Result<String, Error> {
    let path = file_url_to_path(url)?;
    Ok(std::fs::read_to_string(path)?)
}

/// Read the UTF-8 text at a file URL or path without blocking the runtime.
pub async fn load_url(url: &str) -> Result<String, Error> {
    let path = file_url_to_path(url)?;
    Ok(tokio::fs::read_to_string(path).await?)
}
