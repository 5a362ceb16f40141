//! Filename sanitization
//!
//! Turns an untrusted, client-supplied filename into a flat base name that is
//! safe to join onto the upload directory.

/// Name used when nothing usable survives sanitization
pub const FALLBACK_FILENAME: &str = "upload";

/// Longest name we store, in bytes
pub const MAX_FILENAME_LEN: usize = 255;

/// Device names Windows refuses to open as regular files
const RESERVED_STEMS: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Sanitize a client-supplied filename.
///
/// Keeps only the last path segment (either separator style), drops
/// non-ASCII characters, turns whitespace runs into `_`, keeps
/// `[A-Za-z0-9._-]`, collapses repeated dots and trims leading and trailing
/// `.`/`_`. The result is capped at [`MAX_FILENAME_LEN`] bytes and reserved
/// device stems get a `_` prefix.
///
/// Never returns an empty string, never returns anything containing a path
/// separator or starting with `.`, and `sanitize_filename(sanitize_filename(x))
/// == sanitize_filename(x)`.
pub fn sanitize_filename(raw: &str) -> String {
    let base = raw
        .split(['/', '\\'])
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .last()
        .unwrap_or("");

    let mut name = String::with_capacity(base.len());
    let mut pending_space = false;
    for c in base.chars().filter(char::is_ascii) {
        if c.is_ascii_whitespace() {
            pending_space = true;
            continue;
        }
        if !is_allowed(c) {
            continue;
        }
        if pending_space {
            name.push('_');
            pending_space = false;
        }
        if c == '.' && name.ends_with('.') {
            continue;
        }
        name.push(c);
    }

    let mut name = trim_edges(&name).to_string();
    if name.len() > MAX_FILENAME_LEN {
        // ASCII only at this point, so any byte index is a char boundary
        name.truncate(MAX_FILENAME_LEN);
        name = trim_edges(&name).to_string();
    }

    if name.is_empty() {
        return FALLBACK_FILENAME.to_string();
    }

    if is_reserved(&name) {
        name.insert(0, '_');
        if name.len() > MAX_FILENAME_LEN {
            name.truncate(MAX_FILENAME_LEN);
            name.truncate(name.trim_end_matches(['.', '_']).len());
        }
    }

    name
}

fn is_allowed(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

fn trim_edges(name: &str) -> &str {
    name.trim_matches(['.', '_'])
}

fn is_reserved(name: &str) -> bool {
    let stem = name.split('.').next().unwrap_or(name);
    RESERVED_STEMS
        .iter()
        .any(|reserved| reserved.eq_ignore_ascii_case(stem))
}
