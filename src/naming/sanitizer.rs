//! Turning proposed titles into safe file name stems.

/// Longest stem produced, in characters.
pub const MAX_TITLE_CHARS: usize = 100;

/// Longest stem produced, in UTF-8 bytes. Leaves room under the common
/// 255-byte file name limit for page and conflict suffixes and the extension.
pub const MAX_TITLE_BYTES: usize = 150;

/// Stem used when nothing usable survives sanitization.
pub const FALLBACK_TITLE: &str = "Scanned_Document";

const ILLEGAL_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

const SCAN_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".pdf"];

const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Sanitize a raw title into a file name stem.
///
/// The result never contains path separators or characters rejected by
/// common filesystems, has no whitespace, is at most [`MAX_TITLE_CHARS`]
/// characters and [`MAX_TITLE_BYTES`] bytes long and is never empty.
#[must_use]
pub fn sanitize_title(raw: &str) -> String {
    let cleaned: String = raw
        .chars()
        .filter(|c| !ILLEGAL_CHARS.contains(c) && !c.is_control())
        .collect();
    let cleaned = strip_scan_extension(cleaned.trim());

    let joined = cleaned.split_whitespace().collect::<Vec<_>>().join("_");
    let trimmed = trim_edges(&joined);

    let mut title = trim_edges(truncate(trimmed)).to_string();

    if title.is_empty() {
        return FALLBACK_TITLE.to_string();
    }

    if RESERVED_NAMES
        .iter()
        .any(|r| r.eq_ignore_ascii_case(&title))
    {
        title.push_str("_doc");
    }

    title
}

fn strip_scan_extension(title: &str) -> &str {
    let lower = title.to_ascii_lowercase();
    SCAN_EXTENSIONS
        .iter()
        .find(|ext| lower.ends_with(*ext))
        .map_or(title, |ext| &title[..title.len() - ext.len()])
}

/// Longest prefix within both length limits, cut on a char boundary.
fn truncate(s: &str) -> &str {
    let end = s
        .char_indices()
        .map(|(i, c)| i + c.len_utf8())
        .take(MAX_TITLE_CHARS)
        .take_while(|&end| end <= MAX_TITLE_BYTES)
        .last()
        .unwrap_or(0);
    &s[..end]
}

fn trim_edges(s: &str) -> &str {
    s.trim_matches(|c: char| c == '.' || c == '_' || c.is_whitespace())
}
