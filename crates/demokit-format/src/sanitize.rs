//! File-stem sanitization for demonstration names.

/// Default upper bound on the length of a sanitized demonstration name.
pub const DEFAULT_MAX_NAME_LENGTH: usize = 16;

/// Strip every character that is not an ASCII letter or digit, then keep at
/// most `max_length` characters.
///
/// The result may be empty; callers that need a file stem must reject that.
pub fn sanitize(raw: &str, max_length: usize) -> String {
    raw.chars()
        .filter(char::is_ascii_alphanumeric)
        .take(max_length)
        .collect()
}
