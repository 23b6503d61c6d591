/// Escape a value for use inside a single-quoted literal.
///
/// Apostrophes are doubled; NUL bytes, which the engine cannot store in a literal, become
/// `[NULL]`.
#[must_use]
pub fn escape_string(value: &str) -> String {
    value.replace('\'', "''").replace('\0', "[NULL]")
}

/// Quote a string literal, prefixed with `N` so it is read as unicode.
#[must_use]
pub fn quote_string(value: &str, unicode_prefix: bool) -> String {
    let prefix = if unicode_prefix { "N" } else { "" };
    format!("{prefix}'{}'", escape_string(value))
}

/// Quote an identifier with double quotes.
#[must_use]
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
