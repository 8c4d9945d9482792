//! Plain-text rendering of syntax failures

/// `file:line:col: message`, or `file:line: message` without a column
pub fn syntax_header(filename: &str, message: &str, line: usize, column: Option<usize>) -> String {
    match column {
        Some(column) => format!("{filename}:{line}:{column}: {message}"),
        None => format!("{filename}:{line}: {message}"),
    }
}

/// Last line of the offending text; an empty text has an empty last line.
pub fn last_line(text: &str) -> &str {
    text.lines().last().unwrap_or_default()
}

/// Blank out the line up to `column` (1-based, in characters) and point at it.
///
/// Whitespace is kept as-is so tabs still line up under the source line.
pub fn caret_line(line: &str, column: usize) -> String {
    let mut caret: String = line
        .chars()
        .take(column.saturating_sub(1))
        .map(|c| if c.is_whitespace() { c } else { ' ' })
        .collect();
    caret.push('^');
    caret
}

/// Convert a column measured against the whole `text` into one measured
/// against its last line.
pub fn legacy_column(text: &str, column: usize) -> usize {
    let shift = text.chars().count() as i64 - last_line(text).chars().count() as i64;
    (column as i64 - shift + 1).max(1) as usize
}
