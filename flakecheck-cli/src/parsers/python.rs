//! Python front-end using rustpython-parser
//!
//! Compiles source text into a module AST, or describes precisely why it
//! could not: the line, the character column and the text of the line.

use crate::models::ParseFailure;
use line_numbers::LinePositions;
use rustpython_parser::ast::{Mod, Stmt, Suite};
use rustpython_parser::{parse, Mode};

/// A successfully parsed module plus what is needed to map offsets to lines.
pub struct Module {
    body: Suite,
    lines: LinePositions,
}

impl Module {
    pub fn body(&self) -> &[Stmt] {
        &self.body
    }

    /// 1-based line containing the byte `offset`.
    pub fn line_of(&self, offset: usize) -> usize {
        self.lines.from_offset(offset).as_usize() + 1
    }
}

/// Parse `source` as a Python module.
pub fn compile(source: &str, filename: &str) -> Result<Module, ParseFailure> {
    if source.contains('\0') {
        return Err(ParseFailure::decode_with(
            "source code string cannot contain null bytes",
        ));
    }

    match parse(source, Mode::Module, filename) {
        Ok(Mod::Module(module)) => Ok(Module {
            body: module.body,
            lines: LinePositions::from(source),
        }),
        Ok(_) => Err(ParseFailure::decode_with("parser did not produce a module")),
        Err(err) => Err(syntax_failure(
            source,
            usize::from(err.offset),
            err.error.to_string(),
        )),
    }
}

/// Decode raw file bytes into source text.
///
/// A leading UTF-8 byte-order mark is dropped.
pub fn decode(bytes: Vec<u8>) -> Result<String, ParseFailure> {
    let mut text = String::from_utf8(bytes).map_err(|_| ParseFailure::decode())?;
    if text.starts_with('\u{feff}') {
        text.drain(..'\u{feff}'.len_utf8());
    }
    Ok(text)
}

/// Where a syntax error sits in the source.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct Location<'s> {
    pub line: usize,
    pub column: usize,
    pub text: &'s str,
}

fn syntax_failure(source: &str, offset: usize, message: String) -> ParseFailure {
    // Without the offending line the parser's message is not trustworthy
    match locate(source, offset) {
        Some(loc) => ParseFailure::Syntax {
            message,
            line: loc.line,
            column: Some(loc.column),
            text: loc.text.to_string(),
        },
        None => ParseFailure::decode(),
    }
}

/// Resolve a byte offset into line, character column and line text.
///
/// Offsets just past a trailing newline (an unexpected end of file) are
/// attributed to the end of the last line.
pub(crate) fn locate(source: &str, offset: usize) -> Option<Location<'_>> {
    if offset > source.len() || !source.is_char_boundary(offset) {
        return None;
    }

    let mut at = offset;
    let mut start = line_start(source, at);
    if start == source.len() && start > 0 {
        at = start - 1;
        start = line_start(source, at);
    }

    let end = source[start..]
        .find('\n')
        .map_or(source.len(), |i| start + i);
    let text = source[start..end].trim_end_matches('\r');
    let line = source[..start].matches('\n').count() + 1;
    let column = source[start..at].chars().count() + 1;

    Some(Location { line, column, text })
}

fn line_start(source: &str, at: usize) -> usize {
    source[..at].rfind('\n').map_or(0, |i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compiles_valid_module() {
        let module = compile("import os\nx = 1\n", "mod.py").unwrap();
        assert_eq!(module.body().len(), 2);
        assert_eq!(module.line_of(10), 2);
    }

    #[test]
    fn test_empty_source_is_an_empty_module() {
        let module = compile("", "empty.py").unwrap();
        assert!(module.body().is_empty());
    }

    #[test]
    fn test_syntax_error_carries_line_and_text() {
        match compile("def f(:\n", "bad.py") {
            Err(ParseFailure::Syntax {
                line, column, text, ..
            }) => {
                assert_eq!(line, 1);
                assert_eq!(text, "def f(:");
                assert!(column.is_some());
            }
            Err(other) => panic!("expected syntax failure, got {other:?}"),
            Ok(_) => panic!("expected syntax failure"),
        }
    }

    #[test]
    fn test_syntax_error_on_later_line() {
        match compile("x = 1\ny = (\n", "bad.py") {
            Err(ParseFailure::Syntax { line, .. }) => assert!(line >= 2),
            Err(other) => panic!("expected syntax failure, got {other:?}"),
            Ok(_) => panic!("expected syntax failure"),
        }
    }

    #[test]
    fn test_null_bytes_are_a_decode_failure() {
        let err = compile("x = 1\0\n", "nul.py").err();
        assert_eq!(
            err,
            Some(ParseFailure::decode_with(
                "source code string cannot contain null bytes"
            ))
        );
    }

    #[test]
    fn test_locate_counts_characters_not_bytes() {
        let source = "s = 'ééé' +\n";
        let offset = source.find('+').unwrap();
        let loc = locate(source, offset).unwrap();
        assert_eq!(loc.line, 1);
        assert_eq!(loc.column, 11);
        assert_eq!(loc.text, "s = 'ééé' +");
    }

    #[test]
    fn test_locate_end_of_file_points_at_last_line() {
        let source = "a = 1\nb = (\n";
        let loc = locate(source, source.len()).unwrap();
        assert_eq!(loc.line, 2);
        assert_eq!(loc.text, "b = (");
        assert_eq!(loc.column, 6);
    }

    #[test]
    fn test_locate_out_of_range_is_none() {
        assert_eq!(locate("abc", 10), None);
        assert_eq!(locate("é", 1), None);
    }

    #[test]
    fn test_decode_strips_bom_and_rejects_invalid_utf8() {
        assert_eq!(decode(b"\xef\xbb\xbfx = 1\n".to_vec()).unwrap(), "x = 1\n");
        assert_eq!(decode(vec![0xff, 0xfe, 0x00]), Err(ParseFailure::decode()));
    }
}
