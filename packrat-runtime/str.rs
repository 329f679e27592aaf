//! Text primitives over `str` input.
//!
//! Positions are byte offsets into the input. One input unit is one `char`.

use regex::Regex;
use std::fmt::{self, Display};

use crate::RuleResult;

/// Line and column of a position, both 1-based and counted in `char`s.
#[derive(PartialEq, Eq, Debug, Clone, Copy)]
pub struct LineCol {
    /// Line (1-indexed)
    pub line: usize,

    /// Column (1-indexed)
    pub column: usize,

    /// Byte offset from start of string (0-indexed)
    pub offset: usize,
}

impl Display for LineCol {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "{}:{}", self.line, self.column)
    }
}

/// Compute the line and column of `pos`.
///
/// The line is one more than the number of newlines before `pos`; the column
/// is one more than the number of units since the last of those newlines.
pub fn position_repr(input: &str, pos: usize) -> LineCol {
    let pos = clamp_to_boundary(input, pos);
    let before = &input[..pos];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() + 1;

    LineCol {
        line,
        column,
        offset: pos,
    }
}

/// The full source line (without its newline) containing `pos`.
pub fn line_at(input: &str, pos: usize) -> &str {
    let pos = clamp_to_boundary(input, pos);
    let start = input[..pos].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let end = input[pos..].find('\n').map(|i| pos + i).unwrap_or(input.len());
    &input[start..end]
}

/// The unit at `pos`, or `Failed` at end of input.
pub fn parse_elem(input: &str, pos: usize) -> RuleResult<char> {
    match input.get(pos..).and_then(|rest| rest.chars().next()) {
        Some(c) => RuleResult::Matched(pos + c.len_utf8(), c),
        None => RuleResult::Failed,
    }
}

pub fn parse_string_literal(input: &str, pos: usize, literal: &str) -> RuleResult<()> {
    let l = literal.len();
    if input.len() >= pos + l && &input.as_bytes()[pos..pos + l] == literal.as_bytes() {
        RuleResult::Matched(pos + l, ())
    } else {
        RuleResult::Failed
    }
}

/// Match `pattern` against the input starting exactly at `pos`.
///
/// A match found later in the input is not a match at `pos`.
pub fn parse_pattern(input: &str, pos: usize, pattern: &Regex) -> RuleResult<()> {
    match input.get(pos..).and_then(|rest| pattern.find(rest)) {
        Some(m) if m.start() == 0 => RuleResult::Matched(pos + m.end(), ()),
        _ => RuleResult::Failed,
    }
}

fn clamp_to_boundary(input: &str, pos: usize) -> usize {
    let mut pos = pos.min(input.len());
    while !input.is_char_boundary(pos) {
        pos -= 1;
    }
    pos
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn line_and_column() {
        let input = "ab\ncd\n\nef";
        assert_eq!(position_repr(input, 0), LineCol { line: 1, column: 1, offset: 0 });
        assert_eq!(position_repr(input, 2), LineCol { line: 1, column: 3, offset: 2 });
        assert_eq!(position_repr(input, 3), LineCol { line: 2, column: 1, offset: 3 });
        assert_eq!(position_repr(input, 7), LineCol { line: 4, column: 1, offset: 7 });
        assert_eq!(position_repr(input, 9).column, 3);
    }

    #[test]
    fn columns_count_chars() {
        let input = "żółw!";
        assert_eq!(position_repr(input, "żółw".len()).column, 5);
    }

    #[test]
    fn source_line() {
        let input = "first\nsecond line\nthird";
        assert_eq!(line_at(input, 8), "second line");
        assert_eq!(line_at(input, 0), "first");
        assert_eq!(line_at(input, input.len()), "third");
    }

    #[test]
    fn elements() {
        assert_eq!(parse_elem("aé", 1), RuleResult::Matched(3, 'é'));
        assert_eq!(parse_elem("a", 1), RuleResult::Failed);
    }

    #[test]
    fn literals() {
        assert_eq!(parse_string_literal("foobar", 3, "bar"), RuleResult::Matched(6, ()));
        assert_eq!(parse_string_literal("foobar", 4, "bar"), RuleResult::Failed);
    }

    #[test]
    fn patterns_are_anchored() {
        let re = Regex::new("[0-9]+").unwrap();
        assert_eq!(parse_pattern("ab12", 2, &re), RuleResult::Matched(4, ()));
        assert_eq!(parse_pattern("ab12", 0, &re), RuleResult::Failed);
    }
}
