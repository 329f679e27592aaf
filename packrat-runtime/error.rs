//! Parse error reporting

use std::fmt::{self, Display};

use crate::str::{line_at, position_repr, LineCol};
use crate::{RuleId, RuleSet};

/// The rule blamed for the furthest failure.
#[derive(PartialEq, Eq, Debug, Clone, Hash)]
pub enum FailedRule {
    /// A rule registered in the grammar being parsed.
    Rule(RuleId),
    /// A rule of a linked grammar, qualified as `grammar.rule`.
    Foreign(String),
    /// The input continued past the end of a match that had to consume everything.
    EndOfInput,
    /// A start rule that the grammar does not define.
    Unknown(String),
}

impl FailedRule {
    /// Declared name of the rule, or its raw identifier if it is not registered.
    pub fn name<'a>(&'a self, rules: &'a dyn RuleSet) -> &'a str {
        match self {
            FailedRule::Rule(id) => match rules.rule_info(*id) {
                Some(info) => &info.name,
                None => "<unregistered>",
            },
            FailedRule::Foreign(name) | FailedRule::Unknown(name) => name,
            FailedRule::EndOfInput => "end of input",
        }
    }

    /// Rendered body of the rule, when it is registered.
    pub fn rendered<'a>(&'a self, rules: &'a dyn RuleSet) -> Option<&'a str> {
        match self {
            FailedRule::Rule(id) => rules.rule_info(*id).map(|info| info.rendered.as_str()),
            _ => None,
        }
    }
}

/// Tracks the furthest position at which a rule failed.
#[derive(Debug, Clone, Default)]
pub struct ErrorState {
    /// The rule that failed at `failing_offset`, if any rule failed at all.
    pub failed_rule: Option<FailedRule>,

    /// Furthest failure we've hit so far.
    pub failing_offset: usize,
}

impl ErrorState {
    pub fn new() -> Self {
        ErrorState::default()
    }

    /// Flag a failure of `rule` at `pos`.
    ///
    /// The record only moves forward. A failure at the recorded offset
    /// replaces the previous rule.
    #[inline]
    pub fn mark_failure(&mut self, rule: FailedRule, pos: usize) {
        if self.failed_rule.is_none() || pos >= self.failing_offset {
            self.failed_rule = Some(rule);
            self.failing_offset = pos;
        }
    }

    pub fn has_failure(&self) -> bool {
        self.failed_rule.is_some()
    }

    /// Build the error reported for a failed parse of `input`.
    pub fn into_parse_error(&self, input: &str, rules: &dyn RuleSet) -> ParseError {
        let rule = match &self.failed_rule {
            Some(rule) => rule.name(rules).to_owned(),
            None => "<unreported>".to_owned(),
        };

        ParseError {
            location: position_repr(input, self.failing_offset),
            rule,
            found: input.get(self.failing_offset..).and_then(|s| s.chars().next()),
        }
    }

    /// One line locating the failure and naming the failed rule and its body.
    pub fn failure_info(&self, input: &str, rules: &dyn RuleSet) -> String {
        let loc = position_repr(input, self.failing_offset);
        match &self.failed_rule {
            Some(rule) => match rule.rendered(rules) {
                Some(rendered) => format!(
                    "line {}, column {}: failed rule '{}' = '{}'",
                    loc.line,
                    loc.column,
                    rule.name(rules),
                    rendered
                ),
                None => format!(
                    "line {}, column {}: failed rule '{}'",
                    loc.line,
                    loc.column,
                    rule.name(rules)
                ),
            },
            None => format!("line {}, column {}: no rule failed", loc.line, loc.column),
        }
    }

    /// The failing source line with a caret under the failing column.
    pub fn failure_caret(&self, input: &str) -> String {
        let loc = position_repr(input, self.failing_offset);
        let line = line_at(input, self.failing_offset);
        format!("{}\n{}^", line, " ".repeat(loc.column - 1))
    }
}

/// A parse failure.
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct ParseError {
    /// The furthest position the parser reached in the input before failing.
    pub location: LineCol,

    /// Name of the rule that failed at that position.
    pub rule: String,

    /// The unit found at that position, `None` at end of input.
    pub found: Option<char>,
}

impl Display for ParseError {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "@{}:{} failed rule '{}', got ",
            self.location.line, self.location.column, self.rule
        )?;
        match self.found {
            Some(c) => write!(fmt, "'{}'", c),
            None => write!(fmt, "end of input"),
        }
    }
}

impl ::std::error::Error for ParseError {}
