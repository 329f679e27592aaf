//! Shorthand constructors for operator trees.
//!
//! ```
//! use packrat_grammar::ops::*;
//!
//! // digits = [0-9]+
//! let digits = plus(range('0', '9'));
//! ```

use packrat_runtime::{Arg, Scope, Value};

use crate::ast::{Action, Operator, Pattern};
use crate::GrammarError;

pub fn dot() -> Operator {
    Operator::Dot
}

pub fn lit(s: &str) -> Operator {
    Operator::LiteralString(s.to_owned())
}

pub fn pattern(source: &str) -> Result<Operator, GrammarError> {
    Ok(Operator::LiteralPattern(Pattern::new(source)?))
}

pub fn range(lo: char, hi: char) -> Operator {
    Operator::CharRange(lo.to_string(), hi.to_string())
}

pub fn seq(ops: Vec<Operator>) -> Operator {
    Operator::Sequence(ops)
}

pub fn choice(ops: Vec<Operator>) -> Operator {
    Operator::Choice(ops)
}

pub fn repeat(op: Operator, min: usize, max: Option<usize>) -> Operator {
    Operator::Repeat {
        op: Box::new(op),
        min,
        max,
        captures: false,
    }
}

/// Like `repeat`, collecting each iteration's result into a list.
pub fn collect_repeat(op: Operator, min: usize, max: Option<usize>) -> Operator {
    Operator::Repeat {
        op: Box::new(op),
        min,
        max,
        captures: true,
    }
}

pub fn star(op: Operator) -> Operator {
    repeat(op, 0, None)
}

pub fn plus(op: Operator) -> Operator {
    repeat(op, 1, None)
}

pub fn opt(op: Operator) -> Operator {
    repeat(op, 0, Some(1))
}

pub fn and(op: Operator) -> Operator {
    Operator::AndPredicate(Box::new(op))
}

pub fn not(op: Operator) -> Operator {
    Operator::NotPredicate(Box::new(op))
}

pub fn tag(op: Operator, name: &str) -> Operator {
    Operator::Tag(Box::new(op), name.to_owned())
}

pub fn action(code: impl Fn(&Scope) -> Value + Send + Sync + 'static) -> Operator {
    Operator::Action(Action::new(code))
}

pub fn labeled_action(label: &str, code: impl Fn(&Scope) -> Value + Send + Sync + 'static) -> Operator {
    Operator::Action(Action::labeled(label, code))
}

pub fn collect(op: Operator) -> Operator {
    Operator::Collect(Box::new(op))
}

pub fn bounds(op: Operator) -> Operator {
    Operator::Bounds(Box::new(op))
}

pub fn call(rule: &str) -> Operator {
    Operator::RuleReference(rule.to_owned(), Vec::new())
}

pub fn call_with(rule: &str, args: Vec<Arg>) -> Operator {
    Operator::RuleReference(rule.to_owned(), args)
}

pub fn direct(rule: &str) -> Operator {
    Operator::DirectRuleCall(rule.to_owned(), Vec::new())
}

pub fn foreign(grammar: &str, rule: &str) -> Operator {
    Operator::ForeignRuleReference {
        grammar: grammar.to_owned(),
        rule: rule.to_owned(),
        args: Vec::new(),
    }
}

/// Argument read from the caller's bindings.
pub fn local(name: &str) -> Arg {
    Arg::Local(name.to_owned())
}

/// Constant argument.
pub fn value(v: impl Into<Value>) -> Arg {
    Arg::Value(v.into())
}
