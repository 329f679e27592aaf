use packrat_runtime::regex::Regex;
use packrat_runtime::{ActionFn, Arg, RuleId, RuleInfo, RuleSet, Scope, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::GrammarError;

/// A semantic action supplied by the grammar author.
#[derive(Clone)]
pub struct Action {
    /// Source text or description shown when the grammar is rendered.
    pub label: Option<String>,
    pub code: Arc<ActionFn>,
}

impl Action {
    pub fn new(code: impl Fn(&Scope) -> Value + Send + Sync + 'static) -> Action {
        Action {
            label: None,
            code: Arc::new(code),
        }
    }

    pub fn labeled(label: impl Into<String>, code: impl Fn(&Scope) -> Value + Send + Sync + 'static) -> Action {
        Action {
            label: Some(label.into()),
            code: Arc::new(code),
        }
    }

    pub fn call(&self, scope: &Scope) -> Value {
        (self.code)(scope)
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match &self.label {
            Some(label) => write!(fmt, "Action({:?})", label),
            None => write!(fmt, "Action(..)"),
        }
    }
}

/// A regular expression matched at the current position.
#[derive(Clone, Debug)]
pub struct Pattern {
    source: String,
    regex: Regex,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Pattern, GrammarError> {
        let regex = Regex::new(&format!("^(?:{})", source)).map_err(|e| GrammarError::Pattern {
            pattern: source.to_owned(),
            message: e.to_string(),
        })?;

        Ok(Pattern {
            source: source.to_owned(),
            regex,
        })
    }

    /// The pattern as written, without the anchor.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn regex(&self) -> &Regex {
        &self.regex
    }
}

#[derive(Clone, Debug)]
pub enum Operator {
    Dot,
    LiteralString(String),
    LiteralPattern(Pattern),
    /// Bounds are kept as written so that multi-character bounds can be
    /// reported when the grammar is built.
    CharRange(String, String),
    Sequence(Vec<Operator>),
    Choice(Vec<Operator>),
    Repeat {
        op: Box<Operator>,
        min: usize,
        max: Option<usize>,
        captures: bool,
    },
    AndPredicate(Box<Operator>),
    NotPredicate(Box<Operator>),
    Tag(Box<Operator>, String),
    Action(Action),
    Collect(Box<Operator>),
    Bounds(Box<Operator>),
    RuleReference(String, Vec<Arg>),
    DirectRuleCall(String, Vec<Arg>),
    ForeignRuleReference {
        grammar: String,
        rule: String,
        args: Vec<Arg>,
    },
}

impl Operator {
    /// Direct children, in evaluation order.
    pub fn children(&self) -> &[Operator] {
        use self::Operator::*;
        match self {
            Sequence(ops) | Choice(ops) => ops,
            Repeat { op, .. } | AndPredicate(op) | NotPredicate(op) | Tag(op, _) | Collect(op) | Bounds(op) => {
                std::slice::from_ref(op.as_ref())
            }
            Dot
            | LiteralString(_)
            | LiteralPattern(_)
            | CharRange(..)
            | Action(_)
            | RuleReference(..)
            | DirectRuleCall(..)
            | ForeignRuleReference { .. } => &[],
        }
    }

    /// Visit this operator and all of its descendants, parents first.
    pub fn walk<'a>(&'a self, f: &mut impl FnMut(&'a Operator)) {
        f(self);
        for child in self.children() {
            child.walk(f);
        }
    }
}

/// The single characters of a range's bounds, if both are one character long.
pub fn char_bounds(lo: &str, hi: &str) -> Option<(char, char)> {
    fn single(s: &str) -> Option<char> {
        let mut chars = s.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Some(c),
            _ => None,
        }
    }
    Some((single(lo)?, single(hi)?))
}

#[derive(Clone, Debug)]
pub struct Rule {
    pub name: String,
    /// Position in declaration order.
    pub index: usize,
    pub params: Vec<String>,
    pub body: Operator,
    pub rendered: String,
}

/// A validated table of rules.
///
/// Rules refer to each other by name, so recursive and mutually recursive
/// grammars need no cyclic ownership.
pub struct Grammar {
    pub(crate) name: String,
    pub(crate) rules: Vec<Rule>,
    pub(crate) registry: Vec<RuleInfo>,
    pub(crate) index: HashMap<String, RuleId>,
    pub(crate) root: RuleId,
    pub(crate) foreign: HashMap<String, Arc<dyn RuleSet>>,
    pub(crate) left_recursion: Vec<Vec<String>>,
}

impl Grammar {
    pub fn builder(name: impl Into<String>) -> crate::GrammarBuilder {
        crate::GrammarBuilder::new(name)
    }

    pub fn iter_rules(&self) -> impl Iterator<Item = &Rule> {
        self.rules.iter()
    }

    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.index())
    }

    pub fn rule_named(&self, name: &str) -> Option<&Rule> {
        self.index.get(name).and_then(|id| self.rule(*id))
    }

    pub fn root_rule(&self) -> RuleId {
        self.root
    }

    pub fn foreign_grammar(&self, name: &str) -> Option<&Arc<dyn RuleSet>> {
        self.foreign.get(name)
    }

    /// Cycles of rules that call themselves before consuming input.
    pub fn left_recursive_rules(&self) -> &[Vec<String>] {
        &self.left_recursion
    }
}

impl fmt::Debug for Grammar {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        let mut foreign: Vec<&str> = self.foreign.keys().map(|k| k.as_str()).collect();
        foreign.sort();
        fmt.debug_struct("Grammar")
            .field("name", &self.name)
            .field("rules", &self.rules)
            .field("root", &self.root)
            .field("foreign", &foreign)
            .finish()
    }
}
