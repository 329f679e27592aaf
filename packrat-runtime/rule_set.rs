use std::fmt;

use crate::{Engine, RuleResult, Value};

/// Index of a rule in its grammar's declaration order.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug, Hash)]
pub struct RuleId(pub usize);

impl RuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "#{}", self.0)
    }
}

/// Registry entry describing one rule, used for diagnostics.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct RuleInfo {
    /// The name the rule was declared with.
    pub name: String,
    /// The rule body rendered in PEG syntax.
    pub rendered: String,
    /// Names of the formal parameters, in order.
    pub params: Vec<String>,
}

impl RuleInfo {
    pub fn new(name: impl Into<String>, rendered: impl Into<String>) -> RuleInfo {
        RuleInfo {
            name: name.into(),
            rendered: rendered.into(),
            params: Vec::new(),
        }
    }
}

/// A table of rules that the engine can invoke.
///
/// Implemented by interpreted grammars, by compiled grammars and by generated
/// source. A rule set is immutable once built and is shared between parses.
pub trait RuleSet: Send + Sync {
    /// Name of the grammar, used to qualify foreign rule failures.
    fn name(&self) -> &str;

    /// Registry of every rule, indexed by `RuleId`.
    fn rules(&self) -> &[RuleInfo];

    /// The rule run when no start rule is given.
    fn root(&self) -> Option<RuleId>;

    /// Evaluate a rule body at the engine's current position.
    ///
    /// Implementations create a fresh binding scope for the call. Callers should
    /// go through `Engine::apply` or `Engine::invoke` rather than calling this
    /// directly, so that memoization and failure tracking take place.
    fn invoke_body(&self, engine: &mut Engine<'_>, rule: RuleId, args: &[Value]) -> RuleResult<Value>;

    fn lookup(&self, name: &str) -> Option<RuleId> {
        self.rules().iter().position(|r| r.name == name).map(RuleId)
    }

    fn rule_info(&self, rule: RuleId) -> Option<&RuleInfo> {
        self.rules().get(rule.index())
    }
}
