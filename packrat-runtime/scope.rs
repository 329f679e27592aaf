use crate::Value;

/// An author-supplied semantic action. It sees the bindings of the rule
/// invocation it runs in and produces the operator's result.
pub type ActionFn = dyn Fn(&Scope) -> Value + Send + Sync;

/// Local bindings of one rule invocation.
///
/// Tags, text captures and formal parameters live here. A new scope is created
/// for every invocation, so recursive calls never see each other's bindings.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scope {
    bindings: Vec<(String, Value)>,
}

impl Scope {
    pub fn new() -> Scope {
        Scope::default()
    }

    /// Scope for a rule call: parameters are bound to arguments in order.
    pub fn for_call(params: &[String], args: &[Value]) -> Scope {
        let mut scope = Scope::new();
        for (i, param) in params.iter().enumerate() {
            scope.bind(param, args.get(i).cloned().unwrap_or_default());
        }
        scope
    }

    pub fn bind(&mut self, name: &str, value: Value) {
        self.bindings.push((name.to_owned(), value));
    }

    /// The most recent binding of `name`.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Like `get`, but unbound names read as `Nil`.
    pub fn value(&self, name: &str) -> Value {
        self.get(name).cloned().unwrap_or_default()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.bindings.iter().map(|(n, _)| n.as_str())
    }

    pub fn mark(&self) -> usize {
        self.bindings.len()
    }

    /// Drop every binding made since `mark`.
    pub fn rollback(&mut self, mark: usize) {
        self.bindings.truncate(mark);
    }

    /// Evaluate call arguments in this scope.
    pub fn resolve_args(&self, args: &[Arg]) -> Vec<Value> {
        args.iter()
            .map(|arg| match arg {
                Arg::Value(v) => v.clone(),
                Arg::Local(name) => self.value(name),
            })
            .collect()
    }
}

/// An argument passed to a parameterized rule.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Arg {
    /// A constant value.
    Value(Value),
    /// A binding read from the caller's scope at call time.
    Local(String),
}
