use packrat_runtime::error::ParseError;
use packrat_runtime::{Engine, Parser, RuleId, RuleInfo, RuleResult, RuleSet, Scope, Value};

use crate::ast::{char_bounds, Grammar, Operator};

impl Grammar {
    /// Parse the whole of `input` from the root rule.
    pub fn parse(&self, input: &str) -> Result<Value, ParseError> {
        packrat_runtime::parse(self, input)
    }

    pub fn parser<'g, 'input>(&'g self, input: &'input str) -> Parser<'g, 'input> {
        Parser::new(self, input)
    }

    /// Evaluate one operator at the engine's cursor.
    ///
    /// On a match the cursor is left at the returned end position. On failure it
    /// is back where it started.
    fn eval(&self, engine: &mut Engine<'_>, scope: &mut Scope, op: &Operator) -> RuleResult<Value> {
        use self::Operator::*;
        use self::RuleResult::*;

        let start = engine.pos();
        match op {
            Dot => match engine.get_char() {
                Some(c) => Matched(engine.pos(), Value::Char(c)),
                None => Failed,
            },
            LiteralString(literal) => match engine.match_string(literal) {
                Some(m) => Matched(engine.pos(), Value::from(m)),
                None => Failed,
            },
            LiteralPattern(pattern) => match engine.scan(pattern.regex()) {
                Some(m) => Matched(engine.pos(), Value::from(m)),
                None => Failed,
            },
            CharRange(lo, hi) => match char_bounds(lo, hi).and_then(|(lo, hi)| engine.char_range(lo, hi)) {
                Some(c) => Matched(engine.pos(), Value::Char(c)),
                None => Failed,
            },
            Sequence(ops) => {
                let mark = scope.mark();
                let mut result = Value::Nil;
                for op in ops {
                    match self.eval(engine, scope, op) {
                        Matched(_, value) => result = value,
                        Failed => {
                            scope.rollback(mark);
                            engine.set_pos(start);
                            return Failed;
                        }
                    }
                }
                Matched(engine.pos(), result)
            }
            Choice(ops) => {
                for op in ops {
                    if let Matched(end, value) = self.eval(engine, scope, op) {
                        return Matched(end, value);
                    }
                }
                Failed
            }
            Repeat { op, min, max, captures } => {
                let mark = scope.mark();
                let mut count = 0;
                let mut items = Vec::new();
                let mut last = Value::Nil;

                loop {
                    if let Some(max) = *max {
                        if count >= max {
                            break;
                        }
                    }

                    let before = engine.pos();
                    match self.eval(engine, scope, op) {
                        Matched(end, value) => {
                            count += 1;
                            if *captures {
                                items.push(value);
                            } else {
                                last = value;
                            }
                            if end == before && max.is_none() {
                                break;
                            }
                        }
                        Failed => break,
                    }
                }

                if count < *min {
                    scope.rollback(mark);
                    engine.set_pos(start);
                    return Failed;
                }

                let result = if *captures { Value::List(items) } else { last };
                Matched(engine.pos(), result)
            }
            AndPredicate(op) => {
                if let Action(action) = op.as_ref() {
                    let value = action.call(scope);
                    return if value.is_truthy() { Matched(start, value) } else { Failed };
                }

                let mark = scope.mark();
                let res = self.eval(engine, scope, op);
                scope.rollback(mark);
                engine.set_pos(start);
                match res {
                    Matched(_, value) => Matched(start, value),
                    Failed => Failed,
                }
            }
            NotPredicate(op) => {
                if let Action(action) = op.as_ref() {
                    return if action.call(scope).is_truthy() { Failed } else { Matched(start, Value::Nil) };
                }

                let mark = scope.mark();
                let res = self.eval(engine, scope, op);
                scope.rollback(mark);
                engine.set_pos(start);
                match res {
                    Matched(..) => Failed,
                    Failed => Matched(start, Value::Nil),
                }
            }
            Tag(op, name) => match self.eval(engine, scope, op) {
                Matched(end, value) => {
                    scope.bind(name, value.clone());
                    Matched(end, value)
                }
                Failed => Failed,
            },
            Action(action) => Matched(start, action.call(scope)),
            Collect(op) => match self.eval(engine, scope, op) {
                Matched(end, _) => {
                    let text = Value::from(engine.slice(start, end));
                    scope.bind("text", text.clone());
                    Matched(end, text)
                }
                Failed => Failed,
            },
            Bounds(op) => match self.eval(engine, scope, op) {
                Matched(end, _) => {
                    let span = Value::Span(start, end);
                    scope.bind("bounds", span.clone());
                    Matched(end, span)
                }
                Failed => Failed,
            },
            RuleReference(name, args) => match self.index.get(name) {
                Some(&id) => engine.apply(self, id, &scope.resolve_args(args)),
                None => Failed,
            },
            DirectRuleCall(name, args) => match self.index.get(name) {
                Some(&id) => engine.invoke(self, id, &scope.resolve_args(args)),
                None => Failed,
            },
            ForeignRuleReference { grammar, rule, args } => {
                let callee = match self.foreign.get(grammar) {
                    Some(callee) => callee.as_ref(),
                    None => return Failed,
                };
                match callee.lookup(rule) {
                    Some(id) => engine.invoke_foreign(grammar, callee, id, &scope.resolve_args(args)),
                    None => Failed,
                }
            }
        }
    }
}

impl RuleSet for Grammar {
    fn name(&self) -> &str {
        &self.name
    }

    fn rules(&self) -> &[RuleInfo] {
        &self.registry
    }

    fn root(&self) -> Option<RuleId> {
        Some(self.root)
    }

    fn lookup(&self, name: &str) -> Option<RuleId> {
        self.index.get(name).copied()
    }

    fn invoke_body(&self, engine: &mut Engine<'_>, rule: RuleId, args: &[Value]) -> RuleResult<Value> {
        let rule = match self.rules.get(rule.index()) {
            Some(rule) => rule,
            None => return RuleResult::Failed,
        };
        let mut scope = Scope::for_call(&rule.params, args);
        self.eval(engine, &mut scope, &rule.body)
    }
}

#[cfg(test)]
mod test {
    use crate::ops::*;
    use crate::Grammar;
    use packrat_runtime::Value;

    fn run(body: crate::Operator, input: &str) -> Option<(usize, Value)> {
        let g = Grammar::builder("t").rule("start", body).build().unwrap();
        let mut p = g.parser(input);
        if p.parse(None) {
            Some((p.pos(), p.result().clone()))
        } else {
            None
        }
    }

    #[test]
    fn repeat_results() {
        assert_eq!(run(star(dot()), ""), Some((0, Value::Nil)));
        assert_eq!(run(star(dot()), "ab"), Some((2, Value::Char('b'))));
        assert_eq!(
            run(collect_repeat(dot(), 0, Some(2)), "abc"),
            Some((2, Value::List(vec![Value::Char('a'), Value::Char('b')])))
        );
        assert_eq!(run(repeat(dot(), 3, None), "ab"), None);
    }

    #[test]
    fn predicates_restore_bindings() {
        let body = seq(vec![
            tag(lit("a"), "x"),
            and(tag(lit("b"), "x")),
            action(|s| s.value("x")),
        ]);
        assert_eq!(run(body, "ab"), Some((1, Value::from("a"))));
    }

    #[test]
    fn semantic_predicates() {
        let even = |s: &packrat_runtime::Scope| {
            let n: i64 = s.value("text").as_str().and_then(|t| t.parse().ok()).unwrap_or(1);
            Value::Bool(n % 2 == 0)
        };
        let body = seq(vec![collect(plus(range('0', '9'))), and(action(even))]);
        assert!(run(body.clone(), "42").is_some());
        assert!(run(body, "43").is_none());

        let odd = seq(vec![collect(plus(range('0', '9'))), not(action(even))]);
        assert!(run(odd, "43").is_some());
    }

    #[test]
    fn collect_and_bounds_bind_locals() {
        let body = seq(vec![
            lit(" "),
            bounds(collect(lit("ab"))),
            action(|s| Value::List(vec![s.value("text"), s.value("bounds")])),
        ]);
        assert_eq!(
            run(body, " ab"),
            Some((3, Value::List(vec![Value::from("ab"), Value::Span(1, 3)])))
        );
    }

    #[test]
    fn parameters_bind_arguments() {
        let g = Grammar::builder("t")
            .rule("start", seq(vec![tag(dot(), "c"), call_with("same", vec![local("c")])]))
            .rule_with_params("same", &["c"], seq(vec![tag(dot(), "d"), and(action(|s| Value::Bool(s.value("c") == s.value("d"))))]))
            .build()
            .unwrap();
        assert!(g.parse("aa").is_ok());
        assert!(g.parse("ab").is_err());
    }
}
