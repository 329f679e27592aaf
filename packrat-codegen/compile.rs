use packrat_grammar::{char_bounds, Grammar, Operator};
use packrat_runtime::{Arg, Engine, RuleId, RuleInfo, RuleResult, RuleSet, Scope, Value};
use std::fmt;
use std::sync::Arc;

use self::RuleResult::{Failed, Matched};

type Proc = Box<dyn Fn(&CompiledGrammar, &mut Engine<'_>, &mut Scope) -> RuleResult<Value> + Send + Sync>;

fn proc<F>(f: F) -> Proc
where
    F: Fn(&CompiledGrammar, &mut Engine<'_>, &mut Scope) -> RuleResult<Value> + Send + Sync + 'static,
{
    Box::new(f)
}

struct CompiledRule {
    params: Vec<String>,
    body: Proc,
}

/// A grammar whose rules have been compiled to closures.
///
/// Rule names, patterns and linked grammars are resolved once, when the
/// grammar is compiled, rather than on every evaluation.
pub struct CompiledGrammar {
    name: String,
    registry: Vec<RuleInfo>,
    root: RuleId,
    rules: Vec<CompiledRule>,
}

impl fmt::Debug for CompiledGrammar {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("CompiledGrammar")
            .field("name", &self.name)
            .field("rules", &self.registry)
            .field("root", &self.root)
            .finish()
    }
}

impl RuleSet for CompiledGrammar {
    fn name(&self) -> &str {
        &self.name
    }

    fn rules(&self) -> &[RuleInfo] {
        &self.registry
    }

    fn root(&self) -> Option<RuleId> {
        Some(self.root)
    }

    fn invoke_body(&self, engine: &mut Engine<'_>, rule: RuleId, args: &[Value]) -> RuleResult<Value> {
        match self.rules.get(rule.index()) {
            Some(rule) => {
                let mut scope = Scope::for_call(&rule.params, args);
                (rule.body)(self, engine, &mut scope)
            }
            None => Failed,
        }
    }
}

/// Compile every rule of `grammar` to a closure.
pub fn compile(grammar: &Grammar) -> CompiledGrammar {
    let rules: Vec<CompiledRule> = grammar
        .iter_rules()
        .map(|rule| CompiledRule {
            params: rule.params.clone(),
            body: compile_op(grammar, &rule.body),
        })
        .collect();

    log::debug!("compiled grammar `{}`: {} rules", grammar.name(), rules.len());

    CompiledGrammar {
        name: grammar.name().to_owned(),
        registry: grammar.rules().to_vec(),
        root: grammar.root_rule(),
        rules,
    }
}

fn compile_op(grammar: &Grammar, op: &Operator) -> Proc {
    match op {
        Operator::Dot => proc(|_, engine, _| match engine.get_char() {
            Some(c) => Matched(engine.pos(), Value::Char(c)),
            None => Failed,
        }),

        Operator::LiteralString(literal) => {
            let literal = literal.clone();
            proc(move |_, engine, _| match engine.match_string(&literal) {
                Some(m) => Matched(engine.pos(), Value::from(m)),
                None => Failed,
            })
        }

        Operator::LiteralPattern(pattern) => {
            let regex = pattern.regex().clone();
            proc(move |_, engine, _| match engine.scan(&regex) {
                Some(m) => Matched(engine.pos(), Value::from(m)),
                None => Failed,
            })
        }

        Operator::CharRange(lo, hi) => match char_bounds(lo, hi) {
            Some((lo, hi)) => proc(move |_, engine, _| match engine.char_range(lo, hi) {
                Some(c) => Matched(engine.pos(), Value::Char(c)),
                None => Failed,
            }),
            None => proc(|_, _, _| Failed),
        },

        Operator::Sequence(ops) => {
            let steps: Vec<Proc> = ops.iter().map(|op| compile_op(grammar, op)).collect();
            proc(move |g, engine, scope| {
                let start = engine.pos();
                let mark = scope.mark();
                let mut result = Value::Nil;
                for step in &steps {
                    match step(g, engine, scope) {
                        Matched(_, value) => result = value,
                        Failed => {
                            scope.rollback(mark);
                            engine.set_pos(start);
                            return Failed;
                        }
                    }
                }
                Matched(engine.pos(), result)
            })
        }

        Operator::Choice(ops) => {
            let alternatives: Vec<Proc> = ops.iter().map(|op| compile_op(grammar, op)).collect();
            proc(move |g, engine, scope| {
                for alternative in &alternatives {
                    if let Matched(end, value) = alternative(g, engine, scope) {
                        return Matched(end, value);
                    }
                }
                Failed
            })
        }

        Operator::Repeat { op, min, max, captures } => {
            let inner = compile_op(grammar, op);
            let (min, max, captures) = (*min, *max, *captures);
            proc(move |g, engine, scope| {
                let start = engine.pos();
                let mark = scope.mark();
                let mut count = 0;
                let mut items = Vec::new();
                let mut last = Value::Nil;

                loop {
                    if max.map_or(false, |max| count >= max) {
                        break;
                    }

                    let before = engine.pos();
                    match inner(g, engine, scope) {
                        Matched(end, value) => {
                            count += 1;
                            if captures {
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

                if count < min {
                    scope.rollback(mark);
                    engine.set_pos(start);
                    Failed
                } else if captures {
                    Matched(engine.pos(), Value::List(items))
                } else {
                    Matched(engine.pos(), last)
                }
            })
        }

        Operator::AndPredicate(op) => {
            if let Operator::Action(action) = op.as_ref() {
                let action = action.clone();
                return proc(move |_, engine, scope| {
                    let value = action.call(scope);
                    if value.is_truthy() {
                        Matched(engine.pos(), value)
                    } else {
                        Failed
                    }
                });
            }

            let inner = compile_op(grammar, op);
            proc(move |g, engine, scope| {
                let start = engine.pos();
                let mark = scope.mark();
                let res = inner(g, engine, scope);
                scope.rollback(mark);
                engine.set_pos(start);
                match res {
                    Matched(_, value) => Matched(start, value),
                    Failed => Failed,
                }
            })
        }

        Operator::NotPredicate(op) => {
            if let Operator::Action(action) = op.as_ref() {
                let action = action.clone();
                return proc(move |_, engine, scope| {
                    if action.call(scope).is_truthy() {
                        Failed
                    } else {
                        Matched(engine.pos(), Value::Nil)
                    }
                });
            }

            let inner = compile_op(grammar, op);
            proc(move |g, engine, scope| {
                let start = engine.pos();
                let mark = scope.mark();
                let res = inner(g, engine, scope);
                scope.rollback(mark);
                engine.set_pos(start);
                match res {
                    Matched(..) => Failed,
                    Failed => Matched(start, Value::Nil),
                }
            })
        }

        Operator::Tag(op, name) => {
            let inner = compile_op(grammar, op);
            let name = name.clone();
            proc(move |g, engine, scope| match inner(g, engine, scope) {
                Matched(end, value) => {
                    scope.bind(&name, value.clone());
                    Matched(end, value)
                }
                Failed => Failed,
            })
        }

        Operator::Action(action) => {
            let action = action.clone();
            proc(move |_, engine, scope| Matched(engine.pos(), action.call(scope)))
        }

        Operator::Collect(op) => {
            let inner = compile_op(grammar, op);
            proc(move |g, engine, scope| {
                let start = engine.pos();
                match inner(g, engine, scope) {
                    Matched(end, _) => {
                        let text = Value::from(engine.slice(start, end));
                        scope.bind("text", text.clone());
                        Matched(end, text)
                    }
                    Failed => Failed,
                }
            })
        }

        Operator::Bounds(op) => {
            let inner = compile_op(grammar, op);
            proc(move |g, engine, scope| {
                let start = engine.pos();
                match inner(g, engine, scope) {
                    Matched(end, _) => {
                        let span = Value::Span(start, end);
                        scope.bind("bounds", span.clone());
                        Matched(end, span)
                    }
                    Failed => Failed,
                }
            })
        }

        Operator::RuleReference(name, args) => match grammar.lookup(name) {
            Some(id) => {
                let args = args.clone();
                proc(move |g, engine, scope| engine.apply(g, id, &scope.resolve_args(&args)))
            }
            None => proc(|_, _, _| Failed),
        },

        Operator::DirectRuleCall(name, args) => match grammar.lookup(name) {
            Some(id) => {
                let args = args.clone();
                proc(move |g, engine, scope| engine.invoke(g, id, &scope.resolve_args(&args)))
            }
            None => proc(|_, _, _| Failed),
        },

        Operator::ForeignRuleReference { grammar: name, rule, args } => {
            compile_foreign(grammar, name, rule, args)
        }
    }
}

fn compile_foreign(grammar: &Grammar, name: &str, rule: &str, args: &[Arg]) -> Proc {
    let callee: Arc<dyn RuleSet> = match grammar.foreign_grammar(name) {
        Some(callee) => callee.clone(),
        None => return proc(|_, _, _| Failed),
    };
    let id = match callee.lookup(rule) {
        Some(id) => id,
        None => return proc(|_, _, _| Failed),
    };
    let name = name.to_owned();
    let args = args.to_vec();

    proc(move |_, engine, scope| engine.invoke_foreign(&name, callee.as_ref(), id, &scope.resolve_args(&args)))
}
