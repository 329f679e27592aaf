use packrat_runtime::RuleSet;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::ast::*;
use crate::GrammarError;

pub struct GrammarAnalysis<'a> {
    pub rules: HashMap<&'a str, &'a Rule>,
    pub errors: Vec<GrammarError>,
    /// Cycles of rules reachable from themselves without consuming input.
    pub left_recursion: Vec<Vec<String>>,
}

pub fn check<'a>(
    rules: &'a [Rule],
    foreign: &HashMap<String, Arc<dyn RuleSet>>,
) -> GrammarAnalysis<'a> {
    let mut by_name = HashMap::new();
    let mut errors = Vec::new();

    for rule in rules {
        if by_name.insert(rule.name.as_str(), rule).is_some() {
            errors.push(GrammarError::DuplicateRule(rule.name.clone()));
        }
    }

    ExpressionVisitor::check(rules, &by_name, foreign, &mut errors);

    let nullable = nullable_rules(rules, &by_name);
    LoopVisitor::check(rules, &by_name, &nullable, &mut errors);
    let left_recursion = RecursionVisitor::check(rules, &by_name, &nullable);

    GrammarAnalysis {
        rules: by_name,
        errors,
        left_recursion,
    }
}

struct ExpressionVisitor<'a, 'e> {
    rule: &'a str,
    rules: &'a HashMap<&'a str, &'a Rule>,
    foreign: &'a HashMap<String, Arc<dyn RuleSet>>,
    errors: &'e mut Vec<GrammarError>,
}

impl<'a, 'e> ExpressionVisitor<'a, 'e> {
    fn check(
        rules: &'a [Rule],
        by_name: &'a HashMap<&'a str, &'a Rule>,
        foreign: &'a HashMap<String, Arc<dyn RuleSet>>,
        errors: &mut Vec<GrammarError>,
    ) {
        for rule in rules {
            let mut visitor = ExpressionVisitor {
                rule: &rule.name,
                rules: by_name,
                foreign,
                errors: &mut *errors,
            };
            rule.body.walk(&mut |op| visitor.visit(op));
        }
    }

    fn visit(&mut self, this_expr: &Operator) {
        use self::Operator::*;
        match this_expr {
            CharRange(lo, hi) => {
                if char_bounds(lo, hi).is_none() {
                    self.errors.push(GrammarError::CharRange {
                        rule: self.rule.to_owned(),
                        lo: lo.clone(),
                        hi: hi.clone(),
                    });
                }
            }
            Choice(ops) if ops.is_empty() => {
                self.errors.push(GrammarError::EmptyChoice(self.rule.to_owned()));
            }
            Repeat { min, max: Some(max), .. } if min > max => {
                self.errors.push(GrammarError::RepeatBounds {
                    rule: self.rule.to_owned(),
                    min: *min,
                    max: *max,
                });
            }
            RuleReference(name, args) | DirectRuleCall(name, args) => match self.rules.get(name.as_str()) {
                Some(rule_def) => {
                    if rule_def.params.len() != args.len() {
                        self.errors.push(GrammarError::ArgumentCount {
                            rule: self.rule.to_owned(),
                            name: name.clone(),
                            expected: rule_def.params.len(),
                            found: args.len(),
                        });
                    }
                }
                None => self.errors.push(GrammarError::UndefinedRule {
                    rule: self.rule.to_owned(),
                    name: name.clone(),
                }),
            },
            ForeignRuleReference { grammar, rule, args } => match self.foreign.get(grammar) {
                Some(other) => match other.lookup(rule).and_then(|id| other.rule_info(id)) {
                    Some(info) => {
                        if info.params.len() != args.len() {
                            self.errors.push(GrammarError::ArgumentCount {
                                rule: self.rule.to_owned(),
                                name: format!("{}.{}", grammar, rule),
                                expected: info.params.len(),
                                found: args.len(),
                            });
                        }
                    }
                    None => self.errors.push(GrammarError::UndefinedForeignRule {
                        rule: self.rule.to_owned(),
                        grammar: grammar.clone(),
                        name: rule.clone(),
                    }),
                },
                None => self.errors.push(GrammarError::UnknownGrammar {
                    rule: self.rule.to_owned(),
                    grammar: grammar.clone(),
                }),
            },
            _ => {}
        }
    }
}

/// Compute which rules can match without consuming input.
///
/// This is a conservative heuristic: calls into other grammars and patterns
/// that cannot match the empty string are assumed to consume input.
fn nullable_rules(rules: &[Rule], by_name: &HashMap<&str, &Rule>) -> HashSet<String> {
    let mut nullable = HashSet::new();
    loop {
        let mut changed = false;
        for rule in rules {
            if !nullable.contains(&rule.name) && is_nullable(&rule.body, by_name, &nullable) {
                nullable.insert(rule.name.clone());
                changed = true;
            }
        }
        if !changed {
            return nullable;
        }
    }
}

fn is_nullable(this_expr: &Operator, by_name: &HashMap<&str, &Rule>, nullable: &HashSet<String>) -> bool {
    use self::Operator::*;
    match this_expr {
        Dot | LiteralString(_) | CharRange(..) | ForeignRuleReference { .. } => false,
        LiteralPattern(pattern) => pattern.regex().is_match(""),
        Sequence(ops) => ops.iter().all(|op| is_nullable(op, by_name, nullable)),
        Choice(ops) => ops.iter().any(|op| is_nullable(op, by_name, nullable)),
        Repeat { op, min, .. } => *min == 0 || is_nullable(op, by_name, nullable),
        AndPredicate(_) | NotPredicate(_) | Action(_) => true,
        Tag(op, _) | Collect(op) | Bounds(op) => is_nullable(op, by_name, nullable),
        RuleReference(name, _) | DirectRuleCall(name, _) => {
            by_name.contains_key(name.as_str()) && nullable.contains(name)
        }
    }
}

struct LoopVisitor;

impl LoopVisitor {
    fn check(
        rules: &[Rule],
        by_name: &HashMap<&str, &Rule>,
        nullable: &HashSet<String>,
        errors: &mut Vec<GrammarError>,
    ) {
        for rule in rules {
            rule.body.walk(&mut |op| {
                if let Operator::Repeat { op, max: None, .. } = op {
                    if is_nullable(op, by_name, nullable) {
                        errors.push(GrammarError::NullableLoop(rule.name.clone()));
                    }
                }
            });
        }
    }
}

struct RecursionVisitor<'a> {
    stack: Vec<String>,
    rules: &'a HashMap<&'a str, &'a Rule>,
    nullable: &'a HashSet<String>,
    found: Vec<Vec<String>>,
}

impl<'a> RecursionVisitor<'a> {
    fn check(
        rules: &'a [Rule],
        by_name: &'a HashMap<&'a str, &'a Rule>,
        nullable: &'a HashSet<String>,
    ) -> Vec<Vec<String>> {
        let mut visitor = RecursionVisitor {
            stack: Vec::new(),
            rules: by_name,
            nullable,
            found: Vec::new(),
        };

        for rule in rules {
            visitor.walk_rule(rule);
            debug_assert!(visitor.stack.is_empty());
        }

        visitor.found
    }

    fn walk_rule(&mut self, rule: &'a Rule) {
        self.stack.push(rule.name.clone());
        self.walk_expr(&rule.body);
        self.stack.pop();
    }

    /// Walk every operator that can run before `this_expr` consumes input.
    fn walk_expr(&mut self, this_expr: &'a Operator) {
        use self::Operator::*;
        match this_expr {
            RuleReference(name, _) | DirectRuleCall(name, _) => {
                if let Some(loop_start) = self.stack.iter().position(|caller| caller == name) {
                    // Only report each cycle once, from the rule it starts at.
                    if loop_start == 0 {
                        let mut recursive_loop = self.stack[loop_start..].to_vec();
                        recursive_loop.push(name.clone());
                        self.found.push(recursive_loop);
                    }
                    return;
                }

                if let Some(&rule) = self.rules.get(name.as_str()) {
                    self.walk_rule(rule);
                }
            }
            Sequence(ops) => {
                for op in ops {
                    self.walk_expr(op);
                    if !is_nullable(op, self.rules, self.nullable) {
                        break;
                    }
                }
            }
            Choice(ops) => {
                for op in ops {
                    self.walk_expr(op);
                }
            }
            Repeat { op, .. } | AndPredicate(op) | NotPredicate(op) | Tag(op, _) | Collect(op) | Bounds(op) => {
                self.walk_expr(op)
            }
            Dot | LiteralString(_) | LiteralPattern(_) | CharRange(..) | Action(_) | ForeignRuleReference { .. } => {}
        }
    }
}
