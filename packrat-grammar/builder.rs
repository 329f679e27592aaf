use packrat_runtime::{RuleId, RuleInfo, RuleSet};
use std::collections::HashMap;
use std::sync::Arc;

use crate::analysis;
use crate::ast::{Grammar, Operator, Rule};
use crate::render::render;
use crate::GrammarError;

/// Collects rules and linked grammars, then validates them into a `Grammar`.
///
/// ```
/// use packrat_grammar::{ops::*, Grammar};
///
/// let grammar = Grammar::builder("digits")
///     .rule("number", collect(plus(range('0', '9'))))
///     .build()
///     .unwrap();
/// assert_eq!(grammar.rule_named("number").unwrap().rendered, "< [0-9]+ >");
/// ```
pub struct GrammarBuilder {
    name: String,
    rules: Vec<(String, Vec<String>, Operator)>,
    root: Option<String>,
    foreign: Vec<(String, Arc<dyn RuleSet>)>,
}

impl GrammarBuilder {
    pub fn new(name: impl Into<String>) -> GrammarBuilder {
        GrammarBuilder {
            name: name.into(),
            rules: Vec::new(),
            root: None,
            foreign: Vec::new(),
        }
    }

    pub fn rule(self, name: &str, body: Operator) -> GrammarBuilder {
        self.rule_with_params(name, &[], body)
    }

    /// Declare a rule taking formal parameters, bound in order to the
    /// arguments of each call.
    pub fn rule_with_params(mut self, name: &str, params: &[&str], body: Operator) -> GrammarBuilder {
        let params = params.iter().map(|p| (*p).to_owned()).collect();
        self.rules.push((name.to_owned(), params, body));
        self
    }

    /// Rule run when a parse names no start rule.
    pub fn root(mut self, name: &str) -> GrammarBuilder {
        self.root = Some(name.to_owned());
        self
    }

    /// Make the rules of `grammar` callable as `%name.rule`.
    pub fn link(mut self, name: &str, grammar: Arc<dyn RuleSet>) -> GrammarBuilder {
        self.foreign.push((name.to_owned(), grammar));
        self
    }

    pub fn build(self) -> Result<Grammar, GrammarError> {
        if self.rules.is_empty() {
            return Err(GrammarError::Empty(self.name));
        }

        let rules: Vec<Rule> = self
            .rules
            .into_iter()
            .enumerate()
            .map(|(index, (name, params, body))| Rule {
                rendered: render(&body),
                name,
                index,
                params,
                body,
            })
            .collect();

        let foreign: HashMap<String, Arc<dyn RuleSet>> = self.foreign.into_iter().collect();

        let left_recursion = {
            let analysis = analysis::check(&rules, &foreign);
            if let Some(err) = analysis.errors.into_iter().next() {
                return Err(err);
            }
            analysis.left_recursion
        };

        let mut index = HashMap::new();
        for rule in &rules {
            index.insert(rule.name.clone(), RuleId(rule.index));
        }

        let root = match &self.root {
            Some(name) => *index
                .get(name)
                .ok_or_else(|| GrammarError::UndefinedRoot(name.clone()))?,
            None => index.get("root").copied().unwrap_or(RuleId(0)),
        };

        for cycle in &left_recursion {
            log::debug!("grammar `{}`: left recursive rules {}", self.name, cycle.join(" -> "));
        }
        log::debug!(
            "grammar `{}`: {} rules, root `{}`",
            self.name,
            rules.len(),
            rules[root.index()].name
        );

        let registry = rules
            .iter()
            .map(|rule| RuleInfo {
                name: rule.name.clone(),
                rendered: rule.rendered.clone(),
                params: rule.params.clone(),
            })
            .collect();

        Ok(Grammar {
            name: self.name,
            rules,
            registry,
            index,
            root,
            foreign,
            left_recursion,
        })
    }
}
