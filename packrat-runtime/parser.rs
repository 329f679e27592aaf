use crate::error::{FailedRule, ParseError};
use crate::{Engine, RuleResult, RuleSet, Value};

/// Runs rules of one grammar against one input text.
///
/// Every call to `parse` starts from a fresh engine, so memoized results never
/// leak from one parse into the next.
pub struct Parser<'g, 'input> {
    rules: &'g dyn RuleSet,
    engine: Engine<'input>,
    require_eof: bool,
}

impl<'g, 'input> Parser<'g, 'input> {
    pub fn new(rules: &'g dyn RuleSet, input: &'input str) -> Parser<'g, 'input> {
        Parser {
            rules,
            engine: Engine::new(input),
            require_eof: false,
        }
    }

    /// Require the start rule to consume the whole input.
    ///
    /// Off by default: a rule that matches a prefix of the input succeeds.
    pub fn require_eof(mut self, require_eof: bool) -> Self {
        self.require_eof = require_eof;
        self
    }

    /// Run `start_rule`, or the grammar's root, at offset 0.
    pub fn parse(&mut self, start_rule: Option<&str>) -> bool {
        self.engine = Engine::new(self.engine.text());

        let rule = match start_rule {
            Some(name) => self.rules.lookup(name).ok_or_else(|| name.to_owned()),
            None => self.rules.root().ok_or_else(|| "root".to_owned()),
        };

        let rule = match rule {
            Ok(rule) => rule,
            Err(name) => {
                self.engine.mark_failure(FailedRule::Unknown(name), 0);
                return false;
            }
        };

        match self.engine.apply(self.rules, rule, &[]) {
            RuleResult::Matched(pos, value) => {
                if self.require_eof && pos < self.engine.text().len() {
                    self.engine.mark_failure(FailedRule::EndOfInput, pos);
                    return false;
                }
                self.engine.set_result(value);
                true
            }
            RuleResult::Failed => false,
        }
    }

    /// Value produced by the last successful parse.
    pub fn result(&self) -> &Value {
        self.engine.result()
    }

    pub fn pos(&self) -> usize {
        self.engine.pos()
    }

    pub fn engine(&self) -> &Engine<'input> {
        &self.engine
    }

    /// `@line:column failed rule 'name', got 'c'` for the furthest failure.
    pub fn failure_diagnostic(&self) -> String {
        self.raise_error().to_string()
    }

    pub fn failure_info(&self) -> String {
        self.engine.err_state().failure_info(self.engine.text(), self.rules)
    }

    pub fn failure_caret(&self) -> String {
        self.engine.err_state().failure_caret(self.engine.text())
    }

    /// The unit at the furthest failure, `None` at end of input.
    pub fn failure_character(&self) -> Option<char> {
        self.raise_error().found
    }

    pub fn raise_error(&self) -> ParseError {
        self.engine.err_state().into_parse_error(self.engine.text(), self.rules)
    }
}

/// Parse the whole of `input` with the grammar's root rule.
pub fn parse(rules: &dyn RuleSet, input: &str) -> Result<Value, ParseError> {
    let mut parser = Parser::new(rules, input).require_eof(true);
    if parser.parse(None) {
        Ok(parser.result().clone())
    } else {
        Err(parser.raise_error())
    }
}
