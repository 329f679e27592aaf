use regex::Regex;
use std::collections::HashMap;

use crate::error::{ErrorState, FailedRule};
use crate::str::{parse_elem, parse_pattern, parse_string_literal};
use crate::{RuleId, RuleResult, RuleSet, Value};

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct MemoKey {
    rule: RuleId,
    pos: usize,
    args: Vec<Value>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum Answer {
    /// The rule is being evaluated at this position. `detected` is set when it
    /// calls itself there before producing a seed.
    LeftRecursion { detected: bool },
    Matched,
    Failed,
}

/// Memoized outcome of one rule at one position.
#[derive(Clone, Debug)]
pub struct MemoEntry {
    ans: Answer,
    pos: usize,
    uses: usize,
    result: Value,
}

impl MemoEntry {
    fn new(pos: usize) -> MemoEntry {
        MemoEntry {
            ans: Answer::LeftRecursion { detected: false },
            pos,
            uses: 1,
            result: Value::Nil,
        }
    }

    fn do_move(&mut self, ans: Answer, pos: usize, result: Value) {
        self.ans = ans;
        self.pos = pos;
        self.result = result;
    }

    /// How many times this entry was created or looked up.
    pub fn uses(&self) -> usize {
        self.uses
    }

    /// End position of the recorded answer.
    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn result(&self) -> &Value {
        &self.result
    }

    pub fn is_matched(&self) -> bool {
        self.ans == Answer::Matched
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self.ans, Answer::LeftRecursion { .. })
    }
}

/// State of one parse: the input, the cursor, the memo table and the
/// furthest failure.
///
/// Every operation that fails leaves the cursor where it found it.
#[derive(Debug)]
pub struct Engine<'input> {
    input: &'input str,
    pos: usize,
    memo: HashMap<MemoKey, MemoEntry>,
    err_state: ErrorState,
    result: Value,
}

impl<'input> Engine<'input> {
    pub fn new(input: &'input str) -> Engine<'input> {
        Engine::at(input, 0)
    }

    /// An engine whose cursor starts at `pos`.
    pub fn at(input: &'input str, pos: usize) -> Engine<'input> {
        Engine {
            input,
            pos,
            memo: HashMap::new(),
            err_state: ErrorState::new(),
            result: Value::Nil,
        }
    }

    pub fn text(&self) -> &'input str {
        self.input
    }

    pub fn pos(&self) -> usize {
        self.pos
    }

    pub fn set_pos(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Result of the most recently matched rule.
    pub fn result(&self) -> &Value {
        &self.result
    }

    pub fn set_result(&mut self, result: Value) {
        self.result = result;
    }

    pub fn err_state(&self) -> &ErrorState {
        &self.err_state
    }

    pub fn mark_failure(&mut self, rule: FailedRule, pos: usize) {
        self.err_state.mark_failure(rule, pos);
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// The remaining input from `start`.
    pub fn get_text(&self, start: usize) -> &'input str {
        self.input.get(start..).unwrap_or("")
    }

    /// The input between two offsets.
    pub fn slice(&self, start: usize, end: usize) -> &'input str {
        self.input.get(start..end).unwrap_or("")
    }

    /// Read one unit and advance past it, or `None` at end of input.
    pub fn get_char(&mut self) -> Option<char> {
        match parse_elem(self.input, self.pos) {
            RuleResult::Matched(next, c) => {
                self.pos = next;
                Some(c)
            }
            RuleResult::Failed => None,
        }
    }

    /// Read one unit whose ordinal lies in `[lo, hi]`.
    pub fn char_range(&mut self, lo: char, hi: char) -> Option<char> {
        match parse_elem(self.input, self.pos) {
            RuleResult::Matched(next, c) if lo <= c && c <= hi => {
                self.pos = next;
                Some(c)
            }
            _ => None,
        }
    }

    pub fn match_string(&mut self, literal: &str) -> Option<&'input str> {
        match parse_string_literal(self.input, self.pos, literal) {
            RuleResult::Matched(end, ()) => {
                let matched = &self.input[self.pos..end];
                self.pos = end;
                Some(matched)
            }
            RuleResult::Failed => None,
        }
    }

    /// Match `pattern` anchored at the cursor.
    pub fn scan(&mut self, pattern: &Regex) -> Option<&'input str> {
        match parse_pattern(self.input, self.pos, pattern) {
            RuleResult::Matched(end, ()) => {
                let matched = &self.input[self.pos..end];
                self.pos = end;
                Some(matched)
            }
            RuleResult::Failed => None,
        }
    }

    /// The cursor with up to ten units of context on each side.
    pub fn show_pos(&self) -> String {
        const WIDTH: usize = 10;
        let before = &self.input[..self.pos];
        let after: String = self.input[self.pos..].chars().take(WIDTH).collect();
        let count = before.chars().count();

        if count < WIDTH {
            format!("{} (\"{}\" @ \"{}\")", self.pos, before, after)
        } else {
            let tail: String = before.chars().skip(count - WIDTH).collect();
            format!("{} (\"... {}\" @ \"{}\")", self.pos, tail, after)
        }
    }

    /// Memo entry of an argument-less rule at `pos`.
    pub fn memo_entry(&self, rule: RuleId, pos: usize) -> Option<&MemoEntry> {
        self.memo.get(&MemoKey {
            rule,
            pos,
            args: Vec::new(),
        })
    }

    pub fn memo_uses(&self, rule: RuleId, pos: usize) -> Option<usize> {
        self.memo_entry(rule, pos).map(MemoEntry::uses)
    }

    /// Invoke a rule through the memo table, growing left recursive seeds.
    pub fn apply(&mut self, rules: &dyn RuleSet, rule: RuleId, args: &[Value]) -> RuleResult<Value> {
        let key = MemoKey {
            rule,
            pos: self.pos,
            args: args.to_vec(),
        };

        if let Some(m) = self.memo.get_mut(&key) {
            m.uses += 1;
            self.pos = m.pos;

            return match &mut m.ans {
                Answer::LeftRecursion { detected } => {
                    *detected = true;
                    peg_trace!("Left recursion of rule {} detected at {}", rule, key.pos);
                    RuleResult::Failed
                }
                Answer::Matched => {
                    peg_trace!("Cached match of rule {} at {}", rule, key.pos);
                    self.result = m.result.clone();
                    RuleResult::Matched(m.pos, m.result.clone())
                }
                Answer::Failed => {
                    peg_trace!("Cached fail of rule {} at {}", rule, key.pos);
                    RuleResult::Failed
                }
            };
        }

        let start_pos = self.pos;
        self.memo.insert(key.clone(), MemoEntry::new(start_pos));

        let res = self.invoke(rules, rule, args);

        let detected = match self.memo.get_mut(&key) {
            Some(m) => {
                let detected = m.ans == Answer::LeftRecursion { detected: true };
                match &res {
                    RuleResult::Matched(end, value) => m.do_move(Answer::Matched, *end, value.clone()),
                    RuleResult::Failed => m.do_move(Answer::Failed, start_pos, Value::Nil),
                }
                detected
            }
            None => false,
        };

        // Without a seed there is nothing to grow.
        if detected && res.is_matched() {
            return self.grow_lr(rules, rule, args, &key);
        }

        res
    }

    fn grow_lr(&mut self, rules: &dyn RuleSet, rule: RuleId, args: &[Value], key: &MemoKey) -> RuleResult<Value> {
        loop {
            let (best_pos, best) = match self.memo.get(key) {
                Some(m) => (m.pos, m.result.clone()),
                None => break,
            };

            self.pos = key.pos;
            self.result = best;
            peg_trace!("Growing left recursive rule {} at {} past {}", rule, key.pos, best_pos);

            match self.invoke(rules, rule, args) {
                RuleResult::Matched(end, value) if end > best_pos => {
                    if let Some(m) = self.memo.get_mut(key) {
                        m.do_move(Answer::Matched, end, value);
                    }
                }
                _ => break,
            }
        }

        match self.memo.get(key) {
            Some(m) => {
                self.pos = m.pos;
                self.result = m.result.clone();
                RuleResult::Matched(m.pos, m.result.clone())
            }
            None => {
                self.pos = key.pos;
                RuleResult::Failed
            }
        }
    }

    /// Invoke a rule body directly, without consulting the memo table.
    ///
    /// A failing rule is recorded at the position it was invoked from.
    pub fn invoke(&mut self, rules: &dyn RuleSet, rule: RuleId, args: &[Value]) -> RuleResult<Value> {
        let start = self.pos;
        peg_trace!("Attempting to match rule {} at {}", rule_name(rules, rule), start);

        match rules.invoke_body(self, rule, args) {
            RuleResult::Matched(end, value) => {
                peg_trace!("Matched rule {} at {} to {}", rule_name(rules, rule), start, end);
                self.pos = end;
                self.result = value.clone();
                RuleResult::Matched(end, value)
            }
            RuleResult::Failed => {
                peg_trace!("Failed to match rule {} at {}", rule_name(rules, rule), start);
                self.pos = start;
                self.err_state.mark_failure(FailedRule::Rule(rule), start);
                RuleResult::Failed
            }
        }
    }

    /// Invoke a rule of another grammar, linked as `grammar`, on this engine's
    /// input and position.
    ///
    /// The callee runs on its own engine state. On success the caller adopts its
    /// end position and result; on failure `grammar.rule` is recorded here.
    pub fn invoke_foreign(
        &mut self,
        grammar: &str,
        callee: &dyn RuleSet,
        rule: RuleId,
        args: &[Value],
    ) -> RuleResult<Value> {
        peg_trace!("Invoking foreign rule {}.{} at {}", grammar, rule_name(callee, rule), self.pos);
        let mut sub = Engine::at(self.input, self.pos);

        match sub.apply(callee, rule, args) {
            RuleResult::Matched(end, value) => {
                self.pos = end;
                self.result = value.clone();
                RuleResult::Matched(end, value)
            }
            RuleResult::Failed => {
                let name = format!("{}.{}", grammar, rule_name(callee, rule));
                self.err_state.mark_failure(FailedRule::Foreign(name), self.pos);
                RuleResult::Failed
            }
        }
    }
}

fn rule_name(rules: &dyn RuleSet, rule: RuleId) -> &str {
    match rules.rule_info(rule) {
        Some(info) => &info.name,
        None => "?",
    }
}
