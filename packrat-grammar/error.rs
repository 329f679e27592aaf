use thiserror::Error;

/// A malformed grammar, rejected before any parse is attempted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GrammarError {
    #[error("grammar `{0}` defines no rules")]
    Empty(String),

    #[error("duplicate rule `{0}`")]
    DuplicateRule(String),

    #[error("undefined rule `{name}` referenced from `{rule}`")]
    UndefinedRule { rule: String, name: String },

    #[error("root rule `{0}` is not defined")]
    UndefinedRoot(String),

    #[error("rule `{name}` takes {expected} parameters but {found} were supplied in `{rule}`")]
    ArgumentCount {
        rule: String,
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("unsupported char range [{lo}-{hi}] in `{rule}`: bounds must be single characters")]
    CharRange { rule: String, lo: String, hi: String },

    #[error("invalid pattern /{pattern}/: {message}")]
    Pattern { pattern: String, message: String },

    #[error("unknown grammar `{grammar}` referenced from `{rule}`")]
    UnknownGrammar { rule: String, grammar: String },

    #[error("grammar `{grammar}` has no rule `{name}` (referenced from `{rule}`)")]
    UndefinedForeignRule {
        rule: String,
        grammar: String,
        name: String,
    },

    #[error("empty choice in `{0}`")]
    EmptyChoice(String),

    #[error("repeat in `{rule}` has a minimum of {min} above its maximum of {max}")]
    RepeatBounds { rule: String, min: usize, max: usize },

    #[error("loop in `{0}` can match without consuming input and would never terminate")]
    NullableLoop(String),
}
