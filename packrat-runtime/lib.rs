macro_rules! peg_trace {
    ($($arg:tt)*) => {
        #[cfg(feature = "trace")]
        ::log::trace!(target: "packrat", "[PEG_TRACE] {}", format_args!($($arg)*));
    };
}

mod engine;
pub mod error;
mod parser;
mod rule_set;
mod scope;
pub mod str;
mod value;

pub use crate::engine::{Engine, MemoEntry};
pub use crate::parser::{parse, Parser};
pub use crate::rule_set::{RuleId, RuleInfo, RuleSet};
pub use crate::scope::{ActionFn, Arg, Scope};
pub use crate::value::Value;
pub use regex;

/// The result type used internally in the parser.
///
/// `Matched` carries the position just past the consumed input.
#[derive(Clone, PartialEq, PartialOrd, Eq, Ord, Debug, Hash)]
pub enum RuleResult<T> {
    Matched(usize, T),
    Failed,
}

impl<T> RuleResult<T> {
    pub fn is_matched(&self) -> bool {
        matches!(self, RuleResult::Matched(..))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RuleResult<U> {
        match self {
            RuleResult::Matched(pos, v) => RuleResult::Matched(pos, f(v)),
            RuleResult::Failed => RuleResult::Failed,
        }
    }
}
