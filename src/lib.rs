//! A packrat PEG engine with support for left recursion.
//!
//! Grammars are trees of [`Operator`]s grouped into named rules. They are
//! validated once by [`GrammarBuilder::build`] and can then be run directly,
//! compiled to closures with [`compile`], or translated to Rust source with
//! [`codegen::to_source`]. All three agree on what they match.
//!
//! ```
//! use packrat::ops::*;
//! use packrat::{Grammar, Value};
//!
//! // expr = expr "+" num | num
//! let grammar = Grammar::builder("sum")
//!     .rule("expr", choice(vec![
//!         seq(vec![call("expr"), lit("+"), call("num")]),
//!         call("num"),
//!     ]))
//!     .rule("num", collect(plus(range('0', '9'))))
//!     .build()
//!     .unwrap();
//!
//! assert!(grammar.parse("1+2+3").is_ok());
//! assert_eq!(grammar.parse("1+").unwrap_err().to_string(), "@1:3 failed rule 'num', got end of input");
//! ```

use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

pub use packrat_codegen::{compile, CompiledGrammar};
pub use packrat_grammar::{ops, render, Action, Grammar, GrammarBuilder, GrammarError, Operator, Pattern, Rule};
pub use packrat_runtime::error::{FailedRule, ParseError};
pub use packrat_runtime::str::LineCol;
pub use packrat_runtime::{parse, ActionFn, Arg, Engine, Parser, RuleId, RuleInfo, RuleResult, RuleSet, Scope, Value};

/// Rust source generation.
pub mod codegen {
    pub use packrat_codegen::translate::{actions, compile_grammar, rule_ident, to_source};
}

/// Write the source generated for `grammar` to `path`.
pub fn write_source(grammar: &Grammar, path: &Path) -> io::Result<()> {
    fs::write(path, codegen::to_source(grammar))
}

/// From a build script, write the source generated for `grammar` to
/// `$OUT_DIR/{file_name}.rs` and return its path.
pub fn cargo_build(grammar: &Grammar, file_name: &str) -> io::Result<PathBuf> {
    let out_dir: PathBuf = env::var_os("OUT_DIR")
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR is not set"))?
        .into();
    let rust_path = out_dir.join(file_name).with_extension("rs");
    write_source(grammar, &rust_path)?;
    Ok(rust_path)
}
