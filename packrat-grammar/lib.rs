//! Operator trees, grammar validation and the tree-walking interpreter.
//!
//! A [`Grammar`] is built from named rules with a [`GrammarBuilder`], checked
//! once, and then shared by any number of parses through its [`RuleSet`]
//! implementation.
//!
//! [`RuleSet`]: packrat_runtime::RuleSet

pub mod analysis;
mod ast;
mod builder;
mod error;
mod interpret;
pub mod ops;
mod render;

pub use ast::{char_bounds, Action, Grammar, Operator, Pattern, Rule};
pub use builder::GrammarBuilder;
pub use error::GrammarError;
pub use render::render;
