//! Grammar compiler backends.
//!
//! [`compile`] turns a validated grammar into closures that run on the same
//! engine as the interpreter. [`translate`] emits equivalent Rust source.

mod compile;
pub mod translate;

pub use compile::{compile, CompiledGrammar};
