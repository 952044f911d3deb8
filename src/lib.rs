//! A tree-walk interpreter for the Setker language.
//!
//! The pipeline has four stages sharing one error taxonomy: the scanner
//! ([`scanner::Scanner`]) turns source text into tokens, the parser
//! ([`parser::Parser`]) builds the syntax tree, the evaluator
//! ([`eval::Evaluator`]) walks it against a chain of lexical environments,
//! and [`interpreter::Interpreter`] ties the stages together for embedders
//! and the command-line driver.
//!
//! # Examples
//!
//! See [`crate::interpreter::Interpreter`].
//!
//! # Limitations
//!
//! - The scanner reports every lexical error it finds, but the parser and
//!   evaluator bail out on the first error.
//! - `class`, `this` and `super` are reserved words without grammar rules.

#![warn(rust_2018_idioms)]
#![warn(missing_debug_implementations)]

pub mod ast;
pub mod diag;
pub mod eval;
pub mod interpreter;
pub mod parser;
pub mod scanner;
pub mod token;
