//! Diagnostics shared by the scanner and the parser.
//!
//! Lexical errors render as `[line N] Error: <message>` and never stop the
//! scan; syntactic errors render as `Error at '<lexeme>': Expect <thing>`
//! (or `Error at end: ...` when the parser ran out of tokens) and abort the
//! parse.  Exit codes follow the 65/70 convention: 65 for lexical and
//! syntactic faults, 70 for runtime faults, which includes the assignment
//! target check even though it is detected while parsing.

use std::error::Error;
use std::fmt;

/// Line number (starting at one).
pub type Position = u32;

#[derive(Debug, PartialEq)]
pub struct LexError {
    pub line: Position,
    pub kind: LexErrorKind,
}

#[derive(Debug, PartialEq)]
pub enum LexErrorKind {
    UnexpectedCharacter(char),
    UnterminatedString,
}

impl fmt::Display for LexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[line {}] Error: ", self.line)?;
        match &self.kind {
            LexErrorKind::UnexpectedCharacter(c) => write!(f, "Unexpected character: {}", c),
            LexErrorKind::UnterminatedString => write!(f, "Unterminated string."),
        }
    }
}

impl Error for LexError {}

#[derive(Debug, PartialEq)]
pub enum ParseError {
    /// The parser wanted `what` (a human-readable phrase, punctuation
    /// included) but found the given lexeme, or ran out of input.
    Expected {
        what: &'static str,
        found: Option<String>,
    },

    /// A bare `var` declaration as the immediate body of a `for` loop.
    ForBodyNotBlock,

    /// `=` applied to something that is not an identifier.  Classified as
    /// a runtime-grade fault for compatibility with the exit-code table.
    InvalidAssignmentTarget,
}

impl ParseError {
    pub fn expected(what: &'static str, found: Option<String>) -> ParseError {
        ParseError::Expected { what, found }
    }

    pub fn exit_code(&self) -> i32 {
        match self {
            ParseError::Expected { .. } | ParseError::ForBodyNotBlock => 65,
            ParseError::InvalidAssignmentTarget => 70,
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::Expected { what, found } => match found {
                Some(lexeme) => write!(f, "Error at '{}': Expect {}", lexeme, what),
                None => write!(f, "Error at end: Expect {}", what),
            },
            ParseError::ForBodyNotBlock => write!(f, "Error: Expect block after for clauses."),
            ParseError::InvalidAssignmentTarget => write!(f, "Invalid assignment target."),
        }
    }
}

impl Error for ParseError {}
