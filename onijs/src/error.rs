//! Error types for the converter
//!
//! This module provides error handling using the `thiserror` crate.
//! Errors are categorized by their source: lexing, parsing or conversion.
//! Unsupported pattern content is never an error; it is reported through
//! diagnostics instead (see [`crate::diagnostics`]).

use thiserror::Error;

/// The main error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Errors that occur during lexing/tokenization
    #[error("lexer error at position {position}: {kind}")]
    Lexer {
        /// Position in the input where the error occurred
        position: usize,
        /// The specific kind of lexer error
        kind: LexerErrorKind,
    },

    /// Errors that occur during parsing
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// Errors raised by the conversion walker itself
    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),
}

/// Specific kinds of lexer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LexerErrorKind {
    /// A backslash at the very end of the pattern
    #[error("trailing backslash")]
    TrailingBackslash,

    /// Unclosed character class (e.g., `[abc` without `]`)
    #[error("unclosed character class")]
    UnclosedCharacterClass,

    /// Invalid escape sequence
    #[error("invalid escape sequence '\\{0}'")]
    InvalidEscape(char),

    /// Unclosed group or comment
    #[error("unclosed group")]
    UnclosedGroup,

    /// Invalid group name
    #[error("invalid group name '{0}'")]
    InvalidGroupName(String),

    /// Unknown `(?...` group syntax
    #[error("undefined group option '{0}'")]
    UndefinedGroupOption(char),

    /// Class intersection `&&`, which has no JavaScript form
    #[error("character class intersection is not supported")]
    ClassIntersection,
}

/// Errors that occur during parsing
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    /// Unexpected token encountered
    #[error("expected {expected}, found {found}")]
    UnexpectedToken {
        /// What was expected
        expected: String,
        /// What was actually found
        found: String,
    },

    /// Unexpected end of input
    #[error("unexpected end of input")]
    UnexpectedEof,

    /// A quantifier with no operand, e.g. `*a`
    #[error("target of repeat operator is not specified")]
    NothingToRepeat,

    /// Invalid quantifier
    #[error("invalid quantifier: {0}")]
    InvalidQuantifier(String),

    /// A class range whose start is after its end, e.g. `[z-a]`
    #[error("empty range in char class: {start}-{end}")]
    EmptyRange {
        /// Start of the range
        start: char,
        /// End of the range
        end: char,
    },

    /// Groups nested deeper than the configured limit
    #[error("group nesting exceeds the limit of {0}")]
    NestingTooDeep(usize),
}

/// Errors raised while walking a tree
///
/// These never come from unusual pattern content. `DepthLimitExceeded`
/// guards the stack; the scope variants mean the walker itself is broken.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConvertError {
    /// The tree is nested deeper than the converter allows
    #[error("tree depth exceeds the limit of {limit}")]
    DepthLimitExceeded {
        /// The configured limit
        limit: usize,
    },

    /// A scope was popped with no matching push
    #[error("internal error: option scope popped without a matching push")]
    ScopeUnderflow,

    /// The walk finished with scopes still pushed
    #[error("internal error: {remaining} option scope(s) left open after conversion")]
    UnbalancedScopes {
        /// Frames left above the root scope
        remaining: usize,
    },
}

/// A span representing a location in the source pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Start position (inclusive)
    pub start: usize,
    /// End position (exclusive)
    pub end: usize,
}

impl Span {
    /// Create a new span
    pub fn new(start: usize, end: usize) -> Self {
        Span { start, end }
    }

    /// Create a span for a single character
    pub fn single(pos: usize) -> Self {
        Span {
            start: pos,
            end: pos + 1,
        }
    }

    /// Get the length of the span
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Check if the span is empty
    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;
