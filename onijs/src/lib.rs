//! onijs
//!
//! Converts Onigmo (Ruby) regular expressions into ECMAScript ones.
//!
//! The pipeline is string -> tokens -> tree -> JavaScript source. The tree
//! converter is usable on its own: anything that can build a [`Node`] can
//! call [`convert_tree`]. Constructs JavaScript cannot express are dropped
//! and reported as [`Diagnostic`]s instead of failing the conversion.

pub mod ast;
pub mod converter;
pub mod diagnostics;
pub mod error;
pub mod groups;
pub mod lexer;
pub mod parser;
pub mod scope;
pub mod transpiler;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use ast::{Flag, Meta, Node, OptionSwitch, SwitchKind};
pub use converter::{
    CategoryConverter, ConversionResult, Converter, ConverterBuilder, Output, convert_tree,
};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, NodePath, Severity};
pub use error::{ConvertError, Error, LexerErrorKind, ParseError, Result, Span};
pub use groups::{GroupCollector, GroupRegistry};
pub use lexer::{Lexer, Token};
pub use parser::{ParseOptions, Parser, parse, parse_with};
pub use scope::{Scope, ScopeStack};
pub use transpiler::{JsRegex, Options, TranspileResult, transpile, transpile_debug, transpile_with};
