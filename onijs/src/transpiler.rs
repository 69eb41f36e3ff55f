//! Transpiler from Onigmo patterns to JavaScript regular expressions
//!
//! This module ties the pipeline together: the pattern is parsed, the tree
//! is converted, and the JavaScript flags are assembled from the top-level
//! Onigmo options.

use std::fmt;

use crate::ast::{Flag, Node};
use crate::converter::{Converter, DEFAULT_MAX_DEPTH};
use crate::diagnostics::{Diagnostic, DiagnosticKind, Diagnostics, NodePath, NodeRef};
use crate::error::Result;
use crate::parser::{DEFAULT_MAX_NESTING, ParseOptions, parse_with};
use crate::scope::Scope;

/// Options for [`transpile_with`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Top-level Onigmo option letters, e.g. `"mi"`
    pub flags: String,
    /// Emit the JavaScript `g` flag
    pub global: bool,
    /// Maximum tree depth for the converter
    pub max_depth: usize,
    /// Maximum group nesting for the parser
    pub max_nesting: usize,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            flags: String::new(),
            global: false,
            max_depth: DEFAULT_MAX_DEPTH,
            max_nesting: DEFAULT_MAX_NESTING,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Options::default()
    }

    /// Options for a pattern written as `/.../flags` in Ruby
    pub fn from_flags(flags: &str) -> Self {
        Options {
            flags: flags.to_string(),
            ..Options::default()
        }
    }

    pub fn global(mut self, global: bool) -> Self {
        self.global = global;
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    fn scope(&self) -> Scope {
        Scope::from_letters(&self.flags)
    }

    /// Letters with no top-level meaning, in order of appearance
    fn unknown_flags(&self) -> impl Iterator<Item = char> + '_ {
        self.flags
            .chars()
            .filter(|c| matches!(Flag::from_char(*c), Flag::Other(_)))
    }
}

/// A converted pattern, ready for `new RegExp(source, flags)`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsRegex {
    /// Pattern source without delimiters
    pub source: String,
    /// JavaScript flags
    pub flags: String,
    /// Everything that was dropped or rewritten
    pub warnings: Vec<Diagnostic>,
}

impl JsRegex {
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

impl fmt::Display for JsRegex {
    /// Renders a regex literal, escaping `/` outside character sets
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut literal = String::with_capacity(self.source.len() + 2);
        let mut escaped = false;
        let mut in_set = false;
        for c in self.source.chars() {
            match c {
                '/' if !escaped && !in_set => literal.push_str("\\/"),
                _ => literal.push(c),
            }
            match c {
                '[' if !escaped => in_set = true,
                ']' if !escaped => in_set = false,
                _ => {}
            }
            escaped = c == '\\' && !escaped;
        }
        if literal.is_empty() {
            literal.push_str("(?:)");
        }
        write!(f, "/{}/{}", literal, self.flags)
    }
}

/// Transpile an Onigmo pattern with default options
///
/// # Example
/// ```
/// use onijs::transpile;
///
/// let regex = transpile("a(?m:.)b").unwrap();
/// assert_eq!(regex.source, "a((?:.|\\n))b");
/// assert!(regex.warnings.is_empty());
/// ```
pub fn transpile(input: &str) -> Result<JsRegex> {
    transpile_with(input, &Options::default())
}

/// Transpile an Onigmo pattern
pub fn transpile_with(input: &str, options: &Options) -> Result<JsRegex> {
    let (_, regex) = run(input, options)?;
    Ok(regex)
}

fn run(input: &str, options: &Options) -> Result<(Node, JsRegex)> {
    let scope = options.scope();
    let parse_options = ParseOptions {
        extended: scope.extended,
        max_nesting: options.max_nesting,
    };
    let ast = parse_with(input, &parse_options)?;

    let mut warnings = Diagnostics::new();
    for letter in options.unknown_flags() {
        warnings
            .report(
                DiagnosticKind::UnsupportedFlag,
                NodeRef::new(NodePath::root(), letter.to_string()),
            )
            .detail(format!("`{}` has no JavaScript equivalent", letter))
            .emit();
    }

    let converter = Converter::builder()
        .scope(scope)
        .max_depth(options.max_depth)
        .build();
    let result = converter.convert_tree(&ast)?;

    let mut flags = String::new();
    if options.global {
        flags.push('g');
    }
    if scope.ignore_case {
        flags.push('i');
    }

    let mut all_warnings = warnings.drain();
    all_warnings.extend(result.diagnostics);
    let regex = JsRegex {
        source: result.fragment,
        flags,
        warnings: all_warnings,
    };
    Ok((ast, regex))
}

/// Transpile with verbose output for debugging
pub fn transpile_debug(input: &str, options: &Options) -> Result<TranspileResult> {
    let (ast, regex) = run(input, options)?;

    Ok(TranspileResult {
        input: input.to_string(),
        ast: format!("{:#?}", ast),
        output: regex.to_string(),
        warnings: regex.warnings,
    })
}

/// Result of a transpilation with debug information
#[derive(Debug, Clone)]
pub struct TranspileResult {
    /// The original input pattern
    pub input: String,
    /// The tree (pretty debug format)
    pub ast: String,
    /// The regex literal
    pub output: String,
    /// Diagnostics produced by the conversion
    pub warnings: Vec<Diagnostic>,
}

impl TranspileResult {
    /// Print a formatted report of the transpilation
    pub fn report(&self) {
        println!("Transpilation Report");
        println!("====================");
        println!("Input:  {}", self.input);
        println!("AST:    {}", self.ast);
        println!("Output: {}", self.output);
        if self.warnings.is_empty() {
            println!("Warnings: none");
        } else {
            println!("Warnings:");
            for warning in &self.warnings {
                println!("  {}", warning);
                for related in &warning.related {
                    println!("    caused by {}", related);
                }
            }
        }
    }
}
