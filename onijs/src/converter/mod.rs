//! Conversion of Onigmo syntax trees to ECMAScript patterns
//!
//! The converter walks a [`Node`] tree depth-first. Every node category has
//! a converter implementing [`CategoryConverter`]; composite converters
//! convert their children through [`Context::convert_child`] and then wrap
//! the child fragments in their own syntax.
//!
//! Conversion never fails because of what a pattern contains. Constructs
//! JavaScript cannot express are rewritten or dropped, and each such
//! degradation is reported through the [`Diagnostics`] collector owned by
//! the conversion. The only errors are the depth limit and broken scope
//! bookkeeping inside the walker.

mod alternation;
mod anchor;
mod backref;
mod group;
mod meta;
mod quantifier;
mod set;
mod types;

pub use alternation::convert_alternation;
pub use anchor::AnchorConverter;
pub use backref::BackreferenceConverter;
pub use group::GroupConverter;
pub use meta::MetaConverter;
pub use quantifier::QuantifierConverter;
pub use set::SetConverter;
pub use types::CharacterTypeConverter;

use crate::ast::Node;
use crate::diagnostics::{
    Diagnostic, DiagnosticBuilder, DiagnosticKind, Diagnostics, NodePath, NodeRef,
};
use crate::error::ConvertError;
use crate::groups::{GroupCollector, GroupRegistry};
use crate::scope::{Scope, ScopeStack};

/// Default limit on tree depth
pub const DEFAULT_MAX_DEPTH: usize = 256;

/// How a fragment composes with its neighbours
///
/// Ordered from the tightest binding to the loosest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Shape {
    /// A single unit a quantifier can apply to, e.g. `a`, `[a-z]`, `(...)`
    Atom,
    /// Several units in a row, e.g. `abc`, `a*`
    Concat,
    /// Top-level `|`, e.g. `a|b`
    Disjunction,
}

/// Converted JavaScript text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub shape: Shape,
    /// Ends in a numeric backreference that a following digit would extend
    pub trailing_reference: bool,
}

impl Fragment {
    pub fn new(text: impl Into<String>, shape: Shape) -> Self {
        Fragment {
            text: text.into(),
            shape,
            trailing_reference: false,
        }
    }

    pub fn atom(text: impl Into<String>) -> Self {
        Fragment::new(text, Shape::Atom)
    }

    pub fn concat(text: impl Into<String>) -> Self {
        Fragment::new(text, Shape::Concat)
    }

    /// A fragment matching the empty string
    pub fn empty() -> Self {
        Fragment::atom("")
    }

    /// A numeric backreference such as `\2`
    pub fn reference(text: impl Into<String>) -> Self {
        Fragment {
            trailing_reference: true,
            ..Fragment::atom(text)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// The text, wrapped in `(?:...)` if it binds looser than `shape`
    pub fn wrapped_to(&self, shape: Shape) -> String {
        if self.shape > shape {
            format!("(?:{})", self.text)
        } else {
            self.text.clone()
        }
    }
}

/// What a converter produced for one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Output {
    /// The node degraded to nothing; a diagnostic says why
    Dropped,
    /// The node converted, possibly to the empty string
    Emitted(Fragment),
}

impl Output {
    pub fn is_dropped(&self) -> bool {
        matches!(self, Output::Dropped)
    }

    /// The fragment, or `None` if the node was dropped
    pub fn into_fragment(self) -> Option<Fragment> {
        match self {
            Output::Dropped => None,
            Output::Emitted(fragment) => Some(fragment),
        }
    }
}

impl From<Fragment> for Output {
    fn from(fragment: Fragment) -> Self {
        Output::Emitted(fragment)
    }
}

/// Converter for one node category
///
/// Implementations must be total over the category: a subtype without a
/// JavaScript equivalent returns [`Output::Dropped`] and reports a
/// diagnostic instead of failing.
pub trait CategoryConverter {
    /// The node payload this converter handles
    type Node: ?Sized;

    fn convert(&self, node: &Self::Node, cx: &mut Context<'_>) -> Result<Output, ConvertError>;
}

/// State of one conversion: scopes, diagnostics and the position in the tree
pub struct Context<'a> {
    scopes: ScopeStack,
    diagnostics: Diagnostics,
    registry: &'a GroupRegistry,
    path: Vec<usize>,
    depth: usize,
    max_depth: usize,
    group_ordinal: usize,
}

impl<'a> Context<'a> {
    fn new(root: Scope, registry: &'a GroupRegistry, max_depth: usize) -> Self {
        Context {
            scopes: ScopeStack::new(root),
            diagnostics: Diagnostics::new(),
            registry,
            path: Vec::new(),
            depth: 0,
            max_depth,
            group_ordinal: 0,
        }
    }

    /// The scope in effect at the current node
    pub fn scope(&self) -> Scope {
        self.scopes.current()
    }

    pub fn scopes_mut(&mut self) -> &mut ScopeStack {
        &mut self.scopes
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn diagnostics_mut(&mut self) -> &mut Diagnostics {
        &mut self.diagnostics
    }

    /// Capture numbering of the tree being converted
    pub fn registry(&self) -> &'a GroupRegistry {
        self.registry
    }

    /// Path of the node being converted
    pub fn path(&self) -> NodePath {
        NodePath::new(self.path.clone())
    }

    /// Report a diagnostic about the node being converted
    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        source: impl Into<String>,
    ) -> DiagnosticBuilder<'_> {
        let node = NodeRef::new(self.path(), source);
        self.diagnostics.report(kind, node)
    }

    /// Report a diagnostic about some other node, e.g. a set item
    pub fn report_at(
        &mut self,
        kind: DiagnosticKind,
        path: NodePath,
        source: impl Into<String>,
    ) -> DiagnosticBuilder<'_> {
        self.diagnostics.report(kind, NodeRef::new(path, source))
    }

    /// Claim the next group ordinal, in the order the registry numbered them
    pub fn enter_group(&mut self) -> usize {
        let ordinal = self.group_ordinal;
        self.group_ordinal += 1;
        ordinal
    }

    /// Number of groups entered so far
    pub fn group_ordinal(&self) -> usize {
        self.group_ordinal
    }

    /// Convert the `index`-th child of the current node
    pub fn convert_child(&mut self, node: &Node, index: usize) -> Result<Output, ConvertError> {
        self.path.push(index);
        let output = self.dispatch(node);
        self.path.pop();
        output
    }

    fn dispatch(&mut self, node: &Node) -> Result<Output, ConvertError> {
        if self.depth >= self.max_depth {
            return Err(ConvertError::DepthLimitExceeded {
                limit: self.max_depth,
            });
        }
        self.depth += 1;
        log::trace!(kind = node.kind_name(), depth = self.depth; "converting node");

        let output = match node {
            Node::Empty => Ok(Output::Emitted(Fragment::empty())),
            Node::Literal(text) => LiteralConverter.convert(text.as_str(), self),
            Node::Sequence(nodes) => SequenceConverter.convert(nodes.as_slice(), self),
            Node::Meta(meta) => MetaConverter.convert(meta, self),
            Node::Group(group) => GroupConverter.convert(group, self),
            Node::Quantified(quantified) => QuantifierConverter.convert(quantified, self),
            Node::CharacterType(ct) => CharacterTypeConverter.convert(ct, self),
            Node::Anchor(anchor) => AnchorConverter.convert(anchor, self),
            Node::Backreference(backref) => BackreferenceConverter.convert(backref, self),
            Node::Set(set) => SetConverter.convert(set, self),
        };

        self.depth -= 1;
        output
    }
}

/// Literal text passes through unchanged
pub struct LiteralConverter;

impl CategoryConverter for LiteralConverter {
    type Node = str;

    fn convert(&self, text: &str, _cx: &mut Context<'_>) -> Result<Output, ConvertError> {
        if text.is_empty() {
            return Ok(Fragment::empty().into());
        }
        Ok(Fragment::new(text, literal_shape(text)).into())
    }
}

/// A literal is an atom when it is one character or one escape
fn literal_shape(text: &str) -> Shape {
    let mut chars = text.chars();
    let is_atom = match (chars.next(), chars.next()) {
        // Astral characters are two UTF-16 units without the `u` flag
        (Some(c), None) => u32::from(c) <= 0xFFFF,
        (Some('\\'), Some(escape)) => {
            let rest = chars.as_str();
            match escape {
                'x' => rest.len() == 2,
                'u' => rest.len() == 4,
                'c' => rest.chars().count() == 1,
                _ => rest.is_empty(),
            }
        }
        _ => false,
    };
    if is_atom { Shape::Atom } else { Shape::Concat }
}

/// Concatenation of the converted children
pub struct SequenceConverter;

impl CategoryConverter for SequenceConverter {
    type Node = [Node];

    fn convert(&self, nodes: &[Node], cx: &mut Context<'_>) -> Result<Output, ConvertError> {
        let mut pieces = Vec::with_capacity(nodes.len());
        let mut dropped = 0;

        for (index, node) in nodes.iter().enumerate() {
            match cx.convert_child(node, index)? {
                Output::Dropped => dropped += 1,
                Output::Emitted(fragment) if fragment.is_empty() => {}
                Output::Emitted(fragment) => pieces.push(fragment),
            }
        }

        if !nodes.is_empty() && dropped == nodes.len() {
            return Ok(Output::Dropped);
        }
        Ok(join_sequence(pieces).into())
    }
}

fn join_sequence(mut pieces: Vec<Fragment>) -> Fragment {
    if pieces.len() <= 1 {
        return pieces.pop().unwrap_or_else(Fragment::empty);
    }

    let texts: Vec<String> = pieces
        .iter()
        .map(|piece| piece.wrapped_to(Shape::Concat))
        .collect();
    let mut text = String::new();
    for (index, piece) in pieces.iter().enumerate() {
        let next_is_digit = texts
            .get(index + 1)
            .and_then(|next| next.chars().next())
            .is_some_and(|c| c.is_ascii_digit());
        if piece.trailing_reference && next_is_digit {
            // `\1` followed by `0` would read as `\10`
            text.push_str(&format!("(?:{})", texts[index]));
        } else {
            text.push_str(&texts[index]);
        }
    }

    Fragment {
        text,
        shape: Shape::Concat,
        trailing_reference: pieces.last().is_some_and(|piece| piece.trailing_reference),
    }
}

/// Translated pattern text plus everything that was degraded on the way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionResult {
    /// The ECMAScript pattern source, without delimiters or flags
    pub fragment: String,
    /// Diagnostics in emission order
    pub diagnostics: Vec<Diagnostic>,
}

impl ConversionResult {
    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Tree converter with its configuration
#[derive(Debug, Clone)]
pub struct Converter {
    root_scope: Scope,
    max_depth: usize,
}

impl Default for Converter {
    fn default() -> Self {
        Converter {
            root_scope: Scope::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl Converter {
    /// Converter with default options
    pub fn new() -> Self {
        Converter::default()
    }

    pub fn builder() -> ConverterBuilder {
        ConverterBuilder::default()
    }

    /// Convert `root` to ECMAScript syntax
    ///
    /// Each call owns its scope stack and diagnostics, so a converter can be
    /// shared between threads.
    pub fn convert_tree(&self, root: &Node) -> Result<ConversionResult, ConvertError> {
        let registry = GroupCollector::collect(root);
        log::debug!(
            source_groups = registry.source_count(),
            target_groups = registry.target_count();
            "collected capture groups"
        );

        let mut cx = Context::new(self.root_scope, &registry, self.max_depth);
        let output = cx.dispatch(root)?;

        let remaining = cx.scopes.depth();
        if remaining != 0 {
            return Err(ConvertError::UnbalancedScopes { remaining });
        }

        let fragment = output.into_fragment().map(|f| f.text).unwrap_or_default();
        let diagnostics = cx.diagnostics.drain();
        log::debug!(diagnostics = diagnostics.len(); "conversion finished");

        Ok(ConversionResult {
            fragment,
            diagnostics,
        })
    }
}

/// Builder for [`Converter`]
#[derive(Debug, Clone, Default)]
pub struct ConverterBuilder {
    scope: Scope,
    max_depth: Option<usize>,
}

impl ConverterBuilder {
    /// Start with dot matching line terminators (Onigmo `/m`)
    pub fn dot_all(mut self, enabled: bool) -> Self {
        self.scope.dot_all = enabled;
        self
    }

    /// The pattern will carry the JavaScript `i` flag
    pub fn ignore_case(mut self, enabled: bool) -> Self {
        self.scope.ignore_case = enabled;
        self
    }

    /// Use `scope` as the root scope
    pub fn scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Maximum tree depth before conversion fails
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    pub fn build(self) -> Converter {
        Converter {
            root_scope: self.scope,
            max_depth: self.max_depth.unwrap_or(DEFAULT_MAX_DEPTH),
        }
    }
}

/// Convert `root` with default options
pub fn convert_tree(root: &Node) -> Result<ConversionResult, ConvertError> {
    Converter::new().convert_tree(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Backreference, Quantifier};

    fn convert(node: &Node) -> ConversionResult {
        convert_tree(node).unwrap()
    }

    #[test]
    fn test_literal_passthrough() {
        let result = convert(&Node::literal("abc"));
        assert_eq!(result.fragment, "abc");
        assert!(!result.has_diagnostics());
    }

    #[test]
    fn test_empty_tree() {
        assert_eq!(convert(&Node::Empty).fragment, "");
    }

    #[test]
    fn test_literal_shapes() {
        assert_eq!(literal_shape("a"), Shape::Atom);
        assert_eq!(literal_shape("\\."), Shape::Atom);
        assert_eq!(literal_shape("\\x1B"), Shape::Atom);
        assert_eq!(literal_shape("\\u00e9"), Shape::Atom);
        assert_eq!(literal_shape("\\cA"), Shape::Atom);
        assert_eq!(literal_shape("ab"), Shape::Concat);
        assert_eq!(literal_shape("\\.a"), Shape::Concat);
    }

    #[test]
    fn test_sequence_skips_dropped_children() {
        let node = Node::sequence(vec![
            Node::literal("a"),
            Node::unknown_meta("\\K"),
            Node::literal("b"),
        ]);
        let result = convert(&node);
        assert_eq!(result.fragment, "ab");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].node.path, NodePath::new(vec![1]));
    }

    #[test]
    fn test_sequence_of_dropped_children_is_dropped() {
        let registry = GroupRegistry::new();
        let mut cx = Context::new(Scope::default(), &registry, DEFAULT_MAX_DEPTH);
        let nodes = vec![Node::unknown_meta("a"), Node::unknown_meta("b")];
        let output = SequenceConverter.convert(&nodes, &mut cx).unwrap();
        assert!(output.is_dropped());
        assert_eq!(cx.diagnostics().len(), 2);
    }

    #[test]
    fn test_sequence_wraps_disjunction() {
        let node = Node::sequence(vec![
            Node::literal("x"),
            Node::alternation(vec![Node::literal("a"), Node::literal("b")]),
        ]);
        assert_eq!(convert(&node).fragment, "x(?:a|b)");
    }

    #[test]
    fn test_reference_followed_by_digit_is_guarded() {
        let node = Node::sequence(vec![
            Node::group(Node::literal("a")),
            Node::Backreference(Backreference::Number(1)),
            Node::literal("0"),
        ]);
        assert_eq!(convert(&node).fragment, "(a)(?:\\1)0");
    }

    #[test]
    fn test_dropped_root_is_empty_fragment() {
        let result = convert(&Node::unknown_meta("\\K"));
        assert_eq!(result.fragment, "");
        assert_eq!(result.diagnostics.len(), 1);
    }

    #[test]
    fn test_depth_limit() {
        let mut node = Node::literal("a");
        for _ in 0..10 {
            node = Node::non_capturing_group(node);
        }
        let converter = Converter::builder().max_depth(5).build();
        assert_eq!(
            converter.convert_tree(&node),
            Err(ConvertError::DepthLimitExceeded { limit: 5 })
        );
        assert!(Converter::builder().max_depth(11).build().convert_tree(&node).is_ok());
    }

    #[test]
    fn test_builder_sets_root_scope() {
        let converter = Converter::builder().dot_all(true).build();
        let result = converter.convert_tree(&Node::dot()).unwrap();
        assert_eq!(result.fragment, "(?:.|\\n)");
    }

    #[test]
    fn test_conversions_do_not_share_diagnostics() {
        let converter = Converter::new();
        let node = Node::unknown_meta("\\K");
        let first = converter.convert_tree(&node).unwrap();
        let second = converter.convert_tree(&node).unwrap();
        assert_eq!(first, second);
        assert_eq!(second.diagnostics.len(), 1);
    }

    #[test]
    fn test_wrapped_to() {
        let fragment = Fragment::new("a|b", Shape::Disjunction);
        assert_eq!(fragment.wrapped_to(Shape::Concat), "(?:a|b)");
        assert_eq!(fragment.wrapped_to(Shape::Disjunction), "a|b");
        let fragment = Fragment::atom("a");
        assert_eq!(fragment.wrapped_to(Shape::Atom), "a");
    }

    #[test]
    fn test_quantified_concat_is_wrapped() {
        let node = Node::quantified(Node::literal("ab"), Quantifier::zero_or_more());
        assert_eq!(convert(&node).fragment, "(?:ab)*");
    }
}
