//! Diagnostics for degraded conversions
//!
//! A conversion never fails because a construct has no JavaScript
//! equivalent. The converter drops or rewrites the construct and reports it
//! here instead. One [`Diagnostics`] collector lives for exactly one
//! top-level conversion and is drained into its result.

use std::fmt;

/// How serious a diagnostic is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Severity {
    /// The output diverges from the source or lost a construct
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// What went wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    // Meta category
    UnknownMeta,
    DetachedOptionSwitch,
    UnsupportedFlag,

    // Alternation pruning
    DepletedBranch,
    DepletedAlternation,

    // Sibling categories
    UnsupportedGroup,
    DuplicateGroupName,
    PossessiveQuantifier,
    UnsupportedCharacterType,
    UnsupportedAnchor,
    UnsupportedBackreference,
    UndefinedBackreference,
    UnsupportedSetItem,
    EmptySet,
}

impl DiagnosticKind {
    /// Base message for this kind
    pub fn default_message(&self) -> &'static str {
        match self {
            DiagnosticKind::UnknownMeta => "dropped unknown meta element",
            DiagnosticKind::DetachedOptionSwitch => {
                "dropped group option switch that is not attached to a group"
            }
            DiagnosticKind::UnsupportedFlag => "ignored unsupported option flag",
            DiagnosticKind::DepletedBranch => "dropped depleted alternation branch",
            DiagnosticKind::DepletedAlternation => "all alternation branches were dropped",
            DiagnosticKind::UnsupportedGroup => "dropped unsupported group",
            DiagnosticKind::DuplicateGroupName => "duplicate group name made non-capturing",
            DiagnosticKind::PossessiveQuantifier => {
                "possessive quantifier converted to greedy quantifier"
            }
            DiagnosticKind::UnsupportedCharacterType => "dropped unsupported character type",
            DiagnosticKind::UnsupportedAnchor => "dropped unsupported anchor",
            DiagnosticKind::UnsupportedBackreference => "dropped unsupported backreference",
            DiagnosticKind::UndefinedBackreference => {
                "dropped backreference to undefined group"
            }
            DiagnosticKind::UnsupportedSetItem => "dropped unsupported set member",
            DiagnosticKind::EmptySet => "dropped set with no convertible members",
        }
    }

    /// Render the message, appending detail when given
    pub fn message(&self, detail: Option<&str>) -> String {
        match detail {
            Some(detail) => format!("{}: {}", self.default_message(), detail),
            None => self.default_message().to_string(),
        }
    }
}

/// Child-index path from the root of the tree to a node
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn new(indices: Vec<usize>) -> Self {
        NodePath(indices)
    }

    pub fn root() -> Self {
        NodePath(Vec::new())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// The same path extended by one child index
    pub fn child(&self, index: usize) -> Self {
        let mut indices = self.0.clone();
        indices.push(index);
        NodePath(indices)
    }
}

impl fmt::Display for NodePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return write!(f, "/");
        }
        for index in &self.0 {
            write!(f, "/{}", index)?;
        }
        Ok(())
    }
}

/// Identifies the node a diagnostic is about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeRef {
    /// Where the node sits in the tree
    pub path: NodePath,
    /// The node rendered in source syntax
    pub source: String,
}

impl NodeRef {
    pub fn new(path: NodePath, source: impl Into<String>) -> Self {
        NodeRef {
            path,
            source: source.into(),
        }
    }
}

/// A single non-fatal finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub node: NodeRef,
    pub message: String,
    /// Diagnostics folded into this one, e.g. the causes of a depleted branch
    pub related: Vec<Diagnostic>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind, node: NodeRef) -> Self {
        Diagnostic {
            kind,
            severity: Severity::Warning,
            node,
            message: kind.message(None),
            related: Vec::new(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.severity == Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} at {}", self.severity, self.message, self.node.path)?;
        if !self.node.source.is_empty() {
            write!(f, " (`{}`)", self.node.source)?;
        }
        Ok(())
    }
}

/// Ordered, append-only collection of diagnostics
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    messages: Vec<Diagnostic>,
}

#[must_use = "diagnostic not emitted, call .emit()"]
pub struct DiagnosticBuilder<'a> {
    diagnostics: &'a mut Diagnostics,
    diagnostic: Diagnostic,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Start a diagnostic of the given kind about `node`.
    ///
    /// Uses the kind's default message. Call `.detail()` on the builder to extend it.
    pub fn report(&mut self, kind: DiagnosticKind, node: NodeRef) -> DiagnosticBuilder<'_> {
        DiagnosticBuilder {
            diagnostics: self,
            diagnostic: Diagnostic::new(kind, node),
        }
    }

    /// Marker for a later [`Diagnostics::split_off`]
    pub fn checkpoint(&self) -> usize {
        self.messages.len()
    }

    /// Remove and return everything recorded since `checkpoint`.
    ///
    /// The caller is expected to re-attach the returned diagnostics, usually
    /// as `related` entries of a summarising diagnostic.
    pub fn split_off(&mut self, checkpoint: usize) -> Vec<Diagnostic> {
        let at = checkpoint.min(self.messages.len());
        self.messages.split_off(at)
    }

    /// Take every diagnostic, leaving the collector empty
    pub fn drain(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.messages)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.messages.iter()
    }

    pub fn as_slice(&self) -> &[Diagnostic] {
        &self.messages
    }
}

impl<'a> DiagnosticBuilder<'a> {
    /// Append detail to the kind's message
    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        let detail = detail.into();
        self.diagnostic.message = self.diagnostic.kind.message(Some(&detail));
        self
    }

    /// Attach diagnostics that this one summarises
    pub fn related(mut self, related: Vec<Diagnostic>) -> Self {
        self.diagnostic.related.extend(related);
        self
    }

    pub fn emit(self) {
        log::debug!(
            kind:? = self.diagnostic.kind,
            path:% = self.diagnostic.node.path;
            "{}",
            self.diagnostic.message
        );
        self.diagnostics.messages.push(self.diagnostic);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(path: Vec<usize>, source: &str) -> NodeRef {
        NodeRef::new(NodePath::new(path), source)
    }

    #[test]
    fn test_report_and_drain() {
        let mut diagnostics = Diagnostics::new();
        diagnostics
            .report(DiagnosticKind::UnknownMeta, node(vec![1], "\\K"))
            .detail("`\\K`")
            .emit();
        diagnostics
            .report(DiagnosticKind::UnsupportedFlag, node(vec![2], "(?a)"))
            .emit();
        assert_eq!(diagnostics.len(), 2);

        let drained = diagnostics.drain();
        assert!(diagnostics.is_empty());
        assert_eq!(drained[0].kind, DiagnosticKind::UnknownMeta);
        assert_eq!(drained[0].message, "dropped unknown meta element: `\\K`");
        assert_eq!(drained[1].message, "ignored unsupported option flag");
    }

    #[test]
    fn test_split_off_returns_tail_in_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics
            .report(DiagnosticKind::UnknownMeta, node(vec![0], "a"))
            .emit();
        let checkpoint = diagnostics.checkpoint();
        diagnostics
            .report(DiagnosticKind::UnsupportedAnchor, node(vec![1], "b"))
            .emit();
        diagnostics
            .report(DiagnosticKind::UnsupportedGroup, node(vec![2], "c"))
            .emit();

        let tail = diagnostics.split_off(checkpoint);
        assert_eq!(tail.len(), 2);
        assert_eq!(tail[0].kind, DiagnosticKind::UnsupportedAnchor);
        assert_eq!(tail[1].kind, DiagnosticKind::UnsupportedGroup);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_related_are_kept() {
        let mut diagnostics = Diagnostics::new();
        let cause = Diagnostic::new(DiagnosticKind::UnknownMeta, node(vec![0, 0], "x"));
        diagnostics
            .report(DiagnosticKind::DepletedBranch, node(vec![0], "x"))
            .related(vec![cause.clone()])
            .emit();
        assert_eq!(diagnostics.as_slice()[0].related, vec![cause]);
    }

    #[test]
    fn test_path_display() {
        assert_eq!(NodePath::root().to_string(), "/");
        assert_eq!(NodePath::new(vec![1, 0, 3]).to_string(), "/1/0/3");
        assert_eq!(NodePath::root().child(2).child(0).to_string(), "/2/0");
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = Diagnostic::new(DiagnosticKind::UnsupportedAnchor, node(vec![4], "\\G"));
        assert_eq!(
            diagnostic.to_string(),
            "warning: dropped unsupported anchor at /4 (`\\G`)"
        );
        assert!(diagnostic.is_warning());
    }
}
