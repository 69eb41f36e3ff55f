//! Anchors
//!
//! `^` and `$` always match at line boundaries in Onigmo, while in
//! JavaScript that needs the `m` flag, which would also change `\A`-style
//! anchors. Line anchors are therefore spelled out with lookarounds.

use super::{CategoryConverter, Context, Fragment, Output};
use crate::ast::Anchor;
use crate::diagnostics::DiagnosticKind;
use crate::error::ConvertError;

pub struct AnchorConverter;

impl CategoryConverter for AnchorConverter {
    type Node = Anchor;

    fn convert(&self, anchor: &Anchor, cx: &mut Context<'_>) -> Result<Output, ConvertError> {
        let text = match anchor {
            Anchor::LineStart => "(?<=^|\\n)",
            Anchor::LineEnd => "(?=$|\\n)",
            Anchor::StringStart => "^",
            Anchor::StringEnd => "$",
            Anchor::StringEndBeforeNewline => "(?=\\n?$)",
            Anchor::WordBoundary => "\\b",
            Anchor::NonWordBoundary => "\\B",
            Anchor::MatchStart => {
                cx.report(DiagnosticKind::UnsupportedAnchor, anchor.to_regex_string())
                    .detail("`\\G` needs the sticky flag")
                    .emit();
                return Ok(Output::Dropped);
            }
        };
        Ok(Fragment::atom(text).into())
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Anchor, Node};
    use crate::converter::convert_tree;
    use crate::diagnostics::DiagnosticKind;

    fn convert(anchor: Anchor) -> String {
        convert_tree(&Node::Anchor(anchor)).unwrap().fragment
    }

    #[test]
    fn test_string_anchors() {
        assert_eq!(convert(Anchor::StringStart), "^");
        assert_eq!(convert(Anchor::StringEnd), "$");
        assert_eq!(convert(Anchor::StringEndBeforeNewline), "(?=\\n?$)");
    }

    #[test]
    fn test_line_anchors() {
        assert_eq!(convert(Anchor::LineStart), "(?<=^|\\n)");
        assert_eq!(convert(Anchor::LineEnd), "(?=$|\\n)");
    }

    #[test]
    fn test_word_boundaries_pass_through() {
        assert_eq!(convert(Anchor::WordBoundary), "\\b");
        assert_eq!(convert(Anchor::NonWordBoundary), "\\B");
    }

    #[test]
    fn test_match_start_is_dropped() {
        let node = Node::sequence(vec![Node::Anchor(Anchor::MatchStart), Node::literal("a")]);
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "a");
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::UnsupportedAnchor);
        assert_eq!(result.diagnostics[0].node.source, "\\G");
    }
}
