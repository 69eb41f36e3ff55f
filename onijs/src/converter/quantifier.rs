//! Quantifiers

use super::{CategoryConverter, Context, Fragment, Output, Shape};
use crate::ast::{Greediness, GroupKind, Node, Quantified};
use crate::diagnostics::DiagnosticKind;
use crate::error::ConvertError;

pub struct QuantifierConverter;

impl CategoryConverter for QuantifierConverter {
    type Node = Quantified;

    fn convert(
        &self,
        quantified: &Quantified,
        cx: &mut Context<'_>,
    ) -> Result<Output, ConvertError> {
        let mut quantifier = quantified.quantifier;
        if quantifier.greediness == Greediness::Possessive {
            cx.report(DiagnosticKind::PossessiveQuantifier, quantified.to_source_string())
                .emit();
            quantifier = quantifier.with_greediness(Greediness::Greedy);
        }

        let operand = match cx.convert_child(&quantified.node, 0)? {
            Output::Dropped => return Ok(Output::Dropped),
            Output::Emitted(fragment) if fragment.is_empty() => return Ok(fragment.into()),
            Output::Emitted(fragment) => fragment,
        };

        let operand = if is_assertion(&quantified.node) {
            format!("(?:{})", operand.text)
        } else {
            operand.wrapped_to(Shape::Atom)
        };
        let lazy = if quantifier.greediness == Greediness::Lazy { "?" } else { "" };
        let text = format!("{}{}{}", operand, quantifier.count_string(), lazy);
        Ok(Fragment::concat(text).into())
    }
}

/// JavaScript rejects a quantifier placed directly on an assertion
fn is_assertion(node: &Node) -> bool {
    match node {
        Node::Anchor(_) => true,
        Node::Group(group) => matches!(
            group.kind,
            GroupKind::Lookahead
                | GroupKind::NegativeLookahead
                | GroupKind::Lookbehind
                | GroupKind::NegativeLookbehind
        ),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Anchor, Greediness, GroupKind, Node, Quantifier};
    use crate::converter::convert_tree;
    use crate::diagnostics::{DiagnosticKind, NodePath};

    fn quantify(node: Node, quantifier: Quantifier) -> String {
        convert_tree(&Node::quantified(node, quantifier))
            .unwrap()
            .fragment
    }

    #[test]
    fn test_counts() {
        let a = || Node::literal("a");
        assert_eq!(quantify(a(), Quantifier::zero_or_more()), "a*");
        assert_eq!(quantify(a(), Quantifier::one_or_more()), "a+");
        assert_eq!(quantify(a(), Quantifier::optional()), "a?");
        assert_eq!(
            quantify(a(), Quantifier::new(2, Some(2), Greediness::Greedy)),
            "a{2}"
        );
        assert_eq!(
            quantify(a(), Quantifier::new(0, Some(3), Greediness::Greedy)),
            "a{0,3}"
        );
        assert_eq!(
            quantify(a(), Quantifier::new(1, None, Greediness::Lazy)),
            "a+?"
        );
    }

    #[test]
    fn test_possessive_degrades_to_greedy() {
        let node = Node::quantified(
            Node::unknown_meta("\\K"),
            Quantifier::one_or_more().with_greediness(Greediness::Possessive),
        );
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "");
        // The quantifier reports before its operand.
        let kinds: Vec<_> = result.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(
            kinds,
            vec![DiagnosticKind::PossessiveQuantifier, DiagnosticKind::UnknownMeta]
        );
        assert_eq!(result.diagnostics[1].node.path, NodePath::new(vec![0]));

        let node = Node::quantified(
            Node::literal("a"),
            Quantifier::zero_or_more().with_greediness(Greediness::Possessive),
        );
        assert_eq!(convert_tree(&node).unwrap().fragment, "a*");
    }

    #[test]
    fn test_chained_quantifiers_are_wrapped() {
        let inner = Node::quantified(Node::literal("a"), Quantifier::one_or_more());
        assert_eq!(quantify(inner, Quantifier::optional()), "(?:a+)?");
    }

    #[test]
    fn test_dot_all_operand_is_an_atom() {
        let node = Node::sequence(vec![
            Node::inline_switch("m", ""),
            Node::quantified(Node::dot(), Quantifier::zero_or_more()),
        ]);
        assert_eq!(convert_tree(&node).unwrap().fragment, "(?:.|\\n)*");
    }

    #[test]
    fn test_assertions_are_wrapped() {
        assert_eq!(
            quantify(Node::Anchor(Anchor::WordBoundary), Quantifier::optional()),
            "(?:\\b)?"
        );
        let lookbehind = Node::group_of(GroupKind::Lookbehind, Node::literal("a"));
        assert_eq!(
            quantify(lookbehind, Quantifier::zero_or_more()),
            "(?:(?<=a))*"
        );
    }
}
