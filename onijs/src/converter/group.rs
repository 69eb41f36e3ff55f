//! Groups
//!
//! Every group pushes a scope frame for its body, derived from the group's
//! local option switch if it has one, and pops it on the way out.
//!
//! Openers follow the capture numbering decided by the registry:
//! - `(...)` captures unless the pattern has named groups
//! - `(?m:...)` becomes a capturing `(...)` in the output
//! - `(?>...)` is emulated as `(?=(...))\N`
//! - `(?~...)` has no equivalent and is dropped

use super::meta::report_rejected;
use super::{CategoryConverter, Context, Fragment, Output, Shape};
use crate::ast::{Group, GroupKind};
use crate::diagnostics::DiagnosticKind;
use crate::error::ConvertError;
use crate::groups::GroupPlan;

pub struct GroupConverter;

impl CategoryConverter for GroupConverter {
    type Node = Group;

    fn convert(&self, group: &Group, cx: &mut Context<'_>) -> Result<Output, ConvertError> {
        let ordinal = cx.enter_group();
        let plan = cx.registry().plan(ordinal).copied().unwrap_or_default();

        if group.kind == GroupKind::Absent {
            cx.report(DiagnosticKind::UnsupportedGroup, group.to_source_string())
                .detail("absence operator `(?~...)`")
                .emit();
            return Ok(Output::Dropped);
        }

        let (_, rejected) = cx.scopes_mut().push(group.options.as_ref());
        if !rejected.is_empty() {
            report_rejected(cx, &rejected, &group.to_source_string());
        }
        if let GroupKind::Named(name) = &group.kind
            && plan.duplicate
        {
            cx.report(DiagnosticKind::DuplicateGroupName, group.to_source_string())
                .detail(format!("`{}`", name))
                .emit();
        }

        let body = cx.convert_child(&group.body, 0);
        cx.scopes_mut().pop()?;

        let body = match body? {
            Output::Emitted(fragment) => fragment,
            // A capture keeps its slot so later references still line up.
            Output::Dropped if plan.target.is_some() => Fragment::empty(),
            Output::Dropped => return Ok(Output::Dropped),
        };
        Ok(wrap(group, &plan, &body.text).into())
    }
}

fn wrap(group: &Group, plan: &GroupPlan, body: &str) -> Fragment {
    let opener = match &group.kind {
        GroupKind::Capturing | GroupKind::NonCapturing | GroupKind::Absent => {
            if plan.target.is_some() { "(" } else { "(?:" }
        }
        GroupKind::Named(_) if plan.duplicate => "(?:",
        GroupKind::Named(name) => return Fragment::atom(format!("(?<{}>{})", name, body)),
        GroupKind::Lookahead => "(?=",
        GroupKind::NegativeLookahead => "(?!",
        GroupKind::Lookbehind => "(?<=",
        GroupKind::NegativeLookbehind => "(?<!",
        GroupKind::Atomic => match plan.target {
            Some(target) => {
                return Fragment {
                    text: format!("(?=({}))\\{}", body, target),
                    shape: Shape::Concat,
                    trailing_reference: true,
                };
            }
            None => "(?:",
        },
    };
    Fragment::atom(format!("{}{})", opener, body))
}

#[cfg(test)]
mod tests {
    use crate::ast::{Backreference, GroupKind, Node, Quantifier};
    use crate::converter::{Converter, convert_tree};
    use crate::diagnostics::DiagnosticKind;

    #[test]
    fn test_option_group_scope() {
        // a(?m:.(?-m:.)).(?m).a
        let node = Node::sequence(vec![
            Node::literal("a"),
            Node::option_group(
                "m",
                "",
                Node::sequence(vec![Node::dot(), Node::option_group("", "m", Node::dot())]),
            ),
            Node::dot(),
            Node::inline_switch("m", ""),
            Node::dot(),
            Node::literal("a"),
        ]);
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "a((?:.|\\n)(.)).(?:.|\\n)a");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_inline_switch_ends_with_group() {
        let node = Node::sequence(vec![
            Node::non_capturing_group(Node::sequence(vec![
                Node::inline_switch("m", ""),
                Node::dot(),
            ])),
            Node::dot(),
        ]);
        assert_eq!(convert_tree(&node).unwrap().fragment, "(?:(?:.|\\n)).");
    }

    #[test]
    fn test_named_groups_make_plain_groups_non_capturing() {
        let node = Node::sequence(vec![
            Node::group(Node::literal("a")),
            Node::named_group("n", Node::literal("b")),
        ]);
        assert_eq!(convert_tree(&node).unwrap().fragment, "(?:a)(?<n>b)");
    }

    #[test]
    fn test_duplicate_name() {
        let node = Node::alternation(vec![
            Node::named_group("x", Node::literal("a")),
            Node::named_group("x", Node::literal("b")),
        ]);
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "(?<x>a)|(?:b)");
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::DuplicateGroupName);
    }

    #[test]
    fn test_lookarounds_pass_through() {
        let node = Node::sequence(vec![
            Node::group_of(GroupKind::Lookbehind, Node::literal("a")),
            Node::group_of(GroupKind::NegativeLookahead, Node::literal("b")),
        ]);
        assert_eq!(convert_tree(&node).unwrap().fragment, "(?<=a)(?!b)");
    }

    #[test]
    fn test_atomic_group_emulation() {
        let node = Node::sequence(vec![
            Node::group(Node::literal("x")),
            Node::quantified(
                Node::group_of(GroupKind::Atomic, Node::literal("a")),
                Quantifier::zero_or_more(),
            ),
            Node::Backreference(Backreference::Number(1)),
        ]);
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "(x)(?:(?=(a))\\2)*\\1");
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn test_absent_group_is_dropped() {
        let node = Node::sequence(vec![
            Node::literal("a"),
            Node::group_of(GroupKind::Absent, Node::unknown_meta("\\K")),
        ]);
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "a");
        // The body is never walked.
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::UnsupportedGroup);
    }

    #[test]
    fn test_dropped_body_of_non_capturing_group() {
        let node = Node::sequence(vec![
            Node::literal("a"),
            Node::non_capturing_group(Node::unknown_meta("\\K")),
        ]);
        assert_eq!(convert_tree(&node).unwrap().fragment, "a");
    }

    #[test]
    fn test_rejected_group_flag() {
        let node = Node::option_group("i", "", Node::literal("a"));
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "(a)");
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::UnsupportedFlag);
    }

    #[test]
    fn test_scope_restored_after_group_under_dot_all() {
        let node = Node::sequence(vec![
            Node::option_group("", "m", Node::dot()),
            Node::dot(),
        ]);
        let converter = Converter::builder().dot_all(true).build();
        let result = converter.convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "(.)(?:.|\\n)");
    }
}
