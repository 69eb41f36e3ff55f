//! Backreferences
//!
//! Numbered references are renumbered through the group registry, since
//! option groups and atomic emulation add captures to the output.

use super::{CategoryConverter, Context, Fragment, Output};
use crate::ast::Backreference;
use crate::diagnostics::DiagnosticKind;
use crate::error::ConvertError;

pub struct BackreferenceConverter;

impl CategoryConverter for BackreferenceConverter {
    type Node = Backreference;

    fn convert(
        &self,
        backref: &Backreference,
        cx: &mut Context<'_>,
    ) -> Result<Output, ConvertError> {
        match backref {
            Backreference::Number(number) => Ok(numbered(*number, backref, cx)),
            Backreference::Named(name) => {
                if cx.registry().has_name(name) {
                    Ok(Fragment::atom(format!("\\k<{}>", name)).into())
                } else {
                    cx.report(DiagnosticKind::UndefinedBackreference, backref.to_source_string())
                        .detail(format!("no group named `{}`", name))
                        .emit();
                    Ok(Output::Dropped)
                }
            }
            Backreference::Relative(offset) => {
                let opened = i64::from(cx.registry().sources_before(cx.group_ordinal()));
                let number = opened + i64::from(*offset) + 1;
                match u32::try_from(number) {
                    Ok(number) if number > 0 && *offset < 0 => Ok(numbered(number, backref, cx)),
                    _ => {
                        cx.report(DiagnosticKind::UndefinedBackreference, backref.to_source_string())
                            .detail(format!("relative group {} does not exist", offset))
                            .emit();
                        Ok(Output::Dropped)
                    }
                }
            }
            Backreference::Call(name) => {
                cx.report(DiagnosticKind::UnsupportedBackreference, backref.to_source_string())
                    .detail(format!("subexpression call to `{}`", name))
                    .emit();
                Ok(Output::Dropped)
            }
        }
    }
}

fn numbered(number: u32, backref: &Backreference, cx: &mut Context<'_>) -> Output {
    let registry = cx.registry();
    if registry.has_named_groups() {
        cx.report(DiagnosticKind::UnsupportedBackreference, backref.to_source_string())
            .detail("numbered references cannot be mixed with named groups")
            .emit();
        return Output::Dropped;
    }

    match registry.target_of(number) {
        Some(target) => Fragment::reference(format!("\\{}", target)).into(),
        None => {
            cx.report(DiagnosticKind::UndefinedBackreference, backref.to_source_string())
                .detail(format!("group {} does not exist", number))
                .emit();
            Output::Dropped
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::ast::{Backreference, Node};
    use crate::converter::convert_tree;
    use crate::diagnostics::DiagnosticKind;

    fn backref(reference: Backreference) -> Node {
        Node::Backreference(reference)
    }

    #[test]
    fn test_numbered_reference_is_renumbered() {
        // (?m:.)(a)\1
        let node = Node::sequence(vec![
            Node::option_group("m", "", Node::dot()),
            Node::group(Node::literal("a")),
            backref(Backreference::Number(1)),
        ]);
        assert_eq!(convert_tree(&node).unwrap().fragment, "((?:.|\\n))(a)\\2");
    }

    #[test]
    fn test_named_reference() {
        let node = Node::sequence(vec![
            Node::named_group("q", Node::literal("'")),
            backref(Backreference::Named("q".into())),
        ]);
        assert_eq!(convert_tree(&node).unwrap().fragment, "(?<q>')\\k<q>");
    }

    #[test]
    fn test_relative_reference() {
        // (a)(b)\k<-1>
        let node = Node::sequence(vec![
            Node::group(Node::literal("a")),
            Node::group(Node::literal("b")),
            backref(Backreference::Relative(-1)),
        ]);
        assert_eq!(convert_tree(&node).unwrap().fragment, "(a)(b)\\2");

        // (a)\k<-1>(b)
        let node = Node::sequence(vec![
            Node::group(Node::literal("a")),
            backref(Backreference::Relative(-1)),
            Node::group(Node::literal("b")),
        ]);
        assert_eq!(convert_tree(&node).unwrap().fragment, "(a)\\1(b)");
    }

    #[test]
    fn test_relative_reference_out_of_range() {
        let node = Node::sequence(vec![
            Node::group(Node::literal("a")),
            backref(Backreference::Relative(-2)),
        ]);
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "(a)");
        assert_eq!(
            result.diagnostics[0].kind,
            DiagnosticKind::UndefinedBackreference
        );
    }

    #[test]
    fn test_undefined_group() {
        let result = convert_tree(&backref(Backreference::Number(3))).unwrap();
        assert_eq!(result.fragment, "");
        assert_eq!(
            result.diagnostics[0].message,
            "dropped backreference to undefined group: group 3 does not exist"
        );
    }

    #[test]
    fn test_numbered_reference_with_named_groups() {
        let node = Node::sequence(vec![
            Node::named_group("n", Node::literal("a")),
            backref(Backreference::Number(1)),
        ]);
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "(?<n>a)");
        assert_eq!(
            result.diagnostics[0].kind,
            DiagnosticKind::UnsupportedBackreference
        );
    }

    #[test]
    fn test_subexpression_call_is_dropped() {
        let node = Node::sequence(vec![
            Node::named_group("n", Node::literal("a")),
            backref(Backreference::Call("n".into())),
        ]);
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "(?<n>a)");
        assert_eq!(result.diagnostics[0].node.source, "\\g<n>");
    }
}
