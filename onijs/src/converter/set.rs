//! Character sets
//!
//! Items are converted one at a time. POSIX brackets map to their ASCII
//! ranges and non-negated nested sets are flattened into the outer set.
//! Items JavaScript cannot express are dropped individually; a set left
//! with nothing is dropped as a whole.

use super::{CategoryConverter, Context, Fragment, Output};
use crate::ast::{CharacterType, Set, SetItem};
use crate::diagnostics::{DiagnosticKind, NodePath};
use crate::error::ConvertError;

pub struct SetConverter;

impl CategoryConverter for SetConverter {
    type Node = Set;

    fn convert(&self, set: &Set, cx: &mut Context<'_>) -> Result<Output, ConvertError> {
        let checkpoint = cx.diagnostics().checkpoint();
        let path = cx.path();
        let mut body = String::new();
        let kept = convert_items(&set.items, &path, cx, &mut body);

        if kept == 0 && !set.items.is_empty() {
            let causes = cx.diagnostics_mut().split_off(checkpoint);
            cx.report(DiagnosticKind::EmptySet, set.to_regex_string())
                .related(causes)
                .emit();
            return Ok(Output::Dropped);
        }

        let caret = if set.negated { "^" } else { "" };
        Ok(Fragment::atom(format!("[{}{}]", caret, body)).into())
    }
}

/// Append the converted items to `out`, returning how many were kept
fn convert_items(
    items: &[SetItem],
    path: &NodePath,
    cx: &mut Context<'_>,
    out: &mut String,
) -> usize {
    let mut kept = 0;
    for (index, item) in items.iter().enumerate() {
        let item_path = path.child(index);
        let converted = match item {
            SetItem::Char(c) => Some(c.clone()),
            SetItem::Range(start, end) => Some(format!("{}-{}", start, end)),
            SetItem::CharacterType(ct) => character_type(ct),
            SetItem::Posix {
                name,
                negated: false,
            } => posix_class(name).map(str::to_string),
            SetItem::Posix { negated: true, .. } => None,
            SetItem::Nested(nested) if !nested.negated => {
                if convert_items(&nested.items, &item_path, cx, out) > 0 {
                    kept += 1;
                }
                continue;
            }
            SetItem::Nested(_) => None,
        };

        match converted {
            Some(text) => {
                out.push_str(&text);
                kept += 1;
            }
            None => {
                let source = item.to_regex_string();
                cx.report_at(DiagnosticKind::UnsupportedSetItem, item_path, source)
                    .detail(unsupported_reason(item))
                    .emit();
            }
        }
    }
    kept
}

fn character_type(ct: &CharacterType) -> Option<String> {
    match ct {
        CharacterType::Digit { .. }
        | CharacterType::Word { .. }
        | CharacterType::Space { .. } => Some(ct.to_regex_string()),
        CharacterType::HexDigit { negated: false } => Some("0-9A-Fa-f".to_string()),
        CharacterType::HexDigit { negated: true }
        | CharacterType::Linebreak
        | CharacterType::Grapheme
        | CharacterType::Unknown(_) => None,
    }
}

/// ASCII ranges of the POSIX bracket classes
fn posix_class(name: &str) -> Option<&'static str> {
    let ranges = match name {
        "alpha" => "a-zA-Z",
        "digit" => "0-9",
        "alnum" => "a-zA-Z0-9",
        "upper" => "A-Z",
        "lower" => "a-z",
        "space" => " \\t\\n\\r\\f\\v",
        "xdigit" => "0-9A-Fa-f",
        "punct" => "!-\\/:-@\\[-`{-~",
        "word" => "\\w",
        "blank" => " \\t",
        "cntrl" => "\\x00-\\x1F\\x7F",
        "print" => "\\x20-\\x7E",
        "graph" => "\\x21-\\x7E",
        _ => return None,
    };
    Some(ranges)
}

fn unsupported_reason(item: &SetItem) -> String {
    match item {
        SetItem::Posix { negated: true, .. } => "negated POSIX classes".to_string(),
        SetItem::Posix { name, .. } => format!("unknown POSIX class `{}`", name),
        SetItem::Nested(_) => "negated nested sets".to_string(),
        other => format!("`{}` inside a set", other.to_regex_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;
    use crate::converter::convert_tree;

    fn set(negated: bool, items: Vec<SetItem>) -> Node {
        Node::Set(Set { negated, items })
    }

    fn posix(name: &str, negated: bool) -> SetItem {
        SetItem::Posix {
            name: name.to_string(),
            negated,
        }
    }

    #[test]
    fn test_chars_and_ranges() {
        let node = set(
            true,
            vec![
                SetItem::Char("_".into()),
                SetItem::Range("a".into(), "z".into()),
            ],
        );
        assert_eq!(convert_tree(&node).unwrap().fragment, "[^_a-z]");
    }

    #[test]
    fn test_posix_classes() {
        let node = set(false, vec![posix("alpha", false), posix("digit", false)]);
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "[a-zA-Z0-9]");

        let re = regex::Regex::new(&format!("^{}+$", result.fragment)).unwrap();
        assert!(re.is_match("abcXYZ019"));
        assert!(!re.is_match("a-b"));
    }

    #[test]
    fn test_hex_digit_inside_set() {
        let node = set(
            false,
            vec![SetItem::CharacterType(CharacterType::HexDigit { negated: false })],
        );
        assert_eq!(convert_tree(&node).unwrap().fragment, "[0-9A-Fa-f]");
    }

    #[test]
    fn test_nested_set_is_flattened() {
        let nested = Set {
            negated: false,
            items: vec![SetItem::Char("b".into()), SetItem::Char("c".into())],
        };
        let node = set(false, vec![SetItem::Char("a".into()), SetItem::Nested(nested)]);
        assert_eq!(convert_tree(&node).unwrap().fragment, "[abc]");
    }

    #[test]
    fn test_unsupported_items_are_dropped() {
        let node = set(false, vec![SetItem::Char("a".into()), posix("alpha", true)]);
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "[a]");
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].kind, DiagnosticKind::UnsupportedSetItem);
        assert_eq!(result.diagnostics[0].node.path, NodePath::new(vec![1]));
        assert_eq!(
            result.diagnostics[0].message,
            "dropped unsupported set member: negated POSIX classes"
        );
    }

    #[test]
    fn test_set_without_items_left_is_dropped() {
        let node = Node::sequence(vec![
            Node::literal("a"),
            set(false, vec![posix("bogus", false)]),
        ]);
        let result = convert_tree(&node).unwrap();
        assert_eq!(result.fragment, "a");
        assert_eq!(result.diagnostics.len(), 1);
        let empty = &result.diagnostics[0];
        assert_eq!(empty.kind, DiagnosticKind::EmptySet);
        assert_eq!(empty.related.len(), 1);
        assert_eq!(empty.related[0].node.path, NodePath::new(vec![1, 0]));
    }
}
