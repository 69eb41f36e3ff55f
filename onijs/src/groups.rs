//! Group registry for tracking capture groups
//!
//! Converting a pattern changes which groups capture: option groups and the
//! atomic group emulation add captures to the output, and Onigmo stops plain
//! groups from capturing as soon as a named group exists. The registry is
//! built in a pre-pass over the tree and records, for every group node in
//! walk order, its source capture number and the capture number it gets in
//! the output. This is essential for:
//! - Rewriting numbered backreferences to their new group numbers
//! - Resolving relative backreferences such as `\k<-1>`
//! - Detecting duplicate group names

use std::collections::HashMap;

use crate::ast::{GroupKind, Meta, Node};

/// Numbering decided for one group node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GroupPlan {
    /// Capture number in the source pattern (1-based)
    pub source: Option<u32>,
    /// Capture number in the converted pattern (1-based)
    pub target: Option<u32>,
    /// A named group reusing an earlier group's name
    pub duplicate: bool,
}

/// Registry for tracking capture groups
#[derive(Debug, Clone, Default)]
pub struct GroupRegistry {
    /// Plans indexed by the group's position in walk order
    plans: Vec<GroupPlan>,
    /// Map from source capture number to target capture number
    source_to_target: HashMap<u32, Option<u32>>,
    /// Map from group name to the source number of its first definition
    name_to_index: HashMap<String, u32>,
    /// Whether the pattern has named groups
    has_named: bool,
    source_count: u32,
    target_count: u32,
}

impl GroupRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        GroupRegistry::default()
    }

    /// Plan of the group at `ordinal` in walk order
    pub fn plan(&self, ordinal: usize) -> Option<&GroupPlan> {
        self.plans.get(ordinal)
    }

    /// Target capture number of source group `source`
    ///
    /// `None` when the group does not exist or does not capture in the output.
    pub fn target_of(&self, source: u32) -> Option<u32> {
        self.source_to_target.get(&source).copied().flatten()
    }

    /// Check if a group name exists
    pub fn has_name(&self, name: &str) -> bool {
        self.name_to_index.contains_key(name)
    }

    /// Get the source number of a named group
    pub fn get_by_name(&self, name: &str) -> Option<u32> {
        self.name_to_index.get(name).copied()
    }

    /// Whether the pattern has named groups
    pub fn has_named_groups(&self) -> bool {
        self.has_named
    }

    /// Number of capture groups in the source pattern
    pub fn source_count(&self) -> u32 {
        self.source_count
    }

    /// Number of capture groups in the converted pattern
    pub fn target_count(&self) -> u32 {
        self.target_count
    }

    /// Number of source captures opened before the group at `ordinal`
    pub fn sources_before(&self, ordinal: usize) -> u32 {
        self.plans
            .iter()
            .take(ordinal)
            .filter(|plan| plan.source.is_some())
            .count() as u32
    }

    fn register(&mut self, kind: &GroupKind, has_options: bool) {
        let mut plan = GroupPlan::default();
        match kind {
            GroupKind::Capturing if !self.has_named => {
                plan.source = Some(self.next_source());
                plan.target = Some(self.next_target());
            }
            GroupKind::Named(name) => {
                let source = self.next_source();
                plan.source = Some(source);
                if self.name_to_index.contains_key(name) {
                    plan.duplicate = true;
                } else {
                    self.name_to_index.insert(name.clone(), source);
                    plan.target = Some(self.next_target());
                }
            }
            GroupKind::NonCapturing if has_options => {
                plan.target = Some(self.next_target());
            }
            GroupKind::Atomic => {
                plan.target = Some(self.next_target());
            }
            _ => {}
        }
        if let Some(source) = plan.source {
            self.source_to_target.insert(source, plan.target);
        }
        self.plans.push(plan);
    }

    fn next_source(&mut self) -> u32 {
        self.source_count += 1;
        self.source_count
    }

    fn next_target(&mut self) -> u32 {
        self.target_count += 1;
        self.target_count
    }
}

/// A visitor that collects group information from a tree
pub struct GroupCollector;

impl GroupCollector {
    /// Build the registry for `root`
    ///
    /// The walk is iterative so that pathological nesting is left to the
    /// converter's depth limit instead of overflowing the stack here.
    pub fn collect(root: &Node) -> GroupRegistry {
        let mut registry = GroupRegistry::new();
        registry.has_named = preorder(root)
            .any(|node| matches!(node, Node::Group(g) if matches!(g.kind, GroupKind::Named(_))));

        for node in preorder(root) {
            if let Node::Group(group) = node {
                registry.register(&group.kind, group.options.is_some());
            }
        }
        registry
    }
}

/// Nodes in the order the converter enters them. Bodies of absent groups
/// are skipped because the converter drops them unvisited.
fn preorder(root: &Node) -> impl Iterator<Item = &Node> {
    let mut stack = vec![root];
    std::iter::from_fn(move || {
        let node = stack.pop()?;
        match node {
            Node::Sequence(children) | Node::Meta(Meta::Alternation(children)) => {
                stack.extend(children.iter().rev());
            }
            Node::Group(group) if group.kind != GroupKind::Absent => stack.push(&group.body),
            Node::Quantified(quantified) => stack.push(&quantified.node),
            _ => {}
        }
        Some(node)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Node;

    fn plans(registry: &GroupRegistry) -> Vec<GroupPlan> {
        (0..)
            .map_while(|i| registry.plan(i).copied())
            .collect()
    }

    #[test]
    fn test_plain_groups_number_in_order() {
        let root = Node::sequence(vec![
            Node::group(Node::literal("a")),
            Node::group(Node::group(Node::literal("b"))),
        ]);
        let registry = GroupCollector::collect(&root);
        assert_eq!(registry.source_count(), 3);
        assert_eq!(registry.target_count(), 3);
        assert_eq!(registry.target_of(2), Some(2));
        assert_eq!(registry.target_of(4), None);
    }

    #[test]
    fn test_option_groups_shift_targets() {
        // (?m:.)(a)\1
        let root = Node::sequence(vec![
            Node::option_group("m", "", Node::dot()),
            Node::group(Node::literal("a")),
        ]);
        let registry = GroupCollector::collect(&root);
        assert_eq!(registry.source_count(), 1);
        assert_eq!(registry.target_count(), 2);
        assert_eq!(registry.target_of(1), Some(2));
        assert_eq!(plans(&registry)[0].source, None);
    }

    #[test]
    fn test_named_groups_disable_plain_captures() {
        let root = Node::sequence(vec![
            Node::group(Node::literal("a")),
            Node::named_group("n", Node::literal("b")),
        ]);
        let registry = GroupCollector::collect(&root);
        assert!(registry.has_named_groups());
        assert_eq!(registry.source_count(), 1);
        assert_eq!(registry.get_by_name("n"), Some(1));
        assert_eq!(plans(&registry)[0], GroupPlan::default());
    }

    #[test]
    fn test_duplicate_names() {
        let root = Node::alternation(vec![
            Node::named_group("x", Node::literal("a")),
            Node::named_group("x", Node::literal("b")),
        ]);
        let registry = GroupCollector::collect(&root);
        let plans = plans(&registry);
        assert!(!plans[0].duplicate);
        assert!(plans[1].duplicate);
        assert_eq!(plans[1].source, Some(2));
        assert_eq!(plans[1].target, None);
        assert_eq!(registry.target_count(), 1);
    }

    #[test]
    fn test_absent_group_bodies_are_skipped() {
        let root = Node::sequence(vec![
            Node::group_of(GroupKind::Absent, Node::group(Node::literal("a"))),
            Node::group(Node::literal("b")),
        ]);
        let registry = GroupCollector::collect(&root);
        assert_eq!(registry.source_count(), 1);
        assert_eq!(plans(&registry).len(), 2);
    }

    #[test]
    fn test_sources_before() {
        let root = Node::sequence(vec![
            Node::group(Node::literal("a")),
            Node::non_capturing_group(Node::literal("b")),
            Node::group(Node::literal("c")),
        ]);
        let registry = GroupCollector::collect(&root);
        assert_eq!(registry.sources_before(0), 0);
        assert_eq!(registry.sources_before(2), 1);
        assert_eq!(registry.sources_before(3), 2);
    }

    #[test]
    fn test_atomic_groups_reserve_a_target() {
        let root = Node::sequence(vec![
            Node::group_of(GroupKind::Atomic, Node::literal("a")),
            Node::group(Node::literal("b")),
        ]);
        let registry = GroupCollector::collect(&root);
        assert_eq!(registry.target_of(1), Some(2));
    }
}
