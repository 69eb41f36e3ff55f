//! Alternation branch manager
//!
//! Branches are converted one by one against the same incoming scope. A
//! branch whose output is dropped entirely is pruned; the diagnostics it
//! produced move into the pruning diagnostic so the caller still sees why.

use super::{Context, Fragment, Output, Shape};
use crate::ast::Node;
use crate::diagnostics::DiagnosticKind;
use crate::error::ConvertError;

/// Convert the branches of an alternation, pruning depleted ones
///
/// Survivors keep their order. A single survivor is emitted without a
/// separator; no survivors at all drops the whole alternation.
pub fn convert_alternation(
    branches: &[Node],
    cx: &mut Context<'_>,
) -> Result<Output, ConvertError> {
    let incoming = cx.scope();
    let mut survivors = Vec::with_capacity(branches.len());

    for (index, branch) in branches.iter().enumerate() {
        // Inline switches of the previous branch must not leak into this one.
        cx.scopes_mut().restore(incoming);
        let checkpoint = cx.diagnostics().checkpoint();

        match cx.convert_child(branch, index)? {
            Output::Emitted(fragment) => survivors.push(fragment),
            Output::Dropped => {
                let causes = cx.diagnostics_mut().split_off(checkpoint);
                log::debug!(branch = index, causes = causes.len(); "pruned depleted branch");
                let path = cx.path().child(index);
                cx.report_at(DiagnosticKind::DepletedBranch, path, branch.to_source_string())
                    .related(causes)
                    .emit();
            }
        }
    }
    cx.scopes_mut().restore(incoming);

    if survivors.len() > 1 {
        let texts: Vec<&str> = survivors.iter().map(|f| f.text.as_str()).collect();
        return Ok(Fragment::new(texts.join("|"), Shape::Disjunction).into());
    }

    match survivors.pop() {
        Some(survivor) => Ok(survivor.into()),
        None => {
            let source: Vec<String> = branches.iter().map(Node::to_source_string).collect();
            cx.report(DiagnosticKind::DepletedAlternation, source.join("|"))
                .emit();
            Ok(Output::Dropped)
        }
    }
}
