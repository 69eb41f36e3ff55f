//! Meta elements: dot, alternation, option switches and unknown elements

use super::{CategoryConverter, Context, Fragment, Output, convert_alternation};
use crate::ast::{Flag, Meta, OptionSwitch, SwitchKind};
use crate::diagnostics::DiagnosticKind;
use crate::error::ConvertError;
use crate::scope::{RejectedFlag, Scope};

/// JavaScript has no inline way to make `.` match line terminators
const DOT_ALL: &str = "(?:.|\\n)";

pub struct MetaConverter;

impl CategoryConverter for MetaConverter {
    type Node = Meta;

    fn convert(&self, meta: &Meta, cx: &mut Context<'_>) -> Result<Output, ConvertError> {
        match meta {
            Meta::Dot => Ok(convert_dot(cx.scope())),
            Meta::Alternation(branches) => convert_alternation(branches, cx),
            Meta::OptionSwitch(switch) => Ok(convert_switch(switch, cx)),
            Meta::Unknown(raw) => {
                cx.report(DiagnosticKind::UnknownMeta, raw.clone())
                    .detail(format!("`{}`", raw))
                    .emit();
                Ok(Output::Dropped)
            }
        }
    }
}

fn convert_dot(scope: Scope) -> Output {
    if scope.dot_all {
        Fragment::atom(DOT_ALL).into()
    } else {
        Fragment::atom(".").into()
    }
}

fn convert_switch(switch: &OptionSwitch, cx: &mut Context<'_>) -> Output {
    match switch.kind {
        SwitchKind::InlinePersistent => {
            let (_, rejected) = cx.scopes_mut().apply_inline(switch);
            report_rejected(cx, &rejected, &switch.to_source_string());
            Fragment::empty().into()
        }
        SwitchKind::GroupScoped => {
            // Group converters apply their own switch; a loose one scopes nothing.
            cx.report(DiagnosticKind::DetachedOptionSwitch, switch.to_source_string())
                .emit();
            Output::Dropped
        }
    }
}

/// Report each flag a switch could not apply
pub(crate) fn report_rejected(cx: &mut Context<'_>, rejected: &[RejectedFlag], source: &str) {
    for rejected in rejected {
        let letter = if rejected.enable {
            rejected.flag.as_char().to_string()
        } else {
            format!("-{}", rejected.flag.as_char())
        };
        let detail = match rejected.flag {
            Flag::IgnoreCase => format!("`{}` can only be set for the whole pattern", letter),
            _ => format!("`{}` has no JavaScript equivalent", letter),
        };
        cx.report(DiagnosticKind::UnsupportedFlag, source)
            .detail(detail)
            .emit();
    }
}
