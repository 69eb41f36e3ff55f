//! Character type shorthands

use super::{CategoryConverter, Context, Fragment, Output};
use crate::ast::CharacterType;
use crate::diagnostics::DiagnosticKind;
use crate::error::ConvertError;

const HEX_DIGIT: &str = "[0-9A-Fa-f]";
const NON_HEX_DIGIT: &str = "[^0-9A-Fa-f]";
const LINEBREAK: &str = "(?:\\r\\n|[\\n\\v\\f\\r\\u0085\\u2028\\u2029])";

pub struct CharacterTypeConverter;

impl CategoryConverter for CharacterTypeConverter {
    type Node = CharacterType;

    fn convert(&self, ct: &CharacterType, cx: &mut Context<'_>) -> Result<Output, ConvertError> {
        let text = match ct {
            CharacterType::Digit { .. }
            | CharacterType::Word { .. }
            | CharacterType::Space { .. } => ct.to_regex_string(),
            CharacterType::HexDigit { negated: false } => HEX_DIGIT.to_string(),
            CharacterType::HexDigit { negated: true } => NON_HEX_DIGIT.to_string(),
            CharacterType::Linebreak => LINEBREAK.to_string(),
            CharacterType::Grapheme => {
                cx.report(DiagnosticKind::UnsupportedCharacterType, ct.to_regex_string())
                    .detail("extended grapheme clusters `\\X`")
                    .emit();
                return Ok(Output::Dropped);
            }
            CharacterType::Unknown(raw) => {
                cx.report(DiagnosticKind::UnsupportedCharacterType, raw.clone())
                    .detail(format!("`{}`", raw))
                    .emit();
                return Ok(Output::Dropped);
            }
        };
        Ok(Fragment::atom(text).into())
    }
}
