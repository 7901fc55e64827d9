use crate::devcaps::{ColorModes, Formats};
use crate::soap::parser::DevcapsError;
use crate::xml::Scope;

pub const COLOR_ENTRIES: &[(&str, ColorModes)] = &[
    ("BlackAndWhite1", ColorModes::BW1),
    ("Grayscale8", ColorModes::GRAYSCALE),
    ("RGB24", ColorModes::COLOR),
];

pub const FORMAT_VALUES: &[(&str, Formats)] = &[
    ("jfif", Formats::JPEG),
    ("pdf-a", Formats::PDF),
    ("png", Formats::PNG),
];

/// Stores `value` unless `target` already holds something. Empty values are never stored.
pub fn set_first_string(target: &mut Option<Box<str>>, value: String) {
    if target.is_none() && !value.is_empty() {
        *target = Some(value.into_boxed_str());
    }
}

/// Reads the current element's text as a non-negative decimal number
pub fn read_uint(scope: &mut Scope<'_, '_>, element: &'static str) -> Result<u32, DevcapsError> {
    let text = scope.read_text()?;

    text.parse::<u32>()
        .map_err(|_| DevcapsError::MalformedValue {
            element,
            value: text.into_boxed_str(),
        })
}

/// Stores `value` unless `target` was already set
pub fn set_first_uint(target: &mut Option<u32>, value: u32) {
    if target.is_none() {
        *target = Some(value);
    }
}

/// Looks up a tag, exact and case-sensitive. Unknown tags yield `None`.
pub fn tag_to_flag<F>(table: &[(&str, F)], tag: &str) -> Option<F>
where
    F: Copy,
{
    table
        .iter()
        .find(|&&(known, _)| known == tag)
        .map(|&(_, flag)| flag)
}

/// `1` and `true` mean true, anything else means false
pub fn parse_bool(text: &str) -> bool {
    matches!(text, "1" | "true")
}
