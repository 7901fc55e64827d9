use std::collections::BTreeSet;

use tracing::{Level, event};

use crate::constants;
use crate::devcaps::{ColorModes, Formats, MmRange, SourceCapabilities, SourceKind};
use crate::soap::parser::fields;
use crate::soap::parser::{Axis, Bound, DevcapsError};
use crate::xml::Scope;

/// The elements of a source that carry a value, Platen and ADF spellings alike
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SourceField {
    ResolutionWidth,
    ResolutionHeight,
    MinWidth,
    MinHeight,
    MaxWidth,
    MaxHeight,
    ColorEntry,
}

impl SourceField {
    fn from_relative_path(path: &str) -> Option<SourceField> {
        let field = match path {
            "/scan:PlatenResolutions/scan:Widths/scan:Width"
            | "/scan:ADFResolutions/scan:Widths/scan:Width" => SourceField::ResolutionWidth,
            "/scan:PlatenResolutions/scan:Heights/scan:Height"
            | "/scan:ADFResolutions/scan:Heights/scan:Height" => SourceField::ResolutionHeight,
            "/scan:PlatenMinimumSize/scan:Width" | "/scan:ADFMinimumSize/scan:Width" => {
                SourceField::MinWidth
            },
            "/scan:PlatenMinimumSize/scan:Height" | "/scan:ADFMinimumSize/scan:Height" => {
                SourceField::MinHeight
            },
            "/scan:PlatenMaximumSize/scan:Width" | "/scan:ADFMaximumSize/scan:Width" => {
                SourceField::MaxWidth
            },
            "/scan:PlatenMaximumSize/scan:Height" | "/scan:ADFMaximumSize/scan:Height" => {
                SourceField::MaxHeight
            },
            "/scan:PlatenColor/scan:ColorEntry" | "/scan:ADFColor/scan:ColorEntry" => {
                SourceField::ColorEntry
            },
            _ => return None,
        };

        Some(field)
    }

    fn element(self) -> &'static str {
        match self {
            SourceField::ResolutionWidth => "Width",
            SourceField::ResolutionHeight => "Height",
            SourceField::MinWidth => "MinimumSize/Width",
            SourceField::MinHeight => "MinimumSize/Height",
            SourceField::MaxWidth => "MaximumSize/Width",
            SourceField::MaxHeight => "MaximumSize/Height",
            SourceField::ColorEntry => "ColorEntry",
        }
    }
}

/// Resolutions that are listed for both axes
fn intersect_resolutions(widths: &[u32], heights: &[u32]) -> BTreeSet<u32> {
    let heights = heights.iter().copied().collect::<BTreeSet<_>>();

    widths
        .iter()
        .copied()
        .filter(|width| heights.contains(width))
        .collect()
}

fn require(value: Option<u32>, kind: SourceKind, bound: Bound) -> Result<u32, DevcapsError> {
    value.ok_or(DevcapsError::MissingBound {
        source_kind: kind,
        bound,
    })
}

/// Parses the subtree of a `scan:Platen`, `scan:ADFFront` or `scan:ADFBack` element.
///
/// The source's formats are left empty, they are device wide and filled in once the whole
/// configuration is known.
pub fn parse_source(
    scope: &mut Scope<'_, '_>,
    kind: SourceKind,
) -> Result<SourceCapabilities, DevcapsError> {
    let mut widths = vec![];
    let mut heights = vec![];
    let mut color_modes = ColorModes::empty();
    let mut min_width = None;
    let mut min_height = None;
    let mut max_width = None;
    let mut max_height = None;

    while let Some(path) = scope.next_element()? {
        let Some(field) = SourceField::from_relative_path(path) else {
            continue;
        };

        match field {
            SourceField::ResolutionWidth => {
                widths.push(fields::read_uint(scope, field.element())?);
            },
            SourceField::ResolutionHeight => {
                heights.push(fields::read_uint(scope, field.element())?);
            },
            SourceField::MinWidth => {
                let value = fields::read_uint(scope, field.element())?;
                fields::set_first_uint(&mut min_width, value);
            },
            SourceField::MinHeight => {
                let value = fields::read_uint(scope, field.element())?;
                fields::set_first_uint(&mut min_height, value);
            },
            SourceField::MaxWidth => {
                let value = fields::read_uint(scope, field.element())?;
                fields::set_first_uint(&mut max_width, value);
            },
            SourceField::MaxHeight => {
                let value = fields::read_uint(scope, field.element())?;
                fields::set_first_uint(&mut max_height, value);
            },
            SourceField::ColorEntry => {
                let tag = scope.read_text()?;

                match fields::tag_to_flag(fields::COLOR_ENTRIES, &tag) {
                    Some(mode) => color_modes |= mode,
                    None => {
                        event!(Level::TRACE, source = %kind, %tag, "ignoring unknown color entry");
                    },
                }
            },
        }
    }

    let resolutions = intersect_resolutions(&widths, &heights);

    if resolutions.is_empty() {
        return Err(DevcapsError::NoResolutions(kind));
    }

    let color_modes = color_modes & constants::COLOR_MODES_SUPPORTED;

    if color_modes.is_empty() {
        return Err(DevcapsError::NoColorModes(kind));
    }

    let min_width_px = require(min_width, kind, Bound::MinWidth)?;
    let min_height_px = require(min_height, kind, Bound::MinHeight)?;
    let max_width_px = require(max_width, kind, Bound::MaxWidth)?;
    let max_height_px = require(max_height, kind, Bound::MaxHeight)?;

    if min_width_px > max_width_px {
        return Err(DevcapsError::InvertedRange {
            source_kind: kind,
            axis: Axis::Width,
        });
    }

    if min_height_px > max_height_px {
        return Err(DevcapsError::InvertedRange {
            source_kind: kind,
            axis: Axis::Height,
        });
    }

    let mut source = SourceCapabilities {
        resolutions,
        discrete_resolutions: true,
        color_modes,
        formats: Formats::empty(),
        min_width_px,
        max_width_px,
        min_height_px,
        max_height_px,
        window_x_range_mm: MmRange::default(),
        window_y_range_mm: MmRange::default(),
    };

    source.update_window(constants::RESOLUTION_UNITS);

    Ok(source)
}
