use tracing::{Level, event};

use crate::constants;
use crate::devcaps::{DeviceCapabilities, Formats, SourceCapabilities, SourceKind};
use crate::soap::parser::{DevcapsError, fields, source};
use crate::xml::Scope;

/// Collects the `scan:FormatValue` entries of `scan:FormatsSupported`
fn parse_formats(scope: &mut Scope<'_, '_>) -> Result<Formats, DevcapsError> {
    let mut formats = Formats::empty();

    while let Some(path) = scope.next_element()? {
        if path == "/scan:FormatValue" {
            let tag = scope.read_text()?;

            match fields::tag_to_flag(fields::FORMAT_VALUES, &tag) {
                Some(format) => formats |= format,
                None => {
                    event!(Level::TRACE, %tag, "ignoring unknown format");
                },
            }
        }
    }

    Ok(formats)
}

fn commit_source(caps: &mut DeviceCapabilities, kind: SourceKind, source: SourceCapabilities) {
    let resolutions = source.resolutions.len();

    if caps.insert_source(kind, source) {
        event!(Level::DEBUG, source = %kind, resolutions, "accepted source");
    } else {
        event!(Level::DEBUG, source = %kind, "ignoring duplicate source");
    }
}

/// The device reports ADF front and back instead of simplex and duplex. Front applies to both modes,
/// back only to duplex.
fn resolve_duplex(
    caps: &mut DeviceCapabilities,
    adf: bool,
    duplex: bool,
) -> Result<(), DevcapsError> {
    if !(adf && duplex) {
        if caps.take_source(SourceKind::AdfDuplex).is_some() {
            event!(
                Level::DEBUG,
                "ignoring ADF back, device doesn't support duplex"
            );
        }

        return Ok(());
    }

    let Some(front) = caps.source(SourceKind::AdfSimplex) else {
        return Err(DevcapsError::InvariantViolated(
            "ADF duplex without ADF front",
        ));
    };

    let duplex_source = match caps.source(SourceKind::AdfDuplex) {
        None => Some(front.clone()),
        Some(back) => {
            let merged = front.merge(back, constants::RESOLUTION_UNITS);

            if merged.is_none() {
                event!(
                    Level::DEBUG,
                    "ADF front and back have nothing in common, duplex disabled"
                );
            }

            merged
        },
    };

    caps.replace_source(SourceKind::AdfDuplex, duplex_source);

    Ok(())
}

/// Parses `scan:ScannerConfiguration`, then finalizes the device's sources
pub fn parse_configuration(
    scope: &mut Scope<'_, '_>,
    caps: &mut DeviceCapabilities,
) -> Result<(), DevcapsError> {
    let mut adf = false;
    let mut duplex = false;
    let mut formats = Formats::empty();

    while let Some(path) = scope.next_element()? {
        match path {
            "/scan:DeviceSettings/scan:FormatsSupported" => {
                formats |= scope.descend(parse_formats)?;
            },
            "/scan:Platen" => {
                let source =
                    scope.descend(|scope| source::parse_source(scope, SourceKind::Flatbed))?;

                commit_source(caps, SourceKind::Flatbed, source);
            },
            "/scan:ADF/scan:ADFFront" => {
                adf = true;

                let source =
                    scope.descend(|scope| source::parse_source(scope, SourceKind::AdfSimplex))?;

                commit_source(caps, SourceKind::AdfSimplex, source);
            },
            "/scan:ADF/scan:ADFBack" => {
                let source =
                    scope.descend(|scope| source::parse_source(scope, SourceKind::AdfDuplex))?;

                commit_source(caps, SourceKind::AdfDuplex, source);
            },
            "/scan:ADF/scan:ADFSupportsDuplex" => {
                duplex = fields::parse_bool(&scope.read_text()?);
            },
            _ => {},
        }
    }

    for source in caps.sources_mut() {
        source.formats |= formats;
        source.update_window(constants::RESOLUTION_UNITS);
    }

    resolve_duplex(caps, adf, duplex)?;

    if !caps.rebuild_source_names() {
        return Err(DevcapsError::NoSources);
    }

    Ok(())
}
