pub mod configuration;
pub mod description;
pub mod fields;
pub mod source;

use thiserror::Error;
use tracing::{Level, event};

use crate::constants;
use crate::devcaps::{DeviceCapabilities, SourceKind};
use crate::utils::SliceDisplay;
use crate::xml::{XmlError, XmlReader};

const SCANNER_DESCRIPTION: &str = "s:Envelope/s:Body/scan:GetScannerElementsResponse/scan:ScannerElements/scan:ElementData/scan:ScannerDescription";
const SCANNER_CONFIGURATION: &str = "s:Envelope/s:Body/scan:GetScannerElementsResponse/scan:ScannerElements/scan:ElementData/scan:ScannerConfiguration";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    MinWidth,
    MinHeight,
    MaxWidth,
    MaxHeight,
}

impl std::fmt::Display for Bound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound = match *self {
            Bound::MinWidth => "minimum width",
            Bound::MinHeight => "minimum height",
            Bound::MaxWidth => "maximum width",
            Bound::MaxHeight => "maximum height",
        };

        write!(f, "{}", bound)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl std::fmt::Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match *self {
            Axis::Width => write!(f, "width"),
            Axis::Height => write!(f, "height"),
        }
    }
}

#[derive(Debug, Error)]
pub enum DevcapsError {
    #[error("Malformed XML: {0}")]
    MalformedXml(#[from] XmlError),
    #[error("Malformed value in `{element}`: `{value}`")]
    MalformedValue {
        element: &'static str,
        value: Box<str>,
    },
    #[error("{0}: no resolutions defined")]
    NoResolutions(SourceKind),
    #[error("{0}: no color modes defined")]
    NoColorModes(SourceKind),
    #[error("{source_kind}: {bound} not defined")]
    MissingBound { source_kind: SourceKind, bound: Bound },
    #[error("{source_kind}: minimum {axis} > maximum {axis}")]
    InvertedRange { source_kind: SourceKind, axis: Axis },
    #[error("Neither platen nor ADF sources detected")]
    NoSources,
    #[error("Invariant violated: {0}")]
    InvariantViolated(&'static str),
}

/// Decodes a `GetScannerElementsResponse` into `caps`.
///
/// On success the vendor and model are defaulted if the device didn't name itself, and the protocol
/// and its resolution units are recorded. On failure `caps` is reset, nothing partial is kept.
pub fn decode_capabilities(caps: &mut DeviceCapabilities, raw: &[u8]) -> Result<(), DevcapsError> {
    if let Err(error) = parse_capabilities(caps, raw) {
        if let DevcapsError::InvariantViolated(_) = error {
            event!(Level::ERROR, %error, "Decoding device capabilities hit a bug");
        } else {
            event!(Level::DEBUG, %error, "Failed to decode device capabilities");
        }

        caps.reset();

        return Err(error);
    }

    if caps.vendor.is_none() {
        caps.vendor = Some(Box::from(constants::FALLBACK_VENDOR));
    }

    if caps.model.is_none() {
        caps.model = Some(Box::from(constants::FALLBACK_MODEL));
    }

    caps.protocol_name = Some(constants::PROTOCOL_NAME);
    caps.resolution_units = constants::RESOLUTION_UNITS;

    event!(
        Level::DEBUG,
        model = caps.model.as_deref(),
        sources = %SliceDisplay(&caps.enumerable_source_names),
        "Decoded device capabilities"
    );

    Ok(())
}

fn parse_capabilities(caps: &mut DeviceCapabilities, raw: &[u8]) -> Result<(), DevcapsError> {
    let mut reader = XmlReader::new(raw);
    let mut document = reader.document();

    while let Some(path) = document.next_element()? {
        match path {
            SCANNER_DESCRIPTION => {
                document.descend(|scope| description::parse_description(scope, caps))?;
            },
            SCANNER_CONFIGURATION => {
                document.descend(|scope| configuration::parse_configuration(scope, caps))?;
            },
            _ => {},
        }
    }

    // a response without a configuration never got its sources checked
    if !caps.rebuild_source_names() {
        return Err(DevcapsError::NoSources);
    }

    Ok(())
}
