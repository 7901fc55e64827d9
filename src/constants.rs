use const_format::concatcp;

use crate::devcaps::ColorModes;

pub const XML_SOAP11_NAMESPACE: &str = "http://schemas.xmlsoap.org/soap/envelope/";
pub const XML_SOAP_NAMESPACE: &str = "http://www.w3.org/2003/05/soap-envelope";
pub const XML_WSA_NAMESPACE: &str = "http://schemas.xmlsoap.org/ws/2004/08/addressing";
pub const XML_WSD_NAMESPACE: &str = "http://schemas.xmlsoap.org/ws/2005/04/discovery";
pub const XML_SCAN_NAMESPACE: &str = "http://schemas.microsoft.com/windows/2006/08/wdp/scan";

pub const WSA_ANON: &str = concatcp!(XML_WSA_NAMESPACE, "/role/anonymous");

pub const WSD_SCAN_GET_SCANNER_ELEMENTS: &str =
    concatcp!(XML_SCAN_NAMESPACE, "/GetScannerElements");

pub const MIME_TYPE_SOAP_XML: &str = "application/soap+xml; charset=utf-8";

/// Prefixes the reader reports for known namespaces, so that paths can be matched
/// regardless of the prefixes a device chose. Matching ignores the `http`/`https`
/// distinction and a trailing slash.
pub const READER_NAMESPACES: &[(&str, &str)] = &[
    ("s", XML_SOAP11_NAMESPACE),
    ("s", XML_SOAP_NAMESPACE),
    ("d", XML_WSD_NAMESPACE),
    ("a", XML_WSA_NAMESPACE),
    ("scan", XML_SCAN_NAMESPACE),
];

/// Namespaces declared on the envelope of every request we write.
pub const WRITER_NAMESPACES: &[(&str, &str)] = &[
    ("s", XML_SOAP_NAMESPACE),
    ("d", XML_WSD_NAMESPACE),
    ("a", XML_WSA_NAMESPACE),
    ("scan", XML_SCAN_NAMESPACE),
];

pub const PROTOCOL_NAME: &str = "WSD";

/// WS-Scan sizes and resolutions are expressed in 1/1000 of an inch
pub const RESOLUTION_UNITS: u32 = 1000;

pub const COLOR_MODES_SUPPORTED: ColorModes = ColorModes::GRAYSCALE.union(ColorModes::COLOR);

pub const FALLBACK_VENDOR: &str = "Unknown";
pub const FALLBACK_MODEL: &str = "Unknown";

pub const STRING_DEFAULT_CAPACITY: usize = 64;
