use bytes::Bytes;
use reqwest::Method;
use tracing::{Level, event};
use url::Url;
use uuid::fmt::Urn;

use crate::constants;
use crate::devcaps::DeviceCapabilities;
use crate::soap::builder;
use crate::soap::parser::{self, DevcapsError};

/// An HTTP request a protocol handler wants the session to perform
#[derive(Debug, Clone)]
pub struct HttpQuery {
    pub method: Method,
    pub url: Url,
    pub content_type: &'static str,
    pub body: Bytes,
    pub message_id: Urn,
}

/// What a protocol handler gets to see of the session
#[derive(Debug, Clone)]
pub struct ProtoCtx {
    pub base_url: Url,
    response: Option<Bytes>,
}

impl ProtoCtx {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            response: None,
        }
    }

    /// Stores the body of the response to the last query
    pub fn set_response(&mut self, response: Bytes) {
        self.response = Some(response);
    }

    /// Body of the response to the last query, empty when none was received
    pub fn response(&self) -> &[u8] {
        self.response.as_deref().unwrap_or_default()
    }
}

/// Outcome of a decode for the phases after capability discovery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum ProtoResult {
    /// The protocol doesn't implement this phase, the session may try another protocol
    Unsupported,
}

/// The operations every protocol family implements.
///
/// Only capability discovery is mandatory, the phases of an actual scan job default to
/// [`ProtoResult::Unsupported`] and never build a query.
pub trait ProtocolHandler: Send + Sync {
    fn name(&self) -> &'static str;

    fn devcaps_query(&self, ctx: &ProtoCtx) -> HttpQuery;

    fn devcaps_decode(
        &self,
        ctx: &ProtoCtx,
        caps: &mut DeviceCapabilities,
    ) -> Result<(), DevcapsError>;

    fn scan_query(&self, _ctx: &ProtoCtx) -> Option<HttpQuery> {
        None
    }

    fn scan_decode(&self, _ctx: &ProtoCtx) -> ProtoResult {
        ProtoResult::Unsupported
    }

    fn load_query(&self, _ctx: &ProtoCtx) -> Option<HttpQuery> {
        None
    }

    fn load_decode(&self, _ctx: &ProtoCtx) -> ProtoResult {
        ProtoResult::Unsupported
    }

    fn status_query(&self, _ctx: &ProtoCtx) -> Option<HttpQuery> {
        None
    }

    fn status_decode(&self, _ctx: &ProtoCtx) -> ProtoResult {
        ProtoResult::Unsupported
    }

    fn cancel_query(&self, _ctx: &ProtoCtx) -> Option<HttpQuery> {
        None
    }
}

/// WS-Scan over WSD. Capability discovery only.
#[derive(Debug, Default)]
pub struct WsdHandler {}

impl WsdHandler {
    pub fn new() -> Self {
        Self {}
    }
}

impl ProtocolHandler for WsdHandler {
    fn name(&self) -> &'static str {
        constants::PROTOCOL_NAME
    }

    fn devcaps_query(&self, ctx: &ProtoCtx) -> HttpQuery {
        let request = builder::build_get_scanner_elements();

        event!(
            Level::DEBUG,
            url = %ctx.base_url,
            message_id = %request.message_id,
            "GetScannerElements"
        );

        HttpQuery {
            method: Method::POST,
            url: ctx.base_url.clone(),
            content_type: constants::MIME_TYPE_SOAP_XML,
            body: request.body,
            message_id: request.message_id,
        }
    }

    fn devcaps_decode(
        &self,
        ctx: &ProtoCtx,
        caps: &mut DeviceCapabilities,
    ) -> Result<(), DevcapsError> {
        parser::decode_capabilities(caps, ctx.response())
    }
}

static WSD_HANDLER: WsdHandler = WsdHandler {};

/// The protocol families known to the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Wsd,
}

impl Protocol {
    pub const ALL: [Protocol; 1] = [Protocol::Wsd];

    pub fn handler(self) -> &'static dyn ProtocolHandler {
        match self {
            Protocol::Wsd => &WSD_HANDLER,
        }
    }

    /// Case-insensitive lookup by handler name
    pub fn from_name(name: &str) -> Option<Protocol> {
        Protocol::ALL
            .into_iter()
            .find(|protocol| protocol.handler().name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for Protocol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.handler().name())
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use reqwest::Method;
    use url::Url;

    use crate::devcaps::{DeviceCapabilities, SourceKind};
    use crate::proto::{ProtoCtx, ProtoResult, Protocol, ProtocolHandler, WsdHandler};
    use crate::soap::parser::DevcapsError;

    fn build_ctx() -> ProtoCtx {
        ProtoCtx::new(Url::parse("http://192.168.1.20:5358/wsd/scan").unwrap())
    }

    #[test]
    fn devcaps_query_posts_soap_to_base_url() {
        let ctx = build_ctx();

        let query = WsdHandler::new().devcaps_query(&ctx);

        assert_eq!(query.method, Method::POST);
        assert_eq!(query.url, ctx.base_url);
        assert_eq!(query.content_type, "application/soap+xml; charset=utf-8");

        let body = String::from_utf8_lossy(&query.body);

        assert!(body.contains(&query.message_id.to_string()));
        assert!(body.contains("GetScannerElementsRequest"));
    }

    #[test]
    fn devcaps_decode_reads_the_response() {
        let mut ctx = build_ctx();
        ctx.set_response(Bytes::from_static(include_bytes!(
            "./test/xml/flatbed-only.xml"
        )));

        let mut caps = DeviceCapabilities::new();

        WsdHandler::new().devcaps_decode(&ctx, &mut caps).unwrap();

        assert!(caps.source(SourceKind::Flatbed).is_some());
        assert_eq!(caps.protocol_name, Some("WSD"));
    }

    #[test]
    fn devcaps_decode_without_response() {
        let ctx = build_ctx();

        let mut caps = DeviceCapabilities::new();

        let result = WsdHandler::new().devcaps_decode(&ctx, &mut caps);

        assert!(matches!(result, Err(DevcapsError::MalformedXml(_))));
    }

    #[test]
    fn scan_phases_are_unsupported() {
        let ctx = build_ctx();
        let handler = Protocol::Wsd.handler();

        assert!(handler.scan_query(&ctx).is_none());
        assert!(handler.load_query(&ctx).is_none());
        assert!(handler.status_query(&ctx).is_none());
        assert!(handler.cancel_query(&ctx).is_none());

        assert_eq!(handler.scan_decode(&ctx), ProtoResult::Unsupported);
        assert_eq!(handler.load_decode(&ctx), ProtoResult::Unsupported);
        assert_eq!(handler.status_decode(&ctx), ProtoResult::Unsupported);
    }

    #[test]
    fn protocol_names() {
        assert_eq!(Protocol::Wsd.to_string(), "WSD");
        assert_eq!(Protocol::from_name("wsd"), Some(Protocol::Wsd));
        assert_eq!(Protocol::from_name("eSCL"), None);
    }
}
