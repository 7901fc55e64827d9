mod body;
mod header;

use std::io::Write;

use bytes::Bytes;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use tracing::{Level, event};
use uuid::Uuid;
use uuid::fmt::Urn;

use crate::constants;
use crate::soap::builder::body::WriteBody;
use crate::soap::builder::body::get_scanner_elements::GetScannerElements;
use crate::soap::builder::header::WriteExtraHeaders;
use crate::soap::builder::header::reply_to::ReplyTo;

/// A request that is ready to be sent, together with the id it was sent under
#[derive(Debug, Clone)]
pub struct SoapRequest {
    pub message_id: Urn,
    pub body: Bytes,
}

fn generate_message_id() -> Urn {
    Uuid::new_v4().urn()
}

/// Writes `<name>text</name>`
fn write_text_element<W>(
    writer: &mut Writer<W>,
    name: &str,
    text: &str,
) -> Result<(), quick_xml::Error>
where
    W: Write,
{
    writer
        .create_element(name)
        .write_text_content(BytesText::new(text))?;

    Ok(())
}

struct Builder {}

impl Builder {
    fn new() -> Self {
        Self {}
    }

    fn build_message<H, B>(
        &mut self,
        to_addr: &str,
        action: &str,
        extra_headers: H,
        body: B,
    ) -> Result<SoapRequest, quick_xml::Error>
    where
        H: WriteExtraHeaders<Vec<u8>>,
        B: WriteBody<Vec<u8>>,
    {
        let (message, message_id) =
            self.build_message_tree(to_addr, action, extra_headers, body)?;

        event!(
            Level::DEBUG,
            %to_addr,
            %action,
            %message_id,
            xml = %String::from_utf8_lossy(&message),
            "constructed xml for WSD message",
        );

        Ok(SoapRequest {
            message_id,
            body: Bytes::from(message),
        })
    }

    /// Build a WSD message with a given action string including SOAP header.
    fn build_message_tree<H, B, W>(
        &mut self,
        to_addr: &str,
        action: &str,
        extra_headers: H,
        body: B,
    ) -> Result<(W, Urn), quick_xml::Error>
    where
        H: WriteExtraHeaders<W>,
        B: WriteBody<W>,
        W: Write + Default,
    {
        let message_id = generate_message_id();

        let mut header_and_body = Writer::new(W::default());

        header_and_body.write_event(Event::Decl(BytesDecl::new("1.0", Some("utf-8"), None)))?;

        let mut envelope = BytesStart::new("s:Envelope");

        for &(prefix, namespace) in constants::WRITER_NAMESPACES {
            envelope.push_attribute((format!("xmlns:{}", prefix).as_str(), namespace));
        }

        header_and_body.write_event(Event::Start(envelope))?;

        header_and_body.write_event(Event::Start(BytesStart::new("s:Header")))?;

        write_text_element(
            &mut header_and_body,
            "a:MessageID",
            &message_id.to_string(),
        )?;
        write_text_element(&mut header_and_body, "a:To", to_addr)?;

        extra_headers.write_extra_headers(&mut header_and_body)?;

        write_text_element(&mut header_and_body, "a:Action", action)?;

        header_and_body.write_event(Event::End(BytesEnd::new("s:Header")))?;

        header_and_body.write_event(Event::Start(BytesStart::new("s:Body")))?;

        body.write_body(&mut header_and_body)?;

        header_and_body.write_event(Event::End(BytesEnd::new("s:Body")))?;

        header_and_body.write_event(Event::End(BytesEnd::new("s:Envelope")))?;

        Ok((header_and_body.into_inner(), message_id))
    }
}

/// WS-Scan, `GetScannerElements` request for the scanner's description and configuration
///
/// Every call produces a new message id.
pub fn build_get_scanner_elements() -> SoapRequest {
    let mut builder = Builder::new();

    builder
        .build_message(
            constants::WSA_ANON,
            constants::WSD_SCAN_GET_SCANNER_ELEMENTS,
            ReplyTo::new(constants::WSA_ANON),
            GetScannerElements::new(&["scan:ScannerDescription", "scan:ScannerConfiguration"]),
        )
        .expect("Writing XML into a Vec<u8> cannot fail")
}
