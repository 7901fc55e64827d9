use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::soap::builder::WriteBody;
use crate::soap::builder::write_text_element;

/// WS-Scan, `GetScannerElementsRequest`
pub struct GetScannerElements<'e> {
    requested_elements: &'e [&'e str],
}

impl<'e> GetScannerElements<'e> {
    pub fn new(requested_elements: &'e [&'e str]) -> Self {
        Self { requested_elements }
    }
}

impl<W> WriteBody<W> for GetScannerElements<'_>
where
    W: Write,
{
    fn write_body(self, writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
        writer.write_event(Event::Start(BytesStart::new(
            "scan:GetScannerElementsRequest",
        )))?;
        writer.write_event(Event::Start(BytesStart::new("scan:RequestedElements")))?;

        for element in self.requested_elements {
            write_text_element(writer, "scan:Name", element)?;
        }

        writer.write_event(Event::End(BytesEnd::new("scan:RequestedElements")))?;
        writer.write_event(Event::End(BytesEnd::new(
            "scan:GetScannerElementsRequest",
        )))?;

        Ok(())
    }
}
