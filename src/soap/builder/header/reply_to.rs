use std::io::Write;

use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::soap::builder::WriteExtraHeaders;
use crate::soap::builder::write_text_element;

pub struct ReplyTo<'s> {
    address: &'s str,
}

impl<'s> ReplyTo<'s> {
    pub fn new(address: &'s str) -> Self {
        Self { address }
    }
}

impl<W> WriteExtraHeaders<W> for ReplyTo<'_>
where
    W: Write,
{
    fn write_extra_headers(self, writer: &mut Writer<W>) -> Result<(), quick_xml::Error> {
        writer.write_event(Event::Start(BytesStart::new("a:ReplyTo")))?;
        write_text_element(writer, "a:Address", self.address)?;
        writer.write_event(Event::End(BytesEnd::new("a:ReplyTo")))?;

        Ok(())
    }
}
