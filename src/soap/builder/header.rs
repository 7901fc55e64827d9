pub mod reply_to;

use std::io::Write;

use quick_xml::Writer;

pub trait WriteExtraHeaders<W>
where
    W: Write,
{
    fn write_extra_headers(self, writer: &mut Writer<W>) -> Result<(), quick_xml::Error>;
}
