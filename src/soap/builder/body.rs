pub mod get_scanner_elements;

use std::io::Write;

use quick_xml::Writer;

pub trait WriteBody<W>
where
    W: Write,
{
    fn write_body(self, writer: &mut Writer<W>) -> Result<(), quick_xml::Error>;
}
