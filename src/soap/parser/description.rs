use crate::devcaps::DeviceCapabilities;
use crate::soap::parser::DevcapsError;
use crate::soap::parser::fields;
use crate::xml::Scope;

/// Parses `scan:ScannerDescription`. Only the scanner's name is of interest, it becomes the model.
pub fn parse_description(
    scope: &mut Scope<'_, '_>,
    caps: &mut DeviceCapabilities,
) -> Result<(), DevcapsError> {
    while let Some(path) = scope.next_element()? {
        if path == "/scan:ScannerName" {
            let name = scope.read_text()?;

            fields::set_first_string(&mut caps.model, name);
        }
    }

    Ok(())
}
