// src/package/metadata.rs

//! Addon descriptor (`addon.xml`) extraction
//!
//! Every addon archive carries an `addon.xml` at its root whose `<addon>`
//! element names the addon (`id`) and its version (`version`). Identity is
//! read from those two attributes; the package file name is derived from
//! them. The same element, copied verbatim, becomes the addon's entry in the
//! repository index.

use crate::archive;
use crate::error::{Error, Result};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::path::Path;
use tracing::debug;

use super::descriptor::AddonInfo;

/// Fixed path of the addon descriptor inside an artifact
pub const ADDON_DESCRIPTOR: &str = "addon.xml";

/// Root element name of an addon descriptor
const ROOT_ELEMENT: &[u8] = b"addon";

/// Read the raw `addon.xml` text from an artifact
pub fn read_descriptor(artifact: &Path) -> Result<String> {
    let bytes = archive::read_entry(artifact, ADDON_DESCRIPTOR)?.ok_or_else(|| {
        Error::MissingDescriptor {
            artifact: artifact.display().to_string(),
            descriptor: ADDON_DESCRIPTOR.to_string(),
        }
    })?;
    descriptor_text(bytes)
}

/// Extract addon identity from an artifact
pub fn extract(artifact: &Path) -> Result<AddonInfo> {
    debug!("Extracting {} from {}", ADDON_DESCRIPTOR, artifact.display());
    let xml = read_descriptor(artifact)?;
    parse_addon_info(&xml)
}

/// Extract addon identity from descriptor bytes
pub fn extract_from_bytes(bytes: &[u8]) -> Result<AddonInfo> {
    let xml = descriptor_text(bytes.to_vec())?;
    parse_addon_info(&xml)
}

/// Parse `id` and `version` from the root `<addon>` element
pub fn parse_addon_info(xml: &str) -> Result<AddonInfo> {
    let root = find_root(xml)?;
    let addon_id = required_attribute(&root.element, "id")?;
    let addon_version = required_attribute(&root.element, "version")?;
    Ok(AddonInfo::new(addon_id, addon_version))
}

/// Return the `<addon>` element exactly as written in the descriptor
///
/// The XML declaration, comments and whitespace around the root element are
/// dropped; everything from `<addon` to the matching `</addon>` is kept.
pub fn addon_fragment(xml: &str) -> Result<&str> {
    let root = find_root(xml)?;
    Ok(xml[root.span.0..root.span.1].trim())
}

struct RootElement<'a> {
    element: BytesStart<'a>,
    span: (usize, usize),
}

fn find_root(xml: &str) -> Result<RootElement<'_>> {
    let mut reader = Reader::from_str(xml);

    loop {
        let start = reader.buffer_position();
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                check_root_name(&element)?;
                reader
                    .read_to_end(element.name())
                    .map_err(|e| malformed(e, reader.buffer_position()))?;
                let end = reader.buffer_position();
                return Ok(RootElement {
                    element,
                    span: (start, end),
                });
            }
            Ok(Event::Empty(element)) => {
                check_root_name(&element)?;
                let end = reader.buffer_position();
                return Ok(RootElement {
                    element,
                    span: (start, end),
                });
            }
            Ok(Event::Eof) => {
                return Err(Error::MalformedDescriptor(
                    "document has no root element".to_string(),
                ));
            }
            Ok(Event::End(_)) => {
                return Err(Error::MalformedDescriptor(
                    "unexpected closing tag before root element".to_string(),
                ));
            }
            Ok(_) => continue,
            Err(e) => return Err(malformed(e, reader.buffer_position())),
        }
    }
}

fn check_root_name(element: &BytesStart<'_>) -> Result<()> {
    if element.name().as_ref() == ROOT_ELEMENT {
        Ok(())
    } else {
        Err(Error::MalformedDescriptor(format!(
            "root element is <{}>, expected <addon>",
            String::from_utf8_lossy(element.name().as_ref())
        )))
    }
}

fn required_attribute(element: &BytesStart<'_>, name: &str) -> Result<String> {
    let attribute = element
        .try_get_attribute(name)
        .map_err(|e| Error::MalformedDescriptor(format!("invalid attributes on <addon>: {e}")))?
        .ok_or_else(|| {
            Error::MalformedDescriptor(format!("<addon> is missing the '{name}' attribute"))
        })?;

    let value = attribute
        .unescape_value()
        .map_err(|e| Error::MalformedDescriptor(format!("invalid '{name}' attribute: {e}")))?;
    let value = value.trim();

    if value.is_empty() {
        return Err(Error::MalformedDescriptor(format!(
            "<addon> has an empty '{name}' attribute"
        )));
    }
    Ok(value.to_string())
}

fn descriptor_text(bytes: Vec<u8>) -> Result<String> {
    let text = String::from_utf8(bytes).map_err(|e| {
        Error::MalformedDescriptor(format!("{ADDON_DESCRIPTOR} is not valid UTF-8: {e}"))
    })?;
    Ok(match text.strip_prefix('\u{feff}') {
        Some(stripped) => stripped.to_string(),
        None => text,
    })
}

fn malformed(err: quick_xml::Error, position: usize) -> Error {
    Error::MalformedDescriptor(format!("XML error at byte {position}: {err}"))
}
