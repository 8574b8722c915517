//! Root element sniffing for XML documents.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Namespace URI and local name of a document's first element
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RootElement {
    /// Namespace bound to the element's prefix, empty if none
    pub namespace_uri: String,
    /// Element name without prefix
    pub local_name: String,
}

/// Finds the root element of what looks like an XML document.
///
/// Works on truncated input: only the prolog and the first start tag need to
/// be present. Returns `None` if the data does not start with markup.
pub fn sniff_root(data: &[u8]) -> Option<RootElement> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    let start = data.iter().position(|b| !b.is_ascii_whitespace())?;
    if data[start] != b'<' {
        return None;
    }

    let mut reader = Reader::from_reader(&data[start..]);
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) => return Some(root_of(&e)),
            Ok(Event::Decl(_))
            | Ok(Event::Comment(_))
            | Ok(Event::PI(_))
            | Ok(Event::DocType(_))
            | Ok(Event::Text(_)) => continue,
            _ => return None,
        }
    }
}

fn root_of(start: &BytesStart<'_>) -> RootElement {
    let name = start.name();
    let local_name = String::from_utf8_lossy(name.local_name().as_ref()).into_owned();
    let xmlns_key: Vec<u8> = match name.prefix() {
        Some(prefix) => [b"xmlns:".as_slice(), prefix.as_ref()].concat(),
        None => b"xmlns".to_vec(),
    };

    let namespace_uri = start
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == xmlns_key.as_slice())
        .map(|attr| match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        })
        .unwrap_or_default();

    RootElement {
        namespace_uri,
        local_name,
    }
}
