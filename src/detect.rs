//! Structured source format detection.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Format of a structured input source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// XML document
    Xml,
    /// JSON document
    Json,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Xml => f.write_str("XML"),
            SourceFormat::Json => f.write_str("JSON"),
        }
    }
}

/// UTF-8 byte order mark
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Bytes read from a file when sniffing its format.
const SNIFF_LEN: usize = 512;

/// Detect the format of a structured source file.
///
/// # Example
/// ```no_run
/// use pagebind::detect::detect_format_from_path;
///
/// let format = detect_format_from_path("invoices.xml").unwrap();
/// println!("Customer data is {}", format);
/// ```
pub fn detect_format_from_path<P: AsRef<Path>>(path: P) -> Result<SourceFormat> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|_| Error::InputNotFound(path.to_path_buf()))?;
    let mut header = Vec::with_capacity(SNIFF_LEN);
    BufReader::new(file)
        .take(SNIFF_LEN as u64)
        .read_to_end(&mut header)?;
    detect_format_from_bytes(&header)
}

/// Detect the format of structured source bytes.
///
/// Leading whitespace and a UTF-8 BOM are ignored; `<` means XML,
/// `{` or `[` means JSON.
pub fn detect_format_from_bytes(data: &[u8]) -> Result<SourceFormat> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    match data.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'<') => Ok(SourceFormat::Xml),
        Some(b'{') | Some(b'[') => Ok(SourceFormat::Json),
        Some(_) => Err(Error::UnknownFormat(
            "expected an XML or JSON document".to_string(),
        )),
        None => Err(Error::UnknownFormat("empty document".to_string())),
    }
}

/// Check if bytes look like an XML document.
pub fn is_xml_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(SourceFormat::Xml))
}

/// Check if bytes look like a JSON document.
pub fn is_json_bytes(data: &[u8]) -> bool {
    matches!(detect_format_from_bytes(data), Ok(SourceFormat::Json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_xml() {
        let data = b"<?xml version=\"1.0\"?>\n<Invoices/>";
        assert_eq!(detect_format_from_bytes(data).unwrap(), SourceFormat::Xml);
        assert!(is_xml_bytes(b"\xEF\xBB\xBF  <Pages/>"));
    }

    #[test]
    fn test_detect_json() {
        assert_eq!(
            detect_format_from_bytes(b"  [{\"Id\": 1}]").unwrap(),
            SourceFormat::Json
        );
        assert!(is_json_bytes(b"{\"Invoices\": []}"));
    }

    #[test]
    fn test_detect_unknown() {
        assert!(matches!(
            detect_format_from_bytes(b"Id,Company\n1,Acme"),
            Err(Error::UnknownFormat(_))
        ));
        assert!(matches!(
            detect_format_from_bytes(b"   \n"),
            Err(Error::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_detect_missing_file() {
        let result = detect_format_from_path("/nonexistent/customers.xml");
        assert!(matches!(result, Err(Error::InputNotFound(_))));
    }
}
