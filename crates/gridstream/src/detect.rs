//! Content-sniffing format detection.
//!
//! Detection inspects the head (and for Parquet, the tail) of the byte
//! stream without consuming or mutating it: a ZIP central directory is
//! probed for format-specific marker entries, an XML declaration is
//! followed to its root element, and the gzip and Parquet magics are
//! matched directly.

use std::io::Cursor;

use gridstream_core::types::Format;

/// ZIP local-file-header signature.
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
/// gzip stream signature (Gnumeric documents are gzip-compressed XML).
const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
/// Parquet files carry this magic at both ends.
const PARQUET_MAGIC: &[u8] = b"PAR1";

/// Detect the format of a document stream.
pub fn detect(bytes: &[u8]) -> Format {
    if bytes.starts_with(ZIP_MAGIC) {
        return detect_zip(bytes);
    }
    if bytes.starts_with(GZIP_MAGIC) {
        return Format::Gnumeric;
    }
    if bytes.starts_with(PARQUET_MAGIC) && bytes.len() >= 8 && bytes.ends_with(PARQUET_MAGIC) {
        return Format::Parquet;
    }
    if let Some(format) = detect_xml(bytes) {
        return format;
    }
    Format::Unknown
}

/// Probe a ZIP archive's entry names for format markers.
fn detect_zip(bytes: &[u8]) -> Format {
    let Ok(archive) = zip::ZipArchive::new(Cursor::new(bytes)) else {
        return Format::Unknown;
    };
    let names: Vec<&str> = archive.file_names().collect();
    if names.iter().any(|n| *n == "xl/workbook.xml") {
        return Format::Xlsx;
    }
    if names.iter().any(|n| *n == "mimetype") && names.iter().any(|n| *n == "content.xml") {
        return Format::Ods;
    }
    Format::Unknown
}

/// Recognize single-XML-stream formats by their root element.
fn detect_xml(bytes: &[u8]) -> Option<Format> {
    let text = std::str::from_utf8(head(bytes, 4096)).ok()?;
    let trimmed = text.trim_start_matches('\u{feff}').trim_start();
    if !trimmed.starts_with("<?xml") && !trimmed.starts_with('<') {
        return None;
    }

    let root = root_element_name(trimmed)?;
    match root {
        "Workbook" | "ss:Workbook" => Some(Format::XlsXml),
        "gnm:Workbook" | "gmr:Workbook" => Some(Format::Gnumeric),
        _ => None,
    }
}

fn head(bytes: &[u8], n: usize) -> &[u8] {
    // Avoid splitting a UTF-8 sequence at the cut point.
    let mut end = bytes.len().min(n);
    while end > 0 && bytes[end - 1] >= 0x80 {
        end -= 1;
    }
    &bytes[..end]
}

/// Find the name of the first non-declaration, non-comment element.
fn root_element_name(text: &str) -> Option<&str> {
    let mut rest = text;
    loop {
        let open = rest.find('<')?;
        let tag = &rest[open + 1..];
        if let Some(stripped) = tag.strip_prefix('?') {
            let close = stripped.find("?>")?;
            rest = &stripped[close + 2..];
        } else if let Some(stripped) = tag.strip_prefix("!--") {
            let close = stripped.find("-->")?;
            rest = &stripped[close + 3..];
        } else if let Some(stripped) = tag.strip_prefix('!') {
            let close = stripped.find('>')?;
            rest = &stripped[close + 1..];
        } else {
            let end = tag.find(|c: char| c.is_whitespace() || c == '>' || c == '/')?;
            return Some(&tag[..end]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn zip_with_entries(entries: &[&str]) -> Vec<u8> {
        let mut buf = Cursor::new(Vec::new());
        {
            let mut writer = zip::ZipWriter::new(&mut buf);
            for name in entries {
                writer
                    .start_file::<_, ()>(*name, SimpleFileOptions::default())
                    .unwrap();
                writer.write_all(b"<x/>").unwrap();
            }
            writer.finish().unwrap();
        }
        buf.into_inner()
    }

    #[test]
    fn test_detect_xlsx() {
        let bytes = zip_with_entries(&["[Content_Types].xml", "xl/workbook.xml"]);
        assert_eq!(detect(&bytes), Format::Xlsx);
    }

    #[test]
    fn test_detect_ods() {
        let bytes = zip_with_entries(&["mimetype", "content.xml"]);
        assert_eq!(detect(&bytes), Format::Ods);
    }

    #[test]
    fn test_detect_zip_without_markers() {
        let bytes = zip_with_entries(&["random.txt"]);
        assert_eq!(detect(&bytes), Format::Unknown);
    }

    #[test]
    fn test_detect_xls_xml() {
        let doc = b"<?xml version=\"1.0\"?>\n<Workbook xmlns=\"urn:schemas-microsoft-com:office:spreadsheet\"></Workbook>";
        assert_eq!(detect(doc), Format::XlsXml);
    }

    #[test]
    fn test_detect_gnumeric_xml_and_gzip() {
        let doc = b"<?xml version=\"1.0\"?><gnm:Workbook xmlns:gnm=\"x\"/>";
        assert_eq!(detect(doc), Format::Gnumeric);
        assert_eq!(detect(&[0x1f, 0x8b, 0x08, 0x00]), Format::Gnumeric);
    }

    #[test]
    fn test_detect_parquet() {
        let mut bytes = b"PAR1".to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(b"PAR1");
        assert_eq!(detect(&bytes), Format::Parquet);
    }

    #[test]
    fn test_detect_unknown() {
        assert_eq!(detect(b"a,b,c\n1,2,3\n"), Format::Unknown);
        assert_eq!(detect(b""), Format::Unknown);
        assert_eq!(detect(b"<other-root/>"), Format::Unknown);
    }

    #[test]
    fn test_detect_does_not_consume_input() {
        let doc = b"<?xml version=\"1.0\"?><Workbook/>".to_vec();
        let before = doc.clone();
        let _ = detect(&doc);
        assert_eq!(doc, before);
    }
}
