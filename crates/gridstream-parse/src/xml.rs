//! Event-driven, namespace-aware XML parser.
//!
//! Element and attribute names are reported with their namespace resolved to
//! a numeric [`NsId`]; the prefix bookkeeping stays inside the parser.
//! Character data and attribute values are zero-copy slices unless entity
//! references had to be decoded, in which case the payload aliases the
//! scratch buffer and is flagged transient.
//!
//! The parser tolerates a doubled UTF-8 byte-order mark at the head of the
//! stream; such files exist in the wild.

use crate::cursor::{CellBuffer, Cursor};
use crate::error::{ParseError, Result};
use crate::namespace::{NamespaceContext, NamespaceRepository, NsId};

/// A namespace-resolved element name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlName<'a> {
    pub ns: NsId,
    pub name: &'a str,
}

/// A namespace-resolved attribute with its decoded value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XmlAttr<'a> {
    pub ns: NsId,
    pub name: &'a str,
    pub value: &'a str,
    /// True when `value` lives in the parser's scratch buffer.
    pub transient: bool,
}

/// Document type declaration content.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DocType {
    pub root_name: String,
    pub public_id: Option<String>,
    pub system_id: Option<String>,
}

/// Receiver of XML parse events. All methods have empty default bodies.
pub trait XmlHandler {
    /// Called once at the start of the stream.
    fn begin_parse(&mut self) {}

    /// Called once after the document has been fully consumed.
    fn end_parse(&mut self) {}

    /// Called at the start of an XML declaration or processing instruction.
    fn start_declaration(&mut self, name: &str) {
        let _ = name;
    }

    /// Called at the end of an XML declaration or processing instruction.
    fn end_declaration(&mut self, name: &str) {
        let _ = name;
    }

    /// Called when a document type declaration is encountered.
    fn doctype(&mut self, dtd: &DocType) {
        let _ = dtd;
    }

    /// Called at the opening of an element, after its namespace declarations
    /// have been brought into scope and before its attributes are reported.
    fn start_element(&mut self, elem: XmlName<'_>) {
        let _ = elem;
    }

    /// Called at the closing of an element.
    fn end_element(&mut self, elem: XmlName<'_>) {
        let _ = elem;
    }

    /// Called for each attribute of the most recently opened element or
    /// declaration.
    fn attribute(&mut self, attr: XmlAttr<'_>) {
        let _ = attr;
    }

    /// Called for character data between elements.
    fn characters(&mut self, value: &str, transient: bool) {
        let _ = (value, transient);
    }
}

/// Namespace-aware XML parser, generic over the handler type.
pub struct XmlParser<'a, 'h, H: XmlHandler> {
    cursor: Cursor<'a>,
    handler: &'h mut H,
    repo: &'h mut NamespaceRepository,
    cxt: NamespaceContext,
    cell_buf: CellBuffer,
    // Open-element stack of (ns, qname start, qname end) for close matching.
    open_elements: Vec<(NsId, usize, usize)>,
}

impl<'a, 'h, H: XmlHandler> XmlParser<'a, 'h, H> {
    pub fn new(content: &'a [u8], handler: &'h mut H, repo: &'h mut NamespaceRepository) -> Self {
        Self {
            cursor: Cursor::new(content),
            handler,
            repo,
            cxt: NamespaceContext::new(),
            cell_buf: CellBuffer::new(),
            open_elements: Vec::new(),
        }
    }

    /// Parse the entire stream.
    ///
    /// # Errors
    ///
    /// Fails on malformed markup, mismatched element nesting, or unknown
    /// entity references.
    pub fn parse(mut self) -> Result<()> {
        self.handler.begin_parse();

        // Tolerate a repeated BOM at the head of the stream.
        self.cursor.skip_bom();
        self.cursor.skip_bom();

        while self.cursor.has_char() {
            if self.cursor.current() == b'<' {
                self.markup()?;
            } else {
                self.characters()?;
            }
        }

        if !self.open_elements.is_empty() {
            return Err(self.err("stream ended with unclosed elements"));
        }

        self.handler.end_parse();
        Ok(())
    }

    fn err(&self, message: &str) -> ParseError {
        ParseError::new(message, self.cursor.offset())
    }

    // -----------------------------------------------------------------------
    // Markup dispatch
    // -----------------------------------------------------------------------

    fn markup(&mut self) -> Result<()> {
        match self.cursor.peek(1) {
            Some(b'?') => self.declaration(),
            Some(b'!') => self.bang(),
            Some(b'/') => self.end_element(),
            Some(_) => self.start_element(),
            None => Err(self.err("stream ended after '<'")),
        }
    }

    /// `<?name attr="..." ... ?>`
    fn declaration(&mut self) -> Result<()> {
        self.cursor.next(); // '<'
        self.cursor.next(); // '?'
        let (start, end) = self.scan_name()?;
        {
            let name = self.cursor.str_slice(start, end);
            self.handler.start_declaration(name);
        }

        loop {
            self.cursor.skip_whitespace();
            if !self.cursor.has_char() {
                return Err(self.err("stream ended inside a declaration"));
            }
            if self.cursor.current() == b'?' {
                if self.cursor.peek(1) != Some(b'>') {
                    return Err(self.err("expected '?>' to close a declaration"));
                }
                self.cursor.next();
                self.cursor.next();
                let name = self.cursor.str_slice(start, end);
                self.handler.end_declaration(name);
                return Ok(());
            }
            self.declaration_attribute()?;
        }
    }

    /// `<!-- ... -->`, `<![CDATA[ ... ]]>`, or `<!DOCTYPE ...>`
    fn bang(&mut self) -> Result<()> {
        let rest = self.cursor.slice(self.cursor.offset(), self.cursor.len());
        if rest.starts_with(b"<!--") {
            self.comment()
        } else if rest.starts_with(b"<![CDATA[") {
            self.cdata()
        } else if rest.starts_with(b"<!DOCTYPE") {
            self.doctype()
        } else {
            Err(self.err("unexpected '<!' markup"))
        }
    }

    fn comment(&mut self) -> Result<()> {
        let from = self.cursor.offset() + 4;
        match memchr::memmem::find(self.cursor.slice(from, self.cursor.len()), b"-->") {
            Some(rel) => {
                let close = from + rel + 3;
                while self.cursor.offset() < close {
                    self.cursor.next();
                }
                Ok(())
            }
            None => Err(self.err("stream ended inside a comment")),
        }
    }

    fn cdata(&mut self) -> Result<()> {
        let from = self.cursor.offset() + 9;
        match memchr::memmem::find(self.cursor.slice(from, self.cursor.len()), b"]]>") {
            Some(rel) => {
                let text_end = from + rel;
                self.handler
                    .characters(self.cursor.str_slice(from, text_end), false);
                let close = text_end + 3;
                while self.cursor.offset() < close {
                    self.cursor.next();
                }
                Ok(())
            }
            None => Err(self.err("stream ended inside a CDATA section")),
        }
    }

    fn doctype(&mut self) -> Result<()> {
        // Skip "<!DOCTYPE".
        for _ in 0..9 {
            self.cursor.next();
        }
        self.cursor.skip_whitespace();
        let (start, end) = self.scan_name()?;
        let mut dtd = DocType {
            root_name: self.cursor.str_slice(start, end).to_string(),
            ..DocType::default()
        };

        self.cursor.skip_whitespace();
        if self.cursor.has_char() && self.cursor.current() != b'>' {
            let (kw_start, kw_end) = self.scan_name()?;
            let keyword = self.cursor.str_slice(kw_start, kw_end).to_string();
            match keyword.as_str() {
                "PUBLIC" => {
                    self.cursor.skip_whitespace();
                    dtd.public_id = Some(self.quoted_literal()?);
                    self.cursor.skip_whitespace();
                    if self.cursor.has_char() && self.cursor.current() != b'>' {
                        dtd.system_id = Some(self.quoted_literal()?);
                    }
                }
                "SYSTEM" => {
                    self.cursor.skip_whitespace();
                    dtd.system_id = Some(self.quoted_literal()?);
                }
                _ => return Err(self.err("expected PUBLIC or SYSTEM in a doctype")),
            }
        }

        self.cursor.skip_whitespace();
        if !self.cursor.has_char() || self.cursor.current() != b'>' {
            return Err(self.err("expected '>' to close a doctype"));
        }
        self.cursor.next();
        self.handler.doctype(&dtd);
        Ok(())
    }

    fn quoted_literal(&mut self) -> Result<String> {
        if !self.cursor.has_char() {
            return Err(self.err("stream ended before a quoted literal"));
        }
        let quote = self.cursor.current();
        if quote != b'"' && quote != b'\'' {
            return Err(self.err("expected a quoted literal"));
        }
        self.cursor.next();
        let start = self.cursor.offset();
        while self.cursor.has_char() && self.cursor.current() != quote {
            self.cursor.next();
        }
        if !self.cursor.has_char() {
            return Err(self.err("stream ended inside a quoted literal"));
        }
        let value = self.cursor.str_slice(start, self.cursor.offset()).to_string();
        self.cursor.next();
        Ok(value)
    }

    // -----------------------------------------------------------------------
    // Elements
    // -----------------------------------------------------------------------

    fn start_element(&mut self) -> Result<()> {
        self.cursor.next(); // '<'
        let (name_start, name_end) = self.scan_name()?;

        // Collect attributes first; namespace declarations on this very
        // element must be in scope before any name is resolved.
        let mut attrs: Vec<(usize, usize, usize, usize, bool)> = Vec::new();
        let mut self_closing = false;
        loop {
            self.cursor.skip_whitespace();
            if !self.cursor.has_char() {
                return Err(self.err("stream ended inside an element tag"));
            }
            match self.cursor.current() {
                b'>' => {
                    self.cursor.next();
                    break;
                }
                b'/' => {
                    if self.cursor.peek(1) != Some(b'>') {
                        return Err(self.err("expected '/>' to close an element tag"));
                    }
                    self.cursor.next();
                    self.cursor.next();
                    self_closing = true;
                    break;
                }
                _ => {
                    let parsed = self.scan_attribute()?;
                    attrs.push(parsed);
                }
            }
        }

        self.cxt.push_scope();

        // First pass: bring xmlns declarations into scope.
        for &(ns, ne, vs, ve, has_entities) in &attrs {
            let qname = self.cursor.str_slice(ns, ne);
            let (prefix, local) = split_qname(qname);
            let is_default_decl = prefix.is_empty() && local == "xmlns";
            let is_prefix_decl = prefix == "xmlns";
            if !is_default_decl && !is_prefix_decl {
                continue;
            }
            let uri = if has_entities {
                self.decode_entities(vs, ve)?;
                self.cell_buf.as_str().to_string()
            } else {
                self.cursor.str_slice(vs, ve).to_string()
            };
            let id = self.repo.intern(&uri);
            let bound_prefix = if is_default_decl { "" } else { local };
            self.cxt.bind(bound_prefix, id);
        }

        // Resolve and report the element itself.
        let qname = self.cursor.str_slice(name_start, name_end);
        let (prefix, local) = split_qname(qname);
        let elem_ns = self.cxt.resolve(prefix);
        self.handler.start_element(XmlName {
            ns: elem_ns,
            name: local,
        });

        // Second pass: report ordinary attributes with resolved namespaces.
        for &(ns, ne, vs, ve, has_entities) in &attrs {
            let qname = self.cursor.str_slice(ns, ne);
            let (prefix, local) = split_qname(qname);
            if (prefix.is_empty() && local == "xmlns") || prefix == "xmlns" {
                continue;
            }
            // Per XML namespaces, unprefixed attributes carry no namespace.
            let attr_ns = if prefix.is_empty() {
                crate::namespace::NS_NONE
            } else {
                self.cxt.resolve(prefix)
            };
            if has_entities {
                self.decode_entities(vs, ve)?;
                self.handler.attribute(XmlAttr {
                    ns: attr_ns,
                    name: local,
                    value: self.cell_buf.as_str(),
                    transient: true,
                });
            } else {
                self.handler.attribute(XmlAttr {
                    ns: attr_ns,
                    name: local,
                    value: self.cursor.str_slice(vs, ve),
                    transient: false,
                });
            }
        }

        if self_closing {
            self.handler.end_element(XmlName {
                ns: elem_ns,
                name: local,
            });
            self.cxt.pop_scope();
        } else {
            self.open_elements.push((elem_ns, name_start, name_end));
        }
        Ok(())
    }

    fn end_element(&mut self) -> Result<()> {
        self.cursor.next(); // '<'
        self.cursor.next(); // '/'
        let (start, end) = self.scan_name()?;
        self.cursor.skip_whitespace();
        if !self.cursor.has_char() || self.cursor.current() != b'>' {
            return Err(self.err("expected '>' to close an end tag"));
        }
        self.cursor.next();

        let (open_ns, open_start, open_end) = match self.open_elements.pop() {
            Some(v) => v,
            None => return Err(self.err("end tag without a matching start tag")),
        };
        let open_name = self.cursor.str_slice(open_start, open_end);
        let close_name = self.cursor.str_slice(start, end);
        if open_name != close_name {
            return Err(ParseError::new(
                format!("mismatched end tag: expected '</{open_name}>', found '</{close_name}>'"),
                self.cursor.offset(),
            ));
        }

        let (_, local) = split_qname(close_name);
        self.handler.end_element(XmlName {
            ns: open_ns,
            name: local,
        });
        self.cxt.pop_scope();
        Ok(())
    }

    /// Scan one attribute inside a tag; returns name/value offsets plus
    /// whether the value contains entity references.
    fn scan_attribute(&mut self) -> Result<(usize, usize, usize, usize, bool)> {
        let (name_start, name_end) = self.scan_name()?;
        self.cursor.skip_whitespace();
        if !self.cursor.has_char() || self.cursor.current() != b'=' {
            return Err(self.err("expected '=' after an attribute name"));
        }
        self.cursor.next();
        self.cursor.skip_whitespace();
        if !self.cursor.has_char() {
            return Err(self.err("stream ended before an attribute value"));
        }
        let quote = self.cursor.current();
        if quote != b'"' && quote != b'\'' {
            return Err(self.err("expected a quoted attribute value"));
        }
        self.cursor.next();
        let value_start = self.cursor.offset();
        let mut has_entities = false;
        while self.cursor.has_char() && self.cursor.current() != quote {
            if self.cursor.current() == b'&' {
                has_entities = true;
            }
            self.cursor.next();
        }
        if !self.cursor.has_char() {
            return Err(self.err("stream ended inside an attribute value"));
        }
        let value_end = self.cursor.offset();
        self.cursor.next(); // closing quote
        Ok((name_start, name_end, value_start, value_end, has_entities))
    }

    /// Parse a declaration attribute and report it immediately; no namespace
    /// resolution applies inside a declaration.
    fn declaration_attribute(&mut self) -> Result<()> {
        let (ns, ne, vs, ve, has_entities) = self.scan_attribute()?;
        let qname = self.cursor.str_slice(ns, ne);
        let (_, local) = split_qname(qname);
        if has_entities {
            self.decode_entities(vs, ve)?;
            self.handler.attribute(XmlAttr {
                ns: crate::namespace::NS_NONE,
                name: local,
                value: self.cell_buf.as_str(),
                transient: true,
            });
        } else {
            self.handler.attribute(XmlAttr {
                ns: crate::namespace::NS_NONE,
                name: local,
                value: self.cursor.str_slice(vs, ve),
                transient: false,
            });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Character data
    // -----------------------------------------------------------------------

    fn characters(&mut self) -> Result<()> {
        let start = self.cursor.offset();
        let mut has_entities = false;
        while self.cursor.has_char() && self.cursor.current() != b'<' {
            if self.cursor.current() == b'&' {
                has_entities = true;
            }
            self.cursor.next();
        }
        let end = self.cursor.offset();
        if start == end {
            return Ok(());
        }
        if has_entities {
            self.decode_entities(start, end)?;
            self.handler.characters(self.cell_buf.as_str(), true);
        } else {
            self.handler.characters(self.cursor.str_slice(start, end), false);
        }
        Ok(())
    }

    /// Decode the input span `[start, end)` into the scratch buffer,
    /// expanding entity and character references.
    fn decode_entities(&mut self, start: usize, end: usize) -> Result<()> {
        self.cell_buf.reset();
        let mut pos = start;
        while pos < end {
            let bytes = self.cursor.slice(pos, end);
            match memchr::memchr(b'&', bytes) {
                None => {
                    let seg = self.cursor.slice(pos, end);
                    self.cell_buf.append(seg);
                    break;
                }
                Some(rel) => {
                    let seg = self.cursor.slice(pos, pos + rel);
                    self.cell_buf.append(seg);
                    let amp = pos + rel;
                    let rest = self.cursor.slice(amp, end);
                    let semi_rel = memchr::memchr(b';', rest)
                        .ok_or_else(|| ParseError::new("unterminated entity reference", amp))?;
                    let entity = &rest[1..semi_rel];
                    let decoded = decode_entity(entity)
                        .ok_or_else(|| ParseError::new("unknown entity reference", amp))?;
                    self.cell_buf.push_char(decoded);
                    pos = amp + semi_rel + 1;
                }
            }
        }
        Ok(())
    }

    /// Scan an XML name (element, attribute, or PI target).
    fn scan_name(&mut self) -> Result<(usize, usize)> {
        let start = self.cursor.offset();
        while self.cursor.has_char() && is_name_char(self.cursor.current()) {
            self.cursor.next();
        }
        let end = self.cursor.offset();
        if start == end {
            return Err(self.err("expected a name"));
        }
        Ok((start, end))
    }
}

/// Split a qualified name into `(prefix, local)`; the prefix is empty when
/// there is no colon.
fn split_qname(qname: &str) -> (&str, &str) {
    match qname.split_once(':') {
        Some((prefix, local)) => (prefix, local),
        None => ("", qname),
    }
}

fn is_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, b':' | b'_' | b'-' | b'.') || c >= 0x80
}

/// Decode one entity body (between `&` and `;`).
fn decode_entity(entity: &[u8]) -> Option<char> {
    match entity {
        b"amp" => Some('&'),
        b"lt" => Some('<'),
        b"gt" => Some('>'),
        b"quot" => Some('"'),
        b"apos" => Some('\''),
        _ => {
            let s = std::str::from_utf8(entity).ok()?;
            let code = if let Some(hex) = s.strip_prefix("#x").or_else(|| s.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = s.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl XmlHandler for Recorder {
        fn start_declaration(&mut self, name: &str) {
            self.events.push(format!("?{name}("));
        }
        fn end_declaration(&mut self, name: &str) {
            self.events.push(format!(")?{name}"));
        }
        fn doctype(&mut self, dtd: &DocType) {
            self.events.push(format!("doctype[{}]", dtd.root_name));
        }
        fn start_element(&mut self, elem: XmlName<'_>) {
            self.events.push(format!("<{}#{}", elem.name, elem.ns));
        }
        fn end_element(&mut self, elem: XmlName<'_>) {
            self.events.push(format!(">{}#{}", elem.name, elem.ns));
        }
        fn attribute(&mut self, attr: XmlAttr<'_>) {
            self.events.push(format!(
                "@{}#{}={}{}",
                attr.name,
                attr.ns,
                attr.value,
                if attr.transient { "*" } else { "" }
            ));
        }
        fn characters(&mut self, value: &str, transient: bool) {
            self.events
                .push(format!("text[{value}]{}", if transient { "*" } else { "" }));
        }
    }

    fn parse(input: &str) -> Result<Vec<String>> {
        let mut rec = Recorder::default();
        let mut repo = NamespaceRepository::new();
        XmlParser::new(input.as_bytes(), &mut rec, &mut repo).parse()?;
        Ok(rec.events)
    }

    #[test]
    fn test_xml_simple_document() {
        let events = parse("<root><child a=\"1\"/>text</root>").unwrap();
        assert_eq!(
            events,
            vec![
                "<root#0", "<child#0", "@a#0=1", ">child#0", "text[text]", ">root#0"
            ]
        );
    }

    #[test]
    fn test_xml_declaration() {
        let events = parse("<?xml version=\"1.0\" encoding=\"UTF-8\"?><r/>").unwrap();
        assert_eq!(
            events,
            vec![
                "?xml(", "@version#0=1.0", "@encoding#0=UTF-8", ")?xml", "<r#0", ">r#0"
            ]
        );
    }

    #[test]
    fn test_xml_namespace_resolution() {
        let input = "<a:root xmlns:a=\"urn:one\"><a:kid b=\"x\"/></a:root>";
        let mut rec = Recorder::default();
        let mut repo = NamespaceRepository::new();
        XmlParser::new(input.as_bytes(), &mut rec, &mut repo).parse().unwrap();
        let one = repo.get("urn:one").unwrap();
        assert_eq!(
            rec.events,
            vec![
                format!("<root#{one}"),
                format!("<kid#{one}"),
                "@b#0=x".to_string(),
                format!(">kid#{one}"),
                format!(">root#{one}"),
            ]
        );
    }

    #[test]
    fn test_xml_default_namespace_scoping() {
        let input = "<root xmlns=\"urn:d\"><inner xmlns=\"urn:e\"/><after/></root>";
        let mut rec = Recorder::default();
        let mut repo = NamespaceRepository::new();
        XmlParser::new(input.as_bytes(), &mut rec, &mut repo).parse().unwrap();
        let d = repo.get("urn:d").unwrap();
        let e = repo.get("urn:e").unwrap();
        assert_eq!(
            rec.events,
            vec![
                format!("<root#{d}"),
                format!("<inner#{e}"),
                format!(">inner#{e}"),
                format!("<after#{d}"),
                format!(">after#{d}"),
                format!(">root#{d}"),
            ]
        );
    }

    #[test]
    fn test_xml_entities_are_transient() {
        let events = parse("<r a=\"x&amp;y\">1 &lt; 2</r>").unwrap();
        assert_eq!(
            events,
            vec!["<r#0", "@a#0=x&y*", "text[1 < 2]*", ">r#0"]
        );
    }

    #[test]
    fn test_xml_numeric_character_references() {
        let events = parse("<r>&#65;&#x42;</r>").unwrap();
        assert_eq!(events, vec!["<r#0", "text[AB]*", ">r#0"]);
    }

    #[test]
    fn test_xml_double_bom_tolerated() {
        let mut input = Vec::new();
        input.extend_from_slice(b"\xef\xbb\xbf\xef\xbb\xbf");
        input.extend_from_slice(b"<r/>");
        let mut rec = Recorder::default();
        let mut repo = NamespaceRepository::new();
        XmlParser::new(&input, &mut rec, &mut repo).parse().unwrap();
        assert_eq!(rec.events, vec!["<r#0", ">r#0"]);
    }

    #[test]
    fn test_xml_cdata() {
        let events = parse("<r><![CDATA[a < b & c]]></r>").unwrap();
        assert_eq!(events, vec!["<r#0", "text[a < b & c]", ">r#0"]);
    }

    #[test]
    fn test_xml_comment_skipped() {
        let events = parse("<r><!-- nothing to see --></r>").unwrap();
        assert_eq!(events, vec!["<r#0", ">r#0"]);
    }

    #[test]
    fn test_xml_doctype() {
        let events = parse("<!DOCTYPE html><html/>").unwrap();
        assert_eq!(events, vec!["doctype[html]", "<html#0", ">html#0"]);
    }

    #[test]
    fn test_xml_mismatched_end_tag() {
        let err = parse("<a><b></a></b>").unwrap_err();
        assert!(err.message.contains("mismatched end tag"));
    }

    #[test]
    fn test_xml_unclosed_element() {
        let err = parse("<a><b></b>").unwrap_err();
        assert_eq!(err.message, "stream ended with unclosed elements");
    }

    #[test]
    fn test_xml_unknown_entity() {
        let err = parse("<r>&nope;</r>").unwrap_err();
        assert_eq!(err.message, "unknown entity reference");
    }
}
