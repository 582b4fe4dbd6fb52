//! XML plumbing shared by the encoders, the response interpreter and the
//! structural validator.
//!
//! Writing goes through `quick-xml`'s event writer. Reading builds a small
//! owned element tree; the documents involved are one fixed entry shape and a
//! tiny response envelope, so a tree is simpler to query than a pull parser.

use quick_xml::events::{BytesCData, BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{ElogError, Result};

/// The writer type every encoder in the crate writes into.
pub type XmlWriter = Writer<Vec<u8>>;

/// Create an indented writer (two spaces, like the service's own output).
pub fn new_writer() -> XmlWriter {
    Writer::new_with_indent(Vec::new(), b' ', 2)
}

/// Finish a writer and return its contents as a string.
pub fn into_string(writer: XmlWriter) -> Result<String> {
    String::from_utf8(writer.into_inner())
        .map_err(|e| ElogError::Xml(format!("encoder produced invalid UTF-8: {e}")))
}

fn emit(w: &mut XmlWriter, event: Event<'_>) -> Result<()> {
    w.write_event(event)
        .map_err(|e| ElogError::Xml(e.to_string()))
}

/// Write the `<?xml version="1.0" encoding="UTF-8"?>` declaration.
pub fn write_declaration(w: &mut XmlWriter) -> Result<()> {
    emit(w, Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
}

/// Open `<name attr="value" ...>`.
pub fn start(w: &mut XmlWriter, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
    let mut tag = BytesStart::new(name);
    for &(key, value) in attributes {
        tag.push_attribute((key, value));
    }
    emit(w, Event::Start(tag))
}

/// Close `</name>`.
pub fn end(w: &mut XmlWriter, name: &str) -> Result<()> {
    emit(w, Event::End(BytesEnd::new(name)))
}

/// Write a self-closing `<name/>`.
pub fn empty(w: &mut XmlWriter, name: &str) -> Result<()> {
    emit(w, Event::Empty(BytesStart::new(name)))
}

/// Write `<name attrs>escaped text</name>`.
pub fn text_element(
    w: &mut XmlWriter,
    name: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    start(w, name, attributes)?;
    emit(w, Event::Text(BytesText::new(text)))?;
    end(w, name)
}

/// Write `<name attrs><![CDATA[text]]></name>`.
///
/// A literal `]]>` cannot appear inside one CDATA section, so the text is
/// split there across adjacent sections.
pub fn cdata_element(
    w: &mut XmlWriter,
    name: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    start(w, name, attributes)?;
    for section in cdata_sections(text) {
        emit(w, Event::CData(BytesCData::new(section)))?;
    }
    end(w, name)
}

/// Split text into pieces that are each safe inside a CDATA section.
fn cdata_sections(text: &str) -> Vec<&str> {
    let mut sections = Vec::new();
    let mut rest = text;
    while let Some(pos) = rest.find("]]>") {
        // "]]" closes this section, ">" opens the next one
        sections.push(&rest[..pos + 2]);
        rest = &rest[pos + 2..];
    }
    sections.push(rest);
    sections
}

// ── Reading ─────────────────────────────────────────────────────

/// An element parsed from a document, with its source position.
#[derive(Debug, Clone, Default)]
pub struct Element {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub children: Vec<Element>,
    /// Concatenated character data. Whitespace-only text runs (indentation)
    /// are dropped; CDATA is kept verbatim.
    pub text: String,
    /// 1-based line of the start tag.
    pub line: usize,
    /// 1-based column of the start tag.
    pub column: usize,
}

impl Element {
    /// First child with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All children with the given name, in document order.
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Text of the first child with the given name.
    pub fn child_text(&self, name: &str) -> Option<&str> {
        self.child(name).map(|c| c.text.as_str())
    }

    /// Value of an attribute.
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

/// A well-formedness failure, with the position where it was detected.
#[derive(Debug, Clone)]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

impl std::fmt::Display for SyntaxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (line {}, column {})",
            self.message, self.line, self.column
        )
    }
}

impl From<SyntaxError> for ElogError {
    fn from(e: SyntaxError) -> Self {
        ElogError::Xml(e.to_string())
    }
}

/// Parse a complete document and return its root element.
pub fn parse_document(source: &str) -> std::result::Result<Element, SyntaxError> {
    let mut reader = Reader::from_str(source);
    let mut stack: Vec<Element> = Vec::new();
    // Whitespace-only text seen in each open element. It becomes the text
    // of a leaf element and is dropped once the element has other content.
    let mut blanks: Vec<String> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        let before = reader.buffer_position() as usize;
        let syntax = |message: String| {
            let (line, column) = line_column(source, before);
            SyntaxError {
                message,
                line,
                column,
            }
        };

        match reader.read_event() {
            Ok(Event::Start(tag)) => {
                let element = open_element(&tag, source, before).map_err(syntax)?;
                if let Some(parent) = blanks.last_mut() {
                    parent.clear();
                }
                stack.push(element);
                blanks.push(String::new());
            }
            Ok(Event::Empty(tag)) => {
                let element = open_element(&tag, source, before).map_err(syntax)?;
                if let Some(parent) = blanks.last_mut() {
                    parent.clear();
                }
                close_element(&mut stack, &mut root, element).map_err(syntax)?;
            }
            Ok(Event::End(_)) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| syntax("unexpected end tag".to_string()))?;
                let blank = blanks.pop().unwrap_or_default();
                if element.children.is_empty() && element.text.is_empty() {
                    element.text = blank;
                }
                close_element(&mut stack, &mut root, element).map_err(syntax)?;
            }
            Ok(Event::Text(text)) => {
                let value = text.unescape().map_err(|e| syntax(e.to_string()))?;
                let (Some(current), Some(blank)) = (stack.last_mut(), blanks.last_mut()) else {
                    if value.trim().is_empty() {
                        continue;
                    }
                    return Err(syntax("text outside the root element".to_string()));
                };
                if value.trim().is_empty() {
                    blank.push_str(&value);
                } else {
                    current.text.push_str(blank.as_str());
                    current.text.push_str(&value);
                    blank.clear();
                }
            }
            Ok(Event::CData(data)) => {
                let value = std::str::from_utf8(&data).map_err(|e| syntax(e.to_string()))?;
                match stack.last_mut() {
                    Some(current) => current.text.push_str(value),
                    None => return Err(syntax("CDATA outside the root element".to_string())),
                }
                if let Some(blank) = blanks.last_mut() {
                    blank.clear();
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(syntax(e.to_string())),
        }
    }

    if let Some(open) = stack.last() {
        let (line, column) = line_column(source, source.len());
        return Err(SyntaxError {
            message: format!("element '{}' is not closed", open.name),
            line,
            column,
        });
    }

    root.ok_or_else(|| SyntaxError {
        message: "document has no root element".to_string(),
        line: 1,
        column: 1,
    })
}

fn open_element(
    tag: &BytesStart<'_>,
    source: &str,
    before: usize,
) -> std::result::Result<Element, String> {
    let name = std::str::from_utf8(tag.name().as_ref())
        .map_err(|e| e.to_string())?
        .to_string();

    let mut attributes = Vec::new();
    for attr in tag.attributes() {
        let attr = attr.map_err(|e| e.to_string())?;
        let key = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| e.to_string())?
            .to_string();
        let value = attr.unescape_value().map_err(|e| e.to_string())?;
        attributes.push((key, value.into_owned()));
    }

    // The reader position is at the end of the previous event; the tag
    // itself starts at the next '<'.
    let at = source
        .get(before..)
        .and_then(|rest| rest.find('<'))
        .map_or(before, |offset| before + offset);
    let (line, column) = line_column(source, at);

    Ok(Element {
        name,
        attributes,
        line,
        column,
        ..Element::default()
    })
}

fn close_element(
    stack: &mut [Element],
    root: &mut Option<Element>,
    element: Element,
) -> std::result::Result<(), String> {
    match stack.last_mut() {
        Some(parent) => {
            parent.children.push(element);
            Ok(())
        }
        None if root.is_none() => {
            *root = Some(element);
            Ok(())
        }
        None => Err(format!(
            "second root element '{}' after '{}'",
            element.name,
            root.as_ref().map_or("", |r| r.name.as_str())
        )),
    }
}

/// Convert a byte offset into a 1-based (line, column) pair.
pub fn line_column(source: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(source.len());
    let prefix = source.get(..offset).unwrap_or(source);
    let line = prefix.matches('\n').count() + 1;
    let column = match prefix.rfind('\n') {
        Some(nl) => prefix[nl + 1..].chars().count() + 1,
        None => prefix.chars().count() + 1,
    };
    (line, column)
}
