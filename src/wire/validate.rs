//! Schema validation of encoded entries.
//!
//! The real Logentry schema lives on the logbook server; validating against
//! it is the job of a [`SchemaValidator`] implementation. The crate ships
//! [`StructuralValidator`], which enforces the fixed entry shape locally.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::DateTime;

use super::xml::{self, Element};

/// Severity of a validator diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Error,
    Fatal,
}

/// One validator complaint, with its location in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDiagnostic {
    pub severity: Severity,
    pub code: u32,
    pub message: String,
    pub line: usize,
    pub column: usize,
    pub file: Option<String>,
}

impl XmlDiagnostic {
    fn at(element: &Element, code: u32, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            line: element.line,
            column: element.column,
            file: None,
        }
    }
}

impl std::fmt::Display for XmlDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Warning => "Warning",
            Severity::Error => "Error",
            Severity::Fatal => "Fatal Error",
        };
        write!(
            f,
            "{level} {}: {}\n  Line: {}\n  Column: {}",
            self.code,
            self.message.trim(),
            self.line,
            self.column
        )?;
        if let Some(file) = &self.file {
            write!(f, "\n  File: {file}")?;
        }
        Ok(())
    }
}

/// Render diagnostics as human-readable text, one block per diagnostic.
pub fn render_diagnostics(diagnostics: &[XmlDiagnostic]) -> String {
    diagnostics
        .iter()
        .map(|d| format!("{d}\n\n--------------------------------------------\n\n"))
        .collect()
}

/// Validates encoded entry XML against a schema.
pub trait SchemaValidator {
    /// Validate `xml` against the schema at `schema`.
    ///
    /// Returns every problem found, not just the first.
    fn validate(&self, xml: &[u8], schema: &str) -> Result<(), Vec<XmlDiagnostic>>;
}

// Diagnostic codes used by the structural validator.
const CODE_SYNTAX: u32 = 1;
const CODE_ROOT: u32 = 2;
const CODE_MISSING: u32 = 3;
const CODE_VALUE: u32 = 4;
const CODE_UNKNOWN_LOGBOOK: u32 = 5;

/// Enforces the fixed Logentry shape without fetching the remote schema.
///
/// Optionally restricts logbook names to a known set (case-insensitive),
/// mirroring the enumeration the server schema carries.
#[derive(Debug, Clone, Default)]
pub struct StructuralValidator {
    known_logbooks: Option<Vec<String>>,
}

impl StructuralValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Only accept these logbooks. An empty list disables the check.
    pub fn with_known_logbooks<I, S>(mut self, logbooks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let books: Vec<String> = logbooks
            .into_iter()
            .map(|b| b.as_ref().to_uppercase())
            .collect();
        self.known_logbooks = if books.is_empty() { None } else { Some(books) };
        self
    }

    fn check_root(&self, root: &Element, out: &mut Vec<XmlDiagnostic>) {
        if let Some(lognumber) = root.child("lognumber") {
            let positive = lognumber
                .text
                .trim()
                .parse::<u64>()
                .map(|n| n > 0)
                .unwrap_or(false);
            if !positive {
                out.push(XmlDiagnostic::at(
                    lognumber,
                    CODE_VALUE,
                    format!("'{}' is not a valid lognumber", lognumber.text),
                ));
            }
        }

        match root.child("created") {
            Some(created) if DateTime::parse_from_rfc3339(created.text.trim()).is_ok() => {}
            Some(created) => out.push(XmlDiagnostic::at(
                created,
                CODE_VALUE,
                format!("'{}' is not a valid ISO-8601 date-time", created.text),
            )),
            None => out.push(missing(root, "created")),
        }

        match root.child("title") {
            Some(title) if title.text.trim().is_empty() => {
                out.push(XmlDiagnostic::at(title, CODE_VALUE, "title must not be empty"))
            }
            Some(title) if title.text.chars().count() > crate::model::entry::MAX_TITLE_LEN => {
                out.push(XmlDiagnostic::at(
                    title,
                    CODE_VALUE,
                    "title exceeds limit of 255 characters",
                ))
            }
            Some(_) => {}
            None => out.push(missing(root, "title")),
        }

        match root.child("Author") {
            Some(author) => check_user(author, out),
            None => out.push(missing(root, "Author")),
        }

        match root.child("Logbooks") {
            Some(books) => self.check_logbooks(books, out),
            None => out.push(missing(root, "Logbooks")),
        }

        if let Some(makers) = root.child("Entrymakers") {
            for maker in makers.children_named("Entrymaker") {
                check_user(maker, out);
            }
        }

        if let Some(body) = root.child("body") {
            match body.attribute("type") {
                Some("text") | Some("html") => {}
                Some(other) => out.push(XmlDiagnostic::at(
                    body,
                    CODE_VALUE,
                    format!("'{other}' is not a valid body type"),
                )),
                None => out.push(XmlDiagnostic::at(
                    body,
                    CODE_MISSING,
                    "body is missing the 'type' attribute",
                )),
            }
        }

        if let Some(refs) = root.child("References") {
            for reference in refs.children_named("reference") {
                if reference.attribute("type").map_or(true, str::is_empty) {
                    out.push(XmlDiagnostic::at(
                        reference,
                        CODE_MISSING,
                        "reference is missing the 'type' attribute",
                    ));
                }
                if reference.text.trim().is_empty() {
                    out.push(XmlDiagnostic::at(reference, CODE_VALUE, "empty reference id"));
                }
            }
        }

        if let Some(attachments) = root.child("Attachments") {
            for attachment in attachments.children_named("Attachment") {
                check_attachment(attachment, out);
            }
        }
    }

    fn check_logbooks(&self, books: &Element, out: &mut Vec<XmlDiagnostic>) {
        let mut count = 0;
        for book in books.children_named("logbook") {
            count += 1;
            let name = book.text.trim();
            if name.is_empty() {
                out.push(XmlDiagnostic::at(book, CODE_VALUE, "empty logbook name"));
                continue;
            }
            if let Some(known) = &self.known_logbooks {
                if !known.iter().any(|k| *k == name.to_uppercase()) {
                    out.push(XmlDiagnostic::at(
                        book,
                        CODE_UNKNOWN_LOGBOOK,
                        format!("'{name}' is not a known logbook"),
                    ));
                }
            }
        }
        if count == 0 {
            out.push(XmlDiagnostic::at(
                books,
                CODE_MISSING,
                "at least one logbook is required",
            ));
        }
    }
}

fn missing(parent: &Element, name: &str) -> XmlDiagnostic {
    XmlDiagnostic::at(
        parent,
        CODE_MISSING,
        format!("element '{}': missing child element '{name}'", parent.name),
    )
}

fn check_user(user: &Element, out: &mut Vec<XmlDiagnostic>) {
    match user.child("username") {
        Some(name) => {
            let len = name.text.trim().chars().count();
            if len == 0 || len > crate::model::user::MAX_USERNAME_LEN {
                out.push(XmlDiagnostic::at(
                    name,
                    CODE_VALUE,
                    format!("'{}' is not a valid username", name.text),
                ));
            }
        }
        None => out.push(missing(user, "username")),
    }
}

fn check_attachment(attachment: &Element, out: &mut Vec<XmlDiagnostic>) {
    if attachment.child("filename").is_none() {
        out.push(missing(attachment, "filename"));
    }
    let Some(data) = attachment.child("data") else {
        out.push(missing(attachment, "data"));
        return;
    };
    match data.attribute("encoding") {
        Some("url") => {
            if data.text.trim().is_empty() {
                out.push(XmlDiagnostic::at(data, CODE_VALUE, "empty attachment URL"));
            }
        }
        Some("base64") => {
            let encoded: String = data.text.split_whitespace().collect();
            if BASE64.decode(encoded).is_err() {
                out.push(XmlDiagnostic::at(
                    data,
                    CODE_VALUE,
                    "attachment data is not valid base64",
                ));
            }
        }
        Some(other) => out.push(XmlDiagnostic::at(
            data,
            CODE_VALUE,
            format!("'{other}' is not a valid attachment encoding"),
        )),
        None => out.push(XmlDiagnostic::at(
            data,
            CODE_MISSING,
            "data is missing the 'encoding' attribute",
        )),
    }
}

impl SchemaValidator for StructuralValidator {
    fn validate(&self, xml_bytes: &[u8], schema: &str) -> Result<(), Vec<XmlDiagnostic>> {
        let with_file = |mut d: XmlDiagnostic| {
            if !schema.is_empty() {
                d.file = Some(schema.to_string());
            }
            d
        };

        let source = match std::str::from_utf8(xml_bytes) {
            Ok(s) => s,
            Err(e) => {
                return Err(vec![with_file(XmlDiagnostic {
                    severity: Severity::Fatal,
                    code: CODE_SYNTAX,
                    message: format!("document is not valid UTF-8: {e}"),
                    line: 1,
                    column: 1,
                    file: None,
                })])
            }
        };

        let root = match xml::parse_document(source) {
            Ok(root) => root,
            Err(e) => {
                return Err(vec![with_file(XmlDiagnostic {
                    severity: Severity::Fatal,
                    code: CODE_SYNTAX,
                    message: e.message,
                    line: e.line,
                    column: e.column,
                    file: None,
                })])
            }
        };

        let mut diagnostics = Vec::new();
        if root.name == "Logentry" {
            self.check_root(&root, &mut diagnostics);
        } else {
            diagnostics.push(XmlDiagnostic::at(
                &root,
                CODE_ROOT,
                format!("expected root element 'Logentry', found '{}'", root.name),
            ));
        }

        if diagnostics.is_empty() {
            Ok(())
        } else {
            Err(diagnostics.into_iter().map(with_file).collect())
        }
    }
}
