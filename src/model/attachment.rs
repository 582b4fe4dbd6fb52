//! Entry attachments.
//!
//! A file attachment carries its content inline as base64. A URL attachment
//! only carries the address; the server fetches it.

use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::error::{ElogError, Result};
use crate::wire::xml::{self, Element, XmlWriter};

/// An attachment whose bytes travel inside the entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileAttachment {
    /// Base name of the source file.
    filename: String,
    /// MIME content type (explicit or detected).
    mime_type: String,
    caption: String,
    /// Base64-encoded file content.
    data: String,
}

impl FileAttachment {
    /// Read a file into an attachment.
    ///
    /// When `mime_type` is `None` the content type is detected from the file.
    pub fn from_path(
        path: impl AsRef<Path>,
        caption: Option<&str>,
        mime_type: Option<&str>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| ElogError::io(path, e))?;
        let mime_type = match mime_type.filter(|m| !m.is_empty()) {
            Some(explicit) => explicit.to_string(),
            None => detect_mime_type(path, &bytes)?,
        };
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        tracing::debug!(
            path = %path.display(),
            size = bytes.len(),
            mime = %mime_type,
            "Read attachment"
        );

        Ok(Self {
            filename,
            mime_type,
            caption: caption.unwrap_or("").to_string(),
            data: BASE64.encode(&bytes),
        })
    }

    /// Rebuild an attachment from already-encoded parts.
    pub fn from_encoded(
        filename: impl Into<String>,
        mime_type: impl Into<String>,
        caption: impl Into<String>,
        data: impl Into<String>,
    ) -> Result<Self> {
        let data: String = data.into();
        let data: String = data.split_whitespace().collect();
        BASE64
            .decode(&data)
            .map_err(|e| ElogError::Validation(format!("Attachment data is not base64: {e}")))?;
        Ok(Self {
            filename: filename.into(),
            mime_type: mime_type.into(),
            caption: caption.into(),
            data,
        })
    }

    /// Decode the inline content.
    pub fn bytes(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(&self.data)
            .map_err(|e| ElogError::Validation(format!("Attachment data is not base64: {e}")))
    }
}

/// An attachment that refers to a resource by URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlAttachment {
    url: String,
    /// URL-decoded last path segment of `url`.
    filename: String,
    mime_type: String,
    caption: String,
}

impl UrlAttachment {
    /// Build from a URL. Nothing is fetched.
    pub fn new(url: impl Into<String>, caption: Option<&str>, mime_type: Option<&str>) -> Self {
        let url = url.into();
        let filename = filename_from_url(&url);
        Self {
            url,
            filename,
            mime_type: mime_type.unwrap_or("").to_string(),
            caption: caption.unwrap_or("").to_string(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// One attachment of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attachment {
    File(FileAttachment),
    Url(UrlAttachment),
}

impl Attachment {
    pub fn filename(&self) -> &str {
        match self {
            Attachment::File(f) => &f.filename,
            Attachment::Url(u) => &u.filename,
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            Attachment::File(f) => &f.mime_type,
            Attachment::Url(u) => &u.mime_type,
        }
    }

    /// Value of the `encoding` attribute on `<data>`.
    pub fn encoding(&self) -> &'static str {
        match self {
            Attachment::File(_) => "base64",
            Attachment::Url(_) => "url",
        }
    }

    /// The literal `<data>` payload: base64 text or the URL.
    pub fn data(&self) -> &str {
        match self {
            Attachment::File(f) => &f.data,
            Attachment::Url(u) => &u.url,
        }
    }

    /// The caption, or the base name of the filename when none was given.
    pub fn caption(&self) -> String {
        let stored = match self {
            Attachment::File(f) => &f.caption,
            Attachment::Url(u) => &u.caption,
        };
        if stored.is_empty() {
            basename(self.filename()).to_string()
        } else {
            stored.clone()
        }
    }

    /// Replace the stored caption. An empty caption falls back to the filename.
    pub fn set_caption(&mut self, caption: impl Into<String>) {
        let caption = caption.into();
        match self {
            Attachment::File(f) => f.caption = caption,
            Attachment::Url(u) => u.caption = caption,
        }
    }

    /// Write `<name>` with caption, type, filename and data children.
    pub fn write_xml(&self, w: &mut XmlWriter, name: &str) -> Result<()> {
        xml::start(w, name, &[])?;
        xml::text_element(w, "caption", &[], &self.caption())?;
        xml::text_element(w, "type", &[], self.mime_type())?;
        xml::text_element(w, "filename", &[], self.filename())?;
        xml::text_element(w, "data", &[("encoding", self.encoding())], self.data())?;
        xml::end(w, name)
    }

    /// Encode as a standalone `<Attachment>` fragment.
    pub fn to_xml(&self) -> Result<String> {
        let mut w = xml::new_writer();
        self.write_xml(&mut w, "Attachment")?;
        xml::into_string(w)
    }

    pub(crate) fn from_element(element: &Element) -> Result<Self> {
        let data = element
            .child("data")
            .ok_or_else(|| ElogError::Xml("Attachment has no data".into()))?;
        let caption = element.child_text("caption").unwrap_or("");
        let mime_type = element.child_text("type").unwrap_or("");
        let filename = element.child_text("filename").unwrap_or("");

        match data.attribute("encoding") {
            Some("base64") => Ok(Attachment::File(FileAttachment::from_encoded(
                filename, mime_type, caption, &data.text,
            )?)),
            Some("url") => {
                let mut url = UrlAttachment::new(data.text.trim(), Some(caption), Some(mime_type));
                if !filename.is_empty() {
                    url.filename = filename.to_string();
                }
                Ok(Attachment::Url(url))
            }
            other => Err(ElogError::Xml(format!(
                "unsupported attachment encoding {other:?}"
            ))),
        }
    }
}

/// Last path component, accepting both separators.
fn basename(name: &str) -> &str {
    name.rsplit(['/', '\\']).next().unwrap_or(name)
}

/// URL-decoded last path segment, ignoring any query or fragment.
fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let last = path.trim_end_matches('/').rsplit('/').next().unwrap_or("");
    match urlencoding::decode(last) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => last.to_string(),
    }
}

/// Probe the content type of a file.
///
/// Known binary formats are recognised by magic bytes; otherwise UTF-8 text
/// is `text/plain`, an empty file `application/x-empty`, anything else
/// `application/octet-stream`.
fn detect_mime_type(path: &Path, bytes: &[u8]) -> Result<String> {
    let detected = infer::get_from_path(path).map_err(|e| ElogError::io(path, e))?;
    if let Some(kind) = detected {
        return Ok(kind.mime_type().to_string());
    }
    let fallback = if bytes.is_empty() {
        "application/x-empty"
    } else if std::str::from_utf8(bytes).is_ok() {
        "text/plain"
    } else {
        "application/octet-stream"
    };
    Ok(fallback.to_string())
}
