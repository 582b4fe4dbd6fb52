//! The service's `<Response>` acknowledgement envelope.
//!
//! ```text
//! <Response stat="ok">
//!   <msg>Entry saved.</msg>
//!   <lognumber>3484070</lognumber>
//!   <url>https://logbooks.example.org/entry/3484070</url>
//! </Response>
//!
//! <Response stat="fail">
//!   <msg>an error occurred...</msg>
//! </Response>
//! ```

use serde::Serialize;

use crate::error::{ElogError, Result};

use super::xml;

/// Value of the `stat` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stat {
    Ok,
    Fail,
}

impl Stat {
    pub fn as_str(self) -> &'static str {
        match self {
            Stat::Ok => "ok",
            Stat::Fail => "fail",
        }
    }
}

/// What the server told us about an accepted entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Receipt {
    /// The lognumber assigned by the server.
    pub lognumber: u64,
    /// Human-readable message, if any.
    pub msg: Option<String>,
    /// Link to the entry on the server, if any.
    pub url: Option<String>,
}

/// Interpret a raw server reply.
///
/// `stat="ok"` yields a [`Receipt`]; `stat="fail"` becomes a
/// [`ElogError::Server`] with the server's message. Anything else
/// (unparsable XML, another root, unknown `stat`, missing lognumber)
/// is a `Server` error carrying the raw reply.
pub fn parse_response(text: &str) -> Result<Receipt> {
    let unexpected = || ElogError::Server(format!("Server returned unexpected response:\n{text}"));

    let root = match xml::parse_document(text) {
        Ok(root) => root,
        Err(e) => {
            tracing::debug!(error = %e, "Unparsable server response");
            return Err(ElogError::Server(format!(
                "Unable to process server response:\n{text}"
            )));
        }
    };

    if root.name != "Response" {
        return Err(unexpected());
    }

    match root.attribute("stat") {
        Some("ok") => {
            let lognumber = root
                .child_text("lognumber")
                .and_then(|n| n.trim().parse::<u64>().ok())
                .filter(|n| *n > 0)
                .ok_or_else(unexpected)?;
            Ok(Receipt {
                lognumber,
                msg: non_empty(root.child_text("msg")),
                url: non_empty(root.child_text("url")),
            })
        }
        Some("fail") => {
            let msg = root.child_text("msg").unwrap_or("").trim().to_string();
            Err(ElogError::Server(format!("Error response from server: {msg}")))
        }
        _ => Err(unexpected()),
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Build a `<Response stat="...">` document from a flat record.
///
/// Each field of `record` becomes one child element, in declaration order,
/// with its value escaped. Nested values (arrays, objects) are rejected.
pub fn response_envelope<T: Serialize>(record: &T, stat: Stat) -> Result<String> {
    let value = serde_json::to_value(record)
        .map_err(|e| ElogError::Xml(format!("cannot serialize response record: {e}")))?;
    let fields = match value {
        serde_json::Value::Object(map) => map,
        serde_json::Value::Null => serde_json::Map::new(),
        other => {
            return Err(ElogError::Xml(format!(
                "response record must be a flat struct or map, got {other}"
            )))
        }
    };

    let mut w = xml::new_writer();
    xml::write_declaration(&mut w)?;
    xml::start(&mut w, "Response", &[("stat", stat.as_str())])?;
    for (name, value) in &fields {
        let text = match value {
            serde_json::Value::Null => String::new(),
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Bool(_) | serde_json::Value::Number(_) => value.to_string(),
            _ => {
                return Err(ElogError::Xml(format!(
                    "response field '{name}' is not a scalar"
                )))
            }
        };
        if text.is_empty() {
            xml::empty(&mut w, name)?;
        } else {
            xml::text_element(&mut w, name, &[], &text)?;
        }
    }
    xml::end(&mut w, "Response")?;
    xml::into_string(w)
}
