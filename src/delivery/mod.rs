//! Getting entries to the logbook: validate, deliver, or queue.
//!
//! [`Submitter::submit`] is the usual entry point. It validates the entry,
//! tries the server, and if the server cannot be reached writes the entry
//! to the queue directory instead, so an entry is never silently lost.

pub mod queue;
pub mod transport;

use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::Config;
use crate::error::{ElogError, Result};
use crate::model::entry::Entry;
use crate::wire::response::{parse_response, Receipt};
use crate::wire::validate::{render_diagnostics, SchemaValidator, StructuralValidator};

pub use queue::queue_file_name;
pub use transport::{HttpTransport, Transport, TransportResponse};

/// Where a submitted entry ended up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "lowercase")]
pub enum Outcome {
    /// Accepted by the server.
    Delivered(Receipt),
    /// Written to the queue for later forwarding.
    Queued(PathBuf),
}

/// Validates and delivers entries using a configured transport and validator.
///
/// Holds no mutable state; one instance can serve any number of entries.
#[derive(Debug)]
pub struct Submitter<T, V> {
    config: Config,
    cert_path: PathBuf,
    transport: T,
    validator: V,
}

impl Submitter<HttpTransport, StructuralValidator> {
    /// Build the standard HTTPS submitter from configuration.
    pub fn from_config(config: Config) -> Result<Self> {
        let transport = HttpTransport::from_config(&config.service);
        let validator =
            StructuralValidator::new().with_known_logbooks(&config.service.known_logbooks);
        Self::new(config, transport, validator)
    }
}

impl<T: Transport, V: SchemaValidator> Submitter<T, V> {
    /// Create a submitter. Fails with [`ElogError::Config`] if required
    /// settings are missing.
    pub fn new(config: Config, transport: T, validator: V) -> Result<Self> {
        config.validate()?;
        let cert_path = config.cert_path()?;
        Ok(Self {
            config,
            cert_path,
            transport,
            validator,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start an entry that qualifies bare notification names with the
    /// configured email domain.
    pub fn new_entry<I, S>(&self, title: impl Into<String>, logbooks: I) -> Result<Entry>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut entry = Entry::new(title, logbooks)?;
        entry.set_email_domain(self.config.notify.email_domain.clone());
        Ok(entry)
    }

    /// Check an entry against the schema.
    pub fn validate(&self, entry: &Entry) -> Result<()> {
        self.encode_valid(entry).map(|_| ())
    }

    /// Check an XML file against the schema.
    pub fn validate_file(&self, path: impl AsRef<Path>) -> Result<()> {
        validate_file(&self.validator, &self.config.service.schema_url, path)
    }

    /// Deliver the entry, falling back to the queue if the server cannot
    /// be reached.
    ///
    /// Validation and server rejections are returned as errors and nothing
    /// is queued. On delivery the entry's lognumber is set.
    pub fn submit(&self, entry: &mut Entry) -> Result<Outcome> {
        let xml = self.encode_valid(entry)?;
        match self.deliver(entry, &xml) {
            Ok(receipt) => Ok(Outcome::Delivered(receipt)),
            Err(err) if err.is_retriable() => {
                tracing::warn!(error = %err, "Direct submission failed, queueing entry");
                match self.enqueue(&xml) {
                    Ok(path) => Ok(Outcome::Queued(path)),
                    Err(source) => Err(ElogError::QueueAfterTransport {
                        transport: err.to_string(),
                        source: Box::new(source),
                    }),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Validate and write the entry to the queue directory without
    /// contacting the server.
    pub fn queue(&self, entry: &Entry) -> Result<PathBuf> {
        let xml = self.encode_valid(entry)?;
        self.enqueue(&xml)
    }

    /// Validate and deliver the entry immediately; every failure is
    /// returned to the caller.
    pub fn submit_now(&self, entry: &mut Entry) -> Result<Receipt> {
        let xml = self.encode_valid(entry)?;
        self.deliver(entry, &xml)
    }

    fn encode_valid(&self, entry: &Entry) -> Result<String> {
        let xml = entry.to_xml()?;
        self.check(xml.as_bytes())?;
        Ok(xml)
    }

    fn check(&self, xml: &[u8]) -> Result<()> {
        check_xml(&self.validator, &self.config.service.schema_url, xml)
    }

    fn deliver(&self, entry: &mut Entry, xml: &str) -> Result<Receipt> {
        let url = submit_url(&self.config.service.submit_url, &queue_file_name());
        let response = self.transport.put(&url, xml.as_bytes(), &self.cert_path)?;
        tracing::debug!(status = response.status, "Server replied");

        let receipt = parse_response(&response.body)?;
        entry.set_lognumber(receipt.lognumber);
        tracing::info!(lognumber = receipt.lognumber, "Entry delivered");
        Ok(receipt)
    }

    fn enqueue(&self, xml: &str) -> Result<PathBuf> {
        let path = queue::write_queue_file(&self.config.queue.queue_dir, xml.as_bytes())?;
        tracing::info!(path = %path.display(), "Entry queued");
        Ok(path)
    }
}

/// `{base}/{urlencoded name}`.
fn submit_url(base: &str, file_name: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        urlencoding::encode(file_name)
    )
}

/// Check an XML file with `validator` alone.
///
/// Needs no server settings, so a file can be checked before the
/// submission side of the configuration exists.
pub fn validate_file<V: SchemaValidator>(
    validator: &V,
    schema: &str,
    path: impl AsRef<Path>,
) -> Result<()> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| ElogError::io(path, e))?;
    check_xml(validator, schema, &bytes)
}

fn check_xml<V: SchemaValidator>(validator: &V, schema: &str, xml: &[u8]) -> Result<()> {
    validator.validate(xml, schema).map_err(|diagnostics| {
        tracing::debug!(count = diagnostics.len(), "Entry failed validation");
        ElogError::SchemaInvalid {
            diagnostics: render_diagnostics(&diagnostics),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_url() {
        assert_eq!(
            submit_url("https://h/incoming/", "20240104_100000_1_my host_7.xml"),
            "https://h/incoming/20240104_100000_1_my%20host_7.xml"
        );
    }

    #[test]
    fn test_new_requires_config() {
        let transport = HttpTransport::new(false, Default::default());
        let err = Submitter::new(Config::default(), transport, StructuralValidator::new())
            .unwrap_err();
        assert!(matches!(err, ElogError::Config(_)));
    }

    #[test]
    fn test_validate_file_without_server_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entry.xml");
        let mut entry = Entry::new("standalone", ["TLOG"]).unwrap();
        entry.set_created_str("2024-01-04T10:00:00+00:00").unwrap();
        entry.save_to_file(&path).unwrap();

        let config = Config::default();
        assert!(config.validate().is_err());
        let validator = StructuralValidator::new().with_known_logbooks(["TLOG"]);
        validate_file(&validator, &config.service.schema_url, &path).unwrap();

        let strict = StructuralValidator::new().with_known_logbooks(["ELOG"]);
        let err = validate_file(&strict, "", &path).unwrap_err();
        assert!(matches!(err, ElogError::SchemaInvalid { .. }));
        let err = validate_file(&validator, "", dir.path().join("missing.xml")).unwrap_err();
        assert!(err.is_io());
    }

    #[test]
    fn test_outcome_json() {
        let queued = Outcome::Queued(PathBuf::from("/q/a.xml"));
        assert_eq!(
            serde_json::to_string(&queued).unwrap(),
            r#"{"outcome":"queued","detail":"/q/a.xml"}"#
        );
    }
}
