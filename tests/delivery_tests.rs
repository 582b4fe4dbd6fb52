//! Integration tests for validation, direct delivery and the queue fallback.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use assert_fs::prelude::*;
use predicates::prelude::*;

use elogsubmit::config::Config;
use elogsubmit::wire::validate::Severity;
use elogsubmit::{
    ElogError, Entry, Outcome, Result, SchemaValidator, StructuralValidator, Submitter, Transport,
    TransportResponse, XmlDiagnostic,
};

const SUBMIT_URL: &str = "https://logbooks.example.org/incoming";

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn config(queue_dir: &Path) -> Config {
    let mut cfg = Config::default();
    cfg.service.schema_url = "https://logbooks.example.org/schema/Logentry.xsd".into();
    cfg.service.submit_url = SUBMIT_URL.into();
    cfg.service.cert_file = "/etc/elog/client.pem".into();
    cfg.queue.queue_dir = queue_dir.to_path_buf();
    cfg.notify.email_domain = "@example.org".into();
    cfg
}

/// What the mock server does with a PUT.
#[derive(Debug)]
enum Reply {
    Body(String),
    Unreachable,
}

#[derive(Debug)]
struct MockTransport {
    reply: Reply,
    calls: RefCell<Vec<(String, Vec<u8>, PathBuf)>>,
}

impl MockTransport {
    fn replying(body: &str) -> Self {
        Self {
            reply: Reply::Body(body.to_string()),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn ok(lognumber: u64) -> Self {
        Self::replying(&format!(
            "<Response stat=\"ok\"><msg>Entry saved.</msg><lognumber>{lognumber}</lognumber></Response>"
        ))
    }

    fn unreachable() -> Self {
        Self {
            reply: Reply::Unreachable,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl Transport for MockTransport {
    fn put(&self, url: &str, body: &[u8], cert_file: &Path) -> Result<TransportResponse> {
        self.calls
            .borrow_mut()
            .push((url.to_string(), body.to_vec(), cert_file.to_path_buf()));
        match &self.reply {
            Reply::Body(body) => Ok(TransportResponse {
                status: 200,
                body: body.clone(),
            }),
            Reply::Unreachable => Err(ElogError::Transport("connection refused".into())),
        }
    }
}

/// Rejects everything with one fixed diagnostic.
struct RejectAll;

impl SchemaValidator for RejectAll {
    fn validate(&self, _xml: &[u8], schema: &str) -> std::result::Result<(), Vec<XmlDiagnostic>> {
        Err(vec![XmlDiagnostic {
            severity: Severity::Error,
            code: 1871,
            message: "Element 'Logentry': Missing child element(s).".into(),
            line: 2,
            column: 0,
            file: Some(schema.to_string()),
        }])
    }
}

fn queued_files(dir: &Path) -> Vec<PathBuf> {
    std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

fn entry(submitter: &Submitter<&MockTransport, StructuralValidator>) -> Entry {
    let mut entry = submitter.new_entry("Beam dump", ["TLOG"]).unwrap();
    entry.set_body("Recovered after 5 minutes.");
    entry
}

// ─── Direct delivery ────────────────────────────────────────────────

#[test]
fn test_submit_delivers_and_sets_lognumber() {
    let queue = assert_fs::TempDir::new().unwrap();
    let transport = MockTransport::ok(3484070);
    let submitter =
        Submitter::new(config(queue.path()), &transport, StructuralValidator::new()).unwrap();

    let mut e = entry(&submitter);
    let outcome = submitter.submit(&mut e).unwrap();

    match outcome {
        Outcome::Delivered(receipt) => {
            assert_eq!(receipt.lognumber, 3484070);
            assert_eq!(receipt.msg.as_deref(), Some("Entry saved."));
        }
        other => panic!("expected delivery, got {other:?}"),
    }
    assert_eq!(e.lognumber(), Some(3484070));
    assert!(queued_files(queue.path()).is_empty());

    let calls = transport.calls.borrow();
    let (url, body, cert) = &calls[0];
    assert!(url.starts_with(&format!("{SUBMIT_URL}/")), "{url}");
    assert!(url.ends_with(".xml"), "{url}");
    assert_eq!(cert, Path::new("/etc/elog/client.pem"));
    let sent = Entry::from_xml(std::str::from_utf8(body).unwrap()).unwrap();
    assert_eq!(sent.title(), "Beam dump");
    assert_eq!(sent.lognumber(), None);
}

#[test]
fn test_submit_now_returns_receipt() {
    let queue = assert_fs::TempDir::new().unwrap();
    let transport = MockTransport::ok(12);
    let submitter =
        Submitter::new(config(queue.path()), &transport, StructuralValidator::new()).unwrap();

    let mut e = entry(&submitter);
    let receipt = submitter.submit_now(&mut e).unwrap();
    assert_eq!(receipt.lognumber, 12);
    assert_eq!(e.lognumber(), Some(12));
}

// ─── Fallback ───────────────────────────────────────────────────────

#[test]
fn test_submit_queues_when_server_unreachable() {
    let queue = assert_fs::TempDir::new().unwrap();
    let transport = MockTransport::unreachable();
    let submitter =
        Submitter::new(config(queue.path()), &transport, StructuralValidator::new()).unwrap();

    let mut e = entry(&submitter);
    e.add_notify("bob");
    let outcome = submitter.submit(&mut e).unwrap();

    let path = match outcome {
        Outcome::Queued(path) => path,
        other => panic!("expected queueing, got {other:?}"),
    };
    assert_eq!(transport.call_count(), 1);
    assert_eq!(path.parent(), Some(queue.path()));
    queue
        .child(path.file_name().unwrap())
        .assert(predicate::path::exists())
        .assert(predicate::str::contains("<title>Beam dump</title>"));

    let queued = Entry::from_file(&path).unwrap();
    assert_eq!(queued.body(), "Recovered after 5 minutes.");
    assert_eq!(queued.notifications(), vec!["bob@example.org"]);
    assert_eq!(queued.lognumber(), None);
    assert_eq!(e.lognumber(), None);
}

#[test]
fn test_submit_now_does_not_queue() {
    let queue = assert_fs::TempDir::new().unwrap();
    let transport = MockTransport::unreachable();
    let submitter =
        Submitter::new(config(queue.path()), &transport, StructuralValidator::new()).unwrap();

    let mut e = entry(&submitter);
    let err = submitter.submit_now(&mut e).unwrap_err();
    assert!(err.is_retriable());
    assert!(queued_files(queue.path()).is_empty());
}

#[test]
fn test_queue_failure_after_transport_failure() {
    let queue = assert_fs::TempDir::new().unwrap();
    let missing = queue.path().join("not-created");
    let transport = MockTransport::unreachable();
    let submitter =
        Submitter::new(config(&missing), &transport, StructuralValidator::new()).unwrap();

    let mut e = entry(&submitter);
    let err = submitter.submit(&mut e).unwrap_err();
    assert!(err.is_io());
    match err {
        ElogError::QueueAfterTransport { transport, .. } => {
            assert!(transport.contains("connection refused"))
        }
        other => panic!("expected QueueAfterTransport, got {other:?}"),
    }
}

// ─── Server rejections ──────────────────────────────────────────────

#[test]
fn test_server_rejection_is_not_queued() {
    let queue = assert_fs::TempDir::new().unwrap();
    let reply = std::fs::read_to_string(fixture("response_fail.xml")).unwrap();
    let transport = MockTransport::replying(&reply);
    let submitter =
        Submitter::new(config(queue.path()), &transport, StructuralValidator::new()).unwrap();

    let mut e = entry(&submitter);
    let err = submitter.submit(&mut e).unwrap_err();
    assert!(matches!(err, ElogError::Server(_)));
    assert!(err.to_string().contains("Logbook ZZZ does not exist"));
    assert!(queued_files(queue.path()).is_empty());
    assert_eq!(e.lognumber(), None);
}

#[test]
fn test_garbled_reply_is_server_error() {
    let queue = assert_fs::TempDir::new().unwrap();
    let transport = MockTransport::replying("<html>Proxy error</html>");
    let submitter =
        Submitter::new(config(queue.path()), &transport, StructuralValidator::new()).unwrap();

    let mut e = entry(&submitter);
    let err = submitter.submit(&mut e).unwrap_err();
    assert!(err.to_string().contains("Proxy error"));
    assert!(queued_files(queue.path()).is_empty());
}

// ─── Validation ─────────────────────────────────────────────────────

#[test]
fn test_invalid_entry_is_neither_sent_nor_queued() {
    let queue = assert_fs::TempDir::new().unwrap();
    let transport = MockTransport::ok(1);
    let submitter =
        Submitter::new(config(queue.path()), &transport, StructuralValidator::new()).unwrap();

    let mut e = submitter.new_entry("No logbook", Vec::<String>::new()).unwrap();
    let err = submitter.submit(&mut e).unwrap_err();
    match &err {
        ElogError::SchemaInvalid { diagnostics } => {
            assert!(diagnostics.contains("at least one logbook is required"))
        }
        other => panic!("expected SchemaInvalid, got {other:?}"),
    }
    assert!(submitter.queue(&e).is_err());
    assert_eq!(transport.call_count(), 0);
    assert!(queued_files(queue.path()).is_empty());
}

#[test]
fn test_diagnostics_are_rendered() {
    let queue = assert_fs::TempDir::new().unwrap();
    let transport = MockTransport::ok(1);
    let submitter = Submitter::new(config(queue.path()), &transport, RejectAll).unwrap();

    let mut e = submitter.new_entry("Fine", ["TLOG"]).unwrap();
    let err = submitter.submit(&mut e).unwrap_err();
    let text = err.to_string();
    assert!(text.starts_with("Schema validation of the entry fails:"), "{text}");
    assert!(text.contains("Error 1871: Element 'Logentry': Missing child element(s)."));
    assert!(text.contains("  Line: 2"));
    assert!(text.contains("  File: https://logbooks.example.org/schema/Logentry.xsd"));
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn test_queue_writes_without_contacting_server() {
    let queue = assert_fs::TempDir::new().unwrap();
    let transport = MockTransport::ok(1);
    let submitter =
        Submitter::new(config(queue.path()), &transport, StructuralValidator::new()).unwrap();

    let e = entry(&submitter);
    let first = submitter.queue(&e).unwrap();
    let second = submitter.queue(&e).unwrap();
    assert_ne!(first, second);
    assert_eq!(queued_files(queue.path()).len(), 2);
    assert_eq!(transport.call_count(), 0);
}

#[test]
fn test_validate_file() {
    let queue = assert_fs::TempDir::new().unwrap();
    let transport = MockTransport::ok(1);
    let submitter =
        Submitter::new(config(queue.path()), &transport, StructuralValidator::new()).unwrap();

    submitter.validate_file(fixture("entry.xml")).unwrap();

    let bad = queue.child("bad.xml");
    bad.write_str("<Logentry><title></title></Logentry>").unwrap();
    let err = submitter.validate_file(bad.path()).unwrap_err();
    assert!(matches!(err, ElogError::SchemaInvalid { .. }));

    assert!(submitter
        .validate_file(queue.path().join("absent.xml"))
        .unwrap_err()
        .is_io());
}

#[test]
fn test_known_logbooks_from_config() {
    let queue = assert_fs::TempDir::new().unwrap();
    let mut cfg = config(queue.path());
    cfg.service.known_logbooks = vec!["ELOG".into(), "TLOG".into()];
    let submitter = Submitter::from_config(cfg).unwrap();

    let ok = submitter.new_entry("ok", ["tlog"]).unwrap();
    submitter.validate(&ok).unwrap();

    let unknown = submitter.new_entry("nope", ["ZZZ"]).unwrap();
    let err = submitter.validate(&unknown).unwrap_err();
    assert!(err.to_string().contains("'ZZZ' is not a known logbook"));
}

#[test]
fn test_missing_config_is_rejected() {
    let transport = MockTransport::ok(1);
    let mut cfg = config(Path::new("/tmp"));
    cfg.service.submit_url.clear();
    let err = Submitter::new(cfg, &transport, StructuralValidator::new()).unwrap_err();
    assert!(matches!(err, ElogError::Config(_)));
    assert!(err.to_string().contains("service.submit_url"));
}
