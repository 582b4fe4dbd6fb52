//! Moving entry bytes to the logbook server.

use std::path::Path;
use std::time::Duration;

use crate::config::ServiceConfig;
use crate::error::{ElogError, Result};

/// What came back from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

/// Delivers bytes to the server and returns its reply.
///
/// Implementations report every failure to reach the server (connection,
/// TLS, server-side 5xx) as [`ElogError::Transport`]; that is the only error
/// that sends an entry to the queue.
pub trait Transport {
    fn put(&self, url: &str, body: &[u8], cert_file: &Path) -> Result<TransportResponse>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn put(&self, url: &str, body: &[u8], cert_file: &Path) -> Result<TransportResponse> {
        (**self).put(url, body, cert_file)
    }
}

/// HTTPS transport authenticating with a PEM client certificate.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    accept_invalid_certs: bool,
    timeout: Duration,
}

impl HttpTransport {
    pub fn new(accept_invalid_certs: bool, timeout: Duration) -> Self {
        Self {
            accept_invalid_certs,
            timeout,
        }
    }

    pub fn from_config(service: &ServiceConfig) -> Self {
        Self::new(
            service.accept_invalid_certs,
            Duration::from_secs(service.timeout_secs),
        )
    }

    fn client(&self, cert_file: &Path) -> Result<reqwest::blocking::Client> {
        let pem = std::fs::read(cert_file).map_err(|e| {
            ElogError::Transport(format!(
                "unable to read client certificate '{}': {e}",
                cert_file.display()
            ))
        })?;
        let identity = reqwest::Identity::from_pem(&pem)
            .map_err(|e| ElogError::Transport(format!("invalid client certificate: {e}")))?;

        reqwest::blocking::Client::builder()
            .identity(identity)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .timeout(self.timeout)
            .build()
            .map_err(|e| ElogError::Transport(format!("unable to build HTTP client: {e}")))
    }
}

impl Transport for HttpTransport {
    fn put(&self, url: &str, body: &[u8], cert_file: &Path) -> Result<TransportResponse> {
        let client = self.client(cert_file)?;
        tracing::debug!(url, bytes = body.len(), "PUT entry");

        let response = client
            .put(url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body.to_vec())
            .send()
            .map_err(|e| ElogError::Transport(format!("Unable to send file: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .map_err(|e| ElogError::Transport(format!("Unable to read reply: {e}")))?;

        if status.is_server_error() {
            return Err(ElogError::Transport(format!("server returned {status}")));
        }
        Ok(TransportResponse {
            status: status.as_u16(),
            body,
        })
    }
}
