//! `elogsubmit`: build electronic logbook entries and deliver them.
//!
//! An [`Entry`] is assembled in memory, encoded to the canonical Logentry
//! XML, validated, and handed to the logbook server by a [`Submitter`].
//! When the server cannot be reached the entry is written to a local queue
//! directory for later forwarding.

pub mod config;
pub mod delivery;
pub mod error;
pub mod model;
pub mod wire;

pub use config::Config;
pub use delivery::{HttpTransport, Outcome, Submitter, Transport, TransportResponse};
pub use error::{ElogError, Result};
pub use model::attachment::{Attachment, FileAttachment, UrlAttachment};
pub use model::entry::Entry;
pub use model::user::{User, UserField};
pub use wire::response::Receipt;
pub use wire::validate::{SchemaValidator, StructuralValidator, XmlDiagnostic};
