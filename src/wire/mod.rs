//! The XML wire format: shared reader/writer plumbing, schema validation,
//! and the service's response envelope.

pub mod response;
pub mod validate;
pub mod xml;
