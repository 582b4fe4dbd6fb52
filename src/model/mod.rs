//! Core data model: entries, users, attachments, and the helpers that
//! normalize their fields.

pub mod address;
pub mod attachment;
pub mod date;
pub mod entry;
pub mod user;
