//! Shopsync
//!
//! Shopsync is the eventual-consistency core shared by multi-tenant retail back-office modules:
//! change-tracked records, delta feeds for pull-sync clients, bulk import classification,
//! event topic naming and the dirty-check used by relational projections.

pub mod bulk;
pub mod delta;
pub mod projection;
pub mod query;
pub mod records;
pub mod topics;
pub mod uuids;
pub mod validation;
