//! Master Sync Handlers

pub(crate) mod index;
pub(crate) mod list;
pub(crate) mod status;
