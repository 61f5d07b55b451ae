//! Master-sync markers
//!
//! One "last changed" timestamp per shop and module. Dependent caches poll
//! these instead of pulling every module's delta feed.

pub mod errors;
mod notifier;
mod repository;

pub use errors::MasterSyncError;
pub use notifier::MasterSyncNotifier;
pub use repository::*;
