//! Synchronization services
//!
//! Entity-agnostic services built on the change-tracking store: CRUD with
//! event publishing, the delta feed, bulk reconciliation and the master-sync
//! aggregate over every registered module.

mod bulk;
mod delta;
pub mod errors;
mod modules;
mod service;

pub use bulk::BulkReconciler;
pub use delta::DeltaFeedService;
pub use errors::RecordsServiceError;
pub use modules::*;
pub use service::*;
