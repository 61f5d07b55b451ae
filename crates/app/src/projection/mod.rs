//! Relational projections
//!
//! Consumers of the change events keep a relational mirror of each module.
//! Writes are idempotent: a snapshot that matches the stored row is skipped
//! and an older snapshot never overwrites a newer one.

pub mod errors;
mod handler;
mod store;
mod worker;

pub use errors::ProjectionError;
pub use handler::{Outcome, ProjectionHandler};
pub use store::{PgProjectionStore, ProjectionStore};
pub use worker::{ProjectionWorker, consumer_name};
