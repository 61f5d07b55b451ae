//! Persistence, messaging and synchronization services.

pub mod context;
pub mod database;
pub mod dispatch;
pub mod events;
pub mod mastersync;
pub mod projection;
pub mod salechannels;
pub mod settings;
pub mod store;
pub mod sync;

#[cfg(test)]
mod test;
