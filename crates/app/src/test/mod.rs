pub mod db;
pub mod memory;

pub use context::TestContext;
