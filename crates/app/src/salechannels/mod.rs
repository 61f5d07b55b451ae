//! Sale channels

pub mod models;
pub mod projection;

pub use models::SaleChannel;
pub use projection::SaleChannelRow;
