//! HTTP handlers

pub mod clients;
pub mod dashboard;
pub mod health;
pub mod orders;
pub mod reports;
pub mod scan;
pub mod stock;

pub use clients::*;
pub use dashboard::*;
pub use health::*;
pub use orders::*;
pub use reports::*;
pub use scan::*;
pub use stock::*;
