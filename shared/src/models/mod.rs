//! Domain models for the Stone Inventory Management Platform

mod batch;
mod category;
mod movement;
mod order;
mod party;
mod piece;

pub use batch::*;
pub use category::*;
pub use movement::*;
pub use order::*;
pub use party::*;
pub use piece::*;
