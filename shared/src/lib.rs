//! Shared types and domain logic for the Stone Inventory Management Platform
//!
//! This crate contains the deterministic core shared between the backend,
//! the browser batch-generation path (via WASM), and other components:
//! batch/piece code derivation, purchase-order pricing, and the per-batch
//! stock ledger state machine.

pub mod codes;
pub mod ledger;
pub mod models;
pub mod pricing;
pub mod types;
pub mod validation;

pub use codes::*;
pub use ledger::*;
pub use models::*;
pub use pricing::*;
pub use types::*;
pub use validation::*;
