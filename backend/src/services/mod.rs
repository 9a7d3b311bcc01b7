//! Business logic services

pub mod batch;
pub mod client;
pub mod dashboard;
pub mod order;
pub mod report;
pub mod scan;
pub mod stock;
