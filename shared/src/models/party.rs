//! Vendor and client contact records

use serde::{Deserialize, Serialize};

/// A supplier purchase orders are placed with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: i64,
    pub vendor_name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

/// A customer stock is dispatched to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Client {
    pub client_id: i64,
    pub client_name: String,
    pub contact_person: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}
