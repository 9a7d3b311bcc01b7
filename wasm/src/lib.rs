//! WebAssembly module for the Stone Inventory Management Platform
//!
//! Provides client-side computation for:
//! - Batch and piece code generation at label-printing time
//! - Line pricing and landing-cost previews in the order form
//! - Ledger transition preview before a scan is submitted

use rust_decimal::Decimal;
use wasm_bindgen::prelude::*;

use shared::codes::{make_batch_code, make_piece_code, normalize_invoice, piece_index};
use shared::ledger::LedgerEvent;
use shared::models::{Category, PieceStatus};
use shared::pricing::{
    auto_fill_sqmt, landing_cost_per_unit, line_total, round_money, PriceLine,
};

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::types::*;

/// Initialize the WASM module
#[wasm_bindgen(start)]
pub fn init() {
    // Set up panic hook for better error messages in browser console
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();
}

/// Normalize an invoice number the way batch codes do
#[wasm_bindgen]
pub fn normalize_invoice_no(raw: &str) -> String {
    normalize_invoice(raw)
}

/// Derive the batch code for one order line
#[wasm_bindgen]
pub fn batch_code(category_label: &str, invoice_no: &str, item_index: usize) -> String {
    let category = Category::from_label(category_label);
    make_batch_code(category, invoice_no, item_index)
}

/// Derive all piece codes for a batch as a JSON array
#[wasm_bindgen]
pub fn piece_codes(batch_code: &str, quantity: u32) -> Result<String, JsValue> {
    let codes: Vec<String> = (1..=quantity as usize)
        .map(|i| make_piece_code(batch_code, i))
        .collect();
    serde_json::to_string(&codes).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// The 1-based position of a piece within its batch, read from its item
/// code, for "piece N of M" captions on scan results. Unparseable codes
/// yield 0.
#[wasm_bindgen]
pub fn piece_number(item_id: &str) -> u32 {
    piece_index(item_id) as u32
}

/// Compute one line's total from a JSON `PriceLine`
#[wasm_bindgen]
pub fn compute_line_total(line_json: &str) -> Result<String, JsValue> {
    let line: PriceLine = serde_json::from_str(line_json)
        .map_err(|e| JsValue::from_str(&format!("Invalid line JSON: {}", e)))?;
    Ok(round_money(line_total(&line)).to_string())
}

/// The auto-filled sqmt for dimensions and quantity, or empty when the
/// dimensions yield no area
#[wasm_bindgen]
pub fn compute_auto_sqmt(width_cm: f64, height_cm: f64, quantity: i32) -> String {
    let w = Decimal::try_from(width_cm).ok();
    let h = Decimal::try_from(height_cm).ok();
    match auto_fill_sqmt(w, h, quantity) {
        Some(sqmt) => sqmt.to_string(),
        None => String::new(),
    }
}

/// Landing cost per unit for the given charge total and unit count
#[wasm_bindgen]
pub fn compute_landing_cost(charges_total: f64, total_units: f64) -> String {
    let charges = Decimal::try_from(charges_total).unwrap_or(Decimal::ZERO);
    let units = Decimal::try_from(total_units).unwrap_or(Decimal::ZERO);
    round_money(landing_cost_per_unit(charges, units)).to_string()
}

/// Whether a ledger event could apply to a piece in the given status.
/// Event names match the API: "mark_out", "clear_to_sold", "undo_sale",
/// "return_before_invoice", "return_after_sale".
#[wasm_bindgen]
pub fn validate_transition(status: &str, event: &str) -> bool {
    match (PieceStatus::parse(status), LedgerEvent::parse(event)) {
        (Some(status), Some(event)) => status == event.expected_status(),
        _ => false,
    }
}

/// The status a piece lands in after an event, or empty for an unknown event
#[wasm_bindgen]
pub fn next_status(event: &str) -> String {
    LedgerEvent::parse(event)
        .map(|e| e.next_status().as_str().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_code_derivation() {
        assert_eq!(batch_code("Monuments", "ve/01020256", 1), "MN-VE/01020256-I1");
        assert_eq!(batch_code("Quartz", "", 3), "QR-X-I3");
    }

    #[test]
    fn test_piece_codes_json() {
        let json = piece_codes("GR-INV9-I2", 3).unwrap();
        let codes: Vec<String> = serde_json::from_str(&json).unwrap();
        assert_eq!(codes, vec!["GR-INV9-I2/1", "GR-INV9-I2/2", "GR-INV9-I2/3"]);
    }

    #[test]
    fn test_piece_number_from_code() {
        assert_eq!(piece_number("MN-VE/01020256-I1/3"), 3);
        assert_eq!(piece_number("no-index"), 0);
    }

    #[test]
    fn test_auto_sqmt() {
        assert_eq!(compute_auto_sqmt(60.0, 60.0, 4), "1.44");
        assert_eq!(compute_auto_sqmt(0.0, 60.0, 4), "");
    }

    #[test]
    fn test_landing_cost_guard() {
        assert_eq!(compute_landing_cost(500.0, 0.0), "0");
        assert_eq!(compute_landing_cost(500.0, 100.0), "5");
    }

    #[test]
    fn test_transition_preview() {
        assert!(validate_transition("available", "mark_out"));
        assert!(!validate_transition("available", "clear_to_sold"));
        assert_eq!(next_status("mark_out"), "out");
        assert_eq!(next_status("bogus"), "");
    }
}
