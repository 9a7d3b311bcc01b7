//! Validation utilities for the stone inventory platform

use rust_decimal::Decimal;

use crate::models::{Category, PaymentStatus};

// ============================================================================
// Purchase Order Validations
// ============================================================================

/// Validate an ordered quantity (must be a positive whole number of pieces)
pub fn validate_quantity(quantity: i32) -> Result<(), &'static str> {
    if quantity <= 0 {
        return Err("Quantity must be greater than zero");
    }
    Ok(())
}

/// Validate a unit price
pub fn validate_unit_price(price: Decimal) -> Result<(), &'static str> {
    if price < Decimal::ZERO {
        return Err("Unit price cannot be negative");
    }
    Ok(())
}

/// Validate a slab/monument dimension in centimeters, when supplied
pub fn validate_dimension(dim: Option<Decimal>) -> Result<(), &'static str> {
    if let Some(d) = dim {
        if d < Decimal::ZERO {
            return Err("Dimensions cannot be negative");
        }
    }
    Ok(())
}

/// Validate a category label resolves to a known product category
pub fn validate_category_label(label: &str) -> Result<Category, &'static str> {
    Category::parse(label).ok_or("Unknown product category")
}

/// Validate an additional charge (freight, insurance, fumigation, clearance)
pub fn validate_charge(charge: Decimal) -> Result<(), &'static str> {
    if charge < Decimal::ZERO {
        return Err("Charges cannot be negative");
    }
    Ok(())
}

/// Validate an invoice number: may be empty (unassigned), but once present
/// must not be blank padding
pub fn validate_invoice_no(invoice: &str) -> Result<(), &'static str> {
    if !invoice.is_empty() && invoice.trim().is_empty() {
        return Err("Invoice number cannot be blank");
    }
    if invoice.len() > 64 {
        return Err("Invoice number too long");
    }
    Ok(())
}

/// Batch codes embed the invoice number. Two invoiceless orders would both
/// fall back to the same "X" placeholder and collide, so code generation
/// requires the invoice to be set first.
pub fn validate_batch_invoice(invoice: &str) -> Result<(), &'static str> {
    if invoice.trim().is_empty() {
        return Err("Invoice number must be set before batch codes are generated");
    }
    Ok(())
}

// ============================================================================
// Payment Validations
// ============================================================================

/// Validate a payment amount against the order total already paid
pub fn validate_payment(
    amount: Decimal,
    already_paid: Decimal,
    order_total: Decimal,
) -> Result<PaymentStatus, &'static str> {
    if amount <= Decimal::ZERO {
        return Err("Payment amount must be greater than zero");
    }
    let paid = already_paid + amount;
    if paid > order_total + Decimal::new(1, 2) {
        return Err("Payment exceeds order total");
    }
    Ok(PaymentStatus::derive(paid, order_total))
}

// ============================================================================
// Scan Validations
// ============================================================================

/// Sale confirmation and dispatch both need a delivery order reference
pub fn validate_delivery_order_no(delivery_order_no: &str) -> Result<(), &'static str> {
    if delivery_order_no.trim().is_empty() {
        return Err("Delivery order number is required");
    }
    Ok(())
}

/// Bulk scans must carry at least one piece id
pub fn validate_bulk_ids(ids: &[String]) -> Result<(), &'static str> {
    if ids.is_empty() {
        return Err("At least one item id is required");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-3).is_err());
    }

    #[test]
    fn test_category_label() {
        assert_eq!(validate_category_label("Granite"), Ok(Category::Granite));
        assert_eq!(
            validate_category_label("Quartz Slabs"),
            Ok(Category::Quartz)
        );
        assert!(validate_category_label("Timber").is_err());
    }

    #[test]
    fn test_payment_within_total() {
        let status = validate_payment(dec!(400), dec!(0), dec!(1000)).unwrap();
        assert_eq!(status, PaymentStatus::PartialPaid);

        let status = validate_payment(dec!(600), dec!(400), dec!(1000)).unwrap();
        assert_eq!(status, PaymentStatus::FullPaid);
    }

    #[test]
    fn test_payment_exceeding_total() {
        assert!(validate_payment(dec!(700), dec!(400), dec!(1000)).is_err());
        assert!(validate_payment(dec!(0), dec!(0), dec!(1000)).is_err());
    }

    #[test]
    fn test_batch_invoice_required() {
        assert!(validate_batch_invoice("VE/01020256").is_ok());
        assert!(validate_batch_invoice("").is_err());
        assert!(validate_batch_invoice("   ").is_err());
    }

    #[test]
    fn test_delivery_order_required() {
        assert!(validate_delivery_order_no("DO-1042").is_ok());
        assert!(validate_delivery_order_no("   ").is_err());
    }
}
