//! Purchase-order pricing
//!
//! Two mutually exclusive pricing bases chosen by category: monuments are
//! priced per piece, granite and quartz per square metre. Currency values
//! stay unrounded through intermediate computation and are rounded to two
//! decimal places only at the persist/display boundary via [`round_money`].

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::{Category, PricingBasis, PurchaseOrderLineItem};

/// cm² per m²
const SQCM_PER_SQMT: u32 = 10_000;

/// The pricing-relevant slice of a line item. Usable both for persisted
/// lines and for unsaved form input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceLine {
    pub category: Category,
    pub quantity_ordered: i32,
    pub unit_price: Decimal,
    /// Dimensions in centimetres
    pub width_cm: Option<Decimal>,
    pub height_cm: Option<Decimal>,
    /// Explicit square-metre override; wins over derived area while set
    pub sqmt: Option<Decimal>,
}

impl From<&PurchaseOrderLineItem> for PriceLine {
    fn from(item: &PurchaseOrderLineItem) -> Self {
        Self {
            category: item.category,
            quantity_ordered: item.quantity_ordered,
            unit_price: item.unit_price,
            width_cm: item.width_cm,
            height_cm: item.height_cm,
            sqmt: item.sqmt,
        }
    }
}

/// Import-side charges allocated across an order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdditionalCharges {
    pub ocean_freight: Decimal,
    pub insurance: Decimal,
    pub fumigation: Decimal,
    pub clearance: Decimal,
}

impl AdditionalCharges {
    pub fn total(&self) -> Decimal {
        self.ocean_freight + self.insurance + self.fumigation + self.clearance
    }
}

/// Order-level aggregates derived from the lines and charges
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub additional_charges: Decimal,
    pub grand_total: Decimal,
    pub total_units: Decimal,
    pub landing_cost_per_unit: Decimal,
}

/// Area of one piece in square metres, from centimetre dimensions.
/// Missing or non-positive dimensions yield zero.
pub fn area_per_piece_sqmt(width_cm: Option<Decimal>, height_cm: Option<Decimal>) -> Decimal {
    match (width_cm, height_cm) {
        (Some(w), Some(h)) if w > Decimal::ZERO && h > Decimal::ZERO => {
            w * h / Decimal::from(SQCM_PER_SQMT)
        }
        _ => Decimal::ZERO,
    }
}

/// Effective square metres for an area-priced line: an explicit positive
/// sqmt override wins, otherwise per-piece area times quantity.
pub fn effective_sqmt(line: &PriceLine) -> Decimal {
    match line.sqmt {
        Some(s) if s > Decimal::ZERO => s,
        _ => {
            area_per_piece_sqmt(line.width_cm, line.height_cm)
                * Decimal::from(line.quantity_ordered)
        }
    }
}

/// The value sqmt auto-fills to when dimensions or quantity change and no
/// explicit override is in force: derived area rounded to 2 decimals.
/// Returns None when the dimensions don't produce a positive area, so the
/// field is left alone.
pub fn auto_fill_sqmt(
    width_cm: Option<Decimal>,
    height_cm: Option<Decimal>,
    quantity: i32,
) -> Option<Decimal> {
    let area = area_per_piece_sqmt(width_cm, height_cm);
    if area > Decimal::ZERO {
        Some((area * Decimal::from(quantity)).round_dp(2))
    } else {
        None
    }
}

/// Total price of one line under its category's basis
pub fn line_total(line: &PriceLine) -> Decimal {
    match line.category.basis() {
        PricingBasis::Count => Decimal::from(line.quantity_ordered) * line.unit_price,
        PricingBasis::Area => effective_sqmt(line) * line.unit_price,
    }
}

/// Units one line contributes to landing-cost allocation: piece count for
/// monuments, effective square metres otherwise
pub fn line_units(line: &PriceLine) -> Decimal {
    match line.category.basis() {
        PricingBasis::Count => Decimal::from(line.quantity_ordered),
        PricingBasis::Area => effective_sqmt(line),
    }
}

pub fn order_subtotal(lines: &[PriceLine]) -> Decimal {
    lines.iter().map(line_total).sum()
}

/// Landing cost allocated per unit of stock. Guarded: zero units yields
/// zero, never a division error.
pub fn landing_cost_per_unit(charges_total: Decimal, total_units: Decimal) -> Decimal {
    if total_units > Decimal::ZERO {
        charges_total / total_units
    } else {
        Decimal::ZERO
    }
}

/// Compute order-level totals. `total_units_override` and
/// `landing_cost_override` are explicit user entries that win over the
/// derived values while set.
pub fn compute_order_totals(
    lines: &[PriceLine],
    charges: &AdditionalCharges,
    total_units_override: Option<Decimal>,
    landing_cost_override: Option<Decimal>,
) -> OrderTotals {
    let subtotal = order_subtotal(lines);
    let additional = charges.total();
    let total_units = match total_units_override {
        Some(u) if u > Decimal::ZERO => u,
        _ => lines.iter().map(line_units).sum(),
    };
    let landing = match landing_cost_override {
        Some(l) if l > Decimal::ZERO => l,
        _ => landing_cost_per_unit(additional, total_units),
    };
    OrderTotals {
        subtotal,
        additional_charges: additional,
        grand_total: subtotal + additional,
        total_units,
        landing_cost_per_unit: landing,
    }
}

/// Round a currency value for persistence or display
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn granite_line(
        quantity: i32,
        unit_price: &str,
        width: &str,
        height: &str,
        sqmt: Option<&str>,
    ) -> PriceLine {
        PriceLine {
            category: Category::Granite,
            quantity_ordered: quantity,
            unit_price: dec(unit_price),
            width_cm: Some(dec(width)),
            height_cm: Some(dec(height)),
            sqmt: sqmt.map(dec),
        }
    }

    #[test]
    fn test_monuments_count_basis() {
        let line = PriceLine {
            category: Category::Monuments,
            quantity_ordered: 10,
            unit_price: dec("100"),
            width_cm: None,
            height_cm: None,
            sqmt: None,
        };
        assert_eq!(line_total(&line), dec("1000"));
    }

    #[test]
    fn test_granite_area_basis() {
        // 60cm x 60cm = 0.36 sqmt per piece, 4 pieces = 1.44 sqmt @ 50
        let line = granite_line(4, "50", "60", "60", None);
        assert_eq!(area_per_piece_sqmt(line.width_cm, line.height_cm), dec("0.36"));
        assert_eq!(effective_sqmt(&line), dec("1.44"));
        assert_eq!(round_money(line_total(&line)), dec("72.00"));
    }

    #[test]
    fn test_sqmt_override_wins() {
        let line = granite_line(4, "50", "60", "60", Some("2.00"));
        assert_eq!(effective_sqmt(&line), dec("2.00"));
        assert_eq!(line_total(&line), dec("100.00"));
    }

    #[test]
    fn test_missing_dimensions_yield_zero_area() {
        assert_eq!(area_per_piece_sqmt(None, Some(dec("60"))), Decimal::ZERO);
        assert_eq!(area_per_piece_sqmt(Some(dec("0")), Some(dec("60"))), Decimal::ZERO);
    }

    #[test]
    fn test_auto_fill_sqmt() {
        assert_eq!(
            auto_fill_sqmt(Some(dec("60")), Some(dec("60")), 4),
            Some(dec("1.44"))
        );
        assert_eq!(auto_fill_sqmt(None, Some(dec("60")), 4), None);
    }

    #[test]
    fn test_landing_cost_zero_guard() {
        assert_eq!(landing_cost_per_unit(dec("500"), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(landing_cost_per_unit(dec("500"), dec("100")), dec("5"));
    }

    #[test]
    fn test_order_totals() {
        let lines = vec![
            PriceLine {
                category: Category::Monuments,
                quantity_ordered: 10,
                unit_price: dec("100"),
                width_cm: None,
                height_cm: None,
                sqmt: None,
            },
            granite_line(4, "50", "60", "60", None),
        ];
        let charges = AdditionalCharges {
            ocean_freight: dec("200"),
            insurance: dec("30"),
            fumigation: dec("10"),
            clearance: dec("60"),
        };
        let totals = compute_order_totals(&lines, &charges, None, None);
        assert_eq!(totals.subtotal, dec("1072.00"));
        assert_eq!(totals.additional_charges, dec("300"));
        assert_eq!(totals.grand_total, dec("1372.00"));
        // 10 monument pieces + 1.44 granite sqmt
        assert_eq!(totals.total_units, dec("11.44"));
        assert_eq!(
            round_money(totals.landing_cost_per_unit),
            round_money(dec("300") / dec("11.44"))
        );
    }

    #[test]
    fn test_order_totals_overrides_win() {
        let lines = vec![granite_line(4, "50", "60", "60", None)];
        let charges = AdditionalCharges {
            ocean_freight: dec("144"),
            ..Default::default()
        };
        let totals = compute_order_totals(&lines, &charges, Some(dec("2")), None);
        assert_eq!(totals.total_units, dec("2"));
        assert_eq!(totals.landing_cost_per_unit, dec("72"));

        let overridden =
            compute_order_totals(&lines, &charges, Some(dec("2")), Some(dec("10")));
        assert_eq!(overridden.landing_cost_per_unit, dec("10"));
    }
}
