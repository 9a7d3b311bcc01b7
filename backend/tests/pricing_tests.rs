//! Pricing calculator tests
//!
//! Monuments price per piece; granite and quartz per square metre with an
//! explicit sqmt override winning over derived area. Landing cost guards
//! against zero units.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use shared::models::Category;
use shared::pricing::{
    area_per_piece_sqmt, auto_fill_sqmt, compute_order_totals, effective_sqmt,
    landing_cost_per_unit, line_total, round_money, AdditionalCharges, PriceLine,
};

fn line(category: Category, qty: i32, price: Decimal) -> PriceLine {
    PriceLine {
        category,
        quantity_ordered: qty,
        unit_price: price,
        width_cm: None,
        height_cm: None,
        sqmt: None,
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_monuments_price_per_piece() {
        let line = line(Category::Monuments, 10, dec!(100));
        assert_eq!(line_total(&line), dec!(1000));
    }

    #[test]
    fn test_granite_prices_per_square_metre() {
        // 60x60 cm, 4 pieces at 50 per sqmt
        let mut l = line(Category::Granite, 4, dec!(50));
        l.width_cm = Some(dec!(60));
        l.height_cm = Some(dec!(60));

        assert_eq!(area_per_piece_sqmt(l.width_cm, l.height_cm), dec!(0.36));
        assert_eq!(effective_sqmt(&l), dec!(1.44));
        assert_eq!(round_money(line_total(&l)), dec!(72.00));
    }

    #[test]
    fn test_sqmt_override_wins() {
        let mut l = line(Category::Quartz, 4, dec!(50));
        l.width_cm = Some(dec!(60));
        l.height_cm = Some(dec!(60));
        l.sqmt = Some(dec!(2.00));

        assert_eq!(effective_sqmt(&l), dec!(2.00));
        assert_eq!(round_money(line_total(&l)), dec!(100.00));
    }

    #[test]
    fn test_missing_dimensions_yield_zero_area() {
        assert_eq!(area_per_piece_sqmt(None, Some(dec!(60))), Decimal::ZERO);
        assert_eq!(area_per_piece_sqmt(Some(dec!(0)), Some(dec!(60))), Decimal::ZERO);
        assert_eq!(
            area_per_piece_sqmt(Some(dec!(-5)), Some(dec!(60))),
            Decimal::ZERO
        );
    }

    #[test]
    fn test_auto_fill_rounds_to_two_decimals() {
        // 55x37 cm: 0.2035 per piece, 3 pieces = 0.6105 -> 0.61
        let auto = auto_fill_sqmt(Some(dec!(55)), Some(dec!(37)), 3);
        assert_eq!(auto, Some(dec!(0.61)));

        assert_eq!(auto_fill_sqmt(None, Some(dec!(37)), 3), None);
    }

    #[test]
    fn test_landing_cost_zero_guard() {
        assert_eq!(landing_cost_per_unit(dec!(500), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(landing_cost_per_unit(dec!(500), dec!(-1)), Decimal::ZERO);
        assert_eq!(landing_cost_per_unit(dec!(500), dec!(100)), dec!(5));
    }

    #[test]
    fn test_order_totals_mixed_basis() {
        // Monuments contribute piece count, granite effective sqmt
        let mut granite = line(Category::Granite, 4, dec!(50));
        granite.width_cm = Some(dec!(60));
        granite.height_cm = Some(dec!(60));
        let monuments = line(Category::Monuments, 10, dec!(100));

        let charges = AdditionalCharges {
            ocean_freight: dec!(300),
            insurance: dec!(100),
            fumigation: dec!(50),
            clearance: dec!(122),
        };

        let totals = compute_order_totals(&[granite, monuments], &charges, None, None);
        assert_eq!(totals.subtotal, dec!(1072)); // 72 + 1000
        assert_eq!(totals.additional_charges, dec!(572));
        assert_eq!(totals.grand_total, dec!(1644));
        assert_eq!(totals.total_units, dec!(11.44)); // 1.44 sqmt + 10 pieces
        assert_eq!(round_money(totals.landing_cost_per_unit), dec!(50.00));
    }

    #[test]
    fn test_total_units_override_wins() {
        let monuments = line(Category::Monuments, 10, dec!(100));
        let charges = AdditionalCharges {
            ocean_freight: dec!(500),
            ..Default::default()
        };

        let totals = compute_order_totals(&[monuments], &charges, Some(dec!(25)), None);
        assert_eq!(totals.total_units, dec!(25));
        assert_eq!(totals.landing_cost_per_unit, dec!(20));
    }

    #[test]
    fn test_landing_cost_override_wins() {
        let monuments = line(Category::Monuments, 10, dec!(100));
        let charges = AdditionalCharges {
            ocean_freight: dec!(500),
            ..Default::default()
        };

        let totals = compute_order_totals(&[monuments], &charges, None, Some(dec!(7.5)));
        assert_eq!(totals.landing_cost_per_unit, dec!(7.5));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn money_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 2))
    }

    fn dimension_strategy() -> impl Strategy<Value = Option<Decimal>> {
        prop_oneof![
            Just(None),
            (1i64..=50_000i64).prop_map(|n| Some(Decimal::new(n, 1))),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Non-negative inputs never produce a negative total
        #[test]
        fn prop_line_total_non_negative(
            qty in 0i32..1000,
            price in money_strategy(),
            width in dimension_strategy(),
            height in dimension_strategy()
        ) {
            for category in [Category::Monuments, Category::Granite, Category::Quartz] {
                let mut l = line(category, qty, price);
                l.width_cm = width;
                l.height_cm = height;
                prop_assert!(line_total(&l) >= Decimal::ZERO);
            }
        }

        /// Landing cost is charges divided by units, guarded at zero
        #[test]
        fn prop_landing_cost_guarded(
            charges in money_strategy(),
            units in (0i64..=100_000i64).prop_map(|n| Decimal::new(n, 2))
        ) {
            let cost = landing_cost_per_unit(charges, units);
            if units > Decimal::ZERO {
                prop_assert_eq!(cost, charges / units);
            } else {
                prop_assert_eq!(cost, Decimal::ZERO);
            }
        }

        /// A positive override always beats derived area
        #[test]
        fn prop_override_wins(
            qty in 1i32..100,
            price in money_strategy(),
            width in dimension_strategy(),
            height in dimension_strategy(),
            override_sqmt in (1i64..=10_000i64).prop_map(|n| Decimal::new(n, 2))
        ) {
            let mut l = line(Category::Granite, qty, price);
            l.width_cm = width;
            l.height_cm = height;
            l.sqmt = Some(override_sqmt);
            prop_assert_eq!(effective_sqmt(&l), override_sqmt);
        }
    }
}
