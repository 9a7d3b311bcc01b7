//! Code generation tests
//!
//! Batch and piece codes must be pure functions of their inputs: same
//! invoice, category, and index always yield the same printed label.

use proptest::prelude::*;

use shared::codes::{
    make_batch_code, make_piece_code, normalize_invoice, piece_index, random_short_code,
};
use shared::models::Category;

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_normalize_uppercases_lowercase_only() {
        assert_eq!(normalize_invoice("ve/01020256"), "VE/01020256");
        assert_eq!(normalize_invoice("VE/01020256"), "VE/01020256");
        assert_eq!(normalize_invoice("inv-9a"), "INV-9A");
        assert_eq!(normalize_invoice(""), "");
    }

    #[test]
    fn test_category_prefixes() {
        assert_eq!(Category::Monuments.prefix(), "MN");
        assert_eq!(Category::Granite.prefix(), "GR");
        assert_eq!(Category::Quartz.prefix(), "QR");
    }

    #[test]
    fn test_unknown_label_falls_back_to_monuments() {
        assert_eq!(Category::from_label("Marble"), Category::Monuments);
        assert_eq!(Category::from_label(""), Category::Monuments);
    }

    #[test]
    fn test_batch_code_format() {
        let code = make_batch_code(Category::Monuments, "ve/01020256", 1);
        assert_eq!(code, "MN-VE/01020256-I1");
    }

    #[test]
    fn test_batch_code_empty_invoice_uses_x() {
        assert_eq!(make_batch_code(Category::Quartz, "", 3), "QR-X-I3");
    }

    #[test]
    fn test_piece_code_is_one_based() {
        let batch = make_batch_code(Category::Granite, "INV9", 2);
        assert_eq!(make_piece_code(&batch, 1), "GR-INV9-I2/1");
        assert_eq!(make_piece_code(&batch, 3), "GR-INV9-I2/3");
    }

    #[test]
    fn test_piece_index_roundtrip() {
        assert_eq!(piece_index("GR-INV9-I2/17"), 17);
        assert_eq!(piece_index("MN-X-I1/1"), 1);
    }

    #[test]
    fn test_determinism() {
        let a = make_batch_code(Category::Granite, "abc123", 4);
        let b = make_batch_code(Category::Granite, "abc123", 4);
        assert_eq!(a, b);
    }

    #[test]
    fn test_short_code_redraw_escapes_collision() {
        use std::collections::HashSet;

        // Labels that collide with existing pieces get a fresh draw; every
        // call is an independent sample, so a redraw escapes a taken set
        let taken: HashSet<String> = (0..50).map(|_| random_short_code()).collect();
        let fresh = (0..100)
            .map(|_| random_short_code())
            .find(|code| !taken.contains(code));
        assert!(fresh.is_some());
    }

    #[test]
    fn test_short_code_shape() {
        for _ in 0..50 {
            let code = random_short_code();
            assert_eq!(code.len(), 6);
            assert!(code
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
        }
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn category_strategy() -> impl Strategy<Value = Category> {
        prop_oneof![
            Just(Category::Monuments),
            Just(Category::Granite),
            Just(Category::Quartz),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Prefix is always exactly two uppercase ASCII characters
        #[test]
        fn prop_prefix_always_two_chars(category in category_strategy()) {
            let prefix = category.prefix();
            prop_assert_eq!(prefix.len(), 2);
            prop_assert!(prefix.chars().all(|c| c.is_ascii_uppercase()));
        }

        /// Normalization is idempotent and length-preserving
        #[test]
        fn prop_normalize_idempotent(raw in ".{0,40}") {
            let once = normalize_invoice(&raw);
            let twice = normalize_invoice(&once);
            prop_assert_eq!(&once, &twice);
            prop_assert_eq!(once.chars().count(), raw.chars().count());
        }

        /// Batch codes always carry the 1-based item index
        #[test]
        fn prop_batch_code_shape(
            category in category_strategy(),
            invoice in "[a-zA-Z0-9/]{0,16}",
            index in 1usize..200
        ) {
            let code = make_batch_code(category, &invoice, index);
            prop_assert!(code.starts_with(category.prefix()));
            let index_suffix = format!("-I{}", index);
            prop_assert!(code.ends_with(&index_suffix));
            if normalize_invoice(&invoice).is_empty() {
                prop_assert_eq!(code, format!("{}-X-I{}", category.prefix(), index));
            }
        }

        /// Piece codes recover their index
        #[test]
        fn prop_piece_index_recoverable(
            category in category_strategy(),
            invoice in "[A-Z0-9]{1,12}",
            item in 1usize..50,
            piece in 1usize..500
        ) {
            let batch = make_batch_code(category, &invoice, item);
            let code = make_piece_code(&batch, piece);
            prop_assert_eq!(piece_index(&code), piece);
        }
    }
}
