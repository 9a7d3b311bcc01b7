//! Batch and piece code derivation
//!
//! These codes are printed on physical labels and persisted externally, so
//! every function here is total: unexpected input degrades to a documented
//! fallback value, never an error.

use rand::Rng;

use crate::models::Category;

/// Normalize an invoice number for embedding in a batch code: lowercase
/// ASCII letters are uppercased, every other character (digits, symbols,
/// already-uppercase letters) passes through unchanged.
pub fn normalize_invoice(raw: &str) -> String {
    raw.chars()
        .map(|ch| {
            if ch.is_ascii_lowercase() {
                ch.to_ascii_uppercase()
            } else {
                ch
            }
        })
        .collect()
}

/// Build the canonical batch code `{prefix}-{invoice}-I{index}` for a
/// line item. `item_index` is the 1-based position of the line within its
/// purchase order. An empty invoice yields the literal placeholder "X"
/// (preview only; persistence requires an invoice first); batch-code
/// uniqueness otherwise rests on invoice uniqueness, validated separately.
pub fn make_batch_code(category: Category, invoice_raw: &str, item_index: usize) -> String {
    let inv = normalize_invoice(invoice_raw);
    let inv = if inv.is_empty() { "X".to_string() } else { inv };
    format!("{}-{}-I{}", category.prefix(), inv, item_index)
}

/// Build the item code `{batch_code}/{piece_index}` for one piece.
/// Piece indexes are 1-based, contiguous, assigned in creation order and
/// never reused, even when a piece is later returned.
pub fn make_piece_code(batch_code: &str, piece_index: usize) -> String {
    format!("{}/{}", batch_code, piece_index)
}

const SHORT_CODE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SHORT_CODE_LEN: usize = 6;

/// Random 6-character scanner payload for a piece label. Uniqueness rests
/// on the pieces table's constraint; callers redraw on collision.
pub fn random_short_code() -> String {
    let mut rng = rand::thread_rng();
    (0..SHORT_CODE_LEN)
        .map(|_| SHORT_CODE_ALPHABET[rng.gen_range(0..SHORT_CODE_ALPHABET.len())] as char)
        .collect()
}

/// Extract the 1-based position of a piece within its batch from its item
/// code, for "piece N of M" displays. Codes without a numeric tail yield 0.
pub fn piece_index(item_id: &str) -> usize {
    item_id
        .rsplit('/')
        .next()
        .and_then(|tail| tail.parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_invoice() {
        assert_eq!(normalize_invoice("ve/01020256"), "VE/01020256");
        assert_eq!(normalize_invoice(""), "");
        assert_eq!(normalize_invoice("ABC-123"), "ABC-123");
        assert_eq!(normalize_invoice("aB1-x"), "AB1-X");
    }

    #[test]
    fn test_make_batch_code() {
        assert_eq!(
            make_batch_code(Category::Monuments, "ve/01020256", 1),
            "MN-VE/01020256-I1"
        );
        assert_eq!(
            make_batch_code(Category::Granite, "INV9", 12),
            "GR-INV9-I12"
        );
    }

    #[test]
    fn test_make_batch_code_empty_invoice() {
        assert_eq!(make_batch_code(Category::Quartz, "", 3), "QR-X-I3");
    }

    #[test]
    fn test_make_piece_code() {
        assert_eq!(make_piece_code("MN-VE/01020256-I1", 3), "MN-VE/01020256-I1/3");
    }

    #[test]
    fn test_piece_index() {
        assert_eq!(piece_index("MN-VE/01020256-I1/3"), 3);
        assert_eq!(piece_index("MN-VE/01020256-I1/25"), 25);
        assert_eq!(piece_index("no-index"), 0);
    }

    #[test]
    fn test_random_short_code_shape() {
        for _ in 0..50 {
            let code = random_short_code();
            assert_eq!(code.len(), 6);
            assert!(code
                .bytes()
                .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()));
        }
    }
}
