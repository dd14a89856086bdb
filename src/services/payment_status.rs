//! Payment-status response normalization.
//!
//! The status endpoint sometimes answers with a body that is not strict JSON.
//! Normalization therefore never errors: absence of proof of payment is the
//! default outcome, and nothing short of the exact sentinel is treated as
//! paid.

use serde_json::Value;

/// JSON field the backend uses for the paid flag.
pub const PAID_FLAG_KEY: &str = "Pagado";
/// Sentinel value meaning "payment received".
pub const PAID_SENTINEL: &str = "S";
/// Literal key/value pair searched for when the body is not valid JSON.
const PAID_SENTINEL_FRAGMENT: &str = "\"Pagado\":\"S\"";

/// Decides whether a raw status body represents a paid order.
///
/// Ordered fallback: structured parse first, then a literal substring search
/// over the raw text. Malformed input yields `false`, never an error.
pub fn is_paid_response(body: &str) -> bool {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        if value.get(PAID_FLAG_KEY).and_then(Value::as_str) == Some(PAID_SENTINEL) {
            return true;
        }
    }
    body.contains(PAID_SENTINEL_FRAGMENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structured_sentinel_is_paid() {
        assert!(is_paid_response(r#"{"Pagado":"S"}"#));
        assert!(is_paid_response(r#"{"OrderId":102,"Pagado":"S","Extra":1}"#));
    }

    #[test]
    fn structured_non_sentinel_is_not_paid() {
        assert!(!is_paid_response(r#"{"Pagado":"N"}"#));
        assert!(!is_paid_response(r#"{"Pagado":"s"}"#));
        assert!(!is_paid_response(r#"{"Pagado":true}"#));
        assert!(!is_paid_response(r#"{"OrderId":102}"#));
    }

    #[test]
    fn raw_text_with_literal_pair_is_paid() {
        assert!(is_paid_response(r#"status: "Pagado":"S" (cached)"#));
    }

    #[test]
    fn raw_text_without_literal_pair_is_not_paid() {
        assert!(!is_paid_response("Pagado:N"));
        assert!(!is_paid_response("Pagado:S"));
        assert!(!is_paid_response("the order is paid"));
    }

    #[test]
    fn malformed_bodies_never_panic_and_default_to_unpaid() {
        for body in ["", "{", "null", "[1,2,3]", "\u{0}\u{1}", "<html></html>"] {
            assert!(!is_paid_response(body), "body {:?} must not read as paid", body);
        }
    }
}
