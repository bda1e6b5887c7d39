use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

/// Compute the signature Midtrans attaches to payment notifications.
///
/// Format: lowercase hex of SHA512(order_id + status_code + gross_amount + server_key),
/// with no separators between the parts.
pub fn notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// Verify a notification signature using constant-time comparison.
///
/// The claimed signature must match exactly; upper-case hex is rejected.
pub fn verify_notification_signature(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
    signature: &str,
) -> bool {
    let expected_signature =
        notification_signature(order_id, status_code, gross_amount, server_key);

    let expected_bytes = expected_signature.as_bytes();
    let signature_bytes = signature.as_bytes();

    if expected_bytes.len() != signature_bytes.len() {
        return false;
    }

    expected_bytes.ct_eq(signature_bytes).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SERVER_KEY: &str = "SB-Mid-server-test";

    #[test]
    fn test_known_signature() {
        let signature = notification_signature("order-001", "200", "25000", SERVER_KEY);
        assert_eq!(
            signature,
            "4e69c5a3fa27e55c0b5e488583381fd91ab7bb9367d8d9754c4224b5936f6e41\
             4de453172ddc5a6c1072aa1a724b113c51d4d79d8cc2496f3af10de13729b4a5"
        );
    }

    #[test]
    fn test_decimal_gross_amount_is_hashed_verbatim() {
        let signature = notification_signature("order-101", "200", "10000.00", SERVER_KEY);
        assert_eq!(
            signature,
            "d6cc94859a82430720d80d9d81d8c92dbedd7b55dc398de19ab3d593c43d7060\
             33e4daec3c6c98c28384356f5b6560fae1becfb2619719d8fba3ff1793cec7ab"
        );
        assert_ne!(
            signature,
            notification_signature("order-101", "200", "10000", SERVER_KEY)
        );
    }

    #[test]
    fn test_valid_signature_verifies() {
        let signature = notification_signature("order-001", "200", "25000", SERVER_KEY);
        assert!(verify_notification_signature(
            "order-001",
            "200",
            "25000",
            SERVER_KEY,
            &signature
        ));
    }

    #[test]
    fn test_invalid_signature() {
        assert!(!verify_notification_signature(
            "order-001",
            "200",
            "25000",
            SERVER_KEY,
            "invalid-signature"
        ));
    }

    #[test]
    fn test_tampered_status_code() {
        let signature = notification_signature("order-001", "200", "25000", SERVER_KEY);
        assert!(!verify_notification_signature(
            "order-001",
            "201",
            "25000",
            SERVER_KEY,
            &signature
        ));
    }

    #[test]
    fn test_uppercase_hex_rejected() {
        let signature = notification_signature("order-001", "200", "25000", SERVER_KEY);
        assert!(!verify_notification_signature(
            "order-001",
            "200",
            "25000",
            SERVER_KEY,
            &signature.to_uppercase()
        ));
    }
}
