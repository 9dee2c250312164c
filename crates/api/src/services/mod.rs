//! Business logic, between the HTTP routes and the repositories.

pub mod auth;
pub mod checkout;
pub mod email;
pub mod oauth;
pub mod orders;
pub mod otp;
pub mod stripe;
pub mod token;

/// Compose the denormalized single-line shipping address.
///
/// The unit number is omitted entirely when absent.
#[must_use]
pub fn compose_full_address(
    street_address: &str,
    unit_number: Option<&str>,
    city: &str,
    postal_code: &str,
) -> String {
    match unit_number.filter(|unit| !unit.trim().is_empty()) {
        Some(unit) => format!("{street_address}, {unit}, {city} {postal_code}"),
        None => format!("{street_address}, {city} {postal_code}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_address_with_unit() {
        assert_eq!(
            compose_full_address("12 Orchard Rd", Some("#05-01"), "Singapore", "238823"),
            "12 Orchard Rd, #05-01, Singapore 238823"
        );
    }

    #[test]
    fn test_full_address_without_unit() {
        assert_eq!(
            compose_full_address("12 Orchard Rd", None, "Singapore", "238823"),
            "12 Orchard Rd, Singapore 238823"
        );
    }

    #[test]
    fn test_full_address_blank_unit_omitted() {
        assert_eq!(
            compose_full_address("12 Orchard Rd", Some("  "), "Singapore", "238823"),
            "12 Orchard Rd, Singapore 238823"
        );
    }
}
