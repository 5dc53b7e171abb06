//! Field-level normalization shared by catalog and quote inputs.

use super::error::CatalogError;

/// 100% in basis points.
pub const MAX_BPS: i32 = 10_000;

/// Trim `value`; blank or overlong values are rejected.
pub fn normalize_required(
    field: &'static str,
    value: &str,
    max: usize,
) -> Result<String, CatalogError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(CatalogError::Required { field });
    }
    if trimmed.chars().count() > max {
        return Err(CatalogError::TooLong { field, max });
    }
    Ok(trimmed.to_string())
}

/// Trim `value`; blank becomes `None`.
pub fn normalize_optional(
    field: &'static str,
    value: Option<&str>,
    max: usize,
) -> Result<Option<String>, CatalogError> {
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) if v.chars().count() > max => Err(CatalogError::TooLong { field, max }),
        Some(v) => Ok(Some(v.to_string())),
    }
}

/// VAT rates are whole basis points between 0 and 100%.
pub fn validate_rate_bps(rate_bps: i32) -> Result<i32, CatalogError> {
    if (0..=MAX_BPS).contains(&rate_bps) {
        Ok(rate_bps)
    } else {
        Err(CatalogError::RateOutOfRange(rate_bps))
    }
}

/// Money amounts in cents must not be negative.
pub fn validate_price(field: &'static str, cents: i64) -> Result<i64, CatalogError> {
    if cents < 0 {
        return Err(CatalogError::NegativePrice { field, value: cents });
    }
    Ok(cents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_normalize_required() {
        assert_eq!(normalize_required("name", "  Drill ", 10).unwrap(), "Drill");
        assert_eq!(
            normalize_required("name", "   ", 10),
            Err(CatalogError::Required { field: "name" })
        );
        assert_eq!(
            normalize_required("name", "abcdefghijk", 10),
            Err(CatalogError::TooLong { field: "name", max: 10 })
        );
    }

    #[test]
    fn test_normalize_optional() {
        assert_eq!(normalize_optional("sku", None, 5).unwrap(), None);
        assert_eq!(normalize_optional("sku", Some("  "), 5).unwrap(), None);
        assert_eq!(
            normalize_optional("sku", Some(" A-1 "), 5).unwrap(),
            Some("A-1".to_string())
        );
        assert!(normalize_optional("sku", Some("ABCDEF"), 5).is_err());
    }

    #[test]
    fn test_max_length_counts_characters() {
        assert!(normalize_required("name", "ééééé", 5).is_ok());
    }

    proptest! {
        #[test]
        fn prop_rate_bps_range(rate in -20_000i32..20_000) {
            prop_assert_eq!(validate_rate_bps(rate).is_ok(), (0..=10_000).contains(&rate));
        }

        #[test]
        fn prop_price_non_negative(cents in any::<i64>()) {
            prop_assert_eq!(validate_price("unitPriceCents", cents).is_ok(), cents >= 0);
        }
    }
}
