pub mod converters;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use validator::ValidationError;

/// Largest amount the `numeric(16, 4)` columns hold.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(1_874_919_423, 2_328_306, 0, false, 4);

/// Decimal places the amount columns keep.
pub const AMOUNT_SCALE: u32 = 4;

/// Amounts must be strictly positive and fit the amount columns.
pub fn validate_positive_amount(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() || amount.is_zero() {
        let mut err = ValidationError::new("positive_amount");
        err.message = Some("amount must be greater than zero".into());
        return Err(err);
    }
    if *amount > MAX_AMOUNT {
        let mut err = ValidationError::new("amount_range");
        err.message = Some("amount must not exceed 999999999999.9999".into());
        return Err(err);
    }
    if amount.normalize().scale() > AMOUNT_SCALE {
        let mut err = ValidationError::new("amount_scale");
        err.message = Some("amount must have at most 4 decimal places".into());
        return Err(err);
    }
    Ok(())
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("must not be blank".into());
        return Err(err);
    }
    Ok(())
}

/// Tells an absent field (`None`) apart from an explicit `null` (`Some(None)`).
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use uuid::Uuid;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default, deserialize_with = "double_option")]
        category_id: Option<Option<Uuid>>,
    }

    #[test]
    fn test_double_option_distinguishes_null_from_absent() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        assert_eq!(absent.category_id, None);

        let null: Patch = serde_json::from_str(r#"{"category_id": null}"#).unwrap();
        assert_eq!(null.category_id, Some(None));

        let id = Uuid::new_v4();
        let set: Patch = serde_json::from_str(&format!(r#"{{"category_id": "{}"}}"#, id)).unwrap();
        assert_eq!(set.category_id, Some(Some(id)));
    }

    #[test]
    fn test_positive_amount() {
        assert!(validate_positive_amount(&Decimal::new(1, 2)).is_ok());
        assert!(validate_positive_amount(&Decimal::ZERO).is_err());
        assert!(validate_positive_amount(&Decimal::from(-5)).is_err());
    }

    #[test]
    fn test_amount_must_fit_the_column() {
        assert_eq!(MAX_AMOUNT, Decimal::from_str("999999999999.9999").unwrap());
        assert!(validate_positive_amount(&MAX_AMOUNT).is_ok());
        assert!(validate_positive_amount(&Decimal::from_str("1000000000000").unwrap()).is_err());
        assert!(validate_positive_amount(&Decimal::from_str("20000000000000000000000000000").unwrap()).is_err());
        assert!(validate_positive_amount(&Decimal::MAX).is_err());
    }

    #[test]
    fn test_amount_scale() {
        assert!(validate_positive_amount(&Decimal::from_str("10.1234").unwrap()).is_ok());
        assert!(validate_positive_amount(&Decimal::from_str("10.50000").unwrap()).is_ok());
        assert!(validate_positive_amount(&Decimal::from_str("10.12345").unwrap()).is_err());
        assert!(validate_positive_amount(&Decimal::from_str("0.00001").unwrap()).is_err());
    }

    #[test]
    fn test_not_blank() {
        assert!(validate_not_blank("Salário").is_ok());
        assert!(validate_not_blank("   ").is_err());
    }
}
