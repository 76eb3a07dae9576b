//! Request payloads and their validation rules.

pub mod catalog;
pub mod orders;
pub mod returns;

use rust_decimal::Decimal;
use std::collections::HashSet;
use validator::ValidationError;

pub use catalog::{
    BlacklistCustomerRequest, CreateCustomerRequest, CreateProductRequest, RestockProductRequest,
};
pub use orders::{CreateOrderRequest, OrderLineInput, UpdateOrderRequest};
pub use returns::{CreateReturnRequest, ReturnLineInput};

/// Anything carrying a product code.
pub trait HasCode {
    fn code(&self) -> &str;
}

/// Codes and names are stored trimmed and uppercased.
pub fn normalize_code(value: &str) -> String {
    value.trim().to_uppercase()
}

pub(crate) fn normalize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn error(code: &'static str, message: String) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}

pub(crate) fn validate_unique_codes<T: HasCode>(items: &[T]) -> Result<(), ValidationError> {
    let mut seen = HashSet::new();
    for item in items {
        if !seen.insert(normalize_code(item.code())) {
            return Err(error(
                "unique",
                format!("'Products' contains a duplicate code {}!", normalize_code(item.code())),
            ));
        }
    }
    Ok(())
}

pub(crate) fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "'Code' and 'Name' must not be empty!".to_string()));
    }
    Ok(())
}

pub(crate) fn validate_reason(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(error("blank", "'Reason' is not allowed to be empty!".to_string()));
    }
    Ok(())
}

pub(crate) fn validate_positive_price(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(error("range", "'Price' must be greater than 0!".to_string()))
    }
}

pub(crate) fn validate_positive_cost(value: &Decimal) -> Result<(), ValidationError> {
    if *value > Decimal::ZERO {
        Ok(())
    } else {
        Err(error("range", "'Cost' must be greater than 0!".to_string()))
    }
}

pub(crate) fn validate_non_negative_credit(value: &Decimal) -> Result<(), ValidationError> {
    if *value >= Decimal::ZERO {
        Ok(())
    } else {
        Err(error(
            "range",
            "'Credit' must be greater than or equal to 0!".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    struct Line(&'static str);

    impl HasCode for Line {
        fn code(&self) -> &str {
            self.0
        }
    }

    #[rstest]
    #[case(" abc ", "ABC")]
    #[case("x-1", "X-1")]
    #[case("ALREADY", "ALREADY")]
    fn codes_are_trimmed_and_uppercased(#[case] raw: &str, #[case] expected: &str) {
        assert_eq!(normalize_code(raw), expected);
    }

    #[test]
    fn duplicate_codes_differing_only_in_case_are_rejected() {
        assert!(validate_unique_codes(&[Line("a"), Line("B")]).is_ok());
        assert!(validate_unique_codes(&[Line("a"), Line(" A ")]).is_err());
    }

    #[test]
    fn blank_optional_text_becomes_none() {
        assert_eq!(normalize_optional(Some("  ".into())), None);
        assert_eq!(normalize_optional(Some(" damaged ".into())), Some("damaged".into()));
    }
}
