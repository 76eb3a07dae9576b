use super::{
    normalize_code, normalize_optional, validate_non_negative_credit, validate_not_blank,
    validate_positive_cost, validate_positive_price, validate_unique_codes, HasCode,
};
use crate::{
    entities::{order_line_item, OrderStatus},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrderLineInput {
    #[validate(custom = "validate_not_blank")]
    pub code: String,
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[validate(range(min = 1, message = "'Quantity' must be greater than or equal to 1!"))]
    pub quantity: i32,
    #[validate(custom = "validate_positive_price")]
    pub price: Decimal,
    #[validate(custom = "validate_positive_cost")]
    pub cost: Decimal,
}

impl HasCode for OrderLineInput {
    fn code(&self) -> &str {
        &self.code
    }
}

impl From<&order_line_item::Model> for OrderLineInput {
    fn from(line: &order_line_item::Model) -> Self {
        Self {
            code: line.code.clone(),
            name: line.name.clone(),
            quantity: line.quantity,
            price: line.price,
            cost: line.cost,
        }
    }
}

impl OrderLineInput {
    fn normalized(mut self) -> Self {
        self.code = normalize_code(&self.code);
        self.name = normalize_code(&self.name);
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer: Uuid,
    #[validate(
        length(min = 1, message = "'Products' must contain at least 1 item!"),
        custom = "validate_unique_codes"
    )]
    pub products: Vec<OrderLineInput>,
    #[serde(default)]
    #[validate(custom = "validate_non_negative_credit")]
    pub credit: Decimal,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl CreateOrderRequest {
    /// Validates the payload and returns it with codes/names uppercased and
    /// text fields trimmed.
    pub fn into_normalized(self) -> Result<Self, ServiceError> {
        self.validate()?;
        validate_lines(&self.products)?;
        Ok(Self {
            products: self.products.into_iter().map(OrderLineInput::normalized).collect(),
            remarks: normalize_optional(self.remarks),
            ..self
        })
    }

    /// Entry status; defaults to DRAFT.
    pub fn entry_status(&self) -> Result<OrderStatus, ServiceError> {
        parse_status(self.status.as_deref().unwrap_or("DRAFT"))
    }
}

/// Partial edit of an order. Absent fields keep their stored values.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    #[serde(default)]
    pub customer: Option<Uuid>,
    #[serde(default)]
    #[validate(
        length(min = 1, message = "'Products' must contain at least 1 item!"),
        custom = "validate_unique_codes"
    )]
    pub products: Option<Vec<OrderLineInput>>,
    #[serde(default)]
    #[validate(custom = "validate_non_negative_credit")]
    pub credit: Option<Decimal>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
}

impl UpdateOrderRequest {
    pub fn into_normalized(self) -> Result<Self, ServiceError> {
        self.validate()?;
        if let Some(products) = &self.products {
            validate_lines(products)?;
        }
        Ok(Self {
            products: self
                .products
                .map(|lines| lines.into_iter().map(OrderLineInput::normalized).collect()),
            remarks: normalize_optional(self.remarks),
            ..self
        })
    }

    pub fn target_status(&self) -> Result<Option<OrderStatus>, ServiceError> {
        self.status.as_deref().map(parse_status).transpose()
    }
}

fn validate_lines(lines: &[OrderLineInput]) -> Result<(), ServiceError> {
    for line in lines {
        line.validate()?;
    }
    Ok(())
}

/// Orders can only be created or edited into DRAFT or SUBMIT; cancellation
/// has its own operation.
pub fn parse_status(raw: &str) -> Result<OrderStatus, ServiceError> {
    match OrderStatus::from_str(&raw.trim().to_uppercase()) {
        Ok(status @ (OrderStatus::Draft | OrderStatus::Submit)) => Ok(status),
        _ => Err(ServiceError::ValidationError(
            "'Status' must be one of [DRAFT, SUBMIT]!".to_string(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn line(code: &str, quantity: i32) -> OrderLineInput {
        OrderLineInput {
            code: code.into(),
            name: format!("{} name", code),
            quantity,
            price: dec!(5),
            cost: dec!(2),
        }
    }

    fn request(products: Vec<OrderLineInput>) -> CreateOrderRequest {
        CreateOrderRequest {
            customer: Uuid::new_v4(),
            products,
            credit: Decimal::ZERO,
            status: Some(" submit ".into()),
            remarks: Some("  rush  ".into()),
        }
    }

    #[test]
    fn normalizes_lines_and_remarks() {
        let mut padded = line("a1", 2);
        padded.code = " a1 ".into();
        padded.name = "  a1 name ".into();

        let req = request(vec![padded]).into_normalized().unwrap();
        assert_eq!(req.products[0].code, "A1");
        assert_eq!(req.products[0].name, "A1 NAME");
        assert_eq!(req.remarks.as_deref(), Some("rush"));
        assert_eq!(req.entry_status().unwrap(), OrderStatus::Submit);
    }

    #[test]
    fn empty_product_list_is_rejected() {
        let err = request(vec![]).into_normalized().unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(msg) if msg.contains("at least 1"));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let err = request(vec![line("A", 0)]).into_normalized().unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(msg) if msg.contains("Quantity"));
    }

    #[test]
    fn non_positive_price_is_rejected() {
        let mut bad = line("A", 1);
        bad.price = Decimal::ZERO;
        let err = request(vec![bad]).into_normalized().unwrap_err();
        assert_matches!(err, ServiceError::ValidationError(msg) if msg.contains("Price"));
    }

    #[test]
    fn negative_credit_is_rejected() {
        let mut req = request(vec![line("A", 1)]);
        req.credit = dec!(-1);
        assert!(req.into_normalized().is_err());
    }

    #[test]
    fn cancelled_is_not_an_entry_status() {
        assert!(parse_status("cancelled").is_err());
        assert_eq!(parse_status("draft").unwrap(), OrderStatus::Draft);
    }

    #[test]
    fn empty_patch_is_valid() {
        let patch = UpdateOrderRequest::default().into_normalized().unwrap();
        assert!(patch.target_status().unwrap().is_none());
    }
}
