use super::{
    normalize_code, validate_not_blank, validate_positive_price, validate_reason,
    validate_unique_codes, HasCode,
};
use crate::errors::ServiceError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReturnLineInput {
    #[validate(custom = "validate_not_blank")]
    pub code: String,
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[validate(range(min = 1, message = "'Quantity' must be greater than or equal to 1!"))]
    pub quantity: i32,
    #[validate(custom = "validate_positive_price")]
    pub price: Decimal,
}

impl HasCode for ReturnLineInput {
    fn code(&self) -> &str {
        &self.code
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateReturnRequest {
    /// PO number of the order being returned against
    #[validate(length(min = 1, message = "'Order' is not allowed to be empty!"))]
    pub order: String,
    #[validate(
        length(min = 1, message = "'Returned Products' must contain at least 1 item!"),
        custom = "validate_unique_codes"
    )]
    pub returned_products: Vec<ReturnLineInput>,
    #[serde(default)]
    #[validate(custom = "validate_reason")]
    pub reason: String,
}

impl CreateReturnRequest {
    pub fn into_normalized(self) -> Result<Self, ServiceError> {
        self.validate()?;
        for line in &self.returned_products {
            line.validate()?;
        }
        Ok(Self {
            order: self.order.trim().to_string(),
            returned_products: self
                .returned_products
                .into_iter()
                .map(|mut line| {
                    line.code = normalize_code(&line.code);
                    line.name = normalize_code(&line.name);
                    line
                })
                .collect(),
            reason: self.reason.trim().to_string(),
        })
    }
}
