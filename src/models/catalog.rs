use super::{normalize_code, normalize_optional, validate_not_blank, validate_positive_cost, validate_positive_price};
use crate::errors::ServiceError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(custom = "validate_not_blank")]
    pub code: String,
    #[validate(custom = "validate_not_blank")]
    pub name: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[validate(custom = "validate_positive_price")]
    pub price: Decimal,
    #[validate(custom = "validate_positive_cost")]
    pub cost: Decimal,
    #[serde(default)]
    #[validate(range(min = 0, message = "'Quantity' must be greater than or equal to 0!"))]
    pub quantity: i32,
}

impl CreateProductRequest {
    pub fn into_normalized(self) -> Result<Self, ServiceError> {
        self.validate()?;
        Ok(Self {
            code: normalize_code(&self.code),
            name: normalize_code(&self.name),
            category: normalize_optional(self.category),
            unit: normalize_optional(self.unit),
            ..self
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RestockProductRequest {
    #[validate(range(min = 0, message = "'Quantity' must be greater than or equal to 0!"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    #[validate(length(min = 1, message = "'First Name' is not allowed to be empty!"))]
    pub first_name: String,
    #[validate(length(min = 1, message = "'Last Name' is not allowed to be empty!"))]
    pub last_name: String,
    #[serde(default)]
    #[validate(email(message = "'Email' must be a valid email!"))]
    pub email: Option<String>,
}

impl CreateCustomerRequest {
    pub fn into_normalized(self) -> Result<Self, ServiceError> {
        let normalized = Self {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            email: normalize_optional(self.email),
        };
        normalized.validate()?;
        Ok(normalized)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlacklistCustomerRequest {
    pub is_blacklisted: bool,
}
