//! Product catalog types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use ecom_core::{Price, ProductId};

/// A catalog entry with its current stock level.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub image: String,
    pub price: Price,
    /// Units on hand. Never negative.
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
}

/// Fields an admin supplies when creating or replacing a product.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image: String,
    pub price: Price,
    pub quantity: i32,
}

impl ProductInput {
    /// Maximum product name length.
    pub const MAX_NAME_LENGTH: usize = 255;

    /// Check the fields the type system does not already guarantee.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err("name is required".to_string());
        }
        if name.chars().count() > Self::MAX_NAME_LENGTH {
            return Err(format!(
                "name must be at most {} characters",
                Self::MAX_NAME_LENGTH
            ));
        }
        if self.price > Price::MAX {
            return Err(format!("price must be at most {}", Price::MAX));
        }
        if self.quantity < 0 {
            return Err("quantity cannot be negative".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn input(json: &str) -> ProductInput {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_price_accepts_string_or_number() {
        let a = input(r#"{"name":"Mug","price":"12.50","quantity":3}"#);
        let b = input(r#"{"name":"Mug","price":12.5,"quantity":3}"#);
        assert_eq!(a.price, b.price);
        assert_eq!(a.description, "");
    }

    #[test]
    fn test_negative_price_rejected_at_parse() {
        let result =
            serde_json::from_str::<ProductInput>(r#"{"name":"Mug","price":"-1","quantity":3}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_validate() {
        assert!(input(r#"{"name":"Mug","price":"1","quantity":0}"#).validate().is_ok());
        assert_eq!(
            input(r#"{"name":"  ","price":"1","quantity":0}"#).validate(),
            Err("name is required".to_string())
        );
        assert_eq!(
            input(r#"{"name":"Mug","price":"1","quantity":-2}"#).validate(),
            Err("quantity cannot be negative".to_string())
        );
    }

    #[test]
    fn test_validate_price_fits_column() {
        assert!(
            input(r#"{"name":"Mug","price":"9999999999.99","quantity":1}"#)
                .validate()
                .is_ok()
        );
        assert_eq!(
            input(r#"{"name":"Mug","price":"100000000000.00","quantity":1}"#).validate(),
            Err("price must be at most 9999999999.99".to_string())
        );
    }
}
