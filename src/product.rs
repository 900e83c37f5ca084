//! Typed product records crossing the store boundary.
//!
//! Inputs are validated here, before a write reaches the store; the store
//! itself trusts its callers.

use serde::{Deserialize, Serialize};

use crate::error::{InventoryError, Result};

/// One inventory row, as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub supplier: String,
    /// Opaque reference to an externally stored picture
    pub image: Option<String>,
}

/// List-screen projection of a row (no supplier)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductSummary {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i64,
    pub image: Option<String>,
}

/// Payload for inserting a new product.
///
/// `name` and `supplier` are required; the remaining fields default to a
/// price of 0.00, a quantity of 0, and no image.
#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub supplier: String,
    #[serde(default)]
    pub price: f64,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub image: Option<String>,
}

impl NewProduct {
    /// Checks the payload before it is handed to the store.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(InventoryError::InvalidArgument(
                "product name must not be empty".to_string(),
            ));
        }
        if self.supplier.trim().is_empty() {
            return Err(InventoryError::InvalidArgument(
                "product supplier must not be empty".to_string(),
            ));
        }
        if self.price < 0.0 {
            return Err(InventoryError::InvalidArgument(format!(
                "product price must be non-negative, got {}",
                self.price
            )));
        }
        if self.quantity < 0 {
            return Err(InventoryError::InvalidArgument(format!(
                "product quantity must be non-negative, got {}",
                self.quantity
            )));
        }
        Ok(())
    }
}

/// Named-column update payload.
///
/// `None` fields are left untouched; an empty or whitespace image string
/// clears the stored reference.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub price: Option<f64>,
    pub quantity: Option<i64>,
    pub supplier: Option<String>,
    pub image: Option<String>,
}

impl ProductPatch {
    /// True when the patch names no column at all
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.price.is_none()
            && self.quantity.is_none()
            && self.supplier.is_none()
            && self.image.is_none()
    }

    /// Checks the named columns before the patch is handed to the store.
    pub fn validate(&self) -> Result<()> {
        if let Some(name) = &self.name {
            if name.trim().is_empty() {
                return Err(InventoryError::InvalidArgument(
                    "product name must not be empty".to_string(),
                ));
            }
        }
        if let Some(supplier) = &self.supplier {
            if supplier.trim().is_empty() {
                return Err(InventoryError::InvalidArgument(
                    "product supplier must not be empty".to_string(),
                ));
            }
        }
        if let Some(price) = self.price {
            if price < 0.0 {
                return Err(InventoryError::InvalidArgument(format!(
                    "product price must be non-negative, got {price}"
                )));
            }
        }
        if let Some(quantity) = self.quantity {
            if quantity < 0 {
                return Err(InventoryError::InvalidArgument(format!(
                    "product quantity must be non-negative, got {quantity}"
                )));
            }
        }
        Ok(())
    }
}

/// Formats a price with the two-decimal display convention (e.g. "13.99")
pub fn format_price(price: f64) -> String {
    format!("{price:.2}")
}

/// Normalizes an image reference: blank strings become "no image"
pub(crate) fn normalize_image(image: Option<&str>) -> Option<String> {
    image
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_new_product() -> NewProduct {
        NewProduct {
            name: "Jump Rope".to_string(),
            supplier: "Big 5 Sporting Goods".to_string(),
            price: 13.99,
            quantity: 33,
            image: None,
        }
    }

    #[test]
    fn validate_accepts_complete_payload() {
        assert!(valid_new_product().validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_name() {
        let mut product = valid_new_product();
        product.name = "   ".to_string();
        assert!(product.validate().is_err());
    }

    #[test]
    fn validate_rejects_blank_supplier() {
        let mut product = valid_new_product();
        product.supplier = String::new();
        assert!(product.validate().is_err());
    }

    #[test]
    fn validate_rejects_negative_price_and_quantity() {
        let mut product = valid_new_product();
        product.price = -0.01;
        assert!(product.validate().is_err());

        let mut product = valid_new_product();
        product.quantity = -1;
        assert!(product.validate().is_err());
    }

    #[test]
    fn new_product_defaults_from_json() {
        let product: NewProduct =
            serde_json::from_str(r#"{"name":"Rope","supplier":"Big 5"}"#).unwrap();
        assert_eq!(product.price, 0.0);
        assert_eq!(product.quantity, 0);
        assert!(product.image.is_none());
    }

    #[test]
    fn patch_is_empty() {
        assert!(ProductPatch::default().is_empty());
        let patch = ProductPatch {
            quantity: Some(5),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }

    #[test]
    fn patch_validate_checks_named_columns_only() {
        let patch = ProductPatch {
            quantity: Some(5),
            ..Default::default()
        };
        assert!(patch.validate().is_ok());

        let patch = ProductPatch {
            name: Some(String::new()),
            ..Default::default()
        };
        assert!(patch.validate().is_err());

        let patch = ProductPatch {
            price: Some(-1.0),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn price_formatting_shows_two_decimals() {
        assert_eq!(format_price(13.99), "13.99");
        assert_eq!(format_price(0.0), "0.00");
        assert_eq!(format_price(7.5), "7.50");
    }

    #[test]
    fn image_normalization() {
        assert_eq!(normalize_image(None), None);
        assert_eq!(normalize_image(Some("")), None);
        assert_eq!(normalize_image(Some("  ")), None);
        assert_eq!(
            normalize_image(Some("file:///pictures/rope.png")),
            Some("file:///pictures/rope.png".to_string())
        );
    }
}
