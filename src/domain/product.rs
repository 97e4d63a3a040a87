use super::money::Price;
use super::record::{Document, Editable, Id, require_text};
use crate::error::{PortalError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An item sold in the ASB store (merchandise, event tickets).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Id,
    pub name: String,
    pub description: String,
    pub price: Price,
    /// Units left to sell.
    pub stock: u32,
    pub category: Option<String>,
    pub image_id: Option<Id>,
    /// Inactive products are hidden from the public catalog.
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Price,
    #[serde(default)]
    pub stock: u32,
    pub category: Option<String>,
    pub image_id: Option<Id>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl Product {
    /// Checks that `quantity` units can be sold directly from the store.
    pub fn ensure_available(&self, quantity: u32) -> Result<()> {
        if !self.active {
            return Err(PortalError::ValidationError(format!(
                "{} is not for sale",
                self.name
            )));
        }
        self.ensure_stock(quantity)
    }

    pub fn ensure_stock(&self, quantity: u32) -> Result<()> {
        if quantity == 0 {
            return Err(PortalError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }
        if quantity > self.stock {
            return Err(PortalError::InsufficientStock {
                product: self.name.clone(),
                available: self.stock,
                requested: quantity,
            });
        }
        Ok(())
    }

    /// Removes sold units from stock, never going below zero.
    ///
    /// Returns how many units could not be covered (oversold).
    pub fn take_stock(&mut self, quantity: u32) -> u32 {
        let shortfall = quantity.saturating_sub(self.stock);
        self.stock = self.stock.saturating_sub(quantity);
        self.updated_at = Utc::now();
        shortfall
    }

    /// Puts units back, e.g. when a paid order is cancelled.
    pub fn restock(&mut self, quantity: u32) {
        self.stock = self.stock.saturating_add(quantity);
        self.updated_at = Utc::now();
    }
}

impl Document for Product {
    const COLLECTION: &'static str = "products";
    const KIND: &'static str = "Product";

    fn id(&self) -> &Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

impl Editable for Product {
    type Draft = ProductDraft;

    fn create(draft: ProductDraft) -> Result<Self> {
        let now = Utc::now();
        Ok(Self {
            id: Id::generate(),
            name: require_text("name", &draft.name)?,
            description: draft.description,
            price: draft.price,
            stock: draft.stock,
            category: draft.category,
            image_id: draft.image_id,
            active: draft.active,
            created_at: now,
            updated_at: now,
        })
    }

    fn revise(&mut self, draft: ProductDraft) -> Result<()> {
        self.name = require_text("name", &draft.name)?;
        self.description = draft.description;
        self.price = draft.price;
        self.stock = draft.stock;
        self.category = draft.category;
        self.image_id = draft.image_id;
        self.active = draft.active;
        self.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    pub(crate) fn hoodie(stock: u32) -> Product {
        Product::create(ProductDraft {
            name: "ASB Hoodie".to_string(),
            description: "Navy, embroidered".to_string(),
            price: Price::new(dec!(35.00)).unwrap(),
            stock,
            category: Some("apparel".to_string()),
            image_id: None,
            active: true,
        })
        .unwrap()
    }

    #[test]
    fn test_create_rejects_blank_name() {
        let draft = ProductDraft {
            name: "  ".to_string(),
            description: String::new(),
            price: Price::ZERO,
            stock: 1,
            category: None,
            image_id: None,
            active: true,
        };
        assert!(matches!(
            Product::create(draft),
            Err(PortalError::ValidationError(_))
        ));
    }

    #[test]
    fn test_ensure_available() {
        let mut product = hoodie(2);
        assert!(product.ensure_available(2).is_ok());
        assert!(matches!(
            product.ensure_available(3),
            Err(PortalError::InsufficientStock {
                available: 2,
                requested: 3,
                ..
            })
        ));
        assert!(matches!(
            product.ensure_available(0),
            Err(PortalError::ValidationError(_))
        ));

        product.active = false;
        assert!(matches!(
            product.ensure_available(1),
            Err(PortalError::ValidationError(_))
        ));
        // Stock checks still apply to hidden ticket products.
        assert!(product.ensure_stock(1).is_ok());
    }

    #[test]
    fn test_take_stock_saturates() {
        let mut product = hoodie(3);
        assert_eq!(product.take_stock(2), 0);
        assert_eq!(product.stock, 1);

        assert_eq!(product.take_stock(4), 3);
        assert_eq!(product.stock, 0);

        product.restock(5);
        assert_eq!(product.stock, 5);
    }

    #[test]
    fn test_revise_keeps_identity() {
        let mut product = hoodie(3);
        let id = product.id.clone();
        let created = product.created_at;

        product
            .revise(ProductDraft {
                name: "ASB Hoodie (2025)".to_string(),
                description: String::new(),
                price: Price::new(dec!(30.00)).unwrap(),
                stock: 10,
                category: None,
                image_id: None,
                active: false,
            })
            .unwrap();

        assert_eq!(product.id, id);
        assert_eq!(product.created_at, created);
        assert_eq!(product.stock, 10);
        assert!(!product.active);
    }
}
