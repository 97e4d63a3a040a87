use super::money::Price;
use super::product::Product;
use super::record::{Document, Id, require_email, require_text};
use crate::error::{PortalError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseStatus {
    /// Checkout session opened, payment not confirmed yet.
    #[default]
    Pending,
    /// Gateway confirmed the payment.
    Paid,
    /// Handed over to the buyer.
    Completed,
    Cancelled,
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PurchaseStatus::Pending => "pending",
            PurchaseStatus::Paid => "paid",
            PurchaseStatus::Completed => "completed",
            PurchaseStatus::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Buyer {
    pub name: String,
    pub email: String,
}

impl Buyer {
    pub fn new(name: &str, email: &str) -> Result<Self> {
        Ok(Self {
            name: require_text("buyer_name", name)?,
            email: require_email("buyer_email", email)?,
        })
    }
}

/// Hosted checkout page opened for a purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Purchase {
    pub id: Id,
    pub product_id: Id,
    pub product_name: String,
    /// Set when the purchase is the ticket of an approved submission.
    pub submission_id: Option<Id>,
    pub quantity: u32,
    pub unit_price: Price,
    pub total: Price,
    pub buyer: Buyer,
    pub status: PurchaseStatus,
    pub checkout: Option<CheckoutSession>,
    /// Gateway payment id, known once paid.
    pub payment_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    pub fn new(
        product: &Product,
        quantity: u32,
        buyer: Buyer,
        submission_id: Option<Id>,
    ) -> Result<Self> {
        if quantity == 0 {
            return Err(PortalError::ValidationError(
                "Quantity must be at least 1".to_string(),
            ));
        }
        let now = Utc::now();
        Ok(Self {
            id: Id::generate(),
            product_id: product.id.clone(),
            product_name: product.name.clone(),
            submission_id,
            quantity,
            unit_price: product.price,
            total: product.price.times(quantity)?,
            buyer,
            status: PurchaseStatus::Pending,
            checkout: None,
            payment_reference: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn attach_checkout(&mut self, session: CheckoutSession) {
        self.checkout = Some(session);
        self.updated_at = Utc::now();
    }

    pub fn checkout_url(&self) -> Option<&str> {
        self.checkout.as_ref().map(|c| c.url.as_str())
    }

    pub fn mark_paid(&mut self, payment_reference: Option<String>) -> Result<()> {
        self.transition(&[PurchaseStatus::Pending], PurchaseStatus::Paid)?;
        self.payment_reference = payment_reference;
        Ok(())
    }

    pub fn complete(&mut self) -> Result<()> {
        self.transition(&[PurchaseStatus::Paid], PurchaseStatus::Completed)
    }

    pub fn cancel(&mut self) -> Result<()> {
        self.transition(
            &[PurchaseStatus::Pending, PurchaseStatus::Paid],
            PurchaseStatus::Cancelled,
        )
    }

    fn transition(&mut self, allowed_from: &[PurchaseStatus], to: PurchaseStatus) -> Result<()> {
        if !allowed_from.contains(&self.status) {
            return Err(PortalError::InvalidTransition {
                kind: Self::KIND,
                from: self.status.to_string(),
                to: to.to_string(),
            });
        }
        self.status = to;
        self.updated_at = Utc::now();
        Ok(())
    }
}

impl Document for Purchase {
    const COLLECTION: &'static str = "purchases";
    const KIND: &'static str = "Purchase";

    fn id(&self) -> &Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::product::tests::hoodie;
    use rust_decimal_macros::dec;

    fn purchase(quantity: u32) -> Purchase {
        let buyer = Buyer::new("Sam Ortiz", "sam@students.example.org").unwrap();
        Purchase::new(&hoodie(10), quantity, buyer, None).unwrap()
    }

    #[test]
    fn test_new_purchase_totals() {
        let purchase = purchase(3);
        assert_eq!(purchase.status, PurchaseStatus::Pending);
        assert_eq!(purchase.unit_price, Price::new(dec!(35.00)).unwrap());
        assert_eq!(purchase.total, Price::new(dec!(105.00)).unwrap());
        assert_eq!(purchase.product_name, "ASB Hoodie");
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let buyer = Buyer::new("Sam Ortiz", "sam@students.example.org").unwrap();
        assert!(matches!(
            Purchase::new(&hoodie(10), 0, buyer, None),
            Err(PortalError::ValidationError(_))
        ));
    }

    #[test]
    fn test_lifecycle() {
        let mut purchase = purchase(1);
        purchase.mark_paid(Some("pay_123".to_string())).unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Paid);
        assert_eq!(purchase.payment_reference.as_deref(), Some("pay_123"));

        purchase.complete().unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Completed);

        // Completed purchases are final.
        assert!(matches!(
            purchase.cancel(),
            Err(PortalError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_cannot_complete_unpaid() {
        let mut purchase = purchase(1);
        assert!(matches!(
            purchase.complete(),
            Err(PortalError::InvalidTransition { .. })
        ));
        purchase.cancel().unwrap();
        assert!(matches!(
            purchase.mark_paid(None),
            Err(PortalError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn test_attach_checkout() {
        let mut purchase = purchase(1);
        assert!(purchase.checkout_url().is_none());
        purchase.attach_checkout(CheckoutSession {
            id: "cs_1".to_string(),
            url: "https://pay.example.com/cs_1".to_string(),
        });
        assert_eq!(purchase.checkout_url(), Some("https://pay.example.com/cs_1"));
    }
}
