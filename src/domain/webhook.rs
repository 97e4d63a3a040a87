use super::record::{Document, Id};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Callback kinds sent by the payment gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentEventKind {
    #[serde(rename = "checkout.completed")]
    CheckoutCompleted,
    #[serde(rename = "payment.succeeded")]
    PaymentSucceeded,
    #[serde(rename = "checkout.expired")]
    CheckoutExpired,
    #[serde(rename = "payment.failed")]
    PaymentFailed,
    #[serde(other)]
    Unknown,
}

/// What a callback means for the purchase it refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Paid,
    Abandoned,
}

impl PaymentEventKind {
    pub fn settlement(&self) -> Option<Settlement> {
        match self {
            PaymentEventKind::CheckoutCompleted | PaymentEventKind::PaymentSucceeded => {
                Some(Settlement::Paid)
            }
            PaymentEventKind::CheckoutExpired | PaymentEventKind::PaymentFailed => {
                Some(Settlement::Abandoned)
            }
            PaymentEventKind::Unknown => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PaymentEventData {
    pub checkout_session_id: Option<String>,
    /// Our purchase id, echoed back by the gateway as the reference id.
    pub reference_id: Option<Id>,
    pub payment_id: Option<String>,
}

/// A verified webhook body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: PaymentEventKind,
    #[serde(default)]
    pub data: PaymentEventData,
}

/// Ledger row for a webhook delivery that was already handled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessedWebhook {
    pub id: Id,
    pub kind: PaymentEventKind,
    pub purchase_id: Option<Id>,
    pub outcome: String,
    pub created_at: DateTime<Utc>,
}

impl ProcessedWebhook {
    pub fn new(event: &PaymentEvent, purchase_id: Option<Id>, outcome: impl Into<String>) -> Self {
        Self {
            id: Id::from(event.id.as_str()),
            kind: event.kind,
            purchase_id,
            outcome: outcome.into(),
            created_at: Utc::now(),
        }
    }
}

impl Document for ProcessedWebhook {
    const COLLECTION: &'static str = "webhooks";
    const KIND: &'static str = "Webhook";

    fn id(&self) -> &Id {
        &self.id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}
