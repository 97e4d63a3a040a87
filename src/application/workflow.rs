use super::notifications;
use crate::domain::event::Event;
use crate::domain::ports::{CheckoutRequest, Email, Mailer, PaymentGateway, RepositoryRef, Stores};
use crate::domain::product::Product;
use crate::domain::purchase::{Buyer, Purchase, PurchaseStatus};
use crate::domain::record::{Document, Id};
use crate::domain::submission::{FormSubmission, NewSubmission};
use crate::domain::webhook::{PaymentEvent, PaymentEventData, ProcessedWebhook, Settlement};
use crate::error::{PortalError, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, instrument, warn};

/// Settings the workflow needs beyond its ports.
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    /// Front end origin, used for checkout return URLs.
    pub public_url: String,
    /// ISO currency code sent to the gateway.
    pub currency: String,
    /// Who hears about new submissions.
    pub admin_email: Option<String>,
}

/// Body of a direct store checkout.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutOrder {
    pub product_id: Id,
    #[serde(default = "one")]
    pub quantity: u32,
    pub buyer_name: String,
    pub buyer_email: String,
}

fn one() -> u32 {
    1
}

/// Result of approving a submission.
#[derive(Debug, Clone, Serialize)]
pub struct Approval {
    pub submission: FormSubmission,
    /// Ticket purchase awaiting payment, for paid events.
    pub purchase: Option<Purchase>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReconcileOutcome {
    /// The event id was handled before.
    Duplicate,
    /// Nothing to do (unknown kind, unknown purchase, already settled).
    Ignored,
    Paid { purchase_id: Id },
    Cancelled { purchase_id: Id },
}

impl ReconcileOutcome {
    fn purchase_id(&self) -> Option<Id> {
        match self {
            ReconcileOutcome::Paid { purchase_id } | ReconcileOutcome::Cancelled { purchase_id } => {
                Some(purchase_id.clone())
            }
            _ => None,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            ReconcileOutcome::Duplicate => "duplicate",
            ReconcileOutcome::Ignored => "ignored",
            ReconcileOutcome::Paid { .. } => "paid",
            ReconcileOutcome::Cancelled { .. } => "cancelled",
        }
    }
}

/// Drives form submissions and purchases through their lifecycles.
///
/// Submission → review → hosted checkout → webhook reconciliation → stock
/// decrement → email. Reviews and every step that changes a purchase or
/// stock level run under `settle_lock`, so two admin actions, or a webhook
/// and an admin action, never interleave their read-modify-write cycles.
pub struct ApprovalWorkflow {
    stores: Stores,
    gateway: Arc<dyn PaymentGateway>,
    mailer: Arc<dyn Mailer>,
    settings: WorkflowSettings,
    settle_lock: Mutex<()>,
}

impl ApprovalWorkflow {
    pub fn new(
        stores: Stores,
        gateway: Arc<dyn PaymentGateway>,
        mailer: Arc<dyn Mailer>,
        settings: WorkflowSettings,
    ) -> Self {
        Self {
            stores,
            gateway,
            mailer,
            settings,
            settle_lock: Mutex::new(()),
        }
    }

    /// Records a new pending submission for a restricted event.
    #[instrument(skip_all, fields(event = %draft.event_id))]
    pub async fn submit(&self, draft: NewSubmission) -> Result<FormSubmission> {
        let event = require(&self.stores.events, &draft.event_id).await?;
        if !event.requires_form {
            return Err(PortalError::ValidationError(format!(
                "{} does not take form submissions",
                event.title
            )));
        }
        for document in &draft.documents {
            if !self.stores.files.exists(document).await? {
                return Err(PortalError::not_found("File", document));
            }
        }

        let submission = FormSubmission::new(draft)?;
        self.stores.submissions.store(submission.clone()).await?;
        info!(submission = %submission.id, "Form submission received");

        self.notify(notifications::submission_received(&submission, &event))
            .await;
        if let Some(admin) = &self.settings.admin_email {
            self.notify(notifications::review_requested(admin, &submission, &event))
                .await;
        }

        Ok(submission)
    }

    /// Approves a pending submission and, for paid events, opens the
    /// ticket checkout.
    #[instrument(skip(self, note))]
    pub async fn approve(&self, id: &Id, note: Option<String>) -> Result<Approval> {
        let _guard = self.settle_lock.lock().await;

        let mut submission = require(&self.stores.submissions, id).await?;
        // Validate the transition before any side effect.
        submission.approve(note)?;

        let event = require(&self.stores.events, &submission.event_id).await?;
        let ticket = match &event.ticket_product_id {
            Some(product_id) => Some(require(&self.stores.products, product_id).await?),
            None => None,
        };

        let purchase = match ticket {
            Some(product) if !product.price.is_free() => {
                product.ensure_stock(1)?;
                let buyer = Buyer::new(&submission.student_name, &submission.student_email)?;
                let mut purchase = Purchase::new(&product, 1, buyer, Some(submission.id.clone()))?;
                self.open_checkout(&product, &mut purchase).await?;
                self.stores.purchases.store(purchase.clone()).await?;
                submission.purchase_id = Some(purchase.id.clone());
                Some(purchase)
            }
            _ => None,
        };

        self.stores.submissions.store(submission.clone()).await?;
        info!(
            submission = %submission.id,
            purchase = ?purchase.as_ref().map(|p| &p.id),
            "Submission approved"
        );

        self.notify(notifications::submission_approved(
            &submission,
            &event,
            purchase.as_ref(),
        ))
        .await;

        Ok(Approval {
            submission,
            purchase,
        })
    }

    #[instrument(skip(self, reason))]
    pub async fn reject(&self, id: &Id, reason: Option<String>) -> Result<FormSubmission> {
        let _guard = self.settle_lock.lock().await;

        let mut submission = require(&self.stores.submissions, id).await?;
        submission.reject(reason)?;
        let event = require(&self.stores.events, &submission.event_id).await?;

        self.stores.submissions.store(submission.clone()).await?;
        info!(submission = %submission.id, "Submission rejected");

        self.notify(notifications::submission_rejected(&submission, &event))
            .await;
        Ok(submission)
    }

    pub async fn delete_submission(&self, id: &Id) -> Result<()> {
        if !self.stores.submissions.delete(id).await? {
            return Err(PortalError::not_found(FormSubmission::KIND, id));
        }
        info!(submission = %id, "Submission deleted");
        Ok(())
    }

    /// Opens a hosted checkout for a regular store product.
    #[instrument(skip_all, fields(product = %order.product_id, quantity = order.quantity))]
    pub async fn checkout(&self, order: CheckoutOrder) -> Result<Purchase> {
        let buyer = Buyer::new(&order.buyer_name, &order.buyer_email)?;
        let product = require(&self.stores.products, &order.product_id).await?;
        product.ensure_available(order.quantity)?;

        if product.price.is_free() {
            return Err(PortalError::ValidationError(format!(
                "{} is free and does not need a checkout",
                product.name
            )));
        }
        if let Some(event) = self.restricting_event(&product.id).await? {
            return Err(PortalError::ValidationError(format!(
                "Tickets for {} require an approved form submission",
                event.title
            )));
        }

        let mut purchase = Purchase::new(&product, order.quantity, buyer, None)?;
        self.open_checkout(&product, &mut purchase).await?;
        self.stores.purchases.store(purchase.clone()).await?;
        info!(purchase = %purchase.id, "Checkout opened");

        Ok(purchase)
    }

    /// Applies a verified gateway callback.
    ///
    /// Deliveries are idempotent: an event id seen before is acknowledged
    /// without touching purchases or stock.
    #[instrument(skip_all, fields(event = %event.id, kind = ?event.kind))]
    pub async fn reconcile(&self, event: PaymentEvent) -> Result<ReconcileOutcome> {
        let _guard = self.settle_lock.lock().await;

        let event_id = Id::from(event.id.as_str());
        if self.stores.webhooks.exists(&event_id).await? {
            info!("Duplicate webhook delivery ignored");
            return Ok(ReconcileOutcome::Duplicate);
        }

        let outcome = match event.kind.settlement() {
            None => {
                info!("Webhook kind not handled");
                ReconcileOutcome::Ignored
            }
            Some(settlement) => match self.find_purchase(&event.data).await? {
                None => {
                    warn!(data = ?event.data, "Webhook does not match any purchase");
                    ReconcileOutcome::Ignored
                }
                Some(purchase) => {
                    self.settle(purchase, settlement, event.data.payment_id.clone())
                        .await?
                }
            },
        };

        self.stores
            .webhooks
            .store(ProcessedWebhook::new(
                &event,
                outcome.purchase_id(),
                outcome.label(),
            ))
            .await?;

        Ok(outcome)
    }

    /// Marks a paid purchase as handed over.
    #[instrument(skip(self))]
    pub async fn complete_purchase(&self, id: &Id) -> Result<Purchase> {
        let _guard = self.settle_lock.lock().await;

        let mut purchase = require(&self.stores.purchases, id).await?;
        purchase.complete()?;
        self.stores.purchases.store(purchase.clone()).await?;
        info!(purchase = %purchase.id, "Purchase completed");

        self.notify(notifications::order_ready(&purchase)).await;
        Ok(purchase)
    }

    /// Cancels a pending or paid purchase. Stock taken by a paid purchase
    /// goes back on the shelf.
    #[instrument(skip(self))]
    pub async fn cancel_purchase(&self, id: &Id) -> Result<Purchase> {
        let _guard = self.settle_lock.lock().await;

        let mut purchase = require(&self.stores.purchases, id).await?;
        let was_paid = purchase.status == PurchaseStatus::Paid;
        purchase.cancel()?;
        self.stores.purchases.store(purchase.clone()).await?;

        if was_paid {
            match self.stores.products.get(&purchase.product_id).await? {
                Some(mut product) => {
                    product.restock(purchase.quantity);
                    self.stores.products.store(product).await?;
                }
                None => warn!(product = %purchase.product_id, "Cancelled purchase refers to a deleted product"),
            }
        }
        info!(purchase = %purchase.id, was_paid, "Purchase cancelled");

        self.notify(notifications::order_cancelled(&purchase)).await;
        Ok(purchase)
    }

    async fn settle(
        &self,
        mut purchase: Purchase,
        settlement: Settlement,
        payment_reference: Option<String>,
    ) -> Result<ReconcileOutcome> {
        if purchase.status != PurchaseStatus::Pending {
            info!(purchase = %purchase.id, status = %purchase.status, "Purchase already settled");
            return Ok(ReconcileOutcome::Ignored);
        }

        match settlement {
            Settlement::Paid => {
                purchase.mark_paid(payment_reference)?;

                // Stock first: if either write fails the purchase is still
                // pending and a redelivery settles it again.
                match self.stores.products.get(&purchase.product_id).await? {
                    Some(mut product) => {
                        let shortfall = product.take_stock(purchase.quantity);
                        if shortfall > 0 {
                            warn!(product = %product.id, shortfall, "Product oversold");
                        }
                        self.stores.products.store(product).await?;
                    }
                    None => warn!(product = %purchase.product_id, "Paid purchase refers to a deleted product"),
                }
                self.stores.purchases.store(purchase.clone()).await?;
                info!(purchase = %purchase.id, "Payment confirmed");

                self.notify(notifications::payment_received(&purchase)).await;
                Ok(ReconcileOutcome::Paid {
                    purchase_id: purchase.id,
                })
            }
            Settlement::Abandoned => {
                purchase.cancel()?;
                self.stores.purchases.store(purchase.clone()).await?;
                info!(purchase = %purchase.id, "Checkout abandoned");

                self.notify(notifications::payment_abandoned(&purchase)).await;
                Ok(ReconcileOutcome::Cancelled {
                    purchase_id: purchase.id,
                })
            }
        }
    }

    async fn find_purchase(&self, data: &PaymentEventData) -> Result<Option<Purchase>> {
        if let Some(reference) = &data.reference_id
            && let Some(purchase) = self.stores.purchases.get(reference).await?
        {
            return Ok(Some(purchase));
        }

        let Some(session_id) = &data.checkout_session_id else {
            return Ok(None);
        };
        Ok(self
            .stores
            .purchases
            .get_all()
            .await?
            .into_iter()
            .find(|p| p.checkout.as_ref().is_some_and(|c| &c.id == session_id)))
    }

    async fn restricting_event(&self, product_id: &Id) -> Result<Option<Event>> {
        Ok(self
            .stores
            .events
            .get_all()
            .await?
            .into_iter()
            .find(|event| event.restricts(product_id)))
    }

    async fn open_checkout(&self, product: &Product, purchase: &mut Purchase) -> Result<()> {
        let base = self.settings.public_url.trim_end_matches('/');
        let request = CheckoutRequest {
            reference_id: purchase.id.clone(),
            item_name: product.name.clone(),
            unit_amount: purchase.unit_price.to_minor_units()?,
            quantity: purchase.quantity,
            currency: self.settings.currency.clone(),
            customer_email: purchase.buyer.email.clone(),
            success_url: format!("{base}/checkout/success?purchase={}", purchase.id),
            cancel_url: format!("{base}/checkout/cancelled?purchase={}", purchase.id),
        };

        let session = self.gateway.create_checkout(&request).await?;
        purchase.attach_checkout(session);
        Ok(())
    }

    // Email is a side effect: a failed delivery is logged, never fatal.
    async fn notify(&self, email: Email) {
        if let Err(e) = self.mailer.send(&email).await {
            warn!(error = %e, to = %email.to, subject = %email.subject, "Failed to send notification");
        }
    }
}

async fn require<T: Document>(repository: &RepositoryRef<T>, id: &Id) -> Result<T> {
    repository
        .get(id)
        .await?
        .ok_or_else(|| PortalError::not_found(T::KIND, id))
}
