use crate::domain::ports::{CheckoutRequest, PaymentGateway};
use crate::domain::purchase::CheckoutSession;
use crate::error::{PortalError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Hosted checkout over the gateway's REST API.
pub struct HostedCheckoutGateway {
    client: reqwest::Client,
    api_base: String,
    api_key: String,
}

#[derive(Serialize)]
struct LineItem<'a> {
    name: &'a str,
    unit_amount: i64,
    quantity: u32,
}

#[derive(Serialize)]
struct CreateSessionBody<'a> {
    reference_id: &'a str,
    currency: &'a str,
    customer_email: &'a str,
    line_items: [LineItem<'a>; 1],
    success_url: &'a str,
    cancel_url: &'a str,
}

#[derive(Deserialize)]
struct SessionResponse {
    id: String,
    url: String,
}

impl HostedCheckoutGateway {
    pub fn new(api_base: impl Into<String>, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            client,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        })
    }
}

#[async_trait]
impl PaymentGateway for HostedCheckoutGateway {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        let body = CreateSessionBody {
            reference_id: request.reference_id.as_str(),
            currency: &request.currency,
            customer_email: &request.customer_email,
            line_items: [LineItem {
                name: &request.item_name,
                unit_amount: request.unit_amount,
                quantity: request.quantity,
            }],
            success_url: &request.success_url,
            cancel_url: &request.cancel_url,
        };

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            warn!(%status, reference = %request.reference_id, "Checkout session rejected");
            return Err(PortalError::GatewayError(format!(
                "checkout session request failed with {status}: {detail}"
            )));
        }

        let session: SessionResponse = response.json().await?;
        info!(session = %session.id, reference = %request.reference_id, "Checkout session created");

        Ok(CheckoutSession {
            id: session.id,
            url: session.url,
        })
    }
}

/// Local stand-in for the hosted checkout, for development without gateway
/// credentials. Sessions point at the front end's sandbox page.
pub struct SandboxGateway {
    base_url: String,
}

impl SandboxGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn create_checkout(&self, request: &CheckoutRequest) -> Result<CheckoutSession> {
        if request.unit_amount <= 0 {
            return Err(PortalError::GatewayError(
                "amount must be positive".to_string(),
            ));
        }
        let id = format!("cs_sandbox_{}", Uuid::new_v4().simple());
        let url = format!("{}/checkout/sandbox/{id}", self.base_url);
        info!(session = %id, reference = %request.reference_id, "Sandbox checkout session created");
        Ok(CheckoutSession { id, url })
    }
}

/// Verifies `t=<unix seconds>,v1=<hex>` webhook signatures.
///
/// The signed payload is `"<t>.<raw body>"`, keyed with the shared webhook
/// secret. Several `v1` entries may be present while a secret is rotated.
#[derive(Clone)]
pub struct WebhookVerifier {
    secret: Vec<u8>,
    tolerance: chrono::Duration,
}

impl WebhookVerifier {
    pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

    pub fn new(secret: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret.as_ref().to_vec(),
            tolerance: chrono::Duration::seconds(Self::DEFAULT_TOLERANCE_SECS),
        }
    }

    pub fn with_tolerance(mut self, tolerance: chrono::Duration) -> Self {
        self.tolerance = tolerance;
        self
    }

    fn mac(&self, timestamp: i64, body: &[u8]) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.secret)
            .map_err(|_| PortalError::ConfigError("invalid webhook secret".to_string()))?;
        mac.update(timestamp.to_string().as_bytes());
        mac.update(b".");
        mac.update(body);
        Ok(mac)
    }

    /// Header value for `body` signed at `timestamp`.
    pub fn sign(&self, body: &[u8], timestamp: DateTime<Utc>) -> Result<String> {
        let t = timestamp.timestamp();
        let digest = self.mac(t, body)?.finalize().into_bytes();
        Ok(format!("t={t},v1={}", hex::encode(digest)))
    }

    pub fn verify(&self, header: Option<&str>, body: &[u8], now: DateTime<Utc>) -> Result<()> {
        let header = header.ok_or(PortalError::InvalidSignature("missing signature header"))?;

        let mut timestamp = None;
        let mut signatures = Vec::new();
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => {
                    timestamp = Some(
                        value
                            .parse::<i64>()
                            .map_err(|_| PortalError::InvalidSignature("malformed timestamp"))?,
                    );
                }
                Some(("v1", value)) => signatures.push(value),
                _ => {}
            }
        }

        let timestamp = timestamp.ok_or(PortalError::InvalidSignature("missing timestamp"))?;
        if signatures.is_empty() {
            return Err(PortalError::InvalidSignature("missing v1 signature"));
        }

        let age = now.timestamp() - timestamp;
        if age.abs() > self.tolerance.num_seconds() {
            return Err(PortalError::InvalidSignature("timestamp outside tolerance"));
        }

        for signature in signatures {
            let Ok(expected) = hex::decode(signature) else {
                continue;
            };
            // verify_slice compares in constant time
            if self.mac(timestamp, body)?.verify_slice(&expected).is_ok() {
                return Ok(());
            }
        }

        Err(PortalError::InvalidSignature("signature mismatch"))
    }
}
