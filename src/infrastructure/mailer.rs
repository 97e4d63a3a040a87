use crate::domain::ports::{Email, Mailer};
use crate::error::{PortalError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

/// Delivers mail through a transactional email HTTP API.
pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    from: String,
}

#[derive(Serialize)]
struct SendBody<'a> {
    from: &'a str,
    to: [&'a str; 1],
    subject: &'a str,
    text: &'a str,
}

impl HttpMailer {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
        })
    }
}

#[async_trait]
impl Mailer for HttpMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&SendBody {
                from: &self.from,
                to: [&email.to],
                subject: &email.subject,
                text: &email.text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(PortalError::MailError(format!(
                "mail API answered {status} for {}",
                email.to
            )));
        }

        info!(to = %email.to, subject = %email.subject, "Email sent");
        Ok(())
    }
}

/// Writes emails to the log instead of sending them.
#[derive(Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, email: &Email) -> Result<()> {
        info!(to = %email.to, subject = %email.subject, body = %email.text, "Email (not delivered)");
        Ok(())
    }
}
