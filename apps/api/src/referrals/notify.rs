//! Outbound mail for referral events.
//!
//! Delivery is best effort: callers hand a [`Mail`] to [`dispatch`], which
//! sends it on a background task and only logs failures.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::referral::ReferralRequest;

#[derive(Debug, Error)]
pub enum MailError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Mail relay returned status {0}")]
    Status(u16),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, mail: &Mail) -> Result<(), MailError>;
}

/// Posts mails as JSON to an HTTP relay (`MAIL_WEBHOOK_URL`).
pub struct WebhookMailer {
    http: Client,
    url: String,
    from: String,
}

#[derive(Serialize)]
struct RelayPayload<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

impl WebhookMailer {
    pub fn new(url: String, from: String) -> Self {
        Self {
            http: Client::new(),
            url,
            from,
        }
    }
}

#[async_trait]
impl Mailer for WebhookMailer {
    async fn send(&self, mail: &Mail) -> Result<(), MailError> {
        let response = self
            .http
            .post(&self.url)
            .json(&RelayPayload {
                from: &self.from,
                to: &mail.to,
                subject: &mail.subject,
                text: &mail.body,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MailError::Status(status.as_u16()));
        }
        Ok(())
    }
}

/// Used when no relay is configured: the mail is only logged.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, mail: &Mail) -> Result<(), MailError> {
        info!(to = %mail.to, subject = %mail.subject, "mail relay not configured; mail not sent");
        Ok(())
    }
}

pub fn referral_requested_mail(referral: &ReferralRequest) -> Mail {
    Mail {
        to: referral.to_email.clone(),
        subject: "New referral request".to_string(),
        body: format!(
            "A student has asked you for a referral.\n\n\"{}\"\n\nReferral id: {}\nSign in to accept or reject it.",
            referral.message, referral.id
        ),
    }
}

pub fn referral_responded_mail(referral: &ReferralRequest, student_email: &str) -> Mail {
    Mail {
        to: student_email.to_string(),
        subject: format!("Your referral request was {}", referral.status.as_str()),
        body: format!(
            "Your referral request to {} has been {}.\n\nReferral id: {}",
            referral.to_email,
            referral.status.as_str(),
            referral.id
        ),
    }
}

/// Fire-and-forget send. Never blocks or fails the caller.
pub fn dispatch(mailer: Arc<dyn Mailer>, mail: Mail) {
    tokio::spawn(async move {
        if let Err(e) = mailer.send(&mail).await {
            warn!(to = %mail.to, "referral notification failed: {e}");
        }
    });
}
