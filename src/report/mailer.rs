// src/report/mailer.rs
use async_trait::async_trait;
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info, Instrument, Span};

use super::render::ReportRenderer;
use crate::types::AnalysisResult;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("invalid email address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },
    #[error("failed to build message: {0}")]
    Build(String),
    #[error("SMTP delivery failed: {0}")]
    Transport(String),
}

/// A finished multi-part report ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMessage {
    pub to: String,
    pub subject: String,
    pub text_body: String,
    pub html_body: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &ReportMessage) -> Result<(), ReportError>;
}

#[derive(Debug, Clone)]
pub struct SmtpSettings {
    pub server: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub timeout: Duration,
}

/// STARTTLS + login SMTP delivery. The username doubles as the sender.
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(settings: &SmtpSettings) -> Result<Self, ReportError> {
        let from = parse_mailbox(&settings.username)?;
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&settings.server)
            .map_err(|e| ReportError::Transport(e.to_string()))?
            .port(settings.port)
            .credentials(Credentials::new(
                settings.username.clone(),
                settings.password.clone(),
            ))
            .timeout(Some(settings.timeout))
            .build();

        Ok(Self { transport, from })
    }

    /// Connect and authenticate without sending anything.
    pub async fn test_connection(&self) -> Result<bool, ReportError> {
        self.transport
            .test_connection()
            .await
            .map_err(|e| ReportError::Transport(e.to_string()))
    }

    fn build(&self, message: &ReportMessage) -> Result<Message, ReportError> {
        Message::builder()
            .from(self.from.clone())
            .to(parse_mailbox(&message.to)?)
            .subject(message.subject.clone())
            .multipart(MultiPart::alternative_plain_html(
                message.text_body.clone(),
                message.html_body.clone(),
            ))
            .map_err(|e| ReportError::Build(e.to_string()))
    }
}

#[async_trait]
impl MailTransport for SmtpMailer {
    async fn send(&self, message: &ReportMessage) -> Result<(), ReportError> {
        let email = self.build(message)?;
        self.transport
            .send(email)
            .await
            .map_err(|e| ReportError::Transport(e.to_string()))?;
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, ReportError> {
    address
        .parse::<Mailbox>()
        .map_err(|e| ReportError::InvalidAddress {
            address: address.to_string(),
            reason: e.to_string(),
        })
}

/// Renders a report and hands it to the transport. Delivery problems are
/// reported as `false`, never retried.
pub struct ReportSender {
    transport: Arc<dyn MailTransport>,
    renderer: ReportRenderer,
    span: Span,
}

impl ReportSender {
    pub fn new(transport: Arc<dyn MailTransport>, renderer: ReportRenderer, span: Span) -> Self {
        Self {
            transport,
            renderer,
            span,
        }
    }

    pub async fn send_job_report(
        &self,
        to: &str,
        analyses: &[AnalysisResult],
        total_jobs: usize,
    ) -> bool {
        async {
            info!("Preparing email report for {}", to);

            let rendered = self.renderer.render(analyses, total_jobs);
            let message = ReportMessage {
                to: to.to_string(),
                subject: rendered.subject,
                text_body: rendered.text,
                html_body: rendered.html,
            };

            match self.transport.send(&message).await {
                Ok(()) => {
                    info!("Email sent successfully to {}", to);
                    true
                }
                Err(e) => {
                    error!("Error sending email: {}", e);
                    false
                }
            }
        }
        .instrument(self.span.clone())
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MockMailTransport;
    use chrono::NaiveDate;

    fn sender(transport: Arc<MockMailTransport>) -> ReportSender {
        let renderer = ReportRenderer::new(NaiveDate::from_ymd_opt(2026, 10, 16).unwrap());
        ReportSender::new(transport, renderer, Span::none())
    }

    #[tokio::test]
    async fn test_empty_report_is_still_sent() {
        let transport = Arc::new(MockMailTransport::new());
        let sent = sender(transport.clone())
            .send_job_report("me@example.com", &[], 0)
            .await;

        assert!(sent);
        let messages = transport.messages();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0].to, "me@example.com");
        assert_eq!(messages[0].subject, "Daily Job Report - 2026-10-16");
        assert!(messages[0].text_body.contains("No suitable jobs found today"));
        assert!(messages[0].html_body.contains("No suitable jobs found today"));
    }

    #[tokio::test]
    async fn test_transport_failure_is_false() {
        let transport = Arc::new(MockMailTransport::failing("535 authentication failed"));
        let analyses = vec![AnalysisResult::new("t", "u", 90, vec![], vec![], "r")];
        let sent = sender(transport.clone())
            .send_job_report("me@example.com", &analyses, 3)
            .await;

        assert!(!sent);
        assert_eq!(transport.attempts(), 1);
    }

    #[tokio::test]
    async fn test_smtp_message_is_multipart() {
        let mailer = SmtpMailer::new(&SmtpSettings {
            server: "smtp.example.com".to_string(),
            port: 587,
            username: "bot@example.com".to_string(),
            password: "secret".to_string(),
            timeout: Duration::from_secs(5),
        })
        .unwrap();

        let message = ReportMessage {
            to: "me@example.com".to_string(),
            subject: "Daily Job Report - 2026-10-16".to_string(),
            text_body: "plain".to_string(),
            html_body: "<p>rich</p>".to_string(),
        };
        let raw = String::from_utf8(mailer.build(&message).unwrap().formatted()).unwrap();

        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("text/plain"));
        assert!(raw.contains("text/html"));
        assert!(raw.contains("Subject: Daily Job Report - 2026-10-16"));
    }

    #[test]
    fn test_bad_recipient_is_rejected() {
        assert!(matches!(
            parse_mailbox("not an address"),
            Err(ReportError::InvalidAddress { .. })
        ));
    }
}
