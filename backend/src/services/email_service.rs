//! Transactional email over the configured SMTP relay.
//!
//! Sending is best effort: callers go through [`EmailService::deliver`], which
//! logs failures and missing configuration instead of failing the request.

use crate::config::{Config, EmailConfig};
use crate::errors::{ServiceError, ServiceResult};
use lettre::message::{Mailbox, MultiPart, SinglePart, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::str::FromStr;
use std::time::Duration;

const SMTP_TIMEOUT: Duration = Duration::from_secs(15);

/// One rendered message, ready to send.
#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
    pub text: String,
}

pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    config: EmailConfig,
}

impl EmailService {
    /// Creates a new EmailService instance
    pub fn new(config: EmailConfig) -> ServiceResult<Self> {
        let creds = Credentials::new(config.smtp_username.clone(), config.smtp_password.clone());

        // 465 is implicit TLS, anything else negotiates STARTTLS
        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(|e| ServiceError::validation(format!("Invalid SMTP host: {e}")))?;

        let mailer = builder
            .port(config.smtp_port)
            .credentials(creds)
            .timeout(Some(SMTP_TIMEOUT))
            .build();

        Ok(Self { mailer, config })
    }

    /// Builds the service when SMTP credentials are configured.
    pub fn from_config(config: &Config) -> Option<Self> {
        match config.email_config() {
            Some(email_config) => match EmailService::new(email_config) {
                Ok(service) => {
                    tracing::info!("Email service initialized successfully");
                    Some(service)
                }
                Err(e) => {
                    tracing::warn!(
                        "Failed to initialize email service: {}. Email notifications will be disabled.",
                        e
                    );
                    None
                }
            },
            None => {
                tracing::warn!("SMTP credentials not configured. Email notifications will be disabled.");
                None
            }
        }
    }

    /// Sends `email` through `service` if there is one, logging the outcome.
    pub async fn deliver(service: Option<&EmailService>, email: OutgoingEmail) {
        let Some(service) = service else {
            tracing::warn!(
                "Email service not configured. '{}' not sent to {}",
                email.subject,
                email.to
            );
            return;
        };

        match service.send_email(&email).await {
            Ok(()) => tracing::info!("Email '{}' sent to {}", email.subject, email.to),
            Err(e) => tracing::error!("Failed to send '{}' to {}: {}", email.subject, email.to, e),
        }
    }

    /// Sends a generic email
    pub async fn send_email(&self, email: &OutgoingEmail) -> ServiceResult<()> {
        let from_mailbox = Mailbox::from_str(&format!(
            "{} <{}>",
            self.config.from_name, self.config.from_email
        ))
        .map_err(|e| ServiceError::validation(format!("Invalid from email: {e}")))?;

        let to_mailbox = Mailbox::from_str(&email.to)
            .map_err(|e| ServiceError::validation(format!("Invalid recipient email: {e}")))?;

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )
            .map_err(|e| ServiceError::internal_error(format!("Failed to build email: {e}")))?;

        self.mailer
            .send(message)
            .await
            .map_err(|e| ServiceError::internal_error(format!("Failed to send email: {e}")))?;

        Ok(())
    }
}

/// Sign-in link for a returning client.
pub fn magic_link_email(to: &str, link: &str, expire_minutes: i64) -> OutgoingEmail {
    let body = format!(
        "Click the button below to access your client area. This link expires in {expire_minutes} minutes and can only be used once."
    );
    OutgoingEmail {
        to: to.to_string(),
        subject: "Sign in to your client area".to_string(),
        html: render_html("Sign in", &body, "Sign in", link),
        text: render_text(&body, link),
    }
}

/// First sign-in link, sent when the account was just created.
pub fn welcome_email(to: &str, link: &str, expire_minutes: i64) -> OutgoingEmail {
    let body = format!(
        "Welcome! Your client area is ready. Use the button below to sign in for the first time. The link expires in {expire_minutes} minutes."
    );
    OutgoingEmail {
        to: to.to_string(),
        subject: "Welcome to your client area".to_string(),
        html: render_html("Welcome", &body, "Open my client area", link),
        text: render_text(&body, link),
    }
}

pub fn reset_password_email(to: &str, link: &str, expire_minutes: i64) -> OutgoingEmail {
    let body = format!(
        "A password reset was requested for your account. The link below expires in {expire_minutes} minutes. If you did not ask for it, ignore this email."
    );
    OutgoingEmail {
        to: to.to_string(),
        subject: "Reset your password".to_string(),
        html: render_html("Password reset", &body, "Choose a new password", link),
        text: render_text(&body, link),
    }
}

/// Internal notice to the after-sales team about a new ticket.
pub fn staff_ticket_email(
    to: &str,
    client_email: &str,
    ticket_id: &str,
    subject: &str,
    description: &str,
    attachments: usize,
) -> OutgoingEmail {
    let text = format!(
        "New support ticket {ticket_id}\nClient: {client_email}\nSubject: {subject}\nAttachments: {attachments}\n\n{description}\n"
    );
    OutgoingEmail {
        to: to.to_string(),
        subject: format!("[Support] {subject}"),
        html: format!("<pre style=\"font-family: Arial, sans-serif;\">{}</pre>", escape_html(&text)),
        text,
    }
}

fn render_html(title: &str, body: &str, button: &str, link: &str) -> String {
    format!(
        r#"
        <!DOCTYPE html>
        <html>
        <head>
            <meta charset="UTF-8">
            <title>{title}</title>
        </head>
        <body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
            <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
                <h2 style="color: #2c3e50;">{title}</h2>
                <p>{body}</p>
                <div style="text-align: center; margin: 30px 0;">
                    <a href="{link}"
                       style="background-color: #febd17; color: #000; padding: 12px 30px;
                              text-decoration: none; border-radius: 5px; display: inline-block;">
                        {button}
                    </a>
                </div>
                <p>Or copy and paste this link into your browser:</p>
                <p style="word-break: break-all; color: #7f8c8d;">{link}</p>
            </div>
        </body>
        </html>
        "#,
        title = escape_html(title),
        body = escape_html(body),
        button = escape_html(button),
        link = escape_html(link),
    )
}

fn render_text(body: &str, link: &str) -> String {
    format!("{body}\n\n{link}\n")
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_link_email_contains_link() {
        let email = magic_link_email("a@b.fr", "https://portal/auth/callback?token=x", 15);
        assert_eq!(email.to, "a@b.fr");
        assert!(email.text.contains("https://portal/auth/callback?token=x"));
        assert!(email.html.contains("15 minutes"));
    }

    #[test]
    fn test_staff_email_escapes_client_input() {
        let email = staff_ticket_email("sav@b.fr", "c@b.fr", "t1", "<b>Leak</b>", "desc", 2);
        assert!(email.html.contains("&lt;b&gt;Leak&lt;/b&gt;"));
        assert!(email.text.contains("Attachments: 2"));
    }
}
