//! Email service for account and order notifications.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and plain text
//! templates. [`Mailer`] is what the rest of the crate talks to: it knows the
//! storefront URL and skips sending when SMTP is not configured.

use askama::Template;
use chrono::{Datelike, Utc};
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use strive_core::{OrderId, ProductId};

use crate::config::EmailConfig;

/// Images larger than this are left out of the confirmation email.
pub const MAX_INLINE_IMAGE_BYTES: usize = 100_000;

// =============================================================================
// Templates
// =============================================================================

#[derive(Template)]
#[template(path = "email/welcome.html")]
struct WelcomeEmailHtml<'a> {
    name: &'a str,
    frontend_url: &'a str,
    year: i32,
}

#[derive(Template)]
#[template(path = "email/welcome.txt")]
struct WelcomeEmailText<'a> {
    name: &'a str,
    frontend_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetEmailHtml<'a> {
    name: &'a str,
    reset_url: &'a str,
    valid_minutes: i64,
    frontend_url: &'a str,
    year: i32,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetEmailText<'a> {
    name: &'a str,
    reset_url: &'a str,
    valid_minutes: i64,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationEmailHtml<'a> {
    name: &'a str,
    order_id: OrderId,
    order_date: &'a str,
    total_amount: Decimal,
    lines: &'a [ConfirmationLine],
    frontend_url: &'a str,
    year: i32,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationEmailText<'a> {
    name: &'a str,
    order_id: OrderId,
    order_date: &'a str,
    total_amount: Decimal,
    lines: &'a [ConfirmationLine],
    frontend_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_delivered.html")]
struct OrderDeliveredEmailHtml<'a> {
    name: &'a str,
    order_id: OrderId,
    products: &'a [ReviewLink],
    frontend_url: &'a str,
    year: i32,
}

#[derive(Template)]
#[template(path = "email/order_delivered.txt")]
struct OrderDeliveredEmailText<'a> {
    name: &'a str,
    order_id: OrderId,
    products: &'a [ReviewLink],
}

// =============================================================================
// Email Content
// =============================================================================

/// One row of the order confirmation table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationLine {
    pub name: String,
    pub size: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    /// `data:` URI of the product's first image, if small enough to inline.
    pub image_uri: Option<String>,
}

/// Order details for the confirmation email.
#[derive(Debug, Clone)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub order_date: String,
    pub total_amount: Decimal,
    pub lines: Vec<ConfirmationLine>,
}

/// A delivered product with the link to its review form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewLink {
    pub name: String,
    pub review_url: String,
}

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

// =============================================================================
// SMTP Service
// =============================================================================

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be set up.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }

    /// Send a multipart email with both plain text and HTML versions.
    async fn send_multipart_email(
        &self,
        to: &str,
        subject: &str,
        text_body: &str,
        html_body: &str,
    ) -> Result<(), EmailError> {
        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_string()))?)
            .subject(subject)
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(text_body.to_string()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html_body.to_string()),
                    ),
            )?;

        self.mailer.send(email).await?;

        tracing::info!(to = %to, subject = %subject, "Email sent successfully");
        Ok(())
    }
}

// =============================================================================
// Mailer
// =============================================================================

/// Renders and sends every notification the shop emits.
///
/// Without SMTP configuration each send is logged and reported as done.
#[derive(Clone)]
pub struct Mailer {
    service: Option<EmailService>,
    frontend_url: String,
}

impl Mailer {
    #[must_use]
    pub const fn new(service: Option<EmailService>, frontend_url: String) -> Self {
        Self {
            service,
            frontend_url,
        }
    }

    /// Whether emails actually leave the process.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.service.is_some()
    }

    /// Link to the storefront review form for a product.
    #[must_use]
    pub fn review_url(&self, product_id: ProductId) -> String {
        format!("{}/product/{product_id}?review=true", self.frontend_url)
    }

    /// Link that redeems a password reset token.
    #[must_use]
    pub fn reset_url(&self, token: &str) -> String {
        format!("{}/reset-password?token={token}", self.frontend_url)
    }

    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_welcome(&self, to: &str, name: &str) -> Result<(), EmailError> {
        let frontend_url = self.frontend_url.as_str();
        let html = WelcomeEmailHtml {
            name,
            frontend_url,
            year: current_year(),
        }
        .render()?;
        let text = WelcomeEmailText { name, frontend_url }.render()?;

        self.deliver(to, "Welcome to Strive!", &text, &html).await
    }

    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_password_reset(
        &self,
        to: &str,
        name: &str,
        token: &str,
        valid_minutes: i64,
    ) -> Result<(), EmailError> {
        let reset_url = self.reset_url(token);
        let html = PasswordResetEmailHtml {
            name,
            reset_url: &reset_url,
            valid_minutes,
            frontend_url: &self.frontend_url,
            year: current_year(),
        }
        .render()?;
        let text = PasswordResetEmailText {
            name,
            reset_url: &reset_url,
            valid_minutes,
        }
        .render()?;

        self.deliver(to, "Strive - Password Reset Request", &text, &html)
            .await
    }

    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_order_confirmation(
        &self,
        to: &str,
        name: &str,
        order: &OrderConfirmation,
    ) -> Result<(), EmailError> {
        let html = OrderConfirmationEmailHtml {
            name,
            order_id: order.order_id,
            order_date: &order.order_date,
            total_amount: order.total_amount,
            lines: &order.lines,
            frontend_url: &self.frontend_url,
            year: current_year(),
        }
        .render()?;
        let text = OrderConfirmationEmailText {
            name,
            order_id: order.order_id,
            order_date: &order.order_date,
            total_amount: order.total_amount,
            lines: &order.lines,
            frontend_url: &self.frontend_url,
        }
        .render()?;

        let subject = format!("Thank you for your Strive order #{}", order.order_id);
        self.deliver(to, &subject, &text, &html).await
    }

    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_order_delivered(
        &self,
        to: &str,
        name: &str,
        order_id: OrderId,
        products: &[ReviewLink],
    ) -> Result<(), EmailError> {
        let html = OrderDeliveredEmailHtml {
            name,
            order_id,
            products,
            frontend_url: &self.frontend_url,
            year: current_year(),
        }
        .render()?;
        let text = OrderDeliveredEmailText {
            name,
            order_id,
            products,
        }
        .render()?;

        let subject = format!("Your Strive order #{order_id} has been delivered");
        self.deliver(to, &subject, &text, &html).await
    }

    async fn deliver(
        &self,
        to: &str,
        subject: &str,
        text: &str,
        html: &str,
    ) -> Result<(), EmailError> {
        match &self.service {
            Some(service) => service.send_multipart_email(to, subject, text, html).await,
            None => {
                tracing::info!(to = %to, subject = %subject, "SMTP not configured, email skipped");
                Ok(())
            }
        }
    }
}

fn current_year() -> i32 {
    Utc::now().year()
}
