use anyhow::{Context, Result};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub stripe_secret_key: String,
    pub stripe_webhook_secret: String,
    /// Marketplace share of paid seats, in percent.
    pub platform_fee_percent: Decimal,
    pub checkout_success_url: String,
    pub checkout_cancel_url: String,
    pub qr_render_url: String,
    /// Optional endpoint of the notification delivery collaborator; when
    /// unset notifications are logged only.
    pub notify_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            host: std::env::var("HOST").context("Cannot load HOST env variable")?,
            port: std::env::var("PORT")
                .context("Cannot load PORT env variable")?
                .parse()
                .context("PORT must be a number")?,
            database_url: std::env::var("DATABASE_URL")
                .context("Cannot load DATABASE_URL env variable")?,
            stripe_secret_key: std::env::var("STRIPE_SECRET_KEY")
                .context("Cannot load STRIPE_SECRET_KEY env variable")?,
            stripe_webhook_secret: std::env::var("STRIPE_WEBHOOK_SECRET")
                .context("Cannot load STRIPE_WEBHOOK_SECRET env variable")?,
            platform_fee_percent: std::env::var("PLATFORM_FEE_PERCENT")
                .unwrap_or_else(|_| "10".to_string())
                .parse()
                .context("PLATFORM_FEE_PERCENT must be a number")?,
            checkout_success_url: std::env::var("CHECKOUT_SUCCESS_URL")
                .context("Cannot load CHECKOUT_SUCCESS_URL env variable")?,
            checkout_cancel_url: std::env::var("CHECKOUT_CANCEL_URL")
                .context("Cannot load CHECKOUT_CANCEL_URL env variable")?,
            qr_render_url: std::env::var("QR_RENDER_URL")
                .unwrap_or_else(|_| "https://api.qrserver.com/v1/create-qr-code/".to_string()),
            notify_url: std::env::var("NOTIFY_URL").ok(),
        })
    }
}
