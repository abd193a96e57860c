//! Payment provider abstraction.
//!
//! Billing routes talk to a [`PaymentProvider`] trait object so tests and
//! local development never hit Stripe. The provider only covers the card
//! and subscription operations the gateway forwards; plan bookkeeping
//! stays in our own database.

pub mod dummy;
pub mod stripe;

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Serialize;

use crate::config::PaymentConfig;

pub use dummy::DummyProvider;
pub use stripe::StripeProvider;

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("payment provider rejected request ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("payment provider request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// A pending card-collection handshake. The client secret goes to the
/// browser, which completes the flow against the provider directly.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetupIntent {
    pub client_secret: String,
}

#[async_trait]
pub trait PaymentProvider: Send + Sync {
    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, PaymentError>;

    /// Attach a payment method to the customer and make it the default
    /// for both future invoices and the active subscription, if any.
    async fn update_default_payment_method(
        &self,
        customer_id: &str,
        subscription_id: Option<&str>,
        payment_method_id: &str,
    ) -> Result<(), PaymentError>;

    /// Flag (or unflag) a subscription to lapse at period end.
    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> Result<(), PaymentError>;

    /// Move an active subscription onto a new price. `reset_billing_cycle`
    /// restarts the cycle immediately without prorating (upgrades); otherwise
    /// the new price takes over the current cycle (downgrades).
    async fn update_subscription_price(
        &self,
        subscription_id: &str,
        price_id: &str,
        reset_billing_cycle: bool,
    ) -> Result<(), PaymentError>;
}

/// Build the provider selected in the configuration.
pub fn create_provider(config: &PaymentConfig) -> Arc<dyn PaymentProvider> {
    match config {
        PaymentConfig::Stripe(stripe) => Arc::new(StripeProvider::new(stripe.clone())),
        PaymentConfig::Dummy(dummy) => Arc::new(DummyProvider::new(dummy.clone())),
    }
}
