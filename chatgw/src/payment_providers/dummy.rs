//! No-op provider for development and tests.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tracing::info;

use super::{PaymentError, PaymentProvider, SetupIntent};
use crate::config::DummyConfig;

pub struct DummyProvider {
    config: DummyConfig,
    calls: AtomicUsize,
}

impl DummyProvider {
    pub fn new(config: DummyConfig) -> Self {
        Self {
            config,
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of provider operations performed. Used by tests to assert
    /// that gated routes never reach the provider.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentProvider for DummyProvider {
    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        info!(customer_id, "dummy provider: create_setup_intent");
        Ok(SetupIntent {
            client_secret: self
                .config
                .setup_intent_secret
                .clone()
                .unwrap_or_else(|| "seti_dummy_secret".to_string()),
        })
    }

    async fn update_default_payment_method(
        &self,
        customer_id: &str,
        _subscription_id: Option<&str>,
        payment_method_id: &str,
    ) -> Result<(), PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        info!(customer_id, payment_method_id, "dummy provider: update_default_payment_method");
        Ok(())
    }

    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> Result<(), PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        info!(subscription_id, cancel, "dummy provider: set_cancel_at_period_end");
        Ok(())
    }

    async fn update_subscription_price(
        &self,
        subscription_id: &str,
        price_id: &str,
        reset_billing_cycle: bool,
    ) -> Result<(), PaymentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        info!(
            subscription_id,
            price_id, reset_billing_cycle, "dummy provider: update_subscription_price"
        );
        Ok(())
    }
}
