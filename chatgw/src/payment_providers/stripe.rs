//! Stripe provider, speaking the form-encoded REST API directly.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{PaymentError, PaymentProvider, SetupIntent};
use crate::config::StripeConfig;

pub struct StripeProvider {
    http: reqwest::Client,
    config: StripeConfig,
}

#[derive(Debug, Deserialize)]
struct SetupIntentResponse {
    client_secret: String,
}

#[derive(Debug, Deserialize)]
struct SubscriptionResponse {
    items: SubscriptionItems,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItems {
    data: Vec<SubscriptionItem>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionItem {
    id: String,
}

impl StripeProvider {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/v1/{path}",
            self.config.api_url.as_str().trim_end_matches('/')
        )
    }

    async fn post_form(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<reqwest::Response, PaymentError> {
        let response = self
            .http
            .post(self.endpoint(path))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .form(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api { status, message });
        }
        Ok(response)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, PaymentError> {
        let response = self
            .http
            .get(self.endpoint(path))
            .basic_auth(&self.config.secret_key, None::<&str>)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api { status, message });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl PaymentProvider for StripeProvider {
    async fn create_setup_intent(&self, customer_id: &str) -> Result<SetupIntent, PaymentError> {
        let response = self
            .post_form(
                "setup_intents",
                &[("customer", customer_id), ("usage", "off_session")],
            )
            .await?;
        let intent: SetupIntentResponse = response.json().await?;
        debug!(customer_id, "created setup intent");
        Ok(SetupIntent {
            client_secret: intent.client_secret,
        })
    }

    async fn update_default_payment_method(
        &self,
        customer_id: &str,
        subscription_id: Option<&str>,
        payment_method_id: &str,
    ) -> Result<(), PaymentError> {
        self.post_form(
            &format!("payment_methods/{payment_method_id}/attach"),
            &[("customer", customer_id)],
        )
        .await?;

        self.post_form(
            &format!("customers/{customer_id}"),
            &[("invoice_settings[default_payment_method]", payment_method_id)],
        )
        .await?;

        if let Some(subscription_id) = subscription_id {
            self.post_form(
                &format!("subscriptions/{subscription_id}"),
                &[("default_payment_method", payment_method_id)],
            )
            .await?;
        }
        debug!(customer_id, "updated default payment method");
        Ok(())
    }

    async fn set_cancel_at_period_end(
        &self,
        subscription_id: &str,
        cancel: bool,
    ) -> Result<(), PaymentError> {
        let value = if cancel { "true" } else { "false" };
        self.post_form(
            &format!("subscriptions/{subscription_id}"),
            &[("cancel_at_period_end", value)],
        )
        .await?;
        debug!(subscription_id, cancel, "updated cancel_at_period_end");
        Ok(())
    }

    async fn update_subscription_price(
        &self,
        subscription_id: &str,
        price_id: &str,
        reset_billing_cycle: bool,
    ) -> Result<(), PaymentError> {
        // The price change goes on the existing subscription item, so the
        // item id has to be looked up first.
        let subscription: SubscriptionResponse = self
            .get_json(&format!("subscriptions/{subscription_id}"))
            .await?;
        let item_id = subscription
            .items
            .data
            .first()
            .map(|item| item.id.clone())
            .ok_or_else(|| PaymentError::Api {
                status: StatusCode::BAD_GATEWAY,
                message: format!("subscription {subscription_id} has no items"),
            })?;

        let mut form = vec![
            ("items[0][id]", item_id.as_str()),
            ("items[0][price]", price_id),
        ];
        if reset_billing_cycle {
            form.push(("proration_behavior", "none"));
            form.push(("billing_cycle_anchor", "now"));
        }
        self.post_form(&format!("subscriptions/{subscription_id}"), &form)
            .await?;
        debug!(subscription_id, price_id, "updated subscription price");
        Ok(())
    }
}
