//! Stripe checkout sessions and webhook event decoding.
//!
//! Signature verification lives in `lasy_core::webhook_signature`; this
//! module only deals with the REST call and the event payload shape.

use std::time::Duration;

use lasy_core::plans::{PLAN_PRO, PLAN_SCALE, PLAN_STARTER};
use lasy_core::types::DbId;
use serde::Deserialize;

use crate::{ensure_success, http_client, ProviderError};

const PROVIDER: &str = "stripe";
const DEFAULT_API_URL: &str = "https://api.stripe.com";

pub const EVENT_CHECKOUT_COMPLETED: &str = "checkout.session.completed";
pub const EVENT_SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";

/// Stripe configuration.
#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    pub webhook_secret: Option<String>,
    pub api_url: String,
    /// `(price id, plan id)` pairs for every configured price.
    pub prices: Vec<(String, &'static str)>,
    pub timeout: Duration,
}

impl StripeConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                 | Default                  |
    /// |-------------------------|--------------------------|
    /// | `STRIPE_SECRET_KEY`     | unset                    |
    /// | `STRIPE_WEBHOOK_SECRET` | unset                    |
    /// | `STRIPE_API_URL`        | `https://api.stripe.com` |
    /// | `STRIPE_PRICE_STARTER`  | unset                    |
    /// | `STRIPE_PRICE_PRO`      | unset                    |
    /// | `STRIPE_PRICE_SCALE`    | unset                    |
    pub fn from_env() -> Self {
        let non_empty = |key: &str| std::env::var(key).ok().filter(|v| !v.is_empty());

        let prices = [
            ("STRIPE_PRICE_STARTER", PLAN_STARTER),
            ("STRIPE_PRICE_PRO", PLAN_PRO),
            ("STRIPE_PRICE_SCALE", PLAN_SCALE),
        ]
        .into_iter()
        .filter_map(|(key, plan)| non_empty(key).map(|price| (price, plan)))
        .collect();

        Self {
            secret_key: non_empty("STRIPE_SECRET_KEY"),
            webhook_secret: non_empty("STRIPE_WEBHOOK_SECRET"),
            api_url: std::env::var("STRIPE_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into()),
            prices,
            timeout: crate::provider_timeout_from_env(),
        }
    }

    /// Plan id sold under `price_id`, if that price is configured.
    pub fn plan_for_price(&self, price_id: &str) -> Option<&'static str> {
        self.prices
            .iter()
            .find(|(price, _)| price == price_id)
            .map(|(_, plan)| *plan)
    }
}

// ---------------------------------------------------------------------------
// Checkout
// ---------------------------------------------------------------------------

/// Input for a subscription checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutParams<'a> {
    pub price_id: &'a str,
    pub plan_id: &'a str,
    pub user_id: DbId,
    pub customer_email: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page the client is redirected to.
    pub url: Option<String>,
}

/// HTTP client for the Stripe REST API.
pub struct StripeClient {
    client: reqwest::Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(config: StripeConfig) -> Self {
        Self {
            client: http_client(config.timeout),
            config,
        }
    }

    pub fn config(&self) -> &StripeConfig {
        &self.config
    }

    /// `POST /v1/checkout/sessions` in subscription mode.
    pub async fn create_checkout_session(
        &self,
        params: &CheckoutParams<'_>,
    ) -> Result<CheckoutSession, ProviderError> {
        let secret_key = self
            .config
            .secret_key
            .as_deref()
            .ok_or(ProviderError::MissingCredential("STRIPE_SECRET_KEY"))?;

        let response = self
            .client
            .post(format!(
                "{}/v1/checkout/sessions",
                self.config.api_url.trim_end_matches('/')
            ))
            .bearer_auth(secret_key)
            .form(&checkout_form(params))
            .send()
            .await?;
        let response = ensure_success(PROVIDER, response).await?;
        let session: CheckoutSession = response.json().await?;

        tracing::info!(
            user_id = params.user_id,
            plan_id = params.plan_id,
            session_id = %session.id,
            "Checkout session created"
        );
        Ok(session)
    }
}

fn checkout_form(params: &CheckoutParams<'_>) -> Vec<(&'static str, String)> {
    let user_id = params.user_id.to_string();
    vec![
        ("mode", "subscription".into()),
        ("payment_method_types[0]", "card".into()),
        ("line_items[0][price]", params.price_id.into()),
        ("line_items[0][quantity]", "1".into()),
        ("customer_email", params.customer_email.into()),
        ("success_url", params.success_url.into()),
        ("cancel_url", params.cancel_url.into()),
        ("client_reference_id", user_id.clone()),
        ("metadata[plan_id]", params.plan_id.into()),
        ("metadata[user_id]", user_id.clone()),
        ("subscription_data[metadata][user_id]", user_id),
        ("subscription_data[metadata][plan_id]", params.plan_id.into()),
    ]
}

// ---------------------------------------------------------------------------
// Webhook events
// ---------------------------------------------------------------------------

/// Envelope of a Stripe webhook event.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: WebhookData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebhookData {
    pub object: serde_json::Value,
}

/// The subset of webhook events Lasy acts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PaymentEvent {
    CheckoutCompleted {
        session_id: String,
        user_id: DbId,
        plan_id: String,
    },
    SubscriptionDeleted {
        subscription_id: String,
        user_id: Option<DbId>,
    },
    /// Accepted and ignored.
    Other(String),
}

impl WebhookEvent {
    pub fn parse(payload: &[u8]) -> Result<Self, ProviderError> {
        serde_json::from_slice(payload)
            .map_err(|e| ProviderError::InvalidResponse(format!("malformed webhook event: {e}")))
    }

    /// Pull the fields each handled event type needs out of `data.object`.
    pub fn classify(&self) -> Result<PaymentEvent, ProviderError> {
        let object = &self.data.object;
        match self.event_type.as_str() {
            EVENT_CHECKOUT_COMPLETED => {
                let session_id = str_field(object, &["id"])
                    .ok_or_else(|| missing(&self.event_type, "id"))?;
                let user_id = str_field(object, &["client_reference_id"])
                    .or_else(|| str_field(object, &["metadata", "user_id"]))
                    .and_then(|v| v.parse::<DbId>().ok())
                    .ok_or_else(|| missing(&self.event_type, "client_reference_id"))?;
                let plan_id = str_field(object, &["metadata", "plan_id"])
                    .ok_or_else(|| missing(&self.event_type, "metadata.plan_id"))?;
                Ok(PaymentEvent::CheckoutCompleted {
                    session_id: session_id.to_string(),
                    user_id,
                    plan_id: plan_id.to_string(),
                })
            }
            EVENT_SUBSCRIPTION_DELETED => {
                let subscription_id = str_field(object, &["id"])
                    .ok_or_else(|| missing(&self.event_type, "id"))?;
                Ok(PaymentEvent::SubscriptionDeleted {
                    subscription_id: subscription_id.to_string(),
                    user_id: str_field(object, &["metadata", "user_id"])
                        .and_then(|v| v.parse().ok()),
                })
            }
            other => Ok(PaymentEvent::Other(other.to_string())),
        }
    }
}

fn str_field<'a>(value: &'a serde_json::Value, path: &[&str]) -> Option<&'a str> {
    path.iter()
        .try_fold(value, |v, key| v.get(key))
        .and_then(serde_json::Value::as_str)
}

fn missing(event_type: &str, field: &str) -> ProviderError {
    ProviderError::InvalidResponse(format!("{event_type} event without {field}"))
}
