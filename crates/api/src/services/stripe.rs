//! Stripe Checkout client.
//!
//! Talks to the Stripe REST API directly: create a Checkout Session for a
//! draft order, and retrieve a session by id. Amounts cross the wire in
//! minor units (cents).

use std::time::Duration;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use attire_core::OrderId;

use crate::config::StripeConfig;

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors from Stripe API calls.
#[derive(Debug, Error)]
pub enum StripeError {
    #[error("stripe request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("stripe api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// An amount that cannot be represented in integer minor units.
    #[error("unrepresentable amount: {0}")]
    Amount(Decimal),
}

/// One purchasable line of a checkout session.
#[derive(Debug, Clone)]
pub struct SessionLineItem {
    pub name: String,
    /// Unit price in major units (dollars).
    pub unit_price: Decimal,
    pub quantity: i32,
}

/// Everything needed to open a Checkout Session for a draft order.
#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub order_id: OrderId,
    pub order_no: String,
    pub line_items: Vec<SessionLineItem>,
    /// Added as its own line item when non-zero.
    pub delivery_fee: Decimal,
    pub success_url: String,
    pub cancel_url: String,
}

/// A Checkout Session as returned by Stripe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    /// Hosted payment page; present while the session is open.
    pub url: Option<String>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
    pub amount_total: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// Client for the Stripe Checkout API.
#[derive(Clone)]
pub struct StripeClient {
    http: reqwest::Client,
    secret_key: SecretString,
    currency: String,
    base_url: String,
}

impl StripeClient {
    /// Build a client from the Stripe configuration.
    ///
    /// # Errors
    ///
    /// Returns the underlying error when the HTTP client cannot be built;
    /// a client without the request timeout must not slip through.
    pub fn new(config: &StripeConfig) -> Result<Self, reqwest::Error> {
        Ok(Self {
            http: reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?,
            secret_key: config.secret_key.clone(),
            currency: config.currency.to_lowercase(),
            base_url: STRIPE_API_BASE.to_owned(),
        })
    }

    /// Create a Checkout Session for a draft order.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Amount` for amounts that don't convert to whole
    /// cents, `StripeError::Api` when Stripe rejects the request, or
    /// `StripeError::Http` on transport failure.
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, StripeError> {
        let form = session_form(request, &self.currency)?;

        let response = self
            .http
            .post(format!("{}/checkout/sessions", self.base_url))
            .basic_auth(self.secret_key.expose_secret(), None::<&str>)
            .form(&form)
            .send()
            .await?;

        Self::parse_session(response).await
    }

    /// Retrieve a Checkout Session by id.
    ///
    /// # Errors
    ///
    /// Returns `StripeError::Api` for unknown sessions or `StripeError::Http`
    /// on transport failure.
    pub async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, StripeError> {
        let response = self
            .http
            .get(format!(
                "{}/checkout/sessions/{}",
                self.base_url,
                urlencoding::encode(session_id)
            ))
            .basic_auth(self.secret_key.expose_secret(), None::<&str>)
            .send()
            .await?;

        Self::parse_session(response).await
    }

    async fn parse_session(response: reqwest::Response) -> Result<CheckoutSession, StripeError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<CheckoutSession>().await?);
        }

        let message = response
            .json::<ApiErrorEnvelope>()
            .await
            .ok()
            .and_then(|envelope| envelope.error.message)
            .unwrap_or_else(|| "unknown stripe error".to_owned());

        Err(StripeError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("currency", &self.currency)
            .field("base_url", &self.base_url)
            .field("secret_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// Convert a major-unit amount to integer cents.
fn to_minor_units(amount: Decimal) -> Result<i64, StripeError> {
    (amount * Decimal::from(100))
        .round()
        .to_i64()
        .ok_or(StripeError::Amount(amount))
}

/// Build the form-encoded body of a session-create call.
///
/// Stripe's form encoding indexes nested arrays, e.g.
/// `line_items[0][price_data][unit_amount]`.
fn session_form(
    request: &CheckoutSessionRequest,
    currency: &str,
) -> Result<Vec<(String, String)>, StripeError> {
    let mut form = vec![
        ("mode".to_owned(), "payment".to_owned()),
        ("success_url".to_owned(), request.success_url.clone()),
        ("cancel_url".to_owned(), request.cancel_url.clone()),
        (
            "metadata[order_id]".to_owned(),
            request.order_id.to_string(),
        ),
        ("metadata[order_no]".to_owned(), request.order_no.clone()),
    ];

    for (index, item) in request.line_items.iter().enumerate() {
        push_line_item(
            &mut form,
            index,
            currency,
            &item.name,
            to_minor_units(item.unit_price)?,
            item.quantity,
        );
    }

    if request.delivery_fee > Decimal::ZERO {
        push_line_item(
            &mut form,
            request.line_items.len(),
            currency,
            "Delivery fee",
            to_minor_units(request.delivery_fee)?,
            1,
        );
    }

    Ok(form)
}

fn push_line_item(
    form: &mut Vec<(String, String)>,
    index: usize,
    currency: &str,
    name: &str,
    unit_amount: i64,
    quantity: i32,
) {
    form.push((
        format!("line_items[{index}][price_data][currency]"),
        currency.to_owned(),
    ));
    form.push((
        format!("line_items[{index}][price_data][product_data][name]"),
        name.to_owned(),
    ));
    form.push((
        format!("line_items[{index}][price_data][unit_amount]"),
        unit_amount.to_string(),
    ));
    form.push((
        format!("line_items[{index}][quantity]"),
        quantity.to_string(),
    ));
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn request() -> CheckoutSessionRequest {
        CheckoutSessionRequest {
            order_id: OrderId::from(7),
            order_no: "ORD-1700000000000-1234".to_owned(),
            line_items: vec![
                SessionLineItem {
                    name: "Linen Shirt".to_owned(),
                    unit_price: Decimal::from_str("49.90").unwrap(),
                    quantity: 2,
                },
                SessionLineItem {
                    name: "Canvas Tote".to_owned(),
                    unit_price: Decimal::from_str("19.00").unwrap(),
                    quantity: 1,
                },
            ],
            delivery_fee: Decimal::from_str("5.00").unwrap(),
            success_url: "https://shop.example/checkout/success".to_owned(),
            cancel_url: "https://shop.example/checkout/cancel".to_owned(),
        }
    }

    fn value<'a>(form: &'a [(String, String)], key: &str) -> Option<&'a str> {
        form.iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_new_builds_timed_out_client() {
        use secrecy::SecretString;

        use crate::config::StripeConfig;

        let client = StripeClient::new(&StripeConfig {
            secret_key: SecretString::from("sk_test_123"),
            currency: "SGD".to_owned(),
        })
        .unwrap();

        assert_eq!(client.currency, "sgd");
    }

    #[test]
    fn test_to_minor_units_exact_cents() {
        assert_eq!(
            to_minor_units(Decimal::from_str("49.90").unwrap()).unwrap(),
            4990
        );
        assert_eq!(to_minor_units(Decimal::ZERO).unwrap(), 0);
    }

    #[test]
    fn test_session_form_indexes_line_items() {
        let form = session_form(&request(), "sgd").unwrap();

        assert_eq!(value(&form, "mode"), Some("payment"));
        assert_eq!(value(&form, "metadata[order_id]"), Some("7"));
        assert_eq!(
            value(&form, "metadata[order_no]"),
            Some("ORD-1700000000000-1234")
        );
        assert_eq!(
            value(&form, "line_items[0][price_data][unit_amount]"),
            Some("4990")
        );
        assert_eq!(value(&form, "line_items[0][quantity]"), Some("2"));
        assert_eq!(
            value(&form, "line_items[1][price_data][product_data][name]"),
            Some("Canvas Tote")
        );
        assert_eq!(
            value(&form, "line_items[0][price_data][currency]"),
            Some("sgd")
        );
    }

    #[test]
    fn test_session_form_appends_delivery_fee_line() {
        let form = session_form(&request(), "sgd").unwrap();

        assert_eq!(
            value(&form, "line_items[2][price_data][product_data][name]"),
            Some("Delivery fee")
        );
        assert_eq!(
            value(&form, "line_items[2][price_data][unit_amount]"),
            Some("500")
        );
        assert_eq!(value(&form, "line_items[2][quantity]"), Some("1"));
    }

    #[test]
    fn test_session_form_skips_zero_delivery_fee() {
        let mut req = request();
        req.delivery_fee = Decimal::ZERO;
        let form = session_form(&req, "sgd").unwrap();

        assert!(value(&form, "line_items[2][quantity]").is_none());
    }
}
