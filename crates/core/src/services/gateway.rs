//! Mobile-money payment processor client.
//!
//! The processor is Paystack-compatible: `POST /transaction/initialize`
//! creates a charge and `GET /transaction/verify/{reference}` returns its
//! authoritative state. Vote details travel as charge metadata, which the
//! processor echoes back on verification, so no pending-charge table is kept
//! locally.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use evote_common::config::PaymentConfig;
use evote_common::{AppError, AppResult};
use evote_db::entities::payment::PaymentProvider;
use hmac::{Hmac, Mac};
use serde::de::{self, DeserializeOwned};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::json;
use sha2::Sha512;
use tracing::{debug, warn};

/// Transaction status the processor reports for a completed charge.
pub const STATUS_SUCCESS: &str = "success";

/// Vote details attached to a charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeMetadata {
    #[serde(deserialize_with = "lenient_number")]
    pub contestant_id: i64,
    #[serde(deserialize_with = "lenient_number")]
    pub quantity: i32,
    pub phone_number: String,
    pub provider: String,
}

/// A charge to create at the processor.
#[derive(Debug, Clone)]
pub struct ChargeRequest {
    /// Customer email; the processor requires one.
    pub email: String,
    pub amount_minor: i64,
    pub phone_number: String,
    pub provider: PaymentProvider,
    pub metadata: ChargeMetadata,
    pub callback_url: Option<String>,
}

/// Where to send the voter to approve a charge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeAuthorization {
    pub authorization_url: String,
    pub reference: String,
}

/// The processor's view of a transaction.
#[derive(Debug, Clone)]
pub struct VerifiedTransaction {
    pub reference: String,
    pub status: String,
    pub amount_minor: i64,
    pub paid_at: Option<DateTime<Utc>>,
    pub metadata: serde_json::Value,
}

impl VerifiedTransaction {
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == STATUS_SUCCESS
    }

    /// Decode the vote details echoed back with the transaction.
    pub fn charge_metadata(&self) -> AppResult<ChargeMetadata> {
        serde_json::from_value(self.metadata.clone()).map_err(|e| {
            AppError::VerificationFailed(format!(
                "Transaction {} carries no usable vote metadata: {e}",
                self.reference
            ))
        })
    }
}

/// Outbound calls to the payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Create a charge and return the checkout link.
    async fn initialize(&self, request: &ChargeRequest) -> AppResult<ChargeAuthorization>;

    /// Fetch the authoritative state of a transaction.
    async fn verify(&self, reference: &str) -> AppResult<VerifiedTransaction>;

    /// Check a webhook body against its signature header.
    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool;
}

/// Envelope every processor response is wrapped in.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: String,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    #[serde(default)]
    reference: Option<String>,
    status: String,
    #[serde(deserialize_with = "lenient_number")]
    amount: i64,
    #[serde(default)]
    paid_at: Option<String>,
    #[serde(default)]
    metadata: serde_json::Value,
}

/// Paystack-compatible HTTP client.
#[derive(Clone)]
pub struct PaystackGateway {
    http_client: reqwest::Client,
    base_url: String,
    secret_key: String,
}

impl PaystackGateway {
    /// Create a gateway client from configuration.
    pub fn new(config: &PaymentConfig) -> AppResult<Self> {
        let base_url = url::Url::parse(&config.base_url)
            .map_err(|e| AppError::Config(format!("Invalid payment.base_url: {e}")))?;

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("evote-rs")
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http_client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            secret_key: config.secret_key.clone(),
        })
    }

    async fn read_envelope<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<(reqwest::StatusCode, Envelope<T>), String> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read response: {e}"))?;
        let envelope = serde_json::from_str::<Envelope<T>>(&body)
            .map_err(|_| format!("HTTP {status}: {body}"))?;
        Ok((status, envelope))
    }
}

#[async_trait]
impl PaymentGateway for PaystackGateway {
    async fn initialize(&self, request: &ChargeRequest) -> AppResult<ChargeAuthorization> {
        let mut body = json!({
            "email": request.email,
            "amount": request.amount_minor,
            "channels": ["mobile_money"],
            "mobile_money": {
                "phone": request.phone_number,
                "provider": request.provider.gateway_code(),
            },
            "metadata": request.metadata,
        });
        if let Some(ref callback_url) = request.callback_url {
            body["callback_url"] = json!(callback_url);
        }

        let response = self
            .http_client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(&self.secret_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::GatewayUnavailable(format!("Initialize request failed: {e}")))?;

        let (status, envelope) = Self::read_envelope::<ChargeAuthorization>(response)
            .await
            .map_err(AppError::GatewayUnavailable)?;

        match envelope.data {
            Some(authorization) if status.is_success() && envelope.status => {
                debug!(reference = %authorization.reference, "Charge initialized");
                Ok(authorization)
            }
            _ => Err(AppError::GatewayUnavailable(format!(
                "Processor rejected charge (HTTP {status}): {}",
                envelope.message
            ))),
        }
    }

    async fn verify(&self, reference: &str) -> AppResult<VerifiedTransaction> {
        let mut endpoint = url::Url::parse(&format!("{}/transaction/verify/", self.base_url))
            .map_err(|e| AppError::Internal(e.to_string()))?;
        endpoint
            .path_segments_mut()
            .map_err(|()| AppError::Internal("Invalid payment base URL".to_string()))?
            .pop_if_empty()
            .push(reference);

        let response = self
            .http_client
            .get(endpoint)
            .bearer_auth(&self.secret_key)
            .send()
            .await
            .map_err(|e| AppError::GatewayUnavailable(format!("Verify request failed: {e}")))?;

        let (status, envelope) = Self::read_envelope::<TransactionData>(response)
            .await
            .map_err(AppError::VerificationFailed)?;

        let data = match envelope.data {
            Some(data) if status.is_success() && envelope.status => data,
            _ => {
                return Err(AppError::VerificationFailed(format!(
                    "HTTP {status}: {}",
                    envelope.message
                )));
            }
        };

        Ok(VerifiedTransaction {
            reference: data.reference.unwrap_or_else(|| reference.to_string()),
            paid_at: data.paid_at.as_deref().and_then(parse_paid_at),
            status: data.status,
            amount_minor: data.amount,
            metadata: data.metadata,
        })
    }

    fn verify_webhook_signature(&self, payload: &[u8], signature: &str) -> bool {
        let Ok(expected) = hex::decode(signature.trim()) else {
            return false;
        };
        let Ok(mut mac) = Hmac::<Sha512>::new_from_slice(self.secret_key.as_bytes()) else {
            return false;
        };
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    }
}

/// Parse the processor's `paid_at`, e.g. `2024-03-01T10:15:30.123456Z`.
fn parse_paid_at(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    if let Ok(t) = NaiveDateTime::parse_from_str(raw.trim_end_matches('Z'), "%Y-%m-%dT%H:%M:%S%.f")
    {
        return Some(t.and_utc());
    }
    warn!(paid_at = raw, "Unparseable paid_at from processor");
    None
}

/// Accept a JSON number or a numeric string; metadata round-trips through
/// dashboards that stringify values.
fn lenient_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: TryFrom<i64> + std::str::FromStr,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => {
            T::try_from(n).map_err(|_| de::Error::custom(format!("number {n} out of range")))
        }
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| de::Error::custom(format!("invalid number {s:?}"))),
    }
}
