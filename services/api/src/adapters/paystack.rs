//! services/api/src/adapters/paystack.rs
//!
//! The Paystack implementation of the `PaymentGateway` port. Talks to the
//! hosted-checkout REST API with `reqwest`; amounts are always in kobo.

use async_trait::async_trait;
use consultancy_core::domain::{
    GatewayTransaction, GatewayTransactionStatus, HostedCheckout, PaymentRequest,
};
use consultancy_core::ports::{PaymentGateway, PortError, PortResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, error};

/// A client for the Paystack transaction API.
#[derive(Clone)]
pub struct PaystackAdapter {
    client: reqwest::Client,
    base_url: String,
    secret_key: Option<String>,
}

impl PaystackAdapter {
    /// Without a secret key every call fails, so the rest of the site still runs.
    pub fn new(base_url: impl Into<String>, secret_key: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.into(),
            secret_key,
        }
    }

    fn secret_key(&self) -> PortResult<&str> {
        self.secret_key
            .as_deref()
            .ok_or_else(|| PortError::Unexpected("payment gateway is not configured".to_string()))
    }
}

//=========================================================================================
// Wire Types
//=========================================================================================

#[derive(Serialize)]
struct InitializeBody<'a> {
    email: &'a str,
    amount: u64,
    reference: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    callback_url: Option<&'a str>,
    metadata: HashMap<&'a str, &'a str>,
}

/// Paystack wraps every payload as `{status, message, data}`.
#[derive(Deserialize)]
struct ApiResponse<T> {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Deserialize)]
struct InitializeData {
    authorization_url: String,
    reference: String,
}

#[derive(Deserialize)]
struct VerifyData {
    status: String,
    amount: u64,
    reference: String,
    #[serde(default)]
    gateway_response: Option<String>,
}

fn transaction_status(raw: &str) -> GatewayTransactionStatus {
    match raw {
        "success" => GatewayTransactionStatus::Success,
        "abandoned" => GatewayTransactionStatus::Abandoned,
        "failed" | "reversed" => GatewayTransactionStatus::Failed,
        _ => GatewayTransactionStatus::Pending,
    }
}

/// Unwraps the `data` of a successful Paystack response.
async fn read_data<T: for<'de> Deserialize<'de>>(response: reqwest::Response) -> PortResult<T> {
    let http_status = response.status();
    let body: ApiResponse<T> = response.json().await.map_err(|e| {
        error!("Unreadable Paystack response ({}): {}", http_status, e);
        PortError::Unexpected(format!("unreadable gateway response: {}", e))
    })?;
    let message = body.message.unwrap_or_else(|| http_status.to_string());
    match body.data {
        Some(data) if body.status && http_status.is_success() => Ok(data),
        _ => {
            error!("Paystack rejected the request ({}): {}", http_status, message);
            Err(PortError::Unexpected(message))
        }
    }
}

//=========================================================================================
// `PaymentGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl PaymentGateway for PaystackAdapter {
    async fn initialize(&self, request: &PaymentRequest) -> PortResult<HostedCheckout> {
        let body = InitializeBody {
            email: &request.email,
            amount: request.amount_kobo,
            reference: &request.reference,
            callback_url: request.callback_url.as_deref(),
            metadata: request
                .metadata
                .iter()
                .map(|(k, v)| (k.as_str(), v.as_str()))
                .collect(),
        };
        debug!("Initializing Paystack transaction {}", request.reference);

        let response = self
            .client
            .post(format!("{}/transaction/initialize", self.base_url))
            .bearer_auth(self.secret_key()?)
            .json(&body)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("gateway unreachable: {}", e)))?;

        let data: InitializeData = read_data(response).await?;
        Ok(HostedCheckout {
            authorization_url: data.authorization_url,
            reference: data.reference,
        })
    }

    async fn verify(&self, reference: &str) -> PortResult<GatewayTransaction> {
        debug!("Verifying Paystack transaction {}", reference);
        let response = self
            .client
            .get(format!("{}/transaction/verify/{}", self.base_url, reference))
            .bearer_auth(self.secret_key()?)
            .send()
            .await
            .map_err(|e| PortError::Unexpected(format!("gateway unreachable: {}", e)))?;

        let data: VerifyData = read_data(response).await?;
        Ok(GatewayTransaction {
            reference: data.reference,
            status: transaction_status(&data.status),
            amount_kobo: data.amount,
            gateway_response: data.gateway_response,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{bearer_token, body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request() -> PaymentRequest {
        PaymentRequest {
            email: "ada@example.com".to_string(),
            amount_kobo: 5_000_000,
            reference: "BK-123".to_string(),
            callback_url: Some("https://site.test/booking/success?bookingId=1".to_string()),
            metadata: vec![("booking_id".to_string(), "1".to_string())],
        }
    }

    #[tokio::test]
    async fn initialize_posts_amount_in_kobo() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .and(bearer_token("sk_test"))
            .and(body_partial_json(json!({
                "email": "ada@example.com",
                "amount": 5_000_000,
                "reference": "BK-123",
                "metadata": {"booking_id": "1"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Authorization URL created",
                "data": {
                    "authorization_url": "https://checkout.paystack.com/abc",
                    "access_code": "abc",
                    "reference": "BK-123"
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let adapter = PaystackAdapter::new(server.uri(), Some("sk_test".to_string()));
        let checkout = adapter.initialize(&request()).await.unwrap();
        assert_eq!(checkout.authorization_url, "https://checkout.paystack.com/abc");
        assert_eq!(checkout.reference, "BK-123");
    }

    #[tokio::test]
    async fn gateway_rejection_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/transaction/initialize"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "status": false,
                "message": "Invalid key"
            })))
            .mount(&server)
            .await;

        let adapter = PaystackAdapter::new(server.uri(), Some("sk_bad".to_string()));
        let err = adapter.initialize(&request()).await.unwrap_err();
        assert!(matches!(err, PortError::Unexpected(ref m) if m == "Invalid key"));
    }

    #[tokio::test]
    async fn verify_maps_transaction_state() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/BK-123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Verification successful",
                "data": {
                    "status": "success",
                    "amount": 5_000_000,
                    "reference": "BK-123",
                    "gateway_response": "Successful"
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/BK-456"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "data": {"status": "abandoned", "amount": 5_000_000, "reference": "BK-456"}
            })))
            .mount(&server)
            .await;

        let adapter = PaystackAdapter::new(server.uri(), Some("sk_test".to_string()));
        let paid = adapter.verify("BK-123").await.unwrap();
        assert_eq!(paid.status, GatewayTransactionStatus::Success);
        assert_eq!(paid.amount_kobo, 5_000_000);
        assert_eq!(paid.gateway_response.as_deref(), Some("Successful"));

        let abandoned = adapter.verify("BK-456").await.unwrap();
        assert_eq!(abandoned.status, GatewayTransactionStatus::Abandoned);
    }

    #[tokio::test]
    async fn missing_secret_key_fails_without_calling_out() {
        let adapter = PaystackAdapter::new("http://127.0.0.1:9", None);
        assert!(adapter.verify("BK-1").await.is_err());
        assert!(adapter.initialize(&request()).await.is_err());
    }
}
