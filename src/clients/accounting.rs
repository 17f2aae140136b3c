//! # Accounting Gateway Client
//!
//! HTTP client for the accounting platform's master data and invoice
//! endpoints. Lookups return `None` when the platform has no matching
//! record; creates return the created record or a gateway error carrying
//! the upstream status and body.
//!
//! Authentication uses client credentials; the issued bearer token lives
//! in an explicit [`TokenCache`] owned by this client (single in-flight
//! refresh, no process-wide state).

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::clients::token::{CachedToken, TokenCache};
use crate::config::AccountingGatewayConfig;
use crate::error::{ReconError, Result};

const GATEWAY: &str = "accounting";

/// Boundary for the accounting platform
#[async_trait]
pub trait AccountingGateway: Send + Sync {
    async fn match_document_type(
        &self,
        prefix: &str,
        series: &str,
    ) -> Result<Option<DocumentTypeRecord>>;

    async fn match_cost_center(&self, name: &str) -> Result<Option<CostCenterRecord>>;

    async fn find_contact_by_identification(
        &self,
        identification: &str,
    ) -> Result<Option<ContactRecord>>;

    async fn create_contact(&self, payload: &ContactPayload) -> Result<ContactRecord>;

    async fn find_item_by_code(&self, code: &str) -> Result<Option<ItemRecord>>;

    async fn create_item(&self, payload: &ItemPayload) -> Result<ItemRecord>;

    async fn find_payment_method(
        &self,
        prefix: &str,
        name: &str,
    ) -> Result<Option<PaymentMethodRecord>>;

    async fn create_invoice(&self, payload: &serde_json::Value) -> Result<serde_json::Value>;
}

/// reqwest-backed accounting gateway client
pub struct AccountingApiClient {
    config: AccountingGatewayConfig,
    client: Client,
    token_cache: TokenCache,
}

impl AccountingApiClient {
    pub fn new(config: AccountingGatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))?;

        let token_cache = TokenCache::new(config.token_refresh_margin_seconds);

        Ok(Self {
            config,
            client,
            token_cache,
        })
    }

    async fn request_token(&self) -> Result<CachedToken> {
        let endpoint = format!("{}/v1/auth/token", self.config.base_url);

        let response = self
            .client
            .post(&endpoint)
            .json(&TokenRequest {
                client_id: self.config.client_id.clone(),
                client_secret: self.config.client_secret.clone(),
            })
            .send()
            .await
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReconError::auth(
                GATEWAY,
                format!("token request rejected (HTTP {}): {body}", status.as_u16()),
            ));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))?;

        debug!(expires_in = token.expires_in, "Obtained accounting access token");

        Ok(CachedToken {
            access_token: token.access_token,
            expires_at: chrono::Utc::now() + chrono::Duration::seconds(token.expires_in),
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> Result<reqwest::Response> {
        let token = self
            .token_cache
            .access_token(|| self.request_token())
            .await?;

        let endpoint = format!("{}{path}", self.config.base_url);
        let mut request = self
            .client
            .request(method, &endpoint)
            .bearer_auth(token)
            .query(query);

        if let Some(body) = body {
            request = request.json(body);
        }

        request
            .send()
            .await
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))
    }

    /// Run a list lookup and surface the first match, if any
    async fn lookup_first<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Option<T>> {
        let response = self.send(Method::GET, path, query, None).await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReconError::gateway(GATEWAY, status.as_u16(), body));
        }

        let page: ListResponse<T> = response
            .json()
            .await
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))?;

        Ok(page.results.into_iter().next())
    }

    /// Run a create and decode the created record
    async fn create<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let response = self.send(Method::POST, path, &[], Some(&body)).await?;

        let status = response.status();
        if !status.is_success() {
            let upstream = response.text().await.unwrap_or_default();
            return Err(ReconError::gateway(GATEWAY, status.as_u16(), upstream));
        }

        response
            .json()
            .await
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))
    }
}

#[async_trait]
impl AccountingGateway for AccountingApiClient {
    #[instrument(skip(self))]
    async fn match_document_type(
        &self,
        prefix: &str,
        series: &str,
    ) -> Result<Option<DocumentTypeRecord>> {
        self.lookup_first(
            "/v1/document-types",
            &[("prefix", prefix), ("series", series)],
        )
        .await
    }

    #[instrument(skip(self))]
    async fn match_cost_center(&self, name: &str) -> Result<Option<CostCenterRecord>> {
        self.lookup_first("/v1/cost-centers", &[("name", name)]).await
    }

    #[instrument(skip(self))]
    async fn find_contact_by_identification(
        &self,
        identification: &str,
    ) -> Result<Option<ContactRecord>> {
        self.lookup_first("/v1/contacts", &[("identification", identification)])
            .await
    }

    #[instrument(skip(self, payload), fields(identification = %payload.identification))]
    async fn create_contact(&self, payload: &ContactPayload) -> Result<ContactRecord> {
        self.create("/v1/contacts", serde_json::to_value(payload)?).await
    }

    #[instrument(skip(self))]
    async fn find_item_by_code(&self, code: &str) -> Result<Option<ItemRecord>> {
        self.lookup_first("/v1/items", &[("code", code)]).await
    }

    #[instrument(skip(self, payload), fields(code = %payload.code))]
    async fn create_item(&self, payload: &ItemPayload) -> Result<ItemRecord> {
        self.create("/v1/items", serde_json::to_value(payload)?).await
    }

    #[instrument(skip(self))]
    async fn find_payment_method(
        &self,
        prefix: &str,
        name: &str,
    ) -> Result<Option<PaymentMethodRecord>> {
        self.lookup_first(
            "/v1/payment-methods",
            &[("prefix", prefix), ("name", name)],
        )
        .await
    }

    #[instrument(skip(self, payload))]
    async fn create_invoice(&self, payload: &serde_json::Value) -> Result<serde_json::Value> {
        self.create("/v1/invoices", payload.clone()).await
    }
}

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TokenRequest {
    client_id: String,
    client_secret: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    access_token: String,
    /// Lifetime in seconds
    expires_in: i64,
}

#[derive(Deserialize)]
struct ListResponse<T> {
    results: Vec<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentTypeRecord {
    pub id: String,
    pub prefix: String,
    pub series: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostCenterRecord {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactRecord {
    pub id: String,
    pub identification: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemRecord {
    pub id: String,
    pub code: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentMethodRecord {
    pub id: String,
    pub name: String,
}

/// Contact creation body, shaped from the POS contact record
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPayload {
    pub kind: String,
    pub identification: String,
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Item creation body, shaped from a POS line item
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPayload {
    pub code: String,
    pub description: String,
    pub unit_price: f64,
}
