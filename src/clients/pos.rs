//! # POS Export Gateway Client
//!
//! HTTP client for the point-of-sale export system: authenticates against
//! the login endpoint, fetches decoded document batches for a kind and
//! date window, and fetches full contact records during the
//! contact-creation fallback.
//!
//! The authenticate response carries the export base address; every
//! subsequent call goes to that address with the issued bearer token.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use crate::config::PosGatewayConfig;
use crate::error::{ReconError, Result};
use crate::models::document::{DocumentKind, PosContactDetail, PosDocument};

const GATEWAY: &str = "pos";

/// Date window an export fetch covers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DateWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Authenticated session against the POS export gateway
#[derive(Debug, Clone)]
pub struct PosSession {
    pub token: String,
    pub base_address: String,
}

/// Boundary for the POS export gateway
#[async_trait]
pub trait PosGateway: Send + Sync {
    /// Authenticate and obtain the export base address
    async fn authenticate(&self) -> Result<PosSession>;

    /// Fetch the decoded document batch for a kind and window
    async fn fetch_export(&self, kind: DocumentKind, window: &DateWindow)
        -> Result<Vec<PosDocument>>;

    /// Fetch a full contact record; used only during contact creation
    async fn fetch_contact_detail(
        &self,
        kind: DocumentKind,
        identification: &str,
    ) -> Result<PosContactDetail>;
}

/// reqwest-backed POS gateway client
pub struct PosApiClient {
    config: PosGatewayConfig,
    client: Client,
}

impl PosApiClient {
    pub fn new(config: PosGatewayConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))?;

        Ok(Self { config, client })
    }

    async fn login(&self) -> Result<PosSession> {
        let endpoint = format!("{}/api/auth", self.config.base_url);

        let response = self
            .client
            .post(&endpoint)
            .json(&LoginRequest {
                username: self.config.username.clone(),
                api_key: self.config.api_key.clone(),
            })
            .send()
            .await
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ReconError::auth(GATEWAY, "invalid credentials"));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReconError::gateway(GATEWAY, status.as_u16(), body));
        }

        let login: LoginResponse = response
            .json()
            .await
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))?;

        let base_address = match login.base_address {
            Some(address) if !address.is_empty() => address,
            _ => {
                return Err(ReconError::auth(
                    GATEWAY,
                    "authenticate response did not include a base address",
                ))
            }
        };

        debug!(base_address = %base_address, "Authenticated against POS gateway");

        Ok(PosSession {
            token: login.token,
            base_address,
        })
    }
}

#[async_trait]
impl PosGateway for PosApiClient {
    async fn authenticate(&self) -> Result<PosSession> {
        self.login().await
    }

    #[instrument(skip(self), fields(kind = %kind))]
    async fn fetch_export(
        &self,
        kind: DocumentKind,
        window: &DateWindow,
    ) -> Result<Vec<PosDocument>> {
        let session = self.login().await?;

        let endpoint = format!("{}/api/exports", session.base_address);
        let response = self
            .client
            .get(&endpoint)
            .bearer_auth(&session.token)
            .query(&[
                ("documentKindId", kind.export_kind_id().to_string()),
                ("startDate", window.start.to_rfc3339()),
                ("endDate", window.end.to_rfc3339()),
            ])
            .send()
            .await
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReconError::gateway(GATEWAY, status.as_u16(), body));
        }

        let export: ExportResponse = response
            .json()
            .await
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))?;

        debug!(documents = export.documents.len(), "Fetched POS export batch");

        Ok(export.documents)
    }

    #[instrument(skip(self), fields(kind = %kind, identification = identification))]
    async fn fetch_contact_detail(
        &self,
        kind: DocumentKind,
        identification: &str,
    ) -> Result<PosContactDetail> {
        let session = self.login().await?;

        let endpoint = format!("{}/api/contacts", session.base_address);
        let response = self
            .client
            .get(&endpoint)
            .bearer_auth(&session.token)
            .query(&[
                ("kind", kind.as_str()),
                ("identification", identification),
            ])
            .send()
            .await
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ReconError::gateway(GATEWAY, status.as_u16(), body));
        }

        response
            .json()
            .await
            .map_err(|e| ReconError::network(GATEWAY, e.to_string()))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest {
    username: String,
    api_key: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoginResponse {
    token: String,
    base_address: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExportResponse {
    documents: Vec<PosDocument>,
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn test_config(base_url: String) -> PosGatewayConfig {
        PosGatewayConfig {
            base_url,
            username: "exporter".to_string(),
            api_key: "secret".to_string(),
            timeout_ms: 5000,
        }
    }

    fn sample_window() -> DateWindow {
        DateWindow {
            start: "2025-05-01T00:00:00Z".parse().unwrap(),
            end: "2025-05-02T00:00:00Z".parse().unwrap(),
        }
    }

    async fn mount_login(server: &MockServer, base_address: serde_json::Value) {
        Mock::given(method("POST"))
            .and(path("/api/auth"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "token": "pos-token",
                "baseAddress": base_address
            })))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn authenticate_returns_session() {
        let server = MockServer::start().await;
        mount_login(&server, serde_json::json!(server.uri())).await;

        let client = PosApiClient::new(test_config(server.uri())).unwrap();
        let session = client.authenticate().await.unwrap();

        assert_eq!(session.token, "pos-token");
        assert_eq!(session.base_address, server.uri());
    }

    #[tokio::test]
    async fn authenticate_fails_without_base_address() {
        let server = MockServer::start().await;
        mount_login(&server, serde_json::Value::Null).await;

        let client = PosApiClient::new(test_config(server.uri())).unwrap();
        let err = client.authenticate().await.unwrap_err();

        assert!(matches!(err, ReconError::Auth { gateway: "pos", .. }));
    }

    #[tokio::test]
    async fn authenticate_fails_with_invalid_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = PosApiClient::new(test_config(server.uri())).unwrap();
        let err = client.authenticate().await.unwrap_err();

        assert!(matches!(err, ReconError::Auth { gateway: "pos", .. }));
    }

    #[tokio::test]
    async fn fetch_export_returns_decoded_documents() {
        let server = MockServer::start().await;
        mount_login(&server, serde_json::json!(server.uri())).await;

        Mock::given(method("GET"))
            .and(path("/api/exports"))
            .and(header("Authorization", "Bearer pos-token"))
            .and(query_param("documentKindId", "2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "documents": [{
                    "documentKind": "Factura de venta",
                    "documentNumber": "FV-1",
                    "date": "2025-05-01",
                    "storeName": "Sede Centro",
                    "prefix": "FV",
                    "series": "A",
                    "counterparty": {
                        "kind": "customer",
                        "identification": "900123456-1",
                        "name": "Cliente Uno"
                    },
                    "items": [],
                    "payments": [],
                    "total": 0.0
                }]
            })))
            .mount(&server)
            .await;

        let client = PosApiClient::new(test_config(server.uri())).unwrap();
        let documents = client
            .fetch_export(DocumentKind::Sales, &sample_window())
            .await
            .unwrap();

        assert_eq!(documents.len(), 1);
        assert_eq!(documents[0].document_number, "FV-1");
    }

    #[tokio::test]
    async fn fetch_export_surfaces_upstream_error() {
        let server = MockServer::start().await;
        mount_login(&server, serde_json::json!(server.uri())).await;

        Mock::given(method("GET"))
            .and(path("/api/exports"))
            .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
            .mount(&server)
            .await;

        let client = PosApiClient::new(test_config(server.uri())).unwrap();
        let err = client
            .fetch_export(DocumentKind::Purchases, &sample_window())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReconError::Gateway { gateway: "pos", status: 502, .. }
        ));
    }

    #[tokio::test]
    async fn fetch_contact_detail_decodes_record() {
        let server = MockServer::start().await;
        mount_login(&server, serde_json::json!(server.uri())).await;

        Mock::given(method("GET"))
            .and(path("/api/contacts"))
            .and(query_param("identification", "900123456-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "kind": "supplier",
                "identification": "900123456-1",
                "name": "Proveedor Uno",
                "address": "Cra 7 # 12-34",
                "phone": null,
                "email": "compras@proveedor.co"
            })))
            .mount(&server)
            .await;

        let client = PosApiClient::new(test_config(server.uri())).unwrap();
        let contact = client
            .fetch_contact_detail(DocumentKind::Purchases, "900123456-1")
            .await
            .unwrap();

        assert_eq!(contact.name, "Proveedor Uno");
        assert_eq!(contact.email.as_deref(), Some("compras@proveedor.co"));
    }
}
