//! Quoting Service: quotes, invoices and maintenance contracts.
//!
//! Admin routes authenticate with a token forged for a fixed service identity,
//! so ownership is enforced here: the caller's email is resolved to a client
//! id and every record is checked against it. The client-portal routes take
//! an `X-API-Key` and the caller's email instead.

use super::forge::{CredentialForge, ForgeProfile};
use super::transport::{UpstreamAuth, UpstreamTransport};
use super::{CallClass, Download, Gateway, path_segment};
use crate::config::QuotingConfig;
use crate::normalizer::documents::{self, actions_for, sign_url};
use crate::normalizer::envelope::{id as record_id, text, unwrap_list};
use crate::normalizer::{
    CanonicalDocument, DocumentAction, DocumentStatus, DocumentType, MaintenanceContract,
    contracts,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

/// Result of a contract action forwarded to the upstream.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ActionOutcome {
    pub accepted: bool,
    pub checkout_url: Option<String>,
}

impl ActionOutcome {
    fn from_response(body: &Value) -> Self {
        Self {
            accepted: true,
            checkout_url: text(body, &["checkout_url", "url", "payment_link"]),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SubscribeRequest {
    pub pack: String,
    pub billing_cycle: String,
    pub site_id: Option<String>,
}

#[derive(Clone)]
pub struct QuotingClient {
    gateway: Gateway,
    forge: CredentialForge,
    api_key: String,
    public_url: String,
}

impl QuotingClient {
    pub fn new(config: &QuotingConfig, transport: Arc<dyn UpstreamTransport>) -> Self {
        Self {
            gateway: Gateway::new("quoting", &config.base_url, transport),
            forge: CredentialForge::new(ForgeProfile::fixed(
                "quoting",
                &config.jwt_secret,
                &config.admin_user_id,
            )),
            api_key: config.client_portal_api_key.trim().to_string(),
            public_url: config.public_url.trim_end_matches('/').to_string(),
        }
    }

    fn admin_auth(&self) -> Option<UpstreamAuth> {
        self.forge.forge("").map(UpstreamAuth::Bearer)
    }

    fn portal_auth(&self) -> Option<UpstreamAuth> {
        if self.api_key.is_empty() {
            tracing::debug!("quoting client-portal API key not configured, skipping call");
            return None;
        }
        Some(UpstreamAuth::ApiKey(self.api_key.clone()))
    }

    /// Looks the caller up in the client directory. Only an exact,
    /// case-insensitive email match counts.
    pub async fn resolve_client_id(&self, email: &str) -> Option<String> {
        let auth = self.admin_auth()?;
        let body = self
            .gateway
            .get_json("/api/clients", auth, &[("search", email)], CallClass::Lookup)
            .await
            .ok()?;

        unwrap_list(&body, &["clients", "data"])
            .iter()
            .find(|client| {
                text(client, &["email"]).is_some_and(|candidate| candidate.eq_ignore_ascii_case(email))
            })
            .and_then(record_id)
    }

    pub async fn list_documents(&self, email: &str) -> Vec<CanonicalDocument> {
        let Some(client_id) = self.resolve_client_id(email).await else {
            return Vec::new();
        };
        self.list_documents_for(&client_id).await
    }

    pub async fn list_documents_for(&self, client_id: &str) -> Vec<CanonicalDocument> {
        let Some(auth) = self.admin_auth() else {
            return Vec::new();
        };

        match self
            .gateway
            .get_json(
                "/api/documents",
                auth,
                &[("client_id", client_id)],
                CallClass::Read,
            )
            .await
        {
            Ok(body) => unwrap_list(&body, &["documents", "data"])
                .iter()
                .filter(|raw| owned_by(raw, client_id))
                .filter_map(|raw| documents::quoting_document(raw, &self.public_url))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Raw record of a document the caller owns and may see.
    async fn owned_document(&self, email: &str, id: &str) -> Option<Value> {
        let id = path_segment(id)?;
        let client_id = self.resolve_client_id(email).await?;
        let auth = self.admin_auth()?;

        let body = self
            .gateway
            .get_json(&format!("/api/documents/{id}"), auth, &[], CallClass::Read)
            .await
            .ok()?;
        let record = body.get("document").cloned().unwrap_or(body);

        if !owned_by(&record, &client_id) {
            tracing::warn!("Document {} does not belong to {}", id, email);
            return None;
        }
        documents::quoting_document(&record, &self.public_url)?;
        Some(record)
    }

    pub async fn get_document(&self, email: &str, id: &str) -> Option<CanonicalDocument> {
        let record = self.owned_document(email, id).await?;
        documents::quoting_document(&record, &self.public_url)
    }

    /// HTML rendition of a document, for in-browser viewing.
    pub async fn document_preview(&self, email: &str, id: &str) -> Option<String> {
        self.owned_document(email, id).await?;
        let id = path_segment(id)?;
        let auth = self.admin_auth()?;

        let download = self
            .gateway
            .get_bytes(&format!("/api/documents/{id}/preview"), auth, &[], CallClass::Read)
            .await
            .ok()?;

        let body = String::from_utf8_lossy(&download.bytes).into_owned();
        if download.content_type.contains("json") {
            let value: Value = serde_json::from_str(&body).ok()?;
            return text(&value, &["html", "content"]);
        }
        Some(body)
    }

    pub async fn document_pdf(&self, email: &str, id: &str) -> Option<Download> {
        self.owned_document(email, id).await?;
        let id = path_segment(id)?;
        let auth = self.admin_auth()?;

        self.gateway
            .get_bytes(&format!("/api/documents/{id}/pdf"), auth, &[], CallClass::Download)
            .await
            .ok()
    }

    /// Public signing URL of a quote awaiting signature, creating the public
    /// link on first use.
    pub async fn ensure_sign_url(&self, email: &str, id: &str) -> Option<String> {
        let record = self.owned_document(email, id).await?;
        if !allows(&record, DocumentAction::Sign) {
            return None;
        }
        if let Some(token) = text(&record, &["public_token"]) {
            return Some(sign_url(&self.public_url, &token));
        }

        let id = path_segment(id)?;
        let auth = self.admin_auth()?;
        let body = self
            .gateway
            .post_json(
                &format!("/api/documents/{id}/public-link"),
                auth,
                json!({}),
                CallClass::Action,
            )
            .await
            .ok()?;

        text(&body, &["token", "public_token"]).map(|token| sign_url(&self.public_url, &token))
    }

    /// Payment URL of an unpaid invoice, creating the payment session on first use.
    pub async fn ensure_pay_url(&self, email: &str, id: &str) -> Option<String> {
        let record = self.owned_document(email, id).await?;
        if !allows(&record, DocumentAction::Pay) {
            return None;
        }
        if let Some(url) = text(&record, &["payment_link", "payment_url"]) {
            return Some(url);
        }

        let id = path_segment(id)?;
        let auth = self.admin_auth()?;
        let body = self
            .gateway
            .post_json(
                &format!("/api/documents/{id}/payment-link"),
                auth,
                json!({}),
                CallClass::Action,
            )
            .await
            .ok()?;

        text(&body, &["url", "payment_link"])
    }

    /// Maintenance contracts of the caller. Uses the client-portal route when
    /// an API key is configured, the admin route otherwise.
    pub async fn list_contracts(&self, email: &str) -> Vec<MaintenanceContract> {
        let body = match self.portal_auth() {
            Some(auth) => {
                self.gateway
                    .get_json(
                        "/api/client-portal/contracts",
                        auth,
                        &[("email", email)],
                        CallClass::Read,
                    )
                    .await
            }
            None => {
                let Some(client_id) = self.resolve_client_id(email).await else {
                    return Vec::new();
                };
                let Some(auth) = self.admin_auth() else {
                    return Vec::new();
                };
                self.gateway
                    .get_json(
                        "/api/maintenance/contracts",
                        auth,
                        &[("client_id", client_id.as_str())],
                        CallClass::Read,
                    )
                    .await
            }
        };

        match body {
            Ok(body) => unwrap_list(&body, &["contracts", "data"])
                .iter()
                .filter_map(contracts::contract)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    pub async fn get_contract(&self, email: &str, id: &str) -> Option<MaintenanceContract> {
        self.list_contracts(email)
            .await
            .into_iter()
            .find(|contract| contract.id == id)
    }

    pub async fn contract_pdf(&self, email: &str, id: &str) -> Option<Download> {
        let contract = self.get_contract(email, id).await?;
        let id = path_segment(&contract.id)?;

        match self.portal_auth() {
            Some(auth) => self
                .gateway
                .get_bytes(
                    &format!("/api/client-portal/contracts/{id}/pdf"),
                    auth,
                    &[("email", email)],
                    CallClass::Download,
                )
                .await
                .ok(),
            None => self
                .gateway
                .get_bytes(
                    &format!("/api/maintenance/contracts/{id}/pdf"),
                    self.admin_auth()?,
                    &[],
                    CallClass::Download,
                )
                .await
                .ok(),
        }
    }

    pub async fn cancel_contract(&self, email: &str, id: &str, reason: &str) -> ActionOutcome {
        let Some(id) = path_segment(id) else {
            return ActionOutcome::default();
        };
        self.portal_action(
            &format!("/api/client-portal/contracts/{id}/cancel"),
            json!({"email": email, "reason": reason}),
        )
        .await
    }

    pub async fn upgrade_contract(&self, email: &str, id: &str, pack: &str) -> ActionOutcome {
        let Some(id) = path_segment(id) else {
            return ActionOutcome::default();
        };
        self.portal_action(
            &format!("/api/client-portal/contracts/{id}/upgrade"),
            json!({"email": email, "pack": pack}),
        )
        .await
    }

    pub async fn subscribe_contract(&self, email: &str, request: &SubscribeRequest) -> ActionOutcome {
        self.portal_action(
            "/api/client-portal/contracts/subscribe",
            json!({
                "email": email,
                "pack": request.pack,
                "billing_cycle": request.billing_cycle,
                "site_id": request.site_id,
            }),
        )
        .await
    }

    /// Payment URL of one of the caller's contract invoices.
    pub async fn ensure_invoice_pay_url(&self, email: &str, invoice_id: &str) -> Option<String> {
        let invoice = self
            .list_contracts(email)
            .await
            .into_iter()
            .flat_map(|contract| contract.invoices)
            .find(|invoice| invoice.id == invoice_id)?;

        if invoice.paid {
            return None;
        }
        if invoice.pay_url.is_some() {
            return invoice.pay_url;
        }

        let id = path_segment(&invoice.id)?;
        let outcome = self
            .portal_action(
                &format!("/api/client-portal/invoices/{id}/payment-link"),
                json!({"email": email}),
            )
            .await;
        outcome.checkout_url
    }

    async fn portal_action(&self, path: &str, body: Value) -> ActionOutcome {
        let Some(auth) = self.portal_auth() else {
            return ActionOutcome::default();
        };

        match self
            .gateway
            .post_json(path, auth, body, CallClass::Action)
            .await
        {
            Ok(response) => ActionOutcome::from_response(&response),
            Err(_) => ActionOutcome::default(),
        }
    }
}

/// Client id a raw document is attached to, flat or nested.
fn owner_of(record: &Value) -> Option<String> {
    text(record, &["client_id", "customer_id"]).or_else(|| {
        ["client", "customer"]
            .iter()
            .find_map(|key| record.get(key).filter(|v| v.is_object()).and_then(record_id))
    })
}

/// Records without an owner are never shown, listed or fetched by id.
fn owned_by(record: &Value, client_id: &str) -> bool {
    owner_of(record).as_deref() == Some(client_id)
}

fn allows(record: &Value, action: DocumentAction) -> bool {
    let doc_type = DocumentType::infer(
        &text(record, &["doc_type", "document_type", "type", "kind", "category"]).unwrap_or_default(),
    );
    let status = DocumentStatus::parse(&text(record, &["status"]).unwrap_or_default());
    actions_for(&doc_type, status).contains(&action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::transport::Method;
    use crate::connectors::transport::stub::StubTransport;

    const EMAIL: &str = "client@example.com";

    fn config(secret: &str, api_key: &str) -> QuotingConfig {
        QuotingConfig {
            base_url: "https://quotes.test".to_string(),
            public_url: "https://quotes.public".to_string(),
            jwt_secret: secret.to_string(),
            admin_user_id: "admin-1".to_string(),
            client_portal_api_key: api_key.to_string(),
        }
    }

    fn directory() -> Value {
        json!([
            {"_id": "c-other", "email": "client@example.com.evil"},
            {"_id": "c-1", "email": "Client@Example.com"}
        ])
    }

    #[tokio::test]
    async fn test_resolve_requires_exact_match() {
        let transport = Arc::new(
            StubTransport::new()
                .json(200, directory())
                .json(200, json!({"items": [{"_id": "x", "email": "someone@else.com"}]})),
        );
        let quoting = QuotingClient::new(&config("s", ""), transport.clone());

        assert_eq!(quoting.resolve_client_id(EMAIL).await.as_deref(), Some("c-1"));
        assert_eq!(quoting.resolve_client_id(EMAIL).await, None);

        let request = transport.request(0);
        assert_eq!(request.url, "https://quotes.test/api/clients");
        assert_eq!(request.query, vec![("search".to_string(), EMAIL.to_string())]);
        assert_eq!(request.timeout, CallClass::Lookup.timeout());
    }

    #[tokio::test]
    async fn test_missing_secret_makes_no_calls() {
        let transport = Arc::new(StubTransport::new());
        let quoting = QuotingClient::new(&config("", ""), transport.clone());

        assert!(quoting.list_documents(EMAIL).await.is_empty());
        assert!(quoting.list_contracts(EMAIL).await.is_empty());
        assert!(quoting.ensure_sign_url(EMAIL, "d1").await.is_none());
        assert!(!quoting.cancel_contract(EMAIL, "c1", "moving").await.accepted);
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_list_documents_filters_hidden_and_foreign() {
        let transport = Arc::new(StubTransport::new().json(200, directory()).json(
            200,
            json!({"documents": [
                {"_id": "d1", "client_id": "c-1", "type": "quote", "status": "sent"},
                {"_id": "d2", "client_id": "c-1", "type": "quote", "status": "draft"},
                {"_id": "d3", "client_id": "c-9", "type": "invoice", "status": "sent"},
                {"_id": "d4", "type": "invoice", "status": "sent"}
            ]}),
        ));
        let quoting = QuotingClient::new(&config("s", ""), transport.clone());

        let docs = quoting.list_documents(EMAIL).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].id, "d1");
        assert_eq!(
            transport.request(1).query,
            vec![("client_id".to_string(), "c-1".to_string())]
        );
    }

    #[tokio::test]
    async fn test_sign_url_reuses_existing_token() {
        let transport = Arc::new(StubTransport::new().json(200, directory()).json(
            200,
            json!({"_id": "d1", "client_id": "c-1", "type": "devis", "status": "SENT", "public_token": "abc"}),
        ));
        let quoting = QuotingClient::new(&config("s", ""), transport.clone());

        let url = quoting.ensure_sign_url(EMAIL, "d1").await;
        assert_eq!(url.as_deref(), Some("https://quotes.public/sign/abc"));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_sign_url_created_when_missing() {
        let transport = Arc::new(
            StubTransport::new()
                .json(200, directory())
                .json(200, json!({"_id": "d1", "client_id": "c-1", "type": "quote", "status": "sent"}))
                .json(201, json!({"token": "fresh"})),
        );
        let quoting = QuotingClient::new(&config("s", ""), transport.clone());

        let url = quoting.ensure_sign_url(EMAIL, "d1").await;
        assert_eq!(url.as_deref(), Some("https://quotes.public/sign/fresh"));
        let create = transport.request(2);
        assert_eq!(create.url, "https://quotes.test/api/documents/d1/public-link");
        assert_eq!(create.timeout, CallClass::Action.timeout());
    }

    #[tokio::test]
    async fn test_foreign_document_is_not_found() {
        let transport = Arc::new(StubTransport::new().json(200, directory()).json(
            200,
            json!({"_id": "d1", "client_id": "c-2", "type": "invoice", "status": "sent"}),
        ));
        let quoting = QuotingClient::new(&config("s", ""), transport.clone());

        assert!(quoting.ensure_pay_url(EMAIL, "d1").await.is_none());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_pay_url_only_for_payable_invoices() {
        let transport = Arc::new(StubTransport::new().json(200, directory()).json(
            200,
            json!({"_id": "d1", "client_id": "c-1", "type": "invoice", "status": "paid"}),
        ));
        let quoting = QuotingClient::new(&config("s", ""), transport.clone());

        assert!(quoting.ensure_pay_url(EMAIL, "d1").await.is_none());
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_contracts_use_api_key_when_configured() {
        let transport = Arc::new(StubTransport::new().json(
            200,
            json!({"contracts": [{"_id": "m1", "status": "active", "pack": "Basic"}]}),
        ));
        let quoting = QuotingClient::new(&config("", "portal-key"), transport.clone());

        let contracts = quoting.list_contracts(EMAIL).await;
        assert_eq!(contracts.len(), 1);

        let request = transport.request(0);
        assert_eq!(request.url, "https://quotes.test/api/client-portal/contracts");
        assert!(matches!(request.auth, UpstreamAuth::ApiKey(ref key) if key == "portal-key"));
    }

    #[tokio::test]
    async fn test_contracts_fall_back_to_admin_route() {
        let transport = Arc::new(
            StubTransport::new()
                .json(200, directory())
                .json(200, json!([{"_id": "m1", "status": "active"}])),
        );
        let quoting = QuotingClient::new(&config("s", ""), transport.clone());

        assert_eq!(quoting.list_contracts(EMAIL).await.len(), 1);
        assert_eq!(
            transport.request(1).url,
            "https://quotes.test/api/maintenance/contracts"
        );
    }

    #[tokio::test]
    async fn test_invoice_pay_url_creates_session_for_own_invoice() {
        let transport = Arc::new(
            StubTransport::new()
                .json(
                    200,
                    json!([{"_id": "m1", "invoices": [{"id": "i1", "amount": 10, "status": "open"}]}]),
                )
                .json(200, json!({"url": "https://pay/i1"})),
        );
        let quoting = QuotingClient::new(&config("", "portal-key"), transport.clone());

        let url = quoting.ensure_invoice_pay_url(EMAIL, "i1").await;
        assert_eq!(url.as_deref(), Some("https://pay/i1"));
        assert_eq!(
            transport.request(1).url,
            "https://quotes.test/api/client-portal/invoices/i1/payment-link"
        );
    }

    #[tokio::test]
    async fn test_unknown_invoice_is_refused() {
        let transport = Arc::new(StubTransport::new().json(200, json!([])));
        let quoting = QuotingClient::new(&config("", "portal-key"), transport.clone());

        assert!(quoting.ensure_invoice_pay_url(EMAIL, "i9").await.is_none());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_failed_action_is_not_accepted() {
        let transport = Arc::new(StubTransport::new().json(409, json!({"error": "already cancelled"})));
        let quoting = QuotingClient::new(&config("", "portal-key"), transport);

        let outcome = quoting.cancel_contract(EMAIL, "m1", "moving").await;
        assert!(!outcome.accepted);
    }

    #[tokio::test]
    async fn test_unowned_document_is_not_found() {
        let transport = Arc::new(StubTransport::new().json(200, directory()).json(
            200,
            json!({"_id": "d4", "type": "invoice", "status": "sent"}),
        ));
        let quoting = QuotingClient::new(&config("s", ""), transport.clone());

        assert!(quoting.get_document(EMAIL, "d4").await.is_none());
        assert_eq!(transport.calls(), 2);
    }

    fn sent_invoice(extra: Value) -> Value {
        let mut record = json!({"_id": "d1", "client_id": "c-1", "type": "invoice", "status": "sent"});
        if let (Some(record), Some(extra)) = (record.as_object_mut(), extra.as_object()) {
            record.extend(extra.clone());
        }
        record
    }

    #[tokio::test]
    async fn test_pay_url_reuses_existing_link() {
        let transport = Arc::new(
            StubTransport::new()
                .json(200, directory())
                .json(200, sent_invoice(json!({"payment_link": "https://pay/d1"}))),
        );
        let quoting = QuotingClient::new(&config("s", ""), transport.clone());

        let url = quoting.ensure_pay_url(EMAIL, "d1").await;
        assert_eq!(url.as_deref(), Some("https://pay/d1"));
        assert_eq!(transport.calls(), 2);
    }

    #[tokio::test]
    async fn test_pay_url_created_when_missing() {
        let transport = Arc::new(
            StubTransport::new()
                .json(200, directory())
                .json(200, sent_invoice(json!({})))
                .json(201, json!({"url": "https://pay/fresh"})),
        );
        let quoting = QuotingClient::new(&config("s", ""), transport.clone());

        let url = quoting.ensure_pay_url(EMAIL, "d1").await;
        assert_eq!(url.as_deref(), Some("https://pay/fresh"));
        assert_eq!(transport.calls(), 3);

        let create = transport.request(2);
        assert_eq!(create.method, Method::Post);
        assert_eq!(create.url, "https://quotes.test/api/documents/d1/payment-link");
        assert!(matches!(create.auth, UpstreamAuth::Bearer(_)));
        assert_eq!(create.timeout, CallClass::Action.timeout());
    }

    #[tokio::test]
    async fn test_document_pdf_uses_download_timeout() {
        let transport = Arc::new(
            StubTransport::new()
                .json(200, directory())
                .json(200, sent_invoice(json!({})))
                .bytes(200, "application/pdf", b"%PDF-1.7"),
        );
        let quoting = QuotingClient::new(&config("s", ""), transport.clone());

        let download = quoting.document_pdf(EMAIL, "d1").await.unwrap();
        assert_eq!(download.bytes, b"%PDF-1.7");
        assert_eq!(download.content_type, "application/pdf");
        assert_eq!(transport.calls(), 3);

        let fetch = transport.request(2);
        assert_eq!(fetch.url, "https://quotes.test/api/documents/d1/pdf");
        assert!(matches!(fetch.auth, UpstreamAuth::Bearer(_)));
        assert_eq!(fetch.timeout, CallClass::Download.timeout());
    }

    #[tokio::test]
    async fn test_preview_unwraps_json_html() {
        let transport = Arc::new(
            StubTransport::new()
                .json(200, directory())
                .json(200, sent_invoice(json!({})))
                .json(200, json!({"html": "<h1>Invoice</h1>"}))
                .json(200, directory())
                .json(200, sent_invoice(json!({})))
                .bytes(200, "text/html; charset=utf-8", b"<p>raw</p>"),
        );
        let quoting = QuotingClient::new(&config("s", ""), transport.clone());

        let html = quoting.document_preview(EMAIL, "d1").await;
        assert_eq!(html.as_deref(), Some("<h1>Invoice</h1>"));
        let preview = transport.request(2);
        assert_eq!(preview.url, "https://quotes.test/api/documents/d1/preview");
        assert_eq!(preview.timeout, CallClass::Read.timeout());

        let html = quoting.document_preview(EMAIL, "d1").await;
        assert_eq!(html.as_deref(), Some("<p>raw</p>"));
        assert_eq!(transport.calls(), 6);
    }

    #[tokio::test]
    async fn test_contract_pdf_through_portal_route() {
        let transport = Arc::new(
            StubTransport::new()
                .json(200, json!({"contracts": [{"_id": "m1", "status": "active"}]}))
                .bytes(200, "application/pdf", b"%PDF"),
        );
        let quoting = QuotingClient::new(&config("", "portal-key"), transport.clone());

        assert!(quoting.contract_pdf(EMAIL, "m1").await.is_some());
        assert_eq!(transport.calls(), 2);

        let fetch = transport.request(1);
        assert_eq!(fetch.url, "https://quotes.test/api/client-portal/contracts/m1/pdf");
        assert_eq!(fetch.query, vec![("email".to_string(), EMAIL.to_string())]);
        assert!(matches!(fetch.auth, UpstreamAuth::ApiKey(ref key) if key == "portal-key"));
        assert_eq!(fetch.timeout, CallClass::Download.timeout());
    }

    #[tokio::test]
    async fn test_foreign_contract_pdf_is_not_fetched() {
        let transport = Arc::new(StubTransport::new().json(200, json!({"contracts": []})));
        let quoting = QuotingClient::new(&config("", "portal-key"), transport.clone());

        assert!(quoting.contract_pdf(EMAIL, "m1").await.is_none());
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_upgrade_sends_email_and_pack() {
        let transport = Arc::new(
            StubTransport::new().json(200, json!({"checkout_url": "https://pay/upgrade"})),
        );
        let quoting = QuotingClient::new(&config("", "portal-key"), transport.clone());

        let outcome = quoting.upgrade_contract(EMAIL, "m1", "Premium").await;
        assert!(outcome.accepted);
        assert_eq!(outcome.checkout_url.as_deref(), Some("https://pay/upgrade"));
        assert_eq!(transport.calls(), 1);

        let request = transport.request(0);
        assert_eq!(request.method, Method::Post);
        assert_eq!(request.url, "https://quotes.test/api/client-portal/contracts/m1/upgrade");
        assert_eq!(request.body, Some(json!({"email": EMAIL, "pack": "Premium"})));
        assert!(matches!(request.auth, UpstreamAuth::ApiKey(_)));
        assert_eq!(request.timeout, CallClass::Action.timeout());
    }

    #[tokio::test]
    async fn test_subscribe_sends_full_request() {
        let transport = Arc::new(StubTransport::new().json(201, json!({})));
        let quoting = QuotingClient::new(&config("", "portal-key"), transport.clone());

        let request = SubscribeRequest {
            pack: "Basic".to_string(),
            billing_cycle: "yearly".to_string(),
            site_id: None,
        };
        let outcome = quoting.subscribe_contract(EMAIL, &request).await;
        assert!(outcome.accepted);
        assert!(outcome.checkout_url.is_none());

        let sent = transport.request(0);
        assert_eq!(sent.url, "https://quotes.test/api/client-portal/contracts/subscribe");
        assert_eq!(
            sent.body,
            Some(json!({
                "email": EMAIL,
                "pack": "Basic",
                "billing_cycle": "yearly",
                "site_id": null
            }))
        );
        assert_eq!(sent.timeout, CallClass::Action.timeout());
    }
}
