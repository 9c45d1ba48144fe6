//! Ledger Service: construction sites, their journal photos, and the files
//! published to the client. Tokens carry the caller's email as subject, so the
//! upstream scopes every response to that client.

use super::forge::{CredentialForge, ForgeProfile};
use super::transport::{UpstreamAuth, UpstreamTransport};
use super::{CallClass, Gateway, path_segment};
use crate::config::LedgerConfig;
use crate::normalizer::envelope::unwrap_list;
use crate::normalizer::{CanonicalDocument, CanonicalSite, documents, sites};
use std::sync::Arc;

#[derive(Clone)]
pub struct LedgerClient {
    gateway: Gateway,
    forge: CredentialForge,
}

impl LedgerClient {
    pub fn new(config: &LedgerConfig, transport: Arc<dyn UpstreamTransport>) -> Self {
        Self {
            gateway: Gateway::new("ledger", &config.base_url, transport),
            forge: CredentialForge::new(ForgeProfile::caller("ledger", &config.jwt_secret)),
        }
    }

    fn auth(&self, email: &str) -> Option<UpstreamAuth> {
        self.forge.forge(email).map(UpstreamAuth::Bearer)
    }

    pub async fn list_sites(&self, email: &str) -> Vec<CanonicalSite> {
        let Some(auth) = self.auth(email) else {
            return Vec::new();
        };

        match self.gateway.get_json("/api/sites", auth, &[], CallClass::Read).await {
            Ok(body) => unwrap_list(&body, &["sites", "data"])
                .iter()
                .filter_map(sites::site)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Site detail with before/after photos. Missing entries still yield the
    /// site without photos.
    pub async fn get_site(&self, email: &str, id: &str) -> Option<CanonicalSite> {
        let id = path_segment(id)?;
        let auth = self.auth(email)?;

        let detail_path = format!("/api/sites/{id}");
        let entries_path = format!("/api/sites/{id}/entries");
        let (detail, entries) = futures::join!(
            self.gateway
                .get_json(&detail_path, auth.clone(), &[], CallClass::Read),
            self.gateway
                .get_json(&entries_path, auth, &[], CallClass::Read),
        );

        let detail = detail.ok()?;
        // some deployments wrap the record as {"site": {...}}
        let record = detail.get("site").unwrap_or(&detail);
        let mut site = sites::site(record)?;
        if let Ok(entries) = entries {
            sites::attach_photos(&mut site, &entries);
        }
        Some(site)
    }

    pub async fn list_documents(&self, email: &str) -> Vec<CanonicalDocument> {
        let Some(auth) = self.auth(email) else {
            return Vec::new();
        };

        match self
            .gateway
            .get_json("/api/client/documents", auth, &[], CallClass::Read)
            .await
        {
            Ok(body) => unwrap_list(&body, &["documents", "data"])
                .iter()
                .filter_map(documents::ledger_document)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// A single visible document of the caller, looked up in their listing.
    pub async fn find_document(&self, email: &str, id: &str) -> Option<CanonicalDocument> {
        self.list_documents(email)
            .await
            .into_iter()
            .find(|doc| doc.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectors::transport::stub::StubTransport;
    use crate::normalizer::SiteStatus;
    use serde_json::json;

    fn client(secret: &str, transport: Arc<StubTransport>) -> LedgerClient {
        LedgerClient::new(
            &LedgerConfig {
                base_url: "https://ledger.test/".to_string(),
                jwt_secret: secret.to_string(),
            },
            transport,
        )
    }

    #[tokio::test]
    async fn test_empty_secret_skips_network() {
        let transport = Arc::new(StubTransport::new().json(200, json!([{"id": "s1"}])));
        let ledger = client("", transport.clone());

        assert!(ledger.list_sites("a@b.fr").await.is_empty());
        assert!(ledger.list_documents("a@b.fr").await.is_empty());
        assert!(ledger.get_site("a@b.fr", "s1").await.is_none());
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn test_list_sites_sends_bearer_and_normalizes() {
        let transport = Arc::new(StubTransport::new().json(
            200,
            json!({"items": [{"_id": "s1", "name": "Roof", "status": "TERMINE"}, {"name": "no id"}]}),
        ));
        let ledger = client("secret", transport.clone());

        let sites = ledger.list_sites("a@b.fr").await;
        assert_eq!(sites.len(), 1);
        assert_eq!(sites[0].status, SiteStatus::Done);

        let request = transport.request(0);
        assert_eq!(request.url, "https://ledger.test/api/sites");
        assert_eq!(request.timeout, CallClass::Read.timeout());
        assert!(matches!(request.auth, UpstreamAuth::Bearer(_)));
    }

    #[tokio::test]
    async fn test_failures_degrade_to_empty() {
        let transport = Arc::new(
            StubTransport::new()
                .json(500, json!({"error": "boom"}))
                .fail()
                .bytes(200, "text/html", b"<html>not json</html>"),
        );
        let ledger = client("secret", transport.clone());

        assert!(ledger.list_sites("a@b.fr").await.is_empty());
        assert!(ledger.list_documents("a@b.fr").await.is_empty());
        assert!(ledger.list_sites("a@b.fr").await.is_empty());
        assert_eq!(transport.calls(), 3);
    }

    #[tokio::test]
    async fn test_site_detail_survives_missing_entries() {
        let transport = Arc::new(
            StubTransport::new()
                .json(200, json!({"site": {"id": "s1", "name": "Roof"}}))
                .json(404, json!({})),
        );
        let ledger = client("secret", transport);

        let site = ledger.get_site("a@b.fr", "s1").await.unwrap();
        assert_eq!(site.label, "Roof");
        assert!(site.photos_before.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_id_is_rejected_locally() {
        let transport = Arc::new(StubTransport::new());
        let ledger = client("secret", transport.clone());
        assert!(ledger.get_site("a@b.fr", "../admin").await.is_none());
        assert_eq!(transport.calls(), 0);
    }
}
