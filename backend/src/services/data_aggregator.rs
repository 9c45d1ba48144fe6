//! Cross-service document listing.
//!
//! Both upstreams are queried concurrently. Either one failing only removes
//! its share of the listing.

use crate::connectors::ledger::LedgerClient;
use crate::connectors::quoting::QuotingClient;
use crate::database::models::ClientUser;
use crate::normalizer::{CanonicalDocument, DocumentSource};
use crate::repositories::user_repository::UserRepository;
use sqlx::SqlitePool;
use std::collections::HashSet;

pub struct DataAggregator<'a> {
    pool: &'a SqlitePool,
    ledger: &'a LedgerClient,
    quoting: &'a QuotingClient,
}

impl<'a> DataAggregator<'a> {
    pub fn new(pool: &'a SqlitePool, ledger: &'a LedgerClient, quoting: &'a QuotingClient) -> Self {
        Self {
            pool,
            ledger,
            quoting,
        }
    }

    /// Every document visible to `user`, newest first.
    pub async fn documents_for(&self, user: &ClientUser) -> Vec<CanonicalDocument> {
        let (ledger_docs, quoting_docs) = futures::join!(
            self.ledger.list_documents(&user.email),
            self.quoting_documents(user),
        );

        merge_documents(vec![ledger_docs, quoting_docs])
    }

    async fn quoting_documents(&self, user: &ClientUser) -> Vec<CanonicalDocument> {
        let Some(client_id) = self.quoting.resolve_client_id(&user.email).await else {
            return Vec::new();
        };

        if user.linked_external_id.as_deref() != Some(client_id.as_str()) {
            if let Err(e) = UserRepository::new(self.pool)
                .link_external_id(&user.id, &client_id)
                .await
            {
                tracing::warn!("Failed to link quoting client {} to {}: {}", client_id, user.id, e);
            }
        }

        self.quoting.list_documents_for(&client_id).await
    }
}

/// Concatenates `sources`, keeps the first record per `(source, id)` and sorts
/// by date, newest first. Records without a date sort last; ties keep their
/// input order.
pub fn merge_documents(sources: Vec<Vec<CanonicalDocument>>) -> Vec<CanonicalDocument> {
    let mut seen: HashSet<(DocumentSource, String)> = HashSet::new();
    let mut merged: Vec<CanonicalDocument> = sources
        .into_iter()
        .flatten()
        .filter(|doc| seen.insert((doc.source, doc.id.clone())))
        .collect();

    merged.sort_by(|a, b| b.date.cmp(&a.date));
    merged
}
