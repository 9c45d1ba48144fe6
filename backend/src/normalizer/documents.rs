use super::envelope::{date, id, is_set, number, text};
use super::status::{DocumentStatus, DocumentType, fallback_label};
use super::{CanonicalDocument, DocumentAction, DocumentSource};
use serde_json::Value;

const TYPE_KEYS: &[&str] = &["doc_type", "document_type", "type", "kind", "category"];
const DATE_KEYS: &[&str] = &["date", "issue_date", "issued_at", "created_at"];
const AMOUNT_KEYS: &[&str] = &["total_ttc", "amount_ttc", "total", "amount"];
const NUMBER_KEYS: &[&str] = &["number", "reference", "ref"];
const REMOVED_KEYS: &[&str] = &["archived_at", "deleted_at"];

/// Maps a Quoting Service document. Returns `None` for drafts, archived or
/// deleted records and anything without an id.
pub fn quoting_document(value: &Value, public_url: &str) -> Option<CanonicalDocument> {
    let id = id(value)?;
    let raw_status = text(value, &["status"]).unwrap_or_default();
    let status = DocumentStatus::parse(&raw_status);
    if !status.is_client_visible() || is_set(value, REMOVED_KEYS) {
        return None;
    }

    let doc_type = DocumentType::infer(&text(value, TYPE_KEYS).unwrap_or_default());
    let actions = actions_for(&doc_type, status);
    let number = text(value, NUMBER_KEYS);

    let sign_url = actions
        .contains(&DocumentAction::Sign)
        .then(|| text(value, &["public_token"]))
        .flatten()
        .map(|token| sign_url(public_url, &token));
    let pay_url = actions
        .contains(&DocumentAction::Pay)
        .then(|| text(value, &["payment_link", "payment_url"]))
        .flatten();

    Some(CanonicalDocument {
        label: label(value, number.as_deref(), &doc_type),
        url: format!("/api/v1/documents/quoting/{id}/pdf"),
        id,
        source: DocumentSource::Quoting,
        number,
        date: date(value, DATE_KEYS),
        status: status.label(&doc_type, &raw_status),
        amount: number_field(value),
        sign_url,
        pay_url,
        actions,
        doc_type,
    })
}

/// Maps a Ledger Service document. Ledger records without a status are
/// published files and stay visible.
pub fn ledger_document(value: &Value) -> Option<CanonicalDocument> {
    let id = id(value)?;
    if is_set(value, REMOVED_KEYS) {
        return None;
    }

    let doc_type = DocumentType::infer(&text(value, TYPE_KEYS).unwrap_or_default());
    let status = match text(value, &["status"]) {
        Some(raw) => {
            let parsed = DocumentStatus::parse(&raw);
            if !parsed.is_client_visible() {
                return None;
            }
            parsed.label(&doc_type, &raw)
        }
        None => "Available".to_string(),
    };
    let number = text(value, NUMBER_KEYS);

    Some(CanonicalDocument {
        label: label(value, number.as_deref(), &doc_type),
        url: text(value, &["url", "download_url", "file_url"]).unwrap_or_default(),
        id,
        source: DocumentSource::Ledger,
        number,
        date: date(value, DATE_KEYS),
        status,
        amount: number_field(value),
        sign_url: None,
        pay_url: None,
        actions: Vec::new(),
        doc_type,
    })
}

/// Client actions offered for a document of `doc_type` in `status`.
pub fn actions_for(doc_type: &DocumentType, status: DocumentStatus) -> Vec<DocumentAction> {
    match (doc_type, status) {
        (DocumentType::Quote, DocumentStatus::Sent) => vec![DocumentAction::Sign],
        (
            DocumentType::Invoice,
            DocumentStatus::Sent | DocumentStatus::Invoiced | DocumentStatus::PartiallyPaid,
        ) => vec![DocumentAction::Pay],
        _ => Vec::new(),
    }
}

pub fn sign_url(public_url: &str, token: &str) -> String {
    format!("{}/sign/{}", public_url.trim_end_matches('/'), token)
}

fn number_field(value: &Value) -> Option<f64> {
    number(value, AMOUNT_KEYS)
}

fn label(value: &Value, number: Option<&str>, doc_type: &DocumentType) -> String {
    if let Some(title) = text(value, &["title", "label", "name"]) {
        return title;
    }

    let kind = match doc_type {
        DocumentType::Quote => "Quote".to_string(),
        DocumentType::Invoice => "Invoice".to_string(),
        DocumentType::CreditNote => "Credit note".to_string(),
        DocumentType::Attestation => "Attestation".to_string(),
        DocumentType::Other(raw) => fallback_label(raw),
    };

    match number {
        Some(number) => format!("{kind} {number}"),
        None => kind,
    }
}
