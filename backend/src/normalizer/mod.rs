//! Maps raw upstream records into the portal's canonical schema.
//!
//! The canonical types below are the only shapes the HTTP layer ever returns
//! for upstream data. They are produced here and never persisted.

pub mod contracts;
pub mod documents;
pub mod envelope;
pub mod sites;
pub mod status;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub use status::{BillingCycle, ContractStatus, DocumentStatus, DocumentType, SiteStatus};

/// Upstream a document came from. Together with the id it forms the
/// document's identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentSource {
    Ledger,
    Quoting,
}

impl fmt::Display for DocumentSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSource::Ledger => write!(f, "ledger"),
            DocumentSource::Quoting => write!(f, "quoting"),
        }
    }
}

impl FromStr for DocumentSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ledger" => Ok(DocumentSource::Ledger),
            "quoting" => Ok(DocumentSource::Quoting),
            other => Err(format!("Unknown document source: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentAction {
    Sign,
    Pay,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanonicalDocument {
    pub id: String,
    pub source: DocumentSource,
    #[serde(rename = "type")]
    pub doc_type: DocumentType,
    pub label: String,
    pub number: Option<String>,
    /// `YYYY-MM-DD`, or empty when the upstream sent no date.
    pub date: String,
    pub status: String,
    pub amount: Option<f64>,
    pub url: String,
    pub sign_url: Option<String>,
    pub pay_url: Option<String>,
    pub actions: Vec<DocumentAction>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CanonicalSite {
    pub id: String,
    pub label: String,
    pub status: SiteStatus,
    pub status_label: String,
    pub address: String,
    pub start_date: String,
    pub end_date: String,
    pub photos_before: Vec<String>,
    pub photos_after: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceContract {
    pub id: String,
    pub contract_number: String,
    pub pack: String,
    pub billing_cycle: BillingCycle,
    pub price: Option<f64>,
    pub status: ContractStatus,
    pub status_label: String,
    pub next_billing_date: String,
    pub start_date: String,
    pub invoices: Vec<ContractInvoice>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ContractInvoice {
    pub id: String,
    pub amount: Option<f64>,
    pub paid: bool,
    pub due_date: String,
    pub paid_at: String,
    pub pay_url: Option<String>,
}
