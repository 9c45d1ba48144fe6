//! Closed vocabularies for upstream status and type strings.
//!
//! Upstreams send free text in mixed case and two languages. Each enum parses
//! case-insensitively into its known variants plus one fallback, and the
//! fallback keeps the raw text for display.

use serde::{Serialize, Serializer};

/// Display text for a value no enum recognised.
pub fn fallback_label(raw: &str) -> String {
    let raw = raw.trim();
    let mut chars = raw.chars();
    match chars.next() {
        None => "—".to_string(),
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
    }
}

fn canonical(raw: &str) -> String {
    raw.trim().to_lowercase().replace(['-', ' '], "_")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteStatus {
    Done,
    InProgress,
    Planned,
    Suspended,
    Unknown,
}

impl SiteStatus {
    pub fn parse(raw: &str) -> Self {
        match canonical(raw).as_str() {
            "done" | "completed" | "termine" | "terminé" => SiteStatus::Done,
            "in_progress" | "en_cours" | "ongoing" | "started" => SiteStatus::InProgress,
            "planned" | "planifie" | "planifié" | "scheduled" | "a_venir" => SiteStatus::Planned,
            "suspended" | "suspendu" | "paused" | "on_hold" => SiteStatus::Suspended,
            _ => SiteStatus::Unknown,
        }
    }

    pub fn label(self, raw: &str) -> String {
        match self {
            SiteStatus::Done => "Completed".to_string(),
            SiteStatus::InProgress => "In progress".to_string(),
            SiteStatus::Planned => "Planned".to_string(),
            SiteStatus::Suspended => "Suspended".to_string(),
            SiteStatus::Unknown => fallback_label(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentStatus {
    Draft,
    Sent,
    Accepted,
    Refused,
    Invoiced,
    Paid,
    PartiallyPaid,
    Cancelled,
    Other,
}

impl DocumentStatus {
    pub fn parse(raw: &str) -> Self {
        match canonical(raw).as_str() {
            "draft" | "brouillon" => DocumentStatus::Draft,
            "sent" | "envoye" | "envoyé" => DocumentStatus::Sent,
            "accepted" | "signed" | "accepte" | "accepté" | "signe" | "signé" => {
                DocumentStatus::Accepted
            }
            "refused" | "rejected" | "refuse" | "refusé" => DocumentStatus::Refused,
            "invoiced" | "facture" | "facturé" => DocumentStatus::Invoiced,
            "paid" | "paye" | "payé" | "payee" | "payée" => DocumentStatus::Paid,
            "partially_paid" | "partial" | "partiellement_paye" | "partiellement_payé" => {
                DocumentStatus::PartiallyPaid
            }
            "cancelled" | "canceled" | "annule" | "annulé" => DocumentStatus::Cancelled,
            _ => DocumentStatus::Other,
        }
    }

    /// Statuses a client is allowed to see.
    pub fn is_client_visible(self) -> bool {
        match self {
            DocumentStatus::Sent
            | DocumentStatus::Accepted
            | DocumentStatus::Refused
            | DocumentStatus::Invoiced
            | DocumentStatus::Paid
            | DocumentStatus::PartiallyPaid => true,
            DocumentStatus::Draft | DocumentStatus::Cancelled | DocumentStatus::Other => false,
        }
    }

    /// A sent document waits on the client: a signature for a quote, a
    /// payment for an invoice.
    pub fn label(self, doc_type: &DocumentType, raw: &str) -> String {
        match self {
            DocumentStatus::Draft => "Draft".to_string(),
            DocumentStatus::Sent => match doc_type {
                DocumentType::Quote => "Awaiting signature".to_string(),
                DocumentType::Invoice => "Awaiting payment".to_string(),
                _ => "Sent".to_string(),
            },
            DocumentStatus::Accepted => "Accepted".to_string(),
            DocumentStatus::Refused => "Declined".to_string(),
            DocumentStatus::Invoiced => "Invoiced".to_string(),
            DocumentStatus::Paid => "Paid".to_string(),
            DocumentStatus::PartiallyPaid => "Partially paid".to_string(),
            DocumentStatus::Cancelled => "Cancelled".to_string(),
            DocumentStatus::Other => fallback_label(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    Active,
    Pending,
    PendingCancellation,
    Cancelled,
    Suspended,
    Expired,
    Other,
}

impl ContractStatus {
    pub fn parse(raw: &str) -> Self {
        match canonical(raw).as_str() {
            "active" | "actif" => ContractStatus::Active,
            "pending" | "en_attente" | "awaiting_payment" => ContractStatus::Pending,
            "pending_cancellation" | "cancellation_requested" | "resiliation_demandee" => {
                ContractStatus::PendingCancellation
            }
            "cancelled" | "canceled" | "resilie" | "résilié" => ContractStatus::Cancelled,
            "suspended" | "suspendu" => ContractStatus::Suspended,
            "expired" | "expire" | "expiré" => ContractStatus::Expired,
            _ => ContractStatus::Other,
        }
    }

    pub fn label(self, raw: &str) -> String {
        match self {
            ContractStatus::Active => "Active".to_string(),
            ContractStatus::Pending => "Pending".to_string(),
            ContractStatus::PendingCancellation => "Cancellation requested".to_string(),
            ContractStatus::Cancelled => "Cancelled".to_string(),
            ContractStatus::Suspended => "Suspended".to_string(),
            ContractStatus::Expired => "Expired".to_string(),
            ContractStatus::Other => fallback_label(raw),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    Yearly,
    Other,
}

impl BillingCycle {
    pub fn parse(raw: &str) -> Self {
        match canonical(raw).as_str() {
            "monthly" | "mensuel" | "month" => BillingCycle::Monthly,
            "quarterly" | "trimestriel" | "quarter" => BillingCycle::Quarterly,
            "yearly" | "annual" | "annuel" | "year" => BillingCycle::Yearly,
            _ => BillingCycle::Other,
        }
    }
}

/// Kind of a billing document, inferred from whatever the upstream calls it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentType {
    Quote,
    Invoice,
    CreditNote,
    Attestation,
    Other(String),
}

impl DocumentType {
    /// Keyword match in priority order. Credit notes are checked before
    /// invoices so "credit invoice" lands on the former.
    pub fn infer(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        let has = |needles: &[&str]| needles.iter().any(|needle| lowered.contains(needle));

        if has(&["devis", "estimate", "quote"]) {
            DocumentType::Quote
        } else if has(&["avoir", "credit"]) {
            DocumentType::CreditNote
        } else if has(&["fact", "invoice"]) {
            DocumentType::Invoice
        } else if has(&["attest", "certif"]) {
            DocumentType::Attestation
        } else if lowered.is_empty() {
            DocumentType::Other("document".to_string())
        } else {
            DocumentType::Other(lowered)
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            DocumentType::Quote => "quote",
            DocumentType::Invoice => "invoice",
            DocumentType::CreditNote => "credit-note",
            DocumentType::Attestation => "attestation",
            DocumentType::Other(raw) => raw,
        }
    }
}

impl Serialize for DocumentType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
