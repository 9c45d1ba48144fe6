//! Rust structs that represent database table mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. Enumerations are stored as TEXT and converted through
//! their `Display`/`FromStr` implementations; JSON array columns are decoded
//! when a row is turned into its domain model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ClientUser {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub linked_external_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ClientUser {
    /// A user who has never filled in their profile is still onboarding.
    pub fn is_new(&self) -> bool {
        self.name.as_deref().map(str::trim).unwrap_or_default().is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 120, message = "Name must be between 1-120 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 6, max = 30, message = "Phone must be between 6-30 characters"))]
    pub phone: Option<String>,
}

/// What a magic-link token may be redeemed for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenPurpose {
    Login,
    Reset,
}

impl std::fmt::Display for TokenPurpose {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TokenPurpose::Login => write!(f, "LOGIN"),
            TokenPurpose::Reset => write!(f, "RESET"),
        }
    }
}

/// The parts of a stored token that redemption needs.
#[derive(Debug, Clone, FromRow)]
pub struct MagicLinkToken {
    pub email: String,
    pub expires_at: DateTime<Utc>,
    pub used_at: Option<DateTime<Utc>>,
}

impl MagicLinkToken {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

#[derive(Debug, Clone)]
pub struct CreateMagicLinkToken {
    pub token: String,
    pub email: String,
    pub purpose: TokenPurpose,
    pub expires_at: DateTime<Utc>,
    pub ip: String,
    pub user_agent: String,
}

/// Support ticket lifecycle. Transitions are driven by staff.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketStatus {
    New,
    InProgress,
    WaitingCustomer,
    Closed,
}

impl TicketStatus {
    /// Whether staff may move a ticket from `self` to `next`.
    pub fn can_transition_to(self, next: TicketStatus) -> bool {
        use TicketStatus::*;
        match (self, next) {
            (a, b) if a == b => true,
            (Closed, _) => false,
            (_, Closed) => true,
            (New, InProgress) => true,
            (New | InProgress, WaitingCustomer) => true,
            (WaitingCustomer, InProgress) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketStatus::New => write!(f, "NEW"),
            TicketStatus::InProgress => write!(f, "IN_PROGRESS"),
            TicketStatus::WaitingCustomer => write!(f, "WAITING_CUSTOMER"),
            TicketStatus::Closed => write!(f, "CLOSED"),
        }
    }
}

impl std::str::FromStr for TicketStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NEW" => Ok(TicketStatus::New),
            "IN_PROGRESS" => Ok(TicketStatus::InProgress),
            "WAITING_CUSTOMER" => Ok(TicketStatus::WaitingCustomer),
            "CLOSED" => Ok(TicketStatus::Closed),
            _ => Err(format!("Invalid ticket status: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TicketResolution {
    Covered,
    NotCovered,
}

impl std::fmt::Display for TicketResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TicketResolution::Covered => write!(f, "COVERED"),
            TicketResolution::NotCovered => write!(f, "NOT_COVERED"),
        }
    }
}

impl std::str::FromStr for TicketResolution {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "COVERED" => Ok(TicketResolution::Covered),
            "NOT_COVERED" => Ok(TicketResolution::NotCovered),
            _ => Err(format!("Invalid ticket resolution: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TicketMessage {
    pub body: String,
    pub from_client: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupportTicket {
    pub id: String,
    pub client_id: String,
    pub subject: String,
    pub description: String,
    pub site_id: Option<String>,
    pub status: TicketStatus,
    pub resolution: Option<TicketResolution>,
    pub attachment_paths: Vec<String>,
    pub messages: Vec<TicketMessage>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Row shape for listings, without the description and thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSummary {
    pub id: String,
    pub subject: String,
    pub status: TicketStatus,
    pub resolution: Option<TicketResolution>,
    pub created_at: DateTime<Utc>,
}

impl From<SupportTicket> for TicketSummary {
    fn from(ticket: SupportTicket) -> Self {
        TicketSummary {
            id: ticket.id,
            subject: ticket.subject,
            status: ticket.status,
            resolution: ticket.resolution,
            created_at: ticket.created_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub(crate) struct SupportTicketRow {
    pub id: String,
    pub client_id: String,
    pub subject: String,
    pub description: String,
    pub site_id: Option<String>,
    pub status: String,
    pub resolution: Option<String>,
    pub attachment_paths: String,
    pub messages: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<SupportTicketRow> for SupportTicket {
    type Error = anyhow::Error;

    fn try_from(row: SupportTicketRow) -> Result<Self, Self::Error> {
        Ok(SupportTicket {
            id: row.id,
            client_id: row.client_id,
            subject: row.subject,
            description: row.description,
            site_id: row.site_id,
            status: row.status.parse().map_err(anyhow::Error::msg)?,
            resolution: row
                .resolution
                .map(|r| r.parse())
                .transpose()
                .map_err(anyhow::Error::msg)?,
            attachment_paths: serde_json::from_str(&row.attachment_paths)?,
            messages: serde_json::from_str(&row.messages)?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub client_id: String,
    pub subject: String,
    pub description: String,
    pub site_id: Option<String>,
    pub attachment_paths: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTicketRequest {
    #[validate(length(min = 3, max = 200, message = "Subject must be between 3-200 characters"))]
    pub subject: String,
    #[validate(length(
        min = 10,
        max = 5000,
        message = "Description must be between 10-5000 characters"
    ))]
    pub description: String,
    pub site_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TicketMessageRequest {
    #[validate(length(min = 1, max = 2000, message = "Message must be between 1-2000 characters"))]
    pub body: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffTicketUpdate {
    pub status: Option<TicketStatus>,
    pub resolution: Option<TicketResolution>,
}
