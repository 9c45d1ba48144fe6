//! Database repository for support tickets.
//!
//! Every client-facing query carries the owner id so that tickets of other
//! clients are indistinguishable from missing ones.

use crate::database::models::{
    CreateTicket, SupportTicket, SupportTicketRow, TicketMessage, TicketResolution, TicketStatus,
};
use anyhow::Result;
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;

const TICKET_COLUMNS: &str = "id, client_id, subject, description, site_id, status, resolution, \
                              attachment_paths, messages, created_at, updated_at";

pub struct TicketRepository<'a> {
    /// Shared SQLite connection pool
    pool: &'a SqlitePool,
}

impl<'a> TicketRepository<'a> {
    pub fn new(pool: &'a SqlitePool) -> Self {
        Self { pool }
    }

    /// Inserts a new ticket in the `NEW` state.
    pub async fn create_ticket(&self, ticket: CreateTicket) -> Result<SupportTicket> {
        let id = Uuid::now_v7().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO tickets
                (id, client_id, subject, description, site_id, status, attachment_paths, messages, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, '[]', ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&ticket.client_id)
        .bind(&ticket.subject)
        .bind(&ticket.description)
        .bind(&ticket.site_id)
        .bind(TicketStatus::New.to_string())
        .bind(serde_json::to_string(&ticket.attachment_paths)?)
        .bind(now)
        .bind(now)
        .execute(self.pool)
        .await?;

        self.get_ticket(&id, None)
            .await?
            .ok_or_else(|| anyhow::anyhow!("ticket {id} vanished after insert"))
    }

    /// Lists the tickets of one client, newest first.
    pub async fn list_by_client(&self, client_id: &str) -> Result<Vec<SupportTicket>> {
        let rows = sqlx::query_as::<_, SupportTicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE client_id = ? ORDER BY created_at DESC, id DESC"
        ))
        .bind(client_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(SupportTicket::try_from).collect()
    }

    /// Fetches a ticket, restricted to `owner` when given.
    pub async fn get_ticket(&self, id: &str, owner: Option<&str>) -> Result<Option<SupportTicket>> {
        let row = sqlx::query_as::<_, SupportTicketRow>(&format!(
            "SELECT {TICKET_COLUMNS} FROM tickets WHERE id = ? AND (? IS NULL OR client_id = ?)"
        ))
        .bind(id)
        .bind(owner)
        .bind(owner)
        .fetch_optional(self.pool)
        .await?;

        row.map(SupportTicket::try_from).transpose()
    }

    /// Appends a message to the thread in a single-row update.
    ///
    /// # Returns
    /// `false` when no ticket matched (absent, or not owned by `owner`)
    pub async fn append_message(
        &self,
        id: &str,
        owner: Option<&str>,
        message: &TicketMessage,
    ) -> Result<bool> {
        let rows = sqlx::query(
            r#"
            UPDATE tickets
            SET messages = json_insert(messages, '$[#]', json(?)),
                updated_at = ?
            WHERE id = ? AND (? IS NULL OR client_id = ?)
            "#,
        )
        .bind(serde_json::to_string(message)?)
        .bind(Utc::now())
        .bind(id)
        .bind(owner)
        .bind(owner)
        .execute(self.pool)
        .await?
        .rows_affected();

        Ok(rows == 1)
    }

    /// Overwrites status and resolution.
    pub async fn update_status(
        &self,
        id: &str,
        status: TicketStatus,
        resolution: Option<TicketResolution>,
    ) -> Result<bool> {
        let rows = sqlx::query(
            "UPDATE tickets SET status = ?, resolution = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status.to_string())
        .bind(resolution.map(|r| r.to_string()))
        .bind(Utc::now())
        .bind(id)
        .execute(self.pool)
        .await?
        .rows_affected();

        Ok(rows == 1)
    }
}
