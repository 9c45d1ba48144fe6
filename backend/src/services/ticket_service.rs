//! Support ticket workflow.
//!
//! Clients open tickets, read them and add messages; only their own tickets
//! are ever visible to them. Status and resolution are staff-only.

use crate::database::models::{
    ClientUser, CreateTicket, CreateTicketRequest, StaffTicketUpdate, SupportTicket,
    TicketMessage, TicketMessageRequest, TicketStatus, TicketSummary,
};
use crate::errors::{ServiceError, ServiceResult};
use crate::repositories::ticket_repository::TicketRepository;
use crate::services::email_service::{self, EmailService};
use crate::services::file_service::{AttachmentStore, IncomingFile};
use crate::services::rate_limit::{HOURLY, RateLimitStore};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

/// Limits applied to new tickets.
#[derive(Debug, Clone, Copy)]
pub struct TicketLimits {
    pub max_files: usize,
    pub per_hour: u32,
}

pub struct TicketService<'a> {
    pool: &'a SqlitePool,
    limiter: &'a dyn RateLimitStore,
    attachments: &'a AttachmentStore,
    mailer: Option<&'a EmailService>,
    staff_email: Option<&'a str>,
    limits: TicketLimits,
}

impl<'a> TicketService<'a> {
    pub fn new(
        pool: &'a SqlitePool,
        limiter: &'a dyn RateLimitStore,
        attachments: &'a AttachmentStore,
        mailer: Option<&'a EmailService>,
        staff_email: Option<&'a str>,
        limits: TicketLimits,
    ) -> Self {
        Self {
            pool,
            limiter,
            attachments,
            mailer,
            staff_email,
            limits,
        }
    }

    /// Opens a ticket for `user`.
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - Invalid subject or description, or too many files. Nothing is written.
    /// - More than the hourly quota of tickets for this user
    pub async fn create_ticket(
        &self,
        user: &ClientUser,
        request: CreateTicketRequest,
        files: Vec<IncomingFile>,
    ) -> ServiceResult<SupportTicket> {
        let request = CreateTicketRequest {
            subject: request.subject.trim().to_string(),
            description: request.description.trim().to_string(),
            site_id: request
                .site_id
                .map(|id| id.trim().to_string())
                .filter(|id| !id.is_empty()),
        };
        request.validate().map_err(ServiceError::from_validation_errors)?;

        if files.len() > self.limits.max_files {
            return Err(ServiceError::validation(format!(
                "At most {} files can be attached",
                self.limits.max_files
            )));
        }

        if !self
            .limiter
            .allow(&format!("ticket:{}", user.id), HOURLY, self.limits.per_hour)
            .await
        {
            return Err(ServiceError::rate_limited(
                "Too many tickets created. Please try again later.",
            ));
        }

        let attachment_paths = self.attachments.save_all(&files).await?;

        let created = TicketRepository::new(self.pool)
            .create_ticket(CreateTicket {
                client_id: user.id.clone(),
                subject: request.subject,
                description: request.description,
                site_id: request.site_id,
                attachment_paths: attachment_paths.clone(),
            })
            .await;
        let ticket = match created {
            Ok(ticket) => ticket,
            Err(e) => {
                self.attachments.remove_all(&attachment_paths).await;
                return Err(e.into());
            }
        };

        tracing::info!("Ticket {} opened by {}", ticket.id, user.id);
        self.notify_staff(user, &ticket).await;

        Ok(ticket)
    }

    async fn notify_staff(&self, user: &ClientUser, ticket: &SupportTicket) {
        let Some(staff_email) = self.staff_email else {
            return;
        };

        let email = email_service::staff_ticket_email(
            staff_email,
            &user.email,
            &ticket.id,
            &ticket.subject,
            &ticket.description,
            ticket.attachment_paths.len(),
        );
        EmailService::deliver(self.mailer, email).await;
    }

    pub async fn list_tickets(&self, client_id: &str) -> ServiceResult<Vec<TicketSummary>> {
        let tickets = TicketRepository::new(self.pool).list_by_client(client_id).await?;
        Ok(tickets.into_iter().map(TicketSummary::from).collect())
    }

    pub async fn get_ticket(&self, client_id: &str, id: &str) -> ServiceResult<SupportTicket> {
        TicketRepository::new(self.pool)
            .get_ticket(id, Some(client_id))
            .await?
            .ok_or_else(|| ServiceError::not_found("Ticket", id))
    }

    pub async fn add_client_message(
        &self,
        client_id: &str,
        id: &str,
        request: TicketMessageRequest,
    ) -> ServiceResult<SupportTicket> {
        self.append(Some(client_id), id, request, true).await
    }

    pub async fn add_staff_message(
        &self,
        id: &str,
        request: TicketMessageRequest,
    ) -> ServiceResult<SupportTicket> {
        self.append(None, id, request, false).await
    }

    async fn append(
        &self,
        owner: Option<&str>,
        id: &str,
        request: TicketMessageRequest,
        from_client: bool,
    ) -> ServiceResult<SupportTicket> {
        let request = TicketMessageRequest {
            body: request.body.trim().to_string(),
        };
        request.validate().map_err(ServiceError::from_validation_errors)?;

        let repo = TicketRepository::new(self.pool);
        let message = TicketMessage {
            body: request.body,
            from_client,
            created_at: Utc::now(),
        };
        if !repo.append_message(id, owner, &message).await? {
            return Err(ServiceError::not_found("Ticket", id));
        }

        repo.get_ticket(id, owner)
            .await?
            .ok_or_else(|| ServiceError::not_found("Ticket", id))
    }

    /// Applies a staff status and/or resolution change.
    ///
    /// # Errors
    /// Returns `ServiceError` for:
    /// - A transition the workflow does not allow
    /// - A resolution on a ticket that is not closed
    pub async fn staff_update(
        &self,
        id: &str,
        update: StaffTicketUpdate,
    ) -> ServiceResult<SupportTicket> {
        let repo = TicketRepository::new(self.pool);
        let ticket = repo
            .get_ticket(id, None)
            .await?
            .ok_or_else(|| ServiceError::not_found("Ticket", id))?;

        let status = update.status.unwrap_or(ticket.status);
        if !ticket.status.can_transition_to(status) {
            return Err(ServiceError::validation(format!(
                "Cannot move ticket from {} to {}",
                ticket.status, status
            )));
        }

        let resolution = update.resolution.or(ticket.resolution);
        if resolution.is_some() && status != TicketStatus::Closed {
            return Err(ServiceError::validation(
                "A resolution can only be set on a closed ticket",
            ));
        }

        repo.update_status(id, status, resolution).await?;
        tracing::info!("Ticket {} moved to {}", id, status);

        repo.get_ticket(id, None)
            .await?
            .ok_or_else(|| ServiceError::not_found("Ticket", id))
    }
}
