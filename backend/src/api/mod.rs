//! Central module for organizing the application's main API endpoints.
//!
//! This module acts as a top-level container for the client-facing domains
//! (profile, sites, documents, maintenance, tickets) and the staff surface,
//! excluding core authentication routes which are handled separately.

pub mod common;
pub mod documents;
pub mod maintenance;
pub mod profile;
pub mod sites;
pub mod staff;
pub mod tickets;

use crate::config::Config;
use axum::Router;

/// Multipart overhead allowed on top of the attachments themselves.
const FORM_OVERHEAD_BYTES: usize = 1024 * 1024;

/// All `/api/v1` routes except authentication.
pub fn api_router(config: &Config) -> Router {
    let upload_limit = config.max_file_size_bytes() * config.max_ticket_files + FORM_OVERHEAD_BYTES;

    Router::new()
        .merge(profile::routes::profile_router())
        .merge(sites::routes::sites_router())
        .merge(documents::routes::documents_router())
        .merge(maintenance::routes::maintenance_router())
        .merge(tickets::routes::tickets_router(upload_limit))
        .merge(staff::routes::staff_router())
}
