//! Module for core business logic services.
//!
//! This module encapsulates services that perform specific business operations
//! and orchestrate interactions between different parts of the application,
//! such as the support ticket workflow or aggregating upstream documents.

pub mod data_aggregator;
pub mod email_service;
pub mod file_service;
pub mod rate_limit;
pub mod ticket_service;
pub mod user_service;
