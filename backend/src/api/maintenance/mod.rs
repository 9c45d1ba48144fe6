//! Maintenance contracts and their invoices, held by the Quoting Service.

pub mod handlers;
pub mod models;
pub mod routes;
