//! Authentication module for client accounts and sessions.
//!
//! This module provides sign-in by email link or password, password recovery,
//! session token management and the authorization middleware.

pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod service;
