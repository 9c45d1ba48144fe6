//! Collection of general utility functions and common helpers.
//!
//! This module serves as a repository for small, reusable helpers that do not
//! fit into other specific domain modules.

pub mod client_meta;
pub mod generate_random_string;
pub mod jwt;
