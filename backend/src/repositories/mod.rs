//! Data access layer.
//!
//! Each repository wraps one table and exposes single-row operations only;
//! no operation here spans more than one logical entity.

pub mod magic_token_repository;
pub mod ticket_repository;
pub mod user_repository;
