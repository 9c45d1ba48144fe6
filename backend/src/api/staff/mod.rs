//! Back-office surface for the support team, authenticated by a shared key.

pub mod handlers;
pub mod routes;
