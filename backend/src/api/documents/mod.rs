//! Billing documents merged from both upstreams, with viewing, signing and
//! payment links.

pub mod handlers;
pub mod routes;
