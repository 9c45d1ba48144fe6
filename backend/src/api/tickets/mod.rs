//! Support tickets of the signed-in client.

pub mod handlers;
pub mod routes;
