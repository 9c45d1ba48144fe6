//! Construction sites of the signed-in client, read from the Ledger Service.

pub mod handlers;
pub mod routes;
