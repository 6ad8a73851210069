//! Request and response shapes of the HTTP API.

pub mod clients;
pub mod orders;
pub mod reports;
