//! The JSON/HTTP transport (§4.4) that carries every sync operation between
//! `keeper-actions` and `keeper-server`.

mod client;
mod error;

pub use client::Client;
pub use error::TransportError;
