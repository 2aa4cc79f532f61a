//! The wire contract: endpoint paths, header names and JSON DTOs shared by
//! `keeper-transport` (client) and `keeper-server` (server). Neither side
//! should define its own copy of a request or response shape -- importing
//! from here is what keeps them from drifting apart.

pub mod dto;
pub mod endpoints;

pub use dto::*;
