//! Core data models for the website server.
//!
//! Everything here is created fresh per request and dropped once the response
//! has been written; nothing is shared across requests.

pub mod action;
pub mod object;
