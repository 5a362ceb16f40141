//! Mic Receiver Library
//!
//! HTTP endpoint that stores multipart file uploads in a flat local
//! directory, plus a small client for sending files to it.
//!
//! # Modules
//!
//! - `upload`: Filename sanitization, on-disk store, error types
//! - `routes`: axum router and the `/mic` handler
//! - `client`: File sender used by the `mic-send` binary

pub mod client;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod upload;
