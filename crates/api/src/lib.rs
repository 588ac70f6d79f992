//! HTTP API for DIAL-code batch image generation.
//!
//! Exposes batch submission and status endpoints, dialcode reservation, and
//! a health check. The binary in `main.rs` also hosts the background
//! dispatcher and recovery scheduler from `dialbatch-pipeline`.

pub mod allocator;
pub mod config;
pub mod error;
pub mod handlers;
pub mod response;
pub mod routes;
pub mod state;
