//! Pure domain logic for the dialcode QR batch service.
//!
//! No async, no I/O. Everything here is callable from any layer without
//! pulling in the database, storage, or HTTP stacks.

pub mod color;
pub mod error;
pub mod render;
pub mod types;
