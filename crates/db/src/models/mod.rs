//! Row models and DTOs.

pub mod batch;
pub mod image;
pub mod status;
