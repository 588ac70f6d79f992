//! Repositories: one struct of static query methods per table.

mod batch_repo;
mod image_repo;

pub use batch_repo::BatchRepo;
pub use image_repo::ImageRepo;
