pub mod batches;
pub mod dialcodes;
