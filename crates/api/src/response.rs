//! Response envelope shared by all handlers.

use serde::Serialize;

/// Successful responses wrap their payload in a `data` field.
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

impl<T: Serialize> DataResponse<T> {
    pub fn new(data: T) -> Self {
        Self { data }
    }
}
