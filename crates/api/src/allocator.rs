//! Dialcode allocation against the external reservation service.
//!
//! The upstream service caps how many codes a single call may reserve, so
//! large requests are split into capped chunks and fetched concurrently.
//! Chunk results are stitched back together in request order.

use async_trait::async_trait;
use dialbatch_core::error::CoreError;
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};

/// Concurrent in-flight allocator calls per request.
const ALLOCATOR_CONCURRENCY: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AllocationRequest {
    pub count: u32,
    pub publisher: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub batch_code: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AllocationResult {
    pub dialcodes: Vec<String>,
    pub count: u32,
}

/// Behavior when the upstream cumulatively returns fewer codes than asked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShortfallPolicy {
    /// Return the partial result and log a warning.
    #[default]
    Absorb,
    /// Fail the whole request.
    Error,
}

impl ShortfallPolicy {
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "error" => Self::Error,
            _ => Self::Absorb,
        }
    }
}

#[async_trait]
pub trait DialcodeAllocator: Send + Sync {
    /// Reserve `count` codes in one upstream call.
    async fn allocate(
        &self,
        count: u32,
        request: &AllocationRequest,
    ) -> Result<AllocationResult, CoreError>;
}

/// Split `request.count` into chunks of at most `per_call_max`, fetch them
/// concurrently, and merge the results in chunk order. Failed chunks
/// contribute nothing; the shortfall policy decides what a partial total
/// becomes.
pub async fn generate_dialcodes(
    allocator: &dyn DialcodeAllocator,
    request: &AllocationRequest,
    per_call_max: u32,
    policy: ShortfallPolicy,
) -> Result<AllocationResult, CoreError> {
    let per_call_max = per_call_max.max(1);

    let mut chunks = Vec::new();
    let mut remaining = request.count;
    while remaining > 0 {
        let take = remaining.min(per_call_max);
        chunks.push(take);
        remaining -= take;
    }

    let results: Vec<AllocationResult> = stream::iter(chunks)
        .map(|take| async move {
            match allocator.allocate(take, request).await {
                Ok(result) => result,
                Err(err) => {
                    tracing::error!(count = take, error = %err, "allocator call failed");
                    AllocationResult::default()
                }
            }
        })
        .buffered(ALLOCATOR_CONCURRENCY)
        .collect()
        .await;

    let mut merged = AllocationResult::default();
    for result in results {
        merged.count += result.count;
        merged.dialcodes.extend(result.dialcodes);
    }

    if merged.count < request.count {
        match policy {
            ShortfallPolicy::Absorb => {
                tracing::warn!(
                    requested = request.count,
                    received = merged.count,
                    "allocator returned fewer codes than requested"
                );
            }
            ShortfallPolicy::Error => {
                return Err(CoreError::Internal(format!(
                    "allocator returned {} of {} requested codes",
                    merged.count, request.count
                )));
            }
        }
    }

    Ok(merged)
}

/// HTTP client for the reservation service.
pub struct HttpAllocator {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAllocator {
    pub fn new(endpoint: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }
}

#[async_trait]
impl DialcodeAllocator for HttpAllocator {
    async fn allocate(
        &self,
        count: u32,
        request: &AllocationRequest,
    ) -> Result<AllocationResult, CoreError> {
        let body = AllocationRequest {
            count,
            publisher: request.publisher.clone(),
            batch_code: request.batch_code.clone(),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|e| CoreError::Internal(format!("allocator request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(CoreError::Internal(format!(
                "allocator returned status {}",
                response.status()
            )));
        }

        response
            .json::<AllocationResult>()
            .await
            .map_err(|e| CoreError::Internal(format!("allocator response malformed: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    struct SequencedAllocator {
        calls: Mutex<Vec<u32>>,
        counter: AtomicU32,
    }

    impl SequencedAllocator {
        fn new() -> Self {
            Self {
                calls: Mutex::new(Vec::new()),
                counter: AtomicU32::new(0),
            }
        }
    }

    #[async_trait]
    impl DialcodeAllocator for SequencedAllocator {
        async fn allocate(
            &self,
            count: u32,
            _request: &AllocationRequest,
        ) -> Result<AllocationResult, CoreError> {
            self.calls.lock().unwrap().push(count);
            let start = self.counter.fetch_add(count, Ordering::SeqCst);
            let dialcodes = (start..start + count).map(|i| format!("D{i:06}")).collect();
            Ok(AllocationResult { dialcodes, count })
        }
    }

    struct ShortAllocator;

    #[async_trait]
    impl DialcodeAllocator for ShortAllocator {
        async fn allocate(
            &self,
            count: u32,
            _request: &AllocationRequest,
        ) -> Result<AllocationResult, CoreError> {
            let granted = count / 2;
            Ok(AllocationResult {
                dialcodes: (0..granted).map(|i| format!("S{i}")).collect(),
                count: granted,
            })
        }
    }

    fn request(count: u32) -> AllocationRequest {
        AllocationRequest {
            count,
            publisher: "pub-1".into(),
            batch_code: None,
        }
    }

    #[tokio::test]
    async fn splits_count_into_capped_chunks() {
        let allocator = SequencedAllocator::new();
        let result = generate_dialcodes(&allocator, &request(2500), 1000, ShortfallPolicy::Absorb)
            .await
            .unwrap();

        assert_eq!(result.count, 2500);
        assert_eq!(result.dialcodes.len(), 2500);
        assert_eq!(*allocator.calls.lock().unwrap(), vec![1000, 1000, 500]);
    }

    #[tokio::test]
    async fn merges_chunks_in_request_order() {
        let allocator = SequencedAllocator::new();
        let result = generate_dialcodes(&allocator, &request(30), 10, ShortfallPolicy::Absorb)
            .await
            .unwrap();

        let expected: Vec<String> = (0..30).map(|i| format!("D{i:06}")).collect();
        assert_eq!(result.dialcodes, expected);
    }

    #[tokio::test]
    async fn count_below_cap_is_a_single_call() {
        let allocator = SequencedAllocator::new();
        let result = generate_dialcodes(&allocator, &request(7), 1000, ShortfallPolicy::Absorb)
            .await
            .unwrap();

        assert_eq!(result.count, 7);
        assert_eq!(*allocator.calls.lock().unwrap(), vec![7]);
    }

    #[tokio::test]
    async fn shortfall_is_absorbed_by_default() {
        let result = generate_dialcodes(&ShortAllocator, &request(100), 50, ShortfallPolicy::Absorb)
            .await
            .unwrap();

        assert_eq!(result.count, 50);
        assert_eq!(result.dialcodes.len(), 50);
    }

    #[tokio::test]
    async fn shortfall_errors_under_strict_policy() {
        let err = generate_dialcodes(&ShortAllocator, &request(100), 50, ShortfallPolicy::Error)
            .await
            .unwrap_err();

        assert_matches!(err, CoreError::Internal(_));
    }
}
