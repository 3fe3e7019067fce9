// Copyright 2025 Cowboy AI, LLC.

//! Caller-enforced timeouts for external provider calls

use crate::errors::{DomainError, DomainResult};
use std::future::Future;
use std::time::Duration;

/// Run a provider call, converting an elapsed deadline into an
/// `ExternalServiceError` for `service`
pub async fn with_timeout<T, F>(service: &str, limit: Duration, call: F) -> DomainResult<T>
where
    F: Future<Output = DomainResult<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(DomainError::external(
            service,
            format!("timed out after {}ms", limit.as_millis()),
        )),
    }
}
