//! Timeout utilities for page operations
//!
//! Every suspension point of a fetch (network read, navigation wait, script
//! evaluation) runs under an explicit deadline so a slow site turns into a
//! skip instead of a hang.

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Run `operation` with a deadline of `timeout`.
///
/// # Errors
///
/// Returns the operation's own error, or `"<operation_name> timeout after Ns"`
/// when the deadline passes first.
pub async fn with_page_timeout<F, T>(operation: F, timeout: Duration, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {:.1}s",
            timeout.as_secs_f64()
        )),
    }
}

/// Whether an error produced by [`with_page_timeout`] was the deadline.
#[must_use]
pub fn is_timeout(err: &anyhow::Error) -> bool {
    err.to_string().contains(" timeout after ")
}
