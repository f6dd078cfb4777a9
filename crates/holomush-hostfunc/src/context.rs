//! Deadlines for calls that reach external services.
//!
//! A call's deadline is the caller's own deadline when it is sooner than the
//! configured query timeout, and `now + timeout` otherwise. Deadlines only
//! ever shorten a call.

use crate::error::HostError;
use std::future::Future;
use std::time::Duration;
use tokio::time::{timeout_at, Instant};

/// Default bound on a single KV or world call.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(5);

/// Stand-in for "no bound" when `now + timeout` is not representable.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// The deadline for a call started now.
pub fn effective_deadline(caller_deadline: Option<Instant>, timeout: Duration) -> Instant {
    let now = Instant::now();
    let bounded = now
        .checked_add(timeout)
        .unwrap_or_else(|| now + FAR_FUTURE);
    match caller_deadline {
        Some(deadline) if deadline < bounded => deadline,
        _ => bounded,
    }
}

/// Run `fut` until `deadline`, mapping expiry to [`HostError::Timeout`].
pub async fn run_until<F, T, E>(deadline: Instant, fut: F) -> Result<T, HostError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<HostError>,
{
    match timeout_at(deadline, fut).await {
        Ok(result) => result.map_err(Into::into),
        Err(_elapsed) => Err(HostError::Timeout),
    }
}
