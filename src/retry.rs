//! Retry classification and scheduling.
//!
//! Whether an error may be retried depends on the error alone when the
//! service guarantees the request did not take effect (throttling, routing)
//! and on the verb's idempotency when it cannot (lost responses, timeouts,
//! internal server failures).

use std::fmt;
use std::time::Duration;

use crate::backoff::{pause_for, BackoffConfig};
use crate::error::{self, codes, Error};
use crate::protocol::action::Action;

/// Error codes that are safe to retry regardless of the verb: the service
/// rejected the request before applying it.
const RETRIABLE_CODES: &[&str] = &[
    codes::ROW_OPERATION_CONFLICT,
    codes::NOT_ENOUGH_CAPACITY_UNIT,
    codes::TABLE_NOT_READY,
    codes::PARTITION_UNAVAILABLE,
    codes::SERVER_BUSY,
    codes::CAPACITY_UNIT_EXHAUSTED,
    codes::TOO_FREQUENT_RESERVED_THROUGHPUT_ADJUSTMENT,
];

/// Error codes where the request may have been applied; only idempotent
/// verbs retry them.
const RETRIABLE_CODES_IDEMPOTENT: &[&str] = &[
    codes::TIMEOUT,
    codes::INTERNAL_SERVER_ERROR,
    codes::SERVER_UNAVAILABLE,
    codes::REQUEST_TIMEOUT,
];

const QUOTA_EXHAUSTED_RETRIABLE_MESSAGE: &str = "Too frequent table operations.";

/// Whether `error` may be retried for `action`. Pure.
pub fn retriable(action: Action, error: &Error) -> bool {
    let status = error.http_status;
    if (200..=299).contains(&status) {
        return false;
    }

    match status {
        error::HTTP_COULDNT_CONNECT
        | error::HTTP_COULDNT_RESOLVE_HOST
        | error::HTTP_NO_AVAILABLE_CONNECTION => return true,
        error::HTTP_WRITE_REQUEST_FAIL
        | error::HTTP_CORRUPTED_RESPONSE
        | error::HTTP_OPERATION_TIMEOUT
        | error::HTTP_SSL_HANDSHAKE_FAIL => return action.idempotent(),
        _ => {}
    }

    if RETRIABLE_CODES.contains(&error.code.as_str()) {
        return true;
    }
    if error.code == codes::QUOTA_EXHAUSTED && error.message == QUOTA_EXHAUSTED_RETRIABLE_MESSAGE {
        return true;
    }

    let server_error = (500..=599).contains(&status);
    if action.idempotent()
        && (RETRIABLE_CODES_IDEMPOTENT.contains(&error.code.as_str()) || server_error)
    {
        return true;
    }

    false
}

/// Whether `error` is a server-busy signal that should slow senders down.
pub(crate) fn server_throttle(error: &Error) -> bool {
    RETRIABLE_CODES.contains(&error.code.as_str())
        || (error.code == codes::QUOTA_EXHAUSTED
            && error.message == QUOTA_EXHAUSTED_RETRIABLE_MESSAGE)
}

/// Decides whether and when to retry a failed attempt.
///
/// Implementations must be pure given their inputs: the client calls them
/// from concurrent requests.
pub trait RetryStrategy: fmt::Debug + Send + Sync {
    /// Pause before the next attempt, or `None` to give up.
    ///
    /// `attempts` counts completed tries, so the first failure arrives
    /// with `attempts == 1`.
    fn next_pause(&self, attempts: u32, action: Action, error: &Error) -> Option<Duration>;
}

/// The stock strategy: the classification above, bounded attempts,
/// exponential backoff with jitter.
#[derive(Debug, Clone)]
pub struct DefaultRetryStrategy {
    /// Total tries, the first one included.
    pub max_attempts: u32,
    pub backoff: BackoffConfig,
}

impl Default for DefaultRetryStrategy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: BackoffConfig::default(),
        }
    }
}

impl RetryStrategy for DefaultRetryStrategy {
    fn next_pause(&self, attempts: u32, action: Action, error: &Error) -> Option<Duration> {
        if attempts >= self.max_attempts {
            return None;
        }
        if !retriable(action, error) {
            return None;
        }
        Some(pause_for(&self.backoff, attempts.saturating_sub(1)))
    }
}

/// A strategy that never retries.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryStrategy for NoRetry {
    fn next_pause(&self, _attempts: u32, _action: Action, _error: &Error) -> Option<Duration> {
        None
    }
}
