//! Client-visible error type.
//!
//! Every failure, whether reported by the service in a response body or
//! synthesized on the client side, surfaces as an [`Error`]. Client-side
//! failures carry a negative pseudo HTTP status so they stay disjoint from
//! anything a real server can return.

use std::fmt;

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Pseudo HTTP status: the endpoint hostname could not be resolved.
pub const HTTP_COULDNT_RESOLVE_HOST: i32 = -1;

/// Pseudo HTTP status: a TCP connection could not be established.
pub const HTTP_COULDNT_CONNECT: i32 = -2;

/// Pseudo HTTP status: writing the request onto the wire failed.
pub const HTTP_WRITE_REQUEST_FAIL: i32 = -3;

/// Pseudo HTTP status: the response failed validation (framing, digest,
/// checksum or clock skew).
pub const HTTP_CORRUPTED_RESPONSE: i32 = -4;

/// Pseudo HTTP status: no pooled connection became available.
pub const HTTP_NO_AVAILABLE_CONNECTION: i32 = -5;

/// Pseudo HTTP status: the per-request deadline passed.
pub const HTTP_OPERATION_TIMEOUT: i32 = -6;

/// Pseudo HTTP status: the TLS handshake failed.
pub const HTTP_SSL_HANDSHAKE_FAIL: i32 = -7;

/// Pseudo HTTP status: the request failed client-side validation.
pub const HTTP_CLIENT_VALIDATION: i32 = -8;

/// Error codes of the TableStore service, plus the codes this client uses
/// for locally synthesized errors.
pub mod codes {
    pub const COULDNT_RESOLVE_HOST: &str = "OTSCouldntResolveHost";
    pub const COULDNT_CONNECT: &str = "OTSCouldntConnect";
    pub const WRITE_REQUEST_FAIL: &str = "OTSWriteRequestFail";
    pub const CORRUPTED_RESPONSE: &str = "OTSCorruptedResponse";
    pub const NO_AVAILABLE_CONNECTION: &str = "OTSNoAvailableConnection";
    pub const OPERATION_TIMEOUT: &str = "OTSOperationTimeout";
    pub const SSL_HANDSHAKE_FAIL: &str = "OTSSslHandshakeFail";

    pub const AUTH_FAILED: &str = "OTSAuthFailed";
    pub const CAPACITY_UNIT_EXHAUSTED: &str = "OTSCapacityUnitExhausted";
    pub const CONDITION_CHECK_FAIL: &str = "OTSConditionCheckFail";
    pub const INTERNAL_SERVER_ERROR: &str = "OTSInternalServerError";
    pub const INVALID_PK: &str = "OTSInvalidPK";
    pub const METHOD_NOT_ALLOWED: &str = "OTSMethodNotAllowed";
    pub const NOT_ENOUGH_CAPACITY_UNIT: &str = "OTSNotEnoughCapacityUnit";
    pub const OBJECT_ALREADY_EXIST: &str = "OTSObjectAlreadyExist";
    pub const OBJECT_NOT_EXIST: &str = "OTSObjectNotExist";
    pub const OUT_OF_COLUMN_COUNT_LIMIT: &str = "OTSOutOfColumnCountLimit";
    pub const OUT_OF_ROW_SIZE_LIMIT: &str = "OTSOutOfRowSizeLimit";
    pub const PARAMETER_INVALID: &str = "OTSParameterInvalid";
    pub const PARTITION_UNAVAILABLE: &str = "OTSPartitionUnavailable";
    pub const QUOTA_EXHAUSTED: &str = "OTSQuotaExhausted";
    pub const REQUEST_BODY_TOO_LARGE: &str = "OTSRequestBodyTooLarge";
    pub const REQUEST_TIMEOUT: &str = "OTSRequestTimeout";
    pub const ROW_OPERATION_CONFLICT: &str = "OTSRowOperationConflict";
    pub const SERVER_BUSY: &str = "OTSServerBusy";
    pub const SERVER_UNAVAILABLE: &str = "OTSServerUnavailable";
    pub const TABLE_NOT_READY: &str = "OTSTableNotReady";
    pub const TIMEOUT: &str = "OTSTimeout";
    pub const TOO_FREQUENT_RESERVED_THROUGHPUT_ADJUSTMENT: &str =
        "OTSTooFrequentReservedThroughputAdjustment";
}

/// An error surfaced through the async API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    /// HTTP status of the failed exchange, or a negative pseudo status for
    /// client-side failures.
    pub http_status: i32,

    /// The service error code, e.g. `OTSServerBusy`.
    pub code: String,

    /// Human-readable message.
    pub message: String,

    /// `x-ots-requestid` of the failed exchange, when one was received.
    pub request_id: Option<String>,

    /// Tracker id correlating all attempts of one logical request.
    pub trace_id: Option<String>,
}

impl Error {
    pub fn new(
        http_status: i32,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            http_status,
            code: code.into(),
            message: message.into(),
            request_id: None,
            trace_id: None,
        }
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn couldnt_resolve_host(message: impl Into<String>) -> Self {
        Self::new(
            HTTP_COULDNT_RESOLVE_HOST,
            codes::COULDNT_RESOLVE_HOST,
            message,
        )
    }

    pub fn couldnt_connect(message: impl Into<String>) -> Self {
        Self::new(HTTP_COULDNT_CONNECT, codes::COULDNT_CONNECT, message)
    }

    pub fn write_request_fail(message: impl Into<String>) -> Self {
        Self::new(HTTP_WRITE_REQUEST_FAIL, codes::WRITE_REQUEST_FAIL, message)
    }

    /// A corrupted-response error pointing at the detection site.
    ///
    /// Pass `file!()`/`line!()` so the offending validation is identifiable
    /// from logs alone.
    pub fn corrupted_response(message: impl Into<String>, file: &str, line: u32) -> Self {
        Self::new(
            HTTP_CORRUPTED_RESPONSE,
            codes::CORRUPTED_RESPONSE,
            format!("{} (at {}:{})", message.into(), file, line),
        )
    }

    pub fn no_available_connection(message: impl Into<String>) -> Self {
        Self::new(
            HTTP_NO_AVAILABLE_CONNECTION,
            codes::NO_AVAILABLE_CONNECTION,
            message,
        )
    }

    pub fn operation_timeout(message: impl Into<String>) -> Self {
        Self::new(HTTP_OPERATION_TIMEOUT, codes::OPERATION_TIMEOUT, message)
    }

    pub fn ssl_handshake_fail(message: impl Into<String>) -> Self {
        Self::new(HTTP_SSL_HANDSHAKE_FAIL, codes::SSL_HANDSHAKE_FAIL, message)
    }

    /// A request that failed local validation, before anything hit the wire.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(HTTP_CLIENT_VALIDATION, codes::PARAMETER_INVALID, message)
    }

    /// Whether this error was synthesized on the client side.
    pub fn is_client_side(&self) -> bool {
        self.http_status < 0
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (http status {}): {}",
            self.code, self.http_status, self.message
        )?;
        if let Some(request_id) = &self.request_id {
            write!(f, ", request id {request_id}")?;
        }
        if let Some(trace_id) = &self.trace_id {
            write!(f, ", trace id {trace_id}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}
