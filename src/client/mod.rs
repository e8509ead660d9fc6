//! The client: per-verb async operations over the request pipeline.
//!
//! Every call runs validate → encode → sign → borrow a pooled connection
//! → exchange → validate response → decode, consulting the retry strategy
//! on failure. Attempts of one logical request share a tracker id; each
//! attempt gets a fresh trace id derived from it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use rand::Rng;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::connection::http::{self, ExchangeError, HttpRequest, HttpResponse};
use crate::connection::{ConnectionPool, Endpoint, PoolConfig, TlsConfig};
use crate::error::{codes, Error, Result};
use crate::protocol::action::Action;
use crate::protocol::messages::{
    decode_error_body, BatchGetRowRequest, BatchGetRowResponse, BatchWriteRowRequest,
    BatchWriteRowResponse, ComputeSplitPointsBySizeRequest, ComputeSplitPointsBySizeResponse,
    CreateTableRequest, CreateTableResponse, DeleteRowRequest, DeleteRowResponse,
    DeleteTableRequest, DeleteTableResponse, DescribeTableRequest, DescribeTableResponse,
    GetRangeRequest, GetRangeResponse, GetRowRequest, GetRowResponse, ListTableRequest,
    ListTableResponse, OtsRequest, PutRowRequest, PutRowResponse, ResponseMeta, UpdateRowRequest,
    UpdateRowResponse, UpdateTableRequest, UpdateTableResponse,
};
use crate::protocol::signer::{self, Credential};
use crate::retry::{DefaultRetryStrategy, RetryStrategy};

/// Builder for [`Client`].
pub struct ClientBuilder {
    endpoint: String,
    instance_name: String,
    credential: Credential,
    max_connections: usize,
    connect_timeout: Duration,
    request_timeout: Duration,
    trace_threshold: Duration,
    check_response_digest: bool,
    #[cfg(feature = "compression-deflate")]
    compress_requests: bool,
    retry_strategy: Arc<dyn RetryStrategy>,
    tls_config: TlsConfig,
}

impl ClientBuilder {
    pub fn new(
        endpoint: impl Into<String>,
        instance_name: impl Into<String>,
        credential: Credential,
    ) -> Self {
        Self {
            endpoint: endpoint.into(),
            instance_name: instance_name.into(),
            credential,
            max_connections: 32,
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(30),
            trace_threshold: Duration::from_millis(500),
            check_response_digest: true,
            #[cfg(feature = "compression-deflate")]
            compress_requests: false,
            retry_strategy: Arc::new(DefaultRetryStrategy::default()),
            tls_config: Default::default(),
        }
    }

    /// Upper bound on concurrently open connections.
    pub fn max_connections(mut self, max_connections: usize) -> Self {
        self.max_connections = max_connections;
        self
    }

    pub fn connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Deadline of one attempt, connection wait included.
    pub fn request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Requests slower than this are logged with their tracker id.
    pub fn trace_threshold(mut self, trace_threshold: Duration) -> Self {
        self.trace_threshold = trace_threshold;
        self
    }

    /// Whether response bodies are checked against `x-ots-contentmd5`.
    pub fn check_response_digest(mut self, check: bool) -> Self {
        self.check_response_digest = check;
        self
    }

    /// Compress request bodies with deflate.
    #[cfg(feature = "compression-deflate")]
    pub fn compress_requests(mut self, compress: bool) -> Self {
        self.compress_requests = compress;
        self
    }

    /// Swap out the retry strategy.
    pub fn retry_strategy(mut self, retry_strategy: Arc<dyn RetryStrategy>) -> Self {
        self.retry_strategy = retry_strategy;
        self
    }

    /// Setup TLS for https endpoints.
    #[cfg(feature = "transport-tls")]
    pub fn tls_config(mut self, tls_config: Arc<rustls::ClientConfig>) -> Self {
        self.tls_config = Some(tls_config);
        self
    }

    /// Build [`Client`]. Must run on a tokio runtime.
    pub fn build(self) -> Result<Client> {
        let endpoint = Endpoint::parse(&self.endpoint)?;
        self.credential.validate()?;
        if self.instance_name.is_empty() {
            return Err(Error::validation("instance name must be non-empty"));
        }
        if self.max_connections == 0 {
            return Err(Error::validation("max connections must be positive"));
        }
        #[cfg(feature = "transport-tls")]
        if endpoint.https() && self.tls_config.is_none() {
            return Err(Error::validation(
                "an https endpoint needs a TLS configuration",
            ));
        }

        let pool = ConnectionPool::new(PoolConfig {
            endpoint: endpoint.clone(),
            tls_config: self.tls_config,
            max_connections: self.max_connections,
            connect_timeout: Some(self.connect_timeout),
        });

        Ok(Client {
            inner: Arc::new(ClientInner {
                pool,
                endpoint,
                instance_name: self.instance_name,
                credential: self.credential,
                request_timeout: self.request_timeout,
                trace_threshold: self.trace_threshold,
                check_response_digest: self.check_response_digest,
                #[cfg(feature = "compression-deflate")]
                compress_requests: self.compress_requests,
                retry_strategy: self.retry_strategy,
                closed: AtomicBool::new(false),
            }),
        })
    }
}

impl std::fmt::Debug for ClientBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientBuilder").finish_non_exhaustive()
    }
}

struct ClientInner {
    pool: ConnectionPool,
    endpoint: Endpoint,
    instance_name: String,
    credential: Credential,
    request_timeout: Duration,
    trace_threshold: Duration,
    check_response_digest: bool,
    #[cfg(feature = "compression-deflate")]
    compress_requests: bool,
    retry_strategy: Arc<dyn RetryStrategy>,
    closed: AtomicBool,
}

/// An asynchronous TableStore client.
///
/// Cheap to clone; all clones share one connection pool.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

impl Client {
    // table operations

    pub async fn create_table(&self, request: CreateTableRequest) -> Result<CreateTableResponse> {
        self.request(request).await
    }

    pub async fn list_table(&self, request: ListTableRequest) -> Result<ListTableResponse> {
        self.request(request).await
    }

    pub async fn describe_table(
        &self,
        request: DescribeTableRequest,
    ) -> Result<DescribeTableResponse> {
        self.request(request).await
    }

    pub async fn delete_table(&self, request: DeleteTableRequest) -> Result<DeleteTableResponse> {
        self.request(request).await
    }

    pub async fn update_table(&self, request: UpdateTableRequest) -> Result<UpdateTableResponse> {
        self.request(request).await
    }

    pub async fn compute_split_points_by_size(
        &self,
        request: ComputeSplitPointsBySizeRequest,
    ) -> Result<ComputeSplitPointsBySizeResponse> {
        self.request(request).await
    }

    // data operations

    pub async fn get_row(&self, request: GetRowRequest) -> Result<GetRowResponse> {
        self.request(request).await
    }

    pub async fn put_row(&self, request: PutRowRequest) -> Result<PutRowResponse> {
        self.request(request).await
    }

    pub async fn update_row(&self, request: UpdateRowRequest) -> Result<UpdateRowResponse> {
        self.request(request).await
    }

    pub async fn delete_row(&self, request: DeleteRowRequest) -> Result<DeleteRowResponse> {
        self.request(request).await
    }

    pub async fn batch_get_row(&self, request: BatchGetRowRequest) -> Result<BatchGetRowResponse> {
        self.request(request).await
    }

    pub async fn batch_write_row(
        &self,
        request: BatchWriteRowRequest,
    ) -> Result<BatchWriteRowResponse> {
        self.request(request).await
    }

    pub async fn get_range(&self, request: GetRangeRequest) -> Result<GetRangeResponse> {
        self.request(request).await
    }

    /// Shuts the client down: waiting borrowers fail promptly, in-flight
    /// exchanges run to completion, then the pool drains.
    pub async fn close(&self) {
        self.inner.closed.store(true, Ordering::Release);
        self.inner.pool.close().await;
    }

    async fn request<R: OtsRequest>(&self, request: R) -> Result<R::Response> {
        request.validate()?;
        let (body, uncompressed_len) = self.prepare_body(request.encode_body()?)?;

        let tracker = new_tracker();
        let started = Instant::now();
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            let trace_id = format!("{tracker}.{attempts}");

            let result = match self
                .attempt(R::ACTION, &body, uncompressed_len, &trace_id)
                .await
            {
                Ok(response) => self.process(&request, response, &trace_id),
                Err(error) => Err(error),
            };

            match result {
                Ok(response) => {
                    let elapsed = started.elapsed();
                    if elapsed > self.inner.trace_threshold {
                        warn!(
                            tracker,
                            action = %R::ACTION,
                            elapsed_ms = elapsed.as_millis() as u64,
                            attempts,
                            "slow request"
                        );
                    }
                    return Ok(response);
                }
                Err(mut error) => {
                    if error.trace_id.is_none() {
                        error.trace_id = Some(trace_id.clone());
                    }
                    let pause = if self.inner.closed.load(Ordering::Acquire) {
                        None
                    } else {
                        self.inner
                            .retry_strategy
                            .next_pause(attempts, R::ACTION, &error)
                    };
                    match pause {
                        Some(pause) => {
                            debug!(
                                tracker,
                                action = %R::ACTION,
                                %error,
                                pause_ms = pause.as_millis() as u64,
                                "retrying"
                            );
                            tokio::time::sleep(pause).await;
                        }
                        None => return Err(error),
                    }
                }
            }
        }
    }

    /// One wire exchange: borrow, write, read, return the connection.
    async fn attempt(
        &self,
        action: Action,
        body: &Bytes,
        uncompressed_len: Option<usize>,
        trace_id: &str,
    ) -> Result<HttpResponse> {
        let inner = &self.inner;
        if inner.closed.load(Ordering::Acquire) {
            return Err(Error::no_available_connection("client is closed"));
        }

        let deadline = Instant::now() + inner.request_timeout;
        let mut conn = inner.pool.borrow(trace_id, deadline).await?;

        let request = HttpRequest {
            action,
            headers: self.build_headers(action, body, uncompressed_len),
            body: body.clone(),
        };

        let exchange = http::exchange(conn.transport_mut(), inner.endpoint.host(), &request);
        match tokio::time::timeout_at(deadline, exchange).await {
            Ok(Ok(response)) => {
                conn.give_back();
                Ok(response)
            }
            Ok(Err(error)) => {
                // the connection may carry half a message; never reuse it
                conn.destroy();
                Err(exchange_error(error))
            }
            Err(_) => {
                conn.destroy();
                Err(Error::operation_timeout("request deadline passed"))
            }
        }
    }

    fn build_headers(
        &self,
        action: Action,
        body: &[u8],
        uncompressed_len: Option<usize>,
    ) -> Vec<(String, String)> {
        let inner = &self.inner;
        let mut headers = vec![
            (
                signer::HEADER_API_VERSION.to_string(),
                signer::API_VERSION.to_string(),
            ),
            (
                signer::HEADER_DATE.to_string(),
                signer::format_date(Utc::now()),
            ),
            (
                signer::HEADER_ACCESS_KEY_ID.to_string(),
                inner.credential.access_key_id.clone(),
            ),
            (
                signer::HEADER_INSTANCE_NAME.to_string(),
                inner.instance_name.clone(),
            ),
            (
                signer::HEADER_CONTENT_MD5.to_string(),
                signer::content_md5(body),
            ),
        ];
        if let Some(token) = &inner.credential.security_token {
            headers.push((signer::HEADER_STS_TOKEN.to_string(), token.clone()));
        }
        if let Some(uncompressed_len) = uncompressed_len {
            headers.push((
                http::HEADER_REQUEST_COMPRESS_TYPE.to_string(),
                http::COMPRESS_TYPE_DEFLATE.to_string(),
            ));
            headers.push((
                http::HEADER_REQUEST_COMPRESS_SIZE.to_string(),
                uncompressed_len.to_string(),
            ));
        }

        let signature = signer::signature(action, &headers, &inner.credential.access_key_secret);
        headers.push((signer::HEADER_SIGNATURE.to_string(), signature));
        headers
    }

    /// Optionally compresses the body; returns the wire body plus the
    /// original length when compression took place. Signature and digest
    /// always cover the wire body.
    #[cfg(feature = "compression-deflate")]
    fn prepare_body(&self, body: Bytes) -> Result<(Bytes, Option<usize>)> {
        if !self.inner.compress_requests || body.is_empty() {
            return Ok((body, None));
        }
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let uncompressed_len = body.len();
        let mut encoder = ZlibEncoder::new(Vec::with_capacity(body.len()), Compression::default());
        encoder
            .write_all(&body)
            .map_err(|e| Error::validation(format!("cannot compress request body: {e}")))?;
        let compressed = encoder
            .finish()
            .map_err(|e| Error::validation(format!("cannot compress request body: {e}")))?;
        Ok((compressed.into(), Some(uncompressed_len)))
    }

    #[cfg(not(feature = "compression-deflate"))]
    fn prepare_body(&self, body: Bytes) -> Result<(Bytes, Option<usize>)> {
        Ok((body, None))
    }

    /// Validates and decodes one response.
    fn process<R: OtsRequest>(
        &self,
        request: &R,
        response: HttpResponse,
        trace_id: &str,
    ) -> Result<R::Response> {
        let inner = &self.inner;
        let request_id = response
            .header(signer::HEADER_REQUEST_ID)
            .unwrap_or_default()
            .to_string();

        if response.status == 301 {
            let location = response.header("location").unwrap_or("elsewhere");
            let mut error = Error::new(
                301,
                "OTSMovedPermanently",
                format!("endpoint moved to {location}"),
            );
            error.request_id = Some(request_id);
            return Err(error);
        }

        signer::validate_response(
            &response.headers,
            &response.body,
            inner.check_response_digest,
            Utc::now(),
        )?;

        if (200..=299).contains(&response.status) {
            let meta = ResponseMeta {
                request_id,
                trace_id: trace_id.to_string(),
            };
            return request.decode_response(&response.body, meta);
        }

        let mut error = match decode_error_body(&response.body) {
            Some((code, message)) => Error::new(response.status as i32, code, message),
            None => Error::new(
                response.status as i32,
                "OTSUnknownError",
                "response carries no error body",
            ),
        };
        if response.status == 403 {
            if let Some(detail) = response.header(signer::HEADER_AUTH_FAILED) {
                error.code = codes::AUTH_FAILED.to_string();
                error.message = format!("{} ({detail})", error.message);
            }
        }
        error.request_id = Some(request_id);
        Err(error)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.inner.endpoint)
            .field("instance_name", &self.inner.instance_name)
            .finish_non_exhaustive()
    }
}

/// A fresh tracker id correlating all attempts of one logical request.
fn new_tracker() -> String {
    format!("{:016x}", rand::thread_rng().gen::<u64>())
}

fn exchange_error(error: ExchangeError) -> Error {
    match error {
        ExchangeError::Write(e) => Error::write_request_fail(e.to_string()),
        ExchangeError::Read(e) => {
            Error::corrupted_response(format!("cannot read response: {e}"), file!(), line!())
        }
        ExchangeError::UnexpectedEof => Error::corrupted_response(
            "connection closed before a full response arrived",
            file!(),
            line!(),
        ),
        ExchangeError::Malformed(message) => Error::corrupted_response(message, file!(), line!()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credential() -> Credential {
        Credential::new("ak-id", "ak-secret")
    }

    #[tokio::test]
    async fn builder_validates_configuration() {
        assert!(ClientBuilder::new("no-scheme", "inst", credential())
            .build()
            .is_err());
        assert!(ClientBuilder::new("http://host", "", credential())
            .build()
            .is_err());
        assert!(
            ClientBuilder::new("http://host", "inst", Credential::new("", ""))
                .build()
                .is_err()
        );
        assert!(ClientBuilder::new("http://host", "inst", credential())
            .max_connections(0)
            .build()
            .is_err());

        #[cfg(feature = "transport-tls")]
        assert!(ClientBuilder::new("https://host", "inst", credential())
            .build()
            .is_err());

        let client = ClientBuilder::new("http://127.0.0.1:1", "inst", credential())
            .build()
            .unwrap();
        client.close().await;
    }

    #[test]
    fn trackers_are_distinct() {
        let a = new_tracker();
        let b = new_tracker();
        assert_eq!(a.len(), 16);
        assert_ne!(a, b);
    }
}
