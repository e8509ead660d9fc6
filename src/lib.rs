//! A minimal async client for Alibaba Cloud TableStore (OTS).
//!
//! The client speaks the 2015-12-31 wide-column protocol: protobuf bodies
//! over signed HTTP/1.1 exchanges, rows encoded in the PlainBuffer format.
//! Requests flow through a bounded connection pool with FIFO borrowing,
//! responses are digest- and clock-validated, and failures are classified
//! and retried per a pluggable strategy. A [`BatchWriter`] sits on top for
//! write-heavy workloads, coalescing single-row writes into batches under
//! adaptive back-pressure.
//!
//! # Example
//!
//! ```no_run
//! use tablestore::{ClientBuilder, Credential};
//! use tablestore::protocol::messages::{GetRowRequest, PutRowRequest};
//! use tablestore::types::{Attribute, PrimaryKey, RowPutChange};
//!
//! # async fn example() -> Result<(), tablestore::Error> {
//! let client = ClientBuilder::new(
//!     "http://instance.cn-hangzhou.ots.aliyuncs.com",
//!     "instance",
//!     Credential::new("access-key-id", "access-key-secret"),
//! )
//! .build()?;
//!
//! let pk = PrimaryKey::new().column("user_id", 42i64);
//! let change = RowPutChange::new("users", pk.clone())
//!     .attribute(Attribute::new("name", "somebody"));
//! client.put_row(PutRowRequest::new(change)).await?;
//!
//! let response = client.get_row(GetRowRequest::new("users", pk)).await?;
//! println!("{:?}", response.row);
//!
//! client.close().await;
//! # Ok(())
//! # }
//! ```

#![deny(rustdoc::broken_intra_doc_links, rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    unused_crate_dependencies,
    clippy::explicit_iter_loop,
    clippy::future_not_send,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

pub mod backoff;
pub mod client;
pub mod connection;
pub mod error;
pub mod protocol;
pub mod retry;
pub mod types;
pub mod writer;

pub use client::{Client, ClientBuilder};
pub use connection::Endpoint;
pub use error::{Error, Result};
pub use protocol::signer::Credential;
pub use writer::{BatchWriter, BatchWriterConfig};

// dev-only dependencies used by the integration tests
#[cfg(test)]
use tracing_log as _;
#[cfg(test)]
use tracing_subscriber as _;
