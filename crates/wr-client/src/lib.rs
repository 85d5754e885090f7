//! Ward Report backend client
//!
//! Talks to the reporting backend and hands back model types:
//!
//! - [`Transport`]: the seam to the backend, with [`HttpTransport`] on reqwest
//! - [`schema`]: wire contracts, validated on receipt
//! - [`decode`]: strict decoding, plus lenient decoding for bulk listings
//! - [`ReportClient`]: one method per backend operation
//!
//! A payload failing its contract is rejected wholesale with a
//! [`ValidationError`]. The only exception is the user listing, where bad
//! elements are dropped and reported as [`PartialItemError`].

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod client;
pub mod decode;
pub mod error;
pub mod http;
pub mod schema;
pub mod transport;

pub use client::{CommonProblemsReport, ReportClient, WardReport};
pub use decode::{decode, decode_lenient, Lenient};
pub use error::{
    FieldError, PartialItemError, ReportError, ReportResult, TransportError, ValidationError,
};
pub use http::HttpTransport;
pub use schema::{RequestDetails, Validate};
pub use transport::{ApiRequest, Endpoint, Method, Transport};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
