//! HTTP connection layer for the DOR repository client.
//!
//! Everything above this crate talks to the remote repository through the
//! [`Transport`] trait: one call, one HTTP round trip. The shipped
//! implementations are [`HttpConnection`] (reqwest-backed, with HTTP Basic
//! auth and streaming downloads) and [`ReplayTransport`] (canned responses
//! plus a request recorder, for tests).
//!
//! The request model is deliberately small: a method, a path relative to the
//! configured base URL, query pairs that are only ever appended when a value
//! was actually supplied, and one of a handful of body shapes.

pub mod config;
pub mod connection;
pub mod error;
pub mod request;
pub mod response;
pub mod testing;
pub mod transport;

pub use config::ConnectionConfig;
pub use connection::HttpConnection;
pub use error::{HttpError, HttpResult};
pub use request::{Method, MultipartField, Request, RequestBody};
pub use response::Response;
pub use testing::ReplayTransport;
pub use transport::Transport;
