//! Network transport abstraction.
//!
//! The pipeline never talks to the network directly; it hands a fully shaped
//! [`HttpRequest`] to a [`Transport`] and gets back the status, headers and
//! body text. [`ReqwestTransport`] is the default implementation.

use std::fmt::Debug;
use std::future::Future;
use std::pin::Pin;

use http::{HeaderMap, Method, StatusCode};
use url::Url;

use crate::client::ApiClientError;

mod http_client;
pub use self::http_client::ReqwestTransport;

/// A boxed `Send` future, as returned by [`Transport::send`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Fetch request mode, as understood by browser based transports.
///
/// Native transports have no same-origin policy and ignore it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, derive_more::Display)]
pub enum RequestMode {
    /// Cross-origin requests are allowed (the pipeline always uses this mode).
    #[default]
    #[display("cors")]
    Cors,
    /// Cross-origin requests are sent without reading the response.
    #[display("no-cors")]
    NoCors,
    /// Only same-origin requests are allowed.
    #[display("same-origin")]
    SameOrigin,
}

/// A request ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL, query string included.
    pub url: Url,
    /// Request headers.
    pub headers: HeaderMap,
    /// Request body, if any.
    pub body: Option<String>,
    /// Fetch mode.
    pub mode: RequestMode,
}

/// A received response, body fully read.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    /// Response status code.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// Final URL of the response.
    pub url: Url,
    /// Response body as text.
    pub body: String,
}

/// Sends an [`HttpRequest`] and reads the whole response.
///
/// Implementations make exactly one attempt and do not interpret the status
/// code: a `500` is a successful exchange at this level.
pub trait Transport: Debug + Send + Sync {
    /// Sends the request.
    ///
    /// # Errors
    ///
    /// Fails on network errors or if the body cannot be read.
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, ApiClientError>>;
}
