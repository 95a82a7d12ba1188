use reqwest::{Body, Request};
use tracing::debug;

use super::{BoxFuture, HttpRequest, HttpResponse, Transport};
use crate::client::ApiClientError;

/// [`Transport`] backed by a [`reqwest::Client`].
///
/// No timeout and no retry are configured by default; use
/// [`ReqwestTransport::with_client`] to provide a tuned client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest` client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a transport from an existing `reqwest` client.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub(crate) fn build_request(request: HttpRequest) -> Request {
        let HttpRequest {
            method,
            url,
            headers,
            body,
            mode,
        } = request;

        debug!(%mode, "fetch mode has no effect on native transports");
        let mut result = Request::new(method, url);
        *result.headers_mut() = headers;
        if let Some(body) = body {
            *result.body_mut() = Some(Body::from(body));
        }
        result
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> BoxFuture<'_, Result<HttpResponse, ApiClientError>> {
        let request = Self::build_request(request);
        Box::pin(async move {
            debug!(?request, "sending...");
            let response = self.client.execute(request).await?;
            debug!(?response, "...receiving");

            let status = response.status();
            let headers = response.headers().clone();
            let url = response.url().clone();
            let body = response.text().await?;

            Ok(HttpResponse {
                status,
                headers,
                url,
                body,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use http::header::CONTENT_TYPE;
    use http::{HeaderMap, HeaderValue, Method};

    use super::*;
    use crate::transport::RequestMode;

    #[test]
    fn should_build_reqwest_request() {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let request = HttpRequest {
            method: Method::POST,
            url: "http://localhost:8080/pets?limit=2".parse().expect("valid url"),
            headers,
            body: Some(r#"{"name":"Rex"}"#.to_string()),
            mode: RequestMode::Cors,
        };

        let result = ReqwestTransport::build_request(request);

        assert_eq!(result.method(), &Method::POST);
        assert_eq!(result.url().as_str(), "http://localhost:8080/pets?limit=2");
        assert_eq!(
            result.headers().get(CONTENT_TYPE),
            Some(&HeaderValue::from_static("application/json"))
        );
        let body = result.body().and_then(Body::as_bytes);
        assert_eq!(body, Some(br#"{"name":"Rex"}"#.as_slice()));
    }

    #[test]
    fn should_build_request_without_body() {
        let request = HttpRequest {
            method: Method::GET,
            url: "http://localhost/".parse().expect("valid url"),
            headers: HeaderMap::new(),
            body: None,
            mode: RequestMode::default(),
        };

        let result = ReqwestTransport::build_request(request);

        assert!(result.body().is_none());
    }
}
