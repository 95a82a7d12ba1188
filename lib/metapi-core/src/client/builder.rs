use std::fmt::Debug;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::Arc;

use http::Uri;
use http::uri::{PathAndQuery, Scheme};
use url::Url;

use super::{ApiClientError, Diagnostics, MetaApiClient, TracingDiagnostics};
use crate::operation::{ApiModel, OperationRegistry};
use crate::transport::{ReqwestTransport, Transport};

/// Builder for [`MetaApiClient`].
///
/// # Default Configuration
///
/// - **Base URL**: `http://127.0.0.1:80/`
/// - **Registry**: an empty [`ApiModel`]
/// - **Transport**: [`ReqwestTransport`]
/// - **Diagnostics**: [`TracingDiagnostics`]
///
/// # Example
///
/// ```rust
/// use http::Method;
/// use http::uri::Scheme;
/// use metapi_core::{ApiModel, ApiOperation, MetaApiClient};
///
/// # fn example() -> Result<(), metapi_core::ApiClientError> {
/// let client = MetaApiClient::builder()
///     .with_scheme(Scheme::HTTPS)
///     .with_host("api.example.com")
///     .with_port(443)
///     .with_base_path("/v1")?
///     .with_model(ApiModel::new().with_operation(ApiOperation::new(
///         "listPets",
///         Method::GET,
///         "/pets",
///     )))
///     .build()?;
///
/// assert_eq!(client.base_url().as_str(), "https://api.example.com/v1");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ApiClientBuilder {
    scheme: Scheme,
    host: String,
    port: u16,
    base_path: Option<PathAndQuery>,
    base_url: Option<Url>,
    registry: Arc<dyn OperationRegistry>,
    transport: Arc<dyn Transport>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl ApiClientBuilder {
    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Fails if the base URL cannot be built from the scheme, host, port and
    /// base path.
    pub fn build(self) -> Result<MetaApiClient, ApiClientError> {
        let Self {
            scheme,
            host,
            port,
            base_path,
            base_url,
            registry,
            transport,
            diagnostics,
        } = self;

        let base_url = if let Some(url) = base_url {
            url
        } else {
            let builder = Uri::builder()
                .scheme(scheme)
                .authority(format!("{host}:{port}"));
            let builder = if let Some(path) = &base_path {
                builder.path_and_query(path.path())
            } else {
                builder.path_and_query("/")
            };
            let base_uri = builder.build()?;
            base_uri.to_string().parse::<Url>()?
        };

        Ok(MetaApiClient {
            base_url,
            registry,
            transport,
            diagnostics,
        })
    }

    /// Sets the scheme, `http` by default.
    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Sets the host name or IP address, `127.0.0.1` by default.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port, `80` by default.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the path prepended to every operation path.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::InvalidBasePath`] if the path contains invalid
    /// characters (such as spaces).
    pub fn with_base_path<P>(mut self, base_path: P) -> Result<Self, ApiClientError>
    where
        P: TryInto<PathAndQuery>,
        P::Error: Debug + 'static,
    {
        let base_path = base_path
            .try_into()
            .map_err(|err| ApiClientError::InvalidBasePath {
                error: format!("{err:?}"),
            })?;
        self.base_path = Some(base_path);
        Ok(self)
    }

    /// Sets the whole base URL, overriding scheme, host, port and base path.
    ///
    /// # Errors
    ///
    /// Returns [`ApiClientError::InvalidBasePath`] if the URL is not valid or
    /// cannot be a base (like `mailto:` URLs).
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, ApiClientError> {
        let url = Url::parse(base_url).map_err(|err| ApiClientError::InvalidBasePath {
            error: format!("{base_url}: {err}"),
        })?;
        if url.cannot_be_a_base() {
            return Err(ApiClientError::InvalidBasePath {
                error: format!("{base_url}: cannot be a base URL"),
            });
        }
        self.base_url = Some(url);
        Ok(self)
    }

    /// Sets the operations known by the client.
    pub fn with_model(self, model: ApiModel) -> Self {
        self.with_registry(model)
    }

    /// Sets a custom operation registry.
    pub fn with_registry(mut self, registry: impl OperationRegistry + 'static) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Sets the transport.
    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Arc::new(transport);
        self
    }

    /// Sets the diagnostics sink.
    pub fn with_diagnostics(mut self, diagnostics: impl Diagnostics + 'static) -> Self {
        self.diagnostics = Arc::new(diagnostics);
        self
    }
}

impl Default for ApiClientBuilder {
    fn default() -> Self {
        Self {
            scheme: Scheme::HTTP,
            host: IpAddr::V4(Ipv4Addr::LOCALHOST).to_string(),
            port: 80,
            base_path: None,
            base_url: None,
            registry: Arc::new(ApiModel::new()),
            transport: Arc::new(ReqwestTransport::new()),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_builder_creates_localhost_http_client() {
        let client = ApiClientBuilder::default()
            .build()
            .expect("should build client");

        insta::assert_snapshot!(client.base_url(), @"http://127.0.0.1/");
    }

    #[test]
    fn test_builder_with_custom_host_port_and_base_path() {
        let client = MetaApiClient::builder()
            .with_scheme(Scheme::HTTPS)
            .with_host("api.example.com")
            .with_port(8443)
            .with_base_path("/api/v1")
            .expect("valid base path")
            .build()
            .expect("should build client");

        insta::assert_snapshot!(client.base_url(), @"https://api.example.com:8443/api/v1");
    }

    #[test]
    fn test_builder_with_invalid_base_path_fails() {
        let result = MetaApiClient::builder().with_base_path("invalid path with spaces");

        let Err(error) = result else {
            panic!("should reject the base path");
        };
        assert!(matches!(error, ApiClientError::InvalidBasePath { .. }));
        assert_eq!(error.kind(), crate::ErrorKind::Configuration);
    }

    #[test]
    fn test_builder_with_base_url_overrides_parts() {
        let client = MetaApiClient::builder()
            .with_host("ignored.example.com")
            .with_base_url("http://localhost:3000/petstore/")
            .expect("valid base url")
            .build()
            .expect("should build client");

        insta::assert_snapshot!(client.base_url(), @"http://localhost:3000/petstore/");
    }

    #[test]
    fn test_builder_rejects_invalid_base_url() {
        for base_url in ["not a url", "mailto:someone@example.com"] {
            let result = MetaApiClient::builder().with_base_url(base_url);

            assert!(
                matches!(result, Err(ApiClientError::InvalidBasePath { .. })),
                "{base_url} should be rejected"
            );
        }
    }
}
