//! Blocking HTTP transport backed by `reqwest`.

use crate::fetch::{AttemptScope, HttpRequest, HttpResponse, Method, Transport, TransportError};
use reqwest::blocking::Client;

const USER_AGENT: &str = concat!("wordle-sieve/", env!("CARGO_PKG_VERSION"));

/// [`Transport`] implementation issuing real requests.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> Result<Self, TransportError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                TransportError::Network(format!("failed to build HTTP client: {}", e))
            })?;
        Ok(Self::with_client(client))
    }

    /// Wrap a preconfigured client (proxies, TLS roots, default headers).
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

impl Transport for HttpTransport {
    fn execute(
        &self,
        request: &HttpRequest,
        scope: &AttemptScope,
    ) -> Result<HttpResponse, TransportError> {
        if scope.is_cancelled() {
            return Err(TransportError::TimedOut);
        }

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
        };
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.timeout(scope.remaining()).send().map_err(classify)?;
        let status = response.status().as_u16();
        let body = response.text().map_err(classify)?;
        Ok(HttpResponse { status, body })
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::TimedOut
    } else {
        TransportError::Network(error.to_string())
    }
}
