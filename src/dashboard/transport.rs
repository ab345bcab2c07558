//! Outbound GET transport used by the aggregator.

use std::future::Future;
use std::pin::Pin;

use serde_json::Value;
use thiserror::Error;

/// Why one endpoint call produced no data.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connect, send, timeout or body-read failure.
    #[error("{0}")]
    Request(String),
    /// Body arrived but is not JSON.
    #[error("invalid JSON body: {0}")]
    Decode(String),
}

/// A boxed future returned by [`Transport::get`].
pub type TransportFuture<'a> = Pin<Box<dyn Future<Output = Result<Value, TransportError>> + Send + 'a>>;

/// Something that can issue a GET for an API path and decode the JSON body.
pub trait Transport: Send + Sync + 'static {
    fn get<'a>(&'a self, path: &'a str) -> TransportFuture<'a>;
}

#[cfg(feature = "dashboard")]
pub use http::HttpTransport;

#[cfg(feature = "dashboard")]
mod http {
    use std::time::Duration;

    use tracing::debug;

    use super::{Transport, TransportError, TransportFuture};
    use crate::error::AppError;

    /// [`Transport`] over HTTP via `reqwest`.
    ///
    /// The status code is not inspected: an error response with a JSON body
    /// is still data for the dashboard.
    pub struct HttpTransport {
        base_url: String,
        client: reqwest::Client,
    }

    impl HttpTransport {
        pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
            let client = reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .map_err(|e| AppError::Dashboard(format!("http client build failed: {e}")))?;
            Ok(Self {
                base_url: base_url.into().trim_end_matches('/').to_string(),
                client,
            })
        }

        pub fn base_url(&self) -> &str {
            &self.base_url
        }
    }

    impl Transport for HttpTransport {
        fn get<'a>(&'a self, path: &'a str) -> TransportFuture<'a> {
            Box::pin(async move {
                let url = format!("{}{}", self.base_url, path);
                let response = self
                    .client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|e| TransportError::Request(e.to_string()))?;
                debug!(%url, status = %response.status(), "response received");
                let body = response
                    .bytes()
                    .await
                    .map_err(|e| TransportError::Request(e.to_string()))?;
                serde_json::from_slice(&body).map_err(|e| TransportError::Decode(e.to_string()))
            })
        }
    }

}
