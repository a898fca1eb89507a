//! Hyper-based HTTP transport.

use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Incoming;
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::ClientError;

type HyperClient = Client<HttpConnector, Full<Bytes>>;

/// Plain-HTTP transport over hyper_util's legacy client with connection
/// pooling. TLS termination is out of scope for this transport.
#[derive(Clone)]
pub struct HttpTransport {
    client: HyperClient,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
        }
    }

    /// Send a request and wait for the response head.
    pub async fn request(
        &self,
        request: http::Request<Full<Bytes>>,
    ) -> Result<http::Response<Incoming>, ClientError> {
        self.client
            .request(request)
            .await
            .map_err(|e| ClientError::Transport(format!("request failed: {e}")))
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport").finish_non_exhaustive()
    }
}
