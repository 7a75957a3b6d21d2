use std::time::Duration;

use bytes::Bytes;
use futures_util::StreamExt;

use wf_domain::stream::BoxStream;
use wf_domain::turn::ChatApiRequest;

use crate::error::ClientError;

/// Raw response body chunks, in arrival order.
pub type ByteStream = BoxStream<'static, Result<Bytes, ClientError>>;

/// Opens one chat response body per request.
#[async_trait::async_trait]
pub trait ChatTransport: Send + Sync {
    /// Send `request` and return the body stream once a success status has
    /// been received.
    async fn open(&self, request: &ChatApiRequest) -> Result<ByteStream, ClientError>;
}

/// [`ChatTransport`] over HTTP POST.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| ClientError::Http(e.to_string()))?;
        Ok(Self::with_client(client, url))
    }

    pub fn with_client(client: reqwest::Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait::async_trait]
impl ChatTransport for HttpTransport {
    async fn open(&self, request: &ChatApiRequest) -> Result<ByteStream, ClientError> {
        let resp = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| ClientError::Http(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), url = %self.url, "chat request rejected");
            return Err(ClientError::Status(status.as_u16()));
        }

        let body = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| ClientError::Stream(e.to_string())));
        Ok(Box::pin(body))
    }
}

#[async_trait::async_trait]
impl<T: ChatTransport + ?Sized> ChatTransport for std::sync::Arc<T> {
    async fn open(&self, request: &ChatApiRequest) -> Result<ByteStream, ClientError> {
        (**self).open(request).await
    }
}
