// ─── HTTP ───
// Shared reqwest client plus the `RemoteSource` seam the provisioners fetch through.

use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{BoxStream, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING};
use reqwest::Client;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

pub const APP_USER_AGENT: &str = "MistXI-Launcher/0.1";

/// Ashita snapshots are large; slow links need the headroom.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10 * 60);

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    default_headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/vnd.github+json, */*"),
    );

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .timeout(REQUEST_TIMEOUT)
        .build()
}

/// A response body being streamed in chunks.
pub struct RemoteBody {
    /// Content length when the server announced one.
    pub total: Option<u64>,
    pub chunks: BoxStream<'static, LauncherResult<Vec<u8>>>,
}

/// Everything the provisioning pipeline needs from the network.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    /// GET `url` and return the body as text. Non-success status is an error.
    async fn get_text(&self, url: &str) -> LauncherResult<String>;

    /// GET `url` and hand back the body as a chunk stream.
    async fn open_stream(&self, url: &str) -> LauncherResult<RemoteBody>;
}

/// `RemoteSource` backed by a real HTTP client.
#[derive(Clone)]
pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    pub fn new() -> LauncherResult<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }

    async fn send(&self, url: &str) -> LauncherResult<reqwest::Response> {
        debug!("GET {}", url);
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl RemoteSource for HttpRemote {
    async fn get_text(&self, url: &str) -> LauncherResult<String> {
        let response = self.send(url).await?;
        Ok(response.text().await?)
    }

    async fn open_stream(&self, url: &str) -> LauncherResult<RemoteBody> {
        let response = self.send(url).await?;
        let total = response.content_length();
        let chunks = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(LauncherError::from))
            .boxed();
        Ok(RemoteBody { total, chunks })
    }
}
