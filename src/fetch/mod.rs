//! Feed retrieval.
//!
//! [`HttpClient`] is the low-level request seam, [`FeedClient`] is what the
//! scheduler calls once per cycle. No retries happen at this layer; a failed
//! fetch simply fails the cycle.

mod client;
mod feed;
mod headers;

pub use client::{BasicClient, HttpClient};
pub use feed::{FeedClient, FileFeed, HttpFeed};
pub use headers::{DIGITRAFFIC_USER, FeedHeaders};

use bytes::Bytes;
use tracing::debug;

use crate::error::FetchError;

/// Issues one GET for `url` and returns the body if the status is 2xx.
#[tracing::instrument(skip(client))]
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Bytes, FetchError> {
    let url = reqwest::Url::parse(url).map_err(|e| FetchError::InvalidUrl(e.to_string()))?;
    let req = reqwest::Request::new(reqwest::Method::GET, url);

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }

    let bytes = resp.bytes().await?;
    debug!(%status, bytes = bytes.len(), "Feed body received");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reqwest::StatusCode;

    struct Canned(u16, &'static [u8]);

    #[async_trait]
    impl HttpClient for Canned {
        async fn execute(&self, _req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
            let resp = axum::http::Response::builder()
                .status(self.0)
                .body(Bytes::from_static(self.1))
                .unwrap();
            Ok(reqwest::Response::from(resp))
        }
    }

    #[tokio::test]
    async fn test_fetch_bytes_returns_body() {
        let bytes = fetch_bytes(&Canned(200, b"\x0a\x00"), "http://feed.test/pb")
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"\x0a\x00");
    }

    #[tokio::test]
    async fn test_fetch_bytes_non_success_status() {
        let err = fetch_bytes(&Canned(503, b"busy"), "http://feed.test/pb")
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Status(StatusCode::SERVICE_UNAVAILABLE)));
    }

    #[tokio::test]
    async fn test_fetch_bytes_invalid_url() {
        let err = fetch_bytes(&Canned(200, b""), "not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl(_)));
    }
}
