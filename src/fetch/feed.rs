use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

use super::client::HttpClient;
use super::fetch_bytes;
use crate::error::FetchError;

/// Source of raw feed payloads, called once per refresh cycle.
#[async_trait]
pub trait FeedClient: Send + Sync {
    async fn fetch(&self) -> Result<Bytes, FetchError>;

    /// Where the bytes come from, for logs.
    fn source(&self) -> &str;
}

#[async_trait]
impl<T: FeedClient + ?Sized> FeedClient for Arc<T> {
    async fn fetch(&self) -> Result<Bytes, FetchError> {
        self.as_ref().fetch().await
    }

    fn source(&self) -> &str {
        self.as_ref().source()
    }
}

/// Fetches the feed from a fixed URL.
pub struct HttpFeed<C> {
    client: C,
    url: String,
}

impl<C: HttpClient> HttpFeed<C> {
    pub fn new(client: C, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl<C: HttpClient> FeedClient for HttpFeed<C> {
    async fn fetch(&self) -> Result<Bytes, FetchError> {
        fetch_bytes(&self.client, &self.url).await
    }

    fn source(&self) -> &str {
        &self.url
    }
}

/// Reads a previously captured feed from disk.
pub struct FileFeed {
    path: PathBuf,
    display: String,
}

impl FileFeed {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display = path.display().to_string();
        Self { path, display }
    }
}

#[async_trait]
impl FeedClient for FileFeed {
    async fn fetch(&self) -> Result<Bytes, FetchError> {
        Ok(Bytes::from(tokio::fs::read(&self.path).await?))
    }

    fn source(&self) -> &str {
        &self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_feed_reads_bytes() {
        let path = std::env::temp_dir().join("train_tracker_test_file_feed.pb");
        std::fs::write(&path, b"\x0a\x05\x0a\x032.0").unwrap();

        let feed = FileFeed::new(&path);
        let bytes = feed.fetch().await.unwrap();
        assert_eq!(&bytes[..], b"\x0a\x05\x0a\x032.0");
        assert_eq!(feed.source(), path.display().to_string());

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_file_feed_missing_file() {
        let feed = FileFeed::new("/nonexistent/train_tracker/feed.pb");
        let err = feed.fetch().await.unwrap_err();
        assert!(matches!(err, FetchError::Io(_)));
    }
}
