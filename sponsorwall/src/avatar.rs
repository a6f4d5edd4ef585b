// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Downloads sponsor avatars and embeds them as base64 `data:` URIs so the
/// rendered SVG is self-contained.
use std::future::Future;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use indicatif::{ProgressBar, ProgressStyle};
use masterror::AppError;
use reqwest::{Client, header};
use tracing::{debug, info, warn};

use crate::{
    retry::{RetryConfig, retry_with_backoff},
    sponsor::Sponsor,
};

/// User agent sent with every avatar request.
pub const USER_AGENT: &str = "Mozilla/5.0 (compatible; sponsorwall)";

/// Fetches an avatar and returns it as a `data:` URI.
pub trait AvatarLoader
{
    /// Loads the image at `url`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] when the image cannot be retrieved.
    fn load(&self, url: &str,) -> impl Future<Output = Result<String, AppError,>,> + Send;
}

/// [`AvatarLoader`] downloading over HTTPS with bounded retries.
#[derive(Debug, Clone,)]
pub struct HttpAvatarLoader
{
    client: Client,
    retry:  RetryConfig,
}

impl HttpAvatarLoader
{
    /// Creates a loader using the default retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] when the HTTP client cannot be built.
    pub fn new() -> Result<Self, AppError,>
    {
        Self::with_retry(RetryConfig::default(),)
    }

    /// Creates a loader with a custom retry policy.
    ///
    /// # Errors
    ///
    /// Returns [`AppError`] when the HTTP client cannot be built.
    pub fn with_retry(retry: RetryConfig,) -> Result<Self, AppError,>
    {
        let client = Client::builder()
            .user_agent(USER_AGENT,)
            .build()
            .map_err(|e| AppError::internal(format!("failed to build HTTP client: {e}"),),)?;
        Ok(Self {
            client,
            retry,
        },)
    }

    async fn download(&self, url: &str,) -> Result<String, AppError,>
    {
        let response = self
            .client
            .get(url,)
            .send()
            .await
            .map_err(|e| AppError::service(format!("request to {url} failed: {e}"),),)?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::service(format!("avatar {url} returned HTTP {status}"),),);
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE,)
            .and_then(|value| value.to_str().ok(),)
            .map(str::to_owned,);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::service(format!("failed to read avatar body from {url}: {e}"),),)?;

        Ok(to_data_uri(&bytes, &mime_type(content_type.as_deref(), url,),),)
    }
}

impl AvatarLoader for HttpAvatarLoader
{
    async fn load(&self, url: &str,) -> Result<String, AppError,>
    {
        retry_with_backoff(&self.retry, &format!("download avatar {url}"), || self.download(url,),)
            .await
    }
}

/// Picks the MIME type of a downloaded avatar.
///
/// An `image/*` content type wins; otherwise the URL decides between PNG
/// and JPEG.
pub fn mime_type(content_type: Option<&str,>, url: &str,) -> String
{
    if let Some(essence,) = content_type
        .and_then(|value| value.split(';',).next(),)
        .map(str::trim,)
        .filter(|essence| essence.starts_with("image/",),)
    {
        return essence.to_owned();
    }

    if url.contains(".png",) { "image/png".to_owned() } else { "image/jpeg".to_owned() }
}

/// Encodes raw image bytes as a base64 `data:` URI.
pub fn to_data_uri(bytes: &[u8], mime: &str,) -> String
{
    format!("data:{mime};base64,{}", STANDARD.encode(bytes,))
}

/// Outcome of an embedding run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq,)]
pub struct EmbedSummary
{
    pub loaded: usize,
    pub failed: usize,
}

/// Embeds avatars into `sponsors` one at a time.
///
/// Failures are logged and leave the sponsor without an embedded image so
/// rendering falls back to the remote URL.
pub async fn embed_avatars<L,>(loader: &L, sponsors: &mut [Sponsor],) -> EmbedSummary
where
    L: AvatarLoader + Sync,
{
    let pb = ProgressBar::new(sponsors.len() as u64,);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.yellow} [{elapsed_precise}] {bar:30} {pos}/{len} {msg}",)
            .unwrap_or_else(|_| ProgressStyle::default_bar(),),
    );

    let mut summary = EmbedSummary::default();
    for sponsor in sponsors.iter_mut() {
        pb.set_message(format!("Fetching avatar for {}", sponsor.login),);

        if sponsor.avatar_url.is_empty() {
            debug!("{} has no avatar URL", sponsor.login);
            summary.failed += 1;
        } else {
            match loader.load(&sponsor.avatar_url,).await {
                Ok(data_uri,) => {
                    sponsor.avatar_data_uri = Some(data_uri,);
                    summary.loaded += 1;
                }
                Err(error,) => {
                    warn!("Failed to fetch avatar for {}: {}", sponsor.login, error);
                    summary.failed += 1;
                }
            }
        }
        pb.inc(1,);
    }

    pb.finish_and_clear();
    info!("Avatars loaded: {}, failed: {}", summary.loaded, summary.failed);
    summary
}

#[cfg(test)]
mod tests
{
    use std::{
        sync::{Arc, Mutex},
        time::Duration,
    };

    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    use super::*;
    use crate::sponsor::test_support::sponsor;

    /// Serves `response` to every connection and records the request heads.
    async fn serve(response: &'static str,) -> (String, Arc<Mutex<Vec<String,>,>,>,)
    {
        let listener = TcpListener::bind("127.0.0.1:0",).await.expect("bind listener",);
        let address = listener.local_addr().expect("local address",);
        let requests = Arc::new(Mutex::new(Vec::new(),),);
        let recorded = requests.clone();

        tokio::spawn(async move {
            while let Ok((mut stream, _,),) = listener.accept().await {
                let mut head = Vec::new();
                let mut chunk = [0u8; 1024];
                while !head.windows(4,).any(|window| window == b"\r\n\r\n",) {
                    match stream.read(&mut chunk,).await {
                        Ok(0,) | Err(_,) => break,
                        Ok(read,) => head.extend_from_slice(&chunk[..read],),
                    }
                }
                let request = String::from_utf8_lossy(&head,).into_owned();
                recorded.lock().expect("requests lock",).push(request,);
                let _ = stream.write_all(response.as_bytes(),).await;
                let _ = stream.shutdown().await;
            }
        },);

        (format!("http://{address}/u/42"), requests,)
    }

    fn quick_loader(max_attempts: u32,) -> HttpAvatarLoader
    {
        HttpAvatarLoader::with_retry(RetryConfig {
            max_attempts,
            delay_step_ms: 1,
            attempt_timeout: Duration::from_secs(5,),
        },)
        .expect("http client",)
    }

    struct FakeLoader
    {
        broken: &'static str,
        calls:  Mutex<Vec<String,>,>,
    }

    impl AvatarLoader for FakeLoader
    {
        async fn load(&self, url: &str,) -> Result<String, AppError,>
        {
            self.calls.lock().expect("calls lock",).push(url.to_owned(),);
            if url.contains(self.broken,) {
                Err(AppError::service("HTTP 404",),)
            } else {
                Ok(to_data_uri(url.as_bytes(), "image/png",),)
            }
        }
    }

    #[test]
    fn content_type_header_wins()
    {
        assert_eq!(mime_type(Some("image/webp"), "https://x/avatar.png"), "image/webp");
        assert_eq!(mime_type(Some("image/gif; charset=binary"), "https://x/a"), "image/gif");
    }

    #[test]
    fn url_extension_decides_without_image_content_type()
    {
        assert_eq!(mime_type(Some("application/octet-stream"), "https://x/a.png?s=80"), "image/png");
        assert_eq!(mime_type(None, "https://avatars.githubusercontent.com/u/1?v=4"), "image/jpeg");
    }

    #[test]
    fn data_uri_is_base64_encoded()
    {
        assert_eq!(to_data_uri(b"abc", "image/png"), "data:image/png;base64,YWJj");
    }

    #[tokio::test]
    async fn failed_avatars_are_counted_and_left_empty()
    {
        let loader = FakeLoader {
            broken: "bob", calls: Mutex::new(Vec::new(),),
        };
        let mut sponsors = vec![sponsor("alice", 5.0,), sponsor("bob", 5.0,), sponsor("carol", 5.0,)];

        let summary = embed_avatars(&loader, &mut sponsors,).await;

        assert_eq!(summary, EmbedSummary { loaded: 2, failed: 1 });
        assert!(sponsors[0].avatar_data_uri.as_deref().is_some_and(|uri| uri.starts_with("data:image/png;base64,")));
        assert!(sponsors[1].avatar_data_uri.is_none());
        assert_eq!(sponsors[1].avatar_href(), Some(sponsors[1].avatar_url.as_str()));
        assert!(sponsors[2].avatar_data_uri.is_some());
    }

    #[tokio::test]
    async fn avatars_are_fetched_in_order()
    {
        let loader = FakeLoader {
            broken: "never", calls: Mutex::new(Vec::new(),),
        };
        let mut sponsors = vec![sponsor("first", 1.0,), sponsor("second", 1.0,)];

        embed_avatars(&loader, &mut sponsors,).await;

        let calls = loader.calls.lock().expect("calls lock",);
        assert_eq!(calls.len(), 2);
        assert!(calls[0].contains("first"));
        assert!(calls[1].contains("second"));
    }

    #[tokio::test]
    async fn sponsors_without_url_are_not_requested()
    {
        let loader = FakeLoader {
            broken: "never", calls: Mutex::new(Vec::new(),),
        };
        let mut lonely = sponsor("lonely", 1.0,);
        lonely.avatar_url.clear();
        let mut sponsors = vec![lonely];

        let summary = embed_avatars(&loader, &mut sponsors,).await;

        assert_eq!(summary.failed, 1);
        assert!(loader.calls.lock().expect("calls lock",).is_empty());
    }

    #[tokio::test]
    async fn http_loader_embeds_image_with_header_mime_type()
    {
        let (url, requests,) = serve(
            "HTTP/1.1 200 OK\r\nContent-Type: image/webp\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabc",
        )
        .await;

        let data_uri = quick_loader(1,).load(&url,).await.expect("avatar should load",);

        assert_eq!(data_uri, "data:image/webp;base64,YWJj");
        let requests = requests.lock().expect("requests lock",);
        assert_eq!(requests.len(), 1);
        let head = requests[0].to_ascii_lowercase();
        assert!(head.contains("user-agent: mozilla/5.0 (compatible; sponsorwall)"));
    }

    #[tokio::test]
    async fn http_loader_falls_back_to_url_mime_type()
    {
        let (url, _requests,) = serve(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nContent-Length: 3\r\nConnection: close\r\n\r\nabc",
        )
        .await;

        let data_uri = quick_loader(1,).load(&url,).await.expect("avatar should load",);

        assert_eq!(data_uri, "data:image/jpeg;base64,YWJj");
    }

    #[tokio::test]
    async fn http_loader_fails_on_error_status_after_retries()
    {
        let (url, requests,) = serve(
            "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        )
        .await;

        let result = quick_loader(2,).load(&url,).await;

        assert!(result.is_err(), "404 must fail");
        assert_eq!(requests.lock().expect("requests lock",).len(), 2);
    }
}
