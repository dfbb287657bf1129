/// Card artwork retrieval
///
/// This module handles:
/// - Downloading artwork bytes (http.rs)
/// - Caching resized thumbnails on disk (thumbnail.rs)
/// - Decoding off the async threads and handing the image to a callback
/// - Chaining fetch and color extraction per card (pipeline.rs)

use async_trait::async_trait;
use image::DynamicImage;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::{self, JoinHandle};
use tracing::debug;

use crate::error::FetchError;

pub mod http;
pub mod pipeline;
pub mod thumbnail;

/// Where encoded image bytes come from
#[async_trait]
pub trait ImageSource: Send + Sync + 'static {
    async fn load(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetch and decode an image right away
pub async fn load_image(source: &dyn ImageSource, url: &str) -> Result<DynamicImage, FetchError> {
    let bytes = source.load(url).await?;
    // Decoding is CPU-bound
    let image = task::spawn_blocking(move || image::load_from_memory(&bytes)).await??;
    Ok(image)
}

/// Starts one independent task per requested image
#[derive(Clone)]
pub struct ImageFetcher {
    source: Arc<dyn ImageSource>,
    runtime: Handle,
}

impl ImageFetcher {
    /// `runtime` is where fetch tasks are spawned, so `fetch` can be called
    /// from threads that are not inside the runtime (e.g. the UI thread).
    pub fn new(source: Arc<dyn ImageSource>, runtime: Handle) -> Self {
        Self { source, runtime }
    }

    /// Retrieve and decode `url` in the background.
    ///
    /// `on_ready` runs exactly once on success. On failure, or if the
    /// returned handle is cancelled or dropped first, it never runs.
    pub fn fetch<F>(&self, url: &str, on_ready: F) -> FetchHandle
    where
        F: FnOnce(DynamicImage) + Send + 'static,
    {
        let source = self.source.clone();
        let url = url.to_string();

        let task = self.runtime.spawn(async move {
            match load_image(source.as_ref(), &url).await {
                Ok(image) => on_ready(image),
                Err(e) => debug!("🖼️  Artwork unavailable for {}: {}", url, e),
            }
        });

        FetchHandle { task: Some(task) }
    }
}

/// Owner of an in-flight fetch. Dropping it cancels the fetch.
#[derive(Debug)]
pub struct FetchHandle {
    task: Option<JoinHandle<()>>,
}

impl FetchHandle {
    /// Abort the fetch; the callback will not run if it hasn't already
    pub fn cancel(mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Wait for the fetch (and its callback) to complete
    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for FetchHandle {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use image::{ImageFormat, Rgba, RgbaImage};
    use std::collections::HashMap;
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;

    /// PNG bytes of a solid-color image
    pub fn png(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(rgba)));
        let mut out = Cursor::new(Vec::new());
        img.write_to(&mut out, ImageFormat::Png).unwrap();
        out.into_inner()
    }

    /// In-memory source; unknown URLs answer 404, URLs starting with
    /// "slow:" wait for a permit on `gate`
    pub struct FakeSource {
        pub images: HashMap<String, Vec<u8>>,
        pub gate: Arc<Semaphore>,
        pub loads: AtomicUsize,
    }

    impl FakeSource {
        pub fn new(images: &[(&str, Vec<u8>)]) -> Self {
            Self {
                images: images.iter().map(|(u, b)| (u.to_string(), b.clone())).collect(),
                gate: Arc::new(Semaphore::new(0)),
                loads: AtomicUsize::new(0),
            }
        }
    }

    /// Answer one HTTP request on a local port with a canned response.
    ///
    /// Returns the base URL and a task resolving to the request line the
    /// client sent.
    pub async fn serve_once(status: &str, body: Vec<u8>) -> (String, JoinHandle<String>) {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let head = format!(
            "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status,
            body.len()
        );

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(&body).await.unwrap();
            let _ = socket.shutdown().await;

            String::from_utf8_lossy(&request)
                .lines()
                .next()
                .unwrap_or_default()
                .to_string()
        });

        (format!("http://{}", addr), server)
    }

    #[async_trait]
    impl ImageSource for FakeSource {
        async fn load(&self, url: &str) -> Result<Vec<u8>, FetchError> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            if url.starts_with("slow:") {
                self.gate.acquire().await.unwrap().forget();
            }
            self.images.get(url).cloned().ok_or_else(|| FetchError::Status {
                status: 404,
                url: url.to_string(),
            })
        }
    }
}
