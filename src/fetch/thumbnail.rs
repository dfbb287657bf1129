use async_trait::async_trait;
use image::{imageops::FilterType, ImageFormat};
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use super::ImageSource;
use crate::error::FetchError;

/// Get the thumbnail cache directory
/// Returns ~/.cache/pokedex-list/thumbnails on Linux
pub fn default_cache_dir() -> Option<PathBuf> {
    let mut path = dirs::cache_dir().or_else(dirs::home_dir)?;
    path.push("pokedex-list");
    path.push("thumbnails");
    Some(path)
}

/// Wraps another source and keeps resized PNG copies on disk
///
/// The first load of a URL downloads, shrinks the image to fit
/// `size` x `size` and stores it; later loads read the stored file.
/// `dir` must already exist.
pub struct CachedSource<S> {
    inner: S,
    dir: PathBuf,
    size: u32,
}

impl<S: ImageSource> CachedSource<S> {
    pub fn new(inner: S, dir: PathBuf, size: u32) -> Self {
        Self { inner, dir, size }
    }

    /// Expected cache file for a URL at this thumbnail size (doesn't check it exists)
    pub fn cache_path(&self, url: &str) -> PathBuf {
        self.dir.join(format!("{:x}-{}.png", md5::compute(url), self.size))
    }
}

#[async_trait]
impl<S: ImageSource> ImageSource for CachedSource<S> {
    async fn load(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.cache_path(url);

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                // A damaged file is dropped and downloaded again
                let checked = tokio::task::spawn_blocking(move || {
                    image::load_from_memory(&bytes).map(|_| bytes)
                })
                .await?;
                match checked {
                    Ok(bytes) => {
                        debug!("📁 Thumbnail cache hit: {}", path.display());
                        return Ok(bytes);
                    }
                    Err(e) => {
                        warn!("⚠️  Discarding corrupt thumbnail {}: {}", path.display(), e);
                        let _ = tokio::fs::remove_file(&path).await;
                    }
                }
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("⚠️  Unreadable cached thumbnail {}: {}", path.display(), e),
        }

        let original = self.inner.load(url).await?;
        let size = self.size;
        let thumbnail = tokio::task::spawn_blocking(move || make_thumbnail(&original, size)).await??;

        // A failed write only costs a re-download next time
        if let Err(e) = write_atomic(&path, &thumbnail).await {
            warn!("⚠️  Failed to cache thumbnail {}: {}", path.display(), e);
        } else {
            debug!("📸 Cached thumbnail: {}", path.display());
        }

        Ok(thumbnail)
    }
}

/// Write next to `path`, then rename over it, so readers never see a partial file
async fn write_atomic(path: &Path, data: &[u8]) -> io::Result<()> {
    let partial = path.with_extension("part");
    tokio::fs::write(&partial, data).await?;
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e);
    }
    Ok(())
}

/// Decode, shrink to fit `size` x `size` (never enlarge), re-encode as PNG
fn make_thumbnail(data: &[u8], size: u32) -> Result<Vec<u8>, FetchError> {
    let img = image::load_from_memory(data)?;

    let img = if img.width() > size || img.height() > size {
        img.resize(size, size, FilterType::Lanczos3)
    } else {
        img
    };

    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png)?;
    Ok(out.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::{png, FakeSource};
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    #[test]
    fn test_make_thumbnail_shrinks_large_images() {
        let data = png(600, 300, [255, 0, 0, 255]);
        let thumb = image::load_from_memory(&make_thumbnail(&data, 256).unwrap()).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (256, 128));
    }

    #[test]
    fn test_make_thumbnail_keeps_small_images() {
        let data = png(96, 96, [0, 255, 0, 255]);
        let thumb = image::load_from_memory(&make_thumbnail(&data, 256).unwrap()).unwrap();
        assert_eq!((thumb.width(), thumb.height()), (96, 96));
    }

    #[tokio::test]
    async fn test_second_load_is_served_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new(&[("https://img/1.png", png(512, 512, [10, 20, 30, 255]))]);
        let cached = CachedSource::new(source, dir.path().to_path_buf(), 256);

        let first = cached.load("https://img/1.png").await.unwrap();
        assert!(cached.cache_path("https://img/1.png").exists());
        let second = cached.load("https://img/1.png").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cached.inner.loads.load(Ordering::SeqCst), 1);
        let img = image::load_from_memory(&second).unwrap();
        assert_eq!(img.width(), 256);
    }

    #[tokio::test]
    async fn test_undecodable_download_is_not_cached() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new(&[("https://img/bad.png", b"<html>".to_vec())]);
        let cached = CachedSource::new(source, dir.path().to_path_buf(), 256);

        let result = cached.load("https://img/bad.png").await;

        assert!(matches!(result, Err(FetchError::Decode(_))));
        assert!(!cached.cache_path("https://img/bad.png").exists());
    }

    #[tokio::test]
    async fn test_works_behind_fetcher() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new(&[("https://img/4.png", png(8, 8, [200, 80, 20, 255]))]);
        let cached: Arc<dyn ImageSource> =
            Arc::new(CachedSource::new(source, dir.path().to_path_buf(), 256));

        let image = crate::fetch::load_image(cached.as_ref(), "https://img/4.png").await.unwrap();
        assert_eq!(image.width(), 8);
    }

    #[tokio::test]
    async fn test_corrupt_cache_file_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let source = FakeSource::new(&[("https://img/7.png", png(300, 300, [40, 90, 200, 255]))]);
        let cached = CachedSource::new(source, dir.path().to_path_buf(), 256);
        let path = cached.cache_path("https://img/7.png");

        // Cut off right after the PNG signature
        std::fs::write(&path, b"\x89PNG\r\n").unwrap();

        for _ in 0..3 {
            let image = crate::fetch::load_image(&cached, "https://img/7.png").await.unwrap();
            assert_eq!(image.width(), 256);
        }

        assert_eq!(cached.inner.loads.load(Ordering::SeqCst), 1);
        assert!(image::load_from_memory(&std::fs::read(&path).unwrap()).is_ok());
        assert!(!path.with_extension("part").exists());
    }

    #[tokio::test]
    async fn test_cache_key_depends_on_size() {
        let dir = tempfile::tempdir().unwrap();
        let url = "https://img/9.png";
        let source = || FakeSource::new(&[(url, png(400, 400, [1, 2, 3, 255]))]);

        let small = CachedSource::new(source(), dir.path().to_path_buf(), 64);
        small.load(url).await.unwrap();

        let large = CachedSource::new(source(), dir.path().to_path_buf(), 128);
        assert_ne!(small.cache_path(url), large.cache_path(url));
        let bytes = large.load(url).await.unwrap();

        assert_eq!(large.inner.loads.load(Ordering::SeqCst), 1);
        assert_eq!(image::load_from_memory(&bytes).unwrap().width(), 128);
    }

    #[test]
    fn test_cache_path_is_stable() {
        let source = FakeSource::new(&[]);
        let cached = CachedSource::new(source, PathBuf::from("/cache"), 256);
        assert_eq!(
            cached.cache_path("a"),
            PathBuf::from(format!("/cache/{:x}-256.png", md5::compute("a")))
        );
        assert_eq!(cached.cache_path("a"), cached.cache_path("a"));
        assert_ne!(cached.cache_path("a"), cached.cache_path("b"));
    }
}
