/// Dominant color extraction
///
/// Every card is tinted with the most representative color of its artwork.
/// The palette is reduced by keeping the top 4 bits of each channel
/// (4096 buckets), fully transparent pixels are ignored, and the winning
/// bucket is reported as the mean of the pixels that fell into it.

use image::DynamicImage;
use std::sync::Arc;
use tokio::task::{self, JoinError, JoinHandle};

/// Bits dropped from each channel when bucketing
const QUANTIZE_SHIFT: u8 = 4;

/// Number of levels per channel after quantization
const LEVELS: usize = 1 << (8 - QUANTIZE_SHIFT);

/// An opaque sRGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    /// Theme color used when no artwork (or no opaque pixel) is available
    pub const NEUTRAL: Color = Color::rgb(0xF5, 0xF5, 0xF5);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Pack as 0xAARRGGBB with full alpha
    pub fn to_argb(self) -> u32 {
        0xFF00_0000 | (self.r as u32) << 16 | (self.g as u32) << 8 | self.b as u32
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

#[derive(Clone, Copy, Default)]
struct Bucket {
    count: u32,
    sum: [u64; 3],
}

/// Compute the dominant color of an image.
///
/// Deterministic: identical pixel data always yields the identical color.
/// Ties between buckets go to the bucket seen first in row-major order.
pub fn dominant_color(image: &DynamicImage) -> Color {
    let rgba = image.to_rgba8();

    let mut buckets = vec![Bucket::default(); LEVELS * LEVELS * LEVELS];
    // Bucket indices in order of first appearance
    let mut scan_order: Vec<usize> = Vec::new();

    for pixel in rgba.pixels() {
        let [r, g, b, a] = pixel.0;
        if a == 0 {
            continue;
        }

        let index = bucket_index(r, g, b);
        let bucket = &mut buckets[index];
        if bucket.count == 0 {
            scan_order.push(index);
        }
        bucket.count += 1;
        bucket.sum[0] += r as u64;
        bucket.sum[1] += g as u64;
        bucket.sum[2] += b as u64;
    }

    let mut winner: Option<&Bucket> = None;
    for &index in &scan_order {
        let bucket = &buckets[index];
        if winner.map_or(true, |best| bucket.count > best.count) {
            winner = Some(bucket);
        }
    }

    match winner {
        Some(bucket) => {
            let n = bucket.count as u64;
            Color::rgb(
                (bucket.sum[0] / n) as u8,
                (bucket.sum[1] / n) as u8,
                (bucket.sum[2] / n) as u8,
            )
        }
        None => Color::NEUTRAL,
    }
}

fn bucket_index(r: u8, g: u8, b: u8) -> usize {
    let r = (r >> QUANTIZE_SHIFT) as usize;
    let g = (g >> QUANTIZE_SHIFT) as usize;
    let b = (b >> QUANTIZE_SHIFT) as usize;
    (r * LEVELS + g) * LEVELS + b
}

/// Run `dominant_color` on the blocking pool.
///
/// Scanning a full image is CPU-bound, so it never runs on the thread that
/// drives the UI.
pub async fn dominant_color_off_thread(image: Arc<DynamicImage>) -> Result<Color, JoinError> {
    task::spawn_blocking(move || dominant_color(&image)).await
}

/// Callback flavor of `dominant_color_off_thread`.
///
/// `on_ready` is invoked once with the color, or with `Color::NEUTRAL` if the
/// worker failed.
pub fn spawn_dominant_color<F>(image: Arc<DynamicImage>, on_ready: F) -> JoinHandle<()>
where
    F: FnOnce(Color) + Send + 'static,
{
    task::spawn(async move {
        let color = dominant_color_off_thread(image).await.unwrap_or_else(|e| {
            tracing::warn!("⚠️  Color extraction failed: {}", e);
            Color::NEUTRAL
        });
        on_ready(color);
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    fn image_from(width: u32, height: u32, f: impl Fn(u32, u32) -> [u8; 4]) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| Rgba(f(x, y))))
    }

    #[test]
    fn test_single_color() {
        let img = image_from(8, 8, |_, _| [200, 40, 40, 255]);
        assert_eq!(dominant_color(&img), Color::rgb(200, 40, 40));
    }

    #[test]
    fn test_majority_wins() {
        // 3 columns yellow, 1 column blue
        let img = image_from(4, 4, |x, _| {
            if x < 3 { [250, 210, 50, 255] } else { [30, 60, 200, 255] }
        });
        assert_eq!(dominant_color(&img), Color::rgb(250, 210, 50));
    }

    #[test]
    fn test_transparent_pixels_ignored() {
        // Mostly transparent black background, small opaque green area
        let img = image_from(10, 10, |x, y| {
            if x < 2 && y < 2 { [20, 180, 60, 255] } else { [0, 0, 0, 0] }
        });
        assert_eq!(dominant_color(&img), Color::rgb(20, 180, 60));
    }

    #[test]
    fn test_fully_transparent_is_neutral() {
        let img = image_from(4, 4, |_, _| [255, 0, 0, 0]);
        assert_eq!(dominant_color(&img), Color::NEUTRAL);
    }

    #[test]
    fn test_tie_goes_to_first_scanned() {
        // Left half red, right half blue: equal counts, red is scanned first
        let img = image_from(2, 2, |x, _| {
            if x == 0 { [220, 0, 0, 255] } else { [0, 0, 220, 255] }
        });
        assert_eq!(dominant_color(&img), Color::rgb(220, 0, 0));
    }

    #[test]
    fn test_bucket_mean() {
        // Both shades land in the same bucket (high nibble 0xA)
        let img = image_from(2, 1, |x, _| {
            if x == 0 { [0xA0, 0xA0, 0xA0, 255] } else { [0xAE, 0xAE, 0xAE, 255] }
        });
        assert_eq!(dominant_color(&img), Color::rgb(0xA7, 0xA7, 0xA7));
    }

    #[test]
    fn test_deterministic() {
        let img = image_from(16, 16, |x, y| [(x * 16) as u8, (y * 16) as u8, ((x + y) * 8) as u8, 255]);
        let first = dominant_color(&img);
        for _ in 0..5 {
            assert_eq!(dominant_color(&img), first);
        }
    }

    #[test]
    fn test_argb_packing() {
        assert_eq!(Color::rgb(0x12, 0x34, 0x56).to_argb(), 0xFF12_3456);
    }

    #[tokio::test]
    async fn test_spawn_dominant_color_reports_via_callback() {
        let img = Arc::new(image_from(4, 4, |_, _| [10, 100, 200, 255]));
        let (tx, rx) = tokio::sync::oneshot::channel();

        spawn_dominant_color(img, move |color| {
            let _ = tx.send(color);
        });

        assert_eq!(rx.await.unwrap(), Color::rgb(10, 100, 200));
    }
}
