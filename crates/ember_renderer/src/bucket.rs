//! Square tiles for the bucket scheduler.
//!
//! Each tile is an independent unit of rayon work; pixels inside a tile
//! still get their own seeded stream, so tiling never changes the image.

use crate::renderer::shade_pixel;
use crate::{Camera, Hittable};

/// A rectangular block of pixels, clipped to the image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bucket {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Position in render order
    pub index: usize,
}

impl Bucket {
    pub fn new(x: u32, y: u32, width: u32, height: u32, index: usize) -> Self {
        Self { x, y, width, height, index }
    }

    pub fn pixel_count(&self) -> u32 {
        self.width * self.height
    }

    /// Squared distance from this bucket's center to the image center, in
    /// half-pixel units so it stays integral.
    fn center_distance(&self, image_width: u32, image_height: u32) -> u64 {
        let dx = (2 * self.x as i64 + self.width as i64 - image_width as i64).unsigned_abs();
        let dy = (2 * self.y as i64 + self.height as i64 - image_height as i64).unsigned_abs();
        dx * dx + dy * dy
    }
}

/// Default bucket edge in pixels.
pub const DEFAULT_BUCKET_SIZE: u32 = 64;

/// Tile a `width x height` image, center buckets first.
///
/// Edge buckets are clipped. Buckets at equal distance keep scanline order.
pub fn generate_buckets(width: u32, height: u32, bucket_size: u32) -> Vec<Bucket> {
    let edge = bucket_size.max(1);

    let mut buckets: Vec<Bucket> = (0..height)
        .step_by(edge as usize)
        .flat_map(|y| {
            (0..width)
                .step_by(edge as usize)
                .map(move |x| Bucket::new(x, y, edge.min(width - x), edge.min(height - y), 0))
        })
        .collect();

    buckets.sort_by_key(|bucket| bucket.center_distance(width, height));
    for (index, bucket) in buckets.iter_mut().enumerate() {
        bucket.index = index;
    }

    buckets
}

/// Shade every pixel of `bucket`.
pub fn render_bucket(bucket: &Bucket, camera: &Camera, world: &dyn Hittable, seed: u64) -> BucketResult {
    let mut pixels = Vec::with_capacity(bucket.pixel_count() as usize);

    for local_y in 0..bucket.height {
        for local_x in 0..bucket.width {
            pixels.push(shade_pixel(camera, world, bucket.x + local_x, bucket.y + local_y, seed));
        }
    }

    BucketResult::new(*bucket, pixels)
}

/// Quantized pixels of one bucket, row-major within the bucket.
#[derive(Debug, Clone)]
pub struct BucketResult {
    pub bucket: Bucket,
    pub pixels: Vec<[u8; 3]>,
}

impl BucketResult {
    pub fn new(bucket: Bucket, pixels: Vec<[u8; 3]>) -> Self {
        Self { bucket, pixels }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_counts_and_clipping() {
        for (width, height, edge, count) in [(128, 128, 64, 4), (100, 70, 64, 4), (5, 3, 10, 1), (9, 1, 4, 3)] {
            let buckets = generate_buckets(width, height, edge);
            assert_eq!(buckets.len(), count, "{}x{} by {}", width, height, edge);
            assert!(buckets.iter().all(|b| b.x + b.width <= width && b.y + b.height <= height));
        }
    }

    #[test]
    fn test_center_bucket_comes_first() {
        let buckets = generate_buckets(192, 192, 64);
        assert_eq!(buckets.len(), 9);
        assert_eq!((buckets[0].x, buckets[0].y), (64, 64));
        // Corners are farthest out
        assert!(buckets[5..].iter().all(|b| b.x != 64 && b.y != 64));
        assert!(buckets.iter().enumerate().all(|(i, b)| b.index == i));
    }

    #[test]
    fn test_render_order_moves_outward() {
        let (width, height) = (300, 170);
        let distances: Vec<u64> = generate_buckets(width, height, 32)
            .iter()
            .map(|b| b.center_distance(width, height))
            .collect();
        assert!(distances.windows(2).all(|pair| pair[0] <= pair[1]));
    }

    #[test]
    fn test_buckets_tile_the_image_exactly_once() {
        let (width, height) = (37, 23);
        let mut covered = vec![0u8; (width * height) as usize];
        for bucket in generate_buckets(width, height, 8) {
            for y in bucket.y..bucket.y + bucket.height {
                for x in bucket.x..bucket.x + bucket.width {
                    covered[(y * width + x) as usize] += 1;
                }
            }
        }
        assert!(covered.iter().all(|&c| c == 1));
    }

    #[test]
    fn test_zero_edge_is_treated_as_one() {
        assert_eq!(generate_buckets(3, 2, 0).len(), 6);
    }
}
