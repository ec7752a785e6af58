//! 8-bit RGB output buffer.

use crate::bucket::BucketResult;

/// A `width x height` grid of RGB pixels, row-major, top row first.
///
/// Stored as one flat interleaved byte vector so encoders can take it
/// as-is; [`Framebuffer::slots_mut`] hands out one exclusive `&mut [u8; 3]`
/// per pixel for parallel writers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl Framebuffer {
    /// Create a new framebuffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0; width as usize * height as usize * 3],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.data.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn pixels(&self) -> &[[u8; 3]] {
        bytemuck::cast_slice(&self.data)
    }

    fn pixels_mut(&mut self) -> &mut [[u8; 3]] {
        bytemuck::cast_slice_mut(&mut self.data)
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> [u8; 3] {
        self.pixels()[self.index(x, y)]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, rgb: [u8; 3]) {
        let index = self.index(x, y);
        self.pixels_mut()[index] = rgb;
    }

    /// Every pixel slot with its coordinates, in row-major order.
    ///
    /// Each slot is a distinct mutable borrow, so slots can be moved into
    /// independent tasks.
    pub fn slots_mut(&mut self) -> impl Iterator<Item = (u32, u32, &mut [u8; 3])> {
        let width = self.width as usize;
        self.pixels_mut()
            .iter_mut()
            .enumerate()
            .map(move |(index, slot)| ((index % width) as u32, (index / width) as u32, slot))
    }

    /// Copy a rendered bucket into place.
    pub fn write_bucket(&mut self, result: &BucketResult) {
        let bucket = &result.bucket;
        for (row, line) in result.pixels.chunks_exact(bucket.width as usize).enumerate() {
            let start = self.index(bucket.x, bucket.y + row as u32);
            self.pixels_mut()[start..start + line.len()].copy_from_slice(line);
        }
    }

    /// Interleaved RGB bytes, row-major, top to bottom.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.data
    }
}
