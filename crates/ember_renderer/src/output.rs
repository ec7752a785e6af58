//! Image encoders: plain-text PPM and PNG/JPEG through the `image` crate.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{RenderError, RenderResult};
use crate::{Framebuffer, Hittable, Renderer};
use image::codecs::jpeg::JpegEncoder;
use image::{ColorType, ImageFormat as CodecFormat};
use log::info;

/// Output formats, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Ppm,
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Pick the format from a path's extension (case-insensitive).
    pub fn from_path(path: &Path) -> RenderResult<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "ppm" => Ok(Self::Ppm),
            "png" => Ok(Self::Png),
            "jpg" | "jpeg" => Ok(Self::Jpeg),
            _ => Err(RenderError::UnsupportedFormat(extension)),
        }
    }
}

fn write_ppm_header<W: Write>(writer: &mut W, width: u32, height: u32) -> std::io::Result<()> {
    writeln!(writer, "P3")?;
    writeln!(writer, "{} {}", width, height)?;
    writeln!(writer, "255")
}

/// Write a finished framebuffer as plain-text PPM.
pub fn write_ppm<W: Write>(framebuffer: &Framebuffer, mut writer: W) -> RenderResult<()> {
    write_ppm_header(&mut writer, framebuffer.width(), framebuffer.height())?;
    for rgb in framebuffer.as_bytes().chunks_exact(3) {
        writeln!(writer, "{} {} {}", rgb[0], rgb[1], rgb[2])?;
    }
    writer.flush()?;
    Ok(())
}

/// Render on the calling thread and write each pixel as soon as it is done.
pub fn write_ppm_streaming<W: Write>(renderer: &Renderer, world: &dyn Hittable, mut writer: W) -> RenderResult<()> {
    let camera = renderer.camera();
    write_ppm_header(&mut writer, camera.image_width(), camera.image_height())?;
    renderer.render_streaming(world, |_, _, rgb| writeln!(writer, "{} {} {}", rgb[0], rgb[1], rgb[2]))?;
    writer.flush()?;
    Ok(())
}

/// Save a framebuffer, picking the encoder from the file extension.
///
/// JPEG is written at quality 100.
pub fn save_image(framebuffer: &Framebuffer, path: &Path) -> RenderResult<()> {
    let format = ImageFormat::from_path(path)?;
    let (width, height) = (framebuffer.width(), framebuffer.height());

    match format {
        ImageFormat::Ppm => write_ppm(framebuffer, BufWriter::new(File::create(path)?))?,
        ImageFormat::Png => {
            image::save_buffer_with_format(path, framebuffer.as_bytes(), width, height, ColorType::Rgb8, CodecFormat::Png)?
        }
        ImageFormat::Jpeg => {
            let mut writer = BufWriter::new(File::create(path)?);
            JpegEncoder::new_with_quality(&mut writer, 100).encode(
                framebuffer.as_bytes(),
                width,
                height,
                ColorType::Rgb8,
            )?;
            writer.flush()?;
        }
    }

    info!("Saved {}x{} {:?} image to {}", width, height, format, path.display());
    Ok(())
}
