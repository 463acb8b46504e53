use gl_thin::device::{PixelFormat, TextureImage};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to decode image: {0}")]
    Decode(String),
    #[error("unsupported image format: {0}")]
    Unsupported(String),
}

/// Tightly packed 8-bit pixels
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
    pub pixels: Vec<u8>,
}

impl DecodedImage {
    pub fn as_texture_image(&self) -> TextureImage<'_> {
        TextureImage {
            width: self.width,
            height: self.height,
            format: self.format,
            pixels: &self.pixels,
        }
    }

    /// The "shader not found" image: magenta and black squares.
    pub fn placeholder() -> Self {
        const SIZE: u32 = 8;
        const CELL: u32 = 4;
        let mut pixels = Vec::with_capacity((SIZE * SIZE * 3) as usize);
        for y in 0..SIZE {
            for x in 0..SIZE {
                if (x / CELL + y / CELL) % 2 == 0 {
                    pixels.extend_from_slice(&[255, 0, 255]);
                } else {
                    pixels.extend_from_slice(&[0, 0, 0]);
                }
            }
        }
        Self {
            width: SIZE,
            height: SIZE,
            format: PixelFormat::Rgb,
            pixels,
        }
    }
}

pub fn load_image(path: &Path) -> Result<DecodedImage, ImageError> {
    let raw = std::fs::read(path)?;
    decode_image(path, &raw)
}

fn decode_image(path: &Path, raw: &[u8]) -> Result<DecodedImage, ImageError> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        #[cfg(feature = "png")]
        "png" => decode_png(raw),
        _ => Err(ImageError::Unsupported(path.display().to_string())),
    }
}

#[cfg(feature = "png")]
pub fn decode_png(raw: &[u8]) -> Result<DecodedImage, ImageError> {
    use png::{ColorType, Transformations};

    let mut decoder = png::Decoder::new(raw);
    // palettes and 16-bit channels come out as plain 8-bit
    decoder.set_transformations(Transformations::EXPAND | Transformations::STRIP_16);
    let mut reader = decoder
        .read_info()
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    let mut buf = vec![0u8; reader.output_buffer_size()];
    let info = reader
        .next_frame(&mut buf)
        .map_err(|e| ImageError::Decode(e.to_string()))?;
    buf.truncate(info.buffer_size());

    let format = match info.color_type {
        ColorType::Grayscale => PixelFormat::Red,
        ColorType::GrayscaleAlpha => PixelFormat::Rg,
        ColorType::Rgb => PixelFormat::Rgb,
        ColorType::Rgba => PixelFormat::Rgba,
        ColorType::Indexed => {
            return Err(ImageError::Decode(
                "indexed image was not expanded".to_string(),
            ))
        }
    };

    // rows are packed whenever the channel depth is 8 bits
    let expected = info.width as usize * info.height as usize * format.channels();
    if buf.len() != expected {
        return Err(ImageError::Decode(format!(
            "expected {} bytes of pixels, got {}",
            expected,
            buf.len()
        )));
    }

    Ok(DecodedImage {
        width: info.width,
        height: info.height,
        format,
        pixels: buf,
    })
}
