use std::{
    fmt,
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

use anyhow::Context as _;
use image::{
    ExtendedColorType, ImageEncoder as _,
    codecs::{
        jpeg::JpegEncoder,
        png::{CompressionType, FilterType, PngEncoder},
        webp::WebPEncoder,
    },
};

use crate::{
    foundation::error::{TpdneError, TpdneResult},
    normalize::CanonicalImage,
};

/// Output encodings supported for the published image.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    /// Lossless WebP.
    #[default]
    Webp,
    /// PNG at best compression with adaptive filtering.
    Png,
    /// Baseline JPEG at the configured quality.
    Jpeg,
}

impl ImageFormat {
    /// File extension (without the dot) written for this format.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webp => "webp",
            Self::Png => "png",
            Self::Jpeg => "jpeg",
        }
    }

    /// Whether `quality` changes the encoded output for this format.
    pub fn honors_quality(self) -> bool {
        matches!(self, Self::Jpeg)
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Encode `img` into `out`. `quality` is in `1..=100` and only affects JPEG.
pub fn encode_image<W: Write>(
    img: &CanonicalImage,
    format: ImageFormat,
    quality: u8,
    out: W,
) -> TpdneResult<()> {
    let (width, height) = img.dimensions();
    let buf = img.as_raw();

    let res = match format {
        ImageFormat::Jpeg => JpegEncoder::new_with_quality(out, quality).write_image(
            buf,
            width,
            height,
            ExtendedColorType::Rgb8,
        ),
        ImageFormat::Png => {
            PngEncoder::new_with_quality(out, CompressionType::Best, FilterType::Adaptive)
                .write_image(buf, width, height, ExtendedColorType::Rgb8)
        }
        ImageFormat::Webp => {
            WebPEncoder::new_lossless(out).write_image(buf, width, height, ExtendedColorType::Rgb8)
        }
    };

    res.map_err(|e| TpdneError::encode(format!("{format} {width}x{height}: {e}")))
}

/// Encode `img` into a freshly created file at `path`, returning once every byte is flushed.
pub fn write_image(
    img: &CanonicalImage,
    format: ImageFormat,
    quality: u8,
    path: &Path,
) -> TpdneResult<()> {
    let file = File::create(path).with_context(|| format!("create '{}'", path.display()))?;
    let mut w = BufWriter::new(file);
    encode_image(img, format, quality, &mut w)?;
    w.flush()
        .with_context(|| format!("flush '{}'", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/codec.rs"]
mod tests;
