//! Best-effort adapter from sampler tensors to the canonical raster.
//!
//! Sampling pipelines disagree on batching, channel order and value range. [`normalize`] accepts
//! the common conventions and produces an `(h, w, 3)` 8-bit image:
//!
//! - 4 axes: the first axis is a batch, only element 0 is kept.
//! - 2 axes: single channel, a trailing channel axis of size 1 is implied.
//! - first axis `<= 3`: channel-first, transposed to channel-last.
//! - 1 channel is replicated to 3; more than 3 channels is rejected.
//! - floats containing any negative value are read as `[-1, 1]` (`x * 127.5 + 128`), otherwise
//!   as `[0, 1]` (`x * 255`). Everything is clipped to `[0, 255]`.
//!
//! The channel-first test assumes real images are never 3 pixels or less along an axis. A
//! channel-first candidate whose last axis is also a valid channel count (1 or 3) reads as a
//! picture either way and is rejected as ambiguous.

use crate::{
    foundation::error::{TpdneError, TpdneResult},
    frame::{Frame, FrameData},
};

/// Normalized, encoder-ready raster: 3 channels, 8 bits each.
pub type CanonicalImage = image::RgbImage;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Layout {
    ChannelsFirst,
    ChannelsLast,
}

/// Interpretation of a frame's shape.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Geometry {
    pub(crate) height: usize,
    pub(crate) width: usize,
    pub(crate) channels: usize,
    pub(crate) layout: Layout,
}

impl Geometry {
    fn sample_len(self) -> usize {
        self.height * self.width * self.channels
    }

    fn index(self, x: usize, y: usize, ch: usize) -> usize {
        match self.layout {
            Layout::ChannelsLast => (y * self.width + x) * self.channels + ch,
            Layout::ChannelsFirst => ch * self.height * self.width + y * self.width + x,
        }
    }
}

pub(crate) fn resolve_geometry(shape: &[usize]) -> TpdneResult<Geometry> {
    let dims: [usize; 3] = match *shape {
        [0, _, _, _] => return Err(TpdneError::shape("batched frame has an empty batch axis")),
        [_, a, b, c] => [a, b, c],
        [a, b, c] => [a, b, c],
        [h, w] => [h, w, 1],
        _ => {
            return Err(TpdneError::shape(format!(
                "expected 2, 3 or 4 axes, got {} (shape {shape:?})",
                shape.len()
            )));
        }
    };

    let geom = match dims {
        [c, h, w] if c <= 3 => {
            if matches!(w, 1 | 3) {
                return Err(TpdneError::shape(format!(
                    "ambiguous layout {dims:?}: cannot tell channel-first from channel-last"
                )));
            }
            Geometry {
                height: h,
                width: w,
                channels: c,
                layout: Layout::ChannelsFirst,
            }
        }
        [h, w, c] => Geometry {
            height: h,
            width: w,
            channels: c,
            layout: Layout::ChannelsLast,
        },
    };

    match geom.channels {
        1 | 3 => {}
        c if c > 3 => {
            return Err(TpdneError::shape(format!(
                "frame has {c} channels, at most 3 are supported (shape {shape:?})"
            )));
        }
        c => {
            return Err(TpdneError::shape(format!(
                "frame has {c} channels, expected 1 or 3 (shape {shape:?})"
            )));
        }
    }

    if geom.height == 0 || geom.width == 0 {
        return Err(TpdneError::shape(format!(
            "frame has an empty spatial axis (shape {shape:?})"
        )));
    }

    Ok(geom)
}

/// Convert a sampled frame into a [`CanonicalImage`].
pub fn normalize(frame: &Frame) -> TpdneResult<CanonicalImage> {
    let geom = resolve_geometry(frame.shape())?;
    let n = geom.sample_len();

    match frame.data() {
        FrameData::U8(v) => rasterize(geom, |i| v[i]),
        FrameData::F32(v) => {
            let sample = &v[..n];
            let signed = sample.iter().any(|&x| x < 0.0);
            rasterize(geom, |i| float_to_u8(f64::from(sample[i]), signed))
        }
        FrameData::F64(v) => {
            let sample = &v[..n];
            let signed = sample.iter().any(|&x| x < 0.0);
            rasterize(geom, |i| float_to_u8(sample[i], signed))
        }
    }
}

fn float_to_u8(x: f64, signed: bool) -> u8 {
    let scaled = if signed { x * 127.5 + 128.0 } else { x * 255.0 };
    // NaN survives clamp and casts to 0.
    scaled.clamp(0.0, 255.0) as u8
}

fn rasterize(geom: Geometry, value: impl Fn(usize) -> u8) -> TpdneResult<CanonicalImage> {
    let width = u32::try_from(geom.width)
        .map_err(|_| TpdneError::shape(format!("frame width {} exceeds u32", geom.width)))?;
    let height = u32::try_from(geom.height)
        .map_err(|_| TpdneError::shape(format!("frame height {} exceeds u32", geom.height)))?;

    Ok(image::RgbImage::from_fn(width, height, |x, y| {
        let (x, y) = (x as usize, y as usize);
        let mut px = [0u8; 3];
        for (ch, out) in px.iter_mut().enumerate() {
            let src_ch = if geom.channels == 1 { 0 } else { ch };
            *out = value(geom.index(x, y, src_ch));
        }
        image::Rgb(px)
    }))
}

#[cfg(test)]
#[path = "../tests/unit/normalize/normalize.rs"]
mod tests;
