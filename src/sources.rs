use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    foundation::error::{TpdneError, TpdneResult},
    frame::Frame,
};

/// Producer of the frames the publish loop publishes.
///
/// A sampler may be arbitrarily slow; the loop never times it out. Returning an error ends the
/// loop.
pub trait Sampler {
    fn sample(&mut self) -> anyhow::Result<Frame>;
}

impl<F> Sampler for F
where
    F: FnMut() -> anyhow::Result<Frame>,
{
    fn sample(&mut self) -> anyhow::Result<Frame> {
        self()
    }
}

/// Serializable choice of built-in sampler.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase", deny_unknown_fields)]
pub enum SourceConfig {
    /// [`GradientSampler`] of the given size.
    Gradient { width: usize, height: usize },
    /// [`ImageDirSampler`] over `path`.
    Dir { path: PathBuf },
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self::Gradient {
            width: 256,
            height: 256,
        }
    }
}

impl SourceConfig {
    pub fn build(&self) -> TpdneResult<Box<dyn Sampler>> {
        let sampler: Box<dyn Sampler> = match self {
            Self::Gradient { width, height } => Box::new(GradientSampler::new(*width, *height)?),
            Self::Dir { path } => Box::new(ImageDirSampler::new(path)?),
        };
        Ok(sampler)
    }
}

/// Animated colour field, emitted channel-first in `[-1, 1]` like a generator network would.
#[derive(Clone, Debug)]
pub struct GradientSampler {
    width: usize,
    height: usize,
    phase: f32,
    step: f32,
}

impl GradientSampler {
    pub fn new(width: usize, height: usize) -> TpdneResult<Self> {
        if width < 4 || height < 4 {
            return Err(TpdneError::config(format!(
                "gradient size must be at least 4x4, got {width}x{height}"
            )));
        }
        Ok(Self {
            width,
            height,
            phase: 0.0,
            step: 0.15,
        })
    }
}

impl Sampler for GradientSampler {
    fn sample(&mut self) -> anyhow::Result<Frame> {
        let (w, h) = (self.width, self.height);
        let tau = std::f32::consts::TAU;
        let mut data = vec![0.0f32; 3 * w * h];
        let (r, rest) = data.split_at_mut(w * h);
        let (g, b) = rest.split_at_mut(w * h);

        for y in 0..h {
            let fy = y as f32 / h as f32;
            for x in 0..w {
                let fx = x as f32 / w as f32;
                let i = y * w + x;
                r[i] = (self.phase + fx * tau).sin();
                g[i] = (self.phase * 0.7 + fy * tau).cos();
                b[i] = (self.phase * 1.3 + (fx + fy) * tau * 0.5).sin();
            }
        }

        self.phase = (self.phase + self.step) % tau;
        Ok(Frame::from_f32([3, h, w], data)?)
    }
}

/// Cycles through the decodable images of a directory in file-name order.
#[derive(Clone, Debug)]
pub struct ImageDirSampler {
    paths: Vec<PathBuf>,
    next: usize,
}

impl ImageDirSampler {
    pub fn new(dir: &Path) -> TpdneResult<Self> {
        if !dir.is_dir() {
            return Err(TpdneError::config(format!(
                "image directory '{}' does not exist",
                dir.display()
            )));
        }

        let mut paths = Vec::new();
        for entry in
            std::fs::read_dir(dir).with_context(|| format!("list '{}'", dir.display()))?
        {
            let path = entry
                .with_context(|| format!("list '{}'", dir.display()))?
                .path();
            if path.is_file() && image::ImageFormat::from_path(&path).is_ok() {
                paths.push(path);
            }
        }
        paths.sort();

        if paths.is_empty() {
            return Err(TpdneError::config(format!(
                "image directory '{}' contains no supported images",
                dir.display()
            )));
        }

        Ok(Self { paths, next: 0 })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl Sampler for ImageDirSampler {
    fn sample(&mut self) -> anyhow::Result<Frame> {
        let path = &self.paths[self.next];
        self.next = (self.next + 1) % self.paths.len();

        let rgb = image::open(path)
            .with_context(|| format!("decode '{}'", path.display()))?
            .to_rgb8();
        let (w, h) = rgb.dimensions();
        Ok(Frame::from_u8([h as usize, w as usize, 3], rgb.into_raw())?)
    }
}

#[cfg(test)]
#[path = "../tests/unit/sources.rs"]
mod tests;
