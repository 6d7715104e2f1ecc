use std::{path::PathBuf, time::Duration};

use crate::{
    encode::codec::ImageFormat,
    foundation::error::{TpdneError, TpdneResult},
    publish::rotation::SlotRing,
};

/// Sizes accepted for the favicon.
pub const FAVICON_SIZES: [u32; 2] = [16, 32];

/// Name of the favicon pointer, placed next to the public image.
pub const FAVICON_FILE_NAME: &str = "favicon.png";

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaviconConfig {
    pub enabled: bool,
    /// Edge length in pixels, 16 or 32.
    pub size: u32,
}

impl Default for FaviconConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size: 32,
        }
    }
}

/// Everything the publish loop needs. Validated eagerly by [`PublishConfig::validate`].
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Public path without extension; the extension comes from `format`.
    pub output_path: PathBuf,
    pub format: ImageFormat,
    /// Minimum period of one iteration.
    pub min_interval_ms: u64,
    /// Scratch directory holding the rotation slots. Must already exist.
    pub tmp_dir: PathBuf,
    pub rotation_count: usize,
    /// Encoder quality in `1..=100`.
    pub quality: u8,
    /// Optional fixed `[width, height]` applied before encoding.
    pub resize_to: Option<[u32; 2]>,
    pub favicon: FaviconConfig,
    /// Log every iteration at info level instead of debug.
    pub verbose: bool,
    /// Stop after this many iterations; `None` runs until the process is killed.
    pub max_iterations: Option<u64>,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            output_path: PathBuf::from("./out/random"),
            format: ImageFormat::Webp,
            min_interval_ms: 250,
            tmp_dir: PathBuf::from("/tmp"),
            rotation_count: 10,
            quality: 99,
            resize_to: None,
            favicon: FaviconConfig::default(),
            verbose: true,
            max_iterations: None,
        }
    }
}

impl PublishConfig {
    pub fn from_json_str(s: &str) -> TpdneResult<Self> {
        serde_json::from_str(s).map_err(|e| TpdneError::config(format!("parse config: {e}")))
    }

    /// Check option values and the filesystem preconditions. Writes nothing.
    pub fn validate(&self) -> TpdneResult<()> {
        if !(1..=100).contains(&self.quality) {
            return Err(TpdneError::config(format!(
                "quality must be in 1..=100, got {}",
                self.quality
            )));
        }
        if !FAVICON_SIZES.contains(&self.favicon.size) {
            return Err(TpdneError::config(format!(
                "favicon size must be 16 or 32, got {}",
                self.favicon.size
            )));
        }
        if self.rotation_count == 0 {
            return Err(TpdneError::config("rotation_count must be at least 1"));
        }
        if let Some([w, h]) = self.resize_to
            && (w == 0 || h == 0)
        {
            return Err(TpdneError::config(format!(
                "resize_to must be non-zero, got {w}x{h}"
            )));
        }

        if self.output_path.file_name().is_none() {
            return Err(TpdneError::config(format!(
                "output path '{}' has no file name",
                self.output_path.display()
            )));
        }
        if self.output_path.extension().is_some() {
            return Err(TpdneError::config(format!(
                "output path '{}' must not carry an extension; it is derived from the format ({})",
                self.output_path.display(),
                self.format
            )));
        }

        if !self.tmp_dir.is_dir() {
            return Err(TpdneError::config(format!(
                "scratch directory '{}' does not exist or is not a directory",
                self.tmp_dir.display()
            )));
        }

        self.validate_pointer_names()
    }

    /// The public pointers must not alias each other or a rotation slot.
    fn validate_pointer_names(&self) -> TpdneResult<()> {
        let public = self.public_path();
        if self.favicon.enabled && public == self.favicon_path() {
            return Err(TpdneError::config(format!(
                "output path '{}' collides with the favicon pointer '{FAVICON_FILE_NAME}'",
                public.display()
            )));
        }

        let same_dir = match (
            std::fs::canonicalize(self.public_dir()),
            std::fs::canonicalize(&self.tmp_dir),
        ) {
            (Ok(a), Ok(b)) => a == b,
            _ => false,
        };
        if !same_dir {
            return Ok(());
        }

        let rings = [
            SlotRing::new(&self.tmp_dir, "", self.format.extension(), self.rotation_count),
            SlotRing::new(
                &self.tmp_dir,
                "favicon_",
                ImageFormat::Png.extension(),
                self.rotation_count,
            ),
        ];
        for ring in &rings {
            for i in 0..ring.count() {
                let slot = ring.slot_path(i);
                if slot.file_name() == public.file_name() {
                    return Err(TpdneError::config(format!(
                        "output path '{}' collides with rotation slot '{}'",
                        public.display(),
                        slot.display()
                    )));
                }
            }
        }
        Ok(())
    }

    /// The public image pointer, `output_path` plus the format's extension.
    pub fn public_path(&self) -> PathBuf {
        self.output_path.with_extension(self.format.extension())
    }

    /// Directory holding the public pointers.
    pub fn public_dir(&self) -> PathBuf {
        match self.output_path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        }
    }

    pub fn favicon_path(&self) -> PathBuf {
        self.public_dir().join(FAVICON_FILE_NAME)
    }

    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.min_interval_ms)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/publish/config.rs"]
mod tests;
