use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

use anyhow::Context as _;
use image::imageops::{self, FilterType};

use crate::{
    encode::codec::{ImageFormat, write_image},
    foundation::error::TpdneResult,
    frame::Frame,
    normalize::{CanonicalImage, normalize},
    publish::{
        config::PublishConfig,
        pointer::{swap_pointer, write_replacing},
        rotation::SlotRing,
    },
    sources::Sampler,
};

/// Outcome of a single published frame.
#[derive(Clone, Debug)]
pub struct IterationReport {
    /// Rotation slot that now backs the public pointer.
    pub index: usize,
    pub slot: PathBuf,
    pub favicon_slot: Option<PathBuf>,
    /// Time from the start of the iteration (including sampling) to the last pointer swap.
    pub elapsed: Duration,
}

/// The publish loop: one writer, strictly sequential.
#[derive(Debug)]
pub struct Publisher {
    cfg: PublishConfig,
    public_path: PathBuf,
    favicon_path: PathBuf,
    slots: SlotRing,
    favicon_slots: SlotRing,
    published: u64,
}

impl Publisher {
    /// Validate `cfg` and prepare the output directory.
    ///
    /// Nothing is created when validation fails.
    pub fn new(cfg: PublishConfig) -> TpdneResult<Self> {
        cfg.validate()?;

        // Link targets must not depend on the reader's working directory.
        let tmp_dir = std::fs::canonicalize(&cfg.tmp_dir)
            .with_context(|| format!("resolve scratch dir '{}'", cfg.tmp_dir.display()))?;

        let public_dir = cfg.public_dir();
        std::fs::create_dir_all(&public_dir)
            .with_context(|| format!("create output dir '{}'", public_dir.display()))?;

        let slots = SlotRing::new(&tmp_dir, "", cfg.format.extension(), cfg.rotation_count);
        let favicon_slots = SlotRing::new(
            &tmp_dir,
            "favicon_",
            ImageFormat::Png.extension(),
            cfg.rotation_count,
        );

        tracing::debug!(
            scratch = %tmp_dir.display(),
            slots = cfg.rotation_count,
            format = %cfg.format,
            "publisher ready"
        );

        Ok(Self {
            public_path: cfg.public_path(),
            favicon_path: cfg.favicon_path(),
            slots,
            favicon_slots,
            published: 0,
            cfg,
        })
    }

    pub fn public_path(&self) -> &Path {
        &self.public_path
    }

    /// The favicon pointer, when favicon generation is enabled.
    pub fn favicon_path(&self) -> Option<&Path> {
        self.cfg.favicon.enabled.then_some(self.favicon_path.as_path())
    }

    /// Total frames published by this instance.
    pub fn published(&self) -> u64 {
        self.published
    }

    /// Normalize, encode and publish one frame without any pacing.
    pub fn publish_once(&mut self, frame: &Frame) -> TpdneResult<IterationReport> {
        self.publish_frame(frame, Instant::now())
    }

    /// Sample and publish forever, or `max_iterations` times when configured.
    ///
    /// The first error from the sampler, the normalizer, the encoder or the filesystem is
    /// returned as-is; there is no retry.
    #[tracing::instrument(skip_all, fields(public = %self.public_path.display()))]
    pub fn run<S: Sampler + ?Sized>(&mut self, sampler: &mut S) -> TpdneResult<()> {
        let interval = self.cfg.min_interval();
        let mut done = 0u64;

        loop {
            if self.cfg.max_iterations.is_some_and(|max| done >= max) {
                return Ok(());
            }

            let start = Instant::now();
            let frame = sampler.sample()?;
            let report = self.publish_frame(&frame, start)?;
            done += 1;

            self.log_iteration(&report);

            match remaining(interval, report.elapsed) {
                Some(rest) => std::thread::sleep(rest),
                None => tracing::debug!(
                    elapsed_ms = report.elapsed.as_millis() as u64,
                    interval_ms = self.cfg.min_interval_ms,
                    "iteration overran interval"
                ),
            }
        }
    }

    fn publish_frame(&mut self, frame: &Frame, start: Instant) -> TpdneResult<IterationReport> {
        let img = self.prepare(frame)?;
        let (format, quality) = (self.cfg.format, self.cfg.quality);

        let (index, slot) = self.slots.advance();
        write_replacing(&slot, |staged| write_image(&img, format, quality, staged))?;
        swap_pointer(&slot, &self.public_path)?;

        let favicon_slot = if self.cfg.favicon.enabled {
            let size = self.cfg.favicon.size;
            let small = imageops::resize(&img, size, size, FilterType::Lanczos3);
            let (_, icon_slot) = self.favicon_slots.advance();
            write_replacing(&icon_slot, |staged| {
                write_image(&small, ImageFormat::Png, quality, staged)
            })?;
            swap_pointer(&icon_slot, &self.favicon_path)?;
            Some(icon_slot)
        } else {
            None
        };

        self.published += 1;

        Ok(IterationReport {
            index,
            slot,
            favicon_slot,
            elapsed: start.elapsed(),
        })
    }

    fn prepare(&self, frame: &Frame) -> TpdneResult<CanonicalImage> {
        let img = normalize(frame)?;
        Ok(match self.cfg.resize_to {
            Some([w, h]) if img.dimensions() != (w, h) => {
                imageops::resize(&img, w, h, FilterType::Lanczos3)
            }
            _ => img,
        })
    }

    fn log_iteration(&self, report: &IterationReport) {
        let elapsed = format!("{:.3}s", report.elapsed.as_secs_f64());
        if self.cfg.verbose {
            tracing::info!(
                %elapsed,
                slot = %report.slot.display(),
                output = %self.public_path.display(),
                "published"
            );
        } else {
            tracing::debug!(
                %elapsed,
                slot = %report.slot.display(),
                output = %self.public_path.display(),
                "published"
            );
        }
    }
}

/// Sleep needed after an iteration that took `elapsed`, or `None` when it ran over budget.
pub fn remaining(interval: Duration, elapsed: Duration) -> Option<Duration> {
    interval.checked_sub(elapsed).filter(|d| !d.is_zero())
}

#[cfg(test)]
#[path = "../../tests/unit/publish/publisher.rs"]
mod tests;
