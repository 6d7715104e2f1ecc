//! tpdne keeps one image on disk continuously fresh.
//!
//! A caller-supplied [`Sampler`] is invoked on a fixed cadence. Each frame is normalized into an
//! 8-bit RGB raster, encoded into the next of N rotating scratch files, and published by swapping
//! a symlink at a stable path. Web servers and other readers can open that path at any moment and
//! always get a complete image.
//!
//! # Pipeline overview
//!
//! 1. **Sample**: `Sampler::sample() -> Frame` (any common tensor layout)
//! 2. **Normalize**: `Frame -> CanonicalImage` (`(h, w, 3)` u8)
//! 3. **Encode**: write the image into rotation slot `k % N` (WebP, PNG or JPEG)
//! 4. **Swap**: atomically repoint the public symlink, then the favicon symlink
//! 5. **Pace**: sleep out the rest of the minimum interval
//!
//! Failures are never retried: [`Publisher::run`] returns the first error and the process
//! supervisor restarts it. The [`deploy`] helpers render the nginx site and systemd unit for that
//! setup.
#![forbid(unsafe_code)]

mod encode;
mod foundation;
mod frame;
mod normalize;
mod publish;
mod sources;

/// nginx site and systemd unit rendering and installation.
pub mod deploy;

pub use deploy::nginx::{DEFAULT_NGINX_TEMPLATE, NginxSite, render_nginx_site};
pub use deploy::systemd::{
    DEFAULT_SYSTEMD_TEMPLATE, SUPERVISED_ENV, SystemdUnit, is_supervised, render_systemd_unit,
};
pub use deploy::template::Template;
pub use encode::codec::{ImageFormat, encode_image, write_image};
pub use foundation::error::{TpdneError, TpdneResult};
pub use frame::{Frame, FrameData};
pub use normalize::{CanonicalImage, normalize};
pub use publish::config::{FAVICON_FILE_NAME, FAVICON_SIZES, FaviconConfig, PublishConfig};
pub use publish::pointer::{read_pointer, staging_path, swap_pointer, write_replacing};
pub use publish::publisher::{IterationReport, Publisher, remaining};
pub use publish::rotation::SlotRing;
pub use sources::{GradientSampler, ImageDirSampler, Sampler, SourceConfig};
