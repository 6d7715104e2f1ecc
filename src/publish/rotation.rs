use std::path::PathBuf;

/// Round-robin set of backing files in the scratch directory.
///
/// Slot `i` lives at `{dir}/{prefix}{i}.{ext}`. The ring starts at index 0 and advances before
/// every write, so the `k`-th write (1-based) lands in slot `k % count`.
#[derive(Clone, Debug)]
pub struct SlotRing {
    dir: PathBuf,
    prefix: String,
    extension: String,
    count: usize,
    index: usize,
}

impl SlotRing {
    /// `count` must be non-zero; [`crate::PublishConfig::validate`] enforces this for the loop.
    pub fn new(
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        extension: impl Into<String>,
        count: usize,
    ) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            extension: extension.into(),
            count: count.max(1),
            index: 0,
        }
    }

    pub fn count(&self) -> usize {
        self.count
    }

    /// Index of the most recently handed out slot.
    pub fn current(&self) -> usize {
        self.index
    }

    pub fn slot_path(&self, index: usize) -> PathBuf {
        self.dir
            .join(format!("{}{}.{}", self.prefix, index % self.count, self.extension))
    }

    /// Move to the next slot and return its index and path.
    pub fn advance(&mut self) -> (usize, PathBuf) {
        self.index = (self.index + 1) % self.count;
        (self.index, self.slot_path(self.index))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/publish/rotation.rs"]
mod tests;
