use std::fs::File;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapOptions};
use tracing::{debug, error};

use crate::error::{PlumeError, Result};

#[cfg(unix)]
pub use memmap2::Advice;

/// Scoped read-only mapping of a whole file (private, read-only pages).
/// The mapping is released when the region drops; the region owns it
/// exclusively and moves by ownership transfer, never by copy.
pub struct MmapRegion {
    map: Mmap,
    path: PathBuf,
}

impl MmapRegion {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            error!("failed to open {}: {e}", path.display());
            PlumeError::StoreUnavailable(format!("open {} failed: {e}", path.display()))
        })?;
        let len = file.metadata()?.len();
        if len == 0 {
            error!("attempted to mmap an empty file: {}", path.display());
            return Err(PlumeError::StoreUnavailable(format!(
                "{} is empty",
                path.display()
            )));
        }

        // Safety: private read-only mapping; the build/query contract
        // declares concurrent modification of the backing file undefined.
        let map = unsafe { MmapOptions::new().map_copy_read_only(&file) }.map_err(|e| {
            error!("mmap failed for {}: {e}", path.display());
            PlumeError::StoreUnavailable(format!("mmap {} failed: {e}", path.display()))
        })?;

        debug!(
            len,
            path = %path.display(),
            "mapped file ({:.2} GB)",
            len as f64 / (1024.0 * 1024.0 * 1024.0)
        );
        Ok(Self {
            map,
            path: path.to_path_buf(),
        })
    }

    /// Passes a usage hint to the kernel. Best-effort: a refused hint is
    /// logged and ignored.
    #[cfg(unix)]
    pub fn advise(&self, advice: Advice) {
        if let Err(e) = self.map.advise(advice) {
            debug!("madvise({advice:?}) ignored for {}: {e}", self.path.display());
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.map
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for MmapRegion {
    fn drop(&mut self) {
        debug!("unmapped {}", self.path.display());
    }
}
