//! Per-run context handed to every component.
//!
//! One [`RunContext`] is built in `main` and passed down by reference. It
//! owns the run's cache directory (screenshots, debug overlays) and the
//! debug flag.

use chrono::{DateTime, Local};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, instrument};

/// Filename template for per-scroll screenshots; `{i}` is the scroll index.
pub const SECTION_IMAGE_NAME_TEMPLATE: &str = "gn_S{i}.png";

static SECTION_IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    let pattern = regex::escape(SECTION_IMAGE_NAME_TEMPLATE).replace(r"\{i\}", r"(\d+)");
    Regex::new(&format!("^{pattern}$")).expect("screenshot template is a valid regex")
});

#[derive(Debug, Error)]
pub enum ContextError {
    #[error("failed to prepare cache directory {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Screenshot filename for a given scroll index.
pub fn section_image_name(index: usize) -> String {
    SECTION_IMAGE_NAME_TEMPLATE.replace("{i}", &index.to_string())
}

/// Inverse of [`section_image_name`]; `None` when `name` does not fit the template.
pub fn section_image_index(name: &str) -> Option<usize> {
    SECTION_IMAGE_RE
        .captures(name)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// A cache root with one timestamped subdirectory for the current run.
#[derive(Debug, Clone)]
pub struct RunCache {
    root: PathBuf,
    started_at: DateTime<Local>,
}

impl RunCache {
    /// Create `root/` and `root/<YYYYmmddHHMMSS>/` for a run starting now.
    #[instrument(level = "info", skip_all, fields(root = %root.as_ref().display()))]
    pub fn create(root: impl AsRef<Path>) -> Result<Self, ContextError> {
        let cache = Self {
            root: root.as_ref().to_path_buf(),
            started_at: Local::now(),
        };
        for dir in [cache.root(), cache.directory()] {
            fs::create_dir_all(&dir).map_err(|source| ContextError::Io { path: dir, source })?;
        }
        info!(directory = %cache.directory().display(), "Run cache ready");
        Ok(cache)
    }

    pub fn root(&self) -> PathBuf {
        self.root.clone()
    }

    /// Directory holding this run's artifacts.
    pub fn directory(&self) -> PathBuf {
        self.root
            .join(self.started_at.format("%Y%m%d%H%M%S").to_string())
    }

    /// Path for a named artifact inside the run directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.directory().join(name)
    }

    /// Empty the run directory, or the whole cache root when `all` is set.
    ///
    /// The run directory exists again afterwards either way.
    #[instrument(level = "info", skip(self))]
    pub fn clear(&self, all: bool) -> Result<(), ContextError> {
        let dir = if all { self.root() } else { self.directory() };
        fs::remove_dir_all(&dir).map_err(|source| ContextError::Io {
            path: dir.clone(),
            source,
        })?;
        let run_dir = self.directory();
        fs::create_dir_all(&run_dir).map_err(|source| ContextError::Io {
            path: run_dir,
            source,
        })?;
        info!(path = %dir.display(), "Cleared cache");
        Ok(())
    }
}

/// Shared, read-only state for one run.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub cache: RunCache,
    pub debug: bool,
}

impl RunContext {
    pub fn new(cache: RunCache, debug: bool) -> Self {
        Self { cache, debug }
    }
}
