//! Output sink: copies accepted images into category subdirectories of the
//! output root. Failures are reportable, never fatal — the caller logs and
//! keeps navigating.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::debug::dbg_log;

pub struct OutputSink {
    root: PathBuf,
}

impl OutputSink {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        OutputSink { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Copy `source` into `<root>/<category>/`, keeping the file name and
    /// suffixing ` (n)` on collisions. Returns the destination path.
    pub fn save(&self, source: &Path, category: &str) -> Result<PathBuf> {
        let dir = self.root.join(category);
        fs::create_dir_all(&dir).with_context(|| format!("creating {}", dir.display()))?;

        let name = source
            .file_name()
            .with_context(|| format!("source has no file name: {}", source.display()))?;
        let dest = unique_dest(&dir, Path::new(name));

        fs::copy(source, &dest)
            .with_context(|| format!("copying {} → {}", source.display(), dest.display()))?;
        dbg_log!("sink: {} → {}", source.display(), dest.display());
        Ok(dest)
    }
}

/// First non-colliding destination for `name` inside `dir`.
fn unique_dest(dir: &Path, name: &Path) -> PathBuf {
    let candidate = dir.join(name);
    if !candidate.exists() {
        return candidate;
    }

    let stem = name
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = name.extension().map(|e| e.to_string_lossy().to_string());

    for n in 1u32.. {
        let fname = match &ext {
            Some(e) => format!("{} ({}).{}", stem, n, e),
            None => format!("{} ({})", stem, n),
        };
        let candidate = dir.join(fname);
        if !candidate.exists() {
            return candidate;
        }
    }
    unreachable!()
}
