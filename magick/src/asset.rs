use anyhow::Result;
use std::path::{Path, PathBuf};

const NINE_PATCH_MARKER: &str = ".9.";

/// Returns true if `file_name` follows the `name.9.ext` nine-patch convention.
pub fn is_nine_patch(file_name: &str) -> bool {
    file_name.contains(NINE_PATCH_MARKER)
}

/// A source image together with everything derived from its file name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Asset {
    path: PathBuf,
    stem: String,
    nine_patch: bool,
}

impl Asset {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        // The path itself is passed on untouched; names only need to be
        // readable for the marker and the generated png names.
        let file_name = path
            .file_name()
            .ok_or_else(|| anyhow::anyhow!("invalid path {}", path.display()))?
            .to_string_lossy()
            .into_owned();
        let file_name = file_name.as_str();
        let nine_patch = is_nine_patch(file_name);
        let stem = match file_name.rsplit_once('.') {
            Some((stem, _)) if !stem.is_empty() => stem,
            _ => file_name,
        };
        let stem = if nine_patch {
            stem.strip_suffix(".9").unwrap_or(stem)
        } else {
            stem
        };
        Ok(Self {
            stem: stem.to_string(),
            path,
            nine_patch,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    pub fn is_nine_patch(&self) -> bool {
        self.nine_patch
    }

    /// File name of the final png, `name.9.png` for nine-patches.
    pub fn output_name(&self) -> String {
        self.png_name(&self.stem)
    }

    /// File name of the scaled but not yet colored png. The nine-patch marker
    /// stays in front of the extension so the suffix never splits it.
    pub fn intermediate_name(&self) -> String {
        self.png_name(&format!("{}_scaled", self.stem))
    }

    /// Same image at another location, for chaining a second command onto
    /// the output of the first.
    pub fn with_path(&self, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            stem: self.stem.clone(),
            nine_patch: self.nine_patch,
        }
    }

    fn png_name(&self, stem: &str) -> String {
        if self.nine_patch && !stem.contains(NINE_PATCH_MARKER) {
            format!("{}.9.png", stem)
        } else {
            format!("{}.png", stem)
        }
    }
}
