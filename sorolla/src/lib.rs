use anyhow::Result;
use clap::Parser;
use serde::Deserialize;
use std::path::PathBuf;

#[macro_export]
macro_rules! exe {
    ($name:expr) => {
        if cfg!(target_os = "windows") {
            concat!($name, ".exe")
        } else {
            $name
        }
    };
}

pub mod command;
mod config;
mod pipeline;
mod report;
mod task;

pub use config::Config;
pub use magick::{Asset, Color, Magick, MagickCommand};
pub use pipeline::Pipeline;
pub use report::{Failure, FileReport, Report, Step};
pub use task::{DryRun, Executor, Spawn, TaskRunner};

/// Android screen density bucket.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Ldpi,
    Mdpi,
    Hdpi,
    Xhdpi,
    Xxhdpi,
}

impl Density {
    pub const ALL: [Density; 5] = [
        Self::Ldpi,
        Self::Mdpi,
        Self::Hdpi,
        Self::Xhdpi,
        Self::Xxhdpi,
    ];

    /// Scale relative to mdpi. xxxhdpi is left out as android only uses it
    /// for launcher icons.
    pub fn default_scale(self) -> f64 {
        match self {
            Self::Ldpi => 0.75,
            Self::Mdpi => 1.0,
            Self::Hdpi => 1.5,
            Self::Xhdpi => 2.0,
            Self::Xxhdpi => 3.0,
        }
    }

    pub fn folder_name(self) -> String {
        format!("drawable-{}", self)
    }
}

impl std::fmt::Display for Density {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Ldpi => write!(f, "ldpi"),
            Self::Mdpi => write!(f, "mdpi"),
            Self::Hdpi => write!(f, "hdpi"),
            Self::Xhdpi => write!(f, "xhdpi"),
            Self::Xxhdpi => write!(f, "xxhdpi"),
        }
    }
}

impl std::str::FromStr for Density {
    type Err = anyhow::Error;

    fn from_str(density: &str) -> Result<Self> {
        Ok(match density {
            "ldpi" => Self::Ldpi,
            "mdpi" => Self::Mdpi,
            "hdpi" => Self::Hdpi,
            "xhdpi" => Self::Xhdpi,
            "xxhdpi" => Self::Xxhdpi,
            _ => anyhow::bail!("unsupported density {}", density),
        })
    }
}

/// The densities to generate and their scale. Shared by every pass so
/// scaled and tinted resources always end up in the same folders.
#[derive(Clone, Debug, PartialEq)]
pub struct DensityTable {
    entries: Vec<(Density, f64)>,
}

impl Default for DensityTable {
    fn default() -> Self {
        Self {
            entries: Density::ALL
                .iter()
                .map(|density| (*density, density.default_scale()))
                .collect(),
        }
    }
}

impl DensityTable {
    pub fn new(entries: impl IntoIterator<Item = (Density, f64)>) -> Result<Self> {
        let mut entries: Vec<_> = entries.into_iter().collect();
        anyhow::ensure!(!entries.is_empty(), "no densities configured");
        for (density, scale) in &entries {
            anyhow::ensure!(
                scale.is_finite() && *scale > 0.0,
                "invalid scale {} for {}",
                scale,
                density
            );
            anyhow::ensure!(
                magick::scaled_density(*scale) > 0,
                "scale {} for {} renders below 1 dpi",
                scale,
                density
            );
        }
        entries.sort_by_key(|(density, _)| *density);
        for pair in entries.windows(2) {
            anyhow::ensure!(pair[0].0 != pair[1].0, "duplicate density {}", pair[0].0);
        }
        Ok(Self { entries })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Density, f64)> + '_ {
        self.entries.iter().copied()
    }

    pub fn densities(&self) -> impl Iterator<Item = Density> + '_ {
        self.entries.iter().map(|(density, _)| *density)
    }

    pub fn scale(&self, density: Density) -> Option<f64> {
        self.iter()
            .find(|(d, _)| *d == density)
            .map(|(_, scale)| scale)
    }

}

/// What to do when generating a single file fails.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Record the failure and carry on with the next file.
    #[default]
    Skip,
    /// Stop the run.
    Abort,
}

impl std::fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Skip => write!(f, "skip"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

impl std::str::FromStr for FailurePolicy {
    type Err = anyhow::Error;

    fn from_str(policy: &str) -> Result<Self> {
        Ok(match policy {
            "skip" => Self::Skip,
            "abort" => Self::Abort,
            _ => anyhow::bail!("unsupported failure policy {}", policy),
        })
    }
}

#[derive(Clone, Debug, Parser)]
pub struct RunArgs {
    /// Resource folder containing `drawable` and `drawable-<density>` folders
    pub source_res_dir: PathBuf,
    /// Resource folder the generated drawables are written to
    pub dest_res_dir: PathBuf,
    /// Fill and tint color as `RRGGBB`, without a leading `#`
    pub color: String,
    /// ImageMagick `convert` binary to use
    #[clap(long)]
    pub convert: Option<PathBuf>,
    /// Path to a yaml config file. Defaults to `sorolla.yaml` in the
    /// source resource folder when present.
    #[clap(long)]
    pub config: Option<PathBuf>,
    /// What to do when a file fails to generate. Can be one of
    /// `skip` or `abort`.
    #[clap(long)]
    pub on_failure: Option<FailurePolicy>,
    /// Print the commands instead of running them
    #[clap(long)]
    pub dry_run: bool,
    /// Use verbose output
    #[clap(long, short)]
    pub verbose: bool,
}
