use crate::{Density, DensityTable, FailurePolicy, RunArgs};
use anyhow::{Context, Result};
use magick::{Color, Magick};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "sorolla.yaml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    densities: Option<BTreeMap<Density, f64>>,
    on_failure: Option<FailurePolicy>,
    convert: Option<PathBuf>,
}

impl RawConfig {
    fn parse(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        serde_yaml::from_str(&contents).with_context(|| format!("invalid config {}", path.display()))
    }
}

/// Everything a run needs, validated up front so that a bad invocation
/// fails before anything is written.
#[derive(Clone, Debug)]
pub struct Config {
    source_dir: PathBuf,
    dest_dir: PathBuf,
    color: Color,
    densities: DensityTable,
    on_failure: FailurePolicy,
    magick: Magick,
    dry_run: bool,
}

impl Config {
    pub fn new(source_dir: &Path, dest_dir: &Path, color: &str) -> Result<Self> {
        anyhow::ensure!(
            source_dir.is_dir(),
            "the source dir {} is not valid or it doesn't exist",
            source_dir.display()
        );
        let color = color.parse()?;
        let source_dir = dunce::canonicalize(source_dir)?;
        let dest_dir = if dest_dir.is_absolute() {
            dest_dir.to_path_buf()
        } else {
            std::env::current_dir()?.join(dest_dir)
        };
        Ok(Self {
            source_dir,
            dest_dir,
            color,
            densities: Default::default(),
            on_failure: Default::default(),
            magick: Default::default(),
            dry_run: false,
        })
    }

    pub fn from_args(args: &RunArgs) -> Result<Self> {
        let mut config = Self::new(&args.source_res_dir, &args.dest_res_dir, &args.color)?;
        let file = match &args.config {
            Some(path) => Some(RawConfig::parse(path)?),
            None => {
                let path = config.source_dir.join(CONFIG_FILE);
                if path.exists() {
                    Some(RawConfig::parse(&path)?)
                } else {
                    None
                }
            }
        };
        let file = file.unwrap_or_default();
        if let Some(densities) = file.densities {
            config.densities = DensityTable::new(densities)?;
        }
        if let Some(convert) = args.convert.clone().or(file.convert) {
            config = config.with_magick(Magick::new(convert));
        }
        config.on_failure = args.on_failure.or(file.on_failure).unwrap_or_default();
        config.dry_run = args.dry_run;
        Ok(config)
    }

    pub fn with_densities(mut self, densities: DensityTable) -> Self {
        self.densities = densities;
        self
    }

    pub fn with_failure_policy(mut self, on_failure: FailurePolicy) -> Self {
        self.on_failure = on_failure;
        self
    }

    pub fn with_magick(mut self, magick: Magick) -> Self {
        self.magick = magick;
        self
    }

    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    pub fn dest_dir(&self) -> &Path {
        &self.dest_dir
    }

    pub fn color(&self) -> &Color {
        &self.color
    }

    pub fn densities(&self) -> &DensityTable {
        &self.densities
    }

    pub fn on_failure(&self) -> FailurePolicy {
        self.on_failure
    }

    pub fn magick(&self) -> &Magick {
        &self.magick
    }

    pub fn dry_run(&self) -> bool {
        self.dry_run
    }

    /// Folder the generated drawables of `density` are written to.
    pub fn output_dir(&self, density: Density) -> PathBuf {
        self.dest_dir.join(density.folder_name())
    }
}
