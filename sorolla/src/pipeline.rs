use crate::report::{FileReport, Report, Step};
use crate::task::{Executor, TaskRunner};
use crate::{Config, Density, FailurePolicy};
use anyhow::{Context, Result};
use magick::Asset;
use std::path::{Path, PathBuf};

/// Drives the scale/color and tint passes over a resource folder.
pub struct Pipeline<E> {
    config: Config,
    executor: E,
}

impl<E: Executor> Pipeline<E> {
    pub fn new(config: Config, executor: E) -> Self {
        Self { config, executor }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Creates every output folder. Existing folders are left as they are.
    pub fn ensure_output_folders(&self) -> Result<()> {
        for density in self.config.densities().densities() {
            let folder = self.config.output_dir(density);
            std::fs::create_dir_all(&folder).with_context(|| {
                format!(
                    "can't create destination folder {}. Is the path valid?",
                    folder.display()
                )
            })?;
        }
        Ok(())
    }

    /// Runs both passes, recording every generated file in `report`. Returns
    /// an error only for fatal problems or when the failure policy says to
    /// abort; in both cases `report` holds everything done until then.
    pub fn run(&mut self, report: &mut Report) -> Result<()> {
        self.ensure_output_folders()?;
        let mut runner = TaskRunner::new(2);
        runner.start_task("Scaling & coloring 'drawable' resources");
        let (files, failed) = (report.files().len(), report.num_failed());
        self.scale_and_color_pass(report)?;
        let (generated, failed) = progress(report, files, failed);
        runner.end_task(generated, failed);
        runner.start_task("Tinting 'drawable-<density>' resources");
        let (files, failed) = (report.files().len(), report.num_failed());
        self.tint_pass(report)?;
        let (generated, failed) = progress(report, files, failed);
        runner.end_task(generated, failed);
        Ok(())
    }

    /// Scales every master asset in `drawable` to each density and fills it
    /// with the configured color.
    pub fn scale_and_color_pass(&mut self, report: &mut Report) -> Result<()> {
        let drawable = self.config.source_dir().join("drawable");
        if !drawable.is_dir() {
            tracing::warn!(
                "no drawable folder in {}. Skipping...",
                self.config.source_dir().display()
            );
            return Ok(());
        }
        let assets = list_assets(&drawable)?;
        let densities: Vec<_> = self.config.densities().iter().collect();
        for asset in &assets {
            for &(density, scale) in &densities {
                let file = self.scale_and_color(asset, density, scale);
                self.record(report, file)?;
            }
        }
        Ok(())
    }

    fn scale_and_color(&mut self, asset: &Asset, density: Density, scale: f64) -> FileReport {
        let folder = self.config.output_dir(density);
        let scaled = folder.join(asset.intermediate_name());
        let output = folder.join(asset.output_name());
        let mut file = FileReport::new(asset.path(), &output, density);

        let magick = self.config.magick();
        let scaled_written = match magick
            .scale(asset, &scaled, scale)
            .and_then(|cmd| self.executor.execute(&cmd))
        {
            Ok(()) => true,
            Err(err) => {
                file.fail(Step::Scale, err);
                false
            }
        };
        if scaled_written {
            let cmd = magick.fill(&asset.with_path(&scaled), &output, self.config.color());
            if let Err(err) = self.executor.execute(&cmd) {
                file.fail(Step::Color, err);
            }
        }
        if scaled_written || scaled.exists() {
            if let Err(err) = self.executor.remove_file(&scaled) {
                file.fail(Step::Cleanup, err);
            }
        }
        file
    }

    /// Tints the pre-scaled grayscale assets of every `drawable-<density>`
    /// folder present in the source.
    pub fn tint_pass(&mut self, report: &mut Report) -> Result<()> {
        let densities: Vec<_> = self.config.densities().densities().collect();
        for density in densities {
            let source = self.config.source_dir().join(density.folder_name());
            if !source.is_dir() {
                tracing::warn!(
                    "no {} folder in {}. Skipping...",
                    density.folder_name(),
                    self.config.source_dir().display()
                );
                continue;
            }
            let folder = self.config.output_dir(density);
            for asset in list_assets(&source)? {
                let output = folder.join(asset.output_name());
                let mut file = FileReport::new(asset.path(), &output, density);
                let cmd = self
                    .config
                    .magick()
                    .tint(&asset, &output, self.config.color());
                if let Err(err) = self.executor.execute(&cmd) {
                    file.fail(Step::Tint, err);
                }
                self.record(report, file)?;
            }
        }
        Ok(())
    }

    fn record(&self, report: &mut Report, file: FileReport) -> Result<()> {
        let abort = match file.failure() {
            Some(failure) => {
                tracing::error!("{}: {}", file.output().display(), failure);
                self.config.on_failure() == FailurePolicy::Abort
            }
            None => {
                tracing::info!("generated {}", file.output().display());
                false
            }
        };
        let output = file.output().to_path_buf();
        report.push(file);
        if abort {
            anyhow::bail!("aborting after failing to generate {}", output.display());
        }
        Ok(())
    }
}

/// Files generated and failed since the report held `files` entries of
/// which `failed` had failed.
fn progress(report: &Report, files: usize, failed: usize) -> (usize, usize) {
    let failed = report.num_failed() - failed;
    (report.files().len() - files - failed, failed)
}

/// Regular, non hidden files of `dir` in name order.
fn list_assets(dir: &Path) -> Result<Vec<Asset>> {
    let mut paths: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).with_context(|| format!("failed to read {}", dir.display()))? {
        let path = entry?.path();
        let hidden = path
            .file_name()
            .map(|name| name.to_string_lossy().starts_with('.'))
            .unwrap_or(true);
        if hidden || !path.is_file() {
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    let mut assets = Vec::with_capacity(paths.len());
    for path in paths {
        match Asset::new(&path) {
            Ok(asset) => assets.push(asset),
            Err(err) => tracing::warn!("skipping {}: {}", path.display(), err),
        }
    }
    Ok(assets)
}
