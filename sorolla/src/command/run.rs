use crate::{Config, DryRun, Executor, Pipeline, Report, RunArgs, Spawn};
use anyhow::Result;

/// Extensions ImageMagick hands over to ghostscript.
const GHOSTSCRIPT_EXTENSIONS: [&str; 4] = ["pdf", "ps", "eps", "ai"];

pub fn run(args: &RunArgs) -> Result<()> {
    let config = Config::from_args(args)?;
    preflight(&config);
    if config.dry_run() {
        execute(Pipeline::new(config, DryRun))
    } else {
        execute(Pipeline::new(config, Spawn))
    }
}

fn execute<E: Executor>(mut pipeline: Pipeline<E>) -> Result<()> {
    let mut report = Report::default();
    let result = pipeline.run(&mut report);
    print!("{}", report);
    result?;
    anyhow::ensure!(
        report.is_success(),
        "{} of {} files failed to generate",
        report.num_failed(),
        report.files().len()
    );
    Ok(())
}

fn preflight(config: &Config) {
    if config.dry_run() {
        return;
    }
    let program = config.magick().program();
    match which::which(program) {
        Ok(path) => tracing::info!("using imagemagick at {}", path.display()),
        Err(_) => tracing::error!(
            "imagemagick `{}` not found, every operation will fail",
            program.display()
        ),
    }
    if which::which(super::GHOSTSCRIPT).is_err() && has_ghostscript_sources(config) {
        tracing::warn!("ghostscript is not installed, pdf and postscript sources will fail");
    }
}

fn has_ghostscript_sources(config: &Config) -> bool {
    let Ok(entries) = std::fs::read_dir(config.source_dir().join("drawable")) else {
        return false;
    };
    entries.filter_map(|entry| entry.ok()).any(|entry| {
        entry
            .path()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| GHOSTSCRIPT_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
            .unwrap_or(false)
    })
}
