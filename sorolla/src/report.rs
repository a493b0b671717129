use crate::Density;
use std::path::{Path, PathBuf};

/// The operation a file failed in.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Step {
    Scale,
    Color,
    Tint,
    Cleanup,
}

impl std::fmt::Display for Step {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Self::Scale => write!(f, "scale"),
            Self::Color => write!(f, "color"),
            Self::Tint => write!(f, "tint"),
            Self::Cleanup => write!(f, "cleanup"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Failure {
    pub step: Step,
    pub reason: String,
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{} failed: {}", self.step, self.reason)
    }
}

/// Outcome of generating one output file for one density.
#[derive(Clone, Debug)]
pub struct FileReport {
    source: PathBuf,
    output: PathBuf,
    density: Density,
    failure: Option<Failure>,
}

impl FileReport {
    pub fn new(source: &Path, output: &Path, density: Density) -> Self {
        Self {
            source: source.to_path_buf(),
            output: output.to_path_buf(),
            density,
            failure: None,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn density(&self) -> Density {
        self.density
    }

    pub fn failure(&self) -> Option<&Failure> {
        self.failure.as_ref()
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    /// Records the first failing step, later ones are a consequence of it.
    pub fn fail(&mut self, step: Step, err: anyhow::Error) {
        if self.failure.is_none() {
            self.failure = Some(Failure {
                step,
                reason: format!("{:#}", err),
            });
        }
    }
}

impl std::fmt::Display for FileReport {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} -> {}",
            self.density,
            self.source.display(),
            self.output.display()
        )?;
        if let Some(failure) = &self.failure {
            write!(f, ": {}", failure)?;
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Default)]
pub struct Report {
    files: Vec<FileReport>,
}

impl Report {
    pub fn push(&mut self, file: FileReport) {
        self.files.push(file);
    }

    pub fn files(&self) -> &[FileReport] {
        &self.files
    }

    pub fn failures(&self) -> impl Iterator<Item = &FileReport> {
        self.files.iter().filter(|file| !file.is_success())
    }

    pub fn num_failed(&self) -> usize {
        self.failures().count()
    }

    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }
}

impl std::fmt::Display for Report {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        let failed = self.num_failed();
        writeln!(
            f,
            "{} of {} files generated",
            self.files.len() - failed,
            self.files.len()
        )?;
        for file in self.failures() {
            writeln!(f, "  {}", file)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_failure() {
        let mut file = FileReport::new(
            Path::new("res/drawable/icon.pdf"),
            Path::new("out/drawable-mdpi/icon.png"),
            Density::Mdpi,
        );
        assert!(file.is_success());
        file.fail(Step::Scale, anyhow::anyhow!("exited with 1"));
        file.fail(Step::Cleanup, anyhow::anyhow!("not found"));
        let failure = file.failure().unwrap();
        assert_eq!(failure.step, Step::Scale);
        assert_eq!(failure.reason, "exited with 1");
    }

    #[test]
    fn summary_lists_failures() {
        let mut report = Report::default();
        report.push(FileReport::new(
            Path::new("a.png"),
            Path::new("drawable-mdpi/a.png"),
            Density::Mdpi,
        ));
        let mut failed = FileReport::new(
            Path::new("b.png"),
            Path::new("drawable-hdpi/b.png"),
            Density::Hdpi,
        );
        failed.fail(Step::Tint, anyhow::anyhow!("boom"));
        report.push(failed);
        assert!(!report.is_success());
        assert_eq!(report.num_failed(), 1);
        assert_eq!(
            report.to_string(),
            "1 of 2 files generated\n  [hdpi] b.png -> drawable-hdpi/b.png: tint failed: boom\n"
        );
    }
}
