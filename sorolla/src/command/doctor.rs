use anyhow::{bail, Result};
use std::path::PathBuf;
use std::process::Command;

use super::GHOSTSCRIPT;

#[derive(Debug)]
pub struct Doctor {
    groups: Vec<Group>,
}

impl Default for Doctor {
    fn default() -> Self {
        Self {
            groups: vec![
                Group {
                    name: "imagemagick",
                    checks: vec![
                        Check::new(exe!("convert"), Some(VersionCheck::new("-version", 0, 2))),
                        Check::new(exe!("magick"), Some(VersionCheck::new("-version", 0, 2))),
                    ],
                },
                Group {
                    name: "ghostscript",
                    checks: vec![Check::new(
                        GHOSTSCRIPT,
                        Some(VersionCheck::new("--version", 0, 0)),
                    )],
                },
            ],
        }
    }
}

impl Doctor {
    pub fn with_convert(mut self, path: PathBuf) -> Self {
        self.groups[0].checks[0] =
            Check::with_path("convert", Ok(path), Some(VersionCheck::new("-version", 0, 2)));
        self
    }
}

impl std::fmt::Display for Doctor {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for group in &self.groups {
            write!(f, "{}", group)?;
        }
        Ok(())
    }
}

#[derive(Debug)]
struct Group {
    name: &'static str,
    checks: Vec<Check>,
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        writeln!(f, "{:-^1$}", self.name, 60)?;
        for check in &self.checks {
            write!(f, "{:20} ", check.name())?;
            if let Ok(path) = check.path() {
                let version = if let Ok(Some(version)) = check.version() {
                    version
                } else {
                    "unknown".into()
                };
                write!(f, "{:20}", version)?;
                write!(f, "{}", path.display())?;
            } else {
                write!(f, "not found")?;
            }
            writeln!(f)?;
        }
        writeln!(f)
    }
}

#[derive(Debug)]
struct Check {
    name: &'static str,
    location: Option<Result<PathBuf>>,
    version: Option<VersionCheck>,
}

impl Check {
    pub const fn new(name: &'static str, version: Option<VersionCheck>) -> Self {
        Self {
            name,
            location: None,
            version,
        }
    }

    pub const fn with_path(
        name: &'static str,
        path: Result<PathBuf>,
        version: Option<VersionCheck>,
    ) -> Self {
        Self {
            name,
            location: Some(path),
            version,
        }
    }
}

/// Where the version sits in the output of `arg`: line `row`, space
/// separated column `col`.
#[derive(Clone, Copy, Debug)]
struct VersionCheck {
    arg: &'static str,
    row: u8,
    col: u8,
}

impl VersionCheck {
    pub const fn new(arg: &'static str, row: u8, col: u8) -> Self {
        Self { arg, row, col }
    }
}

impl Check {
    fn name(&self) -> &'static str {
        self.name
    }

    fn path(&self) -> Result<PathBuf> {
        Ok(match &self.location {
            Some(Ok(path)) => which::which(path)?,
            // Cannot clone the error:
            Some(Err(e)) => bail!("{:?}", e),
            None => which::which(self.name)?,
        })
    }

    fn version(&self) -> Result<Option<String>> {
        if let Some(version) = self.version {
            let output = Command::new(self.path()?)
                .args(version.arg.split(' '))
                .output()?;
            anyhow::ensure!(output.status.success(), "failed to run {}", self.name);
            let output = std::str::from_utf8(&output.stdout)?;
            if let Some(line) = output.lines().nth(version.row as _) {
                if let Some(col) = line.split(' ').nth(version.col as usize) {
                    return Ok(Some(col.trim().to_string()));
                }
            }
            anyhow::bail!("failed to parse version: {:?}", output);
        } else {
            Ok(None)
        }
    }
}

pub fn doctor(convert: Option<PathBuf>) {
    let doctor = match convert {
        Some(path) => Doctor::default().with_convert(path),
        None => Doctor::default(),
    };
    print!("{}", doctor);
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn missing_tool_is_reported() {
        let group = Group {
            name: "missing",
            checks: vec![Check::new("sorolla-no-such-tool", None)],
        };
        let out = group.to_string();
        assert!(out.contains("sorolla-no-such-tool"));
        assert!(out.contains("not found"));
    }

    #[test]
    fn replaces_convert() {
        let doctor = Doctor::default().with_convert(PathBuf::from("/opt/im/bin/convert"));
        assert_eq!(doctor.groups[0].checks.len(), 2);
        assert_eq!(doctor.groups[0].checks[0].name(), "convert");
        assert_eq!(doctor.groups[0].checks[1].name(), exe!("magick"));
    }
}
