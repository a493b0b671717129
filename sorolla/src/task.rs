use anyhow::{Context, Result};
use console::style;
use magick::MagickCommand;
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Instant;

/// Prints one line when a pass starts and one when it ends. Nothing is ever
/// erased: skip and failure diagnostics share the terminal and must stay
/// visible.
pub struct TaskRunner<W = std::io::Stdout> {
    out: W,
    num_tasks: u32,
    current_task: u32,
    now: Instant,
    descr: String,
}

impl TaskRunner {
    pub fn new(num_tasks: u32) -> Self {
        Self::with_writer(num_tasks, std::io::stdout())
    }
}

impl<W: Write> TaskRunner<W> {
    pub fn with_writer(num_tasks: u32, out: W) -> Self {
        Self {
            out,
            num_tasks,
            current_task: 0,
            now: Instant::now(),
            descr: "".into(),
        }
    }

    fn task_id(&self) -> String {
        style(format!("[{}/{}]", self.current_task + 1, self.num_tasks))
            .bold()
            .to_string()
    }

    pub fn start_task(&mut self, descr: impl Into<String>) {
        self.now = Instant::now();
        self.descr = descr.into();
        writeln!(self.out, "{} {}", self.task_id(), self.descr).ok();
    }

    /// Closes the current pass with the number of files it generated and
    /// failed.
    pub fn end_task(&mut self, generated: usize, failed: usize) {
        let failed = if failed > 0 {
            style(format!("{} failed", failed)).red().to_string()
        } else {
            "0 failed".to_string()
        };
        writeln!(
            self.out,
            "{} {}: {} generated, {} [{}ms]",
            self.task_id(),
            self.descr,
            generated,
            failed,
            self.now.elapsed().as_millis()
        )
        .ok();
        self.current_task += 1;
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

/// Side effects of a run: invoking ImageMagick and removing the scaled
/// intermediates.
pub trait Executor {
    fn execute(&mut self, command: &MagickCommand) -> Result<()>;

    fn remove_file(&mut self, path: &Path) -> Result<()> {
        std::fs::remove_file(path).with_context(|| format!("failed to remove {}", path.display()))
    }
}

/// Runs every command to completion, one at a time.
#[derive(Clone, Copy, Debug, Default)]
pub struct Spawn;

impl Executor for Spawn {
    fn execute(&mut self, command: &MagickCommand) -> Result<()> {
        tracing::debug!("{}", command);
        run(command.to_command().stdin(Stdio::null()))
    }
}

/// Prints every command and removal instead of performing it.
#[derive(Clone, Copy, Debug, Default)]
pub struct DryRun;

impl Executor for DryRun {
    fn execute(&mut self, command: &MagickCommand) -> Result<()> {
        println!("{}", command);
        Ok(())
    }

    fn remove_file(&mut self, path: &Path) -> Result<()> {
        println!("rm {}", path.display());
        Ok(())
    }
}

/// Runs `command`, turning a spawn error or non zero exit into an error
/// carrying whatever the tool wrote to stderr.
pub fn run(command: &mut Command) -> Result<()> {
    fn format_error(command: &Command, status: Option<i32>) -> String {
        let status = if let Some(code) = status {
            format!(" exited with {code}")
        } else {
            Default::default()
        };
        format!("{} `{:?}`{}", style("[ERROR]").red(), command, status)
    }
    let output = command
        .output()
        .with_context(|| format_error(command, None))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            anyhow::bail!("{}", format_error(command, output.status.code()));
        }
        anyhow::bail!("{}: {}", format_error(command, output.status.code()), stderr);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_lines_are_appended() {
        let mut runner = TaskRunner::with_writer(2, Vec::new());
        runner.start_task("Scaling");
        runner.end_task(5, 0);
        runner.start_task("Tinting");
        runner.end_task(1, 0);
        let out = String::from_utf8(runner.into_inner()).unwrap();
        let out = console::strip_ansi_codes(&out);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "[1/2] Scaling");
        assert!(lines[1].starts_with("[1/2] Scaling: 5 generated, 0 failed ["));
        assert_eq!(lines[2], "[2/2] Tinting");
        assert!(lines[3].starts_with("[2/2] Tinting: 1 generated, 0 failed ["));
    }

    #[test]
    fn never_moves_the_cursor() {
        let mut runner = TaskRunner::with_writer(1, Vec::new());
        runner.start_task("Scaling");
        runner.end_task(0, 3);
        let out = String::from_utf8(runner.into_inner()).unwrap();
        assert!(!out.contains("\x1b[1A"));
        assert!(!out.contains("\x1b[2K"));
        assert!(console::strip_ansi_codes(&out).contains("0 generated, 3 failed"));
    }

    #[cfg(unix)]
    #[test]
    fn run_reports_exit_code_and_stderr() {
        let err = run(Command::new("sh").args(["-c", "echo broken >&2; exit 3"])).unwrap_err();
        let msg = format!("{:#}", err);
        assert!(msg.contains("exited with 3"), "{}", msg);
        assert!(msg.contains("broken"), "{}", msg);
    }

    #[cfg(unix)]
    #[test]
    fn run_reports_missing_binary() {
        let err = run(&mut Command::new("sorolla-no-such-binary")).unwrap_err();
        assert!(format!("{:#}", err).contains("sorolla-no-such-binary"));
    }

    #[cfg(unix)]
    #[test]
    fn run_succeeds() -> Result<()> {
        run(&mut Command::new("true"))
    }
}
