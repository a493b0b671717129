use anyhow::Result;
use clap::{Parser, Subcommand};
use sorolla::{command, RunArgs};
use std::path::PathBuf;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    use tracing_subscriber::{fmt::format::FmtSpan, EnvFilter};
    let args = Args::parse();
    tracing_log::LogTracer::init().ok();
    let default = if args.command.verbose() { "info" } else { "warn" };
    let env = std::env::var("SOROLLA_LOG").unwrap_or_else(|_| default.into());
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_span_events(FmtSpan::ACTIVE | FmtSpan::CLOSE)
        .with_env_filter(EnvFilter::new(env))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
    log_panics::init();
    args.command.run()
}

#[derive(Subcommand)]
enum Commands {
    /// Show information about the installed imagemagick and ghostscript
    Doctor {
        /// ImageMagick `convert` binary to check instead of the one in `PATH`
        #[clap(long)]
        convert: Option<PathBuf>,
    },
    /// Scale & color `drawable` and tint `drawable-<density>` resources
    Run {
        #[clap(flatten)]
        args: RunArgs,
    },
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Self::Run { args } => args.verbose,
            Self::Doctor { .. } => false,
        }
    }

    pub fn run(self) -> Result<()> {
        match self {
            Self::Doctor { convert } => command::doctor(convert),
            Self::Run { args } => command::run(&args)?,
        }
        Ok(())
    }
}
