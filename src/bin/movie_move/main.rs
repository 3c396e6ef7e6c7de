use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser};
use clap_complete::Shell;

use media_mover::config::MediaConfig;
use media_mover::logger::RunLog;
use media_mover::mover::{CancelFlag, MoverOptions};
use media_mover::pipeline::MoviePipeline;
use media_mover::print_warning;

#[derive(Parser)]
#[command(author, version, name = env!("CARGO_BIN_NAME"), about = "Rename and move movies into the media library")]
struct Args {
    /// Optional config file path override
    #[arg(short, long, name = "CONFIG", value_hint = clap::ValueHint::FilePath)]
    config: Option<PathBuf>,

    /// Only move preferred video formats
    #[arg(short = 'f', long)]
    preferred: bool,

    /// Only print changes without moving files
    #[arg(short, long)]
    print: bool,

    /// Override the worker pool size
    #[arg(short, long, name = "COUNT")]
    workers: Option<usize>,

    /// Generate shell completion
    #[arg(short = 'l', long, name = "SHELL")]
    completion: Option<Shell>,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    if let Some(shell) = args.completion {
        media_mover::generate_shell_completion(shell, Args::command(), env!("CARGO_BIN_NAME"));
        return Ok(());
    }

    let config = match args.config.as_deref() {
        Some(path) => MediaConfig::from_file(path)?,
        None => MediaConfig::load()?,
    };

    let options = MoverOptions {
        workers: args.workers.filter(|n| *n > 0).unwrap_or_else(|| config.workers()),
        overwrite: false,
        dryrun: args.print,
    };

    let log = if args.print {
        RunLog::console_only()
    } else {
        RunLog::new(config.runner.log_dir.as_deref().map(Path::new))?
    };

    let cancel = CancelFlag::new();
    let handler_flag = cancel.clone();
    ctrlc::set_handler(move || {
        if handler_flag.is_cancelled() {
            // Second Ctrl+C - force exit
            std::process::exit(130);
        }
        print_warning!("\nReceived Ctrl+C, cleaning up... (press again to force quit)");
        handler_flag.cancel();
    })?;

    MoviePipeline::new(&config.movies, args.preferred, options, &log, cancel)?
        .run()
        .map(|_| ())
}
