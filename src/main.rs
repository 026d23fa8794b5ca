use std::fs::File;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use simplelog::{ConfigBuilder, WriteLogger};

use gitscope::repo::Repository;
use gitscope::{views, Config, Error, ViewKind};

#[derive(Parser)]
#[command(name = "gitscope", version, about = "Keyboard-driven git status, log and branches")]
struct Args {
    /// Run as if started in this directory
    #[arg(short = 'C', value_name = "PATH", default_value = ".")]
    path: PathBuf,

    /// Rows of the list, clamped to the terminal
    #[arg(long, value_name = "ROWS")]
    height: Option<usize>,

    /// Hide the key hints line
    #[arg(long)]
    no_controls: bool,

    /// Write a debug log to this file
    #[arg(long, value_name = "FILE")]
    log_file: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    view: Option<Command>,
}

#[derive(Subcommand, Clone, Copy)]
enum Command {
    /// Working-tree status (default)
    Status,
    /// Commit history
    Log,
    /// Local and remote branches
    Branch,
}

impl From<Command> for ViewKind {
    fn from(command: Command) -> Self {
        match command {
            Command::Status => ViewKind::Status,
            Command::Log => ViewKind::Log,
            Command::Branch => ViewKind::Branch,
        }
    }
}

fn config_from(args: &Args) -> Config {
    let mut config = Config::new()
        .with_path(&args.path)
        .with_view(args.view.map(ViewKind::from).unwrap_or_default())
        .with_controls(!args.no_controls)
        .with_verbosity(args.verbose);
    if let Some(height) = args.height {
        config = config.with_height(height);
    }
    if let Some(file) = &args.log_file {
        config = config.with_log_file(file);
    }
    config
}

fn init_logging(config: &Config) -> anyhow::Result<()> {
    let Some(path) = &config.log_file else {
        return Ok(());
    };
    let file = File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    let log_config = ConfigBuilder::new().set_time_format_rfc3339().build();
    WriteLogger::init(config.log_level, log_config, file).context("logger already set")?;
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = config_from(&args);
    if let Err(err) = init_logging(&config) {
        eprintln!("gitscope: {err:#}");
    }
    log::info!("gitscope starting: {:?} view", config.view);

    let repo = match Repository::discover(&config.path)
        .with_context(|| format!("cannot open a repository at {}", config.path.display()))
    {
        Ok(repo) => repo,
        Err(err) => {
            eprintln!("gitscope: {err:#}");
            return ExitCode::from(1);
        }
    };

    match views::run(repo, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            eprintln!("gitscope: {err}");
            match err {
                Error::Terminal(_) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subcommand_selects_view() {
        let args = Args::parse_from(["gitscope", "-C", "/tmp", "--height", "5", "log"]);
        let config = config_from(&args);
        assert_eq!(config.view, ViewKind::Log);
        assert_eq!(config.height, 5);
        assert_eq!(config.path, PathBuf::from("/tmp"));
    }

    #[test]
    fn test_defaults_to_status() {
        let args = Args::parse_from(["gitscope", "--no-controls", "-vv"]);
        let config = config_from(&args);
        assert_eq!(config.view, ViewKind::Status);
        assert!(!config.show_controls);
        assert_eq!(config.log_level, log::LevelFilter::Debug);
    }
}
