//! `reaper`: report (and optionally remove) files that have not been
//! accessed within an expiry window, judged by their access time.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Duration;

use clap::{ArgAction, Parser};
use reaper::{Config, Entry, Reaper};
use tracing::{error, info};

#[cfg(unix)]
const PATH_LIST_SEPARATOR: char = ':';
#[cfg(not(unix))]
const PATH_LIST_SEPARATOR: char = ';';

#[derive(Parser, Debug)]
#[command(name = "reaper", version, about)]
struct Cli {
    /// Entries are expired once not accessed for longer than this (e.g. 72h, 1h30m, 90s)
    #[arg(long, value_parser = reaper::duration::parse_expiry)]
    expiry: Duration,

    /// Globs for data to protect, separated by the platform path-list separator
    #[arg(long, value_delimiter = PATH_LIST_SEPARATOR)]
    protect: Vec<String>,

    /// Only report candidates; pass `--dry-run=false` to delete them
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    dry_run: bool,

    /// Print the command that would remove each candidate
    #[arg(
        long,
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true"
    )]
    show_command: bool,

    /// Also consider irregular entries such as FIFOs, devices and symlinks
    #[arg(long)]
    irregular: bool,

    /// Ignore permissions and report candidates by age alone
    #[arg(long)]
    force: bool,

    /// More logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// No logging at all
    #[arg(short, long)]
    quiet: bool,

    /// Roots to scan
    paths: Vec<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    let config = Config::new(cli.expiry)
        .protect(cli.protect.iter().filter(|g| !g.is_empty()).cloned())
        .expunge_irregular(cli.irregular)
        .force(cli.force);

    let mut ok = true;
    for path in &cli.paths {
        ok &= visit(path, &config, cli.dry_run, cli.show_command);
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// Scan one root. Returns `false` if anything went wrong along the way.
fn visit(root: &Path, config: &Config, dry_run: bool, show_command: bool) -> bool {
    let mut reaper = match Reaper::new(root, config.clone()) {
        Ok(r) => r,
        Err(e) => {
            error!(?root, error = %e, "walk failed");
            return false;
        }
    };

    let mut ok = true;
    while reaper.advance() {
        let Some(entry) = reaper.current() else {
            continue;
        };
        if show_command {
            println!("{}", command_for(entry));
        }
        if !dry_run {
            if let Err(e) = remove(entry) {
                error!(path = ?entry.path, error = %e, "deletion failed");
                ok = false;
            }
        }
    }

    if let Some(e) = reaper.terminal_error() {
        error!(?root, error = %e, "walk failed");
        ok = false;
    }
    if let Some(stats) = reaper.stats() {
        info!(
            ?root,
            files = stats.files,
            dirs = stats.dirs,
            candidates = stats.candidates,
            elapsed_ms = stats.duration.as_millis() as u64,
            "scan finished"
        );
    }
    ok
}

fn command_for(entry: &Entry) -> String {
    if entry.is_dir() {
        format!("rmdir {:?}", entry.path)
    } else {
        format!("rm {:?}", entry.path)
    }
}

fn remove(entry: &Entry) -> io::Result<()> {
    if entry.is_dir() {
        fs::remove_dir(&entry.path)
    } else {
        fs::remove_file(&entry.path)
    }
}

fn setup_logging(verbose: u8, quiet: bool) {
    if quiet {
        return;
    }

    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        match verbose {
            0 => tracing_subscriber::EnvFilter::new("warn"),
            1 => tracing_subscriber::EnvFilter::new("info,globset=warn"),
            2 => tracing_subscriber::EnvFilter::new("debug,globset=warn"),
            _ => tracing_subscriber::EnvFilter::new("trace"),
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults_are_a_safe_dry_run() {
        let cli = Cli::try_parse_from(["reaper", "--expiry", "72h", "/tmp"]).unwrap();
        assert!(cli.dry_run);
        assert!(cli.show_command);
        assert!(!cli.force);
        assert_eq!(cli.expiry, Duration::from_secs(72 * 3600));
        assert_eq!(cli.paths, [PathBuf::from("/tmp")]);
    }

    #[cfg(unix)]
    #[test]
    fn protect_splits_on_the_path_list_separator() {
        let cli = Cli::try_parse_from([
            "reaper", "--expiry", "1h", "--protect", "*.keep:cache/*", "--protect", "logs", "/srv",
        ])
        .unwrap();
        assert_eq!(cli.protect, ["*.keep", "cache/*", "logs"]);
    }

    #[test]
    fn zero_expiry_is_refused() {
        assert!(Cli::try_parse_from(["reaper", "--expiry", "0s", "/tmp"]).is_err());
        assert!(Cli::try_parse_from(["reaper", "/tmp"]).is_err());
    }

    #[test]
    fn dry_run_can_be_turned_off() {
        let cli = Cli::try_parse_from(["reaper", "--expiry", "1h", "--dry-run=false"]).unwrap();
        assert!(!cli.dry_run);
    }

    #[test]
    fn bare_bool_flags_mean_true() {
        let cli = Cli::try_parse_from([
            "reaper", "--expiry", "1h", "--dry-run", "--show-command", "/srv",
        ])
        .unwrap();
        assert!(cli.dry_run);
        assert!(cli.show_command);
        assert_eq!(cli.paths, [PathBuf::from("/srv")]);

        let cli = Cli::try_parse_from(["reaper", "--expiry", "1h", "--show-command=false"]).unwrap();
        assert!(!cli.show_command);
        assert!(cli.dry_run);
    }
}
