//! Pre-commit hook resetting every `value` in settings documents to its `default`
//!
//! Exits with 1 when a file was modified so the commit can be retried, 0 when
//! everything was already clean, and 2 on usage or I/O errors.

use clap::Parser;
use ndev_settings::reset_values_in_file;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "reset-settings-values")]
#[command(about = "Reset values to defaults in ndev-settings YAML files")]
struct Cli {
    /// YAML settings files to reset
    #[arg(required = true)]
    files: Vec<PathBuf>,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(2)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let mut modified = false;
    let mut failed = false;

    for path in &cli.files {
        match reset_values_in_file(path) {
            Ok(resets) if resets.is_empty() => {}
            Ok(resets) => {
                modified = true;
                for reset in resets {
                    println!("{}: {reset}", path.display());
                }
            }
            Err(e) => {
                failed = true;
                eprintln!("{}: {e}", path.display());
            }
        }
    }

    if failed {
        ExitCode::from(2)
    } else if modified {
        ExitCode::from(1)
    } else {
        ExitCode::SUCCESS
    }
}
