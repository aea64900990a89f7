//! # getx CLI Entry Point
//!
//! Parses arguments with clap and routes each subcommand to its handler in
//! [`getx::commands`].
//!
//! - `getx get PKG...` fetch packages and their imports
//! - `getx resolve PKG...` show which repository and remote a package maps to
//! - `getx rules` list the rule table
//! - `getx completion SHELL` print shell completions

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use std::path::PathBuf;

use getx::commands;
use getx::commands::get::GetArgs;

#[cfg(windows)]
#[link(name = "kernel32")]
unsafe extern "system" {
    fn SetConsoleOutputCP(wCodePageID: u32) -> i32;
}

#[cfg(windows)]
fn enable_windows_utf8_console() {
    unsafe {
        SetConsoleOutputCP(65001);
    }
}

#[cfg(not(windows))]
fn enable_windows_utf8_console() {}

#[derive(Parser)]
#[command(name = "getx")]
#[command(about = "Recursively fetch and update Go packages from git", version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch packages and everything they import
    Get {
        /// Package identifiers (e.g. gh/user/repo/sub)
        #[arg(required = true)]
        packages: Vec<String>,
        /// Only fetch the imports; the packages themselves must exist
        #[arg(short, long)]
        deps_only: bool,
        /// Also fetch the imports of the packages' tests
        #[arg(short, long)]
        tests: bool,
        /// List every package as it completes
        #[arg(short, long)]
        verbose: bool,
        /// Show every git and go command
        #[arg(long)]
        trace: bool,
        /// Install packages after fetching
        #[arg(short, long)]
        install: bool,
        /// Scan existing packages for missing imports too
        #[arg(short = 'f', long, conflicts_with = "update")]
        fetch_missing: bool,
        /// Update existing repositories with clean working trees
        #[arg(short, long)]
        update: bool,
        /// Run get-before-update, get-before-install and get-after-install hooks
        #[arg(long)]
        hooks: bool,
        /// Check out the most recent tag after cloning or updating
        #[arg(long)]
        tagged: bool,
        /// Fetch whole repositories (pkg/...) instead of single packages
        #[arg(short, long)]
        recurse: bool,
        /// Stop at the first problem
        #[arg(long, conflicts_with = "warn")]
        fail_fast: bool,
        /// Print problems as warnings and keep going
        #[arg(short, long)]
        warn: bool,
        /// Run as if started in DIR
        #[arg(short = 'C', long = "dir", value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Show the repository and remote each package maps to
    Resolve {
        #[arg(required = true)]
        packages: Vec<String>,
        /// Run as if started in DIR
        #[arg(short = 'C', long = "dir", value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// List the loaded rules in evaluation order
    Rules {
        /// Run as if started in DIR
        #[arg(short = 'C', long = "dir", value_name = "DIR")]
        dir: Option<PathBuf>,
    },
    /// Generate shell completion scripts
    Completion { shell: Shell },
}

fn main() -> Result<()> {
    enable_windows_utf8_console();

    let cli = Cli::parse();

    match cli.command {
        Commands::Get {
            packages,
            deps_only,
            tests,
            verbose,
            trace,
            install,
            fetch_missing,
            update,
            hooks,
            tagged,
            recurse,
            fail_fast,
            warn,
            dir,
        } => {
            let args = GetArgs {
                packages,
                deps_only,
                tests,
                verbose,
                trace,
                install,
                fetch_missing,
                update,
                hooks,
                tagged,
                recurse,
                fail_fast,
                warn,
                dir,
            };
            if !commands::get::handle_get_command(&args)? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Resolve { packages, dir } => {
            if !commands::rules::handle_resolve_command(&packages, dir.as_deref())? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Rules { dir } => commands::rules::handle_rules_command(dir.as_deref()),
        Commands::Completion { shell } => {
            let mut cmd = Cli::command();
            let bin_name = cmd.get_name().to_string();
            generate(shell, &mut cmd, bin_name, &mut std::io::stdout());
            Ok(())
        }
    }
}
