//! CLI command handlers
//!
//! `main.rs` parses arguments; the handlers here load configuration, wire up the
//! collaborators and print results.

pub mod get;
pub mod rules;

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Directory a command runs against: `-C DIR` if given, else the current directory.
pub fn working_dir(dir: Option<&Path>) -> Result<PathBuf> {
    match dir {
        Some(dir) => Ok(dir.to_path_buf()),
        None => std::env::current_dir().context("Failed to determine the current directory"),
    }
}
