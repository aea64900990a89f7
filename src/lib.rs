//! # getx - recursive package fetcher
//!
//! getx fetches a package and, recursively, every package it imports. Packages are
//! mapped to git repositories through a table of regex rules, so one repository may
//! hold many packages and is cloned, inspected or updated once per run.
//!
//! ## Quick Start
//!
//! ```bash
//! # ~/.go-getx-map
//! gh/([^/]+)/([^/]+)=https://github.com/$1/$2.git
//!
//! getx get -r -u gh/user/repo
//! ```
//!
//! ## Module Organization
//!
//! - [`fetch`] - The traversal engine
//! - [`rules`] - Identifier to repository mapping
//! - [`vcs`] - Git access
//! - [`toolchain`] - Package metadata and install via `go`
//! - [`commands`] - CLI command handlers

/// CLI command handlers extracted from main.
pub mod commands;

/// Configuration file parsing (`getx.toml`).
pub mod config;

/// Recursive fetch engine.
pub mod fetch;

/// Package lifecycle hooks.
pub mod hooks;

/// Package identifiers and subtree specs.
pub mod ident;

/// Console output and error policy.
pub mod report;

/// Rule table mapping packages to repositories.
pub mod rules;

/// Go toolchain: metadata queries and install.
pub mod toolchain;

/// Terminal UI utilities (tables, run summary).
pub mod ui;

/// Version control.
pub mod vcs;

/// Record of processed identifiers.
pub mod visited;
