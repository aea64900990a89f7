//! `getx resolve` and `getx rules` handlers

use anyhow::{Context, Result};
use colored::*;
use std::path::Path;

use crate::config::GetxConfig;
use crate::ident::PackageId;
use crate::rules::RuleSet;
use crate::ui::Table;

fn load_rules(dir: Option<&Path>) -> Result<(GetxConfig, RuleSet)> {
    let working_dir = super::working_dir(dir)?;
    let config = GetxConfig::load(&working_dir).context("Failed to load configuration")?;
    let rules = config.rule_set().context("Failed to load rules")?;
    Ok((config, rules))
}

/// Handle `getx resolve`: show the repository and remote each package maps to.
/// Returns `false` if some package matched no rule.
pub fn handle_resolve_command(packages: &[String], dir: Option<&Path>) -> Result<bool> {
    let (_, rules) = load_rules(dir)?;

    let mut table = Table::new(&["Package", "Repository", "Remote"]);
    let mut all_matched = true;
    for raw in packages {
        let pkg = PackageId::new(raw.as_str());
        match rules.resolve(&pkg) {
            Ok(resolved) => table.add_row(vec![
                pkg.to_string(),
                resolved.repository.to_string().green().to_string(),
                resolved.remote,
            ]),
            Err(_) => {
                all_matched = false;
                table.add_row(vec![
                    pkg.to_string(),
                    "x".red().to_string(),
                    "no matching rule".dimmed().to_string(),
                ]);
            }
        }
    }
    table.print();
    Ok(all_matched)
}

/// Handle `getx rules`: list the loaded rules in evaluation order.
pub fn handle_rules_command(dir: Option<&Path>) -> Result<()> {
    let (config, rules) = load_rules(dir)?;

    match &config.source {
        Some(path) => println!("{} Config: {}", "→".blue(), path.display()),
        None => println!("{} Config: {}", "→".blue(), "none".dimmed()),
    }
    if let Some(path) = config.rules_path() {
        let state = if path.is_file() { "" } else { " (missing)" };
        println!("{} Rule file: {}{}", "→".blue(), path.display(), state.yellow());
    }

    if rules.is_empty() {
        println!("{} No rules defined", "!".yellow());
        println!(
            "   Add {} lines to the rule file, or {} tables to {}.",
            "pattern=replacement".cyan(),
            "[[rules]]".cyan(),
            crate::config::CONFIG_FILE.cyan()
        );
        return Ok(());
    }

    let mut table = Table::new(&["#", "Pattern", "Replacement"]);
    for (idx, rule) in rules.iter().enumerate() {
        table.add_row(vec![
            (idx + 1).to_string(),
            rule.pattern().to_string(),
            rule.replacement().to_string(),
        ]);
    }
    table.print();
    Ok(())
}
