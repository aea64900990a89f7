//! Terminal tables and the end-of-run summary.
//!
//! ```rust,ignore
//! let mut table = Table::new(&["Pattern", "Replacement"]);
//! table.add_row(vec!["gh/([^/]+)/([^/]+)".into(), "https://github.com/$1/$2.git".into()]);
//! table.print();
//! ```

use crate::fetch::FetchReport;
use colored::*;

const MIN_COLUMN_WIDTH: usize = 8;

pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|s| s.to_string()).collect(),
            rows: Vec::new(),
        }
    }

    /// Rows with the wrong number of cells are dropped.
    pub fn add_row(&mut self, row: Vec<String>) {
        if row.len() == self.headers.len() {
            self.rows.push(row);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn print(&self) {
        let (_, term_width) = console::Term::stdout().size();
        for line in self.render(term_width as usize) {
            println!("{}", line);
        }
    }

    /// Lines of the table, squeezed to `max_width` columns where possible.
    pub fn render(&self, max_width: usize) -> Vec<String> {
        if self.headers.is_empty() {
            return Vec::new();
        }
        let widths = self.column_widths(max_width);

        let border = |left: &str, mid: &str, right: &str| {
            let cells: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
            format!("  {}{}{}", left, cells.join(mid), right)
        };
        let row_line = |cells: &[String], bold: bool| {
            let mut line = String::from("  │");
            for (cell, &width) in cells.iter().zip(&widths) {
                let text = console::truncate_str(&flatten(cell), width, "...").into_owned();
                let pad = width.saturating_sub(console::measure_text_width(&text));
                let text = if bold {
                    text.bold().to_string()
                } else {
                    text
                };
                line.push_str(&format!(" {}{} │", text, " ".repeat(pad)));
            }
            line
        };

        let mut lines = vec![border("┌", "┬", "┐"), row_line(&self.headers, true)];
        lines.push(border("├", "┼", "┤"));
        for row in &self.rows {
            lines.push(row_line(row, false));
        }
        lines.push(border("└", "┴", "┘"));
        lines
    }

    fn column_widths(&self, max_width: usize) -> Vec<usize> {
        let mut widths: Vec<usize> = self
            .headers
            .iter()
            .map(|h| console::measure_text_width(h))
            .collect();
        for row in &self.rows {
            for (width, cell) in widths.iter_mut().zip(row) {
                *width = (*width).max(console::measure_text_width(&flatten(cell)));
            }
        }

        // indent + one separator per column + outer border
        let overhead = 3 + 3 * widths.len();
        let available = max_width.saturating_sub(overhead);
        while widths.iter().sum::<usize>() > available {
            let Some(widest) = widths
                .iter_mut()
                .filter(|w| **w > MIN_COLUMN_WIDTH)
                .max_by_key(|w| **w)
            else {
                break;
            };
            *widest -= 1;
        }
        widths
    }
}

fn flatten(s: &str) -> String {
    s.chars()
        .map(|c| if matches!(c, '\n' | '\r' | '\t') { ' ' } else { c })
        .collect()
}

/// Table of what a run changed, one row per event.
pub fn summary_table(report: &FetchReport) -> Table {
    let mut table = Table::new(&["Action", "Package", "Detail"]);
    for repo in &report.cloned {
        table.add_row(vec!["cloned".green().to_string(), repo.to_string(), String::new()]);
    }
    for repo in &report.updated {
        table.add_row(vec!["updated".green().to_string(), repo.to_string(), String::new()]);
    }
    for (repo, status) in &report.skipped_updates {
        table.add_row(vec![
            "not updated".yellow().to_string(),
            repo.to_string(),
            status.to_string(),
        ]);
    }
    for (repo, pin) in &report.pinned {
        table.add_row(vec!["pinned".cyan().to_string(), repo.to_string(), pin.to_string()]);
    }
    for (pkg, kind) in &report.hook_failures {
        table.add_row(vec![
            "hook failed".red().to_string(),
            pkg.to_string(),
            kind.to_string(),
        ]);
    }
    for (pkg, failed) in &report.install_failures {
        let names: Vec<&str> = failed.iter().map(|id| id.as_str()).collect();
        table.add_row(vec![
            "install failed".red().to_string(),
            pkg.to_string(),
            names.join(", "),
        ]);
    }
    table
}

pub fn print_summary(report: &FetchReport) {
    let table = summary_table(report);
    if !table.is_empty() {
        println!();
        table.print();
    }
    println!(
        "{} {} package(s) done, {} cloned, {} updated",
        "✓".green(),
        report.completed.len(),
        report.cloned.len(),
        report.updated.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::PackageId;
    use crate::vcs::RepoStatus;

    #[test]
    fn test_render_fits_columns() {
        colored::control::set_override(false);
        let mut table = Table::new(&["A", "Value"]);
        table.add_row(vec!["x".to_string(), "hello".to_string()]);
        table.add_row(vec!["too".to_string(), "many".to_string(), "cells".to_string()]);

        let lines = table.render(80);
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "  ┌───┬───────┐");
        assert_eq!(lines[3], "  │ x │ hello │");
    }

    #[test]
    fn test_render_squeezes_wide_columns() {
        colored::control::set_override(false);
        let mut table = Table::new(&["Package"]);
        table.add_row(vec!["gh/someone/a-very-long-repository-name".to_string()]);

        let lines = table.render(24);
        assert!(lines.iter().all(|l| console::measure_text_width(l) <= 24));
        assert!(lines[3].contains("..."));
    }

    #[test]
    fn test_summary_rows() {
        let report = FetchReport {
            cloned: vec![PackageId::from("gh/u1/p")],
            skipped_updates: vec![(PackageId::from("gh/u2/q"), RepoStatus::Uncommitted)],
            ..Default::default()
        };
        let table = summary_table(&report);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][2], "uncommitted changes");
    }
}
