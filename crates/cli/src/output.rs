//! Output formatting utilities

use anyhow::anyhow;
use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::str::FromStr;
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub use dashboard_lib::export::{format_currency, format_percent, format_rate};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

impl FromStr for OutputFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <Self as ValueEnum>::from_str(s, true)
            .map_err(|_| anyhow!("unknown output format '{}', expected table or json", s))
    }
}

/// Print a table from a list of items
pub fn print_table<T: Tabled>(items: &[T]) {
    if items.is_empty() {
        println!("{}", "No items found".yellow());
        return;
    }
    let table = Table::new(items).with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print a table with columns only known at runtime
pub fn print_dynamic_table(header: &[String], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("{}", "No rows match the current filters".yellow());
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(header.iter().cloned());
    for row in rows {
        builder.push_record(row.iter().cloned());
    }
    let table = builder.build().with(Style::rounded()).to_string();
    println!("{}", table);
}

/// Print any result as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Print a section heading
pub fn print_heading(title: &str) {
    println!("{}", title.bold());
    println!("{}", "=".repeat(50));
}

/// Print a sub-section heading
pub fn print_subheading(title: &str) {
    println!("{}", title.bold());
    println!("{}", "-".repeat(50));
}

/// Print an aligned label/value line
pub fn print_field(label: &str, value: impl std::fmt::Display) {
    println!("{:<24}{}", format!("{}:", label), value);
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Format a plain quantity: integers without decimals, others with two
pub fn format_quantity(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{:.2}", value)
    }
}

/// Color status based on value
pub fn color_status(status: &str) -> String {
    match status.to_lowercase().as_str() {
        "available" | "healthy" => status.green().to_string(),
        "degraded" | "unknown" => status.yellow().to_string(),
        "unavailable" | "unhealthy" => status.red().to_string(),
        _ => status.to_string(),
    }
}

/// Color a savings percentage by size
pub fn color_savings_pct(pct: f64) -> String {
    let formatted = format_percent(pct);
    if pct >= 30.0 {
        formatted.green().to_string()
    } else if pct >= 10.0 {
        formatted.yellow().to_string()
    } else {
        formatted
    }
}
