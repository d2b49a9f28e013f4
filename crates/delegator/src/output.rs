//! Output formatting utilities

use clap::ValueEnum;
use colored::Colorize;
use delegator_lib::NON_DELEGABLE_PRIORITY;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Log line format
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}

/// Print rows as a rounded table
pub fn print_table<T: Tabled>(rows: Vec<T>) {
    if rows.is_empty() {
        println!("{}", "No candidates configured".yellow());
        return;
    }
    let table = Table::new(rows).with(Style::rounded()).to_string();
    println!("{}", table);
}

pub fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
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

/// Format millicores as cores above 1000m
pub fn format_cpu(millicores: f64) -> String {
    if millicores >= 1000.0 {
        format!("{:.1}", millicores / 1000.0)
    } else {
        format!("{:.0}m", millicores)
    }
}

/// Color a priority: best green, non-delegable red
pub fn color_priority(priority: Option<i64>) -> String {
    match priority {
        None => "-".dimmed().to_string(),
        Some(p) if p >= NON_DELEGABLE_PRIORITY => p.to_string().red().to_string(),
        Some(p) if p <= 25 => p.to_string().green().to_string(),
        Some(p) => p.to_string(),
    }
}

pub fn color_score(score: Option<f64>) -> String {
    match score {
        None => "-".dimmed().to_string(),
        Some(s) if s >= 0.8 => format!("{:.3}", s).green().to_string(),
        Some(s) if s >= 0.4 => format!("{:.3}", s).yellow().to_string(),
        Some(s) => format!("{:.3}", s).red().to_string(),
    }
}

/// Color a candidate state
pub fn color_state(state: &str) -> String {
    match state {
        "admitted" => state.green().to_string(),
        "inadmissible" => state.yellow().to_string(),
        "unavailable" => state.red().to_string(),
        _ => state.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_cpu() {
        assert_eq!(format_cpu(500.0), "500m");
        assert_eq!(format_cpu(2500.0), "2.5");
    }

    #[test]
    fn test_color_priority_contains_value() {
        colored::control::set_override(false);
        assert_eq!(color_priority(Some(101)), "101");
        assert_eq!(color_priority(Some(3)), "3");
        assert_eq!(color_priority(None), "-");
    }
}
