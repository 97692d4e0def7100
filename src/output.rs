//! Rendering of command results.
//!
//! `text` mode prints module lists as tables and documents (configuration)
//! as TOML, the format they are written in. `json` mode is meant for
//! scripts and prints everything as pretty JSON.

use serde::Serialize;
use tabled::{Table, Tabled};

use pkghooks_core::AppResult;
use pkghooks_core::error::AppError;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Tables and TOML
    #[default]
    Text,
    /// Pretty JSON
    Json,
}

/// Renders rows as a table, or a JSON array.
pub fn render_list<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Text if rows.is_empty() => Ok("No hook modules found.".to_string()),
        OutputFormat::Text => Ok(Table::new(rows).to_string()),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(rows)?),
    }
}

/// Renders a document as TOML, or a JSON object.
pub fn render_document<T: Serialize>(doc: &T, format: OutputFormat) -> AppResult<String> {
    match format {
        OutputFormat::Text => toml::to_string_pretty(doc)
            .map(|text| text.trim_end().to_string())
            .map_err(|e| AppError::internal(format!("Failed to render TOML: {e}"))),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(doc)?),
    }
}

/// Prints rows in the selected format.
pub fn print_list<T: Serialize + Tabled>(rows: &[T], format: OutputFormat) -> AppResult<()> {
    println!("{}", render_list(rows, format)?);
    Ok(())
}

/// Prints a document in the selected format.
pub fn print_document<T: Serialize>(doc: &T, format: OutputFormat) -> AppResult<()> {
    println!("{}", render_document(doc, format)?);
    Ok(())
}

pub fn print_success(msg: &str) {
    println!("ok: {msg}");
}

pub fn print_error(msg: &str) {
    eprintln!("error: {msg}");
}

/// Prints an indented `key: value` line under a status message.
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<16} {value}", format!("{key}:"));
}
