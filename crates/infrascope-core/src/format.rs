// Output projection - human table, plain name list, structured JSON
use colored::Colorize;
use serde::Serialize;

use crate::models::{RepoKind, RepoRecord};
use crate::Result;

/// Output rendering modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    List,
    Json,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "table" => Some(OutputFormat::Table),
            "list" => Some(OutputFormat::List),
            "json" => Some(OutputFormat::Json),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Table => "table",
            OutputFormat::List => "list",
            OutputFormat::Json => "json",
        }
    }
}

const HEADERS: [&str; 5] = ["NAME", "TEAM", "ENVIRONMENT", "RESOURCE", "KIND"];

/// Structured document emitted in JSON mode
#[derive(Serialize)]
struct CatalogDocument<'a> {
    timestamp: u64,
    total: usize,
    repositories: &'a [RepoRecord],
}

/// Render a record set in the requested mode
///
/// `catalog_timestamp` is the snapshot's creation instant (epoch seconds);
/// only the JSON document carries it. Empty input renders a valid empty
/// table/list/document.
pub fn render(records: &[RepoRecord], format: OutputFormat, catalog_timestamp: u64) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(records)),
        OutputFormat::List => Ok(render_list(records)),
        OutputFormat::Json => render_json(records, catalog_timestamp),
    }
}

fn render_table(records: &[RepoRecord]) -> String {
    let rows: Vec<[&str; 5]> = records
        .iter()
        .map(|r| {
            [
                r.name.as_str(),
                r.team.as_str(),
                r.environment.as_str(),
                r.resource.as_str(),
                r.kind.as_str(),
            ]
        })
        .collect();

    let mut widths: [usize; 5] = HEADERS.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    out.push_str(&format_row(&HEADERS, &widths));
    out.push('\n');
    let total_width = widths.iter().sum::<usize>() + 2 * (widths.len() - 1);
    out.push_str(&"-".repeat(total_width));
    out.push('\n');

    for (record, row) in records.iter().zip(rows.iter()) {
        let line = format_row(row, &widths);
        let line = match record.kind {
            RepoKind::Standard => line.normal(),
            RepoKind::Exception => line.cyan(),
            RepoKind::Unknown => line.yellow(),
        };
        out.push_str(&line.to_string());
        out.push('\n');
    }

    out.push('\n');
    out.push_str(&format!("{} repositories", records.len()));
    out
}

fn format_row(cells: &[&str; 5], widths: &[usize; 5]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| format!("{:<width$}", cell))
        .collect();
    padded.join("  ").trim_end().to_string()
}

fn render_list(records: &[RepoRecord]) -> String {
    records
        .iter()
        .map(|r| r.name.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_json(records: &[RepoRecord], catalog_timestamp: u64) -> Result<String> {
    let document = CatalogDocument {
        timestamp: catalog_timestamp,
        total: records.len(),
        repositories: records,
    };
    Ok(serde_json::to_string_pretty(&document)?)
}
