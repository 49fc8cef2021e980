//! Terminal rendering of command output.

use std::fmt;
use std::io::{self, Write};

use datadock_core::Page;
use datadock_core::catalog::DatabaseServiceDescriptor;
use datadock_core::model::{Connection, EtlPipeline, Schedule};
use jiff::Timestamp;
use serde::Serialize;

/// Placeholder for absent values.
const NONE: &str = "-";

/// Where and how command results are written.
#[derive(Debug, Clone, Copy)]
pub struct Output {
    json: bool,
}

impl Output {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    /// Prints `value` as JSON, or the text produced by `text`.
    ///
    /// A closed stdout (`datadock ... | head`) is returned as an error.
    pub fn emit<T, F>(&self, value: &T, text: F) -> anyhow::Result<()>
    where
        T: Serialize + ?Sized,
        F: FnOnce() -> String,
    {
        self.write_to(&mut io::stdout().lock(), value, text)
    }

    fn write_to<W, T, F>(&self, out: &mut W, value: &T, text: F) -> anyhow::Result<()>
    where
        W: Write,
        T: Serialize + ?Sized,
        F: FnOnce() -> String,
    {
        if self.json {
            writeln!(out, "{}", serde_json::to_string_pretty(value)?)?;
        } else {
            writeln!(out, "{}", text())?;
        }
        out.flush()?;
        Ok(())
    }

    /// Prints a one-line status message; JSON mode wraps it in an object.
    pub fn message(&self, message: &str) -> anyhow::Result<()> {
        self.emit(&serde_json::json!({ "message": message }), || {
            message.to_owned()
        })
    }
}

/// Plain-text table with left-aligned, width-fitted columns.
#[derive(Debug, Clone, Default)]
pub struct Table {
    headers: Vec<&'static str>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(headers: &[&'static str]) -> Self {
        Self {
            headers: headers.to_vec(),
            rows: Vec::new(),
        }
    }

    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (i, cell) in row.iter().enumerate() {
                if let Some(width) = widths.get_mut(i) {
                    *width = (*width).max(cell.chars().count());
                }
            }
        }
        widths
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let widths = self.widths();
        write_line(f, &widths, self.headers.iter().copied())?;
        for row in &self.rows {
            write_line(f, &widths, row.iter().map(String::as_str))?;
        }
        Ok(())
    }
}

fn write_line<'a>(
    f: &mut fmt::Formatter<'_>,
    widths: &[usize],
    cells: impl Iterator<Item = &'a str>,
) -> fmt::Result {
    let rendered: Vec<String> = cells
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    writeln!(f, "{}", rendered.join("  ").trim_end())
}

/// Formats an optional timestamp in UTC.
pub fn timestamp(value: Option<Timestamp>) -> String {
    value.map_or_else(
        || NONE.to_owned(),
        |ts| ts.strftime("%Y-%m-%d %H:%M:%S UTC").to_string(),
    )
}

fn or_none(value: Option<&str>) -> String {
    match value {
        Some(value) if !value.trim().is_empty() => value.to_owned(),
        _ => NONE.to_owned(),
    }
}

/// "Page 2 of 3 (23 connections), next: --page 3".
pub fn page_footer<T>(page: &Page<T>, noun: &str) -> String {
    let footer = format!(
        "Page {} of {} ({} {noun})",
        page.page,
        page.total_pages.max(1),
        page.total_items
    );
    if page.has_next() {
        format!("{footer}, next: --page {}", page.page + 1)
    } else {
        footer
    }
}

pub fn catalog_table(descriptors: &[&DatabaseServiceDescriptor]) -> Table {
    let mut table = Table::new(&["ID", "NAME", "CATEGORY", "PORT", ""]);
    for d in descriptors {
        table.row(vec![
            d.id.to_owned(),
            d.display_name.to_owned(),
            d.category.to_string(),
            d.default_port.to_string(),
            if d.beta { "beta".to_owned() } else { String::new() },
        ]);
    }
    table
}

pub fn connections_table(connections: &[Connection]) -> Table {
    let mut table = Table::new(&[
        "ID",
        "NAME",
        "TYPE",
        "ENDPOINT",
        "DATABASE",
        "STATUS",
        "LAST TESTED",
    ]);
    for c in connections {
        let endpoint = match c.port {
            Some(port) if !c.host.is_empty() => format!("{}:{port}", c.host),
            _ => or_none(Some(&c.host)),
        };
        table.row(vec![
            c.id.to_string(),
            c.name.clone(),
            c.connection_type.clone(),
            endpoint,
            or_none(Some(&c.database)),
            c.test_status().to_string(),
            timestamp(c.last_tested_at),
        ]);
    }
    table
}

pub fn connection_detail(c: &Connection) -> String {
    let mut lines = vec![
        ("ID", c.id.to_string()),
        ("Name", c.name.clone()),
        ("Type", c.connection_type.clone()),
        ("Host", or_none(Some(&c.host))),
        ("Port", c.port.map_or_else(|| NONE.to_owned(), |p| p.to_string())),
        ("Database", or_none(Some(&c.database))),
        ("Username", or_none(Some(&c.username))),
        ("SSL", c.ssl_enabled.to_string()),
        ("Test status", c.test_status().to_string()),
        ("Last tested", timestamp(c.last_tested_at)),
        ("Created", timestamp(c.created_at)),
        ("Updated", timestamp(c.updated_at)),
    ];
    for (key, value) in &c.extra {
        if let Some(text) = value.as_str() {
            lines.push((key.as_str(), text.to_owned()));
        }
    }

    let width = lines.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    lines
        .iter()
        .map(|(key, value)| format!("{key:<width$}  {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn pipelines_table(pipelines: &[EtlPipeline]) -> Table {
    let mut table = Table::new(&["ID", "NAME", "STATUS", "SCHEDULE", "LAST RUN", "NEXT RUN"]);
    for p in pipelines {
        table.row(vec![
            p.id.to_string(),
            p.name.clone(),
            p.status.to_string(),
            or_none(p.schedule.as_deref()),
            timestamp(p.last_run_at),
            timestamp(p.next_run_at),
        ]);
    }
    table
}

pub fn schedules_table(schedules: &[Schedule]) -> Table {
    let mut table = Table::new(&["ID", "PIPELINE", "CRON", "ENABLED", "NEXT RUN"]);
    for s in schedules {
        table.row(vec![
            s.id.to_string(),
            s.pipeline_id
                .as_ref()
                .map_or_else(|| NONE.to_owned(), ToString::to_string),
            or_none(s.cron.as_deref()),
            s.enabled.to_string(),
            timestamp(s.next_run_at),
        ]);
    }
    table
}
