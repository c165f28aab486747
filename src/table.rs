//! Plain-text painting of rendered views.

use std::fmt::Write;
use viz_core::{PatientSummary, RenderedRow, TableView, View};

const INDENT: &str = "  ";
const SEPARATOR: &str = " | ";

/// Paint one view as text. Empty views paint nothing.
pub fn paint(view: &View) -> String {
    match view {
        View::Table(table) => paint_table(table),
        View::Patient(summary) => paint_patient(summary),
        View::Empty => String::new(),
    }
}

/// Title, header line, rule and one line per row. Nested rows are indented beneath their parent.
pub fn paint_table(table: &TableView) -> String {
    let mut lines: Vec<Vec<String>> = Vec::new();
    for row in &table.rows {
        flatten(row, 0, &mut lines);
    }

    let header: Vec<String> = table.headers.iter().map(|h| h.to_string()).collect();
    let columns = lines
        .iter()
        .map(Vec::len)
        .chain([header.len()])
        .max()
        .unwrap_or(0);
    let mut widths = vec![0; columns];
    for line in lines.iter().chain([&header]) {
        for (width, cell) in widths.iter_mut().zip(line) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "== {} ==", table.title);
    let _ = writeln!(out, "{}", join_padded(&header, &widths));
    let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(out, "{}", rule.join("-+-"));
    if lines.is_empty() {
        let _ = writeln!(out, "(no records)");
    }
    for line in &lines {
        let _ = writeln!(out, "{}", join_padded(line, &widths));
    }
    out
}

/// Labelled summary lines, labels aligned.
pub fn paint_patient(summary: &PatientSummary) -> String {
    let entries = summary.entries();
    let width = entries
        .iter()
        .map(|(label, _)| label.len())
        .max()
        .unwrap_or(0);

    let mut out = String::from("== Patient ==\n");
    for (label, value) in entries {
        let _ = writeln!(out, "{label:<width$}  {value}");
    }
    out
}

fn flatten(row: &RenderedRow, depth: usize, lines: &mut Vec<Vec<String>>) {
    let mut cells = row.cells.clone();
    if let Some(first) = cells.first_mut() {
        *first = format!("{}{first}", INDENT.repeat(depth));
    }
    lines.push(cells);
    for child in &row.children {
        flatten(child, depth + 1, lines);
    }
}

/// Pads and joins the cells up to the last non-empty one, so short lines end without a separator.
fn join_padded(cells: &[String], widths: &[usize]) -> String {
    let used = cells
        .iter()
        .rposition(|cell| !cell.is_empty())
        .map_or(0, |last| last + 1);
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .take(used)
        .map(|(cell, width)| format!("{cell:<width$}"))
        .collect();
    padded.join(SEPARATOR).trim_end().to_string()
}
