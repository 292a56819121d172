//! Text rendering for tool output
//!
//! Every tool answers with human-readable text followed by a machine-readable
//! `JSON data:` block. Tables are rendered with comfy-table in a markdown-ish
//! ASCII preset and never wrap; long cells are truncated instead.

use chrono::{DateTime, Utc};
use comfy_table::{presets::ASCII_MARKDOWN, ContentArrangement, Table};
use serde_json::{json, Value};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Truncate `value` to at most `width` chars, marking the cut with `...`
///
/// Newlines collapse to spaces so a cell always stays on one table row.
/// Widths below 3 have no room for the marker and cut the value bare.
pub fn truncate(value: &str, width: usize) -> String {
    let flat: String = value
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect();

    if flat.chars().count() <= width {
        return flat;
    }

    if width < 3 {
        return flat.chars().take(width).collect();
    }

    let kept: String = flat.chars().take(width - 3).collect();
    format!("{}...", kept)
}

pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.format(TIMESTAMP_FORMAT).to_string()
}

/// Plain-text form of a JSON value for a table cell or inline field
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn pretty_json(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// `JSON data:` trailer shared by every response
pub fn json_block(value: &Value) -> String {
    format!("JSON data:\n{}", pretty_json(value))
}

pub fn render_table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut table = Table::new();
    table
        .load_preset(ASCII_MARKDOWN)
        .set_content_arrangement(ContentArrangement::Disabled)
        .set_header(headers.iter().copied());

    for row in rows {
        table.add_row(row.iter().map(String::as_str));
    }

    table.to_string()
}

/// Title, table, then the JSON payload `{"total": n, "<key>": rows}`
pub fn render_list(
    title: &str,
    headers: &[&str],
    rows: &[Vec<String>],
    json_key: &str,
    json_rows: Vec<Value>,
) -> String {
    let payload = json!({
        "total": json_rows.len(),
        json_key: json_rows,
    });

    format!(
        "{}\n\n{}\n\n{}",
        title,
        render_table(headers, rows),
        json_block(&payload)
    )
}

/// Response for a listing with no rows
pub fn render_empty(plural: &str, json_key: &str) -> String {
    let payload = json!({
        "total": 0,
        json_key: [],
    });

    format!("No {} found.\n\n{}", plural, json_block(&payload))
}

/// Labelled key/value block for a single entry
#[derive(Debug, Default)]
pub struct DetailView {
    title: String,
    fields: Vec<(String, String)>,
    blocks: Vec<(String, String)>,
    sections: Vec<(String, Vec<String>)>,
}

impl DetailView {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Inline `Label: value` line
    pub fn field(mut self, label: &str, value: impl Into<String>) -> Self {
        self.fields.push((label.to_string(), value.into()));
        self
    }

    /// Scalars go inline; objects and arrays are rendered as pretty JSON under the label
    pub fn value(mut self, label: &str, value: &Value) -> Self {
        match value {
            Value::Object(_) | Value::Array(_) => {
                self.blocks.push((label.to_string(), pretty_json(value)));
                self
            }
            scalar => self.field(label, cell_text(scalar)),
        }
    }

    /// Titled bullet list (e.g. related entries)
    pub fn section(mut self, title: &str, lines: Vec<String>) -> Self {
        if !lines.is_empty() {
            self.sections.push((title.to_string(), lines));
        }
        self
    }

    pub fn render(&self, data: &Value) -> String {
        let mut out = format!("{}\n", self.title);

        for (label, value) in &self.fields {
            out.push_str(&format!("{}: {}\n", label, value));
        }

        for (label, block) in &self.blocks {
            out.push_str(&format!("\n{}:\n{}\n", label, block));
        }

        for (title, lines) in &self.sections {
            out.push_str(&format!("\n{}\n", title));
            for line in lines {
                out.push_str(&format!("- {}\n", line));
            }
        }

        out.push('\n');
        out.push_str(&json_block(data));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_long_value() {
        let value = "x".repeat(301);
        let out = truncate(&value, 50);

        assert_eq!(out.chars().count(), 50);
        assert!(out.ends_with("..."));
        assert_eq!(&out[..47], &value[..47]);
    }

    #[test]
    fn test_truncate_short_value_untouched() {
        assert_eq!(truncate("select 1", 50), "select 1");
        assert_eq!(truncate("abcde", 5), "abcde");
    }

    #[test]
    fn test_truncate_multibyte_and_newlines() {
        assert_eq!(truncate("héllo wörld", 8), "héllo...");
        assert_eq!(truncate("a\nb", 10), "a b");
    }

    #[test]
    fn test_truncate_never_exceeds_tiny_widths() {
        assert_eq!(truncate("abcdef", 2), "ab");
        assert_eq!(truncate("abcdef", 0), "");
        assert_eq!(truncate("abcdef", 3), "...");
        assert_eq!(truncate("ab", 2), "ab");
    }

    #[test]
    fn test_cell_text() {
        assert_eq!(cell_text(&json!("GET")), "GET");
        assert_eq!(cell_text(&json!(200)), "200");
        assert_eq!(cell_text(&json!(null)), "");
        assert_eq!(cell_text(&json!(true)), "true");
    }

    #[test]
    fn test_render_list_contains_rows_and_json() {
        let out = render_list(
            "Recent Queries:",
            &["ID", "SQL"],
            &[vec!["q1".to_string(), "select 1".to_string()]],
            "queries",
            vec![json!({"id": "q1", "sql": "select 1"})],
        );

        assert!(out.starts_with("Recent Queries:\n\n"));
        assert!(out.contains("| ID"));
        assert!(out.contains("select 1"));
        assert!(out.contains("JSON data:\n{"));
        assert!(out.contains("\"total\": 1"));
    }

    #[test]
    fn test_render_empty() {
        let out = render_empty("queries", "queries");

        assert!(out.starts_with("No queries found."));
        assert!(out.contains("\"total\": 0"));
        assert!(out.contains("\"queries\": []"));
    }

    #[test]
    fn test_detail_view() {
        let out = DetailView::new("Request Details:")
            .field("ID", "r1")
            .value("Status", &json!(200))
            .value("Headers", &json!({"accept": "*/*"}))
            .section("Related Entries:", vec!["Queries: 2".to_string()])
            .render(&json!({"id": "r1"}));

        assert!(out.starts_with("Request Details:\nID: r1\nStatus: 200\n"));
        assert!(out.contains("\nHeaders:\n{\n  \"accept\": \"*/*\"\n}\n"));
        assert!(out.contains("Related Entries:\n- Queries: 2\n"));
        assert!(out.ends_with("JSON data:\n{\n  \"id\": \"r1\"\n}"));
    }
}
