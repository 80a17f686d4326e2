//! Rendering command results as tables, JSON or YAML.

use std::collections::BTreeMap;

use crate::styled_output::{MessageType, styled_label};

/// How command results are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for humans
    #[default]
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Parse a configured format; anything unrecognised renders as a table.
    pub fn from_str_loose(s: &str) -> OutputFormat {
        match s.trim().to_lowercase().as_str() {
            "json" => OutputFormat::Json,
            "yaml" | "yml" => OutputFormat::Yaml,
            _ => OutputFormat::Table,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, OutputFormat::Table)
    }

    /// Render rows under `headers`.
    ///
    /// Structured formats emit one `header -> cell` object per row; cells
    /// past the header count are dropped.
    pub fn format_table(&self, headers: &[&str], rows: &[Vec<String>]) -> String {
        match self {
            OutputFormat::Table => render_table(headers, rows, crate::styled_output::use_colors(false)),
            OutputFormat::Json => to_json(&row_objects(headers, rows)),
            OutputFormat::Yaml => to_yaml(&row_objects(headers, rows)),
        }
    }

    /// Render one record as labelled fields.
    pub fn format_single(&self, fields: &[(&str, String)]) -> String {
        match self {
            OutputFormat::Table => render_fields(fields, crate::styled_output::use_colors(false)),
            OutputFormat::Json => to_json(&field_object(fields)),
            OutputFormat::Yaml => to_yaml(&field_object(fields)),
        }
    }
}

fn row_objects(headers: &[&str], rows: &[Vec<String>]) -> Vec<BTreeMap<String, String>> {
    rows.iter()
        .map(|row| {
            headers
                .iter()
                .zip(row)
                .map(|(h, cell)| (h.to_string(), cell.clone()))
                .collect()
        })
        .collect()
}

fn field_object(fields: &[(&str, String)]) -> BTreeMap<String, String> {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

fn to_json<T: serde::Serialize>(value: &T) -> String {
    match serde_json::to_string_pretty(value) {
        Ok(s) => format!("{s}\n"),
        Err(e) => format!("{{\"error\": {:?}}}\n", e.to_string()),
    }
}

fn to_yaml<T: serde::Serialize>(value: &T) -> String {
    serde_yaml::to_string(value).unwrap_or_else(|e| format!("error: {:?}\n", e.to_string()))
}

fn width(s: &str) -> usize {
    s.chars().count()
}

fn pad(s: &str, w: usize) -> String {
    format!("{s}{}", " ".repeat(w.saturating_sub(width(s))))
}

fn render_table(headers: &[&str], rows: &[Vec<String>], colors: bool) -> String {
    let upper: Vec<String> = headers.iter().map(|h| h.to_uppercase()).collect();
    let mut widths: Vec<usize> = upper.iter().map(|h| width(h)).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate().take(widths.len()) {
            widths[i] = widths[i].max(width(cell));
        }
    }

    let join = |cells: Vec<String>| cells.join("  ").trim_end().to_string();

    let mut out = String::new();
    let header_line = join(
        upper
            .iter()
            .zip(&widths)
            .map(|(h, w)| pad(h, *w))
            .collect(),
    );
    if colors {
        out.push_str(&styled_label(MessageType::Accent, &header_line, false));
    } else {
        out.push_str(&header_line);
    }
    out.push('\n');
    out.push_str(&join(widths.iter().map(|w| "-".repeat(*w)).collect()));
    out.push('\n');

    for row in rows {
        let cells = widths
            .iter()
            .enumerate()
            .map(|(i, w)| pad(row.get(i).map(String::as_str).unwrap_or(""), *w))
            .collect();
        out.push_str(&join(cells));
        out.push('\n');
    }
    out
}

fn render_fields(fields: &[(&str, String)], colors: bool) -> String {
    let Some(key_width) = fields.iter().map(|(k, _)| width(k)).max() else {
        return String::new();
    };

    let mut out = String::new();
    for (key, value) in fields {
        let label = pad(&format!("{key}:"), key_width + 1);
        let label = if colors {
            styled_label(MessageType::Accent, &label, false)
        } else {
            label
        };
        out.push_str(&format!("{label}  {value}\n"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows() -> Vec<Vec<String>> {
        vec![
            vec!["project-a".into(), "active".into()],
            vec!["b".into(), "archived".into()],
        ]
    }

    #[test]
    fn test_from_str_loose_defaults_to_table() {
        assert_eq!(OutputFormat::from_str_loose("json"), OutputFormat::Json);
        assert_eq!(OutputFormat::from_str_loose("YAML"), OutputFormat::Yaml);
        assert_eq!(OutputFormat::from_str_loose(""), OutputFormat::Table);
        assert_eq!(OutputFormat::from_str_loose("xml"), OutputFormat::Table);
    }

    #[test]
    fn test_table_aligns_columns() {
        let out = render_table(&["Name", "Status"], &rows(), false);
        assert_eq!(
            out,
            "NAME       STATUS\n\
             ---------  --------\n\
             project-a  active\n\
             b          archived\n"
        );
    }

    #[test]
    fn test_table_without_rows_keeps_headers() {
        let out = render_table(&["ID", "TOPIC"], &[], false);
        assert_eq!(out, "ID  TOPIC\n--  -----\n");
    }

    #[test]
    fn test_table_short_rows_are_padded() {
        let out = render_table(&["A", "B"], &[vec!["x".into()]], false);
        assert_eq!(out.lines().last(), Some("x"));
    }

    #[test]
    fn test_fields_pad_keys() {
        let out = render_fields(
            &[("Name", "my-project".into()), ("Created", "2026-01-15".into())],
            false,
        );
        assert_eq!(out, "Name:     my-project\nCreated:  2026-01-15\n");
    }

    #[test]
    fn test_fields_empty() {
        assert_eq!(OutputFormat::Table.format_single(&[]), "");
    }

    #[test]
    fn test_json_table_is_array_of_objects() {
        let out = OutputFormat::Json.format_table(&["Name", "Status"], &rows());
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(
            parsed,
            serde_json::json!([
                {"Name": "project-a", "Status": "active"},
                {"Name": "b", "Status": "archived"}
            ])
        );
    }

    #[test]
    fn test_json_empty_table_is_empty_array() {
        let out = OutputFormat::Json.format_table(&["Name"], &[]);
        assert_eq!(out.trim(), "[]");
    }

    #[test]
    fn test_json_single_is_object() {
        let out = OutputFormat::Json.format_single(&[("Auth Method", "API Key".into())]);
        let parsed: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(parsed, serde_json::json!({"Auth Method": "API Key"}));
    }

    #[test]
    fn test_yaml_table_and_single() {
        let out = OutputFormat::Yaml.format_table(&["Name", "Status"], &rows());
        let parsed: Vec<BTreeMap<String, String>> = serde_yaml::from_str(&out).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1]["Status"], "archived");

        let out = OutputFormat::Yaml.format_single(&[("Name", "alpha".into())]);
        assert_eq!(out, "Name: alpha\n");
    }
}
