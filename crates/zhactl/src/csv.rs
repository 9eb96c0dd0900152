//! Semicolon-separated CSV files.
//!
//! Writing quotes a field only when it contains the delimiter, a quote or
//! a line break. Reading tolerates a UTF-8 byte-order mark, CRLF line
//! endings and blank lines; header names are trimmed and lower-cased.

use std::path::Path;

use zhactl_core::ChangeRequest;
use zhactl_core::inventory::TemplateRow;

use crate::error::CliError;

pub const DELIMITER: char = ';';

// ── Writing ─────────────────────────────────────────────────────────

fn push_field(out: &mut String, field: &str) {
    let needs_quotes = field
        .chars()
        .any(|c| c == DELIMITER || c == '"' || c == '\n' || c == '\r');
    if needs_quotes {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

fn push_record<'a>(out: &mut String, fields: impl IntoIterator<Item = &'a str>) {
    for (i, field) in fields.into_iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        push_field(out, field);
    }
    out.push('\n');
}

/// Render a header line plus one line per row.
pub fn to_string<'a, I, R>(headers: &[&str], rows: I) -> String
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = &'a str>,
{
    let mut out = String::new();
    push_record(&mut out, headers.iter().copied());
    for row in rows {
        push_record(&mut out, row);
    }
    out
}

pub fn write_file<'a, I, R>(path: &Path, headers: &[&str], rows: I) -> Result<(), CliError>
where
    I: IntoIterator<Item = R>,
    R: IntoIterator<Item = &'a str>,
{
    std::fs::write(path, to_string(headers, rows))?;
    Ok(())
}

// ── Reading ─────────────────────────────────────────────────────────

/// A parse failure at a 1-based line number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

/// One data row and the line it starts on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    fields: Vec<String>,
}

impl Record {
    /// Field at `column`; short rows read as empty.
    pub fn get(&self, column: usize) -> &str {
        self.fields.get(column).map_or("", String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sheet {
    pub headers: Vec<String>,
    pub records: Vec<Record>,
}

impl Sheet {
    pub fn parse(text: &str) -> Result<Self, ParseError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut rows = split_records(text)?.into_iter();

        let Some((_, header)) = rows.next() else {
            return Err(ParseError {
                line: 1,
                reason: "file is empty, expected a header row".into(),
            });
        };
        let headers = header
            .into_iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        let records = rows.map(|(line, fields)| Record { line, fields }).collect();
        Ok(Self { headers, records })
    }

    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

fn split_records(text: &str) -> Result<Vec<(usize, Vec<String>)>, ParseError> {
    let mut records = Vec::new();
    let mut record: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut line = 1;
    let mut record_line = 1;

    let mut finish = |record: &mut Vec<String>, field: &mut String, start: usize| {
        record.push(std::mem::take(field));
        let blank = record.len() == 1 && record[0].trim().is_empty();
        let taken = std::mem::take(record);
        if !blank {
            records.push((start, taken));
        }
    };

    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            DELIMITER => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' | '\r' => {
                finish(&mut record, &mut field, record_line);
                line += 1;
                record_line = line;
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(ParseError {
            line: record_line,
            reason: "unterminated quoted field".into(),
        });
    }
    if !field.is_empty() || !record.is_empty() {
        finish(&mut record, &mut field, record_line);
    }
    Ok(records)
}

fn read_sheet(path: &Path) -> Result<Sheet, CliError> {
    let text = std::fs::read_to_string(path)?;
    Sheet::parse(&text).map_err(|e| CliError::Csv {
        path: path.to_path_buf(),
        line: e.line,
        reason: e.reason,
    })
}

fn require(sheet: &Sheet, path: &Path, name: &str) -> Result<usize, CliError> {
    sheet.column(name).ok_or_else(|| CliError::Csv {
        path: path.to_path_buf(),
        line: 1,
        reason: format!("missing required column '{name}'"),
    })
}

// ── Domain readers ──────────────────────────────────────────────────

/// Read `ieee;custom_name` rows. Every data row becomes a request; the
/// planner decides which ones to skip.
pub fn read_change_requests(path: &Path) -> Result<Vec<ChangeRequest>, CliError> {
    let sheet = read_sheet(path)?;
    let ieee = require(&sheet, path, "ieee")?;
    let name = require(&sheet, path, "custom_name")?;
    Ok(sheet
        .records
        .iter()
        .map(|r| ChangeRequest::new(r.get(ieee), r.get(name)))
        .collect())
}

/// Read an export file as template rows (`ieee` required; `model` and
/// `device_name` optional).
pub fn read_export(path: &Path) -> Result<Vec<TemplateRow>, CliError> {
    let sheet = read_sheet(path)?;
    let ieee = require(&sheet, path, "ieee")?;
    let model = sheet.column("model");
    let device_name = sheet.column("device_name");
    let optional = |r: &Record, col: Option<usize>| col.map(|c| r.get(c).trim().to_owned());

    Ok(sheet
        .records
        .iter()
        .map(|r| TemplateRow {
            ieee: r.get(ieee).trim().to_owned(),
            model: optional(r, model).unwrap_or_default(),
            device_name: optional(r, device_name).unwrap_or_default(),
            custom_name: String::new(),
        })
        .collect())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn writes_with_minimal_quoting() {
        let out = to_string(
            &["ieee", "custom_name"],
            vec![
                ["00:15:8d:00:01:02:03:04", "Front door"],
                ["00:17:88:01:0a:0b:0c:0d", "Lamp; \"desk\""],
            ],
        );
        assert_eq!(
            out,
            "ieee;custom_name\n\
             00:15:8d:00:01:02:03:04;Front door\n\
             00:17:88:01:0a:0b:0c:0d;\"Lamp; \"\"desk\"\"\"\n"
        );
    }

    #[test]
    fn written_text_parses_back() {
        let out = to_string(&["a", "b"], vec![["x;y", "multi\nline"], ["", "z"]]);
        let sheet = Sheet::parse(&out).unwrap();
        assert_eq!(sheet.records[0].get(0), "x;y");
        assert_eq!(sheet.records[0].get(1), "multi\nline");
        assert_eq!(sheet.records[1].line, 4);
        assert_eq!(sheet.records[1].get(1), "z");
    }

    #[test]
    fn reads_bom_crlf_and_mixed_case_headers() {
        let text = "\u{feff}IEEE; Custom_Name \r\n00:11;Kitchen\r\n\r\n00:22;Hall\r\n";
        let sheet = Sheet::parse(text).unwrap();
        assert_eq!(sheet.headers, vec!["ieee", "custom_name"]);
        assert_eq!(sheet.records.len(), 2);
        assert_eq!(sheet.records[1].line, 4);
        assert_eq!(sheet.records[1].get(1), "Hall");
    }

    #[test]
    fn short_rows_read_as_empty() {
        let sheet = Sheet::parse("ieee;model;custom_name\n00:11\n").unwrap();
        assert_eq!(sheet.records[0].get(2), "");
        assert_eq!(sheet.records[0].get(9), "");
    }

    #[test]
    fn unterminated_quote_is_an_error() {
        let err = Sheet::parse("ieee;custom_name\n00:11;\"open\n").unwrap_err();
        assert_eq!(err.line, 2);
        assert_eq!(err.reason, "unterminated quoted field");
    }

    #[test]
    fn empty_file_is_an_error() {
        assert!(Sheet::parse("").is_err());
        assert!(Sheet::parse("\u{feff}\n\n").is_err());
    }

    #[test]
    fn change_requests_need_both_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("names.csv");

        std::fs::write(&path, "ieee;name\n00:11;x\n").unwrap();
        let err = read_change_requests(&path).unwrap_err();
        assert!(err.to_string().contains("custom_name"), "{err}");

        std::fs::write(&path, "IEEE;custom_name\n00-11-AA;Kitchen\n;orphan\n").unwrap();
        let requests = read_change_requests(&path).unwrap();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].ieee.as_str(), "00:11:aa");
        assert_eq!(requests[0].name, "Kitchen");
        assert!(requests[1].ieee.is_empty());
    }

    #[test]
    fn export_reader_tolerates_missing_optional_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("export.csv");
        std::fs::write(&path, "ieee;entity_id\n00:11;sensor.a\n00:11;sensor.b\n").unwrap();
        let rows = read_export(&path).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].model, "");
    }
}
