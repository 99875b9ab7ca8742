// Tabular output for scraped records: CSV, JSON and terminal previews.

use chrono::Local;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::error::Result;
use crate::extractor::ExtractedRecord;
use crate::profiles::{Book, Quote};

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Guess from the file extension; anything that is not `.json` is CSV.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => ExportFormat::Json,
            _ => ExportFormat::Csv,
        }
    }
}

/// Something that can become one table row of named cells.
pub trait Row {
    fn cells(&self) -> Vec<(String, String)>;
}

impl Row for ExtractedRecord {
    fn cells(&self) -> Vec<(String, String)> {
        self.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }
}

impl Row for Quote {
    fn cells(&self) -> Vec<(String, String)> {
        vec![
            ("quote".to_string(), self.quote.clone()),
            ("author".to_string(), self.author.clone()),
            ("tags".to_string(), self.tags.clone()),
        ]
    }
}

impl Row for Book {
    fn cells(&self) -> Vec<(String, String)> {
        vec![
            ("title".to_string(), self.title.clone()),
            ("price".to_string(), self.price.to_string()),
            ("rating".to_string(), self.rating.clone()),
            ("availability".to_string(), self.availability.clone()),
            ("page".to_string(), self.page.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Headers are the union of every record's keys in first-seen order;
    /// a record without some key gets an empty cell there.
    pub fn from_rows<R: Row>(records: &[R]) -> Self {
        let cells: Vec<Vec<(String, String)>> = records.iter().map(Row::cells).collect();

        let mut headers: Vec<String> = Vec::new();
        for (key, _) in cells.iter().flatten() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }

        let rows = cells
            .into_iter()
            .map(|row| {
                headers
                    .iter()
                    .map(|header| {
                        row.iter()
                            .find(|(key, _)| key == header)
                            .map(|(_, value)| value.clone())
                            .unwrap_or_default()
                    })
                    .collect()
            })
            .collect();

        Self { headers, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn write_csv<W: Write>(&self, mut writer: W) -> io::Result<()> {
        write_row(&mut writer, &self.headers)?;
        for row in &self.rows {
            write_row(&mut writer, row)?;
        }
        writer.flush()
    }

    pub fn to_csv_string(&self) -> String {
        let mut buf: Vec<u8> = Vec::new();
        let _ = self.write_csv(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    }

    /// First `n` rows as a fixed-width text block, cells clipped to 40
    /// characters.
    pub fn preview(&self, n: usize) -> String {
        const MAX_CELL: usize = 40;

        let clip = |s: &str| -> String {
            if s.chars().count() > MAX_CELL {
                let head: String = s.chars().take(MAX_CELL - 3).collect();
                format!("{}...", head)
            } else {
                s.to_string()
            }
        };

        let shown: Vec<Vec<String>> = self
            .rows
            .iter()
            .take(n)
            .map(|row| row.iter().map(|c| clip(c.as_str())).collect())
            .collect();
        let headers: Vec<String> = self.headers.iter().map(|h| clip(h.as_str())).collect();

        let widths: Vec<usize> = headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                shown
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|c| c.chars().count())
                    .chain(std::iter::once(h.chars().count()))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        let mut out = line(&headers);
        for row in &shown {
            out.push('\n');
            out.push_str(&line(row));
        }
        out
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write one CSV row, quoting cells that contain separators or quotes.
pub fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    let mut first = true;
    for cell in row {
        if !first {
            write!(w, ",")?;
        } else {
            first = false;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// JSON envelope written by [`write_json`].
#[derive(Debug, Serialize)]
pub struct ScrapeReport<'a, T: Serialize> {
    pub source: &'a str,
    pub scraped_at: String,
    pub total_records: usize,
    pub records: &'a [T],
}

impl<'a, T: Serialize> ScrapeReport<'a, T> {
    pub fn new(source: &'a str, records: &'a [T]) -> Self {
        Self {
            source,
            scraped_at: Local::now().to_rfc3339(),
            total_records: records.len(),
            records,
        }
    }
}

pub fn write_json<W: Write, T: Serialize>(writer: W, report: &ScrapeReport<'_, T>) -> Result<()> {
    serde_json::to_writer_pretty(writer, report)?;
    Ok(())
}

/// Save `records` to `path`. Returns the number of records written.
pub fn save<R: Row + Serialize>(records: &[R], source: &str, path: &Path, format: ExportFormat) -> Result<usize> {
    let mut writer = BufWriter::new(File::create(path)?);

    match format {
        ExportFormat::Csv => Table::from_rows(records).write_csv(&mut writer)?,
        ExportFormat::Json => {
            write_json(&mut writer, &ScrapeReport::new(source, records))?;
            writeln!(writer)?;
            writer.flush()?;
        }
    }

    log::info!("Saved {} records to {}", records.len(), path.display());
    Ok(records.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::extractor::extract;
    use pretty_assertions::assert_eq;

    fn records() -> Vec<ExtractedRecord> {
        let doc = Document::parse_str(
            r#"<div class="r"><b>alpha</b><i>beta, gamma</i><u>say "hi"</u></div>
               <div class="r"><b>delta</b></div>"#,
        )
        .unwrap();
        extract(&doc, ".r", 10)
    }

    #[test]
    fn test_table_union_headers_and_empty_cells() {
        let table = Table::from_rows(&records());
        assert_eq!(table.headers, vec!["field_1", "field_2", "field_3"]);
        assert_eq!(table.rows[1], vec!["delta", "", ""]);
    }

    #[test]
    fn test_csv_quoting() {
        let csv = Table::from_rows(&records()).to_csv_string();
        assert_eq!(
            csv,
            "field_1,field_2,field_3\nalpha,\"beta, gamma\",\"say \"\"hi\"\"\"\ndelta,,\n"
        );
    }

    #[test]
    fn test_book_and_quote_rows() {
        let books = vec![Book {
            title: "Sharp Objects".to_string(),
            price: 47.82,
            rating: "Four".to_string(),
            availability: "In stock".to_string(),
            page: 1,
        }];
        let table = Table::from_rows(&books);
        assert_eq!(table.headers, vec!["title", "price", "rating", "availability", "page"]);
        assert_eq!(table.rows[0][1], "47.82");

        let quotes = vec![Quote {
            quote: "Hi".to_string(),
            author: "Me".to_string(),
            tags: "a, b".to_string(),
        }];
        assert_eq!(Table::from_rows(&quotes).to_csv_string(), "quote,author,tags\nHi,Me,\"a, b\"\n");
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(ExportFormat::from_path(Path::new("out.JSON")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("out.csv")), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_path(Path::new("out")), ExportFormat::Csv);
    }

    #[test]
    fn test_save_csv_and_json() {
        let dir = tempfile::tempdir().unwrap();
        let records = records();

        let csv_path = dir.path().join("records.csv");
        assert_eq!(save(&records, "http://x", &csv_path, ExportFormat::Csv).unwrap(), 2);
        let written = std::fs::read_to_string(&csv_path).unwrap();
        assert!(written.starts_with("field_1,field_2,field_3\n"));

        let json_path = dir.path().join("records.json");
        save(&records, "http://x", &json_path, ExportFormat::Json).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json_path).unwrap()).unwrap();
        assert_eq!(value["total_records"], 2);
        assert_eq!(value["records"][1]["field_1"], "delta");
    }

    #[test]
    fn test_preview_aligns_columns() {
        let table = Table {
            headers: vec!["a".to_string(), "bb".to_string()],
            rows: vec![
                vec!["long value".to_string(), "x".to_string()],
                vec!["y".to_string(), "z".to_string()],
            ],
        };
        assert_eq!(table.preview(1), "a           bb\nlong value  x");
    }
}
