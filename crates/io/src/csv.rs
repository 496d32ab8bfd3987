// CSV/TSV row-set import and visible-set export

use std::io::Read;
use std::path::Path;

use streamgrid_engine::column::ColumnDef;
use streamgrid_engine::grid::Grid;
use streamgrid_engine::row::{Row, RowId};
use streamgrid_engine::value::Value;

/// What a schema-typed import did besides producing rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Rows successfully produced.
    pub rows: usize,
    /// Lines skipped entirely (missing or unparseable `id`).
    pub skipped_lines: usize,
    /// Cells whose text failed coercion to the column type and landed as
    /// null instead.
    pub coercion_failures: usize,
}

/// Import a delimited file as a typed row set.
///
/// The delimiter is sniffed from the content; the header row maps fields
/// to column keys. A column named `id` is required and must parse as an
/// integer per row. Headers naming no declared column are ignored, and
/// cells that fail coercion land as null (counted, not fatal).
pub fn import(path: &Path, columns: &[ColumnDef]) -> Result<(Vec<Row>, ImportReport), String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter, columns)
}

pub fn import_with_delimiter(
    path: &Path,
    delimiter: u8,
    columns: &[ColumnDef],
) -> Result<(Vec<Row>, ImportReport), String> {
    let content = read_file_as_utf8(path)?;
    import_from_string(&content, delimiter, columns)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: (number of lines with same field count as line 1) * field_count
        // Higher field count breaks ties — more columns = more likely real delimiter
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    // Try UTF-8 first; on failure, recover the buffer from the error
    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn import_from_string(
    content: &str,
    delimiter: u8,
    columns: &[ColumnDef],
) -> Result<(Vec<Row>, ImportReport), String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers().map_err(|e| e.to_string())?.clone();
    let id_index = headers
        .iter()
        .position(|h| h.trim() == "id")
        .ok_or_else(|| "missing required 'id' column".to_string())?;

    // header position -> declared column, for typed cell parsing
    let mapped: Vec<(usize, &ColumnDef)> = headers
        .iter()
        .enumerate()
        .filter_map(|(i, h)| columns.iter().find(|c| c.key == h.trim()).map(|c| (i, c)))
        .collect();

    let mut rows = Vec::new();
    let mut report = ImportReport::default();

    for result in reader.records() {
        let record = result.map_err(|e| e.to_string())?;
        let id = record.get(id_index).map(str::trim).and_then(|s| s.parse::<i64>().ok());
        let Some(id) = id else {
            report.skipped_lines += 1;
            continue;
        };

        let mut row = Row::new(RowId(id));
        for (index, column) in &mapped {
            let raw = record.get(*index).unwrap_or("");
            let value = match Value::parse(raw, &column.ty) {
                Ok(value) => value,
                Err(_) => {
                    report.coercion_failures += 1;
                    Value::Null
                }
            };
            row = row.with(column.key.clone(), value);
        }
        rows.push(row);
        report.rows += 1;
    }

    Ok((rows, report))
}

/// Serialize the grid's filtered+sorted ungrouped row set as delimited
/// text: header row of column labels first, visible columns in layout
/// order, fields quoted when they contain the delimiter, a quote, or a
/// newline.
pub fn export_visible(grid: &Grid, delimiter: u8) -> Result<String, String> {
    let columns = grid.visible_columns();

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer
        .write_record(columns.iter().map(|c| c.label.as_str()))
        .map_err(|e| e.to_string())?;

    for &id in grid.visible_rows() {
        let record: Vec<String> =
            columns.iter().map(|c| grid.value(id, &c.key).to_string()).collect();
        writer.write_record(&record).map_err(|e| e.to_string())?;
    }

    let bytes = writer.into_inner().map_err(|e| e.to_string())?;
    String::from_utf8(bytes).map_err(|e| e.to_string())
}

/// `export_visible` straight to a file.
pub fn export_visible_to(grid: &Grid, path: &Path, delimiter: u8) -> Result<(), String> {
    let content = export_visible(grid, delimiter)?;
    std::fs::write(path, content).map_err(|e| e.to_string())
}
