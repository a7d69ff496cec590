use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::{CastOptions, cast_with_options};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use calamine::{Data, Reader, open_workbook_auto};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{CellValue, Dataset, Field, ProjectRecord};

/// Sheet read from spreadsheet workbooks unless configured otherwise.
pub const DEFAULT_SHEET: &str = "Cleaned Data";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a dataset could not be loaded. Both variants halt the render pass.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("data file not found at: {}", .path.display())]
    NotFound { path: PathBuf },
    #[error("error loading {}: {reason}", .path.display())]
    Read { path: PathBuf, reason: String },
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a project dataset from a file. Dispatch by extension.
///
/// Supported formats:
/// * `.xlsx` / `.xlsm` / `.xlsb` / `.xls` / `.ods` – the sheet named `sheet`
/// * `.csv`     – header row, one project per line
/// * `.json`    – `[{ "Status": "Done", "Year": 2021, ... }, ...]`
/// * `.parquet` – flat scalar columns
///
/// `sheet` is ignored by the single-table formats.
pub fn load(path: &Path, sheet: &str) -> Result<Dataset, LoadError> {
    if !path.exists() {
        log::error!("Data file not found at: {}", path.display());
        return Err(LoadError::NotFound {
            path: path.to_path_buf(),
        });
    }

    match load_table(path, sheet).and_then(build_dataset) {
        Ok(dataset) => {
            log::info!(
                "Loaded {} rows from {} with columns {:?}",
                dataset.len(),
                path.display(),
                dataset.columns
            );
            Ok(dataset)
        }
        Err(e) => {
            log::error!("Failed to load {}: {e:#}", path.display());
            Err(LoadError::Read {
                path: path.to_path_buf(),
                reason: format!("{e:#}"),
            })
        }
    }
}

/// Untyped header + rows, before coercion into [`ProjectRecord`]s.
struct RawTable {
    headers: Vec<String>,
    rows: Vec<RawRow>,
}

struct RawRow {
    /// Row number in the source file, header being row 1 unless the sheet
    /// starts lower down.
    line: usize,
    cells: Vec<CellValue>,
}

impl RawRow {
    /// A row numbered as if the table had one header row and no gaps.
    fn at_index(index: usize, cells: Vec<CellValue>) -> Self {
        RawRow {
            line: index + 2,
            cells,
        }
    }
}

fn load_table(path: &Path, sheet: &str) -> Result<RawTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => load_workbook(path, sheet),
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
}

// ---------------------------------------------------------------------------
// Typed coercion
// ---------------------------------------------------------------------------

/// Turn a raw table into a [`Dataset`], coercing the known columns.
fn build_dataset(table: RawTable) -> Result<Dataset> {
    let headers = dedupe_headers(table.headers);
    let fields: Vec<Option<Field>> = headers.iter().map(|h| Field::from_header(h)).collect();

    let mut records = Vec::with_capacity(table.rows.len());
    let mut source_rows = Vec::with_capacity(table.rows.len());
    for row in table.rows {
        let row_no = row.line;
        let mut rec = ProjectRecord::default();
        for (col, value) in row.cells.into_iter().enumerate() {
            let Some(header) = headers.get(col) else {
                continue;
            };
            let Some(field) = fields[col] else {
                if !value.is_null() {
                    rec.extra.insert(header.clone(), value);
                }
                continue;
            };
            let ctx = || format!("row {row_no}, column '{header}'");
            match field {
                Field::ProjectType => rec.project_type = to_category(&value),
                Field::Status => rec.status = to_category(&value),
                Field::TotalProjects => rec.total_projects = to_number(&value).with_context(ctx)?,
                Field::BudgetAllocated => {
                    rec.budget_allocated = to_number(&value).with_context(ctx)?
                }
                Field::BudgetUtilized => rec.budget_utilized = to_number(&value).with_context(ctx)?,
                Field::CitizenSatisfactionRate => {
                    rec.citizen_satisfaction_rate = to_number(&value).with_context(ctx)?
                }
                Field::Year => rec.year = to_year(&value).with_context(ctx)?,
                Field::BudgetUtilizationPercentage => {
                    rec.budget_utilization_percentage = to_number(&value).with_context(ctx)?
                }
            }
        }
        records.push(rec);
        source_rows.push(row_no);
    }

    Ok(Dataset::with_source_rows(headers, records, source_rows))
}

/// Make headers unique the way pandas does: `Status`, `Status.1`, ...
fn dedupe_headers(headers: Vec<String>) -> Vec<String> {
    let mut seen: BTreeMap<String, usize> = BTreeMap::new();
    headers
        .into_iter()
        .enumerate()
        .map(|(i, h)| {
            let h = h.trim().to_string();
            let h = if h.is_empty() { format!("Unnamed: {i}") } else { h };
            let n = seen.entry(h.clone()).or_insert(0);
            let out = if *n == 0 { h } else { format!("{h}.{n}") };
            *n += 1;
            out
        })
        .collect()
}

/// Category text with surrounding whitespace removed, so `"Road "` and
/// `"Road"` are one category whatever the file format.
fn to_category(value: &CellValue) -> Option<String> {
    match value {
        CellValue::Null => None,
        CellValue::String(s) if s.trim().is_empty() => None,
        CellValue::String(s) => Some(s.trim().to_string()),
        other => Some(other.to_string()),
    }
}

fn to_number(value: &CellValue) -> Result<Option<f64>> {
    match value {
        CellValue::Null => Ok(None),
        CellValue::Integer(i) => Ok(Some(*i as f64)),
        CellValue::Float(f) if f.is_nan() => Ok(None),
        CellValue::Float(f) => Ok(Some(*f)),
        CellValue::Bool(b) => Ok(Some(if *b { 1.0 } else { 0.0 })),
        CellValue::String(s) if s.trim().is_empty() => Ok(None),
        CellValue::String(s) => s
            .trim()
            .parse::<f64>()
            .map(Some)
            .with_context(|| format!("'{s}' is not a number")),
        CellValue::Date(d) => bail!("'{d}' is a date, expected a number"),
    }
}

fn to_year(value: &CellValue) -> Result<Option<i32>> {
    let Some(v) = to_number(value)? else {
        return Ok(None);
    };
    if v.fract() != 0.0 || v < i32::MIN as f64 || v > i32::MAX as f64 {
        bail!("{v} is not a valid year");
    }
    Ok(Some(v as i32))
}

// ---------------------------------------------------------------------------
// Spreadsheet loader
// ---------------------------------------------------------------------------

/// Read the named sheet of a workbook; the first row holds the headers.
fn load_workbook(path: &Path, sheet: &str) -> Result<RawTable> {
    let mut workbook = open_workbook_auto(path).context("opening workbook")?;

    let names = workbook.sheet_names();
    if !names.iter().any(|n| n == sheet) {
        bail!("Worksheet named '{sheet}' not found (available: {names:?})");
    }

    let range = workbook
        .worksheet_range(sheet)
        .with_context(|| format!("reading worksheet '{sheet}'"))?;

    let mut rows = range.rows();
    let Some(header_row) = rows.next() else {
        return Ok(RawTable {
            headers: Vec::new(),
            rows: Vec::new(),
        });
    };
    let headers = header_row.iter().map(|c| c.to_string()).collect();

    // The range begins at the first non-empty row, which holds the headers.
    let header_line = range.start().map_or(1, |(row, _)| row as usize + 1);

    let mut out = Vec::new();
    for (i, row) in rows.enumerate() {
        let line = header_line + i + 1;
        let cells = row
            .iter()
            .map(workbook_cell)
            .collect::<Result<Vec<_>>>()
            .with_context(|| format!("row {line}"))?;
        if cells.iter().all(CellValue::is_null) {
            continue;
        }
        out.push(RawRow { line, cells });
    }

    Ok(RawTable { headers, rows: out })
}

fn workbook_cell(cell: &Data) -> Result<CellValue> {
    Ok(match cell {
        Data::Empty => CellValue::Null,
        Data::String(s) if s.trim().is_empty() => CellValue::Null,
        Data::String(s) => CellValue::String(s.clone()),
        Data::Int(i) => CellValue::Integer(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => CellValue::Float(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::Date(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => bail!("cell holds a spreadsheet error: {e:?}"),
    })
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, one project per record.
fn load_csv(path: &Path) -> Result<RawTable> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut rows = Vec::new();
    for (i, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {}", i + 2))?;
        let cells = record.iter().map(CellValue::from_text).collect();
        // Quoted fields may span lines, so prefer the reader's own line count.
        let line = record
            .position()
            .map_or(i + 2, |pos| pos.line() as usize);
        rows.push(RawRow { line, cells });
    }

    Ok(RawTable { headers, rows })
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, `df.to_json(orient='records')`):
///
/// ```json
/// [
///   { "Project Type": "Road", "Status": "Completed", "Year": 2021 },
///   ...
/// ]
/// ```
///
/// Columns are the union of keys over all records.
fn load_json(path: &Path) -> Result<RawTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut headers: Vec<String> = Vec::new();
    let mut objects = Vec::with_capacity(records.len());
    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;
        for key in obj.keys() {
            if !headers.contains(key) {
                headers.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let rows = objects
        .into_iter()
        .enumerate()
        .map(|(i, obj)| {
            let cells = headers
                .iter()
                .map(|h| obj.get(h).map_or(CellValue::Null, json_to_cell))
                .collect();
            RawRow::at_index(i, cells)
        })
        .collect();

    Ok(RawTable { headers, rows })
}

fn json_to_cell(val: &JsonValue) -> CellValue {
    match val {
        JsonValue::String(s) if s.trim().is_empty() => CellValue::Null,
        JsonValue::String(s) => CellValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                CellValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                CellValue::Float(f)
            } else {
                CellValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => CellValue::Bool(*b),
        JsonValue::Null => CellValue::Null,
        other => CellValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file of flat scalar columns, one project per row.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`).
fn load_parquet(path: &Path) -> Result<RawTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let headers: Vec<String> = builder
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().clone())
        .collect();
    let reader = builder.build().context("building parquet reader")?;

    let mut rows = Vec::new();
    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let columns = batch
            .columns()
            .iter()
            .zip(&headers)
            .map(|(col, name)| normalise_column(name, col))
            .collect::<Result<Vec<_>>>()?;
        for row in 0..batch.num_rows() {
            let cells = columns.iter().map(|col| col.cell(row)).collect();
            rows.push(RawRow::at_index(rows.len(), cells));
        }
    }

    Ok(RawTable { headers, rows })
}

/// An Arrow column cast to one of the few types cells are read from.
struct ArrowColumn {
    array: ArrayRef,
    /// Temporal source column, rendered as ISO text.
    dates: bool,
}

/// Target type for a source column: integers widen to Int64, floats and
/// decimals to Float64, strings (plain, large, view, dictionary) to Utf8.
fn normalised_type(data_type: &DataType) -> Option<(DataType, bool)> {
    use DataType::*;
    let target = match data_type {
        Null => (Null, false),
        Boolean => (Boolean, false),
        Int8 | Int16 | Int32 | Int64 | UInt8 | UInt16 | UInt32 | UInt64 => (Int64, false),
        Float16 | Float32 | Float64 | Decimal128(..) | Decimal256(..) => (Float64, false),
        Utf8 | LargeUtf8 | Utf8View => (Utf8, false),
        Date32 | Date64 | Timestamp(..) => (Utf8, true),
        Dictionary(_, values) => return normalised_type(values),
        _ => return None,
    };
    Some(target)
}

fn normalise_column(name: &str, col: &ArrayRef) -> Result<ArrowColumn> {
    let source = col.data_type();
    let Some((target, dates)) = normalised_type(source) else {
        bail!("column '{name}' has unsupported type {source}");
    };
    let array = if *source == target {
        Arc::clone(col)
    } else {
        // Unsafe mode: an overflowing value is an error, not a silent null.
        let options = CastOptions {
            safe: false,
            ..Default::default()
        };
        cast_with_options(col, &target, &options)
            .with_context(|| format!("converting column '{name}' from {source} to {target}"))?
    };
    Ok(ArrowColumn { array, dates })
}

impl ArrowColumn {
    fn cell(&self, row: usize) -> CellValue {
        let col = &self.array;
        if col.is_null(row) {
            return CellValue::Null;
        }
        match col.data_type() {
            DataType::Utf8 => {
                let text = col.as_string::<i32>().value(row).to_string();
                if self.dates {
                    CellValue::Date(text)
                } else {
                    CellValue::String(text)
                }
            }
            DataType::Int64 => CellValue::Integer(col.as_primitive::<Int64Type>().value(row)),
            DataType::Float64 => CellValue::Float(col.as_primitive::<Float64Type>().value(row)),
            DataType::Boolean => CellValue::Bool(col.as_boolean().value(row)),
            // `Null` columns carry no validity buffer, so `is_null` misses them.
            _ => CellValue::Null,
        }
    }
}
