use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use arrow::array::{Array, ArrayRef, AsArray};
use arrow::datatypes::{Float32Type, Float64Type, Int32Type, Int64Type};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{ColorRow, MeasurementCollection, Metadata, SpectralDistribution, TestColors};
use crate::colorimetry::Cie1931;

/// Column holding the wavelength axis of each spectrum.
pub const WAVELENGTH_COLUMN: &str = "wavelength";
/// Column holding the spectral values.
pub const VALUE_COLUMN: &str = "value";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A scalar cell next to a spectrum.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl FieldValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Float(v) => Some(*v),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }
}

/// One spectrum read from a table, with the rest of its row.
#[derive(Debug, Clone)]
pub struct SpectrumRecord {
    pub wavelengths: Vec<f64>,
    pub values: Vec<f64>,
    pub fields: BTreeMap<String, FieldValue>,
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Load spectra from a table. Dispatch by extension.
///
/// * `.parquet` / `.pq` – `wavelength` and `value` list columns
/// * `.json`            – `[{ "wavelength": [...], "value": [...], ... }, ...]`
/// * `.csv`             – `wavelength` / `value` as semicolon-separated floats
pub fn load_spectra(path: &Path) -> Result<Vec<SpectrumRecord>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let records = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path)?,
        "json" => load_json(path)?,
        "csv" => load_csv(path)?,
        other => bail!("Unsupported file extension: .{other}"),
    };
    log::debug!("read {} spectra from {}", records.len(), path.display());
    Ok(records)
}

/// How table columns map onto a collection.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Scalar columns forming each test colour, in channel order. Empty
    /// means no test colours.
    pub color_columns: Vec<String>,
    /// Integer column with the presentation order; row index when absent.
    pub order_column: String,
    /// Numeric column with the exposure time; 1.0 when absent.
    pub exposure_column: String,
    pub spectrometer_id: String,
    pub metadata: Metadata,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            color_columns: vec!["r".into(), "g".into(), "b".into()],
            order_column: "order".into(),
            exposure_column: "exposure".into(),
            spectrometer_id: String::new(),
            metadata: Metadata::default(),
        }
    }
}

/// Turn table rows into a collection, computing derived quantities.
pub fn build_collection(
    records: Vec<SpectrumRecord>,
    options: &ImportOptions,
) -> Result<MeasurementCollection> {
    let observer = Cie1931::default();
    let has_order = records
        .iter()
        .any(|r| r.fields.contains_key(&options.order_column));

    let mut rows = Vec::new();
    let mut order = Vec::with_capacity(records.len());
    let mut measurements = Vec::with_capacity(records.len());

    for (i, rec) in records.into_iter().enumerate() {
        if !options.color_columns.is_empty() {
            let row = color_row(&rec, &options.color_columns).with_context(|| format!("Row {i}"))?;
            rows.push(row);
        }

        if has_order {
            match rec.fields.get(&options.order_column) {
                Some(FieldValue::Integer(n)) => order.push(*n),
                other => bail!("Row {i}: '{}' is not an integer: {other:?}", options.order_column),
            }
        } else {
            order.push(i as i64);
        }

        let exposure = rec
            .fields
            .get(&options.exposure_column)
            .and_then(FieldValue::as_f64)
            .unwrap_or(1.0);

        let spd = SpectralDistribution::new(rec.wavelengths, rec.values);
        measurements.push(observer.measure(spd, exposure, options.spectrometer_id.clone()));
    }

    Ok(MeasurementCollection::new(
        TestColors::from_rows(rows),
        order,
        measurements,
        options.metadata.clone(),
    ))
}

/// Integer row when every channel is an integer cell, float row otherwise.
fn color_row(rec: &SpectrumRecord, columns: &[String]) -> Result<ColorRow> {
    let cells = columns
        .iter()
        .map(|col| {
            rec.fields
                .get(col)
                .with_context(|| format!("missing colour column '{col}'"))
        })
        .collect::<Result<Vec<_>>>()?;

    if cells.iter().all(|c| matches!(c, FieldValue::Integer(_))) {
        let ints = cells
            .iter()
            .filter_map(|c| match c {
                FieldValue::Integer(n) => Some(*n),
                _ => None,
            })
            .collect();
        return Ok(ColorRow::Int(ints));
    }

    let floats = cells
        .iter()
        .zip(columns)
        .map(|(c, col)| {
            c.as_f64()
                .with_context(|| format!("colour column '{col}' is not numeric: {c:?}"))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(ColorRow::Float(floats))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, as written by `df.to_json(orient='records')`.
fn load_json(path: &Path) -> Result<Vec<SpectrumRecord>> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;
    let rows = root.as_array().context("Expected top-level JSON array")?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let obj = row
                .as_object()
                .with_context(|| format!("Row {i} is not a JSON object"))?;

            let wavelengths = json_floats(obj.get(WAVELENGTH_COLUMN), i, WAVELENGTH_COLUMN)?;
            let values = json_floats(obj.get(VALUE_COLUMN), i, VALUE_COLUMN)?;

            let fields = obj
                .iter()
                .filter(|(key, _)| *key != WAVELENGTH_COLUMN && *key != VALUE_COLUMN)
                .map(|(key, val)| (key.clone(), json_field(val)))
                .collect();

            record(wavelengths, values, fields, i)
        })
        .collect()
}

fn json_floats(val: Option<&JsonValue>, row: usize, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("Row {row}: missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("Row {row}, {col}[{j}]: not a number"))
        })
        .collect()
}

fn json_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::Text(s.clone()),
        JsonValue::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => FieldValue::Integer(i),
            (None, Some(f)) => FieldValue::Float(f),
            _ => FieldValue::Text(n.to_string()),
        },
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<Vec<SpectrumRecord>> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(str::to_string)
        .collect();

    let wl_idx = headers
        .iter()
        .position(|h| h == WAVELENGTH_COLUMN)
        .with_context(|| format!("CSV missing '{WAVELENGTH_COLUMN}' column"))?;
    let val_idx = headers
        .iter()
        .position(|h| h == VALUE_COLUMN)
        .with_context(|| format!("CSV missing '{VALUE_COLUMN}' column"))?;

    let mut records = Vec::new();
    for (row, result) in reader.records().enumerate() {
        let line = result.with_context(|| format!("CSV row {row}"))?;

        let wavelengths = semicolon_floats(line.get(wl_idx).unwrap_or(""), row, WAVELENGTH_COLUMN)?;
        let values = semicolon_floats(line.get(val_idx).unwrap_or(""), row, VALUE_COLUMN)?;

        let fields = line
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != wl_idx && *idx != val_idx)
            .map(|(idx, cell)| (headers[idx].clone(), guess_field(cell)))
            .collect();

        records.push(record(wavelengths, values, fields, row)?);
    }
    Ok(records)
}

fn semicolon_floats(s: &str, row: usize, col: &str) -> Result<Vec<f64>> {
    if s.trim().is_empty() {
        return Ok(Vec::new());
    }
    s.split(';')
        .enumerate()
        .map(|(j, tok)| {
            tok.trim()
                .parse::<f64>()
                .with_context(|| format!("Row {row}, {col}[{j}]: '{tok}' is not a number"))
        })
        .collect()
}

fn guess_field(s: &str) -> FieldValue {
    if s.is_empty() {
        return FieldValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return FieldValue::Float(f);
    }
    match s {
        "true" => FieldValue::Bool(true),
        "false" => FieldValue::Bool(false),
        _ => FieldValue::Text(s.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// `wavelength` / `value` must be List or LargeList of Float64/Float32;
/// every other column is read as a scalar field.
fn load_parquet(path: &Path) -> Result<Vec<SpectrumRecord>> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let reader = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?
        .build()
        .context("building parquet reader")?;

    let mut records = Vec::new();
    for batch in reader {
        let batch = batch.context("reading parquet record batch")?;
        let schema = batch.schema();

        let wl_idx = schema
            .index_of(WAVELENGTH_COLUMN)
            .with_context(|| format!("Parquet file missing '{WAVELENGTH_COLUMN}' column"))?;
        let val_idx = schema
            .index_of(VALUE_COLUMN)
            .with_context(|| format!("Parquet file missing '{VALUE_COLUMN}' column"))?;

        let scalar_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != wl_idx && *i != val_idx)
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let index = records.len();
            let wavelengths = list_at(batch.column(wl_idx), row)
                .with_context(|| format!("Row {index}: failed to read '{WAVELENGTH_COLUMN}'"))?;
            let values = list_at(batch.column(val_idx), row)
                .with_context(|| format!("Row {index}: failed to read '{VALUE_COLUMN}'"))?;

            let fields = scalar_cols
                .iter()
                .map(|(i, name)| (name.clone(), scalar_at(batch.column(*i), row)))
                .collect();

            records.push(record(wavelengths, values, fields, index)?);
        }
    }
    Ok(records)
}

fn list_at(col: &ArrayRef, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let inner = if let Some(list) = col.as_list_opt::<i32>() {
        list.value(row)
    } else if let Some(list) = col.as_list_opt::<i64>() {
        list.value(row)
    } else {
        bail!("Expected List or LargeList column, got {:?}", col.data_type());
    };

    if let Some(arr) = inner.as_primitive_opt::<Float64Type>() {
        Ok(arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(arr) = inner.as_primitive_opt::<Float32Type>() {
        Ok(arr.iter().map(|v| v.map_or(f64::NAN, f64::from)).collect())
    } else {
        bail!("List inner type is {:?}, expected Float64 or Float32", inner.data_type())
    }
}

fn scalar_at(col: &ArrayRef, row: usize) -> FieldValue {
    if col.is_null(row) {
        return FieldValue::Null;
    }
    if let Some(arr) = col.as_string_opt::<i32>() {
        FieldValue::Text(arr.value(row).to_string())
    } else if let Some(arr) = col.as_string_opt::<i64>() {
        FieldValue::Text(arr.value(row).to_string())
    } else if let Some(arr) = col.as_primitive_opt::<Int64Type>() {
        FieldValue::Integer(arr.value(row))
    } else if let Some(arr) = col.as_primitive_opt::<Int32Type>() {
        FieldValue::Integer(i64::from(arr.value(row)))
    } else if let Some(arr) = col.as_primitive_opt::<Float64Type>() {
        FieldValue::Float(arr.value(row))
    } else if let Some(arr) = col.as_primitive_opt::<Float32Type>() {
        FieldValue::Float(f64::from(arr.value(row)))
    } else if let Some(arr) = col.as_boolean_opt() {
        FieldValue::Bool(arr.value(row))
    } else {
        FieldValue::Text(format!("{:?}", col.data_type()))
    }
}

fn record(
    wavelengths: Vec<f64>,
    values: Vec<f64>,
    fields: BTreeMap<String, FieldValue>,
    row: usize,
) -> Result<SpectrumRecord> {
    if wavelengths.len() != values.len() {
        bail!(
            "Row {row}: {} wavelengths but {} values",
            wavelengths.len(),
            values.len()
        );
    }
    Ok(SpectrumRecord {
        wavelengths,
        values,
        fields,
    })
}
