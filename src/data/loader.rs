use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{MetadataValue, Tone, ToneSet};

const NAME: &str = "name";
const FREQUENCY: &str = "frequency";

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a tone set from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – numeric `frequency` column, optional `name` string column
/// * `.json`    – `[{ "name": "tone_0", "frequency": 125.0, ...meta }, ...]`
/// * `.csv`     – header row with `frequency` and optional `name`
///
/// Any other column is kept as tone metadata.  Tones without a name are called `tone_<row>`.
pub fn load_file(path: &Path) -> Result<ToneSet> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let tones = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading tones from {}", path.display()))?;

    log::info!("loaded {} tones from {}", tones.len(), path.display());
    Ok(tones)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

fn load_json(path: &Path) -> Result<ToneSet> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

/// Parse records-oriented JSON (`df.to_json(orient='records')`).
pub fn parse_json(text: &str) -> Result<ToneSet> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut tones = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let frequency = obj
            .get(FREQUENCY)
            .and_then(JsonValue::as_f64)
            .with_context(|| format!("Row {i}: missing or non-numeric '{FREQUENCY}'"))?;

        let name = match obj.get(NAME) {
            Some(JsonValue::String(s)) => s.clone(),
            Some(JsonValue::Null) | None => Tone::default_name(i),
            Some(other) => other.to_string(),
        };

        let metadata = obj
            .iter()
            .filter(|(key, _)| key.as_str() != NAME && key.as_str() != FREQUENCY)
            .map(|(key, val)| (key.clone(), json_to_metadata(val)))
            .collect();

        tones.push(Tone {
            name,
            frequency,
            metadata,
        });
    }

    Ok(ToneSet::from_tones(tones))
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

fn load_csv(path: &Path) -> Result<ToneSet> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<ToneSet> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let freq_idx = headers
        .iter()
        .position(|h| h == FREQUENCY)
        .with_context(|| format!("CSV missing '{FREQUENCY}' column"))?;
    let name_idx = headers.iter().position(|h| h == NAME);

    let mut tones = Vec::new();

    for (row_no, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;

        let raw = record.get(freq_idx).unwrap_or("").trim();
        let frequency = raw
            .parse::<f64>()
            .with_context(|| format!("Row {row_no}, {FREQUENCY}: '{raw}' is not a number"))?;

        let name = name_idx
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| Tone::default_name(row_no));

        let mut metadata = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            if col_idx == freq_idx || Some(col_idx) == name_idx {
                continue;
            }
            if let Some(col_name) = headers.get(col_idx) {
                metadata.insert(col_name.clone(), guess_metadata_type(value.trim()));
            }
        }

        tones.push(Tone {
            name,
            frequency,
            metadata,
        });
    }

    Ok(ToneSet::from_tones(tones))
}

fn guess_metadata_type(s: &str) -> MetadataValue {
    if s.is_empty() {
        return MetadataValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return MetadataValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return MetadataValue::Float(f);
    }
    if s == "true" || s == "false" {
        return MetadataValue::Bool(s == "true");
    }
    MetadataValue::String(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing a tone set.
///
/// Expected schema:
/// - `frequency`: Float64, Float32, Int64 or Int32
/// - `name`: Utf8 / LargeUtf8 (optional)
/// - Any other columns are treated as metadata (strings, ints, floats, bools)
fn load_parquet(path: &Path) -> Result<ToneSet> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut tones = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let freq_idx = schema
            .index_of(FREQUENCY)
            .map_err(|_| anyhow::anyhow!("Parquet file missing '{FREQUENCY}' column"))?;
        let name_idx = schema.index_of(NAME).ok();

        let freq_col = batch.column(freq_idx);
        let meta_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != freq_idx && Some(*i) != name_idx)
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            // Row numbers keep counting across batches.
            let tone_no = tones.len();
            let frequency = extract_f64(freq_col, row)
                .with_context(|| format!("Row {tone_no}: failed to read '{FREQUENCY}'"))?;

            let name = name_idx
                .and_then(|i| extract_string(batch.column(i), row))
                .unwrap_or_else(|| Tone::default_name(tone_no));

            let metadata = meta_cols
                .iter()
                .map(|(col_idx, col_name)| {
                    (
                        col_name.clone(),
                        extract_metadata_value(batch.column(*col_idx), row),
                    )
                })
                .collect();

            tones.push(Tone {
                name,
                frequency,
                metadata,
            });
        }
    }

    Ok(ToneSet::from_tones(tones))
}

// -- Parquet / Arrow helpers --

fn extract_f64(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null value in numeric column");
    }
    let any = col.as_any();
    if let Some(a) = any.downcast_ref::<Float64Array>() {
        Ok(a.value(row))
    } else if let Some(a) = any.downcast_ref::<Float32Array>() {
        Ok(a.value(row) as f64)
    } else if let Some(a) = any.downcast_ref::<Int64Array>() {
        Ok(a.value(row) as f64)
    } else if let Some(a) = any.downcast_ref::<Int32Array>() {
        Ok(a.value(row) as f64)
    } else {
        bail!("expected a numeric column, got {:?}", col.data_type())
    }
}

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Option<String> {
    if col.is_null(row) {
        return None;
    }
    match col.data_type() {
        DataType::Utf8 => Some(col.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => Some(col.as_string::<i64>().value(row).to_string()),
        _ => None,
    }
}

/// Extract a single metadata value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    let any = col.as_any();
    if let Some(s) = any.downcast_ref::<StringArray>() {
        MetadataValue::String(s.value(row).to_string())
    } else if let Some(s) = any.downcast_ref::<LargeStringArray>() {
        MetadataValue::String(s.value(row).to_string())
    } else if let Some(a) = any.downcast_ref::<Int32Array>() {
        MetadataValue::Integer(a.value(row) as i64)
    } else if let Some(a) = any.downcast_ref::<Int64Array>() {
        MetadataValue::Integer(a.value(row))
    } else if let Some(a) = any.downcast_ref::<Float32Array>() {
        MetadataValue::Float(a.value(row) as f64)
    } else if let Some(a) = any.downcast_ref::<Float64Array>() {
        MetadataValue::Float(a.value(row))
    } else if let Some(a) = any.downcast_ref::<BooleanArray>() {
        MetadataValue::Bool(a.value(row))
    } else {
        MetadataValue::String(format!("{:?}", col.data_type()))
    }
}
