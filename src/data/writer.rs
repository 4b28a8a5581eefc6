use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

use crate::contour::Contour;

use super::model::LevelRow;

// ---------------------------------------------------------------------------
// Row construction
// ---------------------------------------------------------------------------

/// Flatten a contour into long-format rows, frequency-major in query order.
pub fn contour_rows(contour: &Contour) -> Vec<LevelRow> {
    let (rows, cols) = contour.spl.shape();
    let mut out = Vec::with_capacity(rows * cols);
    for r in 0..rows {
        for c in 0..cols {
            out.push(LevelRow {
                name: None,
                frequency_hz: contour.frequencies.get(r, c).unwrap_or(f64::NAN),
                phon: contour.phons[c],
                spl_db: contour.spl.get(r, c).unwrap_or(f64::NAN),
                volume: None,
            });
        }
    }
    out
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Write rows to a file.  Dispatch by extension: `.csv`, `.json` or `.parquet`.
pub fn write_file(path: &Path, rows: &[LevelRow]) -> Result<()> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "parquet" | "pq" => write_parquet(path, rows),
        "json" => write_json(path, rows),
        "csv" => write_csv(path, rows),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("writing {}", path.display()))?;

    log::info!("wrote {} rows to {}", rows.len(), path.display());
    Ok(())
}

fn write_csv(path: &Path, rows: &[LevelRow]) -> Result<()> {
    let file = File::create(path).context("creating CSV file")?;
    write_csv_to(file, rows)
}

/// Write CSV with a header row; missing names and volumes are empty fields.
pub fn write_csv_to<W: Write>(out: W, rows: &[LevelRow]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    for row in rows {
        writer.serialize(row).context("serializing CSV row")?;
    }
    writer.flush().context("flushing CSV")?;
    Ok(())
}

fn write_json(path: &Path, rows: &[LevelRow]) -> Result<()> {
    let file = File::create(path).context("creating JSON file")?;
    let mut out = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut out, rows).context("serializing JSON")?;
    out.flush().context("flushing JSON")?;
    Ok(())
}

fn write_parquet(path: &Path, rows: &[LevelRow]) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, true),
        Field::new("frequency_hz", DataType::Float64, false),
        Field::new("phon", DataType::Float64, false),
        Field::new("spl_db", DataType::Float64, false),
        Field::new("volume", DataType::Float64, true),
    ]));

    let columns: Vec<ArrayRef> = vec![
        Arc::new(StringArray::from(
            rows.iter().map(|r| r.name.as_deref()).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            rows.iter().map(|r| r.frequency_hz).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            rows.iter().map(|r| r.phon).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            rows.iter().map(|r| r.spl_db).collect::<Vec<_>>(),
        )),
        Arc::new(Float64Array::from(
            rows.iter().map(|r| r.volume).collect::<Vec<_>>(),
        )),
    ];

    let batch = RecordBatch::try_new(schema.clone(), columns).context("building record batch")?;

    let file = File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing record batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}
