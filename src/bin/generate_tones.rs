use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;

/// Third-octave band centres from 20 Hz, rounded the way band labels usually are.
fn third_octave_centres(stop: f64) -> Vec<f64> {
    std::iter::successors(Some(20.0_f64), |&f| Some(f * 2f64.powf(1.0 / 3.0)))
        .take_while(|&f| f <= stop)
        .map(round_band)
        .collect()
}

fn round_band(f: f64) -> f64 {
    let digits = f.log10().floor() as i32;
    let scale = 10f64.powi(digits - 1);
    (f / scale).round() * scale
}

fn main() -> Result<()> {
    env_logger::init();

    let output_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "sample_tones.parquet".to_string());

    let centres = third_octave_centres(20_000.0);

    let names: Vec<String> = (0..centres.len()).map(|i| format!("tone_{i}")).collect();
    let files: Vec<String> = names.iter().map(|n| format!("tones/{n}.wav")).collect();
    let bands: Vec<i64> = (0..centres.len() as i64).collect();

    let schema = Arc::new(Schema::new(vec![
        Field::new("name", DataType::Utf8, false),
        Field::new("frequency", DataType::Float64, false),
        Field::new("band", DataType::Int64, false),
        Field::new("file", DataType::Utf8, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(StringArray::from(
                names.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )),
            Arc::new(Float64Array::from(centres.clone())),
            Arc::new(Int64Array::from(bands)),
            Arc::new(StringArray::from(
                files.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            )),
        ],
    )
    .context("creating record batch")?;
    log::debug!("\n{}", pretty_format_batches(std::slice::from_ref(&batch))?);

    let file = std::fs::File::create(&output_path)
        .with_context(|| format!("creating {output_path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing writer")?;

    println!(
        "Wrote {} tones ({} Hz to {} Hz) to {output_path}",
        centres.len(),
        centres.first().copied().unwrap_or_default(),
        centres.last().copied().unwrap_or_default()
    );
    Ok(())
}
