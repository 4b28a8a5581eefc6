use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use equal_loudness::config::Settings;
use equal_loudness::contour::{Column, ContourEngine, ContourRequest, Edition, ReferenceTable};
use equal_loudness::data::{loader, writer};
use equal_loudness::session::Session;
use equal_loudness::volume::VolumeMapper;

#[derive(Parser, Debug)]
#[command(name = "equal-loudness", version)]
#[command(about = "ISO 226 equal-loudness contours and calibrated tone volumes.")]
#[command(long_about = None)]
struct Args {
    /// Settings file (JSON); command-line flags take precedence
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate SPL contours for one or more loudness levels
    Contour(ContourArgs),
    /// Compute equal-loudness playback volumes for a tone file
    Volumes(VolumesArgs),
    /// Print the reference table
    Table(TableArgs),
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum EditionChoice {
    /// ISO 226:2003
    Iso2003,
    /// ISO 226:2023
    Iso2023,
}

impl From<EditionChoice> for Edition {
    fn from(choice: EditionChoice) -> Self {
        match choice {
            EditionChoice::Iso2003 => Edition::Iso2003,
            EditionChoice::Iso2023 => Edition::Iso2023,
        }
    }
}

/// Options shared by the evaluating subcommands.
#[derive(clap::Args, Debug)]
struct ModelArgs {
    /// Coefficient table edition
    #[arg(long, value_enum)]
    edition: Option<EditionChoice>,

    /// Table row mirrored at 20 kHz when extrapolating above 12.5 kHz
    #[arg(long, value_name = "ROW")]
    mirror: Option<usize>,
}

impl ModelArgs {
    fn apply(&self, settings: &mut Settings) {
        if let Some(e) = self.edition {
            settings.edition = e.into();
        }
        if let Some(m) = self.mirror {
            settings.mirror_index = m;
        }
    }
}

#[derive(clap::Args, Debug)]
struct ContourArgs {
    /// Loudness levels in phon
    #[arg(short, long = "phon", num_args = 1.., allow_negative_numbers = true)]
    phons: Vec<f64>,

    /// Query frequencies in Hz
    #[arg(short, long = "freq", num_args = 1.., allow_negative_numbers = true)]
    frequencies: Vec<f64>,

    /// Linear frequency sweep START:STOP:COUNT
    #[arg(long, value_parser = parse_sweep, conflicts_with = "frequencies")]
    sweep: Option<Sweep>,

    /// Evaluate at the table's own frequencies without interpolation
    #[arg(long, conflicts_with_all = ["frequencies", "sweep"])]
    table_frequencies: bool,

    #[command(flatten)]
    model: ModelArgs,

    /// Add calibrated playback volumes to the output
    #[arg(long)]
    volumes: bool,

    /// Print the result with singleton axes removed, as JSON
    #[arg(long, conflicts_with = "output")]
    squeeze: bool,

    /// Write rows to a .csv, .json or .parquet file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct VolumesArgs {
    /// Tone file (.csv, .json or .parquet) with a `frequency` column
    tones: PathBuf,

    /// Target loudness level in phon
    #[arg(short, long, allow_negative_numbers = true)]
    phon: Option<f64>,

    #[command(flatten)]
    model: ModelArgs,

    /// Gain measured at the reference level
    #[arg(long)]
    gain: Option<f64>,

    /// SPL (dB) measured at that gain
    #[arg(long)]
    spl_at_gain: Option<f64>,

    /// Reference RMS voltage of the calibration
    #[arg(long)]
    reference_rms: Option<f64>,

    /// Write rows to a .csv, .json or .parquet file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,
}

#[derive(clap::Args, Debug)]
struct TableArgs {
    #[arg(long, value_enum)]
    edition: Option<EditionChoice>,
}

/// Evenly spaced frequencies, endpoints included.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Sweep {
    start: f64,
    stop: f64,
    count: usize,
}

impl Default for Sweep {
    fn default() -> Self {
        Self {
            start: 20.0,
            stop: 20_000.0,
            count: 1000,
        }
    }
}

impl Sweep {
    fn frequencies(&self) -> Vec<f64> {
        match self.count {
            0 => Vec::new(),
            1 => vec![self.start],
            n => {
                let step = (self.stop - self.start) / (n - 1) as f64;
                (0..n).map(|i| self.start + step * i as f64).collect()
            }
        }
    }
}

fn parse_sweep(s: &str) -> std::result::Result<Sweep, String> {
    let parts: Vec<&str> = s.split(':').collect();
    let [start, stop, count] = parts.as_slice() else {
        return Err(format!("expected START:STOP:COUNT, got '{s}'"));
    };
    Ok(Sweep {
        start: start.parse().map_err(|e| format!("start '{start}': {e}"))?,
        stop: stop.parse().map_err(|e| format!("stop '{stop}': {e}"))?,
        count: count.parse().map_err(|e| format!("count '{count}': {e}"))?,
    })
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let settings = Settings::load_or_default(args.config.as_deref())?;

    match args.command {
        Command::Contour(a) => cmd_contour(settings, a),
        Command::Volumes(a) => cmd_volumes(settings, a),
        Command::Table(a) => cmd_table(settings, a),
    }
}

fn cmd_contour(mut settings: Settings, args: ContourArgs) -> Result<()> {
    args.model.apply(&mut settings);
    if args.squeeze {
        settings.squeeze = true;
    }

    let phons = if args.phons.is_empty() {
        vec![settings.phon]
    } else {
        args.phons
    };

    let mut request = ContourRequest::new(phons).mirror(settings.mirror_index);
    if !args.table_frequencies {
        let frequencies = if !args.frequencies.is_empty() {
            args.frequencies
        } else {
            args.sweep.unwrap_or_default().frequencies()
        };
        request = request.at_frequencies(frequencies);
    }

    let engine = ContourEngine::for_edition(settings.edition)?;
    let contour = engine.evaluate(&request)?;
    for w in &contour.warnings {
        log::warn!("{w}");
    }

    let mut rows = writer::contour_rows(&contour);
    if args.volumes {
        let mapper = VolumeMapper::new(settings.calibration);
        for row in &mut rows {
            row.volume = Some(mapper.spl_to_volume(row.spl_db));
        }
    }

    if let Some(path) = &args.output {
        if settings.squeeze {
            log::warn!("squeeze only affects printed output; {} gets full rows", path.display());
        }
        return writer::write_file(path, &rows);
    }

    if settings.squeeze {
        let (spl, frequencies) = contour.squeezed();
        let json = serde_json::json!({ "spl": spl, "frequencies": frequencies });
        println!("{}", serde_json::to_string_pretty(&json)?);
        return Ok(());
    }

    writer::write_csv_to(std::io::stdout().lock(), &rows)
}

fn cmd_volumes(mut settings: Settings, args: VolumesArgs) -> Result<()> {
    args.model.apply(&mut settings);
    if let Some(p) = args.phon {
        settings.phon = p;
    }
    if let Some(g) = args.gain {
        settings.calibration.gain = g;
    }
    if let Some(s) = args.spl_at_gain {
        settings.calibration.spl_at_gain = s;
    }
    if let Some(r) = args.reference_rms {
        settings.calibration.reference_rms = r;
    }

    let tones = loader::load_file(&args.tones)?;
    if tones.is_empty() {
        bail!("{} contains no tones", args.tones.display());
    }

    let mut session = Session::new(&settings)?;
    session.set_tones(tones);
    if let Some(msg) = &session.status_message {
        bail!("{msg}");
    }
    for w in &session.warnings {
        log::warn!("{w}");
    }

    let rows = session.rows();
    match &args.output {
        Some(path) => writer::write_file(path, &rows),
        None => writer::write_csv_to(std::io::stdout().lock(), &rows),
    }
}

fn cmd_table(settings: Settings, args: TableArgs) -> Result<()> {
    let edition = args.edition.map(Edition::from).unwrap_or(settings.edition);
    let table = ReferenceTable::edition(edition);
    print_table(&table, edition).context("printing table")
}

fn print_table(table: &ReferenceTable, edition: Edition) -> Result<()> {
    use std::io::Write;

    let mut out = std::io::stdout().lock();
    writeln!(out, "# {edition}")?;
    writeln!(out, "{:>10} {:>8} {:>8} {:>8}", "f (Hz)", "alpha", "L_U", "T_f")?;
    let columns = Column::ALL.map(|c| table.column(c));
    for (i, f) in table.frequencies().iter().enumerate() {
        writeln!(
            out,
            "{:>10} {:>8.3} {:>8.1} {:>8.1}",
            f, columns[0][i], columns[1][i], columns[2][i]
        )?;
    }
    Ok(())
}
