use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde::Serialize;

use crate::error::{ContourError, Result};

use super::grid::{Grid, Squeezed};
use super::spline::CoefficientSplines;
use super::table::{Coefficients, Edition, ReferenceTable};
use super::warning::{self, AccuracyWarning, TABLE_TOP_HZ};

// ---------------------------------------------------------------------------
// Request / result types
// ---------------------------------------------------------------------------

/// What to evaluate: phon levels, optional query frequencies and the mirror row for the
/// 20 kHz extrapolation anchor.
#[derive(Debug, Clone, PartialEq)]
pub struct ContourRequest {
    pub phons: Vec<f64>,
    /// `None` evaluates at the table's own frequencies without interpolation.
    pub frequencies: Option<Vec<f64>>,
    pub mirror_index: usize,
}

impl ContourRequest {
    /// Request at the table frequencies with the default mirror row.
    pub fn new(phons: impl Into<Vec<f64>>) -> Self {
        Self {
            phons: phons.into(),
            frequencies: None,
            mirror_index: 0,
        }
    }

    pub fn at_frequencies(mut self, frequencies: impl Into<Vec<f64>>) -> Self {
        self.frequencies = Some(frequencies.into());
        self
    }

    pub fn mirror(mut self, mirror_index: usize) -> Self {
        self.mirror_index = mirror_index;
        self
    }
}

/// SPL values for every (frequency, phon) pair of a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contour {
    /// Phon levels, one per grid column.
    pub phons: Vec<f64>,
    /// Evaluated frequencies in query order, one per grid row.
    pub axis: Vec<f64>,
    /// SPL in dB; rows are frequencies, columns are phon levels.
    pub spl: Grid,
    /// Frequency of each SPL cell, same shape as `spl`.
    pub frequencies: Grid,
    /// Advisory accuracy conditions met by the request.
    pub warnings: Vec<AccuracyWarning>,
}

impl Contour {
    /// Frequencies in query order (one per row), also when no phon levels were requested.
    pub fn frequency_axis(&self) -> &[f64] {
        &self.axis
    }

    /// SPL and frequency grids with singleton axes removed.
    pub fn squeezed(&self) -> (Squeezed, Squeezed) {
        (self.spl.squeeze(), self.frequencies.squeeze())
    }
}

// ---------------------------------------------------------------------------
// SPL formula
// ---------------------------------------------------------------------------

/// Sound pressure level (dB) at loudness level `phon` for the given coefficients.
///
/// Levels at or below zero return the hearing threshold directly.
pub fn spl_at(phon: f64, c: Coefficients) -> f64 {
    if phon <= 0.0 {
        return c.threshold;
    }
    let a_f = 0.00447 * (10f64.powf(0.025 * phon) - 1.15)
        + (0.4 * 10f64.powf((c.threshold + c.transfer) / 10.0 - 9.0)).powf(c.alpha);
    (10.0 / c.alpha) * a_f.log10() - c.transfer + 94.0
}

// ---------------------------------------------------------------------------
// ContourEngine
// ---------------------------------------------------------------------------

/// Evaluates equal-loudness contours from a [`ReferenceTable`].
///
/// Splines over the base table are fitted once.  Fits over the table extended with a mirror
/// anchor are memoized per mirror row and shared between threads.
#[derive(Debug)]
pub struct ContourEngine {
    table: ReferenceTable,
    base: Arc<CoefficientSplines>,
    extended: Mutex<HashMap<usize, Arc<CoefficientSplines>>>,
}

impl ContourEngine {
    pub fn new(table: ReferenceTable) -> Result<Self> {
        let base = Arc::new(CoefficientSplines::fit(&table)?);
        Ok(Self {
            table,
            base,
            extended: Mutex::new(HashMap::new()),
        })
    }

    /// Engine over a published edition of the standard.
    pub fn for_edition(edition: Edition) -> Result<Self> {
        Self::new(ReferenceTable::edition(edition))
    }

    pub fn table(&self) -> &ReferenceTable {
        &self.table
    }

    /// Evaluate SPL for every requested (frequency, phon) pair.
    ///
    /// Fails before computing anything if a frequency is negative or NaN, or the mirror index
    /// is not a table row.
    pub fn evaluate(&self, request: &ContourRequest) -> Result<Contour> {
        if request.mirror_index >= self.table.len() {
            return Err(ContourError::MirrorIndexOutOfRange {
                index: request.mirror_index,
                len: self.table.len(),
            });
        }
        if let Some(freqs) = &request.frequencies {
            if let Some((index, &value)) = freqs.iter().enumerate().find(|(_, f)| !(**f >= 0.0)) {
                return Err(ContourError::InvalidFrequency { index, value });
            }
        }

        let warnings = warning::check(&request.phons, request.frequencies.as_deref());

        let (axis, coefficients): (Vec<f64>, Vec<Coefficients>) = match &request.frequencies {
            None => self.table.rows().unzip(),
            Some(freqs) => {
                let splines = if freqs.iter().any(|&f| f > TABLE_TOP_HZ) {
                    self.extended_splines(request.mirror_index)?
                } else {
                    Arc::clone(&self.base)
                };
                let coefficients = freqs.iter().map(|&f| splines.at(f)).collect();
                (freqs.clone(), coefficients)
            }
        };

        let rows = axis.len();
        let cols = request.phons.len();
        let spl = Grid::from_fn(rows, cols, |r, c| spl_at(request.phons[c], coefficients[r]));
        let frequencies = Grid::from_fn(rows, cols, |r, _| axis[r]);

        Ok(Contour {
            phons: request.phons.clone(),
            axis,
            spl,
            frequencies,
            warnings,
        })
    }

    /// SPL at a single frequency and loudness level, interpolating as needed.
    pub fn spl(&self, phon: f64, frequency: f64) -> Result<f64> {
        let contour = self.evaluate(&ContourRequest::new([phon]).at_frequencies([frequency]))?;
        Ok(contour.spl.get(0, 0).unwrap_or(f64::NAN))
    }

    /// Interpolated coefficients at `frequency`, using the mirror-extended table above 12.5 kHz.
    pub fn coefficients_at(&self, frequency: f64, mirror_index: usize) -> Result<Coefficients> {
        if !(frequency >= 0.0) {
            return Err(ContourError::InvalidFrequency {
                index: 0,
                value: frequency,
            });
        }
        if frequency > TABLE_TOP_HZ {
            Ok(self.extended_splines(mirror_index)?.at(frequency))
        } else {
            Ok(self.base.at(frequency))
        }
    }

    fn extended_splines(&self, mirror_index: usize) -> Result<Arc<CoefficientSplines>> {
        let mut cache = self.extended.lock()?;
        if let Some(splines) = cache.get(&mirror_index) {
            return Ok(Arc::clone(splines));
        }
        let table = self.table.with_mirror_anchor(mirror_index)?;
        log::debug!("extending table with row {mirror_index} mirrored at 20 kHz");
        let splines = Arc::new(CoefficientSplines::fit(&table)?);
        cache.insert(mirror_index, Arc::clone(&splines));
        Ok(splines)
    }
}
