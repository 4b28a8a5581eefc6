use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ContourError, Result};

/// Frequency of the synthetic anchor appended when extrapolating above the table.
pub const MIRROR_ANCHOR_HZ: f64 = 20_000.0;

/// Smallest table a cubic fit accepts.
pub const MIN_ROWS: usize = 4;

// ---------------------------------------------------------------------------
// Published ISO 226 columns
// ---------------------------------------------------------------------------

const FREQ: [f64; 29] = [
    20.0, 25.0, 31.5, 40.0, 50.0, 63.0, 80.0, 100.0, 125.0, 160.0, 200.0, 250.0, 315.0, 400.0,
    500.0, 630.0, 800.0, 1000.0, 1250.0, 1600.0, 2000.0, 2500.0, 3150.0, 4000.0, 5000.0, 6300.0,
    8000.0, 10000.0, 12500.0,
];

const ALPHA_2023: [f64; 29] = [
    0.635, 0.602, 0.569, 0.537, 0.509, 0.482, 0.456, 0.433, 0.412, 0.391, 0.373, 0.357, 0.343,
    0.330, 0.320, 0.311, 0.303, 0.300, 0.295, 0.292, 0.290, 0.290, 0.289, 0.289, 0.289, 0.293,
    0.303, 0.323, 0.354,
];

const LU_2023: [f64; 29] = [
    -31.5, -27.2, -23.1, -19.3, -16.1, -13.1, -10.4, -8.2, -6.3, -4.6, -3.2, -2.1, -1.2, -0.5, 0.0,
    0.4, 0.5, 0.0, -2.7, -4.2, -1.2, 1.4, 2.3, 1.0, -2.3, -7.2, -11.2, -10.9, -3.5,
];

const TF_2023: [f64; 29] = [
    78.1, 68.7, 59.5, 51.1, 44.0, 37.5, 31.5, 26.5, 22.1, 17.9, 14.4, 11.4, 8.6, 6.2, 4.4, 3.0,
    2.2, 2.4, 3.5, 1.7, -1.3, -4.2, -6.0, -5.4, -1.5, 6.0, 12.6, 13.9, 12.3,
];

const ALPHA_2003: [f64; 29] = [
    0.532, 0.506, 0.480, 0.455, 0.432, 0.409, 0.387, 0.367, 0.349, 0.330, 0.315, 0.301, 0.288,
    0.276, 0.267, 0.259, 0.253, 0.250, 0.246, 0.244, 0.243, 0.243, 0.243, 0.242, 0.242, 0.245,
    0.254, 0.271, 0.301,
];

const LU_2003: [f64; 29] = [
    -31.6, -27.2, -23.0, -19.1, -15.9, -13.0, -10.3, -8.1, -6.2, -4.5, -3.1, -2.0, -1.1, -0.4, 0.0,
    0.3, 0.5, 0.0, -2.7, -4.1, -1.0, 1.7, 2.5, 1.2, -2.1, -7.1, -11.2, -10.7, -3.1,
];

const TF_2003: [f64; 29] = [
    78.5, 68.7, 59.5, 51.1, 44.0, 37.5, 31.5, 26.5, 22.1, 17.9, 14.4, 11.4, 8.6, 6.2, 4.4, 3.0,
    2.2, 2.4, 3.5, 1.7, -1.3, -4.2, -6.0, -5.4, -1.5, 6.0, 12.6, 13.9, 12.3,
];

// ---------------------------------------------------------------------------
// Edition
// ---------------------------------------------------------------------------

/// Which revision of the standard supplies the coefficients.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Edition {
    Iso2003,
    #[default]
    Iso2023,
}

impl fmt::Display for Edition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Edition::Iso2003 => write!(f, "ISO 226:2003"),
            Edition::Iso2023 => write!(f, "ISO 226:2023"),
        }
    }
}

// ---------------------------------------------------------------------------
// Coefficients – one row of the table
// ---------------------------------------------------------------------------

/// Model coefficients at a single frequency.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coefficients {
    /// Exponent for loudness perception (`alpha_f`).
    pub alpha: f64,
    /// Magnitude of the linear transfer function normalized at 1 kHz (`L_U`), dB.
    pub transfer: f64,
    /// Threshold of hearing (`T_f`), dB SPL.
    pub threshold: f64,
}

/// Selects one coefficient column of a [`ReferenceTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Alpha,
    Transfer,
    Threshold,
}

impl Column {
    pub const ALL: [Column; 3] = [Column::Alpha, Column::Transfer, Column::Threshold];
}

// ---------------------------------------------------------------------------
// ReferenceTable
// ---------------------------------------------------------------------------

/// Standard frequencies with their model coefficients, frequencies strictly increasing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceTable {
    frequencies: Vec<f64>,
    alpha: Vec<f64>,
    transfer: Vec<f64>,
    threshold: Vec<f64>,
}

impl ReferenceTable {
    /// Build a table from its columns, checking the invariants.
    pub fn new(
        frequencies: Vec<f64>,
        alpha: Vec<f64>,
        transfer: Vec<f64>,
        threshold: Vec<f64>,
    ) -> Result<Self> {
        let n = frequencies.len();
        if alpha.len() != n || transfer.len() != n || threshold.len() != n {
            return Err(ContourError::InvalidTable(format!(
                "column lengths differ: f={n}, alpha={}, L_U={}, T_f={}",
                alpha.len(),
                transfer.len(),
                threshold.len()
            )));
        }
        if n < MIN_ROWS {
            return Err(ContourError::TooFewKnots { count: n });
        }
        if let Some(i) = frequencies.windows(2).position(|w| !(w[0] < w[1])) {
            return Err(ContourError::InvalidTable(format!(
                "frequencies not strictly increasing at row {}: {} -> {}",
                i + 1,
                frequencies[i],
                frequencies[i + 1]
            )));
        }
        if !(frequencies[0] >= 0.0) || !(frequencies[n - 1] < MIRROR_ANCHOR_HZ) {
            return Err(ContourError::InvalidTable(format!(
                "frequencies must lie in [0, {MIRROR_ANCHOR_HZ}) Hz"
            )));
        }
        for (label, values) in [("alpha", &alpha), ("L_U", &transfer), ("T_f", &threshold)] {
            if let Some(row) = values.iter().position(|v| !v.is_finite()) {
                return Err(ContourError::InvalidTable(format!(
                    "{label} at row {row} is not finite: {}",
                    values[row]
                )));
            }
        }
        Ok(Self {
            frequencies,
            alpha,
            transfer,
            threshold,
        })
    }

    /// The published table for an edition.
    pub fn edition(edition: Edition) -> Self {
        let (alpha, transfer, threshold) = match edition {
            Edition::Iso2003 => (&ALPHA_2003, &LU_2003, &TF_2003),
            Edition::Iso2023 => (&ALPHA_2023, &LU_2023, &TF_2023),
        };
        Self {
            frequencies: FREQ.to_vec(),
            alpha: alpha.to_vec(),
            transfer: transfer.to_vec(),
            threshold: threshold.to_vec(),
        }
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.frequencies.len()
    }

    /// Whether the table has no rows (never true for a validated table).
    pub fn is_empty(&self) -> bool {
        self.frequencies.is_empty()
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn column(&self, column: Column) -> &[f64] {
        match column {
            Column::Alpha => &self.alpha,
            Column::Transfer => &self.transfer,
            Column::Threshold => &self.threshold,
        }
    }

    /// Coefficients of row `index`, if it exists.
    pub fn row(&self, index: usize) -> Option<Coefficients> {
        Some(Coefficients {
            alpha: *self.alpha.get(index)?,
            transfer: *self.transfer.get(index)?,
            threshold: *self.threshold.get(index)?,
        })
    }

    /// Iterate `(frequency, coefficients)` rows in order.
    pub fn rows(&self) -> impl Iterator<Item = (f64, Coefficients)> + '_ {
        (0..self.len()).filter_map(move |i| Some((self.frequencies[i], self.row(i)?)))
    }

    /// Highest tabulated frequency.
    pub fn max_frequency(&self) -> f64 {
        self.frequencies.last().copied().unwrap_or(0.0)
    }

    /// Copy of the table with a synthetic row at [`MIRROR_ANCHOR_HZ`] reusing row `mirror`.
    ///
    /// This is a shape heuristic for extrapolating past the top of the table, not a physical
    /// model of hearing above 12.5 kHz.
    pub fn with_mirror_anchor(&self, mirror: usize) -> Result<Self> {
        let row = self.row(mirror).ok_or(ContourError::MirrorIndexOutOfRange {
            index: mirror,
            len: self.len(),
        })?;

        let mut extended = self.clone();
        extended.frequencies.push(MIRROR_ANCHOR_HZ);
        extended.alpha.push(row.alpha);
        extended.transfer.push(row.transfer);
        extended.threshold.push(row.threshold);
        Ok(extended)
    }
}

impl Default for ReferenceTable {
    fn default() -> Self {
        Self::edition(Edition::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_tables_hold_invariants() {
        for edition in [Edition::Iso2003, Edition::Iso2023] {
            let t = ReferenceTable::edition(edition);
            let rebuilt = ReferenceTable::new(
                t.frequencies().to_vec(),
                t.column(Column::Alpha).to_vec(),
                t.column(Column::Transfer).to_vec(),
                t.column(Column::Threshold).to_vec(),
            )
            .unwrap();
            assert_eq!(rebuilt, t);
            assert_eq!(t.len(), 29);
            assert_eq!(t.frequencies()[0], 20.0);
            assert_eq!(t.max_frequency(), 12_500.0);
        }
    }

    #[test]
    fn editions_differ_where_the_standard_changed() {
        let old = ReferenceTable::edition(Edition::Iso2003);
        let new = ReferenceTable::edition(Edition::Iso2023);
        assert_eq!(old.row(0).unwrap().threshold, 78.5);
        assert_eq!(new.row(0).unwrap().threshold, 78.1);
        assert_eq!(new.row(17).unwrap().alpha, 0.300);
    }

    #[test]
    fn rejects_unsorted_frequencies() {
        let err = ReferenceTable::new(
            vec![20.0, 40.0, 30.0, 50.0],
            vec![0.5; 4],
            vec![0.0; 4],
            vec![10.0; 4],
        )
        .unwrap_err();
        assert!(matches!(err, ContourError::InvalidTable(_)));
    }

    #[test]
    fn rejects_mismatched_columns_and_short_tables() {
        assert!(matches!(
            ReferenceTable::new(vec![1.0, 2.0, 3.0, 4.0], vec![0.5; 3], vec![0.0; 4], vec![0.0; 4]),
            Err(ContourError::InvalidTable(_))
        ));
        assert!(matches!(
            ReferenceTable::new(vec![1.0, 2.0, 3.0], vec![0.5; 3], vec![0.0; 3], vec![0.0; 3]),
            Err(ContourError::TooFewKnots { count: 3 })
        ));
    }

    #[test]
    fn rejects_non_finite_coefficients() {
        let freqs = vec![20.0, 40.0, 80.0, 160.0];
        let mut threshold = vec![10.0; 4];
        threshold[2] = f64::NAN;
        let err = ReferenceTable::new(freqs.clone(), vec![0.5; 4], vec![0.0; 4], threshold)
            .unwrap_err();
        assert!(matches!(err, ContourError::InvalidTable(ref msg) if msg.contains("T_f at row 2")));

        let alpha = vec![0.5, f64::INFINITY, 0.5, 0.5];
        assert!(matches!(
            ReferenceTable::new(freqs, alpha, vec![0.0; 4], vec![10.0; 4]),
            Err(ContourError::InvalidTable(_))
        ));
    }

    #[test]
    fn mirror_anchor_copies_the_chosen_row() {
        let t = ReferenceTable::default();
        let ext = t.with_mirror_anchor(0).unwrap();
        assert_eq!(ext.len(), 30);
        assert_eq!(ext.max_frequency(), MIRROR_ANCHOR_HZ);
        assert_eq!(ext.row(29), t.row(0));

        let err = t.with_mirror_anchor(29).unwrap_err();
        assert_eq!(err, ContourError::MirrorIndexOutOfRange { index: 29, len: 29 });
    }
}
