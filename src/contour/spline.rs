use crate::error::{ContourError, Result};

use super::table::{Coefficients, Column, ReferenceTable, MIN_ROWS};

// ---------------------------------------------------------------------------
// CubicSpline
// ---------------------------------------------------------------------------

/// One cubic piece `y + b·t + c·t² + d·t³` with `t = x - knot`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Piece {
    knot: f64,
    y: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl Piece {
    fn eval(&self, x: f64) -> f64 {
        let t = x - self.knot;
        self.y + t * (self.b + t * (self.c + t * self.d))
    }
}

/// Interpolating cubic spline with not-a-knot end conditions.
///
/// The third derivative is continuous across the second and the penultimate knot, so the first
/// two and the last two intervals each share a single cubic.  Outside the knot range the first or
/// last piece is extended, which gives continuous extrapolation in both directions.
#[derive(Debug, Clone, PartialEq)]
pub struct CubicSpline {
    pieces: Vec<Piece>,
}

impl CubicSpline {
    /// Fit a spline through `(x[i], y[i])`; `x` must be strictly increasing.
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
        let n = x.len();
        if y.len() != n {
            return Err(ContourError::InvalidTable(format!(
                "{n} knots but {} values",
                y.len()
            )));
        }
        if n < MIN_ROWS {
            return Err(ContourError::TooFewKnots { count: n });
        }

        let h: Vec<f64> = x.windows(2).map(|w| w[1] - w[0]).collect();
        if let Some(i) = h.iter().position(|&hi| !(hi > 0.0)) {
            return Err(ContourError::InvalidTable(format!(
                "knots not strictly increasing at {}: {} -> {}",
                i + 1,
                x[i],
                x[i + 1]
            )));
        }
        let slope: Vec<f64> = (0..n - 1).map(|i| (y[i + 1] - y[i]) / h[i]).collect();

        // Linear system in the second derivatives M_0..M_{n-1}.
        let mut a = vec![vec![0.0; n]; n];
        let mut rhs = vec![0.0; n];

        a[0][0] = h[1];
        a[0][1] = -(h[0] + h[1]);
        a[0][2] = h[0];

        for i in 1..n - 1 {
            a[i][i - 1] = h[i - 1];
            a[i][i] = 2.0 * (h[i - 1] + h[i]);
            a[i][i + 1] = h[i];
            rhs[i] = 6.0 * (slope[i] - slope[i - 1]);
        }

        a[n - 1][n - 3] = h[n - 2];
        a[n - 1][n - 2] = -(h[n - 3] + h[n - 2]);
        a[n - 1][n - 1] = h[n - 3];

        let m = solve_dense(a, rhs)?;

        let pieces = (0..n - 1)
            .map(|i| Piece {
                knot: x[i],
                y: y[i],
                b: slope[i] - h[i] * (2.0 * m[i] + m[i + 1]) / 6.0,
                c: m[i] / 2.0,
                d: (m[i + 1] - m[i]) / (6.0 * h[i]),
            })
            .collect();

        Ok(Self { pieces })
    }

    /// Evaluate at `x`, extrapolating with the end pieces outside the knot range.
    pub fn eval(&self, x: f64) -> f64 {
        // Number of piece origins at or below x, minus one, clamped to a valid piece.
        let idx = self.pieces.partition_point(|p| p.knot <= x);
        let piece = &self.pieces[idx.saturating_sub(1)];
        piece.eval(x)
    }
}

/// Gaussian elimination with partial pivoting.  The systems here are at most a few dozen rows.
fn solve_dense(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() < f64::EPSILON {
            return Err(ContourError::InvalidTable(
                "singular spline system".to_string(),
            ));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        for row in col + 1..n {
            let factor = a[row][col] / a[col][col];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[row][k] -= factor * a[col][k];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

// ---------------------------------------------------------------------------
// CoefficientSplines – the same fit applied to each column
// ---------------------------------------------------------------------------

/// One spline per coefficient column of a table.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientSplines {
    alpha: CubicSpline,
    transfer: CubicSpline,
    threshold: CubicSpline,
}

impl CoefficientSplines {
    pub fn fit(table: &ReferenceTable) -> Result<Self> {
        let [alpha, transfer, threshold] = Column::ALL
            .map(|column| CubicSpline::fit(table.frequencies(), table.column(column)));
        log::debug!(
            "fitted coefficient splines over {} knots ({} to {} Hz)",
            table.len(),
            table.frequencies()[0],
            table.max_frequency()
        );
        Ok(Self {
            alpha: alpha?,
            transfer: transfer?,
            threshold: threshold?,
        })
    }

    /// Interpolated (or extrapolated) coefficients at `frequency`.
    pub fn at(&self, frequency: f64) -> Coefficients {
        Coefficients {
            alpha: self.alpha.eval(frequency),
            transfer: self.transfer.eval(frequency),
            threshold: self.threshold.eval(frequency),
        }
    }
}
