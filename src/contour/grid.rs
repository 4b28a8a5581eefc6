use serde::Serialize;

// ---------------------------------------------------------------------------
// Grid – row-major frequency × phon matrix
// ---------------------------------------------------------------------------

/// A dense row-major matrix.  Contours use one row per frequency and one column per phon level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Grid {
    /// Fill each cell from its `(row, col)` position.
    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Self { rows, cols, data }
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.data.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> Option<&[f64]> {
        (row < self.rows).then(|| &self.data[row * self.cols..(row + 1) * self.cols])
    }

    /// Copy of one column (a single contour when the grid holds SPL values).
    pub fn column(&self, col: usize) -> Option<Vec<f64>> {
        (col < self.cols).then(|| {
            (0..self.rows)
                .map(|r| self.data[r * self.cols + col])
                .collect()
        })
    }

    /// Row-major cell values.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Apply `f` to every cell, keeping the shape.
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter().map(|&v| f(v)).collect(),
        }
    }

    /// Drop singleton axes.
    pub fn squeeze(&self) -> Squeezed {
        match (self.rows, self.cols) {
            (1, 1) => Squeezed::Scalar(self.data[0]),
            (1, _) | (_, 1) => Squeezed::Vector(self.data.clone()),
            _ => Squeezed::Matrix(self.clone()),
        }
    }
}

/// A grid with its singleton axes removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Squeezed {
    Scalar(f64),
    Vector(Vec<f64>),
    Matrix(Grid),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_layout() {
        let g = Grid::from_fn(2, 3, |r, c| (r * 10 + c) as f64);
        assert_eq!(g.shape(), (2, 3));
        assert_eq!(g.as_slice(), &[0.0, 1.0, 2.0, 10.0, 11.0, 12.0]);
        assert_eq!(g.row(1), Some(&[10.0, 11.0, 12.0][..]));
        assert_eq!(g.column(2), Some(vec![2.0, 12.0]));
        assert_eq!(g.get(2, 0), None);
        assert_eq!(g.column(3), None);
    }

    #[test]
    fn squeeze_drops_singleton_axes() {
        assert_eq!(Grid::from_fn(1, 1, |_, _| 4.0).squeeze(), Squeezed::Scalar(4.0));
        assert_eq!(
            Grid::from_fn(3, 1, |r, _| r as f64).squeeze(),
            Squeezed::Vector(vec![0.0, 1.0, 2.0])
        );
        assert_eq!(
            Grid::from_fn(1, 2, |_, c| c as f64).squeeze(),
            Squeezed::Vector(vec![0.0, 1.0])
        );
        assert!(matches!(
            Grid::from_fn(2, 2, |_, _| 0.0).squeeze(),
            Squeezed::Matrix(_)
        ));
    }
}
