use ndarray::{Array1, Array2, Array3};

use super::sparse::CsrMatrix;

/// Row-stochastic (pair x state) transition operator.
///
/// Every encoding reports the nonzero entries of a row in ascending column order, so
/// that sums accumulated through `row_dot` are bitwise identical across encodings.
pub trait TransitionOperator {
    /// Number of state-action pairs.
    fn num_rows(&self) -> usize;

    /// Number of successor states.
    fn num_cols(&self) -> usize;

    /// Visit the nonzero entries of `row` as `(column, probability)`.
    fn for_each_entry<F: FnMut(usize, f64)>(&self, row: usize, f: F);

    fn row_dot(&self, row: usize, v: &Array1<f64>) -> f64 {
        let mut acc = 0.0;
        self.for_each_entry(row, |c, p| acc += p * v[c]);
        acc
    }

    fn row_sum(&self, row: usize) -> f64 {
        let mut acc = 0.0;
        self.for_each_entry(row, |_, p| acc += p);
        acc
    }
}

/// Dense (pair x state) matrix.
impl TransitionOperator for Array2<f64> {
    fn num_rows(&self) -> usize {
        self.nrows()
    }

    fn num_cols(&self) -> usize {
        self.ncols()
    }

    fn for_each_entry<F: FnMut(usize, f64)>(&self, row: usize, mut f: F) {
        for (c, &p) in self.row(row).iter().enumerate() {
            if p != 0.0 {
                f(c, p);
            }
        }
    }
}

/// Dense (state x action x state) array. Row `i` is the pair `(i / m, i % m)` where `m`
/// is the action count, matching the pair order of the product formulation.
impl TransitionOperator for Array3<f64> {
    fn num_rows(&self) -> usize {
        let (n, m, _) = self.dim();
        n * m
    }

    fn num_cols(&self) -> usize {
        self.dim().2
    }

    fn for_each_entry<F: FnMut(usize, f64)>(&self, row: usize, mut f: F) {
        let m = self.dim().1;
        let lane = self.slice(ndarray::s![row / m, row % m, ..]);
        for (c, &p) in lane.iter().enumerate() {
            if p != 0.0 {
                f(c, p);
            }
        }
    }
}

impl TransitionOperator for CsrMatrix {
    fn num_rows(&self) -> usize {
        self.shape().0
    }

    fn num_cols(&self) -> usize {
        self.shape().1
    }

    fn for_each_entry<F: FnMut(usize, f64)>(&self, row: usize, mut f: F) {
        for (c, p) in self.row(row) {
            if p != 0.0 {
                f(c, p);
            }
        }
    }
}
