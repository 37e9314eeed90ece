//! Triplet assembly and compressed-row storage for transition operators.
//!
//! Builders push `(row, col, value)` triplets in any order and may repeat a key; the
//! conversion to [`CsrMatrix`] groups triplets by key and sums them. Rows of the
//! resulting matrix hold each column at most once, in ascending column order.

use itertools::Itertools;
use ndarray::Array2;

use crate::error::{Error, Result};

/// Coordinate-format builder, duplicates allowed.
#[derive(Debug, Clone, Default)]
pub struct TripletMatrix {
    rows: usize,
    cols: usize,
    entries: Vec<(usize, usize, f64)>,
}

impl TripletMatrix {
    pub fn new(rows: usize, cols: usize) -> TripletMatrix {
        TripletMatrix {
            rows,
            cols,
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(rows: usize, cols: usize, capacity: usize) -> TripletMatrix {
        TripletMatrix {
            rows,
            cols,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, row: usize, col: usize, value: f64) -> Result<()> {
        if row >= self.rows {
            return Err(Error::DimensionMismatch {
                what: "triplet row index",
                expected: self.rows,
                actual: row,
            });
        }
        if col >= self.cols {
            return Err(Error::DimensionMismatch {
                what: "triplet column index",
                expected: self.cols,
                actual: col,
            });
        }
        self.entries.push((row, col, value));
        Ok(())
    }

    /// Number of pushed triplets, before duplicate merging.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn entries(&self) -> &[(usize, usize, f64)] {
        &self.entries
    }

    /// Merge duplicate keys by summation and compress into row storage.
    pub fn to_csr(&self) -> CsrMatrix {
        let mut entries = self.entries.clone();
        // stable, so duplicates are summed in push order
        entries.sort_by_key(|&(r, c, _)| (r, c));
        let merged: Vec<(usize, usize, f64)> = entries
            .into_iter()
            .coalesce(|a, b| {
                if (a.0, a.1) == (b.0, b.1) {
                    Ok((a.0, a.1, a.2 + b.2))
                } else {
                    Err((a, b))
                }
            })
            .collect();

        let mut indptr: Vec<usize> = vec![0; self.rows + 1];
        for (r, _, _) in merged.iter() {
            indptr[r + 1] += 1;
        }
        for r in 0..self.rows {
            indptr[r + 1] += indptr[r];
        }
        let (indices, data): (Vec<usize>, Vec<f64>) =
            merged.into_iter().map(|(_, c, v)| (c, v)).unzip();
        CsrMatrix {
            rows: self.rows,
            cols: self.cols,
            indptr,
            indices,
            data,
        }
    }
}

/// Compressed sparse row matrix with unique, ascending column indices per row.
#[derive(Debug, Clone, PartialEq)]
pub struct CsrMatrix {
    rows: usize,
    cols: usize,
    indptr: Vec<usize>,
    indices: Vec<usize>,
    data: Vec<f64>,
}

impl CsrMatrix {
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Stored entries, after duplicate merging.
    pub fn nnz(&self) -> usize {
        self.data.len()
    }

    pub fn row(&self, r: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let span = self.indptr[r]..self.indptr[r + 1];
        self.indices[span.clone()]
            .iter()
            .copied()
            .zip(self.data[span].iter().copied())
    }

    pub fn row_len(&self, r: usize) -> usize {
        self.indptr[r + 1] - self.indptr[r]
    }

    pub fn get(&self, r: usize, c: usize) -> f64 {
        self.row(r).find(|&(j, _)| j == c).map(|(_, v)| v).unwrap_or(0.0)
    }

    pub fn to_dense(&self) -> Array2<f64> {
        let mut dense = Array2::<f64>::zeros((self.rows, self.cols));
        for r in 0..self.rows {
            for (c, v) in self.row(r) {
                dense[[r, c]] = v;
            }
        }
        dense
    }

    /// Keeps the nonzero entries of `dense`.
    pub fn from_dense(dense: &Array2<f64>) -> CsrMatrix {
        let (rows, cols) = dense.dim();
        let mut triplets = TripletMatrix::new(rows, cols);
        for ((r, c), &v) in dense.indexed_iter() {
            if v != 0.0 {
                triplets.entries.push((r, c, v));
            }
        }
        triplets.to_csr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr2;

    #[test]
    fn duplicates_are_summed_not_overwritten() {
        let mut t = TripletMatrix::new(2, 3);
        t.push(0, 1, 0.25).unwrap();
        t.push(1, 2, 1.0).unwrap();
        t.push(0, 1, 0.75).unwrap();
        assert_eq!(t.len(), 3);
        let csr = t.to_csr();
        assert_eq!(csr.nnz(), 2);
        assert_eq!(csr.row(0).collect::<Vec<_>>(), vec![(1, 1.0)]);
        assert_eq!(csr.row(1).collect::<Vec<_>>(), vec![(2, 1.0)]);
    }

    #[test]
    fn rows_come_out_sorted_by_column() {
        let mut t = TripletMatrix::new(1, 4);
        t.push(0, 3, 0.1).unwrap();
        t.push(0, 0, 0.2).unwrap();
        t.push(0, 2, 0.3).unwrap();
        let cols: Vec<usize> = t.to_csr().row(0).map(|(c, _)| c).collect();
        assert_eq!(cols, vec![0, 2, 3]);
    }

    #[test]
    fn empty_rows_are_kept() {
        let mut t = TripletMatrix::new(3, 2);
        t.push(2, 1, 1.0).unwrap();
        let csr = t.to_csr();
        assert_eq!(csr.row_len(0), 0);
        assert_eq!(csr.row_len(1), 0);
        assert_eq!(csr.row_len(2), 1);
        assert_eq!(csr.get(2, 1), 1.0);
        assert_eq!(csr.get(0, 1), 0.0);
    }

    #[test]
    fn push_rejects_out_of_bounds() {
        let mut t = TripletMatrix::new(2, 2);
        assert!(matches!(t.push(2, 0, 1.0), Err(Error::DimensionMismatch { .. })));
        assert!(matches!(t.push(0, 5, 1.0), Err(Error::DimensionMismatch { .. })));
        assert!(t.is_empty());
    }

    #[test]
    fn dense_conversion_matches() {
        let dense = arr2(&[[0.0, 0.4, 0.6], [1.0, 0.0, 0.0]]);
        let csr = CsrMatrix::from_dense(&dense);
        assert_eq!(csr.shape(), (2, 3));
        assert_eq!(csr.nnz(), 3);
        assert_eq!(csr.to_dense(), dense);
    }
}
