//! A concrete, `serde`-derived matrix block: the "host runtime's existing
//! serialization" of §6 made concrete as `bincode` over a wire struct, dense
//! as row-major `Vec<f64>` and sparse as CSR triplets, per design note 9's
//! serialization addition. Used by `lineage-cache-cli`, `lineage-cache-bench`,
//! and the integration tests in `lineage-cache`; a host runtime with its own
//! matrix type would implement `MatrixBlock` directly instead.

use lineage_cache_common::MatrixBlock;
use serde::{Deserialize, Serialize};

/// Below this density (nnz / (rows*cols)), [`Matrix::dense`] would be better
/// represented sparse. Exposed for callers building synthetic workloads; the
/// cache itself only ever asks [`MatrixBlock::is_sparse`], never recomputes
/// this.
pub const SPARSITY_THRESHOLD: f64 = 0.4;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Matrix {
    Dense {
        rows: usize,
        cols: usize,
        data: Vec<f64>,
    },
    Sparse {
        rows: usize,
        cols: usize,
        row_ptr: Vec<u32>,
        col_idx: Vec<u32>,
        values: Vec<f64>,
    },
}

impl Matrix {
    pub fn dense(rows: usize, cols: usize, data: Vec<f64>) -> Self {
        assert_eq!(rows * cols, data.len(), "dense data length must equal rows*cols");
        Matrix::Dense { rows, cols, data }
    }

    /// Builds a CSR sparse matrix directly; callers are responsible for a
    /// well-formed `row_ptr` (length `rows + 1`, nondecreasing).
    pub fn sparse(rows: usize, cols: usize, row_ptr: Vec<u32>, col_idx: Vec<u32>, values: Vec<f64>) -> Self {
        assert_eq!(row_ptr.len(), rows + 1, "CSR row_ptr must have rows+1 entries");
        assert_eq!(col_idx.len(), values.len(), "CSR col_idx and values must be the same length");
        Matrix::Sparse {
            rows,
            cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Decides whether `(rows, cols, nnz)` is sparse enough to be worth a CSR
    /// representation, per spec.md §4.6's "sparsity is decided by a runtime
    /// predicate on (rows, cols, nnz)".
    pub fn is_sparse_by_density(rows: usize, cols: usize, nnz: usize) -> bool {
        if rows == 0 || cols == 0 {
            return false;
        }
        (nnz as f64) < SPARSITY_THRESHOLD * (rows * cols) as f64
    }
}

impl MatrixBlock for Matrix {
    fn memory_size(&self) -> usize {
        match self {
            Matrix::Dense { data, .. } => std::mem::size_of::<f64>() * data.len(),
            Matrix::Sparse { values, col_idx, row_ptr, .. } => {
                std::mem::size_of::<f64>() * values.len()
                    + std::mem::size_of::<u32>() * (col_idx.len() + row_ptr.len())
            }
        }
    }

    fn disk_size(&self) -> usize {
        // bincode's framing overhead is small and constant per value; the
        // payload itself dominates, so reuse the in-memory size as the
        // estimate the bandwidth estimator keys its MB/s samples off of.
        self.memory_size()
    }

    fn rows(&self) -> usize {
        match self {
            Matrix::Dense { rows, .. } | Matrix::Sparse { rows, .. } => *rows,
        }
    }

    fn cols(&self) -> usize {
        match self {
            Matrix::Dense { cols, .. } | Matrix::Sparse { cols, .. } => *cols,
        }
    }

    fn nnz(&self) -> usize {
        match self {
            Matrix::Dense { data, .. } => data.iter().filter(|v| **v != 0.0).count(),
            Matrix::Sparse { values, .. } => values.len(),
        }
    }

    fn is_sparse(&self) -> bool {
        matches!(self, Matrix::Sparse { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dense_memory_size_is_eight_bytes_per_element() {
        let m = Matrix::dense(2, 3, vec![0.0; 6]);
        assert_eq!(m.memory_size(), 48);
        assert!(!m.is_sparse());
    }

    #[test]
    fn sparsity_predicate_matches_threshold() {
        assert!(Matrix::is_sparse_by_density(100, 100, 100));
        assert!(!Matrix::is_sparse_by_density(10, 10, 90));
    }

    #[test]
    #[should_panic(expected = "rows*cols")]
    fn dense_rejects_mismatched_length() {
        Matrix::dense(2, 2, vec![0.0; 3]);
    }
}
