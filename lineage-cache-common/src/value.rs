//! The value side of the data model: matrix blocks, scalars, and the tagged
//! union an entry fills its value slot with.

use std::sync::Arc;

/// Collaborator contract for a matrix block: everything the cache needs to
/// know to account for it and to decide whether spilling it is worthwhile,
/// without knowing anything about its element type or storage layout.
pub trait MatrixBlock: Send + Sync + 'static {
    /// In-memory footprint in bytes, used for `cache_bytes` accounting.
    fn memory_size(&self) -> usize;

    /// On-disk footprint in bytes given this block's own (rows, cols, nnz),
    /// which may differ from `memory_size` once a sparse encoding is used.
    fn disk_size(&self) -> usize;

    fn rows(&self) -> usize;
    fn cols(&self) -> usize;
    fn nnz(&self) -> usize;

    /// Whether this block is stored in a sparse format. Used to pick which
    /// of the four adaptive bandwidth constants applies.
    fn is_sparse(&self) -> bool;
}

/// Collaborator contract for a scalar output. Scalars are never spilled, but
/// still participate in `cache_bytes` size accounting.
pub trait CacheScalar: Clone + Send + Sync + 'static {
    fn memory_size(&self) -> usize;
}

impl CacheScalar for f64 {
    fn memory_size(&self) -> usize {
        std::mem::size_of::<f64>()
    }
}

impl CacheScalar for bool {
    fn memory_size(&self) -> usize {
        std::mem::size_of::<bool>()
    }
}

impl CacheScalar for i64 {
    fn memory_size(&self) -> usize {
        std::mem::size_of::<i64>()
    }
}

/// A cached value: "at most one of matrix or scalar" becomes, in Rust, a
/// two-armed enum instead of two `Option` fields — the type system enforces
/// the invariant instead of a runtime assertion.
///
/// Matrices are held behind an `Arc` so that moving a fresh binding's value
/// into a placeholder is a pointer swap, and so a blocked reader can be
/// handed a cheap clone once the slot is filled.
#[derive(Debug)]
pub enum CacheValue<M, S> {
    Matrix(Arc<M>),
    Scalar(S),
}

impl<M, S> Clone for CacheValue<M, S>
where
    S: Clone,
{
    fn clone(&self) -> Self {
        match self {
            CacheValue::Matrix(m) => CacheValue::Matrix(m.clone()),
            CacheValue::Scalar(s) => CacheValue::Scalar(s.clone()),
        }
    }
}

impl<M, S> CacheValue<M, S>
where
    M: MatrixBlock,
    S: CacheScalar,
{
    pub fn kind(&self) -> crate::ValueKind {
        match self {
            CacheValue::Matrix(_) => crate::ValueKind::Matrix,
            CacheValue::Scalar(_) => crate::ValueKind::Scalar,
        }
    }

    /// The byte charge this value contributes to `cache_bytes` once cached.
    /// A placeholder (no value yet) contributes zero by construction: this
    /// method is only ever called on a filled slot.
    pub fn memory_size(&self) -> usize {
        match self {
            CacheValue::Matrix(m) => m.memory_size(),
            CacheValue::Scalar(s) => s.memory_size(),
        }
    }

    pub fn as_matrix(&self) -> Option<&Arc<M>> {
        match self {
            CacheValue::Matrix(m) => Some(m),
            CacheValue::Scalar(_) => None,
        }
    }

    pub fn as_scalar(&self) -> Option<&S> {
        match self {
            CacheValue::Scalar(s) => Some(s),
            CacheValue::Matrix(_) => None,
        }
    }
}
