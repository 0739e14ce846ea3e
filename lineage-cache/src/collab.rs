//! Collaborator contracts specific to the public facade (§6): the execution
//! context and instruction a host runtime's instruction dispatch loop already
//! has, plus the partial-reuse rewriter and lineage-taint hooks it may or may
//! not have wired up. `LocalFileUtils`/`BandwidthEstimator`/`MatrixBlock` live
//! one layer down in `lineage-cache-common`, shared with `lineage-cache-core`;
//! these four are only ever consulted from this crate.

use lineage_cache_common::{CacheScalar, CacheValue, LineageKey, MatrixBlock, ValueKind};
use std::sync::Arc;

/// A runtime's variable bindings for one instruction's execution: get/set/
/// remove a named variable, bind matrix and scalar outputs, and track which
/// lineage item a bound name is currently tagged with.
///
/// Implemented by the host runtime against its own symbol table; this crate
/// never constructs one, only calls through it.
pub trait ExecutionContext<K: LineageKey, M: MatrixBlock, S: CacheScalar> {
    fn get_variable(&self, name: &str) -> Option<CacheValue<M, S>>;

    fn set_matrix(&mut self, name: &str, value: Arc<M>);

    fn set_scalar(&mut self, name: &str, value: S);

    fn remove_variable(&mut self, name: &str);

    /// Tags `name` with `key` as its current lineage item (the "B_i" of
    /// §4.7's commit phase, and the rewrite target of a cache hit).
    fn attach_lineage(&mut self, name: &str, key: K);

    /// The lineage item `name` is currently tagged with, if any.
    fn variable_lineage(&self, name: &str) -> Option<K>;

    /// Releases whatever data object `name` was previously bound to, ahead of
    /// rebinding it to a cached value. A no-op if nothing was previously
    /// bound.
    fn cleanup_replaced(&mut self, name: &str);

    /// Rebinds `name` to a cached value: cleans up what it previously held,
    /// then sets the matrix or scalar slot per `value`'s kind.
    fn bind_value(&mut self, name: &str, value: CacheValue<M, S>) {
        self.cleanup_replaced(name);
        match value {
            CacheValue::Matrix(m) => self.set_matrix(name, m),
            CacheValue::Scalar(s) => self.set_scalar(name, s),
        }
    }
}

/// A single instruction about to execute: whether it can ever be reused at
/// all, its lineage key, and the output variable it binds.
pub trait Instruction<K: LineageKey> {
    /// Whether this instruction's operator is reuse-eligible in principle
    /// (e.g. not an I/O or RNG instruction). Independent of whether a given
    /// call is *marked for caching* (see [`Instruction::is_marked_for_caching`]):
    /// an eligible instruction whose output is too cheap to bother caching is
    /// still eligible, it simply never installs a placeholder.
    fn is_reuse_eligible(&self) -> bool;

    /// Whether a miss on this instruction should install a placeholder for
    /// other threads to race against, versus executing uncached every time.
    fn is_marked_for_caching(&self) -> bool;

    /// The lineage item summarizing this instruction's operator identity and
    /// its transitive inputs.
    fn lineage_key(&self) -> K;

    /// The output kind this instruction produces.
    fn kind(&self) -> ValueKind;

    /// The variable name this instruction's single output binds.
    fn output_name(&self) -> &str;
}

/// The compensation-plan partial-reuse rewriter: given an instruction whose
/// exact lineage misses, attempts to synthesize a cheaper instruction whose
/// lineage would hit and execute it into `ctx` in-place. Out of scope per
/// spec.md §1 beyond this boolean hook — the cache only ever asks whether the
/// rewrite happened, never how.
pub trait PartialReuseRewriter<K: LineageKey, M: MatrixBlock, S: CacheScalar>: Send + Sync {
    fn execute_rewrites<I, C>(&self, instr: &I, ctx: &mut C) -> bool
    where
        I: Instruction<K>,
        C: ExecutionContext<K, M, S>;
}

/// A [`PartialReuseRewriter`] that never finds a cheaper rewrite, for runtimes
/// running in `ReuseMode::Full`/`Multilevel` that never exercise the partial
/// path.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoPartialReuse;

impl<K: LineageKey, M: MatrixBlock, S: CacheScalar> PartialReuseRewriter<K, M, S> for NoPartialReuse {
    fn execute_rewrites<I, C>(&self, _instr: &I, _ctx: &mut C) -> bool
    where
        I: Instruction<K>,
        C: ExecutionContext<K, M, S>,
    {
        false
    }
}

/// Lineage-taint hook for the multi-output commit path (§4.7): whether a
/// bound variable's current lineage is tainted by a random/data-generator
/// source transitively reachable from the function's inputs, which would
/// make caching it unsound (two calls with the same lineage item could still
/// legitimately produce different values).
pub trait LineageUtils<K: LineageKey>: Send + Sync {
    fn contains_rand_data_gen(&self, inputs: &[K], root: &K) -> bool;
}

/// A [`LineageUtils`] that never reports taint, for runtimes with no RNG
/// instructions in scope (or that scope the taint check out entirely).
#[derive(Debug, Default, Clone, Copy)]
pub struct NeverTainted;

impl<K: LineageKey> LineageUtils<K> for NeverTainted {
    fn contains_rand_data_gen(&self, _inputs: &[K], _root: &K) -> bool {
        false
    }
}
