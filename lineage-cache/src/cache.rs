//! `LineageCache`: the public §6 API wired on top of `lineage-cache-core`'s
//! `ResultCache`. This is where the mode-gated sequencing of §4.1 (full probe,
//! then the partial-reuse hook, then placeholder install) and §4.7 (per-output
//! probe, all-hit bind-and-rewire, any-miss execute-then-commit/abort) lives;
//! the engine underneath only ever sees individual `acquire`/`fill`/
//! `commit_multi`/`abort_multi` calls.

use std::sync::Arc;

use lineage_cache_common::error::{Error, Result};
use lineage_cache_common::{
    BandwidthEstimator, CacheConfig, CacheScalar, CacheValue, LineageKey, LocalFileUtils, MatrixBlock,
    ValueKind,
};
use lineage_cache_core::{Acquired, ResultCache};
use tracing::warn;

use crate::collab::{ExecutionContext, Instruction, LineageUtils, PartialReuseRewriter};

/// One named output of a multi-output function call (§4.7): the variable
/// name it binds in the execution context, the lineage item it is keyed
/// under, and its value kind.
#[derive(Debug, Clone)]
pub struct MultiOutputSpec<K> {
    pub name: String,
    pub key: K,
    pub kind: ValueKind,
}

impl<K> MultiOutputSpec<K> {
    pub fn new(name: impl Into<String>, key: K, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            key,
            kind,
        }
    }
}

/// Outcome of [`LineageCache::try_reuse_multi`].
#[derive(Debug)]
pub enum MultiReuseOutcome<K> {
    /// Every output was resident and has been bound into the caller's
    /// execution context; nothing further to do.
    Hit,
    /// At least one output missed. Carries exactly the keys this call
    /// installed fresh placeholders for — the only ones
    /// [`LineageCache::put_value_multi`] may later abort.
    Miss(Vec<K>),
}

/// The lineage-keyed result cache: one instance per runtime, constructed
/// explicitly and shared via `Arc` by the caller (design note 9), never
/// process-wide state.
pub struct LineageCache<K, M, S, B, R, L> {
    core: ResultCache<K, M, S, B>,
    rewriter: R,
    lineage_utils: L,
}

impl<K, M, S, B, R, L> LineageCache<K, M, S, B, R, L>
where
    K: LineageKey,
    M: MatrixBlock,
    S: CacheScalar,
    B: LocalFileUtils<M> + BandwidthEstimator<M>,
    R: PartialReuseRewriter<K, M, S>,
    L: LineageUtils<K>,
{
    pub fn new(backend: B, rewriter: R, lineage_utils: L, config: CacheConfig) -> Self {
        Self {
            core: ResultCache::new(backend, config),
            rewriter,
            lineage_utils,
        }
    }

    pub fn config(&self) -> &CacheConfig {
        self.core.config()
    }

    pub fn metrics(&self) -> &lineage_cache_common::metrics::Metrics {
        self.core.metrics()
    }

    /// Non-binding presence check (§6, §8: "pure with respect to cache
    /// contents, modulo the removed-set statistic").
    pub fn probe(&self, key: &K) -> bool {
        self.core.probe(key)
    }

    /// §4.1: the single-op reuse coordinator. Returns `Ok(true)` if `instr`'s
    /// output was served from cache (bound into `ctx` under its original
    /// name, with lineage rewired to the original producer if this was a
    /// moved-in entry); `Ok(false)` if the caller must execute `instr` itself
    /// and then call [`LineageCache::put_matrix_single`] /
    /// [`LineageCache::put_value_single`].
    ///
    /// The probe→rewrite→reprobe→install sequence spec.md §4.1 describes as
    /// one atomic step cannot literally hold the cache-wide lock across the
    /// call into `rewriter.execute_rewrites`: a rewrite may itself recurse
    /// into `try_reuse_single` for a synthesized sub-instruction, and doing
    /// that while still holding the lock would deadlock. Each probe and the
    /// eventual placeholder install still execute atomically under the lock
    /// individually; the only externally observable difference is that
    /// another thread could install a placeholder in the (lock-free) window
    /// between the second probe and the install, which `ResultCache::acquire`
    /// already handles by handing back that placeholder as a `Hit`.
    pub fn try_reuse_single<I, C>(&self, instr: &I, ctx: &mut C) -> Result<bool>
    where
        I: Instruction<K>,
        C: ExecutionContext<K, M, S>,
    {
        let mode = self.config().reuse_mode;
        if !mode.is_enabled() {
            return Ok(false);
        }
        if !instr.is_reuse_eligible() {
            return Ok(false);
        }

        let key = instr.lineage_key();
        let kind = instr.kind();

        // In the common case (full reuse, no partial rewriter in the mix)
        // this is a single `acquire` call that probes and, on a miss,
        // installs in the same critical section — one probe, one outcome,
        // matching scenario 1's "1 miss, 1 hit" statistics exactly. Partial
        // mode needs the extra probe-rewrite-reprobe sequence below, which
        // necessarily shows up as extra recorded probes.
        let acquired = if mode.allows_full() && !mode.allows_partial() {
            if instr.is_marked_for_caching() {
                self.core.acquire(&key, kind, true)?
            } else {
                self.core.acquire(&key, kind, false)?
            }
        } else {
            let mut found = if mode.allows_full() {
                non_empty(self.core.acquire(&key, kind, false)?)
            } else {
                None
            };

            if found.is_none() && mode.allows_partial() && self.rewriter.execute_rewrites(instr, ctx) {
                found = non_empty(self.core.acquire(&key, kind, false)?);
            }

            match found {
                Some(a) => a,
                None if instr.is_marked_for_caching() => self.core.acquire(&key, kind, true)?,
                None => Acquired::NotCached,
            }
        };

        match acquired {
            Acquired::Hit { monitor, origin_key } => {
                let (value, _compute_time_ns) = monitor.wait()?;
                let rewired = origin_key.unwrap_or_else(|| key.clone());
                ctx.bind_value(instr.output_name(), value);
                ctx.attach_lineage(instr.output_name(), rewired);
                Ok(true)
            }
            Acquired::Miss { .. } | Acquired::NotCached => Ok(false),
        }
    }

    /// §4.1's `put`, specialized to matrix outputs: validates the bound
    /// output is in fact a matrix before filling, per invariant 3.
    pub fn put_matrix_single<I, C>(&self, instr: &I, ctx: &C, compute_time_ns: u64) -> Result<()>
    where
        I: Instruction<K>,
        C: ExecutionContext<K, M, S>,
    {
        let value = bound_value(ctx, instr.output_name())?;
        if !matches!(value, CacheValue::Matrix(_)) {
            return Err(Error::SpillInvariant(format!(
                "put_matrix_single called for {:?} but the bound value is not a matrix",
                instr.output_name()
            )));
        }
        self.core.fill(&instr.lineage_key(), value, compute_time_ns)
    }

    /// §4.1's `put`, generic over value kind.
    pub fn put_value_single<I, C>(&self, instr: &I, ctx: &C, compute_time_ns: u64) -> Result<()>
    where
        I: Instruction<K>,
        C: ExecutionContext<K, M, S>,
    {
        let value = bound_value(ctx, instr.output_name())?;
        self.core.fill(&instr.lineage_key(), value, compute_time_ns)
    }

    /// Blocks on the placeholder or resident entry at `key`, per §6:
    /// `get_matrix(key) -> MatrixBlock`. Intended for callers that already
    /// hold a cache hit (from `try_reuse_single`/`try_reuse_multi`) and simply
    /// need the matrix itself; calling it for a key with no entry at all
    /// (never probed, never installed) is a programmer error.
    pub fn get_matrix(&self, key: &K) -> Result<Arc<M>> {
        match self.core.acquire(key, ValueKind::Matrix, false)? {
            Acquired::Hit { monitor, .. } => {
                let (value, _) = monitor.wait()?;
                value
                    .as_matrix()
                    .cloned()
                    .ok_or_else(|| Error::SpillInvariant(format!("get_matrix({key:?}) resolved to a scalar entry")))
            }
            Acquired::Miss { .. } | Acquired::NotCached => {
                Err(Error::SpillInvariant(format!("get_matrix({key:?}) called with no existing cache entry")))
            }
        }
    }

    /// §4.7's probe phase plus all-hit bind path. Returns
    /// [`MultiReuseOutcome::Hit`] if every output in `outputs` was resident
    /// (cache hit or in-flight placeholder from another racing call) and has
    /// been bound into `ctx`; [`MultiReuseOutcome::Miss`] carrying the keys
    /// this call itself installed fresh placeholders for, if at least one
    /// output missed. The caller must execute the function fresh and pass
    /// that miss set on to [`LineageCache::put_value_multi`] — an output
    /// that hit here had no placeholder installed for this call and must
    /// never be aborted by it.
    pub fn try_reuse_multi<C>(&self, outputs: &[MultiOutputSpec<K>], ctx: &mut C) -> Result<MultiReuseOutcome<K>>
    where
        C: ExecutionContext<K, M, S>,
    {
        if !self.config().reuse_mode.allows_multilevel() {
            return Ok(MultiReuseOutcome::Miss(Vec::new()));
        }
        if outputs.is_empty() {
            return Ok(MultiReuseOutcome::Hit);
        }

        let mut acquired = Vec::with_capacity(outputs.len());
        let mut any_miss = false;
        for output in outputs {
            let a = self.core.acquire(&output.key, output.kind, true)?;
            any_miss |= matches!(a, Acquired::Miss { .. });
            acquired.push(a);
        }

        if any_miss {
            // The function executes normally; outputs that did hit are left
            // untouched (their cached value is still correct for their own
            // key, lineage equality guarantees the fresh recompute would
            // match it). Only the outputs that actually missed got a fresh
            // placeholder installed by this call; those are the only ones
            // `put_value_multi` may later abort.
            let missed = outputs
                .iter()
                .zip(&acquired)
                .filter(|(_, a)| matches!(a, Acquired::Miss { .. }))
                .map(|(output, _)| output.key.clone())
                .collect();
            return Ok(MultiReuseOutcome::Miss(missed));
        }

        for (output, a) in outputs.iter().zip(acquired) {
            let Acquired::Hit { monitor, origin_key } = a else {
                unreachable!("any_miss is false, every entry must be Hit");
            };
            let (value, _compute_time_ns) = monitor.wait()?;
            let rewired = origin_key.unwrap_or_else(|| output.key.clone());
            ctx.bind_value(&output.name, value);
            ctx.attach_lineage(&output.name, rewired);
        }
        Ok(MultiReuseOutcome::Hit)
    }

    /// §4.7's commit/abort phase, run after the caller has executed the
    /// function fresh because [`LineageCache::try_reuse_multi`] returned
    /// [`MultiReuseOutcome::Miss`]. Commits every output atomically if every
    /// bound name exists, carries a lineage item, and is untainted by a
    /// random/data-generator source reachable from `li_inputs`; otherwise
    /// removes exactly the placeholders in `missed` (the keys
    /// `try_reuse_multi` reported as freshly installed for this call) and
    /// wakes their waiters with failure, leaving any other output in
    /// `outputs` that was already a cache hit untouched.
    pub fn put_value_multi<C>(
        &self,
        outputs: &[MultiOutputSpec<K>],
        missed: &[K],
        li_inputs: &[K],
        ctx: &C,
        compute_time_ns: u64,
    ) -> Result<()>
    where
        C: ExecutionContext<K, M, S>,
    {
        if outputs.is_empty() {
            return Ok(());
        }

        let mut bindings = Vec::with_capacity(outputs.len());
        let mut committable = true;
        for output in outputs {
            let value = ctx.get_variable(&output.name);
            let origin = ctx.variable_lineage(&output.name);
            let tainted = match &origin {
                Some(origin) => self.lineage_utils.contains_rand_data_gen(li_inputs, origin),
                None => true,
            };
            if value.is_none() || origin.is_none() || tainted {
                committable = false;
            }
            bindings.push((value, origin));
        }

        if committable {
            let entries = outputs
                .iter()
                .zip(bindings)
                .map(|(output, (value, origin))| {
                    (
                        output.key.clone(),
                        value.expect("checked committable above"),
                        compute_time_ns,
                        origin.expect("checked committable above"),
                    )
                })
                .collect();
            self.core.commit_multi(entries)
        } else {
            warn!(n = missed.len(), "multi-output commit not possible, aborting placeholders installed for this call");
            self.core.abort_multi(missed);
            Ok(())
        }
    }

    /// Clears every structure to its initial empty state (§6, §8: idempotent).
    pub fn reset(&self) {
        self.core.reset()
    }

    pub fn cache_bytes(&self) -> usize {
        self.core.cache_bytes()
    }
}

fn non_empty<K, M, S>(acquired: Acquired<K, M, S>) -> Option<Acquired<K, M, S>> {
    match acquired {
        Acquired::NotCached => None,
        other => Some(other),
    }
}

fn bound_value<K, M, S, C>(ctx: &C, output_name: &str) -> Result<CacheValue<M, S>>
where
    C: ExecutionContext<K, M, S>,
    K: LineageKey,
    M: MatrixBlock,
    S: CacheScalar,
{
    ctx.get_variable(output_name)
        .ok_or_else(|| Error::SpillInvariant(format!("no value bound for output {output_name:?} at put time")))
}
