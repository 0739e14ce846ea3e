//! Configuration facade: the small set of knobs that gate which reuse paths
//! and residency behaviors are active.

/// Which reuse paths are enabled. `FullPartial` stands in for "FULL+PARTIAL".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReuseMode {
    /// Disables the cache entirely: `try_reuse_*` always returns `false` and
    /// no placeholder is ever installed.
    None,
    /// Enables the full-hit path only.
    Full,
    /// Enables only the compensation-rewriter hook.
    Partial,
    /// Enables the multi-output protocol, in addition to full reuse.
    Multilevel,
    /// Full reuse and the partial-reuse rewriter hook, both enabled.
    FullPartial,
}

impl ReuseMode {
    pub fn is_enabled(self) -> bool {
        !matches!(self, ReuseMode::None)
    }

    pub fn allows_full(self) -> bool {
        matches!(self, ReuseMode::Full | ReuseMode::Multilevel | ReuseMode::FullPartial)
    }

    pub fn allows_partial(self) -> bool {
        matches!(self, ReuseMode::Partial | ReuseMode::FullPartial)
    }

    pub fn allows_multilevel(self) -> bool {
        matches!(self, ReuseMode::Multilevel)
    }
}

/// Recognized configuration options, with their production defaults.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub reuse_mode: ReuseMode,
    pub spill_enabled: bool,
    /// Fraction of process-available memory used for `CACHE_LIMIT`.
    pub cache_fraction: f64,
    /// Threshold (ms) below which a matrix is deleted rather than spilled,
    /// and below which an estimated round trip is treated as unreliable.
    pub min_spill_time_ms: u64,
    /// Below this payload size (MiB), a real I/O's observed bandwidth is
    /// ignored by the bandwidth estimator (the sample is too noisy to trust).
    pub min_spill_data_mb: f64,
    /// If true, only admit matrix entries whose owning object is externally
    /// marked; if false, admit all matrix entries.
    pub comp_assume_read_write: bool,
    /// Total bytes of memory the cache may use to derive `CACHE_LIMIT` from
    /// `cache_fraction`. In the host runtime this would be queried from the
    /// JVM/process; callers of this crate supply it directly.
    pub total_memory_bytes: usize,
}

impl CacheConfig {
    /// The memory budget the eviction walk targets.
    pub fn cache_limit_bytes(&self) -> usize {
        ((self.total_memory_bytes as f64) * self.cache_fraction) as usize
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            reuse_mode: ReuseMode::Full,
            spill_enabled: true,
            cache_fraction: 0.05,
            min_spill_time_ms: 100,
            min_spill_data_mb: 1.0,
            comp_assume_read_write: false,
            total_memory_bytes: 2 * 1024 * 1024 * 1024,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_cache_fraction_is_five_percent() {
        let cfg = CacheConfig::default();
        assert_eq!(cfg.cache_fraction, 0.05);
        assert_eq!(cfg.cache_limit_bytes(), (2usize * 1024 * 1024 * 1024) / 20);
    }

    #[test]
    fn reuse_mode_gates() {
        assert!(!ReuseMode::None.is_enabled());
        assert!(ReuseMode::Full.allows_full());
        assert!(!ReuseMode::Full.allows_partial());
        assert!(ReuseMode::Partial.allows_partial());
        assert!(!ReuseMode::Partial.allows_full());
        assert!(ReuseMode::Multilevel.allows_multilevel());
        assert!(ReuseMode::Multilevel.allows_full());
        assert!(ReuseMode::FullPartial.allows_full());
        assert!(ReuseMode::FullPartial.allows_partial());
    }
}
