//! Per-call cache policy.

use std::time::Duration;

/// How a single relation read treats the cache.
///
/// `Bypass` still writes the fetched value, but with a zero TTL: the entry is
/// never served and is only visible to [`CacheStore::peek`](crate::CacheStore::peek).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CachePolicy {
    /// Serve live entries and write with the store's default TTL.
    #[default]
    Default,
    /// Serve live entries and write with this TTL.
    Ttl(Duration),
    /// Always fetch.
    Bypass,
}

impl CachePolicy {
    pub fn ttl(ttl: Duration) -> Self {
        Self::Ttl(ttl)
    }

    pub fn bypass() -> Self {
        Self::Bypass
    }

    pub fn is_bypass(&self) -> bool {
        matches!(self, Self::Bypass)
    }

    /// Whether a live entry may be returned instead of fetching.
    pub fn reads_cache(&self) -> bool {
        match self {
            Self::Default => true,
            Self::Ttl(ttl) => !ttl.is_zero(),
            Self::Bypass => false,
        }
    }

    /// TTL to write with, given the store default.
    pub fn effective_ttl(&self, default: Duration) -> Duration {
        match self {
            Self::Default => default,
            Self::Ttl(ttl) => *ttl,
            Self::Bypass => Duration::ZERO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_ttl() {
        let default = Duration::from_secs(300);
        assert_eq!(CachePolicy::Default.effective_ttl(default), default);
        assert_eq!(
            CachePolicy::ttl(Duration::from_secs(5)).effective_ttl(default),
            Duration::from_secs(5)
        );
        assert_eq!(CachePolicy::bypass().effective_ttl(default), Duration::ZERO);
    }

    #[test]
    fn test_reads_cache() {
        assert!(CachePolicy::default().reads_cache());
        assert!(CachePolicy::ttl(Duration::from_secs(1)).reads_cache());
        assert!(!CachePolicy::ttl(Duration::ZERO).reads_cache());
        assert!(!CachePolicy::Bypass.reads_cache());
        assert!(CachePolicy::Bypass.is_bypass());
    }
}
