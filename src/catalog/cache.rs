//! Read-through cache in front of a metadata resolver.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::catalog::resolver::{HlaMetadataResolver, ResolutionError};
use crate::core::metadata::MatchingMetadata;
use crate::core::types::Locus;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    nomenclature_version: String,
    locus: Locus,
    raw: String,
}

/// Caches successful resolutions keyed by (nomenclature version, locus, raw typing).
///
/// Failed resolutions are not cached, so a fixed dictionary entry is picked up
/// on the next lookup.
pub struct CachingResolver<R> {
    inner: R,
    entries: RwLock<HashMap<CacheKey, Arc<MatchingMetadata>>>,
}

impl<R: HlaMetadataResolver> CachingResolver<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &R {
        &self.inner
    }

    /// Number of cached typings
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<R: HlaMetadataResolver> HlaMetadataResolver for CachingResolver<R> {
    fn resolve(
        &self,
        locus: Locus,
        raw: &str,
        nomenclature_version: &str,
    ) -> Result<Arc<MatchingMetadata>, ResolutionError> {
        let key = CacheKey {
            nomenclature_version: nomenclature_version.to_string(),
            locus,
            raw: raw.trim().to_string(),
        };

        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(hit));
        }

        debug!("Metadata cache miss: {} {} ({})", locus, key.raw, nomenclature_version);
        let metadata = self.inner.resolve(locus, raw, nomenclature_version)?;

        // Another thread may have resolved the same key meanwhile; keep the first
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(metadata)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::fixtures::{dictionary, FIXTURE_VERSION};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingResolver<R> {
        inner: R,
        calls: AtomicUsize,
    }

    impl<R: HlaMetadataResolver> HlaMetadataResolver for CountingResolver<R> {
        fn resolve(
            &self,
            locus: Locus,
            raw: &str,
            nomenclature_version: &str,
        ) -> Result<Arc<MatchingMetadata>, ResolutionError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.resolve(locus, raw, nomenclature_version)
        }
    }

    fn counting() -> CachingResolver<CountingResolver<crate::catalog::store::HlaMetadataDictionary>> {
        CachingResolver::new(CountingResolver {
            inner: dictionary(),
            calls: AtomicUsize::new(0),
        })
    }

    #[test]
    fn test_cache_hit_returns_shared_metadata() {
        let cache = counting();
        let first = cache.resolve(Locus::A, "01:01", FIXTURE_VERSION).unwrap();
        let second = cache.resolve(Locus::A, " 01:01 ", FIXTURE_VERSION).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_cache_keys_include_locus_and_version() {
        let cache = counting();
        cache.resolve(Locus::A, "01:01", FIXTURE_VERSION).unwrap();
        cache.resolve(Locus::A, "01:01", "3.30.0").unwrap();
        cache.resolve(Locus::Drb1, "03:01", FIXTURE_VERSION).unwrap();
        assert_eq!(cache.len(), 3);
    }

    #[test]
    fn test_errors_are_not_cached() {
        let cache = counting();
        assert!(cache.resolve(Locus::A, "99:01", FIXTURE_VERSION).is_err());
        assert!(cache.resolve(Locus::A, "99:01", FIXTURE_VERSION).is_err());
        assert_eq!(cache.inner().calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let cache = counting();
        cache.resolve(Locus::B, "07:02", FIXTURE_VERSION).unwrap();
        cache.clear();
        assert!(cache.is_empty());
    }
}
