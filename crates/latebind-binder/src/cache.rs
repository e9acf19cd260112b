//! Injected candidate-set cache.
//!
//! Candidate elaboration is pure, so duplicate construction under a race is
//! wasteful but harmless; the cache only needs get-or-insert semantics per
//! key. Keys are the identity of the signature list (the `Arc` pointers),
//! matching the caller's obligation to reuse the same signature objects for
//! the same call site.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use latebind_common::TypeTable;
use tracing::trace;

use crate::candidate_set::CandidateSets;
use crate::signature::Signature;

type Key = Vec<usize>;

#[derive(Default)]
pub struct CandidateCache {
    map: DashMap<Key, Arc<CandidateSets>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CandidateCache {
    pub fn new() -> Self {
        CandidateCache::default()
    }

    fn key(signatures: &[Arc<Signature>]) -> Key {
        signatures.iter().map(|s| Arc::as_ptr(s) as usize).collect()
    }

    /// The candidate sets for this signature list, building them on first
    /// use.
    pub fn sets_for(
        &self,
        signatures: &[Arc<Signature>],
        table: &TypeTable,
    ) -> Arc<CandidateSets> {
        let key = Self::key(signatures);
        if let Some(entry) = self.map.get(&key) {
            self.hits.fetch_add(1, Ordering::Relaxed);
            return Arc::clone(&entry);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        trace!(signatures = signatures.len(), "candidate cache miss");
        let entry = self
            .map
            .entry(key)
            .or_insert_with(|| Arc::new(CandidateSets::build(signatures, table)));
        Arc::clone(&entry)
    }

    /// (hits, misses) since construction.
    pub fn stats(&self) -> (u64, u64) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::ParameterDescriptor;
    use latebind_common::TypeId;

    #[test]
    fn same_identity_hits_once_built() {
        let table = TypeTable::new();
        let cache = CandidateCache::new();
        let sigs = vec![Signature::new(
            "f",
            vec![ParameterDescriptor::new("a", TypeId::I64)],
            TypeId::VOID,
        )
        .into_arc()];
        let a = cache.sets_for(&sigs, &table);
        let b = cache.sets_for(&sigs, &table);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(cache.stats(), (1, 1));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_identity_misses() {
        let table = TypeTable::new();
        let cache = CandidateCache::new();
        let make = || {
            vec![Signature::new(
                "f",
                vec![ParameterDescriptor::new("a", TypeId::I64)],
                TypeId::VOID,
            )
            .into_arc()]
        };
        cache.sets_for(&make(), &table);
        cache.sets_for(&make(), &table);
        assert_eq!(cache.stats(), (0, 2));
    }
}
