//! Arity-keyed candidate sets.

use std::sync::Arc;

use indexmap::IndexMap;
use latebind_common::TypeTable;
use tracing::debug;

use crate::arguments::ActualArguments;
use crate::candidate::{expand_variadic, make_candidates, MethodCandidate};
use crate::signature::Signature;

/// Every candidate elaborated from one signature list, partitioned by
/// visible arity, with variadic signatures remembered separately for
/// per-call-shape expansion. Immutable once built, so one instance can be
/// cached and shared across concurrent resolutions.
pub struct CandidateSets {
    by_arity: IndexMap<usize, Vec<MethodCandidate>>,
    variadic: Vec<Arc<Signature>>,
    total: usize,
}

impl CandidateSets {
    pub fn build(signatures: &[Arc<Signature>], table: &TypeTable) -> Self {
        let mut by_arity: IndexMap<usize, Vec<MethodCandidate>> = IndexMap::new();
        let mut variadic = Vec::new();
        let mut total = 0;
        for sig in signatures {
            for cand in make_candidates(sig, table) {
                by_arity.entry(cand.arity()).or_default().push(cand);
                total += 1;
            }
            if sig.is_variadic() {
                variadic.push(Arc::clone(sig));
            }
        }
        debug!(
            signatures = signatures.len(),
            candidates = total,
            arities = by_arity.len(),
            variadic = variadic.len(),
            "built candidate sets"
        );
        CandidateSets { by_arity, variadic, total }
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0 && self.variadic.is_empty()
    }

    /// Arities any non-expanded candidate accepts, ascending.
    pub fn expected_arities(&self) -> Vec<usize> {
        let mut arities: Vec<usize> = self.by_arity.keys().copied().collect();
        arities.sort_unstable();
        arities
    }

    /// Candidates applicable to this call shape: the fixed-arity set plus
    /// every variadic signature that expands cleanly against it.
    pub fn candidates_for(
        &self,
        args: &ActualArguments,
        table: &TypeTable,
    ) -> Vec<MethodCandidate> {
        let arity = args.visible_count();
        let mut out: Vec<MethodCandidate> = self
            .by_arity
            .get(&arity)
            .map(|v| v.to_vec())
            .unwrap_or_default();
        // Expansion validates the whole call shape itself; a dict-absorbed
        // named argument occupies no slot, so the expanded candidate's slot
        // count may legitimately sit below the visible arity.
        for sig in &self.variadic {
            if let Some(cand) = expand_variadic(sig, args, table) {
                out.push(cand);
            }
        }
        out
    }
}
