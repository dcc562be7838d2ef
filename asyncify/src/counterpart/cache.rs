use std::sync::{Arc, PoisonError, RwLock};

use rustc_hash::FxHashMap;

use super::CandidateList;
use crate::model::{SigId, TypeId};

type CacheKey = (SigId, TypeId, u8);

/// Per-signature memoization of counterpart searches.
///
/// Resolution is a pure function of the immutable symbol model, so
/// concurrent workers may race on the same key; the first stored value wins
/// and every caller observes the same `Arc`.
#[derive(Default)]
pub(super) struct CounterpartCache {
    inner: RwLock<FxHashMap<CacheKey, Arc<CandidateList>>>,
}

impl CounterpartCache {
    pub(super) fn get(&self, key: &CacheKey) -> Option<Arc<CandidateList>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub(super) fn insert(&self, key: CacheKey, value: Arc<CandidateList>) -> Arc<CandidateList> {
        let mut guard = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(guard.entry(key).or_insert(value))
    }
}
