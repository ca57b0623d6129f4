//! Memoisation of pure binder lookups.
//!
//! Reactions between two operands with nothing written between them depend
//! only on the two types, so they can be remembered. Lookups under an
//! explicit operator are always passed straight to the oracle.

use crate::operator::Operator;
use crate::oracle::ReactionOracle;
use crate::reaction::Reaction;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

type Memo<T> = HashMap<(T, T), Option<Reaction<T>>>;

/// Pure binder reactions shared across many binds, possibly from many
/// threads at once.
#[derive(Debug)]
pub struct SharedReactions<T> {
    memo: Mutex<Memo<T>>,
}

impl<T: Eq + Hash> SharedReactions<T> {
    pub fn new() -> Self {
        Self {
            memo: Mutex::new(HashMap::new()),
        }
    }

    // A panic elsewhere cannot leave a half-written entry behind.
    fn lock(&self) -> MutexGuard<'_, Memo<T>> {
        self.memo.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn clear(&self) {
        self.lock().clear()
    }
}

impl<T: Eq + Hash> Default for SharedReactions<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Where a binder keeps pure binder reactions.
#[derive(Debug, Clone)]
pub enum CachePolicy<T> {
    /// A fresh memo for every top-level bind.
    PerBind,
    Shared(Arc<SharedReactions<T>>),
}

impl<T> Default for CachePolicy<T> {
    fn default() -> Self {
        CachePolicy::PerBind
    }
}

enum Store<'a, T> {
    Local(Memo<T>),
    Shared(&'a SharedReactions<T>),
}

/// The oracle as seen by one top-level bind.
pub(crate) struct Reactions<'a, O: ReactionOracle> {
    oracle: &'a O,
    store: Store<'a, O::Type>,
}

impl<'a, O: ReactionOracle> Reactions<'a, O> {
    pub(crate) fn new(oracle: &'a O, policy: &'a CachePolicy<O::Type>) -> Self {
        let store = match policy {
            CachePolicy::PerBind => Store::Local(HashMap::new()),
            CachePolicy::Shared(shared) => Store::Shared(&**shared),
        };
        Self { oracle, store }
    }

    pub(crate) fn find(
        &mut self,
        left: &O::Type,
        right: &O::Type,
        operator: Operator,
    ) -> Option<Reaction<O::Type>> {
        if !operator.is_implicit() {
            return self.oracle.find(left, right, operator);
        }

        let oracle = self.oracle;
        let key = (left.clone(), right.clone());
        match &mut self.store {
            Store::Local(memo) => memo
                .entry(key)
                .or_insert_with(|| oracle.find(left, right, operator))
                .clone(),
            Store::Shared(shared) => {
                if let Some(hit) = shared.lock().get(&key) {
                    tracing::trace!(?left, ?right, "shared reaction cache hit");
                    return hit.clone();
                }
                // Not holding the lock while the oracle walks the hierarchy.
                // Two threads may both compute the same entry; they agree.
                let found = oracle.find(left, right, operator);
                shared.lock().insert(key, found.clone());
                found
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::{Tag, POSTFIX_BIND};
    use crate::reaction::MethodRef;
    use std::cell::Cell;

    struct Counting {
        calls: Cell<usize>,
    }

    impl ReactionOracle for Counting {
        type Type = u8;

        fn find(&self, left: &u8, right: &u8, _operator: Operator) -> Option<Reaction<u8>> {
            self.calls.set(self.calls.get() + 1);
            if left < right {
                Some(Reaction {
                    callable: MethodRef {
                        owner: *right,
                        slot: 0,
                        name: POSTFIX_BIND,
                    },
                    swapped: true,
                    result_type: *right,
                })
            } else {
                None
            }
        }
    }

    fn counting() -> Counting {
        Counting {
            calls: Cell::new(0),
        }
    }

    #[test]
    fn per_bind_memo_remembers_hits_and_misses() {
        let oracle = counting();
        let policy = CachePolicy::PerBind;
        let mut reactions = Reactions::new(&oracle, &policy);
        assert!(reactions.find(&1, &2, Operator::Implicit).is_some());
        assert!(reactions.find(&1, &2, Operator::Implicit).is_some());
        assert!(reactions.find(&3, &2, Operator::Implicit).is_none());
        assert!(reactions.find(&3, &2, Operator::Implicit).is_none());
        assert_eq!(oracle.calls.get(), 2);

        // A new bind starts from nothing.
        let mut reactions = Reactions::new(&oracle, &policy);
        reactions.find(&1, &2, Operator::Implicit);
        assert_eq!(oracle.calls.get(), 3);
    }

    #[test]
    fn named_operators_are_never_cached() {
        let oracle = counting();
        let policy = CachePolicy::PerBind;
        let mut reactions = Reactions::new(&oracle, &policy);
        reactions.find(&1, &2, Tag::Div.into());
        reactions.find(&1, &2, Tag::Div.into());
        assert_eq!(oracle.calls.get(), 2);
    }

    #[test]
    fn shared_memo_outlives_a_bind() {
        let oracle = counting();
        let shared = Arc::new(SharedReactions::new());
        let policy = CachePolicy::Shared(shared.clone());
        Reactions::new(&oracle, &policy).find(&1, &2, Operator::Implicit);
        Reactions::new(&oracle, &policy).find(&1, &2, Operator::Implicit);
        assert_eq!(oracle.calls.get(), 1);
        assert_eq!(shared.len(), 1);
        shared.clear();
        assert!(shared.is_empty());
    }
}
