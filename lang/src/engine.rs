use crate::cache::{CachePolicy, Reactions, SharedReactions};
use crate::chain::{Operand, OperandChain};
use crate::host::Host;
use crate::normalize::Normalizer;
use crate::operator::Operator;
use crate::oracle::ReactionOracle;
use crate::prelude::*;
use crate::reaction::Reaction;
use itertools::Itertools as _;
use std::collections::HashSet;
use std::sync::Arc;
use std::{error, fmt};

/// No grouping of the chain binds. Names the first two operands of the
/// chain as given, wherever the search actually stalled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoReaction<T> {
    pub left: T,
    pub right: T,
}

impl<T> NoReaction<T> {
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> NoReaction<U> {
        NoReaction {
            left: f(self.left),
            right: f(self.right),
        }
    }
}

impl<T: fmt::Display> fmt::Display for NoReaction<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "No reaction defined for types '{}' and '{}'",
            self.left, self.right
        )
    }
}

impl<T: fmt::Display + fmt::Debug> error::Error for NoReaction<T> {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingResult<E, T> {
    Solved(Operand<E>),
    Failed(NoReaction<T>),
}

impl<E, T> BindingResult<E, T> {
    pub fn is_solved(&self) -> bool {
        matches!(self, Self::Solved(_))
    }

    pub fn solved(self) -> Option<Operand<E>> {
        self.into_result().ok()
    }

    pub fn into_result(self) -> Result<Operand<E>, NoReaction<T>> {
        match self {
            Self::Solved(operand) => Ok(operand),
            Self::Failed(failure) => Err(failure),
        }
    }
}

/// What decides whether a chain binds: the type of each operand and the
/// operator written to its left.
type Shape<T> = Vec<(T, Operator)>;

struct Split<T> {
    /// Index of the left operand of the pair.
    left: usize,
    reaction: Reaction<T>,
}

/// Groups operand chains by asking which adjacent operands react.
///
/// The search is leftmost first: the earliest reducible pair is reduced and
/// the shorter chain is solved recursively. Only when that fails entirely is
/// the next reducible pair to its right tried.
///
/// Chains that failed are remembered by shape for the rest of the bind, so
/// the many orders that reduce to the same dead end are explored once.
pub struct Binder<'a, H: Host, O> {
    host: &'a H,
    oracle: &'a O,
    cache: CachePolicy<H::Type>,
    normalize: bool,
}

impl<'a, H, O> Binder<'a, H, O>
where
    H: Host,
    O: ReactionOracle<Type = H::Type>,
{
    pub fn new(host: &'a H, oracle: &'a O) -> Self {
        Self {
            host,
            oracle,
            cache: CachePolicy::PerBind,
            normalize: true,
        }
    }

    /// Remember pure binder reactions across binds instead of per bind.
    pub fn with_shared_cache(mut self, shared: Arc<SharedReactions<H::Type>>) -> Self {
        self.cache = CachePolicy::Shared(shared);
        self
    }

    /// Whether implicit products are re-associated to the left after a
    /// successful bind. On by default.
    pub fn normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }

    /// Panics if `chain` is empty.
    pub fn bind(&self, chain: OperandChain<H::Expr>) -> BindingResult<H::Expr, H::Type> {
        profile_method!(bind);

        assert!(!chain.is_empty(), "cannot bind an empty operand chain");

        if chain.len() == 1 {
            // Panic safety: Length checked above
            let only = chain.into_iter().next().unwrap();
            return BindingResult::Solved(only);
        }

        let blame = NoReaction {
            left: self.host.type_of(&chain[0].expr),
            right: self.host.type_of(&chain[1].expr),
        };

        let mut reactions = Reactions::new(self.oracle, &self.cache);
        let mut dead_ends = HashSet::new();
        match self.search(&chain, &mut reactions, &mut dead_ends, 0) {
            Some(solution) => {
                let solution = if self.normalize {
                    let mut normalizer = Normalizer::new(self.host, &mut reactions);
                    solution.map(|expr| normalizer.normalize(expr))
                } else {
                    solution
                };
                BindingResult::Solved(solution)
            }
            None => {
                tracing::debug!(operands = chain.len(), left = ?blame.left, right = ?blame.right, "no reaction");
                BindingResult::Failed(blame)
            }
        }
    }

    /// Re-associates the implicit products of a tree the host grouped
    /// itself. Trees returned by `bind` already come out this way.
    pub fn left_associate(&self, expr: H::Expr) -> H::Expr {
        let mut reactions = Reactions::new(self.oracle, &self.cache);
        Normalizer::new(self.host, &mut reactions).normalize(expr)
    }

    fn search(
        &self,
        chain: &OperandChain<H::Expr>,
        reactions: &mut Reactions<'_, O>,
        dead_ends: &mut HashSet<Shape<H::Type>>,
        depth: usize,
    ) -> Option<Operand<H::Expr>> {
        if chain.len() == 1 {
            return Some(chain[0].clone());
        }

        let shape = self.shape(chain);
        if dead_ends.contains(&shape) {
            tracing::trace!(depth, operands = chain.len(), "known dead end");
            return None;
        }

        let mut from = 0;
        while let Some(split) = self.next_split(chain, from, reactions) {
            let left = &chain[split.left];
            let right = &chain[split.left + 1];
            let expr = self.host.combine(left, right, &split.reaction);
            // The combined operand relates to its left neighbour the way
            // the pair's left operand did.
            let reduced = chain.reduce(split.left, Operand::new(expr, left.operator_left));

            tracing::debug!(depth, at = split.left, method = split.reaction.callable.name, "reducing pair");
            if let Some(solution) = self.search(&reduced, reactions, dead_ends, depth + 1) {
                return Some(solution);
            }
            tracing::debug!(depth, at = split.left, "backtracking");
            from = split.left + 1;
        }
        dead_ends.insert(shape);
        None
    }

    // The first operator never takes part in a lookup.
    fn shape(&self, chain: &OperandChain<H::Expr>) -> Shape<H::Type> {
        chain
            .iter()
            .enumerate()
            .map(|(index, operand)| {
                let operator = if index == 0 {
                    Operator::Implicit
                } else {
                    operand.operator_left
                };
                (self.host.type_of(&operand.expr), operator)
            })
            .collect()
    }

    fn next_split(
        &self,
        chain: &OperandChain<H::Expr>,
        from: usize,
        reactions: &mut Reactions<'_, O>,
    ) -> Option<Split<H::Type>> {
        chain
            .iter()
            .enumerate()
            .skip(from)
            .tuple_windows()
            .find_map(|((index, left), (_, right))| {
                let reaction = reactions.find(
                    &self.host.type_of(&left.expr),
                    &self.host.type_of(&right.expr),
                    right.operator_left,
                )?;
                Some(Split {
                    left: index,
                    reaction,
                })
            })
    }
}
