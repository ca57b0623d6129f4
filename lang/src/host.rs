use crate::chain::Operand;
use crate::operator::Operator;
use crate::reaction::Reaction;
use std::fmt::Debug;
use std::hash::Hash;

/// A node built by [`Host::combine`], taken apart again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Joined<E, T> {
    pub lhs: E,
    pub rhs: E,
    /// The operator that was written between the two sides.
    pub operator: Operator,
    pub reaction: Reaction<T>,
}

/// The expression representation the binder works on.
pub trait Host {
    type Expr: Clone;
    type Type: Clone + Eq + Hash + Debug;

    fn type_of(&self, expr: &Self::Expr) -> Self::Type;

    /// Materializes the node joining `left` and `right` through `reaction`.
    /// The operator written between them is `right.operator_left`. The
    /// node's type must be the reaction's result type.
    fn combine(
        &self,
        left: &Operand<Self::Expr>,
        right: &Operand<Self::Expr>,
        reaction: &Reaction<Self::Type>,
    ) -> Self::Expr;

    /// Takes a node made by `combine` apart. Anything else is handed back.
    fn split(&self, expr: Self::Expr) -> Result<Joined<Self::Expr, Self::Type>, Self::Expr>;
}
