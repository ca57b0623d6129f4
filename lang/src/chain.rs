use crate::operator::{Operator, Tag};
use crate::prelude::*;
use std::ops::Index;

/// One position in an operand chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand<E> {
    pub expr: E,
    /// The operator joining this operand to its left neighbour. Meaningless
    /// on the first operand of a chain.
    pub operator_left: Operator,
}

impl<E> Operand<E> {
    pub fn new(expr: E, operator_left: impl Into<Operator>) -> Self {
        Self {
            expr,
            operator_left: operator_left.into(),
        }
    }

    pub fn implicit(expr: E) -> Self {
        Self::new(expr, Operator::Implicit)
    }

    pub fn map<F>(self, f: impl FnOnce(E) -> F) -> Operand<F> {
        Operand {
            expr: f(self.expr),
            operator_left: self.operator_left,
        }
    }
}

/// The flattened operands of an expression whose grouping is not yet known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperandChain<E> {
    operands: Vec<Operand<E>>,
}

impl<E> OperandChain<E> {
    pub fn new() -> Self {
        Self {
            operands: Vec::new(),
        }
    }

    pub fn push(&mut self, operand: Operand<E>) {
        self.operands.push(operand);
    }

    pub fn len(&self) -> usize {
        self.operands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operands.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Operand<E>> {
        self.operands.iter()
    }

    pub fn into_operands(self) -> Vec<Operand<E>> {
        self.operands
    }

    pub fn try_map<F, Err>(
        self,
        mut f: impl FnMut(E) -> Result<F, Err>,
    ) -> Result<OperandChain<F>, Err> {
        let operands = self
            .operands
            .into_iter()
            .map(|operand| {
                let Operand {
                    expr,
                    operator_left,
                } = operand;
                f(expr).map(|expr| Operand {
                    expr,
                    operator_left,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OperandChain { operands })
    }

    /// A copy with the pair at `left` and `left + 1` replaced by `combined`.
    pub(crate) fn reduce(&self, left: usize, combined: Operand<E>) -> Self
    where
        E: Clone,
    {
        let mut operands = Vec::with_capacity(self.operands.len() - 1);
        operands.extend_from_slice(&self.operands[..left]);
        operands.push(combined);
        operands.extend_from_slice(&self.operands[left + 2..]);
        Self { operands }
    }
}

impl<E> Default for OperandChain<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Index<usize> for OperandChain<E> {
    type Output = Operand<E>;

    fn index(&self, index: usize) -> &Operand<E> {
        &self.operands[index]
    }
}

impl<E> From<Vec<Operand<E>>> for OperandChain<E> {
    fn from(operands: Vec<Operand<E>>) -> Self {
        Self { operands }
    }
}

impl<E> std::iter::FromIterator<Operand<E>> for OperandChain<E> {
    fn from_iter<I: IntoIterator<Item = Operand<E>>>(iter: I) -> Self {
        Self {
            operands: iter.into_iter().collect(),
        }
    }
}

impl<E> IntoIterator for OperandChain<E> {
    type Item = Operand<E>;
    type IntoIter = std::vec::IntoIter<Operand<E>>;

    fn into_iter(self) -> Self::IntoIter {
        self.operands.into_iter()
    }
}

/// A nested expression as a parser groups it, before binding decides the
/// real grouping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Syntax<A> {
    Atom(A),
    /// Two expressions written next to each other.
    Juxtapose(Box<Syntax<A>>, Box<Syntax<A>>),
    Binary(Box<Syntax<A>>, Tag, Box<Syntax<A>>),
}

enum Visit<A> {
    Syntax(Syntax<A>),
    Mark(Tag),
}

impl<A> Syntax<A> {
    pub fn juxtapose(lhs: Syntax<A>, rhs: Syntax<A>) -> Self {
        Syntax::Juxtapose(Box::new(lhs), Box::new(rhs))
    }

    pub fn binary(lhs: Syntax<A>, tag: Tag, rhs: Syntax<A>) -> Self {
        Syntax::Binary(Box::new(lhs), tag, Box::new(rhs))
    }

    /// Lists the atoms left to right. The first atom on the right side of a
    /// tagged binary carries that tag; every other atom is implicit.
    pub fn flatten(self) -> OperandChain<A> {
        profile_method!(flatten);

        let mut chain = OperandChain::new();
        let mut pending = Operator::Implicit;

        // Security: Uses a visit queue to avoid stack overflow
        let mut queue = vec![Visit::Syntax(self)];
        while let Some(next) = queue.pop() {
            match next {
                Visit::Syntax(Syntax::Atom(atom)) => {
                    chain.push(Operand::new(atom, pending));
                    pending = Operator::Implicit;
                }
                Visit::Syntax(Syntax::Juxtapose(lhs, rhs)) => {
                    queue.push(Visit::Syntax(*rhs));
                    queue.push(Visit::Syntax(*lhs));
                }
                Visit::Syntax(Syntax::Binary(lhs, tag, rhs)) => {
                    queue.push(Visit::Syntax(*rhs));
                    queue.push(Visit::Mark(tag));
                    queue.push(Visit::Syntax(*lhs));
                }
                Visit::Mark(tag) => pending = Operator::Named(tag),
            }
        }
        chain
    }
}
