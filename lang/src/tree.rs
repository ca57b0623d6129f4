//! A plain expression tree over a [`TypeUniverse`], the host used by the
//! command-line driver and the scenario tests.

use crate::chain::{Operand, OperandChain};
use crate::host::{Host, Joined};
use crate::notation::Atom;
use crate::operator::{Operator, Tag};
use crate::prelude::*;
use crate::reaction::Reaction;
use crate::repeat::repeat;
use crate::universe::{TypeId, TypeUniverse};
use std::fmt::{self, Write as _};
use std::error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expr {
    Leaf {
        text: String,
        ty: TypeId,
    },
    Binary {
        lhs: Box<Expr>,
        rhs: Box<Expr>,
        operator: Operator,
        reaction: Reaction<TypeId>,
    },
}

impl Expr {
    pub fn ty(&self) -> TypeId {
        match self {
            Expr::Leaf { ty, .. } => *ty,
            Expr::Binary { reaction, .. } => reaction.result_type,
        }
    }

    /// The operator tag this node is built with. `None` for leaves.
    pub fn tag(&self) -> Option<Tag> {
        match self {
            Expr::Leaf { .. } => None,
            Expr::Binary { operator, .. } => Some(operator.effective_tag()),
        }
    }

    /// Number of leaves.
    pub fn width(&self) -> usize {
        let mut count = 0;
        let mut queue = vec![self];
        while let Some(next) = queue.pop() {
            match next {
                Expr::Leaf { .. } => count += 1,
                Expr::Binary { lhs, rhs, .. } => {
                    queue.push(rhs);
                    queue.push(lhs);
                }
            }
        }
        count
    }

    /// One line per node, children indented under their parent, with the
    /// type of each node and the method behind each join.
    pub fn outline(&self, universe: &TypeUniverse) -> String {
        profile_method!(outline);

        let mut out = String::new();
        let mut queue = vec![(0, self)];
        while let Some((depth, next)) = queue.pop() {
            // Writing to a String does not fail
            let _ = match next {
                Expr::Leaf { text, ty } => writeln!(
                    out,
                    "{}{} : {}",
                    repeat(depth, "  "),
                    text,
                    universe.name(*ty)
                ),
                Expr::Binary {
                    lhs,
                    rhs,
                    operator,
                    reaction,
                } => {
                    queue.push((depth + 1, rhs));
                    queue.push((depth + 1, lhs));
                    writeln!(
                        out,
                        "{}{} : {}  [{}.{}{}]",
                        repeat(depth, "  "),
                        operator,
                        universe.name(reaction.result_type),
                        universe.name(reaction.callable.owner),
                        reaction.callable.name,
                        if reaction.swapped { ", swapped" } else { "" }
                    )
                }
            };
        }
        out
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Leaf { text, .. } => f.write_str(text),
            Expr::Binary {
                lhs, rhs, operator, ..
            } => write!(f, "({} {} {})", lhs, operator, rhs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafError {
    /// A number was written without a type and the universe has no
    /// literal type.
    UntypedNumber(String),
    UnknownType { text: String, name: String },
}

impl fmt::Display for LeafError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LeafError::UntypedNumber(text) => write!(
                f,
                "Number \"{}\" has no type and no literal type is declared",
                text
            ),
            LeafError::UnknownType { text, name } => {
                write!(f, "Operand \"{}\" names unknown type \"{}\"", text, name)
            }
        }
    }
}

impl error::Error for LeafError {}

/// Binds [`Expr`] trees whose types come from a [`TypeUniverse`].
pub struct TreeHost<'u> {
    universe: &'u TypeUniverse,
}

impl<'u> TreeHost<'u> {
    pub fn new(universe: &'u TypeUniverse) -> Self {
        Self { universe }
    }

    pub fn universe(&self) -> &'u TypeUniverse {
        self.universe
    }

    /// Gives an atom its type: the annotated one, the literal type for a
    /// bare number, or else the type the atom is named after.
    pub fn leaf(&self, atom: Atom) -> Result<Expr, LeafError> {
        let ty = match (&atom.ty, atom.is_number()) {
            (Some(name), _) => self.lookup(&atom.text, name)?,
            (None, true) => self
                .universe
                .literal_type()
                .ok_or_else(|| LeafError::UntypedNumber(atom.text.clone()))?,
            (None, false) => self.lookup(&atom.text, &atom.text)?,
        };
        Ok(Expr::Leaf {
            text: atom.text,
            ty,
        })
    }

    pub fn resolve(&self, chain: OperandChain<Atom>) -> Result<OperandChain<Expr>, LeafError> {
        profile_method!(resolve);

        chain.try_map(|atom| self.leaf(atom))
    }

    fn lookup(&self, text: &str, name: &str) -> Result<TypeId, LeafError> {
        self.universe
            .id(name)
            .ok_or_else(|| LeafError::UnknownType {
                text: text.to_string(),
                name: name.to_string(),
            })
    }
}

impl Host for TreeHost<'_> {
    type Expr = Expr;
    type Type = TypeId;

    fn type_of(&self, expr: &Expr) -> TypeId {
        expr.ty()
    }

    fn combine(
        &self,
        left: &Operand<Expr>,
        right: &Operand<Expr>,
        reaction: &Reaction<TypeId>,
    ) -> Expr {
        Expr::Binary {
            lhs: Box::new(left.expr.clone()),
            rhs: Box::new(right.expr.clone()),
            operator: right.operator_left,
            reaction: reaction.clone(),
        }
    }

    fn split(&self, expr: Expr) -> Result<Joined<Expr, TypeId>, Expr> {
        match expr {
            Expr::Binary {
                lhs,
                rhs,
                operator,
                reaction,
            } => Ok(Joined {
                lhs: *lhs,
                rhs: *rhs,
                operator,
                reaction,
            }),
            leaf => Err(leaf),
        }
    }
}
