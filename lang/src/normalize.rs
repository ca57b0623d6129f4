//! Left association of implicit products.
//!
//! A product `a ⊗ (b ⊗ c)` is rotated to `(a ⊗ b) ⊗ c` wherever both new
//! pairs react and the root keeps its type. Nodes under a written operator
//! keep their grouping.
//!
//! Leftmost-first search only builds `a ⊗ (b ⊗ c)` when `a ⊗ b` could not
//! lead to the same result, so with an oracle that answers from the two
//! types alone a bound tree comes out unchanged. `Binder::left_associate`
//! applies the pass to trees a host grouped itself.

use crate::cache::Reactions;
use crate::host::{Host, Joined};
use crate::operator::Operator;
use crate::oracle::ReactionOracle;
use crate::prelude::*;
use crate::reaction::Reaction;

pub(crate) struct Normalizer<'n, 'a, H, O: ReactionOracle> {
    host: &'n H,
    reactions: &'n mut Reactions<'a, O>,
}

impl<'n, 'a, H, O> Normalizer<'n, 'a, H, O>
where
    H: Host,
    O: ReactionOracle<Type = H::Type>,
{
    pub(crate) fn new(host: &'n H, reactions: &'n mut Reactions<'a, O>) -> Self {
        Self { host, reactions }
    }

    pub(crate) fn normalize(&mut self, expr: H::Expr) -> H::Expr {
        profile_method!(normalize);

        let joined = match self.host.split(expr) {
            Ok(joined) => joined,
            Err(leaf) => return leaf,
        };
        let lhs = self.normalize(joined.lhs);
        let rhs = self.normalize(joined.rhs);
        if joined.operator.is_implicit() {
            self.left_associate(lhs, rhs, joined.reaction)
        } else {
            self.join(lhs, rhs, joined.operator, &joined.reaction)
        }
    }

    /// Builds `lhs ⊗ rhs`. When `rhs` is itself an implicit product `b ⊗ c`
    /// the result is `(lhs ⊗ b) ⊗ c` if that typechecks to the same type.
    ///
    /// Every recursive call has a strictly smaller right side, so this ends.
    fn left_associate(
        &mut self,
        lhs: H::Expr,
        rhs: H::Expr,
        reaction: Reaction<H::Type>,
    ) -> H::Expr {
        let inner = match self.host.split(rhs) {
            Ok(inner) if inner.operator.is_implicit() => inner,
            Ok(inner) => {
                let rhs = self.rejoin(inner);
                return self.join(lhs, rhs, Operator::Implicit, &reaction);
            }
            Err(rhs) => return self.join(lhs, rhs, Operator::Implicit, &reaction),
        };

        let a = self.host.type_of(&lhs);
        let b = self.host.type_of(&inner.lhs);
        let c = self.host.type_of(&inner.rhs);
        let rotated = self
            .reactions
            .find(&a, &b, Operator::Implicit)
            .and_then(|ab| {
                let abc = self
                    .reactions
                    .find(&ab.result_type, &c, Operator::Implicit)?;
                Some((ab, abc))
            })
            .filter(|(_, abc)| abc.result_type == reaction.result_type);

        match rotated {
            Some((ab, abc)) => {
                tracing::debug!(?a, ?b, ?c, "re-associating implicit product");
                let ab = self.left_associate(lhs, inner.lhs, ab);
                self.left_associate(ab, inner.rhs, abc)
            }
            None => {
                let rhs = self.rejoin(inner);
                self.join(lhs, rhs, Operator::Implicit, &reaction)
            }
        }
    }

    fn rejoin(&self, joined: Joined<H::Expr, H::Type>) -> H::Expr {
        self.join(joined.lhs, joined.rhs, joined.operator, &joined.reaction)
    }

    fn join(
        &self,
        lhs: H::Expr,
        rhs: H::Expr,
        operator: Operator,
        reaction: &Reaction<H::Type>,
    ) -> H::Expr {
        use crate::chain::Operand;
        self.host
            .combine(&Operand::implicit(lhs), &Operand::new(rhs, operator), reaction)
    }
}
