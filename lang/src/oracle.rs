use crate::hierarchy::{Param, TypeHierarchy};
use crate::operator::{Operator, Tag, COMPARE_TO, POSTFIX_BIND, PREFIX_BIND};
use crate::prelude::*;
use crate::reaction::{MethodRef, Reaction};
use std::fmt::Debug;
use std::hash::Hash;

/// Answers whether two operand types react, optionally under an operator.
pub trait ReactionOracle {
    type Type: Clone + Eq + Hash + Debug;

    fn find(
        &self,
        left: &Self::Type,
        right: &Self::Type,
        operator: Operator,
    ) -> Option<Reaction<Self::Type>>;
}

impl<O: ReactionOracle + ?Sized> ReactionOracle for &O {
    type Type = O::Type;

    #[inline]
    fn find(
        &self,
        left: &Self::Type,
        right: &Self::Type,
        operator: Operator,
    ) -> Option<Reaction<Self::Type>> {
        (**self).find(left, right, operator)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Matching {
    Exact,
    Assignable,
}

struct Found<T> {
    owner: T,
    slot: usize,
    name: &'static str,
    result_type: T,
}

impl<T> Found<T> {
    fn into_reaction(self, swapped: bool) -> Reaction<T> {
        Reaction {
            callable: MethodRef {
                owner: self.owner,
                slot: self.slot,
                name: self.name,
            },
            swapped,
            result_type: self.result_type,
        }
    }
}

/// Looks reactions up as capability methods on the operands' declared
/// type hierarchy.
pub struct HierarchyOracle<'h, H> {
    hierarchy: &'h H,
}

impl<'h, H: TypeHierarchy> HierarchyOracle<'h, H> {
    pub fn new(hierarchy: &'h H) -> Self {
        Self { hierarchy }
    }

    fn resolve_operator(
        &self,
        left: &H::Type,
        right: &H::Type,
        tag: Tag,
    ) -> Option<Reaction<H::Type>> {
        if let Some(found) = self.resolve_tag(left, right, tag) {
            return Some(found.into_reaction(false));
        }
        if tag.is_commutative() {
            return self
                .resolve_tag(right, left, tag)
                .map(|found| found.into_reaction(true));
        }
        None
    }

    fn resolve_tag(&self, left: &H::Type, right: &H::Type, tag: Tag) -> Option<Found<H::Type>> {
        let operation = tag.operation();
        let found = self.method(left, right, operation.name, operation.arity);
        if found.is_some() || !tag.is_relational() {
            return found;
        }

        // Ordering operators also work on anything with a plain compareTo.
        let truth = self.hierarchy.comparison_type()?;
        self.method(left, right, COMPARE_TO, 1).map(|found| Found {
            result_type: truth,
            ..found
        })
    }

    fn resolve_binder(&self, left: &H::Type, right: &H::Type) -> Option<Reaction<H::Type>> {
        if let Some(found) = self.method(left, right, PREFIX_BIND, 1) {
            return Some(found.into_reaction(false));
        }
        self.method(right, left, POSTFIX_BIND, 1)
            .map(|found| found.into_reaction(true))
    }

    /// Exact parameter matches anywhere in the hierarchy win over
    /// assignable ones, even shallower assignable ones.
    fn method(
        &self,
        receiver: &H::Type,
        argument: &H::Type,
        name: &'static str,
        arity: usize,
    ) -> Option<Found<H::Type>> {
        profile_method!(method);

        if !self.hierarchy.is_declared(receiver) {
            return None;
        }
        self.walk(receiver, argument, name, arity, Matching::Exact)
            .or_else(|| self.walk(receiver, argument, name, arity, Matching::Assignable))
    }

    // Depth first: own members, then the superclass chain, then interfaces.
    fn walk(
        &self,
        owner: &H::Type,
        argument: &H::Type,
        name: &'static str,
        arity: usize,
        matching: Matching,
    ) -> Option<Found<H::Type>> {
        let capabilities = self.hierarchy.capabilities(owner);
        for (slot, capability) in capabilities.iter().enumerate() {
            if capability.synthetic || capability.params.len() != arity || capability.name != name {
                continue;
            }
            let accepted = capability
                .params
                .first()
                .map_or(true, |param| self.accepts(param, argument, matching));
            if accepted {
                return Some(Found {
                    owner: owner.clone(),
                    slot,
                    name,
                    result_type: capability.return_type(argument),
                });
            }
        }

        if let Some(superclass) = self.hierarchy.superclass(owner) {
            if let Some(found) = self.walk(&superclass, argument, name, arity, matching) {
                return Some(found);
            }
        }

        self.hierarchy
            .interfaces(owner)
            .iter()
            .find_map(|iface| self.walk(iface, argument, name, arity, matching))
    }

    fn accepts(&self, param: &Param<H::Type>, argument: &H::Type, matching: Matching) -> bool {
        match (matching, param) {
            (Matching::Exact, Param::Exact(ty)) => ty == argument,
            (Matching::Exact, Param::Var { .. }) => false,
            (Matching::Assignable, Param::Exact(ty)) => self.hierarchy.is_assignable(argument, ty),
            (Matching::Assignable, Param::Var { bound }) => {
                self.hierarchy.is_subtype(argument, bound)
            }
        }
    }
}

impl<H: TypeHierarchy> ReactionOracle for HierarchyOracle<'_, H> {
    type Type = H::Type;

    fn find(
        &self,
        left: &H::Type,
        right: &H::Type,
        operator: Operator,
    ) -> Option<Reaction<H::Type>> {
        profile_method!(find);

        match operator {
            Operator::Named(tag) => self.resolve_operator(left, right, tag),
            Operator::Implicit => self.resolve_binder(left, right),
        }
    }
}
