//! The host's type model, as seen by the reaction lookup.

use std::fmt::Debug;
use std::hash::Hash;

/// A declared parameter of a capability method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Param<T> {
    Exact(T),
    /// A type variable. Any argument that has `bound` among its supertypes
    /// is accepted, but only when matching by assignability.
    Var { bound: T },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Returns<T> {
    Type(T),
    /// The method returns its type variable, instantiated with the
    /// argument's type.
    Var,
}

/// A member method on a type that can act as a reaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capability<T> {
    pub name: String,
    pub params: Vec<Param<T>>,
    pub returns: Returns<T>,
    /// Compiler-generated members (bridges and the like) never react.
    pub synthetic: bool,
}

impl<T> Capability<T> {
    pub fn new(name: impl Into<String>, params: Vec<Param<T>>, returns: Returns<T>) -> Self {
        Self {
            name: name.into(),
            params,
            returns,
            synthetic: false,
        }
    }

    /// The type produced when called with `argument`.
    pub fn return_type(&self, argument: &T) -> T
    where
        T: Clone,
    {
        match &self.returns {
            Returns::Type(ty) => ty.clone(),
            Returns::Var => argument.clone(),
        }
    }
}

/// Nominal type hierarchy walked when looking for reactions.
///
/// Implementations must be acyclic: no type may be its own supertype.
pub trait TypeHierarchy {
    type Type: Clone + Eq + Hash + Debug;

    /// Whether `ty` has members at all. Primitive types do not, so nothing
    /// is ever looked up on them.
    fn is_declared(&self, ty: &Self::Type) -> bool;

    fn superclass(&self, ty: &Self::Type) -> Option<Self::Type>;

    fn interfaces(&self, ty: &Self::Type) -> &[Self::Type];

    /// Methods declared directly on `ty`, in declaration order.
    fn capabilities(&self, ty: &Self::Type) -> &[Capability<Self::Type>];

    /// The result type of a relational comparison resolved through
    /// `compareTo`. When `None`, that fallback is not attempted.
    fn comparison_type(&self) -> Option<Self::Type> {
        None
    }

    fn is_assignable(&self, from: &Self::Type, to: &Self::Type) -> bool {
        self.is_subtype(from, to)
    }

    /// Whether `to` is `from` or one of its transitive supertypes.
    fn is_subtype(&self, from: &Self::Type, to: &Self::Type) -> bool {
        let mut queue = vec![from.clone()];
        while let Some(next) = queue.pop() {
            if &next == to {
                return true;
            }
            queue.extend(self.superclass(&next));
            queue.extend(self.interfaces(&next).iter().cloned());
        }
        false
    }
}
