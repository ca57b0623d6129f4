//! Gives meaning to flat chains of operands whose grouping no precedence
//! table can decide. `5 mi / hr` binds as `5 ⊗ (mi / hr)` because the types
//! say so: each adjacent pair is asked whether it reacts, and the first
//! grouping that reduces the whole chain wins.

#[macro_use]
extern crate lazy_static;

mod cache;
mod chain;
mod engine;
mod hierarchy;
mod host;
mod normalize;
pub mod notation;
mod operator;
mod oracle;
mod reaction;
mod repeat;
mod tree;
mod universe;

pub(crate) mod prelude {
    pub use firestorm::{profile_fn, profile_method};
}

pub use cache::{CachePolicy, SharedReactions};
pub use chain::{Operand, OperandChain, Syntax};
pub use engine::{Binder, BindingResult, NoReaction};
pub use hierarchy::{Capability, Param, Returns, TypeHierarchy};
pub use host::{Host, Joined};
pub use notation::{Atom, NotationError};
pub use operator::{Operation, Operator, Tag, COMPARE_TO, COMPARE_TO_WITH, POSTFIX_BIND, PREFIX_BIND};
pub use oracle::{HierarchyOracle, ReactionOracle};
pub use reaction::{MethodRef, Reaction};
pub use tree::{Expr, LeafError, TreeHost};
pub use universe::{Kind, ModelError, TypeId, TypeUniverse};

#[cfg(test)]
mod tests;
