//! A nominal type registry that can stand in for a host's type system.

use crate::hierarchy::{Capability, Param, Returns, TypeHierarchy};
use crate::prelude::*;
use itertools::Itertools as _;
use serde::Deserialize;
use std::collections::HashMap;
use std::{error, fmt};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Class,
    Interface,
    /// Carries no members, so never the receiver of a reaction.
    Primitive,
}

impl Default for Kind {
    fn default() -> Self {
        Kind::Class
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct UniverseDecl {
    #[serde(default)]
    literal: Option<String>,
    #[serde(default)]
    comparison: Option<String>,
    types: Vec<TypeDecl>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct TypeDecl {
    name: String,
    #[serde(default)]
    kind: Kind,
    #[serde(default)]
    superclass: Option<String>,
    #[serde(default)]
    interfaces: Vec<String>,
    #[serde(default)]
    methods: Vec<MethodDecl>,
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct MethodDecl {
    name: String,
    #[serde(default)]
    params: Vec<ParamDecl>,
    returns: ReturnDecl,
    #[serde(default)]
    synthetic: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ParamDecl {
    Type(String),
    Var { var: String, bound: String },
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ReturnDecl {
    Type(String),
    Var { var: String },
}

#[derive(Debug)]
pub enum ModelError {
    Json(serde_json::Error),
    DuplicateType(String),
    UnknownType { name: String, referenced_by: String },
    UnboundVariable { method: String, var: String },
    CyclicHierarchy(Vec<String>),
}

impl fmt::Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        profile_method!(fmt);

        writeln!(f, "Failed to load type universe.")?;
        use ModelError::*;
        match self {
            Json(inner) => write!(f, "Malformed JSON: {}", inner),
            DuplicateType(name) => write!(f, "Type \"{}\" is declared more than once", name),
            UnknownType {
                name,
                referenced_by,
            } => write!(
                f,
                "Unknown type \"{}\" referenced by \"{}\"",
                name, referenced_by
            ),
            UnboundVariable { method, var } => write!(
                f,
                "Method \"{}\" returns type variable \"{}\" which none of its parameters declare",
                method, var
            ),
            CyclicHierarchy(path) => write!(f, "Cyclic type hierarchy: {}", path.iter().join(" -> ")),
        }
    }
}

impl error::Error for ModelError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            ModelError::Json(inner) => Some(inner),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for ModelError {
    fn from(inner: serde_json::Error) -> Self {
        ModelError::Json(inner)
    }
}

struct Entry {
    name: String,
    kind: Kind,
    superclass: Option<TypeId>,
    interfaces: Vec<TypeId>,
    capabilities: Vec<Capability<TypeId>>,
}

#[derive(Default)]
pub struct TypeUniverse {
    entries: Vec<Entry>,
    by_name: HashMap<String, TypeId>,
    literal: Option<TypeId>,
    comparison: Option<TypeId>,
}

impl TypeUniverse {
    pub fn from_json(text: &str) -> Result<Self, ModelError> {
        profile_fn!(from_json);

        let decl: UniverseDecl = serde_json::from_str(text)?;
        Self::from_decl(decl)
    }

    fn from_decl(decl: UniverseDecl) -> Result<Self, ModelError> {
        let mut universe = TypeUniverse::default();

        // Names first, so declarations may refer to types declared later.
        for (index, ty) in decl.types.iter().enumerate() {
            let id = TypeId(index as u32);
            if universe.by_name.insert(ty.name.clone(), id).is_some() {
                return Err(ModelError::DuplicateType(ty.name.clone()));
            }
        }

        for ty in decl.types.iter() {
            let lookup = |name: &str| universe.lookup(name, &ty.name);
            let superclass = ty.superclass.as_deref().map(lookup).transpose()?;
            let interfaces = ty
                .interfaces
                .iter()
                .map(|name| lookup(name))
                .collect::<Result<Vec<_>, _>>()?;
            let capabilities = ty
                .methods
                .iter()
                .map(|method| universe.capability(&ty.name, method))
                .collect::<Result<Vec<_>, _>>()?;
            universe.entries.push(Entry {
                name: ty.name.clone(),
                kind: ty.kind,
                superclass,
                interfaces,
                capabilities,
            });
        }

        universe.literal = decl
            .literal
            .as_deref()
            .map(|name| universe.lookup(name, "literal"))
            .transpose()?;
        universe.comparison = decl
            .comparison
            .as_deref()
            .map(|name| universe.lookup(name, "comparison"))
            .transpose()?;

        universe.check_acyclic()?;
        Ok(universe)
    }

    fn lookup(&self, name: &str, referenced_by: &str) -> Result<TypeId, ModelError> {
        self.id(name).ok_or_else(|| ModelError::UnknownType {
            name: name.to_owned(),
            referenced_by: referenced_by.to_owned(),
        })
    }

    fn capability(&self, owner: &str, method: &MethodDecl) -> Result<Capability<TypeId>, ModelError> {
        let qualified = format!("{}.{}", owner, method.name);
        let params = method
            .params
            .iter()
            .map(|param| match param {
                ParamDecl::Type(name) => self.lookup(name, &qualified).map(Param::Exact),
                ParamDecl::Var { bound, .. } => self
                    .lookup(bound, &qualified)
                    .map(|bound| Param::Var { bound }),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let returns = match &method.returns {
            ReturnDecl::Type(name) => Returns::Type(self.lookup(name, &qualified)?),
            ReturnDecl::Var { var } => {
                // Only the first parameter receives the other operand.
                let bound = matches!(method.params.first(), Some(ParamDecl::Var { var: v, .. }) if v == var);
                if !bound {
                    return Err(ModelError::UnboundVariable {
                        method: qualified,
                        var: var.clone(),
                    });
                }
                Returns::Var
            }
        };

        Ok(Capability {
            name: method.name.clone(),
            params,
            returns,
            synthetic: method.synthetic,
        })
    }

    fn check_acyclic(&self) -> Result<(), ModelError> {
        #[derive(Copy, Clone, PartialEq)]
        enum Mark {
            Unvisited,
            Active,
            Done,
        }

        fn visit(
            universe: &TypeUniverse,
            id: TypeId,
            marks: &mut [Mark],
            path: &mut Vec<TypeId>,
        ) -> Result<(), ModelError> {
            match marks[id.index()] {
                Mark::Done => return Ok(()),
                Mark::Active => {
                    let start = path.iter().position(|p| *p == id).unwrap_or(0);
                    let mut cycle: Vec<String> =
                        path[start..].iter().map(|p| universe.name(*p).to_owned()).collect();
                    cycle.push(universe.name(id).to_owned());
                    return Err(ModelError::CyclicHierarchy(cycle));
                }
                Mark::Unvisited => {}
            }
            marks[id.index()] = Mark::Active;
            path.push(id);
            let entry = &universe.entries[id.index()];
            for next in entry.superclass.iter().chain(entry.interfaces.iter()) {
                visit(universe, *next, marks, path)?;
            }
            path.pop();
            marks[id.index()] = Mark::Done;
            Ok(())
        }

        let mut marks = vec![Mark::Unvisited; self.entries.len()];
        let mut path = Vec::new();
        for index in 0..self.entries.len() {
            visit(self, TypeId(index as u32), &mut marks, &mut path)?;
        }
        Ok(())
    }

    pub fn id(&self, name: &str) -> Option<TypeId> {
        self.by_name.get(name).copied()
    }

    /// Panics if `id` came from another universe.
    pub fn name(&self, id: TypeId) -> &str {
        &self.entries[id.index()].name
    }

    pub fn kind(&self, id: TypeId) -> Kind {
        self.entries[id.index()].kind
    }

    /// The type given to number literals written without one.
    pub fn literal_type(&self) -> Option<TypeId> {
        self.literal
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl TypeHierarchy for TypeUniverse {
    type Type = TypeId;

    fn is_declared(&self, ty: &TypeId) -> bool {
        self.kind(*ty) != Kind::Primitive
    }

    fn superclass(&self, ty: &TypeId) -> Option<TypeId> {
        self.entries[ty.index()].superclass
    }

    fn interfaces(&self, ty: &TypeId) -> &[TypeId] {
        &self.entries[ty.index()].interfaces
    }

    fn capabilities(&self, ty: &TypeId) -> &[Capability<TypeId>] {
        &self.entries[ty.index()].capabilities
    }

    fn comparison_type(&self) -> Option<TypeId> {
        self.comparison
    }
}
