use std::fmt;

/// Method looked up for the whole equality/ordering family.
pub const COMPARE_TO_WITH: &str = "compareToWith";
/// Single-argument ordering method tried when `compareToWith` is missing.
pub const COMPARE_TO: &str = "compareTo";
pub const PREFIX_BIND: &str = "prefixBind";
pub const POSTFIX_BIND: &str = "postfixBind";

macro_rules! tags {
    ($($Name:ident: $symbol:literal $(=> $method:literal)?,)+) => {
        /// An explicit binary operator written between two operands.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum Tag {
            $(
                $Name,
            )+
        }

        impl Tag {
            pub const ALL: &'static [Tag] = &[$(Tag::$Name,)+];

            pub fn symbol(self) -> &'static str {
                match self {
                    $(Self::$Name => $symbol,)+
                }
            }

            fn arithmetic_method(self) -> Option<&'static str> {
                match self {
                    $(Self::$Name => tags!(@method $($method)?),)+
                }
            }
        }
    };
    (@method $method:literal) => { Some($method) };
    (@method) => { None };
}

tags![
    Add: "+" => "plus",
    Sub: "-" => "minus",
    Mul: "*" => "times",
    Div: "/" => "div",
    Rem: "%" => "rem",
    BitAnd: "&" => "and",
    BitOr: "|" => "or",
    BitXor: "^" => "xor",
    Shl: "<<" => "shl",
    Shr: ">>" => "shr",
    Ushr: ">>>" => "ushr",
    Eq: "==",
    Ne: "!=",
    Lt: "<",
    Le: "<=",
    Gt: ">",
    Ge: ">=",
];

/// The capability method an explicit tag is resolved through.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Operation {
    pub name: &'static str,
    pub arity: usize,
}

impl Tag {
    pub fn operation(self) -> Operation {
        match self.arithmetic_method() {
            Some(name) => Operation { name, arity: 1 },
            // compareToWith(other, operator)
            None => Operation {
                name: COMPARE_TO_WITH,
                arity: 2,
            },
        }
    }

    pub fn is_commutative(self) -> bool {
        use Tag::*;
        matches!(self, Add | Mul | BitOr | BitXor | BitAnd | Eq | Ne)
    }

    pub fn is_comparison(self) -> bool {
        use Tag::*;
        matches!(self, Eq | Ne | Lt | Le | Gt | Ge)
    }

    pub fn is_relational(self) -> bool {
        use Tag::*;
        matches!(self, Lt | Le | Gt | Ge)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// How an operand relates to its left neighbour.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Nothing written between the operands. Whether and how they bind
    /// is discovered through the prefix/postfix binder methods.
    Implicit,
    Named(Tag),
}

impl Operator {
    pub fn tag(self) -> Option<Tag> {
        match self {
            Self::Implicit => None,
            Self::Named(tag) => Some(tag),
        }
    }

    pub fn is_implicit(self) -> bool {
        self == Self::Implicit
    }

    /// The tag a combined node is built with. Implicit joins use `*`
    /// as a multiply-like placeholder.
    pub fn effective_tag(self) -> Tag {
        self.tag().unwrap_or(Tag::Mul)
    }
}

impl Default for Operator {
    fn default() -> Self {
        Self::Implicit
    }
}

impl From<Tag> for Operator {
    #[inline(always)]
    fn from(tag: Tag) -> Self {
        Self::Named(tag)
    }
}

impl From<Option<Tag>> for Operator {
    fn from(tag: Option<Tag>) -> Self {
        tag.map_or(Self::Implicit, Self::Named)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Implicit => f.write_str("⊗"),
            Self::Named(tag) => tag.fmt(f),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_tags_take_one_argument() {
        assert_eq!(
            Tag::Div.operation(),
            Operation {
                name: "div",
                arity: 1
            }
        );
        assert_eq!(Tag::Ushr.operation().name, "ushr");
    }

    #[test]
    fn comparison_family_shares_one_method() {
        for tag in Tag::ALL.iter().copied().filter(|t| t.is_comparison()) {
            assert_eq!(
                tag.operation(),
                Operation {
                    name: COMPARE_TO_WITH,
                    arity: 2
                }
            );
        }
    }

    #[test]
    fn commutativity() {
        assert!(Tag::Add.is_commutative());
        assert!(Tag::Ne.is_commutative());
        assert!(!Tag::Sub.is_commutative());
        assert!(!Tag::Lt.is_commutative());
    }

    #[test]
    fn implicit_uses_multiply_placeholder() {
        assert_eq!(Operator::Implicit.effective_tag(), Tag::Mul);
        assert_eq!(Operator::Named(Tag::Div).effective_tag(), Tag::Div);
        assert_eq!(Operator::from(None), Operator::Implicit);
    }
}
