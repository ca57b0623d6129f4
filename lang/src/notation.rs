//! One-line operand chains such as `5 mi:Length / hr:Time`.
//!
//! Operands are identifiers or numbers with an optional `:Type`. Operands
//! written next to each other are juxtaposed, anything else between them
//! must be an operator symbol. The parse is a naive left fold that the
//! binder regroups after flattening.

use crate::chain::Syntax;
use crate::operator::Tag;
use crate::prelude::*;
use crate::repeat::caret;
use itertools::Itertools as _;
use nom::{
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, digit1, multispace0},
    combinator::{cut, map, opt, recognize},
    error::{context, ErrorKind, ParseError, VerboseError, VerboseErrorKind},
    multi::many0,
    sequence::{pair, preceded, tuple},
    Err as NomErr, IResult,
};
use std::cmp::Reverse;
use std::{error, fmt};

type Res<'a, O> = IResult<&'a str, O, VerboseError<&'a str>>;

lazy_static! {
    /// Longest symbols first, so `>>>` is never read as `>>` then `>`.
    static ref OPERATORS: Vec<(&'static str, Tag)> = Tag::ALL
        .iter()
        .map(|tag| (tag.symbol(), *tag))
        .sorted_by_key(|(symbol, _)| Reverse(symbol.len()))
        .collect();
}

/// An operand as written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Atom {
    pub text: String,
    /// The `:Type` annotation, if any.
    pub ty: Option<String>,
}

impl Atom {
    pub fn is_number(&self) -> bool {
        self.text.starts_with(|c: char| c.is_ascii_digit())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotationError {
    line: String,
    /// In characters, from zero.
    pub column: usize,
    pub expected: &'static str,
}

impl NotationError {
    fn new(source: &str, rest: &str, expected: &'static str) -> Self {
        let offset = source.len() - rest.len();
        Self {
            line: source.to_string(),
            column: source[..offset].chars().count(),
            expected,
        }
    }

    fn from_nom(source: &str, err: NomErr<VerboseError<&str>>) -> Self {
        match err {
            NomErr::Error(e) | NomErr::Failure(e) => {
                let rest = e.errors.first().map_or("", |(input, _)| *input);
                let expected = e
                    .errors
                    .iter()
                    .find_map(|(_, kind)| match kind {
                        VerboseErrorKind::Context(label) => Some(*label),
                        _ => None,
                    })
                    .unwrap_or("operand");
                Self::new(source, rest, expected)
            }
            // Only complete parsers are used
            NomErr::Incomplete(_) => Self::new(source, "", "operand"),
        }
    }
}

impl fmt::Display for NotationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        profile_method!(fmt);

        writeln!(
            f,
            "Expected: {} at (column: {})",
            self.expected, self.column
        )?;
        writeln!(f, "{}", self.line)?;
        write!(f, "{}", caret(self.column))
    }
}

impl error::Error for NotationError {}

fn operator(input: &str) -> Res<Tag> {
    for (symbol, tag) in OPERATORS.iter() {
        if let Some(rest) = input.strip_prefix(*symbol) {
            return Ok((rest, *tag));
        }
    }
    Err(NomErr::Error(VerboseError::from_error_kind(
        input,
        ErrorKind::Tag,
    )))
}

fn number(input: &str) -> Res<&str> {
    recognize(pair(digit1, opt(pair(char('.'), digit1))))(input)
}

fn identifier(input: &str) -> Res<&str> {
    recognize(pair(
        alt((alpha1, tag("_"))),
        many0(alt((alphanumeric1, tag("_")))),
    ))(input)
}

fn atom(input: &str) -> Res<Atom> {
    let (input, text) = context("operand", alt((number, identifier)))(input)?;
    let (input, ty) = opt(preceded(char(':'), cut(context("type name", identifier))))(input)?;
    Ok((
        input,
        Atom {
            text: text.to_string(),
            ty: ty.map(str::to_string),
        },
    ))
}

/// The next operand and what was written before it.
fn link(input: &str) -> Res<(Option<Tag>, Atom)> {
    alt((
        map(
            pair(
                preceded(multispace0, operator),
                cut(preceded(multispace0, atom)),
            ),
            |(tag, atom)| (Some(tag), atom),
        ),
        map(preceded(multispace0, atom), |atom| (None, atom)),
    ))(input)
}

pub fn parse(source: &str) -> Result<Syntax<Atom>, NotationError> {
    profile_fn!(parse);

    let (rest, (first, links, _)) = tuple((preceded(multispace0, atom), many0(link), multispace0))(
        source,
    )
    .map_err(|e| NotationError::from_nom(source, e))?;

    if !rest.is_empty() {
        return Err(NotationError::new(source, rest, "operator or operand"));
    }

    let syntax = links
        .into_iter()
        .fold(Syntax::Atom(first), |lhs, (tag, atom)| match tag {
            Some(tag) => Syntax::binary(lhs, tag, Syntax::Atom(atom)),
            None => Syntax::juxtapose(lhs, Syntax::Atom(atom)),
        });
    Ok(syntax)
}
