use crate::chain_loader::ExprRecord;
use crate::showcase::Showcase;
use num_format::{Locale, ToFormattedString as _};
use operand_binder::{
    notation, Binder, Expr, HierarchyOracle, LeafError, NoReaction, NotationError,
    SharedReactions, TreeHost, TypeId, TypeUniverse,
};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

const EXAMPLES_PER_BUCKET: usize = 4;

/// Why an expression did not bind.
#[derive(Debug)]
pub enum BindFailure {
    Notation(NotationError),
    Leaf(LeafError),
    TooLong { operands: usize, limit: usize },
    NoReaction(NoReaction<String>),
}

impl BindFailure {
    fn bucket(&self) -> String {
        match self {
            BindFailure::Notation(_) => "Notation error".to_string(),
            BindFailure::Leaf(LeafError::UnknownType { .. }) => "Unknown type".to_string(),
            BindFailure::Leaf(LeafError::UntypedNumber(_)) => "Untyped number".to_string(),
            BindFailure::TooLong { .. } => "Too many operands".to_string(),
            BindFailure::NoReaction(inner) => {
                format!("No reaction: '{}' and '{}'", inner.left, inner.right)
            }
        }
    }
}

impl fmt::Display for BindFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindFailure::Notation(inner) => write!(f, "{}", inner),
            BindFailure::Leaf(inner) => write!(f, "{}", inner),
            BindFailure::TooLong { operands, limit } => write!(
                f,
                "Chain has {} operands, more than the limit of {}",
                operands, limit
            ),
            BindFailure::NoReaction(inner) => write!(f, "{}", inner),
        }
    }
}

/// Everything needed to bind expressions against one type universe.
pub struct Binding<'u> {
    universe: &'u TypeUniverse,
    host: TreeHost<'u>,
    oracle: HierarchyOracle<'u, TypeUniverse>,
    shared: Option<Arc<SharedReactions<TypeId>>>,
    normalize: bool,
    max_operands: usize,
}

impl<'u> Binding<'u> {
    pub fn new(universe: &'u TypeUniverse, max_operands: usize) -> Self {
        Self {
            universe,
            host: TreeHost::new(universe),
            oracle: HierarchyOracle::new(universe),
            shared: None,
            normalize: true,
            max_operands,
        }
    }

    pub fn shared_cache(mut self, enabled: bool) -> Self {
        self.shared = if enabled {
            Some(Arc::new(SharedReactions::new()))
        } else {
            None
        };
        self
    }

    pub fn normalize(mut self, enabled: bool) -> Self {
        self.normalize = enabled;
        self
    }

    pub fn universe(&self) -> &'u TypeUniverse {
        self.universe
    }

    pub fn bind(&self, source: &str) -> Result<Expr, BindFailure> {
        let chain = notation::parse(source)
            .map_err(BindFailure::Notation)?
            .flatten();
        if chain.len() > self.max_operands {
            return Err(BindFailure::TooLong {
                operands: chain.len(),
                limit: self.max_operands,
            });
        }
        let chain = self.host.resolve(chain).map_err(BindFailure::Leaf)?;

        let mut binder = Binder::new(&self.host, &self.oracle).normalize(self.normalize);
        if let Some(shared) = &self.shared {
            binder = binder.with_shared_cache(shared.clone());
        }
        binder
            .bind(chain)
            .into_result()
            .map(|solved| solved.expr)
            .map_err(|failure| {
                let universe = self.universe;
                BindFailure::NoReaction(failure.map(|ty| universe.name(ty).to_string()))
            })
    }
}

pub struct FailureBucket {
    count: usize,
    examples: Showcase<ExprRecord>,
}

impl FailureBucket {
    pub fn new(capacity: usize) -> Self {
        Self {
            count: 0,
            examples: Showcase::new(capacity),
        }
    }

    fn add(&mut self, record: ExprRecord) {
        self.count += 1;
        offer_example(&mut self.examples, record);
    }

    fn merge(&mut self, other: FailureBucket) {
        self.count += other.count;
        for (_, example) in other.examples.take() {
            offer_example(&mut self.examples, example);
        }
    }
}

// The shortest sources make the clearest examples.
fn offer_example(examples: &mut Showcase<ExprRecord>, record: ExprRecord) {
    examples.offer(record.source.len(), record, |a, b| a.source == b.source)
}

impl fmt::Display for FailureBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.count.to_formatted_string(&Locale::en))
    }
}

struct BoundRecord {
    record: ExprRecord,
    result: Result<String, BindFailure>,
}

#[derive(Default)]
pub struct BindSummary {
    solved: usize,
    by_type: HashMap<String, usize>,
    /// Solved records that named the type they should bind to.
    checked: usize,
    mismatches: HashMap<String, FailureBucket>,
    failures: HashMap<String, FailureBucket>,
}

impl BindSummary {
    fn add(&mut self, bound: BoundRecord) {
        match bound.result {
            Ok(ty) => {
                self.solved += 1;
                if let Some(expected) = &bound.record.expected {
                    self.checked += 1;
                    if *expected != ty {
                        let key = format!("Expected '{}', bound to '{}'", expected, ty);
                        bucket(&mut self.mismatches, key).add(bound.record);
                    }
                }
                *self.by_type.entry(ty).or_default() += 1;
            }
            Err(failure) => bucket(&mut self.failures, failure.bucket()).add(bound.record),
        }
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.solved += other.solved;
        self.checked += other.checked;
        for (ty, count) in other.by_type {
            *self.by_type.entry(ty).or_default() += count;
        }
        for (key, other) in other.mismatches {
            bucket(&mut self.mismatches, key).merge(other);
        }
        for (key, other) in other.failures {
            bucket(&mut self.failures, key).merge(other);
        }
        self
    }

    pub fn solved(&self) -> usize {
        self.solved
    }

    pub fn failed(&self) -> usize {
        self.failures.values().map(|bucket| bucket.count).sum()
    }

    pub fn mismatched(&self) -> usize {
        self.mismatches.values().map(|bucket| bucket.count).sum()
    }
}

fn bucket(buckets: &mut HashMap<String, FailureBucket>, key: String) -> &mut FailureBucket {
    buckets
        .entry(key)
        .or_insert_with(|| FailureBucket::new(EXAMPLES_PER_BUCKET))
}

/// Largest first, then by name so the report is stable.
fn by_count<V>(map: &HashMap<String, V>, count: impl Fn(&V) -> usize) -> Vec<(&String, &V)> {
    let mut entries: Vec<_> = map.iter().collect();
    entries.sort_by(|a, b| count(b.1).cmp(&count(a.1)).then_with(|| a.0.cmp(b.0)));
    entries
}

fn write_buckets(
    f: &mut fmt::Formatter<'_>,
    title: &str,
    buckets: &HashMap<String, FailureBucket>,
) -> fmt::Result {
    let total: usize = buckets.values().map(|bucket| bucket.count).sum();
    writeln!(f, "{}: {}", title, total.to_formatted_string(&Locale::en))?;
    for (name, bucket) in by_count(buckets, |bucket| bucket.count) {
        writeln!(f, "\t{} {}", name, bucket)?;
        for example in bucket.examples.iter() {
            writeln!(f, "\t\t{}", &example.source)?;
        }
    }
    Ok(())
}

impl fmt::Display for BindSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Solved: {} expressions",
            self.solved.to_formatted_string(&Locale::en)
        )?;
        for (ty, count) in by_count(&self.by_type, |count| *count) {
            writeln!(f, "\t{}: {}", ty, count.to_formatted_string(&Locale::en))?;
        }

        if self.checked != 0 {
            writeln!(f)?;
            writeln!(
                f,
                "Expectations met: {} of {}",
                (self.checked - self.mismatched()).to_formatted_string(&Locale::en),
                self.checked.to_formatted_string(&Locale::en)
            )?;
            write_buckets(f, "Mismatches", &self.mismatches)?;
        }

        writeln!(f)?;
        write_buckets(f, "Failures", &self.failures)
    }
}

fn bind_one(binding: &Binding, record: ExprRecord) -> BoundRecord {
    let universe = binding.universe();
    let result = binding
        .bind(&record.source)
        .map(|expr| universe.name(expr.ty()).to_string());
    BoundRecord { record, result }
}

pub fn bind_many(binding: &Binding, records: Vec<ExprRecord>) -> BindSummary {
    records
        .into_par_iter()
        .map(|record| bind_one(binding, record))
        .fold(BindSummary::default, |mut acc, value| {
            acc.add(value);
            acc
        })
        .reduce(BindSummary::default, BindSummary::merge)
}
