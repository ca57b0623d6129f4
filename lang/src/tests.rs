use crate::*;
use std::cell::Cell;
use std::sync::Arc;

type Outcome = Result<(String, String), NoReaction<String>>;

trait IntoTestResult {
    fn into(self) -> Outcome;
}

/// A solved tree and the name of its type.
impl IntoTestResult for (&str, &str) {
    fn into(self) -> Outcome {
        Ok((self.0.to_string(), self.1.to_string()))
    }
}

impl IntoTestResult for NoReaction<&str> {
    fn into(self) -> Outcome {
        Err(self.map(str::to_string))
    }
}

fn no_reaction<'a>(left: &'a str, right: &'a str) -> NoReaction<&'a str> {
    NoReaction { left, right }
}

fn chain(universe: &TypeUniverse, source: &str) -> OperandChain<Expr> {
    let host = TreeHost::new(universe);
    host.resolve(notation::parse(source).unwrap().flatten())
        .unwrap()
}

fn outcome(universe: &TypeUniverse, result: BindingResult<Expr, TypeId>) -> Outcome {
    result
        .into_result()
        .map(|solved| {
            (
                solved.expr.to_string(),
                universe.name(solved.expr.ty()).to_string(),
            )
        })
        .map_err(|failure| failure.map(|ty| universe.name(ty).to_string()))
}

fn test(universe: &str, source: &str, expected: impl IntoTestResult) {
    let universe = TypeUniverse::from_json(universe).unwrap();
    let host = TreeHost::new(&universe);
    let oracle = HierarchyOracle::new(&universe);
    let result = Binder::new(&host, &oracle).bind(chain(&universe, source));
    assert_eq!(expected.into(), outcome(&universe, result));
}

const VELOCITY: &str = r#"{ "literal": "Number", "types": [
    { "name": "Number" },
    { "name": "Time" },
    { "name": "Velocity", "methods": [
        { "name": "postfixBind", "params": ["Number"], "returns": "Velocity" } ] },
    { "name": "Length", "methods": [
        { "name": "div", "params": ["Time"], "returns": "Velocity" } ] } ] }"#;

#[test]
fn miles_per_hour() {
    test(VELOCITY, "5 mi:Length / hr:Time", ("(5 ⊗ (mi / hr))", "Velocity"));
}

#[test]
fn singleton_is_returned_unchanged() {
    let universe = TypeUniverse::from_json(VELOCITY).unwrap();
    let host = TreeHost::new(&universe);
    let oracle = HierarchyOracle::new(&universe);
    let single = chain(&universe, "mi:Length");
    let expected = single[0].clone();
    let result = Binder::new(&host, &oracle).bind(single);
    assert_eq!(result, BindingResult::Solved(expected));

    test(VELOCITY, "hr:Time", ("hr", "Time"));
}

#[test]
#[should_panic(expected = "empty operand chain")]
fn empty_chain_is_a_contract_violation() {
    let universe = TypeUniverse::from_json(VELOCITY).unwrap();
    let host = TreeHost::new(&universe);
    let oracle = HierarchyOracle::new(&universe);
    Binder::new(&host, &oracle).bind(OperandChain::new());
}

#[test]
fn unrelated_types_fail() {
    let universe = r#"{ "types": [ { "name": "TypeA" }, { "name": "TypeB" } ] }"#;
    test(universe, "x:TypeA y:TypeB", no_reaction("TypeA", "TypeB"));
    test(universe, "x:TypeA + y:TypeB", no_reaction("TypeA", "TypeB"));

    let universe = TypeUniverse::from_json(universe).unwrap();
    let host = TreeHost::new(&universe);
    let oracle = HierarchyOracle::new(&universe);
    let failure = Binder::new(&host, &oracle)
        .bind(chain(&universe, "x:TypeA y:TypeB"))
        .into_result()
        .unwrap_err()
        .map(|ty| universe.name(ty).to_string());
    assert_eq!(
        failure.to_string(),
        "No reaction defined for types 'TypeA' and 'TypeB'"
    );
}

#[test]
fn failure_names_the_leading_pair() {
    // a b reacts, but nothing joins the result or b to c.
    let universe = r#"{ "types": [
        { "name": "A", "methods": [
            { "name": "prefixBind", "params": ["B"], "returns": "AB" } ] },
        { "name": "B" }, { "name": "AB" }, { "name": "C" } ] }"#;
    test(universe, "a:A b:B c:C", no_reaction("A", "B"));
}

#[test]
fn leftmost_split_wins() {
    let universe = r#"{ "types": [
        { "name": "A", "methods": [
            { "name": "prefixBind", "params": ["B"], "returns": "AB" },
            { "name": "prefixBind", "params": ["BC"], "returns": "Right" } ] },
        { "name": "AB", "methods": [
            { "name": "prefixBind", "params": ["C"], "returns": "Left" } ] },
        { "name": "B", "methods": [
            { "name": "prefixBind", "params": ["C"], "returns": "BC" } ] },
        { "name": "C" }, { "name": "BC" }, { "name": "Left" }, { "name": "Right" } ] }"#;
    test(universe, "a:A b:B c:C", ("((a ⊗ b) ⊗ c)", "Left"));
}

#[test]
fn backtracks_past_a_dead_end() {
    // a b reacts locally, but its result cannot join c.
    let universe = r#"{ "types": [
        { "name": "A", "methods": [
            { "name": "prefixBind", "params": ["B"], "returns": "X" },
            { "name": "prefixBind", "params": ["Y"], "returns": "Z" } ] },
        { "name": "B", "methods": [
            { "name": "prefixBind", "params": ["C"], "returns": "Y" } ] },
        { "name": "C" }, { "name": "X" }, { "name": "Y" }, { "name": "Z" } ] }"#;
    test(universe, "a:A b:B c:C", ("(a ⊗ (b ⊗ c))", "Z"));
}

#[test]
fn combined_operand_keeps_left_operator() {
    // After b c combines, the result is still subtracted from a.
    let universe = r#"{ "types": [
        { "name": "A", "methods": [
            { "name": "minus", "params": ["B"], "returns": "E" },
            { "name": "minus", "params": ["B2"], "returns": "D" } ] },
        { "name": "B", "methods": [
            { "name": "prefixBind", "params": ["C"], "returns": "B2" } ] },
        { "name": "C" }, { "name": "B2" }, { "name": "D" }, { "name": "E" } ] }"#;
    test(universe, "a:A - b:B c:C", ("(a - (b ⊗ c))", "D"));
}

#[test]
fn commutative_operator_swaps_receiver() {
    let universe = r#"{ "literal": "Number", "types": [
        { "name": "Number" },
        { "name": "Vector", "methods": [
            { "name": "times", "params": ["Number"], "returns": "Vector" } ] } ] }"#;
    test(universe, "2 * v:Vector", ("(2 * v)", "Vector"));
    test(universe, "v:Vector * 2", ("(v * 2)", "Vector"));
    test(universe, "2 - v:Vector", no_reaction("Number", "Vector"));
}

#[test]
fn comparisons() {
    let universe = r#"{ "comparison": "boolean", "types": [
        { "name": "boolean", "kind": "primitive" },
        { "name": "int", "kind": "primitive" },
        { "name": "Date", "methods": [
            { "name": "compareTo", "params": ["Date"], "returns": "int" } ] },
        { "name": "Money", "methods": [
            { "name": "compareToWith", "params": ["Money", "Op"], "returns": "boolean" } ] },
        { "name": "Op" } ] }"#;
    test(universe, "a:Date <= b:Date", ("(a <= b)", "boolean"));
    test(universe, "a:Money == b:Money", ("(a == b)", "boolean"));
    test(universe, "a:Date == b:Date", no_reaction("Date", "Date"));
}

#[test]
fn supertype_methods_apply() {
    let universe = r#"{ "literal": "Number", "types": [
        { "name": "Number" },
        { "name": "Scalable", "kind": "interface", "methods": [
            { "name": "postfixBind", "params": ["Number"], "returns": { "var": "T" } } ] },
        { "name": "Quantity", "interfaces": ["Scalable"] },
        { "name": "Length", "superclass": "Quantity" } ] }"#;
    // The return variable has nothing to bind to and so is rejected.
    assert!(TypeUniverse::from_json(universe).is_err());

    let universe = r#"{ "literal": "Number", "types": [
        { "name": "Number" },
        { "name": "Scalable", "kind": "interface", "methods": [
            { "name": "postfixBind", "params": ["Number"], "returns": "Scaled" } ] },
        { "name": "Scaled" },
        { "name": "Quantity", "interfaces": ["Scalable"] },
        { "name": "Length", "superclass": "Quantity" } ] }"#;
    test(universe, "3 m:Length", ("(3 ⊗ m)", "Scaled"));
}

#[test]
fn exhausts_every_grouping_before_failing() {
    // Every pair of Qs reacts; nothing reacts with End.
    let universe = r#"{ "types": [
        { "name": "Q", "methods": [
            { "name": "prefixBind", "params": ["Q"], "returns": "Q" } ] },
        { "name": "End" } ] }"#;
    test(universe, "a:Q b:Q c:Q d:Q e:Q z:End", no_reaction("Q", "Q"));
    test(universe, "a:Q b:Q c:Q d:Q", ("(((a ⊗ b) ⊗ c) ⊗ d)", "Q"));
}

/// Counts the pairs the binder reduces.
struct Counting<'u> {
    inner: TreeHost<'u>,
    combined: Cell<usize>,
}

impl Host for Counting<'_> {
    type Expr = Expr;
    type Type = TypeId;

    fn type_of(&self, expr: &Expr) -> TypeId {
        self.inner.type_of(expr)
    }

    fn combine(&self, left: &Operand<Expr>, right: &Operand<Expr>, reaction: &Reaction<TypeId>) -> Expr {
        self.combined.set(self.combined.get() + 1);
        self.inner.combine(left, right, reaction)
    }

    fn split(&self, expr: Expr) -> Result<Joined<Expr, TypeId>, Expr> {
        self.inner.split(expr)
    }
}

#[test]
fn failed_chains_are_not_searched_twice() {
    let universe = r#"{ "types": [
        { "name": "Q", "methods": [
            { "name": "prefixBind", "params": ["Q"], "returns": "Q" } ] },
        { "name": "End" } ] }"#;
    let source = "q:Q ".repeat(12) + "z:End";

    let universe = TypeUniverse::from_json(universe).unwrap();
    let host = Counting {
        inner: TreeHost::new(&universe),
        combined: Cell::new(0),
    };
    let oracle = HierarchyOracle::new(&universe);
    let result = Binder::new(&host, &oracle).bind(chain(&universe, &source));
    assert!(!result.is_solved());
    // Every distinct chain is reduced at most once per pair.
    assert!(host.combined.get() <= 12 * 12, "{} reductions", host.combined.get());
}

#[test]
fn long_failing_chains_finish() {
    let universe = r#"{ "types": [
        { "name": "Q", "methods": [
            { "name": "prefixBind", "params": ["Q"], "returns": "Q" } ] },
        { "name": "End" } ] }"#;
    test(universe, &("q:Q ".repeat(23) + "z:End"), no_reaction("Q", "Q"));
    test(universe, &("z:End ".to_string() + &"q:Q ".repeat(23)), no_reaction("End", "Q"));
}

#[test]
fn shared_cache_gives_the_same_answers() {
    let universe = TypeUniverse::from_json(VELOCITY).unwrap();
    let host = TreeHost::new(&universe);
    let oracle = HierarchyOracle::new(&universe);
    let shared = Arc::new(SharedReactions::new());
    let binder = Binder::new(&host, &oracle).with_shared_cache(shared.clone());
    let per_bind = Binder::new(&host, &oracle);

    for source in &["5 mi:Length / hr:Time", "5 hr:Time", "7"] {
        let first = binder.bind(chain(&universe, source));
        let second = binder.bind(chain(&universe, source));
        assert_eq!(first, second);
        assert_eq!(first, per_bind.bind(chain(&universe, source)));
    }
    // (Number, Length), (Number, Velocity) and (Number, Time).
    assert_eq!(shared.len(), 3);
}

#[test]
fn normalization_can_be_disabled() {
    let universe = TypeUniverse::from_json(VELOCITY).unwrap();
    let host = TreeHost::new(&universe);
    let oracle = HierarchyOracle::new(&universe);
    let result = Binder::new(&host, &oracle)
        .normalize(false)
        .bind(chain(&universe, "5 mi:Length / hr:Time"));
    assert_eq!(
        outcome(&universe, result),
        IntoTestResult::into(("(5 ⊗ (mi / hr))", "Velocity"))
    );
}

// Trees the binder does not build on its own, normalized directly.

fn leaf(universe: &TypeUniverse, text: &str) -> Expr {
    Expr::Leaf {
        text: text.to_string(),
        ty: universe.id(&text.to_uppercase()).unwrap(),
    }
}

fn join(universe: &TypeUniverse, lhs: Expr, operator: Operator, rhs: Expr) -> Expr {
    let host = TreeHost::new(universe);
    let reaction = HierarchyOracle::new(universe)
        .find(&lhs.ty(), &rhs.ty(), operator)
        .unwrap();
    host.combine(&Operand::implicit(lhs), &Operand::new(rhs, operator), &reaction)
}

fn normalize(universe: &TypeUniverse, expr: Expr) -> Expr {
    let host = TreeHost::new(universe);
    let oracle = HierarchyOracle::new(universe);
    Binder::new(&host, &oracle).left_associate(expr)
}

const ABC: &str = r#"{ "types": [
    { "name": "A", "methods": [
        { "name": "prefixBind", "params": ["B"], "returns": "AB" },
        { "name": "prefixBind", "params": ["BC"], "returns": "R" } ] },
    { "name": "AB", "methods": [
        { "name": "prefixBind", "params": ["C"], "returns": "R" },
        { "name": "div", "params": ["C"], "returns": "R" } ] },
    { "name": "B", "methods": [
        { "name": "prefixBind", "params": ["C"], "returns": "BC" },
        { "name": "div", "params": ["C"], "returns": "BC" } ] },
    { "name": "C" }, { "name": "BC" }, { "name": "R" } ] }"#;

#[test]
fn implicit_products_associate_left() {
    let u = TypeUniverse::from_json(ABC).unwrap();
    let bc = join(&u, leaf(&u, "b"), Operator::Implicit, leaf(&u, "c"));
    let tree = join(&u, leaf(&u, "a"), Operator::Implicit, bc);
    assert_eq!(tree.to_string(), "(a ⊗ (b ⊗ c))");

    let normalized = normalize(&u, tree);
    assert_eq!(normalized.to_string(), "((a ⊗ b) ⊗ c)");
    assert_eq!(u.name(normalized.ty()), "R");
}

#[test]
fn explicit_operators_keep_their_grouping() {
    let u = TypeUniverse::from_json(ABC).unwrap();
    let bc = join(&u, leaf(&u, "b"), Tag::Div.into(), leaf(&u, "c"));
    let tree = join(&u, leaf(&u, "a"), Operator::Implicit, bc);
    assert_eq!(normalize(&u, tree).to_string(), "(a ⊗ (b / c))");
}

#[test]
fn rotation_must_preserve_the_root_type() {
    let u = TypeUniverse::from_json(
        r#"{ "types": [
            { "name": "A", "methods": [
                { "name": "prefixBind", "params": ["B"], "returns": "AB" },
                { "name": "prefixBind", "params": ["BC"], "returns": "R" } ] },
            { "name": "AB", "methods": [
                { "name": "prefixBind", "params": ["C"], "returns": "W" } ] },
            { "name": "B", "methods": [
                { "name": "prefixBind", "params": ["C"], "returns": "BC" } ] },
            { "name": "C" }, { "name": "BC" }, { "name": "R" }, { "name": "W" } ] }"#,
    )
    .unwrap();
    let bc = join(&u, leaf(&u, "b"), Operator::Implicit, leaf(&u, "c"));
    let tree = join(&u, leaf(&u, "a"), Operator::Implicit, bc);
    assert_eq!(normalize(&u, tree).to_string(), "(a ⊗ (b ⊗ c))");
}

#[test]
fn long_right_leaning_runs_fold_left() {
    let u = TypeUniverse::from_json(
        r#"{ "types": [
            { "name": "Q", "methods": [
                { "name": "prefixBind", "params": ["Q"], "returns": "Q" } ] } ] }"#,
    )
    .unwrap();
    let q = |text: &str| Expr::Leaf {
        text: text.to_string(),
        ty: u.id("Q").unwrap(),
    };
    // a ⊗ (b ⊗ (c ⊗ (d ⊗ e)))
    let mut tree = q("e");
    for text in &["d", "c", "b", "a"] {
        tree = join(&u, q(text), Operator::Implicit, tree);
    }
    assert_eq!(
        normalize(&u, tree).to_string(),
        "((((a ⊗ b) ⊗ c) ⊗ d) ⊗ e)"
    );
}
