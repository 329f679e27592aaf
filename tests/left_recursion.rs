use packrat::ops::*;
use packrat::{Grammar, Value};

fn num() -> packrat::Operator {
    collect(plus(range('0', '9')))
}

/// `expr = l:expr "+" r:num { (l + r) } | num`
fn sum_grammar() -> Grammar {
    Grammar::builder("sum")
        .rule(
            "expr",
            choice(vec![
                seq(vec![
                    tag(call("expr"), "l"),
                    lit("+"),
                    tag(call("num"), "r"),
                    action(|s| Value::node("add", vec![s.value("l"), s.value("r")])),
                ]),
                call("num"),
            ]),
        )
        .rule("num", num())
        .build()
        .unwrap()
}

#[test]
fn grows_left_associative() {
    let g = sum_grammar();
    let mut parser = g.parser("1+2+3");
    assert!(parser.parse(None));
    assert_eq!(parser.pos(), 5);
    assert_eq!(
        parser.result(),
        &Value::node(
            "add",
            vec![Value::node("add", vec![Value::from("1"), Value::from("2")]), Value::from("3")]
        )
    );
}

#[test]
fn keeps_best_seed_when_growth_stops() {
    let g = sum_grammar();
    let mut parser = g.parser("1+2+");
    assert!(parser.parse(None));
    assert_eq!(parser.pos(), 3);

    assert!(g.parse("1+2+").is_err());
    assert_eq!(g.parse("7"), Ok(Value::from("7")));
}

#[test]
fn reports_cycles() {
    let g = sum_grammar();
    assert_eq!(g.left_recursive_rules(), &[vec!["expr".to_owned(), "expr".to_owned()]]);

    let g = Grammar::builder("lr")
        .rule("a", choice(vec![seq(vec![opt(lit(" ")), call("b"), lit("x")]), lit("x")]))
        .rule("b", call("a"))
        .build()
        .unwrap();
    assert_eq!(
        g.left_recursive_rules(),
        &[
            vec!["a".to_owned(), "b".to_owned(), "a".to_owned()],
            vec!["b".to_owned(), "a".to_owned(), "b".to_owned()],
        ]
    );
}

#[test]
fn nested_left_recursion() {
    // expr = expr "-" term | term ; term = term "*" atom | atom
    let g = Grammar::builder("arith")
        .rule(
            "expr",
            choice(vec![
                seq(vec![
                    tag(call("expr"), "l"),
                    lit("-"),
                    tag(call("term"), "r"),
                    action(|s| Value::node("sub", vec![s.value("l"), s.value("r")])),
                ]),
                call("term"),
            ]),
        )
        .rule(
            "term",
            choice(vec![
                seq(vec![
                    tag(call("term"), "l"),
                    lit("*"),
                    tag(call("atom"), "r"),
                    action(|s| Value::node("mul", vec![s.value("l"), s.value("r")])),
                ]),
                call("atom"),
            ]),
        )
        .rule("atom", num())
        .build()
        .unwrap();

    let one = || Value::from("1");
    let two = || Value::from("2");
    let three = || Value::from("3");
    let four = || Value::from("4");

    assert_eq!(
        g.parse("1-2*3-4"),
        Ok(Value::node(
            "sub",
            vec![
                Value::node("sub", vec![one(), Value::node("mul", vec![two(), three()])]),
                four()
            ]
        ))
    );
}

#[test]
fn matches_right_recursive_equivalent() {
    // The same language written without left recursion.
    let right = Grammar::builder("sum")
        .rule("expr", seq(vec![call("num"), star(seq(vec![lit("+"), call("num")]))]))
        .rule("num", num())
        .build()
        .unwrap();
    let left = sum_grammar();

    for input in ["1", "1+2", "10+20+30", "1+", "+1", "", "1++2", "1+2+3+4+5+6"] {
        let mut l = left.parser(input);
        let mut r = right.parser(input);
        assert_eq!(l.parse(None), r.parse(None), "input {:?}", input);
        assert_eq!(l.pos(), r.pos(), "input {:?}", input);
    }
}
