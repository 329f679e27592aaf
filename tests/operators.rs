use packrat::ops::*;
use packrat::{compile, Grammar, GrammarError, Operator, Parser, Value};

fn grammar(body: Operator) -> Grammar {
    Grammar::builder("test").rule("start", body).build().unwrap()
}

/// Run `body` against `input` without requiring it to consume everything.
fn run(body: Operator, input: &str) -> Option<(usize, Value)> {
    let g = grammar(body);
    let mut parser = g.parser(input);
    if parser.parse(None) {
        Some((parser.pos(), parser.result().clone()))
    } else {
        None
    }
}

#[test]
fn any_char() {
    assert_eq!(run(dot(), "ab"), Some((1, Value::Char('a'))));
    assert_eq!(run(dot(), "é!"), Some((2, Value::Char('é'))));
    assert_eq!(run(dot(), ""), None);
}

#[test]
fn literals() {
    assert_eq!(run(lit("foo"), "foobar"), Some((3, Value::from("foo"))));
    assert_eq!(run(lit("foo"), "fo"), None);
    assert_eq!(run(lit(""), "x"), Some((0, Value::from(""))));
}

#[test]
fn patterns_are_anchored() {
    let word = || pattern("[a-z]+").unwrap();
    assert_eq!(run(word(), "abc1"), Some((3, Value::from("abc"))));
    assert_eq!(run(word(), "1abc"), None);
    assert_eq!(run(pattern("b").unwrap(), "ab"), None);
    assert_eq!(run(pattern("a|ab").unwrap(), "ab"), Some((1, Value::from("a"))));
}

#[test]
fn char_ranges() {
    assert_eq!(run(range('0', '9'), "7"), Some((1, Value::Char('7'))));
    assert_eq!(run(range('0', '9'), "a"), None);
    assert_eq!(run(range('α', 'ω'), "λ"), Some((2, Value::Char('λ'))));

    let err = Grammar::builder("test")
        .rule("start", Operator::CharRange("aa".into(), "z".into()))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        GrammarError::CharRange {
            rule: "start".into(),
            lo: "aa".into(),
            hi: "z".into()
        }
    );
}

#[test]
fn sequence_result_and_rollback() {
    assert_eq!(run(seq(vec![lit("a"), lit("b")]), "abc"), Some((2, Value::from("b"))));
    assert_eq!(run(seq(vec![]), "abc"), Some((0, Value::Nil)));

    // The failed first alternative must not leave the cursor after "a".
    let body = choice(vec![seq(vec![lit("a"), lit("c")]), seq(vec![lit("a"), lit("b")])]);
    assert_eq!(run(body, "ab"), Some((2, Value::from("b"))));
}

#[test]
fn ordered_choice() {
    assert_eq!(run(choice(vec![lit("a"), lit("ab")]), "ab"), Some((1, Value::from("a"))));
    assert_eq!(run(choice(vec![lit("ab"), lit("a")]), "ab"), Some((2, Value::from("ab"))));
    assert_eq!(run(choice(vec![lit("x"), lit("y")]), "z"), None);

    let err = Grammar::builder("test").rule("start", choice(vec![])).build().unwrap_err();
    assert_eq!(err, GrammarError::EmptyChoice("start".into()));
}

#[test]
fn repeats() {
    assert_eq!(run(star(lit("a")), "bbb"), Some((0, Value::Nil)));
    assert_eq!(run(plus(lit("a")), "bbb"), None);
    assert_eq!(run(plus(lit("a")), "aab"), Some((2, Value::from("a"))));
    assert_eq!(run(opt(lit("a")), "b"), Some((0, Value::Nil)));
    assert_eq!(run(repeat(lit("a"), 2, Some(3)), "aaaaa"), Some((3, Value::from("a"))));
    assert_eq!(run(repeat(lit("a"), 2, Some(3)), "ab"), None);

    assert_eq!(
        run(collect_repeat(range('0', '9'), 1, None), "12x"),
        Some((2, Value::List(vec![Value::Char('1'), Value::Char('2')])))
    );
    assert_eq!(run(collect_repeat(lit("a"), 0, None), ""), Some((0, Value::List(vec![]))));
}

#[test]
fn failed_repeat_discards_bindings() {
    // start = ((.:x)[3,] | "") {x}
    let g = grammar(seq(vec![
        choice(vec![repeat(tag(dot(), "x"), 3, None), lit("")]),
        action(|s| s.value("x")),
    ]));
    let closures = compile(&g);

    for (input, expected) in [("ab", Value::Nil), ("abc", Value::Char('c'))] {
        let mut interpreted = Parser::new(&g, input);
        let mut compiled = Parser::new(&closures, input);
        assert!(interpreted.parse(None));
        assert!(compiled.parse(None));
        assert_eq!(interpreted.result(), &expected, "{:?}", input);
        assert_eq!(compiled.result(), &expected, "{:?}", input);
    }
}

#[test]
fn bad_repeats_are_rejected() {
    let err = Grammar::builder("test")
        .rule("start", repeat(dot(), 3, Some(2)))
        .build()
        .unwrap_err();
    assert_eq!(
        err,
        GrammarError::RepeatBounds {
            rule: "start".into(),
            min: 3,
            max: 2
        }
    );

    let err = Grammar::builder("test")
        .rule("start", star(call("maybe")))
        .rule("maybe", opt(lit("a")))
        .build()
        .unwrap_err();
    assert_eq!(err, GrammarError::NullableLoop("start".into()));

    // A bounded loop over a nullable body terminates on its own.
    assert!(Grammar::builder("test").rule("start", repeat(opt(lit("a")), 0, Some(3))).build().is_ok());
}

#[test]
fn lookahead() {
    let consonants = plus(seq(vec![
        not(choice(vec![lit("a"), lit("e"), lit("i"), lit("o"), lit("u")])),
        range('a', 'z'),
    ]));
    let g = grammar(consonants);
    assert!(g.parse("qwrty").is_ok());
    assert!(g.parse("rust").is_err());

    let body = seq(vec![
        tag(and(collect(star(range('a', 'c')))), "v"),
        lit("abcd"),
        action(|s| s.value("v")),
    ]);
    assert_eq!(run(body.clone(), "abcd"), Some((4, Value::from("abc"))));
    assert_eq!(run(body, "abc"), None);
}

#[test]
fn tags_and_actions() {
    let body = seq(vec![
        tag(collect(plus(range('0', '9'))), "a"),
        lit("+"),
        tag(collect(plus(range('0', '9'))), "b"),
        action(|s| {
            let a: i64 = s.value("a").as_str().and_then(|t| t.parse().ok()).unwrap_or(0);
            let b: i64 = s.value("b").as_str().and_then(|t| t.parse().ok()).unwrap_or(0);
            Value::Int(a + b)
        }),
    ]);
    assert_eq!(run(body, "12+30"), Some((5, Value::Int(42))));

    // Actions only see what was bound before them.
    let g = grammar(seq(vec![
        tag(action(|s| Value::Bool(s.get("x").is_some())), "before"),
        tag(lit("x"), "x"),
        action(|s| Value::List(vec![s.value("before"), Value::Bool(s.get("x").is_some())])),
    ]));
    assert_eq!(
        g.parse("x"),
        Ok(Value::List(vec![Value::Bool(false), Value::Bool(true)]))
    );

    let g = grammar(seq(vec![
        tag(lit("x"), "x"),
        action(|s| Value::node("pair", vec![s.value("x"), s.value("missing")])),
    ]));
    assert_eq!(g.parse("x"), Ok(Value::node("pair", vec![Value::from("x"), Value::Nil])));
}

#[test]
fn collect_and_bounds() {
    assert_eq!(run(collect(seq(vec![lit("a"), lit("b")])), "abc"), Some((2, Value::from("ab"))));
    assert_eq!(
        run(seq(vec![lit("x"), bounds(plus(lit("y")))]), "xyyz"),
        Some((3, Value::Span(1, 3)))
    );
}

#[test]
fn rule_calls() {
    let g = Grammar::builder("test")
        .rule("start", seq(vec![call("digit"), direct("digit")]))
        .rule("digit", range('0', '9'))
        .build()
        .unwrap();
    assert_eq!(g.parse("12"), Ok(Value::Char('2')));

    let mut parser = g.parser("12");
    assert!(parser.parse(None));
    let digit = g.rule_named("digit").map(|r| packrat::RuleId(r.index)).unwrap();
    assert_eq!(parser.engine().memo_uses(digit, 0), Some(1));
    // Direct calls bypass the memo table.
    assert_eq!(parser.engine().memo_uses(digit, 1), None);
}

#[test]
fn start_rules() {
    let g = Grammar::builder("test")
        .rule("a", lit("a"))
        .rule("b", lit("b"))
        .build()
        .unwrap();
    let mut parser = g.parser("b");
    assert!(!parser.parse(None));
    assert!(parser.parse(Some("b")));
    assert!(!parser.parse(Some("nope")));
    assert_eq!(parser.failure_diagnostic(), "@1:1 failed rule 'nope', got 'b'");
}

#[test]
fn prefix_matches_unless_eof_required() {
    let g = grammar(lit("a"));
    let mut parser = g.parser("ab");
    assert!(parser.parse(None));
    assert_eq!(parser.pos(), 1);

    let mut parser = g.parser("ab").require_eof(true);
    assert!(!parser.parse(None));
    assert_eq!(parser.failure_diagnostic(), "@1:2 failed rule 'end of input', got 'b'");
}
