use packrat::ops::*;
use packrat::{FailedRule, Grammar, ParseError, Value};

fn sum_grammar() -> Grammar {
    Grammar::builder("sum")
        .rule(
            "expr",
            choice(vec![seq(vec![call("expr"), lit("+"), call("num")]), call("num")]),
        )
        .rule("num", collect(plus(range('0', '9'))))
        .build()
        .unwrap()
}

#[test]
fn furthest_failure_after_operator() {
    let g = sum_grammar();
    let mut parser = g.parser("1+");
    assert!(parser.parse(None));
    assert_eq!(parser.pos(), 1);

    let err = g.parse("1+").unwrap_err();
    assert_eq!(err.location.offset, 2);
    assert_eq!(err.location.line, 1);
    assert_eq!(err.location.column, 3);
    assert_eq!(err.rule, "num");
    assert_eq!(err.found, None);
    assert_eq!(err.to_string(), "@1:3 failed rule 'num', got end of input");
}

#[test]
fn failure_on_later_line() {
    let g = Grammar::builder("lines")
        .rule("lines", star(choice(vec![call("word"), lit("\n")])))
        .rule("word", plus(range('a', 'z')))
        .build()
        .unwrap();

    let err = g.parse("\naaaa\naaaaaa\naaaaBaaaa\n").unwrap_err();
    assert_eq!(err.location.line, 4);
    assert_eq!(err.location.column, 5);
    assert_eq!(err.location.offset, 17);
    assert_eq!(err.found, Some('B'));

    let mut parser = g.parser("\naaaa\naaaaaa\naaaaBaaaa\n").require_eof(true);
    assert!(!parser.parse(None));
    assert_eq!(parser.failure_character(), Some('B'));
    assert_eq!(parser.failure_caret(), "aaaaBaaaa\n    ^");
}

#[test]
fn info_includes_rendered_rule() {
    let g = sum_grammar();
    let mut parser = g.parser("1+x");
    assert!(parser.parse(None));
    assert_eq!(parser.failure_info(), "line 1, column 3: failed rule 'num' = '< [0-9]+ >'");
    assert_eq!(parser.failure_diagnostic(), "@1:3 failed rule 'num', got 'x'");
}

#[test]
fn failure_state() {
    let g = sum_grammar();
    let mut parser = g.parser("+");
    assert!(!parser.parse(None));

    let state = parser.engine().err_state();
    assert_eq!(state.failing_offset, 0);
    // Both rules fail at 0; `expr` is recorded last.
    assert_eq!(state.failed_rule, Some(FailedRule::Rule(g.root_rule())));
    assert_eq!(parser.failure_diagnostic(), "@1:1 failed rule 'expr', got '+'");
}

#[test]
fn parse_error_is_an_error() {
    fn run(g: &Grammar, input: &str) -> Result<Value, Box<dyn std::error::Error>> {
        Ok(g.parse(input)?)
    }

    let g = sum_grammar();
    assert!(run(&g, "1+2").is_ok());
    let err = run(&g, "").unwrap_err();
    assert_eq!(err.to_string(), "@1:1 failed rule 'expr', got end of input");

    let err: ParseError = g.parse("12+34+").unwrap_err();
    assert_eq!(err.location.to_string(), "1:7");
}
