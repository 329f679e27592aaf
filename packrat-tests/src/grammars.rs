use packrat::ops::*;
use packrat::{Grammar, GrammarError, Scope, Value};
use std::sync::Arc;

fn int(s: &Scope) -> Value {
    Value::Int(s.value("text").as_str().and_then(|t| t.parse().ok()).unwrap_or(0))
}

fn binary(op: char) -> impl Fn(&Scope) -> Value + Send + Sync + 'static {
    move |s: &Scope| match (s.value("l").as_int(), s.value("r").as_int()) {
        (Some(l), Some(r)) => Value::Int(match op {
            '+' => l + r,
            '-' => l - r,
            _ => l * r,
        }),
        _ => Value::Nil,
    }
}

/// Left recursive arithmetic over patterns.
pub fn calc() -> Result<Grammar, GrammarError> {
    Grammar::builder("calc")
        .rule(
            "expr",
            choice(vec![
                seq(vec![tag(call("expr"), "l"), call("ws"), lit("+"), call("ws"), tag(call("term"), "r"), action(binary('+'))]),
                seq(vec![tag(call("expr"), "l"), call("ws"), lit("-"), call("ws"), tag(call("term"), "r"), action(binary('-'))]),
                call("term"),
            ]),
        )
        .rule(
            "term",
            choice(vec![
                seq(vec![tag(call("term"), "l"), call("ws"), lit("*"), call("ws"), tag(call("atom"), "r"), action(binary('*'))]),
                call("atom"),
            ]),
        )
        .rule(
            "atom",
            choice(vec![
                seq(vec![collect(pattern("[0-9]+")?), action(int)]),
                seq(vec![lit("("), call("ws"), tag(call("expr"), "e"), call("ws"), lit(")"), action(|s| s.value("e"))]),
            ]),
        )
        .rule("ws", pattern(r"[ \t]*")?)
        .build()
}

/// Comma separated words, keywords excluded, and quoted strings closed by
/// the quote that opened them.
pub fn words() -> Result<Grammar, GrammarError> {
    Grammar::builder("words")
        .rule(
            "list",
            seq(vec![
                tag(call("item"), "first"),
                tag(collect_repeat(seq(vec![direct("sep"), call("item")]), 0, None), "rest"),
                action(|s| {
                    let mut items = vec![s.value("first")];
                    items.extend(s.value("rest").as_list().unwrap_or(&[]).iter().cloned());
                    Value::List(items)
                }),
            ]),
        )
        .rule("sep", seq(vec![lit(","), opt(lit(" "))]))
        .rule("item", choice(vec![call("quoted"), call("word"), bounds(lit("_"))]))
        .rule(
            "word",
            seq(vec![
                not(call("keyword")),
                tag(collect(plus(range('a', 'z'))), "w"),
                and(action(|s| Value::Bool(s.value("text").as_str().map_or(false, |t| t.len() <= 5)))),
                action(|s| s.value("w")),
            ]),
        )
        .rule("keyword", seq(vec![choice(vec![lit("if"), lit("else")]), not(range('a', 'z'))]))
        .rule(
            "quoted",
            seq(vec![
                and(choice(vec![lit("'"), lit("\"")])),
                tag(dot(), "q"),
                tag(call_with("body", vec![local("q")]), "b"),
                call_with("close", vec![local("q")]),
                action(|s| Value::node("quoted", vec![s.value("b")])),
            ]),
        )
        .rule_with_params(
            "body",
            &["q"],
            collect(star(seq(vec![not(call_with("close", vec![local("q")])), dot()]))),
        )
        .rule_with_params(
            "close",
            &["q"],
            seq(vec![tag(dot(), "c"), and(action(|s| Value::Bool(s.value("c") == s.value("q"))))]),
        )
        .build()
}

pub fn numbers() -> Result<Grammar, GrammarError> {
    Grammar::builder("numbers")
        .rule("int", seq(vec![collect(seq(vec![opt(lit("-")), plus(range('0', '9'))])), action(int)]))
        .build()
}

/// `name=int`, with the number parsed by a linked grammar.
pub fn assign() -> Result<Grammar, GrammarError> {
    Grammar::builder("assign")
        .rule(
            "assign",
            seq(vec![
                tag(collect(pattern("[a-z]+")?), "name"),
                lit("="),
                tag(foreign("num", "int"), "value"),
                action(|s| Value::node("assign", vec![s.value("name"), s.value("value")])),
            ]),
        )
        .link("num", Arc::new(numbers()?))
        .build()
}
