use packrat::codegen::{actions, compile_grammar, rule_ident, to_source};
use packrat::ops::*;
use packrat::{Grammar, Scope, Value};

fn grammar() -> Grammar {
    Grammar::builder("calc")
        .rule(
            "expr",
            choice(vec![
                seq(vec![call("expr"), call("add-op"), call("num"), action(|_| Value::Int(1))]),
                call("num"),
            ]),
        )
        .rule("add-op", choice(vec![lit("+"), lit("-")]))
        .rule("num", seq(vec![pattern("[0-9]+").unwrap(), and(action(|_| Value::Int(2)))]))
        .rule("word", foreign("ident", "word"))
        .link(
            "ident",
            std::sync::Arc::new(
                Grammar::builder("ident")
                    .rule("word", pattern("[a-z]+").unwrap())
                    .build()
                    .unwrap(),
            ),
        )
        .build()
        .unwrap()
}

#[test]
fn emits_one_function_per_rule() {
    let source = to_source(&grammar());
    for rule in ["expr", "add-op", "num", "word"] {
        assert!(source.contains(&rule_ident(rule).to_string()), "missing {}", rule);
    }
    assert!(source.contains("__parse_add_hyphen_op"));
    assert!(source.contains("RULES"));
    assert!(source.contains("RuleSet for Parser"));
}

#[test]
fn registry_and_tables() {
    let source = to_source(&grammar());
    assert!(source.contains("\"add-op\""));
    assert!(source.contains("\"^(?:[0-9]+)\""));
    assert!(source.contains("ACTION_COUNT"));
    assert!(source.contains("2usize"));
    assert!(source.contains("invoke_foreign"));
    assert!(source.contains("\"ident\""));
}

#[test]
fn actions_in_tree_order() {
    let g = grammar();
    let actions = actions(&g);
    assert_eq!(actions.len(), 2);
    let scope = Scope::new();
    assert_eq!((actions[0])(&scope), Value::Int(1));
    assert_eq!((actions[1])(&scope), Value::Int(2));
}

#[test]
fn deterministic() {
    let g = grammar();
    assert_eq!(compile_grammar(&g).to_string(), compile_grammar(&g).to_string());
}

#[test]
fn writes_source_file() {
    let g = grammar();
    let path = std::env::temp_dir().join(format!("packrat-translate-{}.rs", std::process::id()));
    packrat::write_source(&g, &path).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_eq!(written, to_source(&g));
}

#[test]
fn output_can_be_included() {
    // `include!` rejects inner attributes.
    let compact: String = to_source(&grammar()).split_whitespace().collect();
    assert!(!compact.contains("#!["));
    assert!(compact.contains("#[allow(unused_imports)]"));
}
