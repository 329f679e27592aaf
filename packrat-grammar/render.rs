use packrat_runtime::Arg;

use crate::ast::Operator;

// Binding strength of the context an operator is rendered in.
const CHOICE: u8 = 0;
const SEQUENCE: u8 = 1;
const PREFIX: u8 = 2;
const SUFFIX: u8 = 3;

/// Render an operator tree in PEG syntax.
pub fn render(op: &Operator) -> String {
    let mut out = String::new();
    render_into(&mut out, op, CHOICE);
    out
}

fn render_into(out: &mut String, op: &Operator, prec: u8) {
    use self::Operator::*;
    match op {
        Dot => out.push('.'),
        LiteralString(s) => out.push_str(&format!("{:?}", s)),
        LiteralPattern(p) => {
            out.push('/');
            out.push_str(p.source());
            out.push('/');
        }
        CharRange(lo, hi) => out.push_str(&format!("[{}-{}]", lo, hi)),
        Sequence(ops) if ops.len() == 1 => render_into(out, &ops[0], prec),
        Sequence(ops) => parenthesize(out, prec > SEQUENCE || ops.is_empty(), |out| {
            join(out, ops, " ", PREFIX);
        }),
        Choice(ops) if ops.len() == 1 => render_into(out, &ops[0], prec),
        Choice(ops) => parenthesize(out, prec > CHOICE || ops.is_empty(), |out| {
            join(out, ops, " | ", SEQUENCE);
        }),
        Repeat { op, min, max, .. } => {
            render_into(out, op, SUFFIX + 1);
            match (*min, *max) {
                (0, Some(1)) => out.push('?'),
                (0, None) => out.push('*'),
                (1, None) => out.push('+'),
                (min, Some(max)) => out.push_str(&format!("[{}, {}]", min, max)),
                (min, None) => out.push_str(&format!("[{},]", min)),
            }
        }
        AndPredicate(op) => {
            out.push('&');
            render_into(out, op, SUFFIX);
        }
        NotPredicate(op) => {
            out.push('!');
            render_into(out, op, SUFFIX);
        }
        Tag(op, name) => {
            render_into(out, op, SUFFIX + 1);
            out.push(':');
            out.push_str(name);
        }
        Action(action) => match &action.label {
            Some(label) => out.push_str(&format!("{{ {} }}", label)),
            None => out.push_str("{ ... }"),
        },
        Collect(op) => {
            out.push_str("< ");
            render_into(out, op, CHOICE);
            out.push_str(" >");
        }
        Bounds(op) => {
            out.push_str("@< ");
            render_into(out, op, CHOICE);
            out.push_str(" >");
        }
        RuleReference(name, args) => {
            out.push_str(name);
            render_args(out, args);
        }
        DirectRuleCall(name, args) => {
            out.push('@');
            out.push_str(name);
            render_args(out, args);
        }
        ForeignRuleReference { grammar, rule, args } => {
            out.push('%');
            out.push_str(grammar);
            out.push('.');
            out.push_str(rule);
            render_args(out, args);
        }
    }
}

fn parenthesize(out: &mut String, parens: bool, f: impl FnOnce(&mut String)) {
    if parens {
        out.push('(');
    }
    f(out);
    if parens {
        out.push(')');
    }
}

fn join(out: &mut String, ops: &[Operator], sep: &str, prec: u8) {
    for (i, op) in ops.iter().enumerate() {
        if i > 0 {
            out.push_str(sep);
        }
        render_into(out, op, prec);
    }
}

fn render_args(out: &mut String, args: &[Arg]) {
    if args.is_empty() {
        return;
    }
    out.push('(');
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        match arg {
            Arg::Value(v) => out.push_str(&v.to_string()),
            Arg::Local(name) => out.push_str(name),
        }
    }
    out.push(')');
}

#[cfg(test)]
mod test {
    use super::render;
    use crate::ops::*;

    #[test]
    fn atoms() {
        assert_eq!(render(&dot()), ".");
        assert_eq!(render(&lit("a\"b\n")), r#""a\"b\n""#);
        assert_eq!(render(&pattern("[0-9]+").unwrap()), "/[0-9]+/");
        assert_eq!(render(&range('a', 'z')), "[a-z]");
        assert_eq!(render(&action(|_| packrat_runtime::Value::Nil)), "{ ... }");
        assert_eq!(render(&labeled_action("n + 1", |_| packrat_runtime::Value::Nil)), "{ n + 1 }");
    }

    #[test]
    fn precedence() {
        let expr = choice(vec![
            seq(vec![call("expr"), lit("+"), call("num")]),
            call("num"),
        ]);
        assert_eq!(render(&expr), r#"expr "+" num | num"#);

        let nested = seq(vec![choice(vec![lit("a"), lit("b")]), lit("c")]);
        assert_eq!(render(&nested), r#"("a" | "b") "c""#);

        let repeated = star(seq(vec![lit(","), call("item")]));
        assert_eq!(render(&repeated), r#"("," item)*"#);

        assert_eq!(render(&not(opt(dot()))), "!.?");
        assert_eq!(render(&tag(plus(range('0', '9')), "n")), "[0-9]+:n");
        assert_eq!(render(&repeat(dot(), 2, Some(4))), ".[2, 4]");
        assert_eq!(render(&repeat(dot(), 2, None)), ".[2,]");
        assert_eq!(render(&seq(vec![])), "()");
    }

    #[test]
    fn calls_and_captures() {
        assert_eq!(render(&collect(plus(dot()))), "< .+ >");
        assert_eq!(render(&bounds(call("word"))), "@< word >");
        assert_eq!(render(&direct("ws")), "@ws");
        assert_eq!(render(&foreign("json", "value")), "%json.value");
        assert_eq!(render(&call_with("block", vec![local("indent"), value(2i64)])), "block(indent, 2)");
    }
}
