use packrat_grammar::{char_bounds, Grammar, Operator};
use packrat_runtime::{ActionFn, Arg, RuleSet, Value};
use proc_macro2::{Ident, Span, TokenStream};
use quote::quote;
use std::sync::Arc;

/// Identifier of the function generated for `rule`.
///
/// Characters that cannot appear in a Rust identifier are spelled out, so
/// distinct rule names always map to distinct functions.
pub fn rule_ident(rule: &str) -> Ident {
    let mut name = String::from("__parse_");
    for c in rule.chars() {
        match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' => name.push(c),
            '_' => name.push_str("__"),
            '-' => name.push_str("_hyphen_"),
            c => name.push_str(&format!("_u{:x}_", c as u32)),
        }
    }
    Ident::new(&name, Span::call_site())
}

/// The actions of `grammar` in the order the generated `Parser::new` expects
/// them: rules in declaration order, operators parents first.
pub fn actions(grammar: &Grammar) -> Vec<Arc<ActionFn>> {
    let mut actions = Vec::new();
    for rule in grammar.iter_rules() {
        rule.body.walk(&mut |op| {
            if let Operator::Action(action) = op {
                actions.push(action.code.clone());
            }
        });
    }
    actions
}

struct Context<'a> {
    grammar: &'a Grammar,
    actions: usize,
    patterns: Vec<String>,
}

/// Emit a Rust module implementing `grammar`.
///
/// The module exports a `Parser` type implementing `RuleSet` and a `RULES`
/// registry of declared names and rendered bodies. Generated code depends on
/// the `packrat_runtime` crate.
pub fn compile_grammar(grammar: &Grammar) -> TokenStream {
    let mut context = Context {
        grammar,
        actions: 0,
        patterns: Vec::new(),
    };

    let mut items = Vec::new();
    let mut arms = Vec::new();
    for rule in grammar.iter_rules() {
        items.push(compile_rule(&mut context, &rule.name, &rule.params, &rule.body));

        let index = rule.index;
        let ident = rule_ident(&rule.name);
        arms.push(quote! { #index => #ident(self, __engine, __args), });
    }

    let grammar_name = grammar.name();
    let root = grammar.root_rule().index();
    let action_count = context.actions;
    let patterns = &context.patterns;
    let registry = grammar.iter_rules().map(|rule| {
        let name = &rule.name;
        let rendered = &rule.rendered;
        quote! { (#name, #rendered) }
    });
    let params = grammar.iter_rules().map(|rule| {
        let params = &rule.params;
        quote! { &[#(#params),*] }
    });

    log::debug!(
        "translated grammar `{}`: {} rules, {} actions, {} patterns",
        grammar_name,
        arms.len(),
        action_count,
        patterns.len()
    );

    // No inner attributes: the output is `include!`d by build scripts.
    quote! {
        #[allow(unused_imports)]
        use ::packrat_runtime::RuleSet as _;
        #[allow(unused_imports)]
        use ::std::collections::HashMap;
        #[allow(unused_imports)]
        use ::std::sync::Arc;

        /// Declared name and rendered body of every rule, by rule index.
        pub const RULES: &[(&str, &str)] = &[#(#registry),*];

        #[allow(dead_code)]
        const PARAMS: &[&[&str]] = &[#(#params),*];
        #[allow(dead_code)]
        const PATTERNS: &[&str] = &[#(#patterns),*];
        #[allow(dead_code)]
        const ACTION_COUNT: usize = #action_count;

        pub struct Parser {
            actions: Vec<Arc<::packrat_runtime::ActionFn>>,
            patterns: Vec<::packrat_runtime::regex::Regex>,
            foreign: HashMap<String, Arc<dyn ::packrat_runtime::RuleSet>>,
            registry: Vec<::packrat_runtime::RuleInfo>,
        }

        impl Parser {
            /// `actions` are the grammar's semantic actions in tree order.
            pub fn new(
                actions: Vec<Arc<::packrat_runtime::ActionFn>>,
            ) -> Result<Parser, Box<dyn ::std::error::Error + Send + Sync>> {
                if actions.len() != ACTION_COUNT {
                    return Err(format!("expected {} actions, got {}", ACTION_COUNT, actions.len()).into());
                }

                let mut patterns = Vec::with_capacity(PATTERNS.len());
                for pattern in PATTERNS {
                    patterns.push(::packrat_runtime::regex::Regex::new(pattern)?);
                }

                let registry = RULES
                    .iter()
                    .zip(PARAMS)
                    .map(|(&(name, rendered), params)| ::packrat_runtime::RuleInfo {
                        name: name.to_owned(),
                        rendered: rendered.to_owned(),
                        params: params.iter().map(|p| (*p).to_owned()).collect(),
                    })
                    .collect();

                Ok(Parser {
                    actions,
                    patterns,
                    foreign: HashMap::new(),
                    registry,
                })
            }

            /// Make the rules of `grammar` callable as `%name.rule`.
            pub fn link(mut self, name: &str, grammar: Arc<dyn ::packrat_runtime::RuleSet>) -> Parser {
                self.foreign.insert(name.to_owned(), grammar);
                self
            }
        }

        impl ::packrat_runtime::RuleSet for Parser {
            fn name(&self) -> &str {
                #grammar_name
            }

            fn rules(&self) -> &[::packrat_runtime::RuleInfo] {
                &self.registry
            }

            fn root(&self) -> Option<::packrat_runtime::RuleId> {
                Some(::packrat_runtime::RuleId(#root))
            }

            fn invoke_body(
                &self,
                __engine: &mut ::packrat_runtime::Engine<'_>,
                __rule: ::packrat_runtime::RuleId,
                __args: &[::packrat_runtime::Value],
            ) -> ::packrat_runtime::RuleResult<::packrat_runtime::Value> {
                match __rule.index() {
                    #(#arms)*
                    _ => ::packrat_runtime::RuleResult::Failed,
                }
            }
        }

        #(#items)*
    }
}

/// `compile_grammar` rendered as source text, ready to be placed inside a
/// `mod` item.
pub fn to_source(grammar: &Grammar) -> String {
    compile_grammar(grammar).to_string()
}

fn compile_rule(context: &mut Context, name: &str, params: &[String], body: &Operator) -> TokenStream {
    let ident = rule_ident(name);
    let body = compile_expr(context, body);
    let bind_params = params.iter().enumerate().map(|(i, param)| {
        quote! { __scope.bind(#param, __args.get(#i).cloned().unwrap_or_default()); }
    });

    quote! {
        #[allow(non_snake_case, unused, clippy::all)]
        fn #ident(
            __parser: &Parser,
            __engine: &mut ::packrat_runtime::Engine<'_>,
            __args: &[::packrat_runtime::Value],
        ) -> ::packrat_runtime::RuleResult<::packrat_runtime::Value> {
            let mut __scope_frame = ::packrat_runtime::Scope::new();
            let __scope = &mut __scope_frame;
            #(#bind_params)*
            #body
        }
    }
}

fn compile_expr(context: &mut Context, op: &Operator) -> TokenStream {
    match op {
        Operator::Dot => quote! {
            match __engine.get_char() {
                Some(__c) => ::packrat_runtime::RuleResult::Matched(__engine.pos(), ::packrat_runtime::Value::Char(__c)),
                None => ::packrat_runtime::RuleResult::Failed,
            }
        },

        Operator::LiteralString(literal) => quote! {
            match __engine.match_string(#literal) {
                Some(__m) => ::packrat_runtime::RuleResult::Matched(__engine.pos(), ::packrat_runtime::Value::from(__m)),
                None => ::packrat_runtime::RuleResult::Failed,
            }
        },

        Operator::LiteralPattern(pattern) => {
            let index = context.patterns.len();
            context.patterns.push(pattern.regex().as_str().to_owned());
            quote! {
                match __engine.scan(&__parser.patterns[#index]) {
                    Some(__m) => ::packrat_runtime::RuleResult::Matched(__engine.pos(), ::packrat_runtime::Value::from(__m)),
                    None => ::packrat_runtime::RuleResult::Failed,
                }
            }
        }

        Operator::CharRange(lo, hi) => match char_bounds(lo, hi) {
            Some((lo, hi)) => quote! {
                match __engine.char_range(#lo, #hi) {
                    Some(__c) => ::packrat_runtime::RuleResult::Matched(__engine.pos(), ::packrat_runtime::Value::Char(__c)),
                    None => ::packrat_runtime::RuleResult::Failed,
                }
            },
            None => quote!(::packrat_runtime::RuleResult::Failed),
        },

        Operator::Sequence(ops) => {
            let steps: Vec<TokenStream> = ops.iter().map(|op| compile_expr(context, op)).collect();
            let body = steps.iter().rfold(
                quote!(::packrat_runtime::RuleResult::Matched(__engine.pos(), __value)),
                |continuation, step| {
                    quote! {
                        match #step {
                            ::packrat_runtime::RuleResult::Matched(_, __value) => { #continuation }
                            ::packrat_runtime::RuleResult::Failed => {
                                __scope.rollback(__mark);
                                __engine.set_pos(__start);
                                ::packrat_runtime::RuleResult::Failed
                            }
                        }
                    }
                },
            );
            quote! {{
                let __start = __engine.pos();
                let __mark = __scope.mark();
                let __value = ::packrat_runtime::Value::Nil;
                #body
            }}
        }

        Operator::Choice(ops) => {
            let alternatives: Vec<TokenStream> = ops.iter().map(|op| compile_expr(context, op)).collect();
            alternatives
                .iter()
                .rfold(quote!(::packrat_runtime::RuleResult::Failed), |fallback, alternative| {
                    quote! {{
                        match #alternative {
                            ::packrat_runtime::RuleResult::Matched(__end, __value) => {
                                ::packrat_runtime::RuleResult::Matched(__end, __value)
                            }
                            ::packrat_runtime::RuleResult::Failed => #fallback,
                        }
                    }}
                })
        }

        Operator::Repeat { op, min, max, captures } => {
            let inner = compile_expr(context, op);

            let max_check = max.map(|max| quote! { if __count >= #max { break; } });
            let zero_width_check = if max.is_none() {
                quote! { if __end == __before { break; } }
            } else {
                quote!()
            };
            let (step, result) = if *captures {
                (
                    quote! { __items.push(__value); },
                    quote!(::packrat_runtime::Value::List(__items)),
                )
            } else {
                (quote! { __last = __value; }, quote!(__last))
            };

            quote! {{
                let __start = __engine.pos();
                let __mark = __scope.mark();
                let mut __count: usize = 0;
                let mut __items: Vec<::packrat_runtime::Value> = Vec::new();
                let mut __last = ::packrat_runtime::Value::Nil;

                loop {
                    #max_check
                    let __before = __engine.pos();
                    match #inner {
                        ::packrat_runtime::RuleResult::Matched(__end, __value) => {
                            __count += 1;
                            #step
                            #zero_width_check
                        }
                        ::packrat_runtime::RuleResult::Failed => break,
                    }
                }

                if __count < #min {
                    __scope.rollback(__mark);
                    __engine.set_pos(__start);
                    ::packrat_runtime::RuleResult::Failed
                } else {
                    ::packrat_runtime::RuleResult::Matched(__engine.pos(), #result)
                }
            }}
        }

        Operator::AndPredicate(op) => {
            if let Operator::Action(_) = op.as_ref() {
                let action = compile_action(context);
                return quote! {{
                    let __value = #action;
                    if __value.is_truthy() {
                        ::packrat_runtime::RuleResult::Matched(__engine.pos(), __value)
                    } else {
                        ::packrat_runtime::RuleResult::Failed
                    }
                }};
            }

            let inner = compile_expr(context, op);
            quote! {{
                let __start = __engine.pos();
                let __mark = __scope.mark();
                let __assert_res = #inner;
                __scope.rollback(__mark);
                __engine.set_pos(__start);
                match __assert_res {
                    ::packrat_runtime::RuleResult::Matched(_, __value) => ::packrat_runtime::RuleResult::Matched(__start, __value),
                    ::packrat_runtime::RuleResult::Failed => ::packrat_runtime::RuleResult::Failed,
                }
            }}
        }

        Operator::NotPredicate(op) => {
            if let Operator::Action(_) = op.as_ref() {
                let action = compile_action(context);
                return quote! {{
                    if (#action).is_truthy() {
                        ::packrat_runtime::RuleResult::Failed
                    } else {
                        ::packrat_runtime::RuleResult::Matched(__engine.pos(), ::packrat_runtime::Value::Nil)
                    }
                }};
            }

            let inner = compile_expr(context, op);
            quote! {{
                let __start = __engine.pos();
                let __mark = __scope.mark();
                let __assert_res = #inner;
                __scope.rollback(__mark);
                __engine.set_pos(__start);
                match __assert_res {
                    ::packrat_runtime::RuleResult::Matched(..) => ::packrat_runtime::RuleResult::Failed,
                    ::packrat_runtime::RuleResult::Failed => ::packrat_runtime::RuleResult::Matched(__start, ::packrat_runtime::Value::Nil),
                }
            }}
        }

        Operator::Tag(op, name) => {
            let inner = compile_expr(context, op);
            quote! {
                match #inner {
                    ::packrat_runtime::RuleResult::Matched(__end, __value) => {
                        __scope.bind(#name, __value.clone());
                        ::packrat_runtime::RuleResult::Matched(__end, __value)
                    }
                    ::packrat_runtime::RuleResult::Failed => ::packrat_runtime::RuleResult::Failed,
                }
            }
        }

        Operator::Action(_) => {
            let action = compile_action(context);
            quote! { ::packrat_runtime::RuleResult::Matched(__engine.pos(), #action) }
        }

        Operator::Collect(op) => {
            let inner = compile_expr(context, op);
            quote! {{
                let __start = __engine.pos();
                match #inner {
                    ::packrat_runtime::RuleResult::Matched(__end, _) => {
                        let __value = ::packrat_runtime::Value::from(__engine.slice(__start, __end));
                        __scope.bind("text", __value.clone());
                        ::packrat_runtime::RuleResult::Matched(__end, __value)
                    }
                    ::packrat_runtime::RuleResult::Failed => ::packrat_runtime::RuleResult::Failed,
                }
            }}
        }

        Operator::Bounds(op) => {
            let inner = compile_expr(context, op);
            quote! {{
                let __start = __engine.pos();
                match #inner {
                    ::packrat_runtime::RuleResult::Matched(__end, _) => {
                        let __value = ::packrat_runtime::Value::Span(__start, __end);
                        __scope.bind("bounds", __value.clone());
                        ::packrat_runtime::RuleResult::Matched(__end, __value)
                    }
                    ::packrat_runtime::RuleResult::Failed => ::packrat_runtime::RuleResult::Failed,
                }
            }}
        }

        Operator::RuleReference(name, args) => match context.grammar.lookup(name) {
            Some(id) => {
                let id = id.index();
                let args = compile_args(args);
                quote! { __engine.apply(__parser, ::packrat_runtime::RuleId(#id), &#args) }
            }
            None => quote!(::packrat_runtime::RuleResult::Failed),
        },

        Operator::DirectRuleCall(name, args) => match context.grammar.lookup(name) {
            Some(id) => {
                let id = id.index();
                let args = compile_args(args);
                quote! { __engine.invoke(__parser, ::packrat_runtime::RuleId(#id), &#args) }
            }
            None => quote!(::packrat_runtime::RuleResult::Failed),
        },

        Operator::ForeignRuleReference { grammar, rule, args } => {
            let args = compile_args(args);
            quote! {
                match __parser.foreign.get(#grammar) {
                    Some(__callee) => match __callee.lookup(#rule) {
                        Some(__id) => __engine.invoke_foreign(#grammar, __callee.as_ref(), __id, &#args),
                        None => ::packrat_runtime::RuleResult::Failed,
                    },
                    None => ::packrat_runtime::RuleResult::Failed,
                }
            }
        }
    }
}

fn compile_action(context: &mut Context) -> TokenStream {
    let index = context.actions;
    context.actions += 1;
    quote! { (__parser.actions[#index])(&*__scope) }
}

fn compile_args(args: &[Arg]) -> TokenStream {
    let args = args.iter().map(|arg| match arg {
        Arg::Value(v) => compile_value(v),
        Arg::Local(name) => quote! { __scope.value(#name) },
    });
    quote! { [#(#args),*] }
}

fn compile_value(value: &Value) -> TokenStream {
    match value {
        Value::Nil => quote!(::packrat_runtime::Value::Nil),
        Value::Bool(b) => quote!(::packrat_runtime::Value::Bool(#b)),
        Value::Int(i) => quote!(::packrat_runtime::Value::Int(#i)),
        Value::Char(c) => quote!(::packrat_runtime::Value::Char(#c)),
        Value::Str(s) => quote!(::packrat_runtime::Value::Str(::std::string::String::from(#s))),
        Value::Span(start, end) => quote!(::packrat_runtime::Value::Span(#start, #end)),
        Value::List(items) => {
            let items = items.iter().map(compile_value);
            quote!(::packrat_runtime::Value::List(vec![#(#items),*]))
        }
        Value::Node(name, children) => {
            let children = children.iter().map(compile_value);
            quote!(::packrat_runtime::Value::Node(::std::string::String::from(#name), vec![#(#children),*]))
        }
    }
}
