mod helpers;

use pugvm::{value, Builder, Document, Engine, ErrorKind, Options, Result, Value};

fn render<F>(globals: Value, f: F) -> Result<String>
where
    F: FnOnce(&mut Builder<'_>) -> Result<()>,
{
    let doc = Document::build(f)?;
    Engine::new().compile(&doc).render_from(&globals)
}

fn text<'a>(s: &'a str) -> impl FnOnce(&mut Builder<'_>) -> Result<()> + 'a {
    move |b| {
        b.text(s)?;
        Ok(())
    }
}

fn if_chain(globals: Value) -> String {
    render(globals, |b| {
        b.if_("a", text("a"))?;
        b.else_if("b", text("b"))?;
        b.else_(text("c"))?;
        Ok(())
    })
    .unwrap()
}

#[test]
fn render_if_chain() {
    assert_eq!(if_chain(value! { a: true, b: true }), "a");
    assert_eq!(if_chain(value! { a: false, b: "yes" }), "b");
    assert_eq!(if_chain(value! { a: [], b: 0 }), "c");
    assert_eq!(if_chain(value! { a: { k: 1 }, b: 0 }), "a");
}

#[test]
fn render_if_without_else() {
    let result = render(value! { a: None }, |b| {
        b.text("<")?;
        b.if_("a", text("a"))?;
        b.text(">")?;
        Ok(())
    })
    .unwrap();
    assert_eq!(result, "<>");
}

#[test]
fn render_if_condition_error_takes_else() {
    let result = render(value! {}, |b| {
        b.if_("missing", text("yes"))?;
        b.else_(text("no"))?;
        Ok(())
    })
    .unwrap();
    assert_eq!(
        result,
        "<!-- Context error: unknown variable `missing` -->no"
    );
}

#[test]
fn render_if_scope_does_not_leak() {
    let result = render(value! {}, |b| {
        b.if_("true", |b| {
            b.code("inner = 1")?.output("inner")?;
            Ok(())
        })?;
        b.output("inner")?;
        Ok(())
    })
    .unwrap();
    assert_eq!(result, "1<!-- Context error: unknown variable `inner` -->");
}

#[test]
fn render_unless() {
    for (value, expected) in [(false, "shown"), (true, "hidden")] {
        let result = render(value! { flag: value }, |b| {
            b.unless("flag", text("shown"))?;
            b.else_(text("hidden"))?;
            Ok(())
        })
        .unwrap();
        assert_eq!(result, expected);
    }
}

#[test]
fn render_unless_does_not_chain_to_else_if() {
    let err = render(value! { flag: true }, |b| {
        b.unless("flag", text("a"))?;
        b.else_if("true", text("b"))?;
        Ok(())
    })
    .unwrap_err();
    assert!(err.is_structural());
}

fn case(subject: i64, with_default: bool) -> String {
    render(value! { subject: subject }, |b| {
        b.case("subject", |b| {
            b.when("1", text("a"))?;
            b.when("2", |_| Ok(()))?;
            b.when("3", text("b"))?;
            if with_default {
                b.default(text("c"))?;
            }
            Ok(())
        })?;
        Ok(())
    })
    .unwrap()
}

#[test]
fn render_case_match() {
    assert_eq!(case(1, true), "a");
    assert_eq!(case(3, true), "b");
}

#[test]
fn render_case_falls_through_empty_when() {
    assert_eq!(case(2, true), "b");
    assert_eq!(case(2, false), "b");
}

#[test]
fn render_case_default() {
    assert_eq!(case(9, true), "c");
    assert_eq!(case(9, false), "");
}

#[test]
fn render_case_falls_through_to_default() {
    let result = render(value! { s: "x" }, |b| {
        b.case("s", |b| {
            b.when("'y'", text("y"))?;
            b.when("'x'", |_| Ok(()))?;
            b.default(text("d"))?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    assert_eq!(result, "d");
}

fn each_else(items: Value) -> String {
    render(Value::from([("items", items)]), |b| {
        b.each("x", "items", |b| {
            b.output("x")?;
            Ok(())
        })?;
        b.else_(text("none"))?;
        Ok(())
    })
    .unwrap()
}

#[test]
fn render_each_list() {
    assert_eq!(each_else(Value::from(vec![1, 2])), "12");
    assert_eq!(each_else(Value::from(["a", "b", "c"])), "abc");
}

#[test]
fn render_each_else() {
    assert_eq!(each_else(Value::from(Vec::<i32>::new())), "none");
    assert_eq!(each_else(Value::Map(Default::default())), "none");
    assert_eq!(each_else(Value::None), "none");
    assert_eq!(each_else(Value::from(0)), "none");
}

#[test]
fn render_each_scalar_runs_once() {
    assert_eq!(each_else(Value::from("lorem")), "lorem");
}

#[test]
fn render_each_map_values() {
    assert_eq!(each_else(value! { b: 2, a: 1 }), "12");
}

#[test]
fn render_each_pair() {
    let template = |items: Value| {
        render(Value::from([("items", items)]), |b| {
            b.each_pair("v", "k", "items", |b| {
                b.output("k")?.text("=")?.output("v")?.text(";")?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap()
    };
    assert_eq!(template(Value::from(["a", "b"])), "0=a;1=b;");
    assert_eq!(template(value! { y: "b", x: "a" }), "x=a;y=b;");
}

#[test]
fn render_each_binding_is_scoped() {
    let result = render(value! { x: "outer", items: [1] }, |b| {
        b.each("x", "items", |b| {
            b.output("x")?;
            Ok(())
        })?;
        b.output("x")?;
        Ok(())
    })
    .unwrap();
    assert_eq!(result, "1outer");
}

#[test]
fn render_nested_each() {
    let result = render(value! { rows: [[1, 2], [3]] }, |b| {
        b.each("row", "rows", |b| {
            b.text("[")?;
            b.each("cell", "row", |b| {
                b.output("cell")?;
                Ok(())
            })?;
            b.text("]")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    assert_eq!(result, "[12][3]");
}

#[test]
fn render_while() {
    let result = render(value! {}, |b| {
        b.code("i = 0")?;
        b.while_("i < 3", |b| {
            b.output("i")?.code("i = i + 1")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    assert_eq!(result, "012");
}

#[test]
fn render_while_condition_error_aborts() {
    let err = render(value! {}, |b| {
        b.while_("missing", text("x"))?;
        Ok(())
    })
    .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Eval);
    assert_eq!(err.to_string(), "unknown variable `missing`");
}

#[test]
fn render_eval_error_in_loop_stops_when_configured() {
    let doc = Document::build(|b| {
        b.each("x", "items", |b| {
            b.output("x.name")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let err = Engine::with_options(Options::new().with_stop_on_error(true))
        .compile(&doc)
        .render(value! { items: [{ name: "a" }, 1] })
        .unwrap_err();
    assert_eq!(err.to_string(), "cannot access `name` on integer");
}
