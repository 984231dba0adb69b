use pugvm::{value, Document, Engine, ErrorKind, Options, Tag, Value};

fn pair_mixin(call: Option<&str>) -> Document {
    Document::build(|b| {
        b.mixin("pair(a, b)", |b| {
            b.output("a")?.text("+")?.output("b")?;
            Ok(())
        })?;
        b.text("[")?;
        b.call("pair", call)?;
        b.text("]")?;
        Ok(())
    })
    .unwrap()
}

#[test]
fn mixin_call() {
    let result = Engine::new()
        .compile(&pair_mixin(Some("1, x")))
        .render(value! { x: "y" })
        .unwrap();
    assert_eq!(result, "[1+y]");
}

#[test]
fn mixin_arity_reported() {
    let result = Engine::new()
        .compile(&pair_mixin(Some("1")))
        .render_from(&Value::None)
        .unwrap();
    assert_eq!(
        result,
        "[<!-- Context error: Not enough arguments for mixin: pair -->]"
    );
}

#[test]
fn mixin_arity_stops_when_configured() {
    let err = Engine::with_options(Options::new().with_stop_on_error(true))
        .compile(&pair_mixin(Some("1")))
        .render_from(&Value::None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Arity);
    assert_eq!(err.to_string(), "Not enough arguments for mixin: pair");
}

#[test]
fn mixin_without_arguments() {
    let err = Engine::new()
        .compile(&pair_mixin(None))
        .render_with(&Value::None, Options::new().with_stop_on_error(true))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Arity);
}

#[test]
fn mixin_defaults() {
    let doc = Document::build(|b| {
        b.mixin("link(href, text = href, target = '_self')", |b| {
            b.tag(Tag::new("a").attr("href", "href")?.attr("target", "target")?, |b| {
                b.output("text")?;
                Ok(())
            })?;
            Ok(())
        })?;
        b.call("link", Some("'/a'"))?;
        b.call("link", Some("'/b', 'B', '_blank'"))?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new().compile(&doc).render_from(&Value::None).unwrap();
    assert_eq!(
        result,
        concat!(
            r#"<html><body><a href="/a" target="_self">/a</a>"#,
            r#"<a href="/b" target="_blank">B</a></body></html>"#
        )
    );
}

#[test]
fn mixin_arguments_evaluated_in_caller_scope() {
    let doc = Document::build(|b| {
        b.mixin("show(x)", |b| {
            b.output("x")?;
            Ok(())
        })?;
        b.each("x", "items", |b| {
            b.call("show", Some("x * 10"))?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new()
        .compile(&doc)
        .render(value! { items: [1, 2] })
        .unwrap();
    assert_eq!(result, "1020");
}

#[test]
fn mixin_parameters_do_not_leak() {
    let doc = Document::build(|b| {
        b.mixin("set(v)", |b| {
            b.code("local = v")?;
            Ok(())
        })?;
        b.call("set", Some("1"))?;
        b.output("v")?;
        b.output("local")?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new().compile(&doc).render_from(&Value::None).unwrap();
    assert_eq!(
        result,
        concat!(
            "<!-- Context error: unknown variable `v` -->",
            "<!-- Context error: unknown variable `local` -->"
        )
    );
}

#[test]
fn mixin_bare_declaration() {
    let doc = Document::build(|b| {
        b.mixin("hr", |b| {
            b.text("---")?;
            Ok(())
        })?;
        b.call("hr", None)?;
        b.call("hr", Some("'ignored'"))?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new().compile(&doc).render_from(&Value::None).unwrap();
    assert_eq!(result, "------");
}

#[test]
fn mixin_unknown() {
    let doc = Document::build(|b| {
        b.call("missing", None)?;
        b.text("after")?;
        Ok(())
    })
    .unwrap();
    let engine = Engine::new();
    let template = engine.compile(&doc);
    assert_eq!(
        template.render_from(&Value::None).unwrap(),
        "<!-- Context error: Mixin with name missing is not found -->after"
    );
    let err = template
        .render_with(&Value::None, Options::new().with_stop_on_error(true))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Lookup);
}

#[test]
fn mixin_invalid_declaration() {
    let doc = Document::build(|b| {
        b.mixin("item(1)", |b| {
            b.text("x")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new().compile(&doc).render_from(&Value::None).unwrap();
    assert_eq!(
        result,
        "<!-- Context error: Invalid mixin declaration: item -->"
    );
}

#[test]
fn mixin_declared_in_block_is_scoped() {
    let doc = Document::build(|b| {
        b.if_("true", |b| {
            b.mixin("inner", |b| {
                b.text("x")?;
                Ok(())
            })?;
            b.call("inner", None)?;
            Ok(())
        })?;
        b.call("inner", None)?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new().compile(&doc).render_from(&Value::None).unwrap();
    assert_eq!(
        result,
        "x<!-- Context error: Mixin with name inner is not found -->"
    );
}
