mod helpers;

use pugvm::{value, Document, Engine, ErrorKind, Options, Tag, Value};

use crate::helpers::element;

fn includer(name: &str) -> Document {
    Document::build(|b| {
        b.text("<")?;
        b.include(name)?;
        b.text(">")?;
        Ok(())
    })
    .unwrap()
}

#[test]
fn include_template() {
    let mut engine = Engine::new();
    engine.add_template("part", &helpers::outputs(&["x"]).unwrap());
    let result = engine
        .compile(&includer("part"))
        .render(value! { x: "lorem" })
        .unwrap();
    assert_eq!(result, "<lorem>");
}

#[test]
fn include_raw() {
    let mut engine = Engine::new();
    engine.add_raw("part", "#{not} <interpreted>");
    let result = engine
        .compile(&includer("part"))
        .render_from(&Value::None)
        .unwrap();
    assert_eq!(result, "<#{not} <interpreted>>");
}

#[test]
fn include_template_takes_precedence_over_raw() {
    let mut engine = Engine::new();
    engine.add_raw("part", "raw");
    engine.add_template("part", &helpers::outputs(&["'compiled'"]).unwrap());
    let result = engine
        .compile(&includer("part"))
        .render_from(&Value::None)
        .unwrap();
    assert_eq!(result, "<compiled>");
}

#[test]
fn include_unknown_target() {
    let engine = Engine::new();
    let template = engine.compile(&includer("nope"));
    assert_eq!(
        template.render_from(&Value::None).unwrap(),
        "<<!-- Context error: unknown include target `nope` -->>"
    );
    let err = template
        .render_with(&Value::None, Options::new().with_stop_on_error(true))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Include);
    assert!(!err.is_fatal());
}

#[test]
fn include_shares_structure_with_includer() {
    let mut engine = Engine::new();
    engine.add_template("para", &element("p", "lorem").unwrap());
    let doc = Document::build(|b| {
        b.include("para")?;
        b.tag(Tag::new("p"), |b| {
            b.text("ipsum")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let result = engine.compile(&doc).render_from(&Value::None).unwrap();
    assert_eq!(
        result,
        "<html><body><p>lorem</p><p>ipsum</p></body></html>"
    );
}

#[test]
fn include_pretty_reindents() {
    let mut engine = Engine::with_options(Options::pretty());
    let part = Document::build(|b| {
        b.text("a\nb")?;
        Ok(())
    })
    .unwrap();
    engine.add_template("part", &part);
    let doc = Document::build(|b| {
        b.tag(Tag::new("div"), |b| {
            b.include("part")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let result = engine.compile(&doc).render_from(&Value::None).unwrap();
    assert_eq!(result, "<html><body><div>\n\ta\n\tb\n</div></body></html>");
}

#[test]
fn include_error_carries_template_name() {
    let mut engine = Engine::with_options(Options::new().with_stop_on_error(true));
    engine.add_template("part", &helpers::outputs(&["missing"]).unwrap());
    let err = engine
        .compile(&includer("part"))
        .render_from(&Value::None)
        .unwrap_err();
    assert_eq!(err.template_name(), Some("part"));
    assert_eq!(err.message(), "unknown variable `missing`");
    assert_eq!(err.to_string(), "part: unknown variable `missing`");
}

#[test]
fn include_max_depth() {
    let mut engine = Engine::new();
    engine.set_max_include_depth(3);
    engine.add_template("loop", &includer("loop"));
    let err = engine
        .get_template("loop")
        .unwrap()
        .render_from(&Value::None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Include);
    assert!(err.is_fatal());
    assert_eq!(err.to_string(), "loop: reached maximum include depth (3)");
}

#[test]
fn include_declares_mixins_for_includer() {
    let mut engine = Engine::new();
    let mixins = Document::build(|b| {
        b.mixin("greet(name)", |b| {
            b.text("hello ")?.output("name")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    engine.add_template("mixins", &mixins);
    let doc = Document::build(|b| {
        b.include("mixins")?;
        b.call("greet", Some("'world'"))?;
        Ok(())
    })
    .unwrap();
    let result = engine.compile(&doc).render_from(&Value::None).unwrap();
    assert_eq!(result, "hello world");
}

#[test]
fn include_targets_are_listed() {
    let doc = Document::build(|b| {
        b.include("a")?;
        b.include("b")?;
        b.include("a")?;
        Ok(())
    })
    .unwrap();
    let engine = Engine::new();
    assert_eq!(engine.compile(&doc).includes(), ["a", "b"]);
}
