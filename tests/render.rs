mod helpers;

use pugvm::{value, Document, Engine, ErrorKind, Options, Tag, Value};

use crate::helpers::{element, outputs, Writer};

#[test]
fn render_output_escaped() {
    let result = Engine::new()
        .compile(&outputs(&["name"]).unwrap())
        .render(value! { name: "<b>Tom & Jerry</b>" })
        .unwrap();
    assert_eq!(result, "&lt;b&gt;Tom &amp; Jerry&lt;/b&gt;");
}

#[test]
fn render_output_unescaped() {
    let doc = Document::build(|b| {
        b.output_raw("name")?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new()
        .compile(&doc)
        .render(value! { name: "<b>bold</b>" })
        .unwrap();
    assert_eq!(result, "<b>bold</b>");
}

#[test]
fn render_output_scalars() {
    let result = Engine::new()
        .compile(&outputs(&["a", "' '", "b", "' '", "c", "' '", "d"]).unwrap())
        .render(value! { a: true, b: 123, c: 12.5, d: None })
        .unwrap();
    assert_eq!(result, "true 123 12.5 ");
}

#[test]
fn render_output_members_and_indices() {
    let result = Engine::new()
        .compile(&outputs(&["user.name", "'/'", "tags[1]", "'/'", "tags.length", "user?.missing"]).unwrap())
        .render(value! { user: { name: "John" }, tags: ["a", "b"] })
        .unwrap();
    assert_eq!(result, "John/b/2");
}

#[test]
fn render_wraps_content_in_html_and_body() {
    let result = Engine::new()
        .compile(&element("p", "lorem").unwrap())
        .render_from(&Value::None)
        .unwrap();
    assert_eq!(result, "<html><body><p>lorem</p></body></html>");
}

#[test]
fn render_explicit_html_and_body_are_not_wrapped() {
    let doc = Document::build(|b| {
        b.tag(Tag::new("html"), |b| {
            b.tag(Tag::new("body"), |b| {
                b.tag(Tag::new("p"), |b| {
                    b.text("lorem")?;
                    Ok(())
                })?;
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new().compile(&doc).render_from(&Value::None).unwrap();
    assert_eq!(result, "<html><body><p>lorem</p></body></html>");
}

#[test]
fn render_head_is_kept_out_of_body() {
    let doc = Document::build(|b| {
        b.tag(Tag::new("html"), |b| {
            b.tag(Tag::new("head"), |b| {
                b.tag(Tag::new("title"), |b| {
                    b.text("ipsum")?;
                    Ok(())
                })?;
                Ok(())
            })?;
            b.tag(Tag::new("p"), |b| {
                b.text("lorem")?;
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new().compile(&doc).render_from(&Value::None).unwrap();
    assert_eq!(
        result,
        "<html><head><title>ipsum</title></head><body><p>lorem</p></body></html>"
    );
}

#[test]
fn render_header_is_not_head() {
    let result = Engine::new()
        .compile(&element("header", "lorem").unwrap())
        .render_from(&Value::None)
        .unwrap();
    assert_eq!(result, "<html><body><header>lorem</header></body></html>");
}

#[test]
fn render_text_only_is_not_wrapped() {
    let doc = Document::build(|b| {
        b.text("lorem ipsum")?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new().compile(&doc).render_from(&Value::None).unwrap();
    assert_eq!(result, "lorem ipsum");
}

#[test]
fn render_dynamic_attributes() {
    let doc = Document::build(|b| {
        let tag = Tag::new("a")
            .id("home")
            .class("nav")
            .class("active")
            .attr("href", "url")?
            .attr_raw("title", "title")?;
        b.tag(tag, |b| {
            b.text("go")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new()
        .compile(&doc)
        .render(value! { url: "/x?a=1&b=2", title: "<T>" })
        .unwrap();
    assert_eq!(
        result,
        r#"<html><body><a href="/x?a=1&amp;b=2" title="<T>" id="home" class="nav active">go</a></body></html>"#
    );
}

#[test]
fn render_attribute_value_shapes() {
    let doc = Document::build(|b| {
        let tag = Tag::new("input")
            .attr("checked", "on")?
            .attr("disabled", "off")?
            .attr("value", "missing")?
            .attr("class", "classes")?
            .attr("style", "style")?;
        b.empty(tag)?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new()
        .compile(&doc)
        .render(value! {
            on: true,
            off: false,
            missing: None,
            classes: ["a", "b"],
            style: { color: "red" },
        })
        .unwrap();
    assert_eq!(
        result,
        r#"<html><body><input checked class="a b" style="color:red;"/></body></html>"#
    );
}

#[test]
fn render_attribute_map() {
    let doc = Document::build(|b| {
        b.empty(Tag::new("div").flag("hidden").attributes("attrs")?)?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new()
        .compile(&doc)
        .render(value! { attrs: { b: "2", a: "<1>" } })
        .unwrap();
    assert_eq!(
        result,
        r#"<html><body><div hidden a="&lt;1&gt;" b="2"></div></body></html>"#
    );
}

#[test]
fn render_doctype() {
    let doc = Document::build(|b| {
        b.doctype("html")?;
        b.empty(Tag::new("html"))?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new().compile(&doc).render_from(&Value::None).unwrap();
    assert_eq!(result, "<!DOCTYPE html>\n<html></html>");
}

#[test]
fn render_piped_text_and_comments() {
    let doc = Document::build(|b| {
        b.piped(|b| {
            b.text("lorem")?;
            Ok(())
        })?;
        b.piped(|b| {
            b.text("ipsum ")?.output("x")?;
            Ok(())
        })?;
        b.comment(true, |b| {
            b.text(" visible ")?;
            Ok(())
        })?;
        b.comment(false, |b| {
            b.text("hidden")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new().compile(&doc).render(value! { x: 1 }).unwrap();
    assert_eq!(result, "lorem\nipsum 1<!-- visible -->");
}

#[test]
fn render_code_assigns_variables() {
    let doc = Document::build(|b| {
        b.code("greeting = 'hello ' + name")?;
        b.output("greeting")?;
        Ok(())
    })
    .unwrap();
    let result = Engine::new()
        .compile(&doc)
        .render(value! { name: "world" })
        .unwrap();
    assert_eq!(result, "hello world");
}

#[test]
fn render_eval_error_is_reported_inline() {
    let result = Engine::new()
        .compile(&outputs(&["'a'", "missing", "'b'"]).unwrap())
        .render_from(&Value::None)
        .unwrap();
    assert_eq!(
        result,
        "a<!-- Context error: unknown variable `missing` -->b"
    );
}

#[test]
fn render_eval_error_stops_when_configured() {
    let err = Engine::with_options(Options::new().with_stop_on_error(true))
        .compile(&outputs(&["'a'", "missing"]).unwrap())
        .render_from(&Value::None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Eval);
    assert!(!err.is_fatal());
    assert_eq!(err.to_string(), "unknown variable `missing`");
}

#[test]
fn render_unformattable_output() {
    let err = Engine::new()
        .compile(&outputs(&["items"]).unwrap())
        .render_with(
            &Value::from([("items", vec![1, 2])]),
            Options::new().with_stop_on_error(true),
        )
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "expression evaluated to unformattable type list"
    );
}

#[test]
fn render_stray_else_is_fatal() {
    let doc = Document::build(|b| {
        b.text("a")?;
        b.else_(|b| {
            b.text("b")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let err = Engine::new()
        .compile(&doc)
        .render_from(&Value::None)
        .unwrap_err();
    assert!(err.is_structural());
    assert!(err.is_fatal());
    assert_eq!(err.to_string(), "conditional branch without a preceding `if`");
}

#[test]
fn render_line_feeds() {
    let doc = Document::build(|b| {
        b.tag(Tag::new("ul"), |b| {
            b.tag(Tag::new("li"), |b| {
                b.text("a")?;
                Ok(())
            })?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let result = Engine::with_options(Options::new().with_line_feeds(true))
        .compile(&doc)
        .render_from(&Value::None)
        .unwrap();
    assert_eq!(result, "<html><body><ul>\n<li>a</li>\n</ul>\n</body></html>");
}

#[test]
fn render_line_feeds_inline_first() {
    let doc = Document::build(|b| {
        b.empty(Tag::new("br"))?;
        Ok(())
    })
    .unwrap();
    let result = Engine::with_options(Options::new().with_line_feeds(true))
        .compile(&doc)
        .render_from(&Value::None)
        .unwrap();
    assert_eq!(result, "<html><body>\n<br/></body></html>");
}

#[test]
fn render_with_overrides_compile_options() {
    let doc = outputs(&["missing"]).unwrap();
    let engine = Engine::with_options(Options::new().with_stop_on_error(true));
    let template = engine.compile(&doc);
    assert!(template.render_from(&Value::None).is_err());
    let result = template.render_with(&Value::None, Options::new()).unwrap();
    assert_eq!(result, "<!-- Context error: unknown variable `missing` -->");
}

#[test]
fn render_to_writer() {
    let mut w = Writer::new();
    Engine::new()
        .compile(&element("p", "lorem").unwrap())
        .render_to_writer(&mut w, value! {})
        .unwrap();
    assert_eq!(w.into_string(), "<html><body><p>lorem</p></body></html>");
}

#[test]
fn render_to_writer_with_value() {
    let mut w = Writer::new();
    Engine::new()
        .compile(&outputs(&["x"]).unwrap())
        .render_to_writer_with(&mut w, &Value::from([("x", "ipsum")]), Options::new())
        .unwrap();
    assert_eq!(w.into_string(), "ipsum");
}

#[test]
fn render_to_writer_io_error() {
    let mut w = Writer::with_max(1);
    let err = Engine::new()
        .compile(&element("p", "lorem").unwrap())
        .render_to_writer(&mut w, value! {})
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Io);
    assert!(err.is_fatal());
    assert_eq!(err.to_string(), "io error: sink closed");
}
