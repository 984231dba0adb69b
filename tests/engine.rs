mod helpers;

use std::sync::Arc;
use std::thread;

use pugvm::{value, Document, Engine, Options, Tag, Value};

use crate::helpers::element;

#[test]
fn engine_debug() {
    let mut engine = Engine::new();
    engine.add_raw("footer", "");
    let s = format!("{engine:?}");
    assert!(s.contains("footer"));
}

#[test]
fn engine_send_and_sync() {
    let mut engine = Engine::new();
    engine.add_template("t", &helpers::outputs(&["n"]).unwrap());
    let engine = Arc::new(engine);
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                engine
                    .get_template("t")
                    .unwrap()
                    .render(value! { n: i })
                    .unwrap()
            })
        })
        .collect();
    for (i, handle) in handles.into_iter().enumerate() {
        assert_eq!(handle.join().unwrap(), i.to_string());
    }
}

#[test]
fn engine_template_shared_across_scoped_threads() {
    let engine = Engine::new();
    let doc = Document::build(|b| {
        b.each("x", "xs", |b| {
            b.code("acc = x")?.output("acc")?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();
    let template = engine.compile(&doc);
    thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let result = template.render(value! { xs: [1, 2, 3] }).unwrap();
                assert_eq!(result, "123");
            });
        }
    });
}

#[test]
fn engine_get_template() {
    let mut engine = Engine::new();
    engine.add_template("p", &element("p", "lorem").unwrap());
    assert!(engine.get_template("missing").is_none());
    let template = engine.get_template("p").unwrap();
    assert_eq!(
        template.render_from(&Value::None).unwrap(),
        "<html><body><p>lorem</p></body></html>"
    );
    assert_eq!(template.describe(), engine.get_template("p").unwrap().describe());
}

#[test]
fn engine_options_apply_at_compile_time() {
    let doc = Document::build(|b| {
        b.tag(Tag::new("div"), |b| {
            b.empty(Tag::new("p"))?;
            Ok(())
        })?;
        Ok(())
    })
    .unwrap();

    let mut engine = Engine::new();
    engine.add_template("plain", &doc);
    engine.set_options(Options::pretty());
    engine.add_template("pretty", &doc);
    assert_eq!(engine.options(), Options::pretty());

    let render = |name: &str| {
        engine
            .get_template(name)
            .unwrap()
            .render_from(&Value::None)
            .unwrap()
    };
    assert_eq!(render("plain"), "<html><body><div><p></p></div></body></html>");
    assert_eq!(
        render("pretty"),
        "<html><body><div>\n\t<p></p>\n</div></body></html>"
    );
    assert_eq!(
        engine.get_template("pretty").unwrap().program().options(),
        Options::pretty()
    );
}

#[cfg(feature = "serde")]
#[test]
fn engine_options_deserialize_defaults() {
    use serde::de::value::{Error, MapDeserializer};
    use serde::Deserialize;

    let entries = [("pretty", true)];
    let options = Options::deserialize(MapDeserializer::<_, Error>::new(entries.into_iter())).unwrap();
    assert_eq!(options, Options::pretty());
}
