//! Element classification and doctype expansion.

/// Elements that never have content and are written as `<name/>`.
const SELF_CLOSING: &[&str] = &[
    "area", "base", "br", "col", "command", "embed", "hr", "img", "input", "keygen", "link",
    "meta", "param", "source", "track", "wbr",
];

/// Elements that flow with the surrounding text and therefore never start a
/// new line when pretty printing.
const INLINE: &[&str] = &[
    "a", "abbr", "acronym", "b", "br", "code", "em", "font", "i", "img", "ins", "kbd", "map",
    "samp", "small", "span", "strong", "sub", "sup",
];

pub fn is_self_closing(name: &str) -> bool {
    SELF_CLOSING.contains(&name)
}

pub fn is_inline(name: &str) -> bool {
    INLINE.contains(&name)
}

/// Expands a doctype keyword into its declaration, including the trailing
/// newline.
pub fn doctype(keyword: &str) -> String {
    let decl = match keyword {
        "html" => "<!DOCTYPE html>",
        "xml" => r#"<?xml version="1.0" encoding="utf-8" ?>"#,
        "transitional" => concat!(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Transitional//EN" "#,
            r#""http://www.w3.org/TR/xhtml1/DTD/xhtml1-transitional.dtd">"#
        ),
        "strict" => concat!(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Strict//EN" "#,
            r#""http://www.w3.org/TR/xhtml1/DTD/xhtml1-strict.dtd">"#
        ),
        "frameset" => concat!(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.0 Frameset//EN" "#,
            r#""http://www.w3.org/TR/xhtml1/DTD/xhtml1-frameset.dtd">"#
        ),
        "1.1" => concat!(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML 1.1//EN" "#,
            r#""http://www.w3.org/TR/xhtml11/DTD/xhtml11.dtd">"#
        ),
        "basic" => concat!(
            r#"<!DOCTYPE html PUBLIC "-//W3C//DTD XHTML Basic 1.1//EN" "#,
            r#""http://www.w3.org/TR/xhtml-basic/xhtml-basic11.dtd">"#
        ),
        "mobile" => concat!(
            r#"<!DOCTYPE html PUBLIC "-//WAPFORUM//DTD XHTML Mobile 1.2//EN" "#,
            r#""http://www.openmobilealliance.org/tech/DTD/xhtml-mobile12.dtd">"#
        ),
        "plist" => concat!(
            r#"<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "#,
            r#""http://www.apple.com/DTDs/PropertyList-1.0.dtd">"#
        ),
        other => return format!("<!DOCTYPE {other}>\n"),
    };
    format!("{decl}\n")
}
