use std::fmt::Write;

use crate::fmt::{Formatter, Result};

/// Writes `text` on a new line with every line indented by `depth` tabs.
///
/// `\n`, `\r` and `\r\n` each end a line and are written as they are.
///
/// # Examples
///
/// ```
/// use pugvm::fmt::Formatter;
///
/// let mut s = String::new();
/// pugvm::reindent("a\nb", 1, &mut Formatter::with_string(&mut s))?;
/// assert_eq!(s, "\n\ta\n\tb");
/// # Ok::<(), pugvm::fmt::Error>(())
/// ```
pub fn reindent(text: &str, depth: usize, f: &mut Formatter<'_>) -> Result {
    f.write_char('\n')?;
    let mut rest = text;
    while !rest.is_empty() {
        for _ in 0..depth {
            f.write_char('\t')?;
        }
        let end = rest.find(|c: char| c == '\r' || c == '\n').unwrap_or(rest.len());
        let term = match &rest[end..] {
            r if r.starts_with("\r\n") => 2,
            "" => 0,
            _ => 1,
        };
        let (line, tail) = rest.split_at(end + term);
        f.write_str(line)?;
        rest = tail;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[track_caller]
    fn check(text: &str, depth: usize, expected: &str) {
        let mut s = String::new();
        reindent(text, depth, &mut Formatter::with_string(&mut s)).unwrap();
        assert_eq!(s, expected);
    }

    #[test]
    fn reindent_lines() {
        check("a\nb", 1, "\n\ta\n\tb");
        check("a\n", 2, "\n\t\ta\n");
        check("a", 0, "\na");
    }

    #[test]
    fn reindent_line_terminators() {
        check("a\r\nb\rc", 1, "\n\ta\r\n\tb\r\tc");
        check("\n\nx", 1, "\n\t\n\t\n\tx");
    }

    #[test]
    fn reindent_empty() {
        check("", 3, "\n");
    }
}
