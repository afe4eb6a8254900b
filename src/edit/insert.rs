use std::io::{self, BufRead, Write};
use thiserror::Error;

use crate::config::format_item;

#[derive(Debug, Error)]
pub enum InsertError {
    #[error("marker not found")]
    MarkerNotFound,

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerFound {
    /// 1-based line number of the marker in the source.
    pub line: usize,
    pub inserted: usize,
}

/// Copy `source` to `sink`, writing one formatted line per item just before
/// the first line equal to `marker`.
///
/// On `MarkerNotFound` the sink holds a copy of the whole source and must
/// not be installed.
pub fn insert<S, R, W>(
    items: &[S],
    mut source: R,
    mut sink: W,
    marker: &str,
) -> Result<MarkerFound, InsertError>
where
    S: AsRef<str>,
    R: BufRead,
    W: Write,
{
    let mut line = Vec::new();
    let mut number = 0;

    loop {
        line.clear();
        if source.read_until(b'\n', &mut line)? == 0 {
            return Err(InsertError::MarkerNotFound);
        }
        number += 1;

        let (content, terminator) = split_terminator(&line);
        if content == marker.as_bytes() {
            let terminator: &[u8] = if terminator.is_empty() {
                b"\n"
            } else {
                terminator
            };
            for item in items {
                sink.write_all(format_item(item.as_ref()).as_bytes())?;
                sink.write_all(terminator)?;
            }
            sink.write_all(&line)?;
            io::copy(&mut source, &mut sink)?;
            sink.flush()?;

            return Ok(MarkerFound {
                line: number,
                inserted: items.len(),
            });
        }

        sink.write_all(&line)?;
    }
}

fn split_terminator(line: &[u8]) -> (&[u8], &[u8]) {
    let content = line.strip_suffix(b"\n").unwrap_or(line);
    let content = content.strip_suffix(b"\r").unwrap_or(content);
    line.split_at(content.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARK: &str = "# DNA-MARK";

    fn run(source: &str, items: &[&str]) -> Result<(String, MarkerFound), InsertError> {
        let mut out = Vec::new();
        let found = insert(items, source.as_bytes(), &mut out, MARK)?;
        Ok((String::from_utf8(out).unwrap(), found))
    }

    #[test]
    fn test_inserts_before_marker() {
        let (out, found) = run("a\nb\n# DNA-MARK\nc\n", &["foo", "bar"]).unwrap();
        assert_eq!(out, "a\nb\n  \"foo\"\n  \"bar\"\n# DNA-MARK\nc\n");
        assert_eq!(found, MarkerFound { line: 3, inserted: 2 });
    }

    #[test]
    fn test_empty_items_leave_content_identical() {
        let source = "{ pkgs, ... }:\n# DNA-MARK\n}\n";
        let (out, found) = run(source, &[]).unwrap();
        assert_eq!(out, source);
        assert_eq!(found.inserted, 0);
    }

    #[test]
    fn test_missing_marker() {
        let err = run("a\nb\n#DNA-MARK\n", &["foo"]).unwrap_err();
        assert!(matches!(err, InsertError::MarkerNotFound));
    }

    #[test]
    fn test_empty_source() {
        assert!(matches!(run("", &["foo"]), Err(InsertError::MarkerNotFound)));
    }

    #[test]
    fn test_only_first_marker_gets_items() {
        let (out, found) = run("# DNA-MARK\nx\n# DNA-MARK\n", &["vim"]).unwrap();
        assert_eq!(out, "  \"vim\"\n# DNA-MARK\nx\n# DNA-MARK\n");
        assert_eq!(found.line, 1);
    }

    #[test]
    fn test_substring_does_not_match() {
        let err = run("  # DNA-MARK\n# DNA-MARK here\n", &["vim"]).unwrap_err();
        assert!(matches!(err, InsertError::MarkerNotFound));
    }

    #[test]
    fn test_crlf_marker_keeps_crlf() {
        let (out, _) = run("a\r\n# DNA-MARK\r\nb\r\n", &["git"]).unwrap();
        assert_eq!(out, "a\r\n  \"git\"\r\n# DNA-MARK\r\nb\r\n");
    }

    #[test]
    fn test_marker_on_last_line_without_newline() {
        let (out, _) = run("a\n# DNA-MARK", &["git"]).unwrap();
        assert_eq!(out, "a\n  \"git\"\n# DNA-MARK");
    }

    #[test]
    fn test_non_utf8_lines_copied_verbatim() {
        let source: &[u8] = b"\xff\xfe\n# DNA-MARK\n\xc3\n";
        let mut out = Vec::new();
        insert(&["x"], source, &mut out, MARK).unwrap();
        assert_eq!(out, b"\xff\xfe\n  \"x\"\n# DNA-MARK\n\xc3\n");
    }

    #[test]
    fn test_split_terminator() {
        assert_eq!(split_terminator(b"ab\r\n"), (&b"ab"[..], &b"\r\n"[..]));
        assert_eq!(split_terminator(b"ab\n"), (&b"ab"[..], &b"\n"[..]));
        assert_eq!(split_terminator(b"ab"), (&b"ab"[..], &b""[..]));
    }
}
