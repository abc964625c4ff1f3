//! Removes indentation shared by every line of a pasted fragment.

use std::sync::LazyLock;

use regex::Regex;

use crate::lexical::{ScanState, scan_lines};

static TOP_LEVEL_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^(?:",
        // type ascription
        r"(?:[A-Za-z_][\w.']*!?|\([^()\s]+\))\s*:(?:[^:+]|$)",
        // definition head
        r"|[A-Za-z_][\w']*(?:\.[A-Za-z_][\w']*)*(?:\s+[^\s=]+)*\s*=(?:[^=>]|$)",
        // type or ability declaration
        r"|(?:(?:unique|structural)(?:\[[^\]]*\])?\s+)?(?:type|ability)\s+\S",
        // use statement
        r"|use(?:\s|$)",
        r")",
    ))
    .expect("top-level head pattern")
});

pub fn dedent(text: &str) -> String {
    let scanned = scan_lines(text);
    let lines: Vec<&str> = text.split('\n').collect();

    // the body of a multi-line string is content, not indentation
    let movable: Vec<bool> = scanned
        .iter()
        .map(|line| line.starts_in != ScanState::InMultiLineString)
        .collect();
    let prefix = common_prefix(&lines, &movable);
    if prefix.is_empty() {
        return text.to_string();
    }

    let first = lines
        .iter()
        .zip(&scanned)
        .find(|(raw, line)| !raw.trim().is_empty() && !line.is_comment_only());
    let Some((first, _)) = first else {
        return text.to_string();
    };
    if !TOP_LEVEL_HEAD.is_match(first.trim_start()) {
        log::debug!("dedent skipped: first line is not a top-level head");
        return text.to_string();
    }

    log::debug!("dedent removing {} leading columns", prefix.len());
    lines
        .iter()
        .zip(&movable)
        .map(|(&line, &movable)| {
            if movable {
                line.strip_prefix(prefix).unwrap_or(line)
            } else {
                line
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Longest whitespace run every non-blank line starts with.
fn common_prefix<'a>(lines: &[&'a str], movable: &[bool]) -> &'a str {
    let mut prefix: Option<&'a str> = None;
    let candidates = lines
        .iter()
        .zip(movable)
        .filter(|(line, movable)| **movable && !line.trim().is_empty());
    for (&line, _) in candidates {
        let indent = &line[..line.len() - line.trim_start_matches([' ', '\t']).len()];
        prefix = Some(match prefix {
            None => indent,
            Some(current) => {
                let shared = current
                    .bytes()
                    .zip(indent.bytes())
                    .take_while(|(a, b)| a == b)
                    .count();
                &current[..shared]
            }
        });
    }
    prefix.unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::dedent;

    #[test]
    fn strips_common_indent_from_declarations() {
        assert_eq!(dedent("    foo = 1\n    bar = 2\n"), "foo = 1\nbar = 2\n");
        assert_eq!(
            dedent("  foo : Nat\n  foo =\n    1"),
            "foo : Nat\nfoo =\n  1"
        );
    }

    #[test]
    fn blank_lines_do_not_count() {
        assert_eq!(dedent("  x = 1\n\n  y = 2"), "x = 1\n\ny = 2");
    }

    #[test]
    fn leaves_body_fragments_alone() {
        let text = "    |> map f\n    |> sum";
        assert_eq!(dedent(text), text);
        let text = "  if a then b else c";
        assert_eq!(dedent(text), text);
    }

    #[test]
    fn skips_leading_comments_when_matching() {
        assert_eq!(
            dedent("  -- helper\n  use base.List\n"),
            "-- helper\nuse base.List\n"
        );
    }

    #[test]
    fn unindented_text_is_unchanged() {
        let text = "foo = 1\n  bar";
        assert_eq!(dedent(text), text);
    }

    #[test]
    fn multi_line_string_body_keeps_its_indentation() {
        assert_eq!(
            dedent("  t = \"\"\"\n a\n  \"\"\"\n  u = 1"),
            "t = \"\"\"\n a\n  \"\"\"\nu = 1"
        );
    }

    #[test]
    fn type_declarations_qualify() {
        assert_eq!(
            dedent("\tunique type Color = Red\n\tx = 1"),
            "unique type Color = Red\nx = 1"
        );
    }
}
