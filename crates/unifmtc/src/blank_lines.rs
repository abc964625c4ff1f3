//! Blank-line layout between top-level items.

use crate::classify::{self, Role};
use crate::lexical::{ScanState, scan_lines};

#[derive(Clone, Copy, Debug)]
struct Previous {
    comment: bool,
    is_use: bool,
    opener: bool,
}

pub fn normalize_blank_lines(text: &str) -> String {
    let mut out: Vec<&str> = Vec::new();
    let mut pending_blank = false;
    let mut prev: Option<Previous> = None;
    // name of the column-zero signature waiting for its definition
    let mut signature: Option<String> = None;

    for (raw, line) in text.split('\n').zip(scan_lines(text)) {
        if !line.is_code_start() {
            // inside a multi-line literal or comment, blank or not
            out.push(raw);
            prev = Some(Previous {
                comment: line.starts_in != ScanState::InMultiLineString,
                is_use: false,
                opener: false,
            });
            continue;
        }
        if line.is_blank() {
            pending_blank = !out.is_empty();
            continue;
        }

        let comment = line.is_comment_only();
        let code = line.code_text();
        let role = classify::classify(&code);
        let at_column_zero = !raw.starts_with([' ', '\t']);

        if at_column_zero && !comment {
            let glued = matches!(
                (&role, &signature),
                (Role::Definition { name: Some(name) }, Some(sig)) if name == sig
            );
            if glued {
                pending_blank = false;
            } else if starts_item(raw) && separates(prev, &role) {
                pending_blank = true;
            }
            signature = match &role {
                Role::Signature { name } => Some(name.clone()),
                _ => None,
            };
        } else if at_column_zero && starts_item(raw) && separates(prev, &role) {
            pending_blank = true;
        }

        if pending_blank {
            out.push("");
            pending_blank = false;
        }
        out.push(raw);
        prev = Some(Previous {
            comment,
            is_use: role == Role::Use,
            opener: !comment && classify::opens_block(&code),
        });
    }
    out.join("\n")
}

/// Whether a new column-zero item needs a blank line after `prev`.
fn separates(prev: Option<Previous>, role: &Role) -> bool {
    let Some(prev) = prev else {
        return false;
    };
    if prev.comment || prev.opener {
        return false;
    }
    !(prev.is_use && *role == Role::Use)
}

fn starts_item(raw: &str) -> bool {
    if raw.starts_with("--") || raw.starts_with("{{") || raw.starts_with("{-") {
        return true;
    }
    raw.chars()
        .next()
        .is_some_and(|ch| ch.is_alphabetic() || matches!(ch, '_' | '(' | '>'))
}

#[cfg(test)]
mod tests {
    use super::normalize_blank_lines;

    #[test]
    fn separates_top_level_definitions() {
        assert_eq!(normalize_blank_lines("foo = 1\nbar = 2"), "foo = 1\n\nbar = 2");
    }

    #[test]
    fn collapses_runs_and_drops_leading_blanks() {
        assert_eq!(
            normalize_blank_lines("\n\nfoo = 1\n\n\n\nbar = 2"),
            "foo = 1\n\nbar = 2"
        );
    }

    #[test]
    fn signature_stays_glued_to_its_definition() {
        assert_eq!(normalize_blank_lines("foo : Nat\nfoo = 1"), "foo : Nat\nfoo = 1");
        assert_eq!(
            normalize_blank_lines("foo : Nat\n\n\nfoo = 1"),
            "foo : Nat\nfoo = 1"
        );
        assert_eq!(
            normalize_blank_lines("foo : Nat\nbar = 1"),
            "foo : Nat\n\nbar = 1"
        );
    }

    #[test]
    fn comments_attach_to_what_follows() {
        assert_eq!(
            normalize_blank_lines("x = 1\n-- about y\ny = 2"),
            "x = 1\n\n-- about y\ny = 2"
        );
        assert_eq!(
            normalize_blank_lines("{{ Docs for y }}\ny = 2"),
            "{{ Docs for y }}\ny = 2"
        );
    }

    #[test]
    fn use_lines_stay_together() {
        assert_eq!(
            normalize_blank_lines("use base.List\nuse base.Nat\nx = 1"),
            "use base.List\nuse base.Nat\n\nx = 1"
        );
    }

    #[test]
    fn nested_lines_are_not_separated() {
        let text = "foo =\n  a = 1\n  b = 2\n  a + b";
        assert_eq!(normalize_blank_lines(text), text);
    }

    #[test]
    fn blank_lines_inside_strings_survive() {
        let text = "t = \"\"\"\n\n\n  body\n  \"\"\"";
        assert_eq!(normalize_blank_lines(text), text);
    }

    #[test]
    fn watches_are_separated() {
        assert_eq!(normalize_blank_lines("x = 1\n> x"), "x = 1\n\n> x");
    }
}
