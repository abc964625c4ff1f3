//! Intra-line spacing: binary operators, commas, the signature colon, the
//! definition equals and watch prefixes. Only code segments are rewritten.

use crate::classify::{self, Role};
use crate::lexical::{ScannedLine, SegmentKind, scan_lines};
use crate::operators::{self, is_operator_char};

pub fn space(text: &str) -> String {
    let scanned = scan_lines(text);
    let mut out: Vec<String> = Vec::with_capacity(scanned.len());
    for (raw, line) in text.split('\n').zip(&scanned) {
        out.push(space_line(raw, line));
    }
    out.join("\n")
}

fn space_line(raw: &str, line: &ScannedLine<'_>) -> String {
    if line.is_blank() || line.is_comment_only() {
        return raw.to_string();
    }
    if !line.is_code_start() {
        // continuation of a multi-line literal or comment; only code after the
        // closing delimiter is touched
        let mut out = String::new();
        emit_segments(line, 0, &mut out);
        return out;
    }

    let indent_len = raw.len() - raw.trim_start_matches([' ', '\t']).len();
    let indent = &raw[..indent_len];
    let role = classify::classify(&line.code_text());
    if role == Role::Use {
        return raw.to_string();
    }

    // first code segment without indentation or watch marker
    let Some(first) = line.segments.first() else {
        return raw.to_string();
    };
    let mut out = String::new();
    let mut head = if first.kind == SegmentKind::Code {
        &first.text[indent_len.min(first.text.len())..]
    } else {
        ""
    };
    if matches!(role, Role::Watch | Role::Test) {
        if let Some(len) = classify::watch_prefix_len(head) {
            out.push_str(&head[..len]);
            head = head[len..].trim_start();
            if !head.is_empty() || line.segments.len() > 1 {
                out.push(' ');
            }
        }
    }
    let special = match role {
        Role::Signature { .. } => classify::signature_colon(head),
        Role::Definition { .. } | Role::TypeDecl => classify::definition_equals(head),
        _ => None,
    };

    if first.kind == SegmentKind::Code {
        let more = line.segments.len() > 1;
        space_code(head, special, more, &mut out);
        emit_segments(line, 1, &mut out);
    } else {
        emit_segments(line, 0, &mut out);
    }
    format!("{indent}{out}")
}

fn emit_segments(line: &ScannedLine<'_>, from: usize, out: &mut String) {
    let count = line.segments.len();
    for (idx, seg) in line.segments.iter().enumerate().skip(from) {
        match seg.kind {
            SegmentKind::Code => space_code(seg.text, None, idx + 1 < count, out),
            SegmentKind::Literal | SegmentKind::Comment => out.push_str(seg.text),
        }
    }
}

/// Spaces one code span into `out`. `special` is the byte offset of a `:` or
/// `=` that is spaced like a binary operator; `more` says whether another
/// segment follows on the same line.
fn space_code(text: &str, special: Option<usize>, more: bool, out: &mut String) {
    let indexed: Vec<(usize, char)> = text.char_indices().collect();
    let chars: Vec<char> = indexed.iter().map(|(_, ch)| *ch).collect();
    let mut idx = 0;
    while idx < chars.len() {
        let ch = chars[idx];
        if special == Some(indexed[idx].0) {
            idx = emit_binary(&chars, idx, 1, more, out);
            continue;
        }
        if ch == ',' {
            trim_end(out);
            out.push(',');
            idx = skip_ws(&chars, idx + 1);
            let rest = chars.get(idx).copied();
            if (rest.is_some() || more) && !matches!(rest, Some(')' | ']' | '}')) {
                out.push(' ');
            }
            continue;
        }
        if !is_operator_char(ch) {
            out.push(ch);
            idx += 1;
            continue;
        }
        let mut end = idx;
        while end < chars.len()
            && is_operator_char(chars[end])
            && (end == idx || special != Some(indexed[end].0))
        {
            end += 1;
        }
        let Some(pieces) = split_run(&chars, idx, end) else {
            // a run the table cannot cover exactly is copied untouched
            out.extend(&chars[idx..end]);
            idx = end;
            continue;
        };
        let last = pieces.len() - 1;
        for (piece, (at, op)) in pieces.into_iter().enumerate() {
            let len = op.text.chars().count();
            let next = chars.get(at + len).copied();
            if operators::is_unary_sign(op, out.chars().last(), next) {
                out.push_str(op.text);
                idx = at + len;
            } else if piece < last {
                emit_before(out);
                out.push_str(op.text);
                out.push(' ');
                idx = at + len;
            } else {
                idx = emit_binary(&chars, at, len, more, out);
            }
        }
    }
}

/// Splits the operator run `chars[start..end]` into table operators, each
/// matched against its neighbours in the unspaced text. `None` when any part
/// of the run is left over.
fn split_run(
    chars: &[char],
    start: usize,
    end: usize,
) -> Option<Vec<(usize, &'static operators::OperatorRule)>> {
    let mut pieces = Vec::new();
    let mut at = start;
    while at < end {
        let op = operators::match_at(chars, at)?;
        let len = op.text.chars().count();
        if at + len > end {
            return None;
        }
        pieces.push((at, op));
        at += len;
    }
    Some(pieces)
}

fn emit_before(out: &mut String) {
    trim_end(out);
    if out
        .chars()
        .last()
        .is_some_and(|ch| !matches!(ch, '(' | '[' | '{'))
    {
        out.push(' ');
    }
}

fn emit_binary(chars: &[char], idx: usize, len: usize, more: bool, out: &mut String) -> usize {
    emit_before(out);
    out.extend(&chars[idx..idx + len]);
    let next = skip_ws(chars, idx + len);
    let rest = chars.get(next).copied();
    if (rest.is_some() || more) && !matches!(rest, Some(')' | ']' | '}')) {
        out.push(' ');
    }
    next
}

fn skip_ws(chars: &[char], mut idx: usize) -> usize {
    while idx < chars.len() && matches!(chars[idx], ' ' | '\t') {
        idx += 1;
    }
    idx
}

fn trim_end(out: &mut String) {
    let len = out.trim_end_matches([' ', '\t']).len();
    out.truncate(len);
}

#[cfg(test)]
mod tests {
    use super::space;

    #[test]
    fn spaces_binary_operators() {
        assert_eq!(space("a+b"), "a + b");
        assert_eq!(space("x = a*b-c"), "x = a * b - c");
        assert_eq!(space("a   ==  b"), "a == b");
    }

    #[test]
    fn keeps_compound_operators_whole() {
        assert_eq!(space("a<|>b"), "a <|> b");
        assert_eq!(space("xs:+x"), "xs :+ x");
        assert_eq!(space("x+:xs"), "x +: xs");
        assert_eq!(space("f|>g"), "f |> g");
        assert_eq!(space("a++b"), "a ++ b");
    }

    #[test]
    fn leaves_unknown_operator_runs_alone() {
        assert_eq!(space("x => y"), "x => y");
        assert_eq!(space("a+++b"), "a+++b");
        assert_eq!(space("a+:+b"), "a+:+b");
        assert_eq!(space("a<|<|>b"), "a<|<|>b");
    }

    #[test]
    fn operator_runs_split_into_known_operators() {
        assert_eq!(space("a+-1"), "a + -1");
        assert_eq!(space("a<=-1"), "a <= -1");
        assert_eq!(space("a+-b"), "a + - b");
    }

    #[test]
    fn unary_signs_are_not_spaced() {
        assert_eq!(space("f -1"), "f -1");
        assert_eq!(space("x=-1"), "x = -1");
        assert_eq!(space("g (-2) [1,-3]"), "g (-2) [1, -3]");
        assert_eq!(space("a-1"), "a - 1");
    }

    #[test]
    fn sections_and_qualified_operators() {
        assert_eq!(space("foldLeft (+) 0 xs"), "foldLeft (+) 0 xs");
        assert_eq!(space("Nat.+ a b"), "Nat.+ a b");
        assert_eq!(space("n = 1.0e-5"), "n = 1.0e-5");
    }

    #[test]
    fn signature_and_definition_spacing() {
        assert_eq!(space("foo:Nat"), "foo : Nat");
        assert_eq!(space("foo:Nat->Nat"), "foo : Nat -> Nat");
        assert_eq!(space("foo=1"), "foo = 1");
        assert_eq!(space("foo x   ="), "foo x =");
        assert_eq!(space("  y=2"), "  y = 2");
    }

    #[test]
    fn commas_get_one_trailing_space() {
        assert_eq!(space("[1 ,2,  3]"), "[1, 2, 3]");
        assert_eq!(space("(a,"), "(a,");
        assert_eq!(space("(,)"), "(,)");
    }

    #[test]
    fn watch_and_test_prefixes() {
        assert_eq!(space(">foo 1"), "> foo 1");
        assert_eq!(space("test>check (1==1)"), "test> check (1 == 1)");
    }

    #[test]
    fn literals_and_comments_are_copied() {
        assert_eq!(space("\"a+b\""), "\"a+b\"");
        assert_eq!(space("x = \"a,b\"++y -- a+b"), "x = \"a,b\" ++ y -- a+b");
        assert_eq!(space("-- a+b"), "-- a+b");
        assert_eq!(space("c = ?+"), "c = ?+");
    }

    #[test]
    fn multi_line_string_body_is_untouched() {
        let text = "t = \"\"\"\n  a+b,c\n  \"\"\"++x";
        assert_eq!(space(text), "t = \"\"\"\n  a+b,c\n  \"\"\" ++ x");
    }

    #[test]
    fn use_lines_are_copied() {
        assert_eq!(space("use base.Nat +"), "use base.Nat +");
    }

    #[test]
    fn spacing_is_stable() {
        let once = space("go x y=x+y*-1 |>f");
        assert_eq!(space(&once), once);
    }
}
