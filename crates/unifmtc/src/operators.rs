//! Binary operator table.
//!
//! Entries are ordered longest first. Each entry lists the characters that may
//! not touch it on either side; a neighbour from those sets would turn the match
//! into part of a longer operator, so the rewrite is suppressed. New compound
//! operators go into this table, never into the spacing code.

#[derive(Debug)]
pub struct OperatorRule {
    pub text: &'static str,
    /// Characters that may not immediately precede the operator.
    pub not_after: &'static [char],
    /// Characters that may not immediately follow the operator.
    pub not_before: &'static [char],
    /// A `+`/`-` that can also be the sign of a numeric literal.
    pub sign: bool,
}

const fn rule(
    text: &'static str,
    not_after: &'static [char],
    not_before: &'static [char],
) -> OperatorRule {
    OperatorRule {
        text,
        not_after,
        not_before,
        sign: false,
    }
}

const fn sign(
    text: &'static str,
    not_after: &'static [char],
    not_before: &'static [char],
) -> OperatorRule {
    OperatorRule {
        text,
        not_after,
        not_before,
        sign: true,
    }
}

pub const OPERATORS: &[OperatorRule] = &[
    rule("<|>", &['<', '|'], &['>', '=', '|']),
    rule("===", &['=', '!', '<', '>'], &['=']),
    rule("|>", &['<', '|'], &['>', '=', '|']),
    rule("<|", &['<'], &['>', '|']),
    rule("++", &['+'], &['+', ':']),
    rule("+:", &['+', ':'], &[':']),
    rule(":+", &[':', '+'], &['+']),
    rule("==", &['=', '!', '<', '>'], &['=', '>']),
    rule("!=", &['!'], &['=']),
    rule("<=", &['<'], &['=', '>']),
    rule(">=", &['>'], &['=']),
    rule("&&", &['&'], &['&']),
    rule("||", &['|', '<'], &['|', '>']),
    rule("->", &['-', '<'], &['>']),
    rule(">>", &['>', '|', '-'], &['>', '=']),
    rule("<<", &['<'], &['<', '|', '=']),
    sign("+", &['+', ':'], &['+', ':']),
    sign("-", &['-', '<'], &['-', '>']),
    rule("*", &['*'], &['*']),
    rule("/", &['/'], &['/', '=']),
    rule("<", &['<', '='], &['<', '|', '=', '>', '-']),
    rule(">", &['>', '-', '|', '=', '<'], &['>', '=']),
];

/// Pipe-style operators, the three-character alternative first so that it is
/// counted once.
pub const PIPE_OPERATORS: &[&str] = &["<|>", "|>", "<|"];

pub fn is_operator_char(ch: char) -> bool {
    matches!(
        ch,
        '+' | '-' | '*' | '/' | '<' | '>' | '=' | '!' | '|' | '&' | ':' | '^' | '%' | '~' | '$'
    )
}

/// Longest admissible operator starting at `chars[idx]`.
pub fn match_at(chars: &[char], idx: usize) -> Option<&'static OperatorRule> {
    let prev = idx.checked_sub(1).map(|p| chars[p]);
    // qualified operator name such as `Nat.+`
    if prev == Some('.') {
        return None;
    }
    for op in OPERATORS {
        if !starts_with(chars, idx, op.text) {
            continue;
        }
        let len = op.text.chars().count();
        let next = chars.get(idx + len).copied();
        if prev.is_some_and(|ch| op.not_after.contains(&ch)) {
            continue;
        }
        if next.is_some_and(|ch| op.not_before.contains(&ch)) {
            continue;
        }
        // operator section such as `(+)` or `(|>)`
        if prev == Some('(') && next == Some(')') {
            return None;
        }
        if op.sign && is_exponent(chars, idx) {
            return None;
        }
        return Some(op);
    }
    None
}

/// A `+`/`-` directly followed by a digit is a sign rather than a binary
/// operator when it opens an operand: at line start, after whitespace, an
/// opening bracket, a comma, or another operator.
pub fn is_unary_sign(op: &OperatorRule, before: Option<char>, next: Option<char>) -> bool {
    if !op.sign || !next.is_some_and(|ch| ch.is_ascii_digit()) {
        return false;
    }
    match before {
        None => true,
        Some(ch) => {
            ch.is_whitespace() || matches!(ch, '(' | '[' | '{' | ',') || is_operator_char(ch)
        }
    }
}

/// The pipe operator `text` starts with, if any.
pub fn pipe_prefix(text: &str) -> Option<&'static str> {
    PIPE_OPERATORS.iter().copied().find(|op| text.starts_with(op))
}

fn starts_with(chars: &[char], idx: usize, text: &str) -> bool {
    let mut pos = idx;
    for ch in text.chars() {
        if chars.get(pos) != Some(&ch) {
            return false;
        }
        pos += 1;
    }
    true
}

// `1.5e-3`: the sign belongs to the literal
fn is_exponent(chars: &[char], idx: usize) -> bool {
    if idx < 2 {
        return false;
    }
    matches!(chars[idx - 1], 'e' | 'E')
        && chars[idx - 2].is_ascii_digit()
        && chars.get(idx + 1).is_some_and(|ch| ch.is_ascii_digit())
}
