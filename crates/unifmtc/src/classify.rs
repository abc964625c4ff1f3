use std::sync::LazyLock;

use regex::Regex;

use crate::operators::is_operator_char;

static SIGNATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?P<name>[A-Za-z_][\w.']*!?|\([^()\s]+\))\s*(?P<colon>:)(?:[^:+]|$)")
        .expect("signature pattern")
});

static TYPE_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(?:unique|structural)(?:\[[^\]]*\])?\s+)?(?:type|ability)\s+\S")
        .expect("type declaration pattern")
});

static USE_STMT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^use(?:\s+\S|$)").expect("use pattern"));

static DEFINITION_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:(?:unique|structural)(?:\[[^\]]*\])?\s+)?(?:(?:type|ability)\s+)?[A-Za-z_(\[][\w\s.'!(),\[\]]*$",
    )
    .expect("definition head pattern")
});

static BINDING_HEAD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[A-Za-z_][\w.']*|\([^()]*\))$").expect("binding head pattern")
});

static HEAD_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][\w.']*!?").expect("head name pattern"));

const BLOCK_TAIL_WORDS: &[&str] = &[
    "do", "where", "with", "cases", "let", "then", "else", "handle", "of",
];
const BLOCK_HEAD_WORDS: &[&str] = &["let", "cases", "match", "handle"];

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Role {
    Signature { name: String },
    Watch,
    Test,
    TypeDecl,
    Use,
    Definition { name: Option<String> },
    Other,
}

impl Role {
    /// Roles that belong at column zero unless a block is open.
    pub fn is_top_level(&self) -> bool {
        matches!(
            self,
            Self::Signature { .. } | Self::Watch | Self::Test | Self::TypeDecl
        )
    }
}

/// Classifies a line from its code text (literals collapsed, comments removed,
/// indentation stripped).
pub fn classify(code: &str) -> Role {
    let code = code.trim();
    if let Some(rest) = code.strip_prefix("test>") {
        if !rest.starts_with(['>', '=']) {
            return Role::Test;
        }
    }
    if watch_prefix_len(code).is_some() {
        return Role::Watch;
    }
    if USE_STMT.is_match(code) {
        return Role::Use;
    }
    if TYPE_DECL.is_match(code) {
        return Role::TypeDecl;
    }
    if let Some(caps) = SIGNATURE.captures(code) {
        return Role::Signature {
            name: caps["name"].to_string(),
        };
    }
    if let Some(eq) = definition_equals(code) {
        return Role::Definition {
            name: head_name(&code[..eq]),
        };
    }
    Role::Other
}

/// Byte length of a leading watch marker (`>` or `test>`), if the line is a
/// watch or test expression.
pub fn watch_prefix_len(code: &str) -> Option<usize> {
    if let Some(rest) = code.strip_prefix("test>") {
        if !rest.starts_with(['>', '=']) {
            return Some("test>".len());
        }
    }
    let rest = code.strip_prefix('>')?;
    if rest.starts_with(['>', '=', '|']) {
        return None;
    }
    Some(1)
}

/// Byte offset of the ascription colon on a signature line.
pub fn signature_colon(code: &str) -> Option<usize> {
    let caps = SIGNATURE.captures(code)?;
    caps.name("colon").map(|m| m.start())
}

/// Byte offset of the `=` that separates a definition head from its body.
///
/// Only a standalone `=` at bracket depth zero counts, and the text before it
/// must look like a definition head (a name with simple arguments, a pattern,
/// or a type/ability declaration).
pub fn definition_equals(code: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut prev: Option<char> = None;
    let mut chars = code.char_indices().peekable();
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '"' => return None,
            '=' if depth == 0 => {
                let next = chars.peek().map(|(_, c)| *c);
                let standalone = !prev.is_some_and(is_operator_char)
                    && !matches!(next, Some('=') | Some('>'));
                if standalone {
                    let head = code[..idx].trim();
                    return DEFINITION_HEAD.is_match(head).then_some(idx);
                }
            }
            _ => {}
        }
        prev = Some(ch);
    }
    None
}

/// Name bound by a sibling binding (`name = ...` or `(pattern) = ...`).
pub fn binding_head(code: &str) -> Option<&str> {
    let eq = definition_equals(code)?;
    let head = code[..eq].trim();
    BINDING_HEAD.is_match(head).then_some(head)
}

fn head_name(head: &str) -> Option<String> {
    HEAD_NAME.find(head.trim()).map(|m| m.as_str().to_string())
}

/// Whether a line introduces a nested block or leaves an expression open so
/// the following lines continue it.
pub fn opens_block(code: &str) -> bool {
    let code = code.trim();
    let Some(last) = code.chars().last() else {
        return false;
    };
    if matches!(last, '(' | '[' | '{' | ',') || (is_operator_char(last) && last != '!') {
        return true;
    }
    let last_word = code
        .rsplit(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or("");
    if BLOCK_TAIL_WORDS.contains(&last_word) {
        return true;
    }
    let first_word = code
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .next()
        .unwrap_or("");
    if BLOCK_HEAD_WORDS.contains(&first_word) {
        return true;
    }
    code.split_whitespace().any(|word| word == "where")
}

/// Whether a line opens a `cases` block.
pub fn opens_cases(code: &str) -> bool {
    opens_block(code) && code.split_whitespace().any(|word| word == "cases")
}

/// A `pattern -> body` arm at bracket depth zero.
pub fn is_arm(code: &str) -> bool {
    let mut depth = 0usize;
    let mut prev = ' ';
    for ch in code.chars() {
        match ch {
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            '>' if depth == 0 && prev == '-' => return true,
            _ => {}
        }
        prev = ch;
    }
    false
}
