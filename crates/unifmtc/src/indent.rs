//! Assigns every code line an indentation that is a whole number of levels.

use crate::classify::{self, Role};
use crate::lexical::{ScanState, scan_lines};
use crate::options::FormatOptions;

/// Layout state carried from one line to the next.
#[derive(Debug, Default)]
pub struct BlockState {
    pub in_multi_line_string: bool,
    /// Inside a `cases` block; arm lines keep their indentation.
    pub in_cases_block: bool,
    /// The previous lines left a block or expression open, so declarations
    /// that look top-level are really nested.
    pub in_multi_line_block: bool,
}

pub fn indent(text: &str, opts: &FormatOptions) -> String {
    let mut state = BlockState::default();
    // signature sitting at column zero whose definition may follow
    let mut open_signature: Option<String> = None;
    let mut out: Vec<String> = Vec::new();

    for (raw, line) in text.split('\n').zip(scan_lines(text)) {
        let starts_in_string = state.in_multi_line_string;
        state.in_multi_line_string = line.ends_in == ScanState::InMultiLineString;
        if starts_in_string || !line.is_code_start() || line.is_comment_only() {
            out.push(raw.to_string());
            continue;
        }
        if line.is_blank() {
            out.push(String::new());
            continue;
        }

        let code = line.code_text();
        let code = code.trim();
        let (cols, rest) = opts.measure(raw);
        let mut level = opts.level_of(cols);
        let role = classify::classify(code);

        if level > 0 && should_force(&role, code, &state, open_signature.as_deref()) {
            log::trace!("forcing `{code}` to column 0");
            level = 0;
        }

        open_signature = match &role {
            Role::Signature { name } if level == 0 => Some(name.clone()),
            _ => None,
        };
        if classify::opens_cases(code) {
            state.in_cases_block = true;
        } else if level == 0 && matches!(role, Role::Definition { .. }) {
            state.in_cases_block = false;
        }
        if level == 0 {
            state.in_multi_line_block = classify::opens_block(code);
        } else if classify::opens_block(code) {
            state.in_multi_line_block = true;
        }

        out.push(opts.place(opts.cols_of(level), rest));
    }
    out.join("\n")
}

fn should_force(role: &Role, code: &str, state: &BlockState, signature: Option<&str>) -> bool {
    if let Role::Definition { name: Some(name) } = role {
        if signature == Some(name.as_str()) {
            return true;
        }
    }
    if !role.is_top_level() || state.in_multi_line_block {
        return false;
    }
    !(state.in_cases_block && classify::is_arm(code))
}
