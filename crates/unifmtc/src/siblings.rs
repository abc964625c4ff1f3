//! Snaps bindings that drifted deeper than their siblings back into line.

use std::collections::HashMap;

use crate::classify;
use crate::lexical::scan_lines;
use crate::options::FormatOptions;

/// Established binding column per rounded scope level.
#[derive(Debug, Default)]
pub struct ScopeIndentMap {
    cols: HashMap<usize, usize>,
}

impl ScopeIndentMap {
    pub fn get(&self, level: usize) -> Option<usize> {
        self.cols.get(&level).copied()
    }

    pub fn record(&mut self, level: usize, cols: usize) {
        self.cols.insert(level, cols);
    }

    pub fn clear(&mut self) {
        self.cols.clear();
    }
}

#[derive(Clone, Copy, Debug)]
enum Emitted {
    /// Blank, comment or literal continuation.
    Skip,
    Code {
        cols: usize,
        binding: bool,
        opener: bool,
    },
}

pub fn normalize_siblings(text: &str, opts: &FormatOptions) -> String {
    let mut scopes = ScopeIndentMap::default();
    let mut emitted: Vec<Emitted> = Vec::new();
    let mut out: Vec<String> = Vec::new();

    for (raw, line) in text.split('\n').zip(scan_lines(text)) {
        if !line.is_code_start() || line.is_blank() || line.is_comment_only() {
            emitted.push(Emitted::Skip);
            out.push(raw.to_string());
            continue;
        }
        let code = line.code_text();
        let code = code.trim();
        let (cols, rest) = opts.measure(raw);
        let binding = classify::binding_head(code).is_some();
        let opener = classify::opens_block(code);

        let mut target = cols;
        if binding && cols == 0 {
            scopes.clear();
        } else if binding {
            let level = opts.level_of(cols);
            target = match scopes.get(level) {
                Some(established) => established,
                None => match previous_binding(&emitted) {
                    Some(prev) if prev < cols => prev,
                    _ => cols,
                },
            };
            if target != cols {
                log::trace!("snapping `{code}` from column {cols} to {target}");
            }
            scopes.record(level, target);
        }
        if opener {
            scopes.clear();
        }

        emitted.push(Emitted::Code {
            cols: target,
            binding,
            opener,
        });
        if target == cols {
            out.push(raw.to_string());
        } else {
            out.push(opts.place(target, rest));
        }
    }
    out.join("\n")
}

/// Column of the nearest earlier binding in the same block, if any.
fn previous_binding(emitted: &[Emitted]) -> Option<usize> {
    for entry in emitted.iter().rev() {
        let Emitted::Code {
            cols,
            binding,
            opener,
        } = *entry
        else {
            continue;
        };
        if opener || cols == 0 {
            return None;
        }
        if binding {
            return Some(cols);
        }
    }
    None
}
