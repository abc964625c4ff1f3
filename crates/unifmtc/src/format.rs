use crate::blank_lines::normalize_blank_lines;
use crate::dedent::dedent;
use crate::indent::indent;
use crate::options::FormatOptions;
use crate::pipes::break_pipes;
use crate::siblings::normalize_siblings;
use crate::spacing::space;
use crate::trailing::normalize_trailing;

/// Upper bound on pipeline passes while waiting for the output to settle.
const MAX_PASSES: usize = 4;

/// Formats with the default options.
pub fn format_source(src: &str) -> String {
    format(src, &FormatOptions::default())
}

/// Formats `src`. Never fails: text the stages cannot make sense of is passed
/// through as it is.
pub fn format(src: &str, opts: &FormatOptions) -> String {
    let text = src.replace("\r\n", "\n");
    if text.trim().is_empty() {
        return String::new();
    }
    let mut current = run_stages(&text, opts);
    for pass in 2..=MAX_PASSES {
        let next = run_stages(&current, opts);
        if next == current {
            log::debug!("formatting settled after {} passes", pass - 1);
            return current;
        }
        current = next;
    }
    log::debug!("formatting still changing after {MAX_PASSES} passes");
    current
}

fn run_stages(text: &str, opts: &FormatOptions) -> String {
    let text = dedent(text);
    let text = space(&text);
    let text = indent(&text, opts);
    let text = normalize_siblings(&text, opts);
    let text = break_pipes(&text, opts);
    let text = normalize_blank_lines(&text);
    normalize_trailing(&text)
}
