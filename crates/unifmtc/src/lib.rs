pub mod batch;
pub mod blank_lines;
pub mod classify;
pub mod cli;
pub mod dedent;
pub mod edits;
pub mod format;
pub mod indent;
pub mod lexical;
pub mod operators;
pub mod options;
pub mod pipes;
pub mod siblings;
pub mod spacing;
mod task_pool;
pub mod trailing;

pub use format::{format, format_source};
pub use options::FormatOptions;
