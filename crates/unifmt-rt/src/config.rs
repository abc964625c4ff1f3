use crate::error::RtError;

pub const ENV_PREFIX: &str = "UNIFMT";

/// Environment variable name for a manifest field, e.g.
/// `env_key("format", "indentUnit")` is `UNIFMT_FORMAT_INDENT_UNIT`.
pub fn env_key(section: &str, field: &str) -> String {
    format!(
        "{ENV_PREFIX}_{}_{}",
        to_env_key(section),
        to_env_key(field)
    )
}

fn to_env_key(name: &str) -> String {
    let mut out = String::new();
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch == '_' || ch == '-' {
            if !out.ends_with('_') {
                out.push('_');
            }
            prev_lower = false;
            continue;
        }
        let is_upper = ch.is_ascii_uppercase();
        if is_upper && prev_lower {
            out.push('_');
        }
        out.push(ch.to_ascii_uppercase());
        prev_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
    }
    out
}

pub fn parse_usize(key: &str, raw: &str) -> Result<usize, RtError> {
    raw.trim().parse::<usize>().map_err(|_| RtError::Config {
        key: key.to_string(),
        message: format!("expected a non-negative integer, got {raw:?}"),
    })
}

pub fn parse_bool(key: &str, raw: &str) -> Result<bool, RtError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(RtError::Config {
            key: key.to_string(),
            message: format!("expected true or false, got {raw:?}"),
        }),
    }
}

/// Reads an override through `lookup` (normally `std::env::var`), returning
/// `Ok(None)` when the variable is unset.
pub fn lookup_usize<F>(lookup: F, key: &str) -> Result<Option<usize>, RtError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|raw| parse_usize(key, &raw)).transpose()
}

pub fn lookup_bool<F>(lookup: F, key: &str) -> Result<Option<bool>, RtError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).map(|raw| parse_bool(key, &raw)).transpose()
}
