//! Reading a note's metadata header.
//!
//! A note starts with a YAML block delimited by `---` lines. Only scalar
//! fields are of interest here (the index reads `source` and `link`).

use serde_yaml::{Mapping, Value};

/// Returns the YAML text between the opening and closing `---` lines, or
/// `None` when the note has no header.
#[must_use]
pub fn split_header(contents: &str) -> Option<&str> {
    let contents = contents.strip_prefix('\u{feff}').unwrap_or(contents);
    let rest = contents
        .strip_prefix("---\n")
        .or_else(|| contents.strip_prefix("---\r\n"))?;

    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        if line.trim_end_matches(['\r', '\n']) == "---" {
            return Some(&rest[..offset]);
        }
        offset += line.len();
    }
    None
}

/// Looks up a scalar `field` in the header of `contents`.
///
/// Returns `Ok(None)` if there is no header, the field is absent, or it is
/// not a scalar.
///
/// # Errors
///
/// Returns the YAML parser's message when the header is not valid YAML.
pub fn read_field(contents: &str, field: &str) -> Result<Option<String>, String> {
    let Some(header) = split_header(contents) else {
        return Ok(None);
    };
    if header.trim().is_empty() {
        return Ok(None);
    }

    let mapping: Mapping = serde_yaml::from_str(header).map_err(|e| e.to_string())?;
    Ok(match mapping.get(field) {
        Some(Value::String(value)) => Some(value.clone()),
        Some(Value::Number(value)) => Some(value.to_string()),
        Some(Value::Bool(value)) => Some(value.to_string()),
        _ => None,
    })
}
