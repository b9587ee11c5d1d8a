//! YAML rendering and comment recovery.
//!
//! `serde_yaml` drops comments on both ends, so the document renders its
//! own text: values are walked recursively in insertion order and each
//! key's comment block is emitted as `# ` lines above it. Parsing hands
//! the value tree to `serde_yaml` and recovers comment metadata with a
//! line scan over the same shape the renderer produces.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt::Write;

/// Render a value tree plus comment metadata to YAML text.
pub(crate) fn render(
    map: &Map<String, Value>,
    comments: &BTreeMap<String, Vec<String>>,
    inline: &BTreeMap<String, String>,
) -> String {
    let mut out = String::new();
    render_mapping(&mut out, map, "", 0, comments, inline);
    out
}

fn render_mapping(
    out: &mut String,
    map: &Map<String, Value>,
    prefix: &str,
    depth: usize,
    comments: &BTreeMap<String, Vec<String>>,
    inline: &BTreeMap<String, String>,
) {
    let pad = "  ".repeat(depth);
    for (key, value) in map {
        let path = join_path(prefix, key);
        if let Some(block) = comments.get(&path) {
            for line in block {
                let _ = writeln!(out, "{pad}# {line}");
            }
        }
        match value {
            Value::Object(child) if !child.is_empty() => {
                let _ = write!(out, "{pad}{}:", format_key(key));
                if let Some(comment) = inline.get(&path) {
                    let _ = write!(out, "  # {comment}");
                }
                out.push('\n');
                render_mapping(out, child, &path, depth + 1, comments, inline);
            }
            _ => {
                let _ = write!(out, "{pad}{}: {}", format_key(key), format_scalar(value));
                if let Some(comment) = inline.get(&path) {
                    let _ = write!(out, "  # {comment}");
                }
                out.push('\n');
            }
        }
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Keys are emitted bare when they are plain identifiers, quoted otherwise.
fn format_key(key: &str) -> String {
    let plain = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if plain {
        key.to_string()
    } else {
        serde_json::to_string(key).unwrap_or_else(|_| key.to_string())
    }
}

/// Format a single scalar the way `serde_yaml` would, on one line.
fn format_scalar(value: &Value) -> String {
    let formatted = serde_yaml::to_string(value)
        .map(|text| text.trim_end().to_string())
        .unwrap_or_default();
    if formatted.contains('\n') {
        // Block-style output does not fit the one-line shape; fall back to
        // JSON formatting, which is valid YAML flow style.
        serde_json::to_string(value).unwrap_or(formatted)
    } else {
        formatted
    }
}

/// Recover comment metadata from YAML text.
///
/// Tracks the current dotted path with an indent stack (two spaces per
/// level, matching the renderer). Accumulated `#` lines attach to the next
/// key; a ` #` suffix after an unquoted value becomes an inline comment.
pub(crate) fn extract_comments(
    input: &str,
) -> (BTreeMap<String, Vec<String>>, BTreeMap<String, String>) {
    let mut comments: BTreeMap<String, Vec<String>> = BTreeMap::new();
    let mut inline: BTreeMap<String, String> = BTreeMap::new();
    let mut pending: Vec<String> = Vec::new();
    let mut stack: Vec<String> = Vec::new();

    for raw in input.lines() {
        let trimmed = raw.trim_start();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix('#') {
            pending.push(rest.strip_prefix(' ').unwrap_or(rest).to_string());
            continue;
        }
        if trimmed.starts_with('-') {
            // Sequence items are not addressable by dotted path.
            pending.clear();
            continue;
        }
        let Some((key_part, rest)) = trimmed.split_once(':') else {
            pending.clear();
            continue;
        };

        let indent = raw.len() - trimmed.len();
        let key = key_part.trim().trim_matches(|c| c == '"' || c == '\'');
        let depth = indent / 2;
        stack.truncate(depth);
        stack.push(key.to_string());
        let path = stack.join(".");

        if !pending.is_empty() {
            comments.insert(path.clone(), std::mem::take(&mut pending));
        }

        let value = rest.trim_start();
        if !value.is_empty()
            && !value.starts_with('"')
            && !value.starts_with('\'')
            && let Some(idx) = value.find(" #")
        {
            let comment = value[idx + 2..].trim_start();
            if !comment.is_empty() {
                inline.insert(path, comment.to_string());
            }
        }
    }

    (comments, inline)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;

    #[test]
    fn test_render_nested_with_comments() {
        let mut doc = Document::new();
        doc.set_str("locale", "en_US");
        doc.set_comments("locale", ["The locale to use.", "Default value: en_US."]);
        doc.set_f64("spawnChances.easy", 0.1).unwrap();
        doc.set_comments("spawnChances", ["Replacement chances by difficulty."]);

        let text = doc.render();
        assert_eq!(
            text,
            "# The locale to use.\n\
             # Default value: en_US.\n\
             locale: en_US\n\
             # Replacement chances by difficulty.\n\
             spawnChances:\n\
             \x20 easy: 0.1\n"
        );
    }

    #[test]
    fn test_comments_round_trip() {
        let mut doc = Document::new();
        doc.set_bool("dropArrows.value", true);
        doc.set_comments("dropArrows", ["Section header."]);
        doc.set_comments("dropArrows.value", ["Gate flag.", "Defaults to true."]);
        doc.set_i64("_version", 1);
        doc.set_inline_comment("_version", "I mean it! Don't touch!");

        let parsed = Document::parse_str(&doc.render()).unwrap();
        assert_eq!(parsed.comments("dropArrows"), ["Section header."]);
        assert_eq!(
            parsed.comments("dropArrows.value"),
            ["Gate flag.", "Defaults to true."]
        );
        assert_eq!(
            parsed.inline_comment("_version"),
            Some("I mean it! Don't touch!")
        );
        assert_eq!(parsed.get_bool("dropArrows.value"), Some(true));
        assert_eq!(parsed.get_i64("_version"), Some(1));
    }

    #[test]
    fn test_render_is_stable_across_parse() {
        let mut doc = Document::new();
        doc.set_str("locale", "en_US");
        doc.set_comments("locale", ["The locale to use."]);
        doc.set_f64("spawnChances.normal", 0.5).unwrap();
        doc.set_bool("debug", false);

        let first = doc.render();
        let second = Document::parse_str(&first).unwrap().render();
        assert_eq!(first, second);
    }

    #[test]
    fn test_strings_with_specials_round_trip() {
        let mut doc = Document::new();
        doc.set_str("note", "value with # hash: and colon");
        doc.set_str("flag", "true");

        let parsed = Document::parse_str(&doc.render()).unwrap();
        assert_eq!(parsed.get_str("note"), Some("value with # hash: and colon"));
        // A string that looks like a boolean must stay a string.
        assert_eq!(parsed.get_str("flag"), Some("true"));
        assert!(parsed.inline_comment("note").is_none());
    }

    #[test]
    fn test_float_precision_round_trip() {
        let mut doc = Document::new();
        doc.set_f64("chance", 0.1).unwrap();
        doc.set_f64("whole", 1.0).unwrap();

        let parsed = Document::parse_str(&doc.render()).unwrap();
        assert_eq!(parsed.get_f64("chance"), Some(0.1));
        assert_eq!(parsed.get_f64("whole"), Some(1.0));
    }
}
