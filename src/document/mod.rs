//! The backing document: an ordered, nested key-value store addressed by
//! dotted paths, with per-key comment metadata.
//!
//! This is the only state that survives between sessions. The node tree
//! reads and writes it through typed dotted-path accessors; comments are
//! carried alongside the values and round-trip through the on-disk YAML
//! file so user-authored documentation is not lost on save.

mod text;

use crate::error::{ConfigError, ConfigResult};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// In-memory form of the on-disk configuration file.
///
/// Values live in an insertion-ordered mapping tree; comment blocks and
/// inline comments are keyed by the dotted path of the entry they annotate.
#[derive(Debug, Clone, Default)]
pub struct Document {
    map: Map<String, Value>,
    comments: BTreeMap<String, Vec<String>>,
    inline: BTreeMap<String, String>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a document from YAML text, recovering key comments.
    ///
    /// An empty or all-comment file parses as an empty document.
    pub fn parse_str(input: &str) -> Result<Self, serde_yaml::Error> {
        let map = if input.trim().is_empty() {
            Map::new()
        } else {
            serde_yaml::from_str::<Map<String, Value>>(input)?
        };
        let (comments, inline) = text::extract_comments(input);
        Ok(Self {
            map,
            comments,
            inline,
        })
    }

    /// Read and parse the document at `path`.
    pub fn load_path(path: &Path) -> ConfigResult<Self> {
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse_str(&input).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Render the document to YAML text with comments.
    pub fn render(&self) -> String {
        text::render(&self.map, &self.comments, &self.inline)
    }

    /// Render and write the document to `path`, creating parent directories.
    pub fn save_path(&self, path: &Path) -> ConfigResult<()> {
        let write_err = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(dir) = path.parent()
            && !dir.as_os_str().is_empty()
        {
            std::fs::create_dir_all(dir).map_err(write_err)?;
        }
        std::fs::write(path, self.render()).map_err(write_err)
    }

    /// Get the raw value at a dotted path.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.map.get(first)?;
        for segment in segments {
            current = current.as_object()?.get(segment)?;
        }
        Some(current)
    }

    /// Whether any value exists at the path.
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// Read a boolean. `None` on a missing key or a non-boolean value.
    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.get(path)?.as_bool()
    }

    /// Read an integer. A whole-valued float is accepted, since YAML does
    /// not reliably distinguish `1` from `1.0` after a hand edit.
    pub fn get_i64(&self, path: &str) -> Option<i64> {
        let value = self.get(path)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|float| float as i64))
    }

    /// Read a float. Integer values are widened.
    pub fn get_f64(&self, path: &str) -> Option<f64> {
        self.get(path)?.as_f64()
    }

    /// Read a string.
    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path)?.as_str()
    }

    /// Set a raw value at a dotted path.
    ///
    /// Intermediate mappings are created as needed; a scalar or sequence
    /// found where a mapping is required is replaced. Migrations rely on
    /// this when a flat key becomes a section.
    pub fn set(&mut self, path: &str, value: Value) {
        debug_assert!(!path.is_empty());
        let mut current = &mut self.map;
        let mut segments = path.split('.').peekable();
        while let Some(segment) = segments.next() {
            if segments.peek().is_none() {
                current.insert(segment.to_string(), value);
                return;
            }
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            let Value::Object(child) = entry else {
                unreachable!()
            };
            current = child;
        }
    }

    /// Set a boolean value.
    pub fn set_bool(&mut self, path: &str, value: bool) {
        self.set(path, Value::Bool(value));
    }

    /// Set an integer value.
    pub fn set_i64(&mut self, path: &str, value: i64) {
        self.set(path, Value::from(value));
    }

    /// Set a float value. Non-finite floats cannot be represented in the
    /// document and are rejected.
    pub fn set_f64(&mut self, path: &str, value: f64) -> ConfigResult<()> {
        match serde_json::Number::from_f64(value) {
            Some(number) => {
                self.set(path, Value::Number(number));
                Ok(())
            }
            None => Err(ConfigError::TypeMismatch {
                path: path.to_string(),
                expected: "a finite float",
                got: "a non-finite float",
            }),
        }
    }

    /// Set a string value.
    pub fn set_str(&mut self, path: &str, value: &str) {
        self.set(path, Value::String(value.to_string()));
    }

    /// Remove the value at a path, along with its comment metadata.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        self.comments.remove(path);
        self.inline.remove(path);
        let (parent, leaf) = match path.rsplit_once('.') {
            Some((parent, leaf)) => (Some(parent), leaf),
            None => (None, path),
        };
        match parent {
            None => self.map.shift_remove(leaf),
            Some(parent) => match self.get_map_mut(parent) {
                Some(map) => map.shift_remove(leaf),
                None => None,
            },
        }
    }

    fn get_map_mut(&mut self, path: &str) -> Option<&mut Map<String, Value>> {
        let mut segments = path.split('.');
        let first = segments.next()?;
        let mut current = self.map.get_mut(first)?.as_object_mut()?;
        for segment in segments {
            current = current.get_mut(segment)?.as_object_mut()?;
        }
        Some(current)
    }

    /// The comment block attached to a path. Empty if none.
    pub fn comments(&self, path: &str) -> &[String] {
        self.comments.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Attach a comment block to a path, replacing any existing block.
    pub fn set_comments<I, S>(&mut self, path: &str, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let lines: Vec<String> = lines.into_iter().map(Into::into).collect();
        if lines.is_empty() {
            self.comments.remove(path);
        } else {
            self.comments.insert(path.to_string(), lines);
        }
    }

    /// The inline comment attached to a path, if any.
    pub fn inline_comment(&self, path: &str) -> Option<&str> {
        self.inline.get(path).map(String::as_str)
    }

    /// Attach an inline comment to a path.
    pub fn set_inline_comment(&mut self, path: &str, comment: &str) {
        self.inline.insert(path.to_string(), comment.to_string());
    }

    /// Dotted paths of every scalar entry, in document order.
    pub fn scalar_paths(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_scalar_paths(&self.map, "", &mut paths);
        paths
    }

    /// Remove every scalar entry whose path is not in `keep`, then sweep
    /// out sections left empty. Returns the removed paths in document order.
    pub fn retain_scalars(&mut self, keep: &std::collections::HashSet<&str>) -> Vec<String> {
        let dropped: Vec<String> = self
            .scalar_paths()
            .into_iter()
            .filter(|path| !keep.contains(path.as_str()))
            .collect();
        for path in &dropped {
            self.remove(path);
        }
        sweep_empty_sections(&mut self.map);
        dropped
    }
}

fn collect_scalar_paths(map: &Map<String, Value>, prefix: &str, out: &mut Vec<String>) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{prefix}.{key}")
        };
        match value {
            Value::Object(child) => collect_scalar_paths(child, &path, out),
            _ => out.push(path),
        }
    }
}

fn sweep_empty_sections(map: &mut Map<String, Value>) {
    map.retain(|_, value| match value {
        Value::Object(child) => {
            sweep_empty_sections(child);
            !child.is_empty()
        }
        _ => true,
    });
}
