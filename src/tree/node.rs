//! The node arena: typed leaves, containers, and tiered nodes.
//!
//! Nodes live in a flat arena owned by [`Tree`]; ownership runs root to
//! leaf through each node's child list, while the parent link is a
//! non-owning index used only for path derivation. Per-setting behavior
//! (defaults, bounds, documentation) is plain data on the node, so the
//! whole tree is a closed set of three roles rather than a subtype per
//! setting.

use super::value::{Difficulty, ScalarSpec, ScalarValue};
use crate::document::Document;
use crate::error::{ConfigError, ConfigResult};

/// Index of a node within its [`Tree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

/// What a node is: a single value, a namespace, or a per-difficulty value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeRole {
    /// Holds exactly one scalar and no children.
    Leaf,
    /// Owns named children; may also hold a scalar gate value.
    Container,
    /// Owns `easy`/`normal`/`hard` leaf children; may also hold a gate.
    Tiered,
}

/// Per-tier value specifications for a tiered node.
#[derive(Debug, Clone)]
pub struct TierSpecs {
    pub easy: ScalarSpec,
    pub normal: ScalarSpec,
    pub hard: ScalarSpec,
}

/// Handles to a tiered node and its per-tier children.
#[derive(Debug, Clone, Copy)]
pub struct TieredNode {
    pub node: NodeId,
    pub easy: NodeId,
    pub normal: NodeId,
    pub hard: NodeId,
}

/// A node save that failed; siblings are still attempted.
#[derive(Debug)]
pub struct SaveIssue {
    /// Value path of the node that failed to save.
    pub path: String,
    pub error: ConfigError,
}

#[derive(Debug)]
struct NodeData {
    name: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    role: NodeRole,
    scalar: Option<ScalarSpec>,
    staged: Option<ScalarValue>,
    value_docs: Vec<String>,
    base_docs: Vec<String>,
}

/// The configuration node tree.
#[derive(Debug)]
pub struct Tree {
    nodes: Vec<NodeData>,
}

impl Default for Tree {
    fn default() -> Self {
        Self::new()
    }
}

impl Tree {
    /// Create a tree holding only the unnamed root container.
    pub fn new() -> Self {
        Self {
            nodes: vec![NodeData {
                name: String::new(),
                parent: None,
                children: Vec::new(),
                role: NodeRole::Container,
                scalar: None,
                staged: None,
                value_docs: Vec::new(),
                base_docs: Vec::new(),
            }],
        }
    }

    /// The root container.
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// All node ids, root first, in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.nodes.len()).map(NodeId)
    }

    /// The node's local name ("" for the root).
    pub fn name(&self, id: NodeId) -> &str {
        &self.nodes[id.0].name
    }

    /// The node's role.
    pub fn role(&self, id: NodeId) -> NodeRole {
        self.nodes[id.0].role
    }

    /// The node's parent, or `None` for the root.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id.0].parent
    }

    /// The node's children in insertion order.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        &self.nodes[id.0].children
    }

    /// Look up a direct child by name.
    pub fn child(&self, id: NodeId, name: &str) -> Option<NodeId> {
        self.nodes[id.0]
            .children
            .iter()
            .copied()
            .find(|child| self.nodes[child.0].name == name)
    }

    /// Whether the node carries its own scalar value slot.
    pub fn holds_value(&self, id: NodeId) -> bool {
        self.nodes[id.0].scalar.is_some()
    }

    /// Add a leaf holding a single scalar.
    pub fn add_leaf(
        &mut self,
        parent: NodeId,
        name: &'static str,
        spec: ScalarSpec,
    ) -> ConfigResult<NodeId> {
        self.push_node(parent, name, NodeRole::Leaf, Some(spec))
    }

    /// Add a container. With a `gate`, the container doubles as a switch:
    /// its own value is stored under the `value` key of its section.
    pub fn add_container(
        &mut self,
        parent: NodeId,
        name: &'static str,
        gate: Option<ScalarSpec>,
    ) -> ConfigResult<NodeId> {
        self.push_node(parent, name, NodeRole::Container, gate)
    }

    /// Add a tiered node with `easy`/`normal`/`hard` children.
    pub fn add_tiered(
        &mut self,
        parent: NodeId,
        name: &'static str,
        gate: Option<ScalarSpec>,
        tiers: TierSpecs,
    ) -> ConfigResult<TieredNode> {
        let node = self.push_node(parent, name, NodeRole::Tiered, gate)?;
        let easy = self.add_leaf(node, "easy", tiers.easy)?;
        let normal = self.add_leaf(node, "normal", tiers.normal)?;
        let hard = self.add_leaf(node, "hard", tiers.hard)?;
        Ok(TieredNode {
            node,
            easy,
            normal,
            hard,
        })
    }

    fn push_node(
        &mut self,
        parent: NodeId,
        name: &str,
        role: NodeRole,
        scalar: Option<ScalarSpec>,
    ) -> ConfigResult<NodeId> {
        debug_assert!(!name.is_empty() && !name.contains('.'));
        if self.child(parent, name).is_some() {
            return Err(ConfigError::DuplicateName {
                parent: self.base_path(parent),
                name: name.to_string(),
            });
        }
        let id = NodeId(self.nodes.len());
        self.nodes.push(NodeData {
            name: name.to_string(),
            parent: Some(parent),
            children: Vec::new(),
            role,
            scalar,
            staged: None,
            value_docs: Vec::new(),
            base_docs: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    /// Resolve a dotted path to a node. The empty path is the root.
    pub fn node_at(&self, path: &str) -> Option<NodeId> {
        if path.is_empty() {
            return Some(self.root());
        }
        let mut current = self.root();
        for segment in path.split('.') {
            current = self.child(current, segment)?;
        }
        Some(current)
    }

    /// The node's dotted path, derived by walking parent links to the
    /// root. Recomputed on every call so it stays correct if the tree
    /// shape changes between construction and save.
    pub fn base_path(&self, id: NodeId) -> String {
        let mut segments: Vec<&str> = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            let data = &self.nodes[node.0];
            if data.parent.is_some() {
                segments.push(&data.name);
            }
            current = data.parent;
        }
        segments.reverse();
        segments.join(".")
    }

    /// Where the node's own scalar lives. For a childless node this is
    /// its base path; a node with children stores its value under the
    /// reserved `value` key of its section.
    pub fn value_path(&self, id: NodeId) -> String {
        let base = self.base_path(id);
        if self.nodes[id.0].children.is_empty() {
            base
        } else if base.is_empty() {
            "value".to_string()
        } else {
            format!("{base}.value")
        }
    }

    /// Documentation lines for the node's value entry, applied to the
    /// document whenever its comment block is found empty on save.
    pub fn set_value_docs<I, S>(&mut self, id: NodeId, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes[id.0].value_docs = lines.into_iter().map(Into::into).collect();
    }

    /// Documentation lines for the node's own section header.
    pub fn set_base_docs<I, S>(&mut self, id: NodeId, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.nodes[id.0].base_docs = lines.into_iter().map(Into::into).collect();
    }

    /// The node's declared default: its own spec's default, or for a
    /// tiered node the `normal` child's default.
    pub fn default_value(&self, id: NodeId) -> Option<ScalarValue> {
        let node = &self.nodes[id.0];
        if let Some(spec) = &node.scalar {
            return Some(spec.default_value());
        }
        if node.role == NodeRole::Tiered {
            return Some(self.tier_default(id));
        }
        None
    }

    /// The node's current value: the staged write if one is pending, else
    /// the document entry at its value path, else the declared default.
    /// Document reads are clamped to the declared domain.
    pub fn value(&self, id: NodeId, doc: &Document) -> Option<ScalarValue> {
        let node = &self.nodes[id.0];
        if let Some(spec) = &node.scalar {
            if let Some(staged) = &node.staged {
                return Some(staged.clone());
            }
            let stored = read_scalar(spec, &self.value_path(id), doc);
            return Some(match stored {
                Some(value) => spec.clamp(value),
                None => spec.default_value(),
            });
        }
        if node.role == NodeRole::Tiered {
            let normal = self.child(id, "normal")?;
            return self.value(normal, doc);
        }
        None
    }

    /// Current value as a boolean; `false` when the node holds none.
    pub fn bool_value(&self, id: NodeId, doc: &Document) -> bool {
        self.value(id, doc)
            .and_then(|value| value.as_bool())
            .unwrap_or(false)
    }

    /// Current value as an integer; `0` when the node holds none.
    pub fn int_value(&self, id: NodeId, doc: &Document) -> i64 {
        self.value(id, doc)
            .and_then(|value| value.as_i64())
            .unwrap_or(0)
    }

    /// Current value as a float; `0.0` when the node holds none.
    pub fn float_value(&self, id: NodeId, doc: &Document) -> f64 {
        self.value(id, doc)
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0)
    }

    /// Current value as a string; empty when the node holds none.
    pub fn str_value(&self, id: NodeId, doc: &Document) -> String {
        self.value(id, doc)
            .and_then(|value| value.as_str().map(str::to_string))
            .unwrap_or_default()
    }

    /// Stage a value for the next save, clamped to the declared domain.
    /// Writing the wrong kind is a schema-usage defect and is rejected.
    pub fn set_value(&mut self, id: NodeId, value: ScalarValue) -> ConfigResult<()> {
        let path = self.value_path(id);
        let node = &mut self.nodes[id.0];
        let Some(spec) = &node.scalar else {
            return Err(ConfigError::TypeMismatch {
                path,
                expected: "no value",
                got: value.kind(),
            });
        };
        if !spec.accepts(&value) {
            return Err(ConfigError::TypeMismatch {
                path,
                expected: spec.kind(),
                got: value.kind(),
            });
        }
        node.staged = Some(spec.clamp(value));
        Ok(())
    }

    /// Drop all staged writes, e.g. when re-reading the backing file.
    pub fn clear_staged(&mut self) {
        for node in &mut self.nodes {
            node.staged = None;
        }
    }

    /// The value for a difficulty on a tiered node.
    ///
    /// Dispatches to the matching tier child; a difficulty with no tier
    /// resolves to the neutral value, and a missing or unreadable child
    /// falls back to the node's own default.
    pub fn tier_value(&self, id: NodeId, difficulty: Difficulty, doc: &Document) -> ScalarValue {
        let tier = match difficulty {
            Difficulty::Easy => "easy",
            Difficulty::Normal => "normal",
            Difficulty::Hard => "hard",
            Difficulty::Peaceful => return self.tier_neutral(id),
        };
        match self.child(id, tier) {
            Some(child) => self
                .value(child, doc)
                .unwrap_or_else(|| self.tier_default(id)),
            None => self.tier_default(id),
        }
    }

    fn tier_default(&self, id: NodeId) -> ScalarValue {
        self.child(id, "normal")
            .and_then(|normal| self.nodes[normal.0].scalar.as_ref())
            .map(ScalarSpec::default_value)
            .unwrap_or(ScalarValue::Int(0))
    }

    fn tier_neutral(&self, id: NodeId) -> ScalarValue {
        self.child(id, "normal")
            .and_then(|normal| self.nodes[normal.0].scalar.as_ref())
            .map(ScalarSpec::neutral_value)
            .unwrap_or(ScalarValue::Int(0))
    }

    /// Write every node's current value and documentation into the
    /// document, depth-first in insertion order.
    ///
    /// A failing node is recorded and its siblings still save. Comment
    /// blocks found empty are repopulated from node documentation, so
    /// user-deleted comments self-heal; non-empty blocks are left alone.
    pub fn save_into(&mut self, doc: &mut Document) -> Vec<SaveIssue> {
        let mut issues = Vec::new();
        self.save_children(self.root(), doc, &mut issues);
        issues
    }

    fn save_children(&mut self, id: NodeId, doc: &mut Document, issues: &mut Vec<SaveIssue>) {
        for child in self.nodes[id.0].children.clone() {
            self.save_node(child, doc, issues);
        }
    }

    fn save_node(&mut self, id: NodeId, doc: &mut Document, issues: &mut Vec<SaveIssue>) {
        if self.nodes[id.0].scalar.is_some() {
            let path = self.value_path(id);
            match self.write_value(id, &path, doc) {
                Ok(()) => {
                    self.nodes[id.0].staged = None;
                    if doc.comments(&path).is_empty() && !self.nodes[id.0].value_docs.is_empty() {
                        doc.set_comments(&path, self.nodes[id.0].value_docs.clone());
                    }
                }
                Err(error) => issues.push(SaveIssue { path, error }),
            }
        }
        if !self.nodes[id.0].children.is_empty() {
            let base = self.base_path(id);
            if doc.comments(&base).is_empty() && !self.nodes[id.0].base_docs.is_empty() {
                doc.set_comments(&base, self.nodes[id.0].base_docs.clone());
            }
            self.save_children(id, doc, issues);
        }
    }

    fn write_value(&self, id: NodeId, path: &str, doc: &mut Document) -> ConfigResult<()> {
        match self.value(id, doc) {
            Some(ScalarValue::Bool(value)) => doc.set_bool(path, value),
            Some(ScalarValue::Int(value)) => doc.set_i64(path, value),
            Some(ScalarValue::Float(value)) => doc.set_f64(path, value)?,
            Some(ScalarValue::Str(value)) => doc.set_str(path, &value),
            None => {}
        }
        Ok(())
    }
}

fn read_scalar(spec: &ScalarSpec, path: &str, doc: &Document) -> Option<ScalarValue> {
    match spec {
        ScalarSpec::Bool { .. } => doc.get_bool(path).map(ScalarValue::Bool),
        ScalarSpec::Int { .. } => doc.get_i64(path).map(ScalarValue::Int),
        ScalarSpec::Float { .. } => doc.get_f64(path).map(ScalarValue::Float),
        ScalarSpec::Str { .. } => doc.get_str(path).map(|value| ScalarValue::Str(value.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiered_fixture() -> (Tree, TieredNode) {
        let mut tree = Tree::new();
        let root = tree.root();
        let tiered = tree
            .add_tiered(
                root,
                "spawnChances",
                None,
                TierSpecs {
                    easy: ScalarSpec::float(0.1, 0.0, 1.0),
                    normal: ScalarSpec::float(0.5, 0.0, 1.0),
                    hard: ScalarSpec::float(1.0, 0.0, 1.0),
                },
            )
            .unwrap();
        (tree, tiered)
    }

    #[test]
    fn test_paths_derive_from_parents() {
        let mut tree = Tree::new();
        let root = tree.root();
        let section = tree.add_container(root, "arrowsOfDecay", None).unwrap();
        let nested = tree.add_container(section, "duration", None).unwrap();
        let leaf = tree
            .add_leaf(nested, "normal", ScalarSpec::int(200, 0, i64::MAX))
            .unwrap();

        assert_eq!(tree.base_path(root), "");
        assert_eq!(tree.base_path(leaf), "arrowsOfDecay.duration.normal");
        assert_eq!(tree.value_path(leaf), "arrowsOfDecay.duration.normal");
        assert_eq!(
            tree.node_at("arrowsOfDecay.duration.normal"),
            Some(leaf)
        );
        assert_eq!(tree.node_at("arrowsOfDecay.missing"), None);
    }

    #[test]
    fn test_gated_container_stores_value_under_section() {
        let mut tree = Tree::new();
        let root = tree.root();
        let gate = tree
            .add_container(root, "dropArrows", Some(ScalarSpec::bool(true)))
            .unwrap();
        tree.add_leaf(gate, "dropTippedArrows", ScalarSpec::bool(false))
            .unwrap();

        assert_eq!(tree.base_path(gate), "dropArrows");
        assert_eq!(tree.value_path(gate), "dropArrows.value");
    }

    #[test]
    fn test_duplicate_sibling_rejected() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.add_leaf(root, "debug", ScalarSpec::bool(false)).unwrap();

        let err = tree
            .add_leaf(root, "debug", ScalarSpec::bool(true))
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName { .. }));
    }

    #[test]
    fn test_value_prefers_staged_then_document_then_default() {
        let mut tree = Tree::new();
        let root = tree.root();
        let leaf = tree
            .add_leaf(root, "locale", ScalarSpec::string("en_US"))
            .unwrap();
        let mut doc = Document::new();

        assert_eq!(tree.str_value(leaf, &doc), "en_US");

        doc.set_str("locale", "de_DE");
        assert_eq!(tree.str_value(leaf, &doc), "de_DE");

        tree.set_value(leaf, ScalarValue::Str("fr_FR".to_string()))
            .unwrap();
        assert_eq!(tree.str_value(leaf, &doc), "fr_FR");
    }

    #[test]
    fn test_document_reads_are_clamped() {
        let mut tree = Tree::new();
        let root = tree.root();
        let leaf = tree
            .add_leaf(root, "effectLevel", ScalarSpec::int(0, -1, 255))
            .unwrap();
        let mut doc = Document::new();
        doc.set_i64("effectLevel", -50);

        assert_eq!(tree.int_value(leaf, &doc), -1);
    }

    #[test]
    fn test_set_value_clamps_instead_of_failing() {
        let mut tree = Tree::new();
        let root = tree.root();
        let leaf = tree
            .add_leaf(root, "chance", ScalarSpec::float(0.5, 0.0, 1.0))
            .unwrap();

        tree.set_value(leaf, ScalarValue::Float(42.0)).unwrap();
        assert_eq!(tree.float_value(leaf, &Document::new()), 1.0);
    }

    #[test]
    fn test_set_value_rejects_wrong_kind() {
        let mut tree = Tree::new();
        let root = tree.root();
        let leaf = tree.add_leaf(root, "debug", ScalarSpec::bool(false)).unwrap();

        let err = tree
            .set_value(leaf, ScalarValue::Int(1))
            .unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
    }

    #[test]
    fn test_tiered_dispatch_and_fallbacks() {
        let (tree, tiered) = tiered_fixture();
        let mut doc = Document::new();
        doc.set_f64("spawnChances.hard", 0.9).unwrap();

        // Configured tier reads its own entry; others fall back to their
        // defaults; the representative value is the normal tier's.
        assert_eq!(
            tree.tier_value(tiered.node, Difficulty::Hard, &doc),
            ScalarValue::Float(0.9)
        );
        assert_eq!(
            tree.tier_value(tiered.node, Difficulty::Easy, &doc),
            ScalarValue::Float(0.1)
        );
        assert_eq!(
            tree.value(tiered.node, &doc),
            Some(ScalarValue::Float(0.5))
        );
        assert_eq!(tree.default_value(tiered.node), Some(ScalarValue::Float(0.5)));
    }

    #[test]
    fn test_unmapped_difficulty_is_neutral() {
        let (tree, tiered) = tiered_fixture();
        let doc = Document::new();

        assert_eq!(
            tree.tier_value(tiered.node, Difficulty::Peaceful, &doc),
            ScalarValue::Float(0.0)
        );
    }

    #[test]
    fn test_save_materializes_values_and_docs() {
        let mut tree = Tree::new();
        let root = tree.root();
        let leaf = tree
            .add_leaf(root, "debug", ScalarSpec::bool(false))
            .unwrap();
        tree.set_value_docs(leaf, ["Whether to show debug output.", "Defaults to false."]);

        let mut doc = Document::new();
        let issues = tree.save_into(&mut doc);

        assert!(issues.is_empty());
        assert_eq!(doc.get_bool("debug"), Some(false));
        assert_eq!(
            doc.comments("debug"),
            ["Whether to show debug output.", "Defaults to false."]
        );
    }

    #[test]
    fn test_save_leaves_user_comments_alone() {
        let mut tree = Tree::new();
        let root = tree.root();
        let leaf = tree
            .add_leaf(root, "debug", ScalarSpec::bool(false))
            .unwrap();
        tree.set_value_docs(leaf, ["Canonical documentation."]);

        let mut doc = Document::new();
        doc.set_comments("debug", ["My own notes on this flag."]);
        tree.save_into(&mut doc);

        assert_eq!(doc.comments("debug"), ["My own notes on this flag."]);
    }

    #[test]
    fn test_save_clears_staged_writes() {
        let mut tree = Tree::new();
        let root = tree.root();
        let leaf = tree
            .add_leaf(root, "locale", ScalarSpec::string("en_US"))
            .unwrap();
        tree.set_value(leaf, ScalarValue::Str("de_DE".to_string()))
            .unwrap();

        let mut doc = Document::new();
        tree.save_into(&mut doc);

        assert_eq!(doc.get_str("locale"), Some("de_DE"));
        // The staged write has landed; a later document edit shows through.
        doc.set_str("locale", "fr_FR");
        assert_eq!(tree.str_value(leaf, &doc), "fr_FR");
    }

    #[test]
    fn test_save_writes_dual_comment_blocks() {
        let mut tree = Tree::new();
        let root = tree.root();
        let gate = tree
            .add_container(root, "dropArrows", Some(ScalarSpec::bool(true)))
            .unwrap();
        tree.add_leaf(gate, "dropTippedArrows", ScalarSpec::bool(false))
            .unwrap();
        tree.set_base_docs(gate, ["Section documentation."]);
        tree.set_value_docs(gate, ["Gate documentation."]);

        let mut doc = Document::new();
        tree.save_into(&mut doc);

        assert_eq!(doc.comments("dropArrows"), ["Section documentation."]);
        assert_eq!(doc.comments("dropArrows.value"), ["Gate documentation."]);
        assert_eq!(doc.get_bool("dropArrows.value"), Some(true));
        assert_eq!(doc.get_bool("dropArrows.dropTippedArrows"), Some(false));
    }
}
