//! The root of the settings tree: backing file, schema version, and
//! upgrade orchestration.

use super::node::Tree;
use super::upgrade::{SchemaVersion, UpgradePipeline, UpgradeReport};
use crate::document::Document;
use crate::error::ConfigResult;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Reserved document key holding the schema version, outside the
/// user-facing tree. Node names never start with an underscore.
pub const VERSION_KEY: &str = "_version";

/// Top-level owner of the node tree and its backing document.
///
/// Single-owner, single-session state: the tree is rebuilt every session
/// and only the document survives in between. `load`, `upgrade`, `save`,
/// and `reload` run on the host's control thread; readers are expected to
/// be serialized against them by the host.
#[derive(Debug)]
pub struct ConfigRoot {
    tree: Tree,
    doc: Document,
    file: PathBuf,
    current_version: SchemaVersion,
}

impl ConfigRoot {
    /// Create a root for the document at `file`. The tree starts empty;
    /// schema owners declare nodes through [`Self::tree_mut`].
    pub fn new(file: impl Into<PathBuf>, current_version: SchemaVersion) -> Self {
        Self {
            tree: Tree::new(),
            doc: Document::new(),
            file: file.into(),
            current_version,
        }
    }

    /// The node tree.
    pub fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Mutable access to the node tree.
    pub fn tree_mut(&mut self) -> &mut Tree {
        &mut self.tree
    }

    /// The backing document.
    pub fn doc(&self) -> &Document {
        &self.doc
    }

    /// Mutable access to the backing document.
    pub fn doc_mut(&mut self) -> &mut Document {
        &mut self.doc
    }

    /// Path of the backing file.
    pub fn file(&self) -> &Path {
        &self.file
    }

    /// The schema version this build writes.
    pub fn current_version(&self) -> SchemaVersion {
        self.current_version
    }

    /// Read the backing file, or materialize a default document.
    ///
    /// When the file does not exist, every declared node is written out
    /// with its default value and documentation and the file is persisted
    /// immediately, still at version 0 so a following [`Self::upgrade`]
    /// stamps it like any other pre-version document.
    pub fn load(&mut self) -> ConfigResult<()> {
        if self.file.exists() {
            self.doc = Document::load_path(&self.file)?;
        } else {
            info!(file = %self.file.display(), "no config file found, writing defaults");
            self.save()?;
        }
        Ok(())
    }

    /// The version the document currently carries. Documents without a
    /// version tag are version 0.
    pub fn version(&self) -> SchemaVersion {
        self.doc
            .get_i64(VERSION_KEY)
            .map(|raw| raw.clamp(0, SchemaVersion::MAX as i64) as SchemaVersion)
            .unwrap_or(0)
    }

    /// Write the version tag.
    pub fn set_version(&mut self, version: SchemaVersion) {
        self.doc.set_i64(VERSION_KEY, version as i64);
        if self.doc.comments(VERSION_KEY).is_empty() {
            self.doc.set_comments(
                VERSION_KEY,
                ["The config file format version. Managed by the plugin; do not edit."],
            );
        }
    }

    /// Bring the document up to the current schema version and persist it.
    ///
    /// Runs every pipeline step above the stored version in ascending
    /// order, stamps the current version, and saves exactly once. A
    /// document newer than this build is forcibly reset: unknown settings
    /// are discarded with a warning and the version is pinned back down.
    /// Safe to call on an already-current document.
    pub fn upgrade(&mut self, pipeline: &UpgradePipeline) -> ConfigResult<UpgradeReport> {
        let previous = self.version();
        let downgrading = previous > self.current_version;
        if downgrading {
            warn!(
                found = previous,
                supported = self.current_version,
                "unsupported config version found! performing a hard downgrade; \
                 settings unknown to this build will be discarded and configured \
                 values may be lost"
            );
        }

        let mut report = pipeline.apply(&mut self.tree, &mut self.doc, previous);
        report.hard_downgrade = downgrading;

        self.set_version(self.current_version);
        if downgrading {
            self.discard_unknown_settings();
            self.doc
                .set_inline_comment(VERSION_KEY, "I mean it! Don't touch!");
        }

        self.save()?;
        Ok(report)
    }

    /// Write the whole tree into the document and persist the file.
    ///
    /// Individual node failures are logged and skipped so one bad entry
    /// never keeps its siblings from being written.
    pub fn save(&mut self) -> ConfigResult<()> {
        for issue in self.tree.save_into(&mut self.doc) {
            warn!(path = %issue.path, "failed to save setting, skipping: {}", issue.error);
        }
        self.doc.save_path(&self.file)
    }

    /// Re-read the backing file, dropping staged writes.
    pub fn reload(&mut self) -> ConfigResult<()> {
        self.doc = Document::load_path(&self.file)?;
        self.tree.clear_staged();
        Ok(())
    }

    /// Drop every document entry that is neither a declared node value
    /// nor the version tag. Only used on hard downgrade.
    fn discard_unknown_settings(&mut self) {
        let known: Vec<String> = self
            .tree
            .ids()
            .filter(|id| self.tree.holds_value(*id))
            .map(|id| self.tree.value_path(id))
            .collect();
        let mut keep: HashSet<&str> = known.iter().map(String::as_str).collect();
        keep.insert(VERSION_KEY);

        for path in self.doc.retain_scalars(&keep) {
            warn!(%path, "discarding setting unknown to this version");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::value::{ScalarSpec, ScalarValue};
    use tempfile::TempDir;

    fn fixture(dir: &TempDir, current_version: SchemaVersion) -> ConfigRoot {
        let mut root = ConfigRoot::new(dir.path().join("config.yaml"), current_version);
        let tree = root.tree_mut();
        let top = tree.root();
        tree.add_leaf(top, "locale", ScalarSpec::string("en_US"))
            .unwrap();
        tree.add_leaf(top, "debug", ScalarSpec::bool(false)).unwrap();
        root
    }

    #[test]
    fn test_load_materializes_defaults() {
        let dir = TempDir::new().unwrap();
        let mut root = fixture(&dir, 1);

        root.load().unwrap();

        assert!(root.file().exists());
        assert_eq!(root.doc().get_str("locale"), Some("en_US"));
        assert_eq!(root.doc().get_bool("debug"), Some(false));
        // No version tag until the first upgrade.
        assert_eq!(root.version(), 0);
    }

    #[test]
    fn test_upgrade_stamps_current_version() {
        let dir = TempDir::new().unwrap();
        let mut root = fixture(&dir, 3);
        root.load().unwrap();

        let report = root.upgrade(&UpgradePipeline::new()).unwrap();

        assert_eq!(root.version(), 3);
        assert!(!report.hard_downgrade);
        assert!(!report.was_migrated());

        let reread = Document::load_path(root.file()).unwrap();
        assert_eq!(reread.get_i64(VERSION_KEY), Some(3));
    }

    #[test]
    fn test_hard_downgrade_discards_unknown_settings() {
        let dir = TempDir::new().unwrap();
        let mut root = fixture(&dir, 1);
        root.doc_mut().set_i64(VERSION_KEY, 2);
        root.doc_mut().set_bool("futureFeature.enabled", true);
        root.doc_mut().set_str("locale", "de_DE");

        let report = root.upgrade(&UpgradePipeline::new()).unwrap();

        assert!(report.hard_downgrade);
        assert_eq!(root.version(), 1);
        assert!(!root.doc().contains("futureFeature"));
        // Known settings keep their configured values.
        assert_eq!(root.doc().get_str("locale"), Some("de_DE"));
        assert_eq!(
            root.doc().inline_comment(VERSION_KEY),
            Some("I mean it! Don't touch!")
        );
    }

    #[test]
    fn test_reload_drops_staged_writes() {
        let dir = TempDir::new().unwrap();
        let mut root = fixture(&dir, 1);
        root.load().unwrap();

        let debug = root.tree().node_at("debug").unwrap();
        root.tree_mut()
            .set_value(debug, ScalarValue::Bool(true))
            .unwrap();
        assert!(root.tree().bool_value(debug, root.doc()));

        root.reload().unwrap();
        assert!(!root.tree().bool_value(debug, root.doc()));
    }
}
