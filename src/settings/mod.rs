//! The plugin's settings schema.
//!
//! Declares the full tree of Archers of Decay settings over the node
//! framework, with the documentation every entry self-heals from, and
//! exposes typed accessors for the event handlers and the command
//! surface. `upgrade` must run once per session, before first read.

mod migrations;

use crate::error::ConfigResult;
use crate::tree::{
    ConfigRoot, Difficulty, NodeId, ScalarSpec, ScalarValue, SchemaVersion, TierSpecs, TieredNode,
    UpgradeReport,
};
use std::path::{Path, PathBuf};

/// The schema version this build writes.
pub const CURRENT_VERSION: SchemaVersion = 1;

const LOCALE_DOCS: [&str; 2] = [
    "The locale to use while translating chat messages.",
    "Default value: en_US.",
];

const SPAWN_CHANCES_BASE_DOCS: [&str; 2] = [
    "Chances that a skeleton in the nether will be replaced with a wither skeleton archer.",
    "Settings are between 0 and 1, separated by difficulty level.",
];

const SPAWN_CHANCES_EASY_DOCS: [&str; 3] = [
    "Easy difficulty spawn rates.",
    "Default value: 0.1, a.k.a. 1 in 10 spawns.",
    "Valid values are any value between 0 and 1.",
];

const SPAWN_CHANCES_NORMAL_DOCS: [&str; 3] = [
    "Normal difficulty spawn rates.",
    "Default value: 0.5, a.k.a. 1 in 2 spawns.",
    "Valid values are any value between 0 and 1.",
];

const SPAWN_CHANCES_HARD_DOCS: [&str; 3] = [
    "Hard difficulty spawn rates.",
    "Default value: 1, a.k.a. all spawns.",
    "Valid values are any value between 0 and 1.",
];

const TRANSFER_ARMOR_DOCS: [&str; 3] = [
    "Whether armor transfers from the skeleton to the wither skeleton.",
    "This could lead to incredibly overpowered wither skeletons!",
    "Defaults to false.",
];

const FLAMING_ARROWS_DOCS: [&str; 3] = [
    "Whether withers should be allowed to fire flaming arrows regardless of whether their bow has a \"flame\" enchantment.",
    "This matches vanilla functionality.",
    "Defaults to false.",
];

const ARROWS_OF_DECAY_BASE_DOCS: [&str; 1] =
    ["Whether wither skeletons fire tipped arrows with a decay attribute."];

const ARROWS_OF_DECAY_VALUE_DOCS: [&str; 2] = [
    "If true, wither skeletons will fire tipped arrows with a decay attribute.",
    "Defaults to true.",
];

const DURATION_BASE_DOCS: [&str; 1] = ["The duration in ticks that the decay will last."];

const DURATION_EASY_DOCS: [&str; 3] = [
    "Easy difficulty wither effect duration in ticks.",
    "Defaults to 0.",
    "Valid values are whole numbers 0 or greater. Setting to 0 will cause the effect not to be applied.",
];

const DURATION_NORMAL_DOCS: [&str; 3] = [
    "Normal difficulty wither effect duration in ticks.",
    "Defaults to 200, or ten seconds.",
    "Valid values are whole numbers 0 or greater. Setting to 0 will cause the effect not to be applied.",
];

const DURATION_HARD_DOCS: [&str; 3] = [
    "Hard difficulty wither effect duration in ticks.",
    "Defaults to 100, or five seconds.",
    "Valid values are whole numbers 0 or greater. Setting to 0 will cause the effect not to be applied.",
];

const EFFECT_LEVEL_BASE_DOCS: [&str; 1] =
    ["The level of the wither effect applied by arrows of decay."];

const EFFECT_LEVEL_EASY_DOCS: [&str; 3] = [
    "Easy difficulty wither effect level.",
    "Defaults to -1, which disables the effect.",
    "Valid values are whole numbers between -1 and 255.",
];

const EFFECT_LEVEL_NORMAL_DOCS: [&str; 3] = [
    "Normal difficulty wither effect level.",
    "Defaults to 0, a.k.a. Wither I.",
    "Valid values are whole numbers between -1 and 255.",
];

const EFFECT_LEVEL_HARD_DOCS: [&str; 3] = [
    "Hard difficulty wither effect level.",
    "Defaults to 1, a.k.a. Wither II.",
    "Valid values are whole numbers between -1 and 255.",
];

pub(crate) const DROP_ARROWS_VALUE_DOCS: [&str; 3] = [
    "Whether to drop arrows if a wither skeleton has a bow.",
    "Will drop as \"Uncraftable Tipped Arrow\" with a wither effect if arrows of decay are enabled.",
    "Defaults to true.",
];

pub(crate) const DROP_TIPPED_ARROWS_DOCS: [&str; 4] = [
    "Whether the arrows which are dropped should be normal or tipped with the Wither effect.",
    "Wither effect levels depend on difficulty.",
    "Ignored if dropArrows is not enabled, effect level is set to a negative value, or effect duration is set to 0.",
    "Defaults to false, initially set to true.",
];

const DEBUG_DOCS: [&str; 2] = [
    "Whether to show debug output in the console.",
    "Defaults to false.",
];

pub(crate) const METRICS_DOCS: [&str; 6] = [
    "Whether to send usage telemetry. Uses bStats (https://bstats.org).",
    "Defaults to false.",
    "Only opt in to metrics if you are an adult, and are comfortable sharing non-identifying data with bStats.",
    "See the GitHub readme at https://github.com/satyrnidae/archers-of-decay for more info on metrics.",
    "You can also see what metrics are collected on the bStats metrics page here: https://bstats.org/plugin/bukkit/Archers%20of%20Decay/20029",
    "Please make sure you've read the bStats privacy policy at https://bstats.org/privacy-policy before enabling!",
];

pub(crate) fn drop_arrows_base_docs(value_path: &str) -> [String; 2] {
    [
        "Whether Wither Skeleton archers should drop arrows on death.".to_string(),
        format!("Set \"{value_path}\" to true to enable this functionality."),
    ]
}

/// The configuration of the plugin.
#[derive(Debug)]
pub struct Settings {
    root: ConfigRoot,
    locale: NodeId,
    spawn_chances: TieredNode,
    transfer_armor: NodeId,
    flaming_arrows: NodeId,
    arrows_of_decay: NodeId,
    decay_duration: TieredNode,
    decay_effect_level: TieredNode,
    drop_arrows: NodeId,
    drop_tipped_arrows: NodeId,
    debug: NodeId,
    metrics: NodeId,
}

impl Settings {
    /// Declare the settings tree over the document at `file`.
    ///
    /// Construction only builds the in-memory tree; call [`Self::load`]
    /// and [`Self::upgrade`] before reading values.
    pub fn new(file: impl Into<PathBuf>) -> ConfigResult<Self> {
        let mut root = ConfigRoot::new(file, CURRENT_VERSION);
        let tree = root.tree_mut();
        let top = tree.root();

        let locale = tree.add_leaf(top, "locale", ScalarSpec::string("en_US"))?;
        tree.set_value_docs(locale, LOCALE_DOCS);

        let spawn_chances = tree.add_tiered(
            top,
            "spawnChances",
            None,
            TierSpecs {
                easy: ScalarSpec::float(0.1, 0.0, 1.0),
                normal: ScalarSpec::float(0.5, 0.0, 1.0),
                hard: ScalarSpec::float(1.0, 0.0, 1.0),
            },
        )?;
        tree.set_base_docs(spawn_chances.node, SPAWN_CHANCES_BASE_DOCS);
        tree.set_value_docs(spawn_chances.easy, SPAWN_CHANCES_EASY_DOCS);
        tree.set_value_docs(spawn_chances.normal, SPAWN_CHANCES_NORMAL_DOCS);
        tree.set_value_docs(spawn_chances.hard, SPAWN_CHANCES_HARD_DOCS);

        let transfer_armor = tree.add_leaf(top, "transferArmor", ScalarSpec::bool(false))?;
        tree.set_value_docs(transfer_armor, TRANSFER_ARMOR_DOCS);

        let flaming_arrows = tree.add_leaf(top, "flamingArrows", ScalarSpec::bool(false))?;
        tree.set_value_docs(flaming_arrows, FLAMING_ARROWS_DOCS);

        let arrows_of_decay =
            tree.add_container(top, "arrowsOfDecay", Some(ScalarSpec::bool(true)))?;
        tree.set_base_docs(arrows_of_decay, ARROWS_OF_DECAY_BASE_DOCS);
        tree.set_value_docs(arrows_of_decay, ARROWS_OF_DECAY_VALUE_DOCS);

        let decay_duration = tree.add_tiered(
            arrows_of_decay,
            "duration",
            None,
            TierSpecs {
                easy: ScalarSpec::int(0, 0, i64::MAX),
                normal: ScalarSpec::int(200, 0, i64::MAX),
                hard: ScalarSpec::int(100, 0, i64::MAX),
            },
        )?;
        tree.set_base_docs(decay_duration.node, DURATION_BASE_DOCS);
        tree.set_value_docs(decay_duration.easy, DURATION_EASY_DOCS);
        tree.set_value_docs(decay_duration.normal, DURATION_NORMAL_DOCS);
        tree.set_value_docs(decay_duration.hard, DURATION_HARD_DOCS);

        let decay_effect_level = tree.add_tiered(
            arrows_of_decay,
            "effectLevel",
            None,
            TierSpecs {
                easy: ScalarSpec::int(-1, -1, 255),
                normal: ScalarSpec::int(0, -1, 255),
                hard: ScalarSpec::int(1, -1, 255),
            },
        )?;
        tree.set_base_docs(decay_effect_level.node, EFFECT_LEVEL_BASE_DOCS);
        tree.set_value_docs(decay_effect_level.easy, EFFECT_LEVEL_EASY_DOCS);
        tree.set_value_docs(decay_effect_level.normal, EFFECT_LEVEL_NORMAL_DOCS);
        tree.set_value_docs(decay_effect_level.hard, EFFECT_LEVEL_HARD_DOCS);

        let drop_arrows = tree.add_container(top, "dropArrows", Some(ScalarSpec::bool(true)))?;
        let drop_tipped_arrows =
            tree.add_leaf(drop_arrows, "dropTippedArrows", ScalarSpec::bool(false))?;
        let drop_arrows_value_path = tree.value_path(drop_arrows);
        tree.set_base_docs(drop_arrows, drop_arrows_base_docs(&drop_arrows_value_path));
        tree.set_value_docs(drop_arrows, DROP_ARROWS_VALUE_DOCS);
        tree.set_value_docs(drop_tipped_arrows, DROP_TIPPED_ARROWS_DOCS);

        let debug = tree.add_leaf(top, "debug", ScalarSpec::bool(false))?;
        tree.set_value_docs(debug, DEBUG_DOCS);

        let metrics = tree.add_leaf(top, "metrics", ScalarSpec::bool(false))?;
        tree.set_value_docs(metrics, METRICS_DOCS);

        Ok(Self {
            root,
            locale,
            spawn_chances,
            transfer_armor,
            flaming_arrows,
            arrows_of_decay,
            decay_duration,
            decay_effect_level,
            drop_arrows,
            drop_tipped_arrows,
            debug,
            metrics,
        })
    }

    /// Path of the backing file.
    pub fn file(&self) -> &Path {
        self.root.file()
    }

    /// The version the backing document currently carries.
    pub fn version(&self) -> SchemaVersion {
        self.root.version()
    }

    /// Read the backing file, or write a default one if absent.
    pub fn load(&mut self) -> ConfigResult<()> {
        self.root.load()
    }

    /// Bring the document up to [`CURRENT_VERSION`] and persist it.
    /// Invoke once per session, before first read.
    pub fn upgrade(&mut self) -> ConfigResult<UpgradeReport> {
        self.root.upgrade(&migrations::pipeline())
    }

    /// Persist pending changes.
    pub fn save(&mut self) -> ConfigResult<()> {
        self.root.save()
    }

    /// Re-read the backing file, discarding staged writes.
    pub fn reload(&mut self) -> ConfigResult<()> {
        self.root.reload()
    }

    /// The locale used for chat messages.
    pub fn locale(&self) -> String {
        self.root.tree().str_value(self.locale, self.root.doc())
    }

    /// Set the chat-message locale.
    pub fn set_locale(&mut self, locale: &str) -> ConfigResult<()> {
        self.root
            .tree_mut()
            .set_value(self.locale, ScalarValue::Str(locale.to_string()))
    }

    /// Chance that a skeleton is replaced with a wither skeleton archer.
    pub fn spawn_chance(&self, difficulty: Difficulty) -> f64 {
        self.root
            .tree()
            .tier_value(self.spawn_chances.node, difficulty, self.root.doc())
            .as_f64()
            .unwrap_or(0.0)
    }

    /// Whether armor transfers to the replacement wither skeleton.
    pub fn transfer_armor(&self) -> bool {
        self.root.tree().bool_value(self.transfer_armor, self.root.doc())
    }

    /// Whether wither skeletons fire flaming arrows regardless of their
    /// bow's enchantments.
    pub fn flaming_arrows(&self) -> bool {
        self.root.tree().bool_value(self.flaming_arrows, self.root.doc())
    }

    /// Whether wither skeletons fire tipped arrows with a decay attribute.
    pub fn arrows_of_decay(&self) -> bool {
        self.root.tree().bool_value(self.arrows_of_decay, self.root.doc())
    }

    /// Duration of the wither effect, in ticks.
    pub fn decay_duration(&self, difficulty: Difficulty) -> i64 {
        self.root
            .tree()
            .tier_value(self.decay_duration.node, difficulty, self.root.doc())
            .as_i64()
            .unwrap_or(0)
    }

    /// Amplifier of the wither effect. Negative disables the effect.
    pub fn decay_effect_level(&self, difficulty: Difficulty) -> i64 {
        self.root
            .tree()
            .tier_value(self.decay_effect_level.node, difficulty, self.root.doc())
            .as_i64()
            .unwrap_or(0)
    }

    /// Whether wither skeleton archers drop arrows on death.
    pub fn drop_arrows(&self) -> bool {
        self.root.tree().bool_value(self.drop_arrows, self.root.doc())
    }

    /// Whether dropped arrows are tipped with the wither effect.
    pub fn drop_tipped_arrows(&self) -> bool {
        self.root
            .tree()
            .bool_value(self.drop_tipped_arrows, self.root.doc())
    }

    /// Whether debug output is enabled.
    pub fn debug(&self) -> bool {
        self.root.tree().bool_value(self.debug, self.root.doc())
    }

    /// Toggle debug output for the next save.
    pub fn set_debug(&mut self, enabled: bool) -> ConfigResult<()> {
        self.root
            .tree_mut()
            .set_value(self.debug, ScalarValue::Bool(enabled))
    }

    /// Whether usage telemetry is enabled. Strictly opt-in.
    pub fn metrics(&self) -> bool {
        self.root.tree().bool_value(self.metrics, self.root.doc())
    }

    /// Toggle telemetry for the next save.
    pub fn set_metrics(&mut self, enabled: bool) -> ConfigResult<()> {
        self.root
            .tree_mut()
            .set_value(self.metrics, ScalarValue::Bool(enabled))
    }
}
