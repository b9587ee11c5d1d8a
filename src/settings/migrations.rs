//! Migration steps for the settings document.

use super::{DROP_ARROWS_VALUE_DOCS, DROP_TIPPED_ARROWS_DOCS, METRICS_DOCS, drop_arrows_base_docs};
use crate::document::Document;
use crate::tree::{ScalarValue, SchemaVersion, Tree, UpgradePipeline};
use tracing::info;

/// All migration steps, oldest first.
pub(crate) fn pipeline() -> UpgradePipeline {
    UpgradePipeline::new().register(
        1,
        "make metrics opt-in and split dropArrows into a gated section",
        upgrade_0_to_1,
    )
}

// Version 1 made metrics opt-in and decoupled dropping tipped arrows from
// firing them: the flat dropArrows boolean became a gate with a nested
// dropTippedArrows setting seeded from the arrowsOfDecay value.
fn upgrade_0_to_1(
    tree: &mut Tree,
    doc: &mut Document,
    previous: SchemaVersion,
) -> anyhow::Result<()> {
    if previous >= 1 {
        return Ok(());
    }
    info!("found config version < 1, updating");

    // Metrics were opt-out before version 1; anyone who opted in has to
    // opt in again.
    if let Some(metrics) = tree.node_at("metrics") {
        tree.set_value(metrics, ScalarValue::Bool(false))?;
        let path = tree.value_path(metrics);
        doc.set_comments(&path, METRICS_DOCS);
        info!(
            "reset {path} to false; if you opted in before, you will need to opt in again"
        );
    }

    // Version 0 allowed a flat arrowsOfDecay boolean; carry it into the
    // gate slot of the section.
    if let Some(flat) = doc.get_bool("arrowsOfDecay")
        && let Some(arrows) = tree.node_at("arrowsOfDecay")
    {
        tree.set_value(arrows, ScalarValue::Bool(flat))?;
    }

    // dropArrows: flat boolean -> gate plus nested detail.
    if let Some(drop_arrows) = tree.node_at("dropArrows")
        && let Some(drop_tipped) = tree.node_at("dropArrows.dropTippedArrows")
    {
        let base = tree.base_path(drop_arrows);
        let value_path = tree.value_path(drop_arrows);
        info!("updating the format of the {base} setting");

        // Absent source means nothing to migrate; the gate then reads its
        // own default.
        if let Some(enabled) = doc.get_bool(&base) {
            tree.set_value(drop_arrows, ScalarValue::Bool(enabled))?;
            info!("config value {value_path} set to {enabled}");
        }

        let tipped = match tree.node_at("arrowsOfDecay") {
            Some(arrows) => tree.bool_value(arrows, doc),
            None => true,
        };
        tree.set_value(drop_tipped, ScalarValue::Bool(tipped))?;
        let tipped_path = tree.value_path(drop_tipped);
        info!("config value {tipped_path} set to {tipped}");

        // The moved entries get the new layout's documentation outright;
        // blocks carried over from the old layout would be stale.
        doc.set_comments(&base, drop_arrows_base_docs(&value_path));
        doc.set_comments(&value_path, DROP_ARROWS_VALUE_DOCS);
        doc.set_comments(&tipped_path, DROP_TIPPED_ARROWS_DOCS);
    }

    Ok(())
}
