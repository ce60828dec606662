//! Human-readable summary renderer for relationship diffs.

use crate::diff::model::{ChangeFlag, RelationshipDiff};
use crate::model::RelationshipDefinition;

/// Render a human-readable Markdown/text summary of a [`RelationshipDiff`].
///
/// Informational only; used for review displays and activity details.
pub fn render_human_summary(diff: &RelationshipDiff) -> String {
    let mut out = String::new();
    out.push_str("## Relationship Diff\n\n");

    if diff.is_empty() {
        out.push_str("_No relationship changes._\n");
        return out;
    }

    if !diff.added.is_empty() {
        out.push_str(&format!("### Added ({})\n\n", diff.added.len()));
        for rel in &diff.added {
            out.push_str(&format!("- {}\n", describe(rel)));
        }
        out.push('\n');
    }

    if !diff.removed.is_empty() {
        out.push_str(&format!("### Removed ({})\n\n", diff.removed.len()));
        for rel in &diff.removed {
            out.push_str(&format!("- {}\n", describe(rel)));
        }
        out.push('\n');
    }

    if !diff.modified.is_empty() {
        out.push_str(&format!("### Modified ({})\n\n", diff.modified.len()));
        for m in &diff.modified {
            let flags: Vec<&str> = m.changes.iter().map(|f| flag_label(*f)).collect();
            let flags = if flags.is_empty() {
                "other fields".to_string()
            } else {
                flags.join(", ")
            };
            out.push_str(&format!("- {}: {}\n", describe(&m.updated), flags));
        }
        out.push('\n');
    }

    out
}

fn describe(rel: &RelationshipDefinition) -> String {
    format!(
        "`{}.{}` ({}, `{}`)",
        rel.source_entity_type_key,
        rel.name,
        rel.kind_label(),
        rel.id
    )
}

fn flag_label(flag: ChangeFlag) -> &'static str {
    match flag {
        ChangeFlag::NameChanged => "name",
        ChangeFlag::CardinalityChanged => "cardinality",
        ChangeFlag::InverseNameChanged => "inverse name",
        ChangeFlag::TargetTypesAdded => "target types added",
        ChangeFlag::TargetTypesRemoved => "target types removed",
        ChangeFlag::BidirectionalEnabled => "bidirectional enabled",
        ChangeFlag::BidirectionalDisabled => "bidirectional disabled",
        ChangeFlag::BidirectionalTargetsChanged => "bidirectional targets",
    }
}
