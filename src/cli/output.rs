//! Output formatting utilities

use crate::application::{SyncReport, TreeEntry};
use crate::domain::tags::TagsetDefinition;

/// Format a list of tagsets for display
pub fn format_tagset_list(tagsets: &[&TagsetDefinition]) -> String {
    if tagsets.is_empty() {
        return "No tagsets found".to_string();
    }

    let mut output = String::new();
    for tagset in tagsets {
        output.push_str(&format!(
            "{}  {} ({} tags)\n",
            tagset.uuid(),
            tagset.name(),
            tagset.len()
        ));
    }
    output
}

/// Format the tags of a tagset as an indented tree
pub fn format_tag_tree(name: &str, entries: &[TreeEntry]) -> String {
    let mut output = format!("{}\n", name);
    if entries.is_empty() {
        output.push_str("  (no tags)\n");
        return output;
    }

    for entry in entries {
        let definition = &entry.definition;
        output.push_str(&"  ".repeat(entry.depth + 1));
        output.push_str(definition.name());
        if let Some(color) = definition.color() {
            output.push_str(&format!(" {}", color));
        }
        if !definition.tag_type().is_empty() {
            output.push_str(&format!(" [{}]", definition.tag_type()));
        }
        output.push('\n');
    }
    output
}

/// Format the result of a status or sync run
pub fn format_sync_report(report: &SyncReport) -> String {
    if report.in_sync {
        return format!("{} is in sync", report.tagset_name);
    }

    let mut output = if report.applied {
        format!("Synchronized {}\n", report.tagset_name)
    } else {
        format!("{} differs from the incoming copy\n", report.tagset_name)
    };

    let outcome = &report.outcome;
    if outcome.renamed && report.incoming_name != report.tagset_name {
        output.push_str(&format!("  renamed to {}\n", report.incoming_name));
    }
    for (label, uuids) in [
        ("updated", &outcome.updated),
        ("removed", &outcome.removed),
        ("added", &outcome.added),
    ] {
        if !uuids.is_empty() {
            output.push_str(&format!("  {} {}: {}\n", uuids.len(), label, uuids.join(", ")));
        }
    }
    output
}
