//! Before/after projection of a template snippet and its rewrite

use serde::Serialize;

use crate::model::{Grounding, Snippet};

const REMOVED: &str = "removed";
const ABSENT: &str = "-";

/// One difference between a template snippet and its rewritten counterpart
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MappingRow {
    pub field: String,
    pub before: String,
    pub after: String,
}

impl MappingRow {
    fn new(field: impl Into<String>, before: impl Into<String>, after: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            before: before.into(),
            after: after.into(),
        }
    }
}

fn grounding_name(grounding: Grounding) -> &'static str {
    match grounding {
        Grounding::Deep => "deep",
        Grounding::Exact => "exact",
    }
}

/// Every difference, in document order: grounding, then nodes, then conditions
pub fn mapping_rows(template: &Snippet, rewritten: &Snippet) -> Vec<MappingRow> {
    let mut rows = Vec::new();

    if template.grounding() != rewritten.grounding() {
        rows.push(MappingRow::new(
            "grounding",
            grounding_name(template.grounding()),
            grounding_name(rewritten.grounding()),
        ));
    }

    // Both sides share the same tree when the rewrite was forked from the template.
    for &node in rewritten.ast().preorder() {
        let describe = |s: &Snippet| {
            s.binding_for(node)
                .map_or_else(|| REMOVED.to_string(), |b| b.constraint.to_string())
        };
        let (before, after) = (describe(template), describe(rewritten));
        if before != after {
            let what = rewritten
                .ast()
                .node(node)
                .map(|n| n.describe())
                .unwrap_or_default();
            rows.push(MappingRow::new(format!("{} {}", node, what), before, after));
        }
    }

    for condition in template.logic_conditions() {
        if !rewritten.logic_conditions().contains(condition) {
            rows.push(MappingRow::new("condition", condition.as_str(), ABSENT));
        }
    }
    for condition in rewritten.logic_conditions() {
        if !template.logic_conditions().contains(condition) {
            rows.push(MappingRow::new("condition", ABSENT, condition.as_str()));
        }
    }

    rows
}
