//! Building snippets from annotated text
//!
//! `[content]@[directives]` regions mark the node whose source span equals
//! the region's trimmed content; each directive item names the operator to
//! apply there. Nested regions are applied before the region enclosing them,
//! so an enclosing generalization sees the already edited subtree.

use std::sync::Arc;

use stencil_core_types::NodeId;

use super::{structure, Catalog, OperatorContext, OperatorId, OperatorKind, OperatorShape};
use crate::ast::SourceParser;
use crate::directive::{extract_regions, mask, BoundRegion, Directive, MaskSpan};
use crate::errors::{Result, StencilError};
use crate::model::{Snippet, SnippetGroup};

/// Parse annotated text and apply its directives
///
/// `group` is the context operators consult (e.g. for variables bound by
/// other members); it is not modified.
///
/// # Errors
///
/// `DirectiveParse` for malformed annotations, `SourceParse` from the parser,
/// `UnanchoredDirective` for a region that does not span exactly one node,
/// `UnknownDirective` for items naming no applicable operator, or the
/// precondition violation raised by a directive.
pub fn annotated_snippet(
    parser: &dyn SourceParser,
    catalog: &Catalog,
    group: &SnippetGroup,
    annotated: &str,
) -> Result<Snippet> {
    let regions = extract_regions(annotated)?;
    let plain = mask(annotated, &regions, MaskSpan::MetaOnly);
    let ast = parser.parse(&plain)?;
    let mut snippet = Snippet::new(Arc::new(ast), plain.as_str());

    let mut ordered: Vec<&BoundRegion> = regions.iter().collect();
    // A nested region closes before the region enclosing it.
    ordered.sort_by_key(|region| region.close_offset);

    for region in ordered {
        let node = anchor(&snippet, &plain, region)?;
        for directive in Directive::from_region(region)? {
            snippet = apply_directive(catalog, group, &snippet, node, &directive)?;
        }
    }
    tracing::debug!(
        regions = regions.len(),
        nodes = snippet.nodes().count(),
        "annotated snippet built"
    );
    Ok(snippet)
}

fn anchor(snippet: &Snippet, plain: &str, region: &BoundRegion) -> Result<NodeId> {
    let content = &plain[region.content_start..region.content_end];
    let leading = content.len() - content.trim_start().len();
    let start = region.content_start + leading;
    let end = start + content.trim().len();
    snippet
        .ast()
        .node_at_span(start, end)
        .ok_or(StencilError::UnanchoredDirective {
            offset: region.open_offset,
        })
}

fn apply_directive(
    catalog: &Catalog,
    group: &SnippetGroup,
    snippet: &Snippet,
    node: NodeId,
    directive: &Directive,
) -> Result<Snippet> {
    let unknown = || StencilError::UnknownDirective {
        name: directive.name.clone(),
        offset: directive.offset,
    };
    let id: OperatorId = directive.name.parse().map_err(|_| unknown())?;
    let spec = catalog.get(id).map_err(|_| unknown())?;
    if spec.is_transform() {
        return Err(unknown());
    }

    if spec.batch {
        if !spec.is_applicable(snippet, node) {
            return Err(StencilError::precondition(
                id.as_str(),
                Some(node),
                "not applicable here",
            ));
        }
        return structure::remove_nodes(snippet, &[node]);
    }

    let kind = match spec.shape {
        OperatorShape::Generalize => OperatorKind::Generalize {
            original: Arc::new(snippet.clone()),
            variable: directive.operands.first().cloned(),
        },
        OperatorShape::Rename => OperatorKind::Rename {
            node,
            new_name: directive.operands.first().cloned().unwrap_or_default(),
        },
        OperatorShape::Generic | OperatorShape::Transform => {
            OperatorKind::Generic(directive.operands.clone())
        }
    };
    spec.apply_to(snippet, node, &OperatorContext { group, kind: &kind })
}
