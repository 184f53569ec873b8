//! Transform operators, edits of a rewritten snippet against its template
//!
//! These only run inside a paired transformation, which checks that the
//! rewritten snippet and the template snippet belong together before any of
//! them is called.

use stencil_core_types::NodeId;

use super::{operand, variable_operand, OperatorContext, OperatorId, OperatorKind};
use crate::errors::{Result, StencilError};
use crate::model::{Constraint, Snippet};

fn transform_args<'a>(id: OperatorId, ctx: &'a OperatorContext<'_>) -> Result<(&'a Snippet, NodeId, &'a [String])> {
    match ctx.kind {
        OperatorKind::Transform {
            template,
            template_node,
            operands,
        } => Ok((&**template, *template_node, operands.as_slice())),
        _ => Err(StencilError::Internal {
            message: format!("{} needs transform arguments", id),
        }),
    }
}

/// `rewrite-with-template-node`: the rewritten node becomes the template node's variable
pub(crate) fn rewrite_with_template_node(snippet: &Snippet, node: NodeId, ctx: &OperatorContext<'_>) -> Result<Snippet> {
    let id = OperatorId::RewriteWithTemplateNode;
    let (template, template_node, _) = transform_args(id, ctx)?;
    let binding = template.binding_for(template_node).ok_or_else(|| {
        StencilError::precondition(
            id.as_str(),
            Some(template_node),
            "template node is not part of the template snippet",
        )
    })?;
    let var = binding
        .constraint
        .variable()
        .cloned()
        .unwrap_or_else(|| binding.variable.clone());

    let mut next = snippet.clone();
    next.set_constraint(node, Constraint::Variable(var));
    next.unbind_descendants(node);
    Ok(next)
}

/// `rewrite-remove-node`
pub(crate) fn rewrite_remove_node(snippet: &Snippet, node: NodeId, ctx: &OperatorContext<'_>) -> Result<Snippet> {
    transform_args(OperatorId::RewriteRemoveNode, ctx)?;
    let mut next = snippet.clone();
    next.unbind_subtree(node);
    Ok(next)
}

/// `rewrite-with-text`: the rewritten node becomes the given variable
pub(crate) fn rewrite_with_text(snippet: &Snippet, node: NodeId, ctx: &OperatorContext<'_>) -> Result<Snippet> {
    let id = OperatorId::RewriteWithText;
    let (_, _, operands) = transform_args(id, ctx)?;
    let var = variable_operand(id, Some(node), operand(id, Some(node), operands, "text")?)?;
    let mut next = snippet.clone();
    next.set_constraint(node, Constraint::Variable(var));
    next.unbind_descendants(node);
    Ok(next)
}
