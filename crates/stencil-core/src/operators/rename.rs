//! `rename-variable`

use stencil_core_types::NodeId;

use super::{variable_operand, OperatorContext, OperatorId, OperatorKind};
use crate::errors::{Result, StencilError};
use crate::model::Snippet;

pub(crate) fn carries_variable(snippet: &Snippet, node: NodeId) -> bool {
    snippet
        .binding_for(node)
        .is_some_and(|b| b.constraint.variable().is_some())
}

/// Rename the variable carried by the node's constraint throughout the snippet
pub(crate) fn rename_variable(snippet: &Snippet, node: NodeId, ctx: &OperatorContext<'_>) -> Result<Snippet> {
    let id = OperatorId::RenameVariable;
    let OperatorKind::Rename { node: renamed, new_name } = ctx.kind else {
        return Err(StencilError::Internal {
            message: format!("{} needs rename arguments", id),
        });
    };
    if *renamed != node {
        return Err(StencilError::Internal {
            message: format!("{} targets {} but names {}", id, node, renamed),
        });
    }
    let to = variable_operand(id, Some(node), new_name.trim())?;
    let from = snippet
        .binding_for(node)
        .and_then(|b| b.constraint.variable())
        .cloned()
        .ok_or_else(|| StencilError::precondition(id.as_str(), Some(node), "node carries no variable"))?;

    if from == to {
        return Ok(snippet.clone());
    }
    let clash = snippet.bindings().values().any(|b| {
        b.variable == to || b.constraint.variable() == Some(&to)
    });
    if clash {
        return Err(StencilError::precondition(
            id.as_str(),
            Some(node),
            format!("{} is already used in the snippet", to),
        ));
    }

    let mut next = snippet.clone();
    next.rename_variable(&from, &to);
    Ok(next)
}
