//! Constraint operators: loosen or tighten how single nodes match

use stencil_core_types::NodeId;

use super::{operand, variable_operand, OperatorContext, OperatorId, OperatorKind};
use crate::errors::{Result, StencilError};
use crate::model::group::binds_variable;
use crate::model::{Constraint, Grounding, LogicVar, Snippet};

pub(crate) fn any_node(_: &Snippet, _: NodeId) -> bool {
    true
}

pub(crate) fn non_root(snippet: &Snippet, node: NodeId) -> bool {
    node != snippet.root_node()
}

pub(crate) fn labelled_leaf(snippet: &Snippet, node: NodeId) -> bool {
    snippet
        .ast()
        .node(node)
        .is_some_and(|n| n.is_leaf() && n.label.is_some())
}

pub(crate) fn has_bound_children(snippet: &Snippet, node: NodeId) -> bool {
    !snippet.children_of(node).is_empty()
}

pub(crate) fn restorable(snippet: &Snippet, node: NodeId) -> bool {
    snippet
        .binding_for(node)
        .is_some_and(|b| b.constraint != Constraint::Exact)
        && snippet.has_all_children(node)
}

pub(crate) fn deep_root(snippet: &Snippet, node: NodeId) -> bool {
    node == snippet.root_node() && snippet.grounding() == Grounding::Deep
}

pub(crate) fn exact_root(snippet: &Snippet, node: NodeId) -> bool {
    node == snippet.root_node() && snippet.grounding() == Grounding::Exact
}

/// `replace-by-variable`: the node matches any subtree, bound to a variable
pub(crate) fn replace_by_variable(snippet: &Snippet, node: NodeId, ctx: &OperatorContext<'_>) -> Result<Snippet> {
    let id = OperatorId::ReplaceByVariable;
    let OperatorKind::Generalize { original, variable } = ctx.kind else {
        return Err(StencilError::Internal {
            message: format!("{} needs generalize arguments", id),
        });
    };
    let var = match variable.as_deref().map(str::trim).filter(|v| !v.is_empty()) {
        Some(text) => variable_operand(id, Some(node), text)?,
        None => snippet
            .binding_for(node)
            .map_or_else(|| LogicVar::for_node(node), |b| b.variable.clone()),
    };

    // The variable may already name this node, but no other node of the original.
    let taken = original.nodes().any(|other| {
        other != node
            && original.binding_for(other).is_some_and(|b| {
                b.variable == var || matches!(&b.constraint, Constraint::Variable(v) if *v == var)
            })
    });
    if taken {
        return Err(StencilError::precondition(
            id.as_str(),
            Some(node),
            format!("{} already names another node of the snippet", var),
        ));
    }

    let mut next = snippet.clone();
    next.set_constraint(node, Constraint::Variable(var));
    next.unbind_descendants(node);
    Ok(next)
}

/// `replace-by-wildcard`: the node matches any subtree
pub(crate) fn replace_by_wildcard(snippet: &Snippet, node: NodeId, _: &OperatorContext<'_>) -> Result<Snippet> {
    let mut next = snippet.clone();
    next.set_constraint(node, Constraint::Wildcard);
    next.unbind_descendants(node);
    Ok(next)
}

/// `equals-variable`: the node matches the value of a variable bound elsewhere
pub(crate) fn equals_variable(snippet: &Snippet, node: NodeId, ctx: &OperatorContext<'_>) -> Result<Snippet> {
    let id = OperatorId::EqualsVariable;
    let text = operand(id, Some(node), ctx.kind.operands(), "variable")?;
    let var = variable_operand(id, Some(node), text)?;

    let bound_here = snippet.nodes().any(|other| {
        other != node
            && matches!(&snippet.bindings()[&other].constraint, Constraint::Variable(v) if *v == var)
    });
    if !bound_here && !binds_variable(ctx.group, &var, Some(node)) {
        return Err(StencilError::precondition(
            id.as_str(),
            Some(node),
            format!("{} is not bound to a node in the group", var),
        ));
    }

    let mut next = snippet.clone();
    next.set_constraint(node, Constraint::Equals(var));
    next.unbind_descendants(node);
    Ok(next)
}

/// `match-subtype`: same kind, any label
pub(crate) fn match_subtype(snippet: &Snippet, node: NodeId, _: &OperatorContext<'_>) -> Result<Snippet> {
    let mut next = snippet.clone();
    next.set_constraint(node, Constraint::Subtype);
    Ok(next)
}

/// `relax-size`: children match as an ordered subsequence
pub(crate) fn relax_size(snippet: &Snippet, node: NodeId, _: &OperatorContext<'_>) -> Result<Snippet> {
    let mut next = snippet.clone();
    next.set_constraint(node, Constraint::RelaxSize);
    Ok(next)
}

/// `restore-exact`
pub(crate) fn restore_exact(snippet: &Snippet, node: NodeId, _: &OperatorContext<'_>) -> Result<Snippet> {
    let mut next = snippet.clone();
    next.set_constraint(node, Constraint::Exact);
    Ok(next)
}

pub(crate) fn ground_exact(snippet: &Snippet, _: NodeId, _: &OperatorContext<'_>) -> Result<Snippet> {
    let mut next = snippet.clone();
    next.set_grounding(Grounding::Exact);
    Ok(next)
}

pub(crate) fn ground_deep(snippet: &Snippet, _: NodeId, _: &OperatorContext<'_>) -> Result<Snippet> {
    let mut next = snippet.clone();
    next.set_grounding(Grounding::Deep);
    Ok(next)
}
