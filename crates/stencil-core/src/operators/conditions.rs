//! Logic condition operators, at snippet and at group scope

use stencil_core_types::NodeId;

use super::{operand, OperatorContext, OperatorId};
use crate::errors::{Result, StencilError};
use crate::model::{LogicCondition, Snippet, SnippetGroup};

fn condition(id: OperatorId, node: Option<NodeId>, operands: &[String]) -> Result<LogicCondition> {
    operand(id, node, operands, "condition").map(LogicCondition::new)
}

fn missing(id: OperatorId, node: Option<NodeId>, condition: &LogicCondition) -> StencilError {
    StencilError::precondition(
        id.as_str(),
        node,
        format!("no condition '{}' to remove", condition),
    )
}

/// `add-logic-condition` on the snippet owning `node`
pub(crate) fn add_condition(snippet: &Snippet, node: NodeId, ctx: &OperatorContext<'_>) -> Result<Snippet> {
    let condition = condition(OperatorId::AddLogicCondition, Some(node), ctx.kind.operands())?;
    let mut next = snippet.clone();
    next.push_condition(condition);
    Ok(next)
}

/// `remove-logic-condition` on the snippet owning `node`
pub(crate) fn remove_condition(snippet: &Snippet, node: NodeId, ctx: &OperatorContext<'_>) -> Result<Snippet> {
    let id = OperatorId::RemoveLogicCondition;
    let condition = condition(id, Some(node), ctx.kind.operands())?;
    let mut next = snippet.clone();
    if !next.remove_condition(&condition) {
        return Err(missing(id, Some(node), &condition));
    }
    Ok(next)
}

/// Apply a condition operator at group scope
///
/// # Errors
///
/// `OperatorPrecondition` for a missing argument or, on removal, a condition
/// the group does not carry. `UnknownOperator` for any other operator.
pub fn apply_to_group(group: &mut SnippetGroup, id: OperatorId, operands: &[String]) -> Result<()> {
    let condition = condition(id, None, operands)?;
    match id {
        OperatorId::AddLogicCondition => {
            group.push_condition(condition);
            Ok(())
        }
        OperatorId::RemoveLogicCondition => {
            if group.remove_condition(&condition) {
                Ok(())
            } else {
                Err(missing(id, None, &condition))
            }
        }
        other => Err(StencilError::precondition(
            other.as_str(),
            None,
            "operator cannot be applied at group scope",
        )),
    }
}
