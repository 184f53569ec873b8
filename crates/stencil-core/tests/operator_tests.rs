//! Operator behaviour through the functional boundary and the history
//!
//! Unit tests next to each operator cover the operator functions in
//! isolation; these drive them the way a caller does.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{history_with, new_history, node_labelled, node_of_kind};
use stencil_core::ast::TokenTreeParser;
use stencil_core::model::{Constraint, Grounding, LogicVar};
use stencil_core::operators::Category;
use stencil_core::{apply, Catalog, OperatorId, OperatorRequest, StencilError, Target};

fn var(name: &str) -> LogicVar {
    LogicVar::parse(name).unwrap()
}

#[test]
fn test_replace_by_variable_then_equals_across_snippets() {
    // GIVEN: two snippets sharing an identifier
    let mut history = new_history("pair");
    let first = history.add_snippet(&TokenTreeParser, "let a = x;").unwrap();
    let second = history.add_snippet(&TokenTreeParser, "use(x);").unwrap();
    let x1 = node_labelled(&first, "x");
    let x2 = node_labelled(&second, "x");

    // WHEN: the first `x` binds ?v and the second must equal it
    history
        .apply(OperatorId::ReplaceByVariable, Target::Node(x1), vec!["?v".into()])
        .unwrap();
    let group = history
        .apply(OperatorId::EqualsVariable, Target::Node(x2), vec!["?v".into()])
        .unwrap();

    // THEN: both constraints are recorded on their own snippets
    let first = group.snippet_for(Some(x1)).unwrap();
    let second = group.snippet_for(Some(x2)).unwrap();
    assert_eq!(first.binding_for(x1).unwrap().constraint, Constraint::Variable(var("?v")));
    assert_eq!(second.binding_for(x2).unwrap().constraint, Constraint::Equals(var("?v")));
    assert!(group.variables().contains(&var("?v")));
}

#[test]
fn test_equals_unbound_variable_is_rejected_and_history_unchanged() {
    let (mut history, snippet) = history_with("f(x)");
    let before = Arc::clone(history.current());
    let x = node_labelled(&snippet, "x");

    let err = history
        .apply(OperatorId::EqualsVariable, Target::Node(x), vec!["?nowhere".into()])
        .unwrap_err();

    assert!(matches!(err, StencilError::OperatorPrecondition { ref operator, .. } if operator == "equals-variable"));
    assert!(Arc::ptr_eq(history.current(), &before));
    assert_eq!(history.len(), 2);
}

#[test]
fn test_replace_by_wildcard_unbinds_subtree() {
    let (mut history, snippet) = history_with("f(a b c)");
    let paren = node_of_kind(&snippet, "Paren");

    let group = history
        .apply(OperatorId::ReplaceByWildcard, Target::Node(paren), Vec::new())
        .unwrap();

    let snippet = group.snippet_for(Some(paren)).unwrap();
    assert_eq!(snippet.binding_for(paren).unwrap().constraint, Constraint::Wildcard);
    assert!(snippet.descendants_of(paren).is_empty());
    assert!(group.snippet_for(Some(node_labelled(snippet, "a"))).is_none());
    group.check_invariants().unwrap();
}

#[test]
fn test_wildcard_on_root_is_not_applicable() {
    let (mut history, snippet) = history_with("f(x)");
    let err = history
        .apply(OperatorId::ReplaceByWildcard, Target::Node(snippet.root_node()), Vec::new())
        .unwrap_err();
    assert!(err.to_string().contains("not applicable"));
}

#[test]
fn test_restore_exact_after_relax_size() {
    let (mut history, snippet) = history_with("f(a b)");
    let paren = node_of_kind(&snippet, "Paren");

    history
        .apply(OperatorId::RelaxSize, Target::Node(paren), Vec::new())
        .unwrap();
    let group = history
        .apply(OperatorId::RestoreExact, Target::Node(paren), Vec::new())
        .unwrap();

    let snippet = group.snippet_for(Some(paren)).unwrap();
    assert_eq!(snippet.binding_for(paren).unwrap().constraint, Constraint::Exact);
}

#[test]
fn test_grounding_toggles_through_root() {
    let (mut history, snippet) = history_with("f(x)");
    let root = snippet.root_node();

    let group = history
        .apply(OperatorId::GroundExact, Target::Node(root), Vec::new())
        .unwrap();
    assert_eq!(group.snippets()[0].grounding(), Grounding::Exact);

    // Already exact: only ground-deep applies now.
    assert!(history
        .apply(OperatorId::GroundExact, Target::Node(root), Vec::new())
        .is_err());
    let group = history
        .apply(OperatorId::GroundDeep, Target::Node(root), Vec::new())
        .unwrap();
    assert_eq!(group.snippets()[0].grounding(), Grounding::Deep);
}

#[test]
fn test_rename_variable_updates_conditions_and_rejects_clash() {
    let (mut history, snippet) = history_with("a b");
    let a = node_labelled(&snippet, "a");
    let b = node_labelled(&snippet, "b");
    history
        .apply(OperatorId::ReplaceByVariable, Target::Node(a), vec!["?x".into()])
        .unwrap();
    history
        .apply(OperatorId::ReplaceByVariable, Target::Node(b), vec!["?y".into()])
        .unwrap();
    history
        .apply(OperatorId::AddLogicCondition, Target::Node(a), vec!["(differs ?x ?y)".into()])
        .unwrap();

    let clash = history
        .apply(OperatorId::RenameVariable, Target::Node(a), vec!["?y".into()])
        .unwrap_err();
    assert!(clash.to_string().contains("already used"));

    let group = history
        .apply(OperatorId::RenameVariable, Target::Node(a), vec!["?first".into()])
        .unwrap();
    let snippet = &group.snippets()[0];
    assert_eq!(snippet.binding_for(a).unwrap().constraint, Constraint::Variable(var("?first")));
    assert_eq!(snippet.logic_conditions()[0].as_str(), "(differs ?first ?y)");
}

#[test]
fn test_batch_remove_spanning_snippets() {
    let mut history = new_history("batch");
    let one = history.add_snippet(&TokenTreeParser, "a b c").unwrap();
    let two = history.add_snippet(&TokenTreeParser, "d e").unwrap();
    let targets = vec![node_labelled(&one, "b"), node_labelled(&one, "c"), node_labelled(&two, "e")];

    let request = OperatorRequest::new(OperatorId::RemoveNode, Target::Nodes(targets.clone()));

    let group = Arc::clone(history.apply_request(&request).unwrap());

    for node in targets {
        assert!(group.snippet_for(Some(node)).is_none());
    }
    assert_eq!(group.node_count(), 4);
    assert_eq!(history.entries().last().copied(), Some(request.label().as_str()));
}

#[test]
fn test_transform_operator_outside_pairing_is_rejected() {
    let (history, snippet) = history_with("f(x)");
    let request = OperatorRequest::new(
        OperatorId::RewriteRemoveNode,
        Target::Node(node_labelled(&snippet, "x")),
    );

    let err = apply((**history.current()).clone(), &request, &Catalog::standard()).unwrap_err();

    assert!(matches!(err, StencilError::PairingViolation { .. }));
}

#[test]
fn test_target_outside_group_is_not_found() {
    let (history, _) = history_with("f(x)");
    let (_, stranger) = history_with("g(y)");
    let request = OperatorRequest::new(OperatorId::RelaxSize, Target::Node(stranger.root_node()));

    let err = apply((**history.current()).clone(), &request, &Catalog::standard()).unwrap_err();

    assert!(matches!(err, StencilError::NodeNotInGroup { .. }));
}

#[test]
fn test_group_conditions_round_trip() {
    let (mut history, _) = history_with("f(x)");
    let condition = vec!["(local ?x)".to_string()];

    history
        .apply(OperatorId::AddLogicCondition, Target::Group, condition.clone())
        .unwrap();
    assert_eq!(history.current().conditions().len(), 1);

    history
        .apply(OperatorId::RemoveLogicCondition, Target::Group, condition.clone())
        .unwrap();
    assert!(history.current().conditions().is_empty());

    let err = history
        .apply(OperatorId::RemoveLogicCondition, Target::Group, condition)
        .unwrap_err();
    assert!(err.to_string().contains("no condition"));
}

#[test]
fn test_group_target_requires_group_scope_operator() {
    let (mut history, _) = history_with("f(x)");
    assert!(history
        .apply(OperatorId::RelaxSize, Target::Group, Vec::new())
        .is_err());
}

#[test]
fn test_menu_follows_applicability() {
    let catalog = Catalog::shared();
    let (_, snippet) = history_with("f(x)");

    let root_menu = catalog.menu(Some(&snippet), Some(snippet.root_node()));
    let restriction = root_menu.get(&Category::Restriction).cloned().unwrap_or_default();
    assert!(restriction.contains(&OperatorId::GroundExact));
    assert!(!root_menu
        .values()
        .flatten()
        .any(|id| *id == OperatorId::ReplaceByWildcard || *id == OperatorId::RemoveNode));

    let leaf_menu = catalog.menu(Some(&snippet), Some(node_labelled(&snippet, "x")));
    assert!(leaf_menu[&Category::Generalization].contains(&OperatorId::MatchSubtype));
    assert!(!leaf_menu.contains_key(&Category::Rewrite));

    let group_menu = catalog.menu(None, None);
    assert_eq!(
        group_menu[&Category::Conditions],
        vec![OperatorId::AddLogicCondition, OperatorId::RemoveLogicCondition]
    );
}

#[test]
fn test_operator_ids_parse_from_names() {
    for id in OperatorId::ALL {
        assert_eq!(id.as_str().parse::<OperatorId>().unwrap(), id);
    }
    assert!(matches!(
        "frobnicate".parse::<OperatorId>(),
        Err(StencilError::UnknownOperator { .. })
    ));
}
