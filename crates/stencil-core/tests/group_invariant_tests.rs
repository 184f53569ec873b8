#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;

use common::{new_history, node_labelled};
use proptest::prelude::*;
use stencil_core::ast::{SourceParser, TokenTreeParser};
use stencil_core::{apply, Catalog, OperatorId, OperatorRequest, Snippet, SnippetGroup, StencilError, Target};

#[test]
fn test_every_node_is_claimed_by_exactly_one_snippet() {
    let mut history = new_history("claims");
    let one = history.add_snippet(&TokenTreeParser, "f(x)").unwrap();
    let two = history.add_snippet(&TokenTreeParser, "g(y)").unwrap();
    let group = history.current();

    for snippet in [&one, &two] {
        for node in snippet.nodes() {
            assert_eq!(group.snippet_for(Some(node)).unwrap().id(), snippet.id());
        }
    }
    assert_eq!(group.node_count(), one.nodes().count() + two.nodes().count());
    assert!(group.snippet_for(None).is_none());
    group.check_invariants().unwrap();
}

#[test]
fn test_inserting_a_snippet_twice_is_rejected() {
    let ast = Arc::new(TokenTreeParser.parse("f(x)").unwrap());
    let mut group = SnippetGroup::new("dup");
    group.insert_snippet(Snippet::new(Arc::clone(&ast), "f(x)")).unwrap();

    let err = group
        .insert_snippet(Snippet::new(ast, "f(x)"))
        .unwrap_err();

    assert!(matches!(err, StencilError::DuplicateNode { .. }));
    assert_eq!(group.len(), 1);
}

#[test]
fn test_highlight_points_into_owning_source() {
    let mut history = new_history("hl");
    let snippet = history.add_snippet(&TokenTreeParser, "call(arg)").unwrap();
    let arg = node_labelled(&snippet, "arg");

    let highlight = history.current().highlight(arg).unwrap();

    assert_eq!(highlight.snippet_id, *snippet.id());
    assert_eq!(highlight.text, "call(arg)");
    assert_eq!(&highlight.text[highlight.start..highlight.end], "arg");
}

#[test]
fn test_fingerprint_ignores_ids_and_name() {
    let ast = Arc::new(TokenTreeParser.parse("f(x)").unwrap());
    let mut a = SnippetGroup::new("a");
    let mut b = SnippetGroup::new("b");
    a.insert_snippet(Snippet::new(Arc::clone(&ast), "f(x)")).unwrap();
    b.insert_snippet(Snippet::new(Arc::clone(&ast), "f(x)")).unwrap();
    assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());

    let relaxed = apply(
        a.clone(),
        &OperatorRequest::new(OperatorId::RelaxSize, Target::Node(ast.root())),
        &Catalog::standard(),
    )
    .unwrap();
    assert_ne!(relaxed.fingerprint().unwrap(), a.fingerprint().unwrap());
}

#[test]
fn test_removing_parent_and_child_together_is_accepted() {
    let mut history = new_history("nested");
    let snippet = history.add_snippet(&TokenTreeParser, "f(a (b c))").unwrap();
    let inner = snippet.ast().parent(node_labelled(&snippet, "b")).unwrap();
    let targets = vec![node_labelled(&snippet, "c"), inner];

    let group = history
        .apply(OperatorId::RemoveNode, Target::Nodes(targets), Vec::new())
        .unwrap();

    assert!(group.snippet_for(Some(inner)).is_none());
    group.check_invariants().unwrap();
}

#[test]
fn test_batch_with_root_fails_atomically() {
    let mut history = new_history("atomic");
    let snippet = history.add_snippet(&TokenTreeParser, "f(x y)").unwrap();
    let before = Arc::clone(history.current());
    let targets = vec![node_labelled(&snippet, "x"), snippet.root_node()];

    assert!(history
        .apply(OperatorId::RemoveNode, Target::Nodes(targets), Vec::new())
        .is_err());
    assert!(Arc::ptr_eq(history.current(), &before));
}

proptest! {
    #[test]
    fn prop_batch_removal_is_order_independent(picks in prop::collection::vec(0usize..6, 1..6), seed in any::<u64>()) {
        let mut group = SnippetGroup::new("prop");
        let snippet = group.add_snippet(&TokenTreeParser, "f(a b) g(c (d e))").unwrap();
        let candidates: Vec<_> = snippet
            .ast()
            .preorder()
            .iter()
            .copied()
            .filter(|n| *n != snippet.root_node())
            .collect();
        let targets: Vec<_> = picks.iter().map(|i| candidates[i % candidates.len()]).collect();
        let mut shuffled = targets.clone();
        shuffled.rotate_left((seed as usize) % targets.len());
        shuffled.reverse();

        let catalog = Catalog::standard();
        let forward = apply(group.clone(), &OperatorRequest::new(OperatorId::RemoveNode, Target::Nodes(targets)), &catalog);
        let backward = apply(group, &OperatorRequest::new(OperatorId::RemoveNode, Target::Nodes(shuffled)), &catalog);

        match (forward, backward) {
            (Ok(a), Ok(b)) => {
                prop_assert_eq!(a.fingerprint().unwrap(), b.fingerprint().unwrap());
                a.check_invariants().unwrap();
            }
            (Err(_), Err(_)) => {}
            (a, b) => prop_assert!(false, "outcomes differ: {:?} vs {:?}", a.is_ok(), b.is_ok()),
        }
    }
}
