#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{examples, history_with, SlowEngine, StructuralEngine};
use stencil_core::search::{spawn, CancelToken, StopReason};
use stencil_core::{search, Catalog, QueryEngine, SearchConfig};

#[test]
fn test_structural_engine_sanity() {
    let (history, _) = history_with("f(x);");
    let engine = StructuralEngine;
    let group = history.current();

    assert!(engine.evaluate(group, &examples(&["f(x);"])[0]).unwrap().matches);
    assert!(!engine.evaluate(group, &examples(&["{ g(1); } f(x);"])[0]).unwrap().matches);
    assert!(!engine.evaluate(group, &examples(&["f(y);"])[0]).unwrap().matches);
}

#[test]
fn test_start_group_already_separating_needs_no_steps() {
    let (history, _) = history_with("f(x);");

    let report = search(
        history.current(),
        &examples(&["f(x);"]),
        &examples(&["g(x);"]),
        &StructuralEngine,
        &Catalog::standard(),
        &SearchConfig::default(),
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(report.stop, StopReason::CandidateLimit);
    assert_eq!(report.explored, 1);
    assert!(report.candidates[0].script.is_empty());
}

#[test]
fn test_one_generalization_separates_examples() {
    // GIVEN: a template that only matches the first positive example
    let (history, _) = history_with("f(x);");
    let positives = examples(&["f(x);", "f(y);"]);
    let negatives = examples(&["g(x);"]);

    // WHEN: searching for one candidate
    let report = search(
        history.current(),
        &positives,
        &negatives,
        &StructuralEngine,
        &Catalog::standard(),
        &SearchConfig::default(),
        &CancelToken::new(),
    )
    .unwrap();

    // THEN: a single-step script produces a group that separates them
    assert_eq!(report.stop, StopReason::CandidateLimit);
    let candidate = &report.candidates[0];
    assert_eq!(candidate.script.len(), 1);
    for example in &positives {
        assert!(StructuralEngine.evaluate(&candidate.group, example).unwrap().matches);
    }
    assert!(!StructuralEngine.evaluate(&candidate.group, &negatives[0]).unwrap().matches);
    assert_eq!(history.current().len(), 1, "start group is never modified");
}

#[test]
fn test_unseparable_examples_exhaust_without_candidates() {
    let (history, _) = history_with("f(x);");
    let config = SearchConfig {
        max_depth: 1,
        ..SearchConfig::default()
    };

    let report = search(
        history.current(),
        &examples(&["f(x);"]),
        &examples(&["f(x);"]),
        &StructuralEngine,
        &Catalog::standard(),
        &config,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(report.stop, StopReason::Exhausted);
    assert!(report.candidates.is_empty());
    assert!(report.explored > 1);
}

#[test]
fn test_pre_cancelled_search_stops_immediately() {
    let (history, _) = history_with("f(x);");
    let cancel = CancelToken::new();
    cancel.cancel();

    let report = search(
        history.current(),
        &examples(&["f(y);"]),
        &[],
        &StructuralEngine,
        &Catalog::standard(),
        &SearchConfig::default(),
        &cancel,
    )
    .unwrap();

    assert_eq!(report.stop, StopReason::Cancelled);
    assert_eq!(report.explored, 0);
}

#[test]
fn test_spawned_search_reports_like_inline_search() {
    let (history, _) = history_with("f(x);");
    let handle = spawn(
        Arc::clone(history.current()),
        examples(&["f(x);", "f(y);"]),
        examples(&["g(x);"]),
        Arc::new(StructuralEngine),
        Catalog::shared(),
        SearchConfig::default(),
    );

    assert!(!handle.request_id().as_str().is_empty());
    let report = handle.wait().unwrap();

    assert_eq!(report.candidates.len(), 1);
    assert_eq!(report.candidates[0].script.len(), 1);
}

#[test]
fn test_wait_timeout_cancels_slow_search() {
    let (history, _) = history_with("f(a b c d);");
    let engine: Arc<dyn QueryEngine> = Arc::new(SlowEngine(Duration::from_millis(20)));
    let handle = spawn(
        Arc::clone(history.current()),
        examples(&["f(x);"]),
        Vec::new(),
        engine,
        Catalog::shared(),
        SearchConfig {
            max_depth: 5,
            ..SearchConfig::default()
        },
    );

    let report = handle.wait_timeout(Duration::from_millis(50)).unwrap();

    assert_eq!(report.stop, StopReason::Cancelled);
    assert!(report.candidates.is_empty());
}

#[test]
fn test_search_timeout_from_config() {
    let (history, _) = history_with("f(a b c d);");
    let config = SearchConfig {
        max_depth: 5,
        timeout: Some(Duration::from_millis(30)),
        ..SearchConfig::default()
    };

    let report = search(
        history.current(),
        &examples(&["f(x);"]),
        &[],
        &SlowEngine(Duration::from_millis(10)),
        &Catalog::standard(),
        &config,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(report.stop, StopReason::TimedOut);
}

#[test]
fn test_zero_candidate_limit_returns_nothing() {
    let (history, _) = history_with("f(x);");
    let config = SearchConfig {
        max_candidates: 0,
        ..SearchConfig::default()
    };

    let report = search(
        history.current(),
        &examples(&["f(x);"]),
        &examples(&["g(x);"]),
        &StructuralEngine,
        &Catalog::standard(),
        &config,
        &CancelToken::new(),
    )
    .unwrap();

    assert_eq!(report.stop, StopReason::CandidateLimit);
    assert!(report.candidates.is_empty());
    assert_eq!(report.explored, 0);
}
