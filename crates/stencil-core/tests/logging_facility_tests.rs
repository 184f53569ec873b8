#![allow(clippy::unwrap_used, clippy::expect_used)]

use stencil_core::ast::TokenTreeParser;
use stencil_core::errors::StencilError;
use stencil_core::logging_facility::test_capture::init_test_capture;
use stencil_core::{log_op_end, log_op_error, log_op_scope, log_op_start};
use stencil_core::{History, OperatorId, SnippetGroup, Target};
use stencil_core_types::schema::{EVENT_END, EVENT_END_ERROR, EVENT_START, FIELD_ERR_CODE, FIELD_OPERATOR};

#[test]
fn test_log_op_start_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_start_unique_1";

    log_op_start!(op_name);

    let events = capture.events();
    let start_events: Vec<_> = events
        .iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_START))
        .collect();

    assert!(
        !start_events.is_empty(),
        "Should have captured at least one start event"
    );
}

#[test]
fn test_log_op_end_macro() {
    let capture = init_test_capture();
    let op_name = "test_log_op_end_unique_2";

    log_op_end!(op_name, duration_ms = 42);

    let events = capture.events();
    let end_events: Vec<_> = events
        .iter()
        .filter(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END))
        .collect();

    assert_eq!(end_events.len(), 1, "Should have exactly one end event");
    assert_eq!(end_events[0].fields.get("duration_ms"), Some(&"42".to_string()));
}

#[test]
fn test_log_op_error_includes_code() {
    let capture = init_test_capture();
    let op_name = "test_log_op_error_unique_3";

    log_op_error!(op_name, StencilError::NothingToUndo, duration_ms = 10);

    let events = capture.events();
    let error_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name) && e.event.as_deref() == Some(EVENT_END_ERROR))
        .expect("Should have error event");

    assert_eq!(
        error_event.fields.get(FIELD_ERR_CODE),
        Some(&"ERR_NOTHING_TO_UNDO".to_string())
    );
    assert_eq!(
        error_event.fields.get("err_kind"),
        Some(&"NothingToUndo".to_string())
    );
}

#[test]
fn test_log_macros_with_multiple_fields() {
    let capture = init_test_capture();
    let op_name = "test_log_macros_fields_unique_4";

    log_op_start!(op_name, operator = "relax-size", history_len = 3);

    let events = capture.events();
    let start_event = events
        .iter()
        .find(|e| e.op.as_deref() == Some(op_name))
        .expect("Should have start event");

    assert_eq!(start_event.fields.get(FIELD_OPERATOR), Some(&"relax-size".to_string()));
    assert_eq!(start_event.fields.get("history_len"), Some(&"3".to_string()));
}

#[test]
fn test_log_op_scope_emits_start_and_matching_end() {
    let capture = init_test_capture();
    let ok_op = "test_scope_ok_unique_5";
    let err_op = "test_scope_err_unique_5";

    let ok: stencil_core::Result<u8> = log_op_scope!(ok_op, { cursor = 0 }, Ok(1));
    let err: stencil_core::Result<u8> = log_op_scope!(err_op, Err(StencilError::NothingToRedo));

    assert_eq!(ok, Ok(1));
    assert!(err.is_err());
    capture.assert_event_exists(ok_op, EVENT_START);
    capture.assert_event_exists(ok_op, EVENT_END);
    capture.assert_event_exists(err_op, EVENT_START);
    capture.assert_event_exists(err_op, EVENT_END_ERROR);
    assert_eq!(
        capture.count_events(|e| e.op.as_deref() == Some(err_op) && e.event.as_deref() == Some(EVENT_END)),
        0
    );
}

#[test]
fn test_history_apply_owns_one_start_end_pair() {
    let capture = init_test_capture();
    let mut history = History::new(SnippetGroup::new("logged"));
    let snippet = history.add_snippet(&TokenTreeParser, "f(x)").unwrap();

    history
        .apply(OperatorId::RestoreExact, Target::Node(snippet.root_node()), Vec::new())
        .unwrap_err();

    let restore = |event: &str| {
        capture.count_events(|e| {
            e.op.as_deref() == Some("history.apply")
                && e.event.as_deref() == Some(event)
                && e.fields.get(FIELD_OPERATOR).map(String::as_str) == Some("restore-exact")
        })
    };
    assert!(restore(EVENT_END_ERROR) >= 1);
    assert_eq!(restore(EVENT_END), 0);
    assert!(capture.count_events(|e| {
        e.op.as_deref() == Some("history.apply")
            && e.event.as_deref() == Some(EVENT_START)
            && e.fields.get(FIELD_OPERATOR).map(String::as_str) == Some("restore-exact")
    }) >= 1);
}

#[test]
fn test_test_capture_assert_event_exists() {
    let capture = init_test_capture();
    let op_name = "test_capture_assert_unique_7";

    log_op_start!(op_name);

    capture.assert_event_exists(op_name, EVENT_START);
}

#[test]
#[should_panic(expected = "Expected event")]
fn test_test_capture_assert_event_exists_fails() {
    let capture = init_test_capture();

    capture.assert_event_exists("nonexistent_op_truly_unique_999", EVENT_START);
}
