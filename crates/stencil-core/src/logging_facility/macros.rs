//! Canonical logging macros
//!
//! These macros provide a structured, consistent way to log operations.

/// Log the start of an operation
///
/// # Example
///
/// ```
/// # use stencil_core::log_op_start;
/// log_op_start!("history.apply");
/// log_op_start!("history.apply", operator = "remove-node");
/// ```
#[macro_export]
macro_rules! log_op_start {
    ($op:expr) => {
        $crate::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
        );
    };
    ($op:expr, $($field:tt)*) => {
        $crate::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_START,
            $($field)*
        );
    };
}

/// Log the successful end of an operation
///
/// # Example
///
/// ```
/// # use stencil_core::log_op_end;
/// log_op_end!("history.apply", duration_ms = 42);
/// ```
#[macro_export]
macro_rules! log_op_end {
    ($op:expr, duration_ms = $duration:expr) => {
        $crate::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
        );
    };
    ($op:expr, duration_ms = $duration:expr, $($field:tt)*) => {
        $crate::tracing::info!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END,
            duration_ms = $duration,
            $($field)*
        );
    };
}

/// Log an operation error
///
/// # Example
///
/// ```
/// # use stencil_core::{log_op_error, errors::StencilError};
/// let err = StencilError::NothingToUndo;
/// log_op_error!("history.undo", err, duration_ms = 10);
/// ```
#[macro_export]
macro_rules! log_op_error {
    ($op:expr, $err:expr, duration_ms = $duration:expr) => {{
        use $crate::errors::ExError;
        let ex_err: ExError = $err.into();
        $crate::tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
        );
    }};
    ($op:expr, $err:expr, duration_ms = $duration:expr, $($field:tt)*) => {{
        use $crate::errors::ExError;
        let ex_err: ExError = $err.into();
        $crate::tracing::error!(
            component = module_path!(),
            op = $op,
            event = $crate::core_types::schema::EVENT_END_ERROR,
            duration_ms = $duration,
            err_kind = ?ex_err.kind(),
            err_code = ex_err.code(),
            $($field)*
        );
    }};
}

/// Wrap a fallible expression in start/end/end_error events
///
/// The expression must evaluate to a `stencil_core::Result`. Optional start
/// fields go in braces.
///
/// # Example
///
/// ```
/// # use stencil_core::{log_op_scope, errors::{Result, StencilError}};
/// let ok: Result<u32> = log_op_scope!("history.redo", { cursor = 1 }, Ok(2));
/// assert_eq!(ok, Ok(2));
/// let err: Result<u32> = log_op_scope!("history.redo", Err(StencilError::NothingToRedo));
/// assert!(err.is_err());
/// ```
#[macro_export]
macro_rules! log_op_scope {
    (@finish $op:expr, $started:expr, $body:expr) => {{
        let started = $started;
        let result: $crate::errors::Result<_> = $body;
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => {
                $crate::log_op_end!($op, duration_ms = duration_ms);
            }
            Err(err) => {
                $crate::log_op_error!($op, err.clone(), duration_ms = duration_ms);
            }
        }
        result
    }};
    ($op:expr, { $($field:tt)* }, $body:expr) => {{
        $crate::log_op_start!($op, $($field)*);
        $crate::log_op_scope!(@finish $op, std::time::Instant::now(), $body)
    }};
    ($op:expr, $body:expr) => {{
        $crate::log_op_start!($op);
        $crate::log_op_scope!(@finish $op, std::time::Instant::now(), $body)
    }};
}
