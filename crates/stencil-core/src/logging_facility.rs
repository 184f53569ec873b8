//! Operation logging for the engine and the `stencil` binary
//!
//! Every public edit, search and CLI command reports itself as an `op`
//! with a `start` event followed by either `end` or `end_error`, carrying
//! the canonical fields from `stencil_core_types::schema`.
//!
//! ```rust
//! use stencil_core::logging_facility::{init, Profile};
//! use stencil_core::log_op_scope;
//!
//! init(Profile::Production);
//! let undone: stencil_core::Result<()> = log_op_scope!("history.undo", Ok(()));
//! assert!(undone.is_ok());
//! ```
//!
//! Tests install [`init_test_capture`] instead and assert on the captured
//! events.

pub mod init;
pub mod macros;
pub mod test_capture;

pub use init::{init, Profile};
pub use test_capture::{init_test_capture, CapturedEvent, TestCapture};
