//! Core types shared across Stencil facilities
//!
//! This crate provides foundational types used by the template engine,
//! its error facility and its logging facility:
//!
//! - **Identity handles**: NodeId, SnippetId
//! - **Correlation types**: RequestId
//! - **Schema constants**: Canonical field keys and event names

pub mod correlation;
pub mod ids;
pub mod schema;

pub use correlation::RequestId;
pub use ids::{NodeId, SnippetId};
