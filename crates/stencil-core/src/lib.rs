//! Stencil Core - versioned code templates over syntax trees
//!
//! This crate provides the template engine:
//! - Extraction of nested `[content]@[directives]` annotation regions
//! - Snippets (templates anchored to one syntax tree) and snippet groups
//! - A catalog of operators that generalize, restrict and restructure snippets
//! - Linear undo/redo history over immutable group versions
//! - Paired template/rewrite transformations
//! - Example-driven search over operator scripts
//!
//! Parsing source code and running the derived queries are left to external
//! collaborators, reached through the [`ast::SourceParser`] and
//! [`query::QueryEngine`] traits. A small reference parser,
//! [`ast::TokenTreeParser`], drives the engine end to end.

pub mod apply;
pub mod ast;
pub mod config;
pub mod directive;
pub mod errors;
pub mod history;
pub mod logging_facility;
pub mod model;
pub mod operators;
pub mod pairing;
pub mod query;
pub mod search;

// Used by the exported logging macros.
#[doc(hidden)]
pub use tracing;
pub use stencil_core_types as core_types;

// Re-export commonly used types
pub use apply::{apply, OperatorRequest};
pub use config::StencilConfig;
pub use errors::{ExError, ExErrorKind, Result, StencilError};
pub use history::History;
pub use model::{Snippet, SnippetGroup};
pub use operators::{Catalog, OperatorId, Target};
pub use pairing::PairedGroup;
pub use query::{Example, QueryEngine, Verdict};
pub use search::{search, SearchConfig, SearchReport};
