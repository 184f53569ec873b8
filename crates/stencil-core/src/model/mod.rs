pub mod binding;
pub mod group;
pub mod snippet;

pub use binding::{Binding, Constraint, Grounding, LogicCondition, LogicVar};
pub use group::{Highlight, SnippetGroup};
pub use snippet::Snippet;
