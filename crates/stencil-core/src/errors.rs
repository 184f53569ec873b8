use stencil_core_types::{NodeId, RequestId};
use thiserror::Error;

/// Result type alias using StencilError
pub type Result<T> = std::result::Result<T, StencilError>;

// ========== Error Facility ==========

/// Canonical error kind taxonomy
///
/// This taxonomy provides a stable, structured classification of all errors
/// in the template engine. Each kind maps to a stable error code that can be
/// used for programmatic error handling, testing, and presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExErrorKind {
    // Parsing
    Parse,
    UnanchoredDirective,
    UnknownDirective,
    SourceParse,

    // Operators
    UnknownOperator,
    PreconditionViolation,

    // Lookup/structure
    NotFound,
    DuplicateNode,
    InvariantViolation,

    // Pairing
    PairingViolation,

    // History
    NothingToUndo,
    NothingToRedo,

    // Collaborators
    ExternalService,
    Cancelled,

    // Configuration
    Config,

    // Internal
    Internal,
}

impl ExErrorKind {
    /// Get the stable error code for this kind
    pub fn code(&self) -> &'static str {
        match self {
            ExErrorKind::Parse => "ERR_PARSE",
            ExErrorKind::UnanchoredDirective => "ERR_UNANCHORED_DIRECTIVE",
            ExErrorKind::UnknownDirective => "ERR_UNKNOWN_DIRECTIVE",
            ExErrorKind::SourceParse => "ERR_SOURCE_PARSE",
            ExErrorKind::UnknownOperator => "ERR_UNKNOWN_OPERATOR",
            ExErrorKind::PreconditionViolation => "ERR_PRECONDITION",
            ExErrorKind::NotFound => "ERR_NOT_FOUND",
            ExErrorKind::DuplicateNode => "ERR_DUPLICATE_NODE",
            ExErrorKind::InvariantViolation => "ERR_INVARIANT_VIOLATION",
            ExErrorKind::PairingViolation => "ERR_PAIRING_VIOLATION",
            ExErrorKind::NothingToUndo => "ERR_NOTHING_TO_UNDO",
            ExErrorKind::NothingToRedo => "ERR_NOTHING_TO_REDO",
            ExErrorKind::ExternalService => "ERR_EXTERNAL_SERVICE",
            ExErrorKind::Cancelled => "ERR_CANCELLED",
            ExErrorKind::Config => "ERR_CONFIG",
            ExErrorKind::Internal => "ERR_INTERNAL",
        }
    }
}

/// Canonical structured error type
///
/// Carries the classification plus the context a caller needs to report a
/// rejection: which operator, which node, which text offset.
#[derive(Debug, Clone)]
pub struct ExError {
    kind: ExErrorKind,
    op: Option<String>,
    operator: Option<String>,
    node: Option<NodeId>,
    offset: Option<usize>,
    request_id: Option<RequestId>,
    message: String,
}

impl ExError {
    /// Create a new error with the specified kind
    pub fn new(kind: ExErrorKind) -> Self {
        Self {
            kind,
            op: None,
            operator: None,
            node: None,
            offset: None,
            request_id: None,
            message: String::new(),
        }
    }

    /// Add operation context
    pub fn with_op(mut self, op: impl Into<String>) -> Self {
        self.op = Some(op.into());
        self
    }

    /// Add operator id context
    pub fn with_operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Add node context
    pub fn with_node(mut self, node: NodeId) -> Self {
        self.node = Some(node);
        self
    }

    /// Add text offset context
    pub fn with_offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Add request ID context
    pub fn with_request_id(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    /// Add custom message
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn kind(&self) -> ExErrorKind {
        self.kind
    }

    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn op(&self) -> Option<&str> {
        self.op.as_deref()
    }

    pub fn operator(&self) -> Option<&str> {
        self.operator.as_deref()
    }

    pub fn node(&self) -> Option<NodeId> {
        self.node
    }

    pub fn offset(&self) -> Option<usize> {
        self.offset
    }

    pub fn request_id(&self) -> Option<&RequestId> {
        self.request_id.as_ref()
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl std::fmt::Display for ExError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}]", self.code())?;
        if let Some(op) = &self.op {
            write!(f, " in operation '{}'", op)?;
        }
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }
        if let Some(operator) = &self.operator {
            write!(f, " (operator: {})", operator)?;
        }
        if let Some(node) = self.node {
            write!(f, " (node: {})", node)?;
        }
        if let Some(offset) = self.offset {
            write!(f, " (offset: {})", offset)?;
        }
        Ok(())
    }
}

impl std::error::Error for ExError {}

// ========== End Error Facility ==========

/// Error taxonomy for template engine operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StencilError {
    // ===== Parsing Errors =====
    /// Malformed or unbalanced annotation syntax
    #[error("Directive parse error at offset {offset}: {message}")]
    DirectiveParse { offset: usize, message: String },

    /// An annotation whose content does not coincide with any AST node
    #[error("Annotation at offset {offset} does not enclose a syntax node")]
    UnanchoredDirective { offset: usize },

    /// A directive naming no usable operator
    #[error("Unknown directive '{name}' at offset {offset}")]
    UnknownDirective { name: String, offset: usize },

    /// The source parser rejected the (masked) text
    #[error("Source parse error at offset {offset}: {message}")]
    SourceParse { offset: usize, message: String },

    // ===== Operator Errors =====
    /// Operator id not present in the catalog
    #[error("Unknown operator: {operator}")]
    UnknownOperator { operator: String },

    /// Inapplicable node, missing or malformed argument
    #[error("Operator {operator} rejected{}: {precondition}", .node.map(|n| format!(" on node {n}")).unwrap_or_default())]
    OperatorPrecondition {
        operator: String,
        node: Option<NodeId>,
        precondition: String,
    },

    // ===== Lookup/Structure Errors =====
    /// Node is not bound by any snippet of the group
    #[error("Node {node} is not part of group '{group}'")]
    NodeNotInGroup { node: NodeId, group: String },

    /// Snippet id not present in the group
    #[error("Snippet not found: {snippet_id}")]
    SnippetNotFound { snippet_id: String },

    /// A node would be claimed by two snippets
    #[error("Node {node} is already claimed by snippet {snippet_id}")]
    DuplicateNode { node: NodeId, snippet_id: String },

    /// Node index diverged from the snippets (internal assertion)
    #[error("Group invariant violated in '{group}': {reason}")]
    GroupInvariant { group: String, reason: String },

    // ===== Pairing Errors =====
    /// Template/rewrite pairing rules broken
    #[error("Pairing violation: {reason}")]
    PairingViolation { reason: String },

    // ===== History Errors =====
    #[error("Nothing to undo")]
    NothingToUndo,

    #[error("Nothing to redo")]
    NothingToRedo,

    // ===== Collaborator Errors =====
    /// The query collaborator failed
    #[error("Query engine error: {message}")]
    Query { message: String },

    /// An off-thread search was cancelled before it produced a report
    #[error("Search cancelled")]
    SearchCancelled,

    // ===== Generic Errors =====
    /// Invalid configuration
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Generic internal error
    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StencilError {
    /// Shorthand for an operator precondition violation
    pub fn precondition(
        operator: impl Into<String>,
        node: Option<NodeId>,
        precondition: impl Into<String>,
    ) -> Self {
        StencilError::OperatorPrecondition {
            operator: operator.into(),
            node,
            precondition: precondition.into(),
        }
    }

    pub fn pairing(reason: impl Into<String>) -> Self {
        StencilError::PairingViolation {
            reason: reason.into(),
        }
    }
}

/// Conversion from StencilError to ExError
impl From<StencilError> for ExError {
    fn from(err: StencilError) -> Self {
        match err {
            StencilError::DirectiveParse { offset, message } => {
                ExError::new(ExErrorKind::Parse)
                    .with_offset(offset)
                    .with_message(message)
            }
            StencilError::UnanchoredDirective { offset } => {
                ExError::new(ExErrorKind::UnanchoredDirective)
                    .with_offset(offset)
                    .with_message("Annotation does not enclose a syntax node")
            }
            StencilError::UnknownDirective { name, offset } => {
                ExError::new(ExErrorKind::UnknownDirective)
                    .with_offset(offset)
                    .with_message(format!("Unknown directive '{}'", name))
            }
            StencilError::SourceParse { offset, message } => {
                ExError::new(ExErrorKind::SourceParse)
                    .with_offset(offset)
                    .with_message(message)
            }
            StencilError::UnknownOperator { operator } => {
                ExError::new(ExErrorKind::UnknownOperator)
                    .with_operator(operator)
                    .with_message("Operator not in catalog")
            }
            StencilError::OperatorPrecondition {
                operator,
                node,
                precondition,
            } => {
                let err = ExError::new(ExErrorKind::PreconditionViolation)
                    .with_operator(operator)
                    .with_message(precondition);
                match node {
                    Some(node) => err.with_node(node),
                    None => err,
                }
            }
            StencilError::NodeNotInGroup { node, group } => ExError::new(ExErrorKind::NotFound)
                .with_node(node)
                .with_message(format!("Node is not part of group '{}'", group)),
            StencilError::SnippetNotFound { snippet_id } => ExError::new(ExErrorKind::NotFound)
                .with_message(format!("Snippet not found: {}", snippet_id)),
            StencilError::DuplicateNode { node, snippet_id } => {
                ExError::new(ExErrorKind::DuplicateNode)
                    .with_node(node)
                    .with_message(format!("Already claimed by snippet {}", snippet_id))
            }
            StencilError::GroupInvariant { group, reason } => {
                ExError::new(ExErrorKind::InvariantViolation)
                    .with_message(format!("{}: {}", group, reason))
            }
            StencilError::PairingViolation { reason } => {
                ExError::new(ExErrorKind::PairingViolation).with_message(reason)
            }
            StencilError::NothingToUndo => {
                ExError::new(ExErrorKind::NothingToUndo).with_message("Nothing to undo")
            }
            StencilError::NothingToRedo => {
                ExError::new(ExErrorKind::NothingToRedo).with_message("Nothing to redo")
            }
            StencilError::Query { message } => {
                ExError::new(ExErrorKind::ExternalService).with_message(message)
            }
            StencilError::SearchCancelled => {
                ExError::new(ExErrorKind::Cancelled).with_message("Search cancelled")
            }
            StencilError::Config { message } => {
                ExError::new(ExErrorKind::Config).with_message(message)
            }
            StencilError::Internal { message } => {
                ExError::new(ExErrorKind::Internal).with_message(message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_display_names_operator_and_node() {
        let err = StencilError::precondition(
            "replace-by-wildcard",
            Some(NodeId::new(3)),
            "node is the snippet root",
        );
        let text = err.to_string();
        assert!(text.contains("replace-by-wildcard"));
        assert!(text.contains("n3"));
        assert!(text.contains("snippet root"));
    }

    #[test]
    fn test_ex_error_display_includes_code() {
        let ex: ExError = StencilError::DirectiveParse {
            offset: 4,
            message: "unexpected ']'".to_string(),
        }
        .into();
        assert_eq!(ex.offset(), Some(4));
        assert!(ex.to_string().starts_with("[ERR_PARSE]"));
    }
}
