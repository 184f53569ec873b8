//! The standard operator catalog

use std::collections::BTreeMap;
use std::sync::{Arc, OnceLock};

use stencil_core_types::NodeId;

use super::generalize::{
    any_node, deep_root, exact_root, has_bound_children, labelled_leaf, non_root, restorable,
};
use super::rename::carries_variable;
use super::{
    conditions, generalize, rename, structure, transform, ApplicableFn, ApplyFn, Category,
    OperatorId, OperatorShape, OperatorSpec, ParamKind, ParamSpec,
};
use crate::errors::{Result, StencilError};
use crate::model::Snippet;

/// Applicable operators of one node, keyed by category
pub type Menu = BTreeMap<Category, Vec<OperatorId>>;

const VARIABLE: ParamSpec = ParamSpec {
    name: "variable",
    kind: ParamKind::Variable,
    optional: true,
};
const BOUND_VARIABLE: ParamSpec = ParamSpec {
    name: "variable",
    kind: ParamKind::BoundVariable,
    optional: false,
};
const CONDITION: ParamSpec = ParamSpec {
    name: "condition",
    kind: ParamKind::Text,
    optional: false,
};
const NEW_NAME: ParamSpec = ParamSpec {
    name: "new-name",
    kind: ParamKind::Variable,
    optional: false,
};
const TEXT: ParamSpec = ParamSpec {
    name: "text",
    kind: ParamKind::Variable,
    optional: false,
};

/// Entry with every flag off
#[allow(clippy::too_many_arguments)]
fn spec(
    id: OperatorId,
    name: &'static str,
    description: &'static str,
    categories: &'static [Category],
    shape: OperatorShape,
    params: &'static [ParamSpec],
    applicable: ApplicableFn,
    apply: ApplyFn,
) -> OperatorSpec {
    OperatorSpec {
        id,
        name,
        description,
        categories,
        shape,
        params,
        group_scope: false,
        batch: false,
        search_move: false,
        applicable,
        apply,
    }
}

/// Read-only registry of operators
#[derive(Debug)]
pub struct Catalog {
    specs: Vec<OperatorSpec>,
}

static SHARED: OnceLock<Arc<Catalog>> = OnceLock::new();

impl Catalog {
    /// The process-wide standard catalog, built on first use
    pub fn shared() -> Arc<Catalog> {
        Arc::clone(SHARED.get_or_init(|| Arc::new(Catalog::standard())))
    }

    pub fn standard() -> Self {
        use Category::*;
        use OperatorShape::*;

        let specs = vec![
            OperatorSpec {
                search_move: true,
                ..spec(
                    OperatorId::ReplaceByVariable,
                    "Replace by variable",
                    "Match any subtree here and bind it to a logic variable",
                    &[Generalization, Variables],
                    Generalize,
                    &[VARIABLE],
                    any_node,
                    generalize::replace_by_variable,
                )
            },
            OperatorSpec {
                search_move: true,
                ..spec(
                    OperatorId::ReplaceByWildcard,
                    "Replace by wildcard",
                    "Match any subtree here",
                    &[Generalization],
                    Generic,
                    &[],
                    non_root,
                    generalize::replace_by_wildcard,
                )
            },
            spec(
                OperatorId::EqualsVariable,
                "Equals variable",
                "Match the value bound to a variable elsewhere in the group",
                &[Variables],
                Generic,
                &[BOUND_VARIABLE],
                any_node,
                generalize::equals_variable,
            ),
            OperatorSpec {
                search_move: true,
                ..spec(
                    OperatorId::MatchSubtype,
                    "Match subtype",
                    "Match any node of the same kind",
                    &[Generalization],
                    Generic,
                    &[],
                    labelled_leaf,
                    generalize::match_subtype,
                )
            },
            OperatorSpec {
                search_move: true,
                ..spec(
                    OperatorId::RelaxSize,
                    "Relax size",
                    "Match children as an ordered subsequence",
                    &[Generalization],
                    Generic,
                    &[],
                    has_bound_children,
                    generalize::relax_size,
                )
            },
            spec(
                OperatorId::RestoreExact,
                "Restore exact match",
                "Match kind, label and children exactly again",
                &[Restriction],
                Generic,
                &[],
                restorable,
                generalize::restore_exact,
            ),
            spec(
                OperatorId::GroundExact,
                "Ground at root",
                "Only match at the root of the candidate code",
                &[Restriction],
                Generic,
                &[],
                deep_root,
                generalize::ground_exact,
            ),
            OperatorSpec {
                search_move: true,
                ..spec(
                    OperatorId::GroundDeep,
                    "Ground anywhere",
                    "Match anywhere in the candidate code",
                    &[Generalization],
                    Generic,
                    &[],
                    exact_root,
                    generalize::ground_deep,
                )
            },
            OperatorSpec {
                batch: true,
                search_move: true,
                ..spec(
                    OperatorId::RemoveNode,
                    "Remove node",
                    "Drop the node and its subtree from the pattern",
                    &[Structure],
                    Generic,
                    &[],
                    non_root,
                    structure::remove_node,
                )
            },
            OperatorSpec {
                group_scope: true,
                ..spec(
                    OperatorId::AddLogicCondition,
                    "Add logic condition",
                    "Attach a condition to the snippet or the group",
                    &[Conditions],
                    Generic,
                    &[CONDITION],
                    any_node,
                    conditions::add_condition,
                )
            },
            OperatorSpec {
                group_scope: true,
                ..spec(
                    OperatorId::RemoveLogicCondition,
                    "Remove logic condition",
                    "Detach a condition from the snippet or the group",
                    &[Conditions],
                    Generic,
                    &[CONDITION],
                    any_node,
                    conditions::remove_condition,
                )
            },
            spec(
                OperatorId::RenameVariable,
                "Rename variable",
                "Rename the node's variable throughout the snippet",
                &[Variables],
                Rename,
                &[NEW_NAME],
                carries_variable,
                rename::rename_variable,
            ),
            spec(
                OperatorId::RewriteWithTemplateNode,
                "Rewrite with template node",
                "Replace the node by the value matched at a template node",
                &[Rewrite],
                Transform,
                &[],
                any_node,
                transform::rewrite_with_template_node,
            ),
            spec(
                OperatorId::RewriteRemoveNode,
                "Remove from rewrite",
                "Drop the node from the rewritten code",
                &[Rewrite],
                Transform,
                &[],
                non_root,
                transform::rewrite_remove_node,
            ),
            spec(
                OperatorId::RewriteWithText,
                "Rewrite with variable",
                "Replace the node by the value of a variable",
                &[Rewrite],
                Transform,
                &[TEXT],
                any_node,
                transform::rewrite_with_text,
            ),
        ];

        Self { specs }
    }

    pub fn operators(&self) -> &[OperatorSpec] {
        &self.specs
    }

    /// # Errors
    ///
    /// `UnknownOperator` if the catalog does not carry `id`.
    pub fn get(&self, id: OperatorId) -> Result<&OperatorSpec> {
        self.specs
            .iter()
            .find(|spec| spec.id == id)
            .ok_or_else(|| StencilError::UnknownOperator {
                operator: id.to_string(),
            })
    }

    /// Look an operator up by its id string
    ///
    /// # Errors
    ///
    /// `UnknownOperator` for names that are not operator ids.
    pub fn lookup(&self, name: &str) -> Result<&OperatorSpec> {
        self.get(name.parse()?)
    }

    /// Operators search may apply on its own
    pub fn search_moves(&self) -> impl Iterator<Item = &OperatorSpec> {
        self.specs.iter().filter(|spec| spec.search_move)
    }

    /// Non-transform operators applicable to `node` of `snippet`
    ///
    /// With no node, lists the operators that work at group scope.
    pub fn menu(&self, snippet: Option<&Snippet>, node: Option<NodeId>) -> Menu {
        self.collect_menu(|spec| {
            !spec.is_transform()
                && match (snippet, node) {
                    (Some(snippet), Some(node)) => spec.is_applicable(snippet, node),
                    _ => spec.group_scope,
                }
        })
    }

    /// Transform operators applicable to `node` of a rewritten snippet
    pub fn rewrite_menu(&self, snippet: &Snippet, node: NodeId) -> Menu {
        self.collect_menu(|spec| spec.is_transform() && spec.is_applicable(snippet, node))
    }

    fn collect_menu(&self, include: impl Fn(&OperatorSpec) -> bool) -> Menu {
        let mut menu = Menu::new();
        for spec in self.specs.iter().filter(|spec| include(*spec)) {
            for category in spec.categories {
                menu.entry(*category).or_default().push(spec.id);
            }
        }
        menu
    }
}
