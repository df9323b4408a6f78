//! Precompute queries: bounded, single-column queries used to discover the
//! candidate values of an editable node.

use crate::error::QueryError;
use crate::node::PathNode;
use crate::query::PathQuery;
use crate::template::TemplateQuery;

/// Build the query whose results are the candidate values for `target`.
///
/// The result keeps every non-editable constraint of the source query, drops
/// every editable one (including those on `target`), and projects only
/// `target`'s path. `base` replaces the template's own query as the source of
/// fixed constraints when given.
pub fn build_precompute_query(
    template: &TemplateQuery,
    base: Option<&PathQuery>,
    target: &PathNode,
) -> Result<PathQuery, QueryError> {
    let source = base.unwrap_or_else(|| template.query());
    let mut query = source.clone();
    query.remove_editable_constraints();
    // Constraint codes may name constraints that were just removed.
    query.set_constraint_logic(None);
    query.clear_view();
    query.add_view(target.path())?;
    Ok(query)
}
