//! Foreign-key path resolution.
//!
//! Every non-root path a statement referenced needs one JOIN per step. The
//! resolver walks each path's prefixes, checks that every step is a
//! declared relationship, and emits one join per distinct prefix. Joins
//! (resolved and explicit) are then ordered so no join uses an alias
//! before the join defining it.

use indexmap::{IndexMap, IndexSet};
use ormlambda_core::{Error, ResolutionErrorKind, Result, TablePath};

use crate::context::CompileContext;
use crate::join::{JoinClause, JoinType, RenderedJoin};

/// Joins implied by every path `ctx` has walked.
pub fn materialize(ctx: &mut CompileContext<'_>, join_type: JoinType) -> Result<Vec<RenderedJoin>> {
    let walked: Vec<TablePath> = ctx.walked_paths().cloned().collect();
    let mut emitted: IndexSet<String> = IndexSet::new();
    let mut joins = Vec::new();

    for path in &walked {
        for prefix in path.prefixes() {
            let key = prefix.key();
            if emitted.contains(&key) {
                continue;
            }
            joins.push(step_join(ctx, &prefix, join_type)?);
            emitted.insert(key);
        }
    }
    Ok(joins)
}

fn step_join(
    ctx: &mut CompileContext<'_>,
    path: &TablePath,
    join_type: JoinType,
) -> Result<RenderedJoin> {
    let (Some(parent), Some(step)) = (path.parent(), path.steps().last().copied()) else {
        return Err(Error::resolution(
            ResolutionErrorKind::UnknownRelationship,
            Some(path.key()),
            "a root path needs no join",
        ));
    };
    if !ctx.registry().has_relationship(&step) {
        return Err(Error::resolution(
            ResolutionErrorKind::UnknownRelationship,
            Some(path.key()),
            format!(
                "relationship '{}' from '{}' to '{}' is not registered",
                step.name(),
                step.left.name(),
                step.right().name()
            ),
        ));
    }

    let parent_alias = ctx.alias_of(&parent)?;
    let parent_ref = ctx.alias_sql(&parent, &parent_alias);
    let alias = ctx.alias_of(path)?;
    let quoted = ctx.dialect().quote_identifier(&alias);
    let sql = format!(
        "{} {} AS {} ON {}.{} {} {}.{}",
        ctx.dialect().join_keyword(join_type),
        ctx.table_name(step.right()),
        quoted,
        parent_ref,
        step.info.left_column,
        step.info.op,
        quoted,
        step.info.right_column,
    );
    tracing::trace!(path = %path.key(), alias = %alias, "resolved join");
    Ok(RenderedJoin {
        alias,
        depends_on: vec![parent_alias],
        sql,
    })
}

/// Render an explicit join.
///
/// The joined table's root path must already be bound in the context.
pub fn explicit_join(ctx: &mut CompileContext<'_>, join: &JoinClause) -> Result<RenderedJoin> {
    let root = join.root();
    let alias = ctx.alias_of(&root)?;
    let table_sql = ctx.table_name(join.table);
    let target = if alias == table_sql {
        table_sql
    } else {
        format!("{} AS {}", table_sql, ctx.dialect().quote_identifier(&alias))
    };

    let on = ctx.condition(&join.on)?;
    let mut depends_on = Vec::new();
    for column in join.on.columns() {
        let used = ctx.alias_of(&column.path)?;
        if used != alias && !depends_on.contains(&used) {
            depends_on.push(used);
        }
    }
    Ok(RenderedJoin {
        sql: format!(
            "{} {} ON {}",
            ctx.dialect().join_keyword(join.join_type),
            target,
            on
        ),
        alias,
        depends_on,
    })
}

/// Stable topological order over `joins`.
///
/// A dependency counts only when some join in the list defines it; the
/// base table and anything else already in scope are satisfied from the
/// start. Among joins ready at the same time the input order is kept.
pub fn order_joins(joins: Vec<RenderedJoin>) -> Result<Vec<RenderedJoin>> {
    let defined: IndexMap<String, usize> = joins
        .iter()
        .enumerate()
        .map(|(i, join)| (join.alias.clone(), i))
        .collect();

    let mut pending: Vec<Option<RenderedJoin>> = joins.into_iter().map(Some).collect();
    let mut placed: IndexSet<String> = IndexSet::new();
    let mut ordered = Vec::with_capacity(pending.len());

    while ordered.len() < pending.len() {
        let ready = pending.iter().position(|slot| {
            slot.as_ref().is_some_and(|join| {
                join.depends_on
                    .iter()
                    .all(|dep| !defined.contains_key(dep) || placed.contains(dep))
            })
        });
        let Some(index) = ready else {
            let stuck: Vec<String> = pending
                .iter()
                .flatten()
                .map(|join| join.alias.clone())
                .collect();
            return Err(Error::resolution(
                ResolutionErrorKind::JoinCycle,
                None,
                format!("joins {:?} depend on each other", stuck),
            ));
        };
        if let Some(join) = pending[index].take() {
            placed.insert(join.alias.clone());
            ordered.push(join);
        }
    }
    Ok(ordered)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::AnsiDialect;
    use crate::testing::{D, E, registry};
    use ormlambda_core::{SchemaRegistry, Table, TableProxy, TableRef};

    fn rendered(alias: &str, deps: &[&str]) -> RenderedJoin {
        RenderedJoin {
            alias: alias.to_string(),
            depends_on: deps.iter().map(|d| d.to_string()).collect(),
            sql: format!("JOIN {}", alias),
        }
    }

    #[test]
    fn test_chain_materializes_in_dependency_order() {
        let registry = registry();
        let dialect = AnsiDialect::new();
        let mut ctx = CompileContext::new(&dialect, &registry, TableRef::of::<D>());
        ctx.column(D::proxy().c().b().a().data_a().column_ref()).unwrap();

        let joins = materialize(&mut ctx, JoinType::InnerJoin).unwrap();
        let sql: Vec<_> = joins.iter().map(|j| j.sql.as_str()).collect();
        assert_eq!(
            sql,
            vec![
                "INNER JOIN c AS \"d_c\" ON d.fk_d = \"d_c\".pk_c",
                "INNER JOIN b AS \"d_c_b\" ON \"d_c\".fk_c = \"d_c_b\".pk_b",
                "INNER JOIN a AS \"d_c_b_a\" ON \"d_c_b\".fk_b = \"d_c_b_a\".pk_a",
            ]
        );
    }

    #[test]
    fn test_diamond_keeps_distinct_aliases() {
        let registry = SchemaRegistry::new();
        registry.register::<E>().unwrap();
        let dialect = AnsiDialect::new();
        let mut ctx = CompileContext::new(&dialect, &registry, TableRef::of::<E>());
        let e = E::proxy();
        ctx.column(e.left().a().data_a().column_ref()).unwrap();
        ctx.column(e.right().b().a().data_a().column_ref()).unwrap();

        let joins = materialize(&mut ctx, JoinType::InnerJoin).unwrap();
        let aliases: Vec<_> = joins.iter().map(|j| j.alias.as_str()).collect();
        assert_eq!(
            aliases,
            vec!["e_left", "e_left_a", "e_right", "e_right_b", "e_right_b_a"]
        );
    }

    #[test]
    fn test_unregistered_relationship_is_rejected() {
        let registry = SchemaRegistry::new();
        let dialect = AnsiDialect::new();
        let mut ctx = CompileContext::new(&dialect, &registry, TableRef::of::<D>());
        ctx.table_ref(D::proxy().c().path()).unwrap();

        let err = materialize(&mut ctx, JoinType::InnerJoin).unwrap_err();
        assert_eq!(
            err.resolution_kind(),
            Some(ResolutionErrorKind::UnknownRelationship)
        );
    }

    #[test]
    fn test_order_is_stable_and_topological() {
        let joins = vec![
            rendered("x_b", &["x_a"]),
            rendered("x_a", &["d"]),
            rendered("y", &["d"]),
        ];
        let order: Vec<_> = order_joins(joins)
            .unwrap()
            .into_iter()
            .map(|j| j.alias)
            .collect();
        assert_eq!(order, vec!["x_a", "x_b", "y"]);
    }

    #[test]
    fn test_cycle_is_an_error() {
        let joins = vec![rendered("p", &["q"]), rendered("q", &["p"])];
        let err = order_joins(joins).unwrap_err();
        assert_eq!(err.resolution_kind(), Some(ResolutionErrorKind::JoinCycle));
    }
}
