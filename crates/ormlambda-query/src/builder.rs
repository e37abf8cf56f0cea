//! Statement assembly.
//!
//! A [`QueryBuilder`] accumulates clauses by category and renders them in
//! the fixed order SELECT, JOIN, WHERE, GROUP BY, HAVING, ORDER BY, LIMIT,
//! OFFSET, whatever order they were added in.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use ormlambda_core::{
    ColumnInfo, Result, SchemaRegistry, StatementScope, Table, TablePath, TableRef, Value,
};

use crate::alias::AliasContext;
use crate::clause::{Clause, ClauseKind, Filter, Select};
use crate::context::{CompileContext, OutputGroup};
use crate::dialect::Dialect;
use crate::join::{JoinClause, JoinType, RenderedJoin};
use crate::resolver;

/// A rendered statement.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledQuery {
    pub sql: String,
    /// Bound parameters, in placeholder order
    pub params: Vec<Value>,
    /// Result-set layout, for statements that return rows
    pub groups: Vec<OutputGroup>,
}

impl CompiledQuery {
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }
}

impl fmt::Display for CompiledQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

/// Ordered-by-category clause accumulator for statements on one table.
#[derive(Debug, Clone)]
pub struct QueryBuilder {
    base: TableRef,
    clauses: BTreeMap<ClauseKind, Vec<Clause>>,
    join_type: JoinType,
    default_join_type: JoinType,
}

impl QueryBuilder {
    pub fn new(base: TableRef) -> Self {
        Self {
            base,
            clauses: BTreeMap::new(),
            join_type: JoinType::default(),
            default_join_type: JoinType::default(),
        }
    }

    pub fn for_table<T: Table>() -> Self {
        Self::new(TableRef::of::<T>())
    }

    pub fn base(&self) -> TableRef {
        self.base
    }

    /// Join type used for joins the resolver derives from column paths.
    ///
    /// This is the default every statement starts from.
    pub fn join_type(mut self, join_type: JoinType) -> Self {
        self.join_type = join_type;
        self.default_join_type = join_type;
        self
    }

    /// Join type for inferred joins of the current statement only;
    /// [`clear`](Self::clear) restores the default.
    pub fn set_join_type(&mut self, join_type: JoinType) {
        self.join_type = join_type;
    }

    pub fn current_join_type(&self) -> JoinType {
        self.join_type
    }

    /// Register a clause under its category.
    pub fn add(&mut self, clause: impl Into<Clause>) -> &mut Self {
        let clause = clause.into();
        self.clauses.entry(clause.kind()).or_default().push(clause);
        self
    }

    /// Add an AND-combined WHERE condition.
    pub fn filter(&mut self, filter: Filter) -> &mut Self {
        self.add(Clause::Where(filter))
    }

    /// Add a HAVING condition.
    pub fn having(&mut self, filter: Filter) -> &mut Self {
        self.add(Clause::Having(filter))
    }

    pub fn clauses(&self, kind: ClauseKind) -> &[Clause] {
        self.clauses.get(&kind).map_or(&[], Vec::as_slice)
    }

    pub fn has(&self, kind: ClauseKind) -> bool {
        !self.clauses(kind).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.values().all(Vec::is_empty)
    }

    /// Drop every accumulated clause and any per-statement join type.
    pub fn clear(&mut self) {
        self.clauses.clear();
        self.join_type = self.default_join_type;
    }

    /// Drop the clauses of one category.
    pub fn remove(&mut self, kind: ClauseKind) {
        self.clauses.remove(&kind);
    }

    fn explicit_joins(&self) -> impl Iterator<Item = &JoinClause> {
        self.clauses(ClauseKind::Join).iter().filter_map(|c| match c {
            Clause::Join(join) => Some(join),
            _ => None,
        })
    }

    fn filters(&self, kind: ClauseKind) -> impl Iterator<Item = &Filter> {
        self.clauses(kind).iter().filter_map(|c| match c {
            Clause::Where(f) | Clause::Having(f) => Some(f),
            _ => None,
        })
    }

    /// Bind every explicitly joined table's alias.
    fn bind_join_aliases(&self, ctx: &mut CompileContext<'_>) -> Result<()> {
        let mut explicit = AliasContext::new();
        for join in self.explicit_joins() {
            let alias = join
                .alias
                .clone()
                .unwrap_or_else(|| ctx.table_name(join.table));
            explicit.bind(join.root().key(), alias)?;
        }
        ctx.merge_aliases(&explicit)
    }

    /// `WHERE a AND (b) OR (c)`: the first condition bare, later ones
    /// parenthesized behind their connective.
    fn render_filters(&self, ctx: &mut CompileContext<'_>, kind: ClauseKind) -> Result<Option<String>> {
        let mut sql = String::new();
        for (i, filter) in self.filters(kind).enumerate() {
            let body = filter.render(ctx)?;
            if i == 0 {
                sql.push_str(&body);
            } else {
                sql.push_str(&format!(" {} ({})", filter.connective.as_str(), body));
            }
        }
        Ok((!sql.is_empty()).then(|| format!("{} {}", kind.keyword(), sql)))
    }

    /// Comma-merge every clause of a list category.
    fn render_lists(&self, ctx: &mut CompileContext<'_>, kind: ClauseKind) -> Result<Option<String>> {
        let mut parts = Vec::new();
        for clause in self.clauses(kind) {
            match clause {
                Clause::GroupBy(g) => parts.push(g.render(ctx)?),
                Clause::Order(o) => parts.push(o.render(ctx)?),
                _ => {}
            }
        }
        Ok((!parts.is_empty()).then(|| format!("{} {}", kind.keyword(), parts.join(", "))))
    }

    /// The last LIMIT/OFFSET wins.
    fn render_count(&self, kind: ClauseKind) -> Option<String> {
        self.clauses(kind).last().and_then(|clause| match clause {
            Clause::Limit(l) => Some(format!("LIMIT {}", l.get())),
            Clause::Offset(o) => Some(format!("OFFSET {}", o.get())),
            _ => None,
        })
    }

    /// Joins for the statement: explicit ones plus those implied by every
    /// path walked so far, in dependency order. A join whose text was
    /// already rendered is emitted once.
    fn render_joins(&self, ctx: &mut CompileContext<'_>, explicit: Vec<RenderedJoin>) -> Result<Vec<String>> {
        let mut joins = explicit;
        joins.extend(resolver::materialize(ctx, self.join_type)?);
        let mut seen = HashSet::new();
        joins.retain(|join| seen.insert(join.sql.clone()));
        Ok(resolver::order_joins(joins)?
            .into_iter()
            .map(|join| join.sql)
            .collect())
    }

    /// Render the SELECT statement without clearing any state.
    ///
    /// An empty builder renders as an empty statement. Without a SELECT
    /// clause every column of the base table is selected.
    pub fn render(&self, dialect: &dyn Dialect, registry: &SchemaRegistry) -> Result<CompiledQuery> {
        if self.is_empty() {
            return Ok(CompiledQuery::default());
        }
        let scope = registry.enter_statement();
        let mut ctx = CompileContext::new(dialect, registry, self.base);
        self.bind_join_aliases(&mut ctx)?;

        let select = match self.clauses(ClauseKind::Select).last() {
            Some(Clause::Select(select)) => select.clone(),
            _ => Select::table(TablePath::root(self.base)),
        };
        let columns = select.render(&mut ctx)?;
        let select_sql = format!(
            "SELECT {} FROM {}",
            columns,
            ctx.table_name(self.base)
        );

        let mut explicit = Vec::new();
        for join in self.explicit_joins() {
            explicit.push(resolver::explicit_join(&mut ctx, join)?);
        }
        let where_sql = self.render_filters(&mut ctx, ClauseKind::Where)?;
        let group_sql = self.render_lists(&mut ctx, ClauseKind::GroupBy)?;
        let having_sql = self.render_filters(&mut ctx, ClauseKind::Having)?;
        let order_sql = self.render_lists(&mut ctx, ClauseKind::Order)?;
        let joins = self.render_joins(&mut ctx, explicit)?;

        let mut parts = vec![select_sql];
        parts.extend(joins);
        parts.extend(where_sql);
        parts.extend(group_sql);
        parts.extend(having_sql);
        parts.extend(order_sql);
        parts.extend(self.render_count(ClauseKind::Limit));
        parts.extend(self.render_count(ClauseKind::Offset));

        let compiled = CompiledQuery {
            sql: parts.join(" "),
            params: Vec::new(),
            groups: ctx.take_groups(),
        };
        finish(scope, &ctx, &compiled);
        Ok(compiled)
    }

    /// Render the SELECT statement, then clear the builder.
    ///
    /// State is cleared whether or not rendering succeeded.
    pub fn build(&mut self, dialect: &dyn Dialect, registry: &SchemaRegistry) -> Result<CompiledQuery> {
        let compiled = self.render(dialect, registry);
        self.clear();
        compiled
    }

    /// Render an UPDATE of the base table that assigns `assignments`, using
    /// the accumulated joins and WHERE conditions. Nothing is cleared.
    pub fn render_update(
        &self,
        dialect: &dyn Dialect,
        registry: &SchemaRegistry,
        assignments: &[(&'static ColumnInfo, Value)],
    ) -> Result<CompiledQuery> {
        let scope = registry.enter_statement();
        let mut ctx = CompileContext::new(dialect, registry, self.base);
        self.bind_join_aliases(&mut ctx)?;

        let table = ctx.table_name(self.base);
        let caster = dialect.caster();
        let mut sets = Vec::with_capacity(assignments.len());
        let mut params = Vec::with_capacity(assignments.len());
        for (info, value) in assignments {
            let placeholder = caster.placeholder(value, dialect.placeholder())?;
            sets.push(format!("{}.{} = {}", table, info.name, placeholder));
            params.push(caster.parameter(value)?);
        }

        let mut explicit = Vec::new();
        for join in self.explicit_joins() {
            explicit.push(resolver::explicit_join(&mut ctx, join)?);
        }
        let where_sql = self.render_filters(&mut ctx, ClauseKind::Where)?;
        let joins = self.render_joins(&mut ctx, explicit)?;

        let mut parts = vec![format!("UPDATE {}", table)];
        parts.extend(joins);
        parts.push(format!("SET {}", sets.join(", ")));
        parts.extend(where_sql);

        let compiled = CompiledQuery {
            sql: parts.join(" "),
            params,
            groups: Vec::new(),
        };
        finish(scope, &ctx, &compiled);
        Ok(compiled)
    }
}

fn finish(scope: StatementScope<'_>, ctx: &CompileContext<'_>, compiled: &CompiledQuery) {
    for path in ctx.walked_paths() {
        for prefix in path.prefixes() {
            scope.record_path(prefix.key());
        }
    }
    scope.commit();
    tracing::debug!(
        sql = %compiled.sql,
        params = compiled.params.len(),
        "compiled statement"
    );
}
