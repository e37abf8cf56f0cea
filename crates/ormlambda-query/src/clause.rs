//! SQL clause types (SELECT, WHERE, ORDER BY, LIMIT, etc.)
//!
//! Each clause renders its own body through a [`CompileContext`]; the
//! keyword and the way several clauses of one kind combine belong to the
//! builder.

use ormlambda_core::{Error, ExpressionErrorKind, Result, TablePath, ValueErrorKind};

use crate::context::{CompileContext, OutputColumn, OutputGroup};
use crate::expr::{ColumnRef, Condition};
use crate::join::JoinClause;
use crate::order::OrderItem;
use crate::selection::SelectItem;

/// Clause categories, ordered the way they appear in a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ClauseKind {
    Select,
    Join,
    Where,
    GroupBy,
    Having,
    Order,
    Limit,
    Offset,
}

impl ClauseKind {
    pub const fn keyword(self) -> &'static str {
        match self {
            ClauseKind::Select => "SELECT",
            ClauseKind::Join => "JOIN",
            ClauseKind::Where => "WHERE",
            ClauseKind::GroupBy => "GROUP BY",
            ClauseKind::Having => "HAVING",
            ClauseKind::Order => "ORDER BY",
            ClauseKind::Limit => "LIMIT",
            ClauseKind::Offset => "OFFSET",
        }
    }
}

/// How a WHERE/HAVING clause attaches to the ones before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Connective {
    #[default]
    And,
    Or,
}

impl Connective {
    pub const fn as_str(self) -> &'static str {
        match self {
            Connective::And => "AND",
            Connective::Or => "OR",
        }
    }
}

/// SELECT column list.
#[derive(Debug, Clone, PartialEq)]
pub struct Select {
    items: Vec<SelectItem>,
}

impl Select {
    pub fn new(items: Vec<SelectItem>) -> Self {
        Self { items }
    }

    /// Every declared column of the table at `path`.
    pub fn table(path: TablePath) -> Self {
        Self::new(vec![SelectItem::Table(path)])
    }

    pub fn items(&self) -> &[SelectItem] {
        &self.items
    }

    /// Render the column list, recording output groups in `ctx`.
    pub fn render(&self, ctx: &mut CompileContext<'_>) -> Result<String> {
        if self.items.is_empty() {
            return Err(Error::expression(
                ExpressionErrorKind::InvalidItem,
                "a selection needs at least one item",
            ));
        }
        let mut parts = Vec::new();
        for item in &self.items {
            match item {
                SelectItem::Table(path) => {
                    let mut columns = Vec::new();
                    for info in path.table().meta().columns {
                        let column = ColumnRef::new(path.clone(), info);
                        let (sql, output) = aliased_column(ctx, &column)?;
                        parts.push(sql);
                        columns.push(output);
                    }
                    ctx.push_group(OutputGroup::Table {
                        table: path.table(),
                        path: path.key(),
                        columns,
                    });
                }
                SelectItem::Column(column) => {
                    let (sql, output) = aliased_column(ctx, column)?;
                    parts.push(sql);
                    ctx.push_group(OutputGroup::Column(output));
                }
                SelectItem::Function(function) => {
                    let sql = ctx.function(function)?;
                    let alias = ctx.function_alias(function);
                    parts.push(format!(
                        "{} AS {}",
                        sql,
                        ctx.dialect().quote_identifier(&alias)
                    ));
                    ctx.push_group(OutputGroup::Function { alias });
                }
                SelectItem::Condition(_) => {
                    return Err(Error::expression(
                        ExpressionErrorKind::UnexpectedComparison,
                        "a comparison cannot be selected as a column",
                    ));
                }
            }
        }
        Ok(parts.join(", "))
    }
}

fn aliased_column(ctx: &mut CompileContext<'_>, column: &ColumnRef) -> Result<(String, OutputColumn)> {
    let sql = ctx.column(column)?;
    let sql = ctx.dialect().select_column(sql, &column.info.sql_type);
    let alias = ctx.output_alias(column)?;
    let rendered = format!("{} AS {}", sql, ctx.dialect().quote_identifier(&alias));
    Ok((
        rendered,
        OutputColumn {
            alias,
            info: column.info,
        },
    ))
}

/// One WHERE or HAVING condition.
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub condition: Condition,
    pub connective: Connective,
}

impl Filter {
    pub fn and(condition: impl Into<Condition>) -> Self {
        Self {
            condition: condition.into(),
            connective: Connective::And,
        }
    }

    pub fn or(condition: impl Into<Condition>) -> Self {
        Self {
            condition: condition.into(),
            connective: Connective::Or,
        }
    }

    pub fn render(&self, ctx: &mut CompileContext<'_>) -> Result<String> {
        ctx.condition(&self.condition)
    }
}

/// GROUP BY list.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupBy {
    items: Vec<SelectItem>,
}

impl GroupBy {
    pub fn new(items: Vec<SelectItem>) -> Self {
        Self { items }
    }

    pub fn render(&self, ctx: &mut CompileContext<'_>) -> Result<String> {
        let mut parts = Vec::new();
        for item in &self.items {
            match item {
                SelectItem::Table(path) => {
                    for info in path.table().meta().columns {
                        parts.push(ctx.column(&ColumnRef::new(path.clone(), info))?);
                    }
                }
                SelectItem::Column(column) => parts.push(ctx.column(column)?),
                SelectItem::Function(function) => parts.push(ctx.function(function)?),
                SelectItem::Condition(_) => {
                    return Err(Error::expression(
                        ExpressionErrorKind::UnexpectedComparison,
                        "a comparison cannot be grouped on",
                    ));
                }
            }
        }
        Ok(parts.join(", "))
    }
}

/// ORDER BY list.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    items: Vec<OrderItem>,
}

impl OrderBy {
    pub fn new(items: Vec<OrderItem>) -> Self {
        Self { items }
    }

    pub fn render(&self, ctx: &mut CompileContext<'_>) -> Result<String> {
        let mut parts = Vec::with_capacity(self.items.len());
        for item in &self.items {
            parts.push(format!("{} {}", ctx.operand(&item.target)?, item.order));
        }
        Ok(parts.join(", "))
    }
}

/// LIMIT clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(u64);

impl Limit {
    /// Negative counts are rejected.
    pub fn new(count: i64) -> Result<Self> {
        non_negative(count, "LIMIT").map(Limit)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

/// OFFSET clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Offset(u64);

impl Offset {
    /// Negative counts are rejected.
    pub fn new(count: i64) -> Result<Self> {
        non_negative(count, "OFFSET").map(Offset)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

fn non_negative(count: i64, keyword: &str) -> Result<u64> {
    u64::try_from(count).map_err(|_| {
        Error::value(
            ValueErrorKind::InvalidLimit,
            format!("{} must be a non-negative integer, got {}", keyword, count),
        )
    })
}

/// Any clause a [`QueryBuilder`](crate::QueryBuilder) accumulates.
#[derive(Debug, Clone)]
pub enum Clause {
    Select(Select),
    Join(JoinClause),
    Where(Filter),
    GroupBy(GroupBy),
    Having(Filter),
    Order(OrderBy),
    Limit(Limit),
    Offset(Offset),
}

impl Clause {
    pub const fn kind(&self) -> ClauseKind {
        match self {
            Clause::Select(_) => ClauseKind::Select,
            Clause::Join(_) => ClauseKind::Join,
            Clause::Where(_) => ClauseKind::Where,
            Clause::GroupBy(_) => ClauseKind::GroupBy,
            Clause::Having(_) => ClauseKind::Having,
            Clause::Order(_) => ClauseKind::Order,
            Clause::Limit(_) => ClauseKind::Limit,
            Clause::Offset(_) => ClauseKind::Offset,
        }
    }
}

impl From<Select> for Clause {
    fn from(c: Select) -> Self {
        Clause::Select(c)
    }
}

impl From<JoinClause> for Clause {
    fn from(c: JoinClause) -> Self {
        Clause::Join(c)
    }
}

impl From<GroupBy> for Clause {
    fn from(c: GroupBy) -> Self {
        Clause::GroupBy(c)
    }
}

impl From<OrderBy> for Clause {
    fn from(c: OrderBy) -> Self {
        Clause::Order(c)
    }
}

impl From<Limit> for Clause {
    fn from(c: Limit) -> Self {
        Clause::Limit(c)
    }
}

impl From<Offset> for Clause {
    fn from(c: Offset) -> Self {
        Clause::Offset(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::AnsiDialect;
    use crate::function::count;
    use crate::order::Order;
    use crate::testing::{D, registry};
    use ormlambda_core::{Table, TableRef};

    #[test]
    fn test_clause_kinds_sort_in_statement_order() {
        let mut kinds = vec![
            ClauseKind::Offset,
            ClauseKind::Where,
            ClauseKind::Select,
            ClauseKind::Order,
            ClauseKind::Having,
            ClauseKind::Limit,
            ClauseKind::Join,
            ClauseKind::GroupBy,
        ];
        kinds.sort();
        let keywords: Vec<_> = kinds.into_iter().map(ClauseKind::keyword).collect();
        assert_eq!(
            keywords,
            vec!["SELECT", "JOIN", "WHERE", "GROUP BY", "HAVING", "ORDER BY", "LIMIT", "OFFSET"]
        );
    }

    #[test]
    fn test_select_expands_tables_and_names_functions() {
        let registry = registry();
        let dialect = AnsiDialect::new();
        let mut ctx = CompileContext::new(&dialect, &registry, TableRef::of::<D>());
        let d = D::proxy();
        let select = Select::new(vec![
            SelectItem::Column(d.c().data_c().into_column_ref()),
            SelectItem::Function(count()),
        ]);
        assert_eq!(
            select.render(&mut ctx).unwrap(),
            "\"d_c\".data_c AS \"d_c_data_c\", COUNT(*) AS \"count\""
        );

        let groups = ctx.take_groups();
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].aliases(), vec!["d_c_data_c"]);
    }

    #[test]
    fn test_selecting_a_comparison_fails() {
        let registry = registry();
        let dialect = AnsiDialect::new();
        let mut ctx = CompileContext::new(&dialect, &registry, TableRef::of::<D>());
        let select = Select::new(vec![SelectItem::Condition(D::proxy().pk_d().eq(1i64).into())]);
        assert!(select.render(&mut ctx).is_err());
    }

    #[test]
    fn test_order_renders_directions() {
        let registry = registry();
        let dialect = AnsiDialect::new();
        let mut ctx = CompileContext::new(&dialect, &registry, TableRef::of::<D>());
        let d = D::proxy();
        let order = OrderBy::new(vec![d.pk_d().desc(), count().asc()]);
        assert_eq!(order.render(&mut ctx).unwrap(), "d.pk_d DESC, COUNT(*) ASC");
        assert_eq!(Order::default(), Order::Asc);
    }

    #[test]
    fn test_negative_limit_is_rejected() {
        assert_eq!(Limit::new(10).unwrap().get(), 10);
        let err = Offset::new(-1).unwrap_err();
        assert_eq!(err.value_kind(), Some(ValueErrorKind::InvalidLimit));
    }
}
