//! Compilation context for one statement.
//!
//! Everything a clause needs while rendering goes through a
//! [`CompileContext`]: the dialect, the schema registry, the alias memo and
//! the set of relationship paths the statement walked. Two statements never
//! share a context, so rendering one cannot disturb the aliases of another.

use std::collections::HashMap;

use indexmap::IndexSet;
use ormlambda_core::{
    ColumnInfo, CompareOp, Error, ExpressionErrorKind, Result, SchemaRegistry, TablePath,
    TableRef, Value,
};

use crate::alias::AliasContext;
use crate::dialect::Dialect;
use crate::expr::{ColumnRef, Comparer, Condition, Operand};
use crate::function::{FnArg, Function};

/// One column of the result set.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputColumn {
    /// Name the column is returned under
    pub alias: String,
    pub info: &'static ColumnInfo,
}

/// Result-set columns grouped the way they were selected.
#[derive(Debug, Clone, PartialEq)]
pub enum OutputGroup {
    /// Every column of one table reached through `path`
    Table {
        table: TableRef,
        path: String,
        columns: Vec<OutputColumn>,
    },
    /// A single selected column
    Column(OutputColumn),
    /// A function result
    Function { alias: String },
}

impl OutputGroup {
    /// Output aliases in this group, in result-set order.
    pub fn aliases(&self) -> Vec<&str> {
        match self {
            OutputGroup::Table { columns, .. } => columns.iter().map(|c| c.alias.as_str()).collect(),
            OutputGroup::Column(column) => vec![column.alias.as_str()],
            OutputGroup::Function { alias } => vec![alias.as_str()],
        }
    }
}

/// Per-statement rendering state.
pub struct CompileContext<'a> {
    dialect: &'a dyn Dialect,
    registry: &'a SchemaRegistry,
    base: TableRef,
    aliases: AliasContext,
    /// Non-root paths referenced so far, in first-use order
    walked: IndexSet<TablePath>,
    function_aliases: HashMap<String, usize>,
    groups: Vec<OutputGroup>,
}

impl<'a> CompileContext<'a> {
    /// Context for a statement on `base`.
    ///
    /// The base table's path is bound to its physical name, so a table
    /// renamed in the registry renders under its new name.
    pub fn new(dialect: &'a dyn Dialect, registry: &'a SchemaRegistry, base: TableRef) -> Self {
        let mut aliases = AliasContext::new();
        let physical = registry.table_name(base);
        // a fresh context cannot collide
        let _ = aliases.bind(TablePath::root(base).key(), physical);
        Self {
            dialect,
            registry,
            base,
            aliases,
            walked: IndexSet::new(),
            function_aliases: HashMap::new(),
            groups: Vec::new(),
        }
    }

    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    pub fn registry(&self) -> &'a SchemaRegistry {
        self.registry
    }

    pub fn base(&self) -> TableRef {
        self.base
    }

    pub fn aliases(&self) -> &AliasContext {
        &self.aliases
    }

    /// Fold explicit aliases into the statement's alias memo.
    pub fn merge_aliases(&mut self, other: &AliasContext) -> Result<()> {
        self.aliases.merge(other)
    }

    /// Non-root paths referenced so far.
    pub fn walked_paths(&self) -> impl Iterator<Item = &TablePath> {
        self.walked.iter()
    }

    /// Physical name of `table`.
    pub fn table_name(&self, table: TableRef) -> String {
        self.registry.table_name(table)
    }

    /// Alias of `path`, recording it as walked.
    pub fn alias_of(&mut self, path: &TablePath) -> Result<String> {
        let alias = self.aliases.alias_for(path)?;
        if !path.is_root() && !self.walked.contains(path) {
            self.walked.insert(path.clone());
        }
        Ok(alias)
    }

    /// How `alias` is written in SQL: a physical table name stays bare,
    /// anything else is quoted.
    pub fn alias_sql(&self, path: &TablePath, alias: &str) -> String {
        if path.is_root() && alias == self.registry.table_name(path.table()) {
            alias.to_string()
        } else {
            self.dialect.quote_identifier(alias)
        }
    }

    /// Table reference for columns reached through `path`.
    pub fn table_ref(&mut self, path: &TablePath) -> Result<String> {
        let alias = self.alias_of(path)?;
        Ok(self.alias_sql(path, &alias))
    }

    /// `table.column` for a column.
    pub fn column(&mut self, column: &ColumnRef) -> Result<String> {
        Ok(format!("{}.{}", self.table_ref(&column.path)?, column.name()))
    }

    /// Name a column is returned under: `{table alias}_{column}`.
    pub fn output_alias(&mut self, column: &ColumnRef) -> Result<String> {
        Ok(format!("{}_{}", self.alias_of(&column.path)?, column.name()))
    }

    /// Inline literal through the dialect's caster.
    pub fn literal(&self, value: &Value) -> Result<String> {
        self.dialect.caster().literal(value)
    }

    pub fn operand(&mut self, operand: &Operand) -> Result<String> {
        match operand {
            Operand::Column(column) => self.column(column),
            Operand::Value(value) => self.literal(value),
            Operand::Function(function) => self.function(function),
        }
    }

    /// `KIND(args)` without an alias.
    pub fn function(&mut self, function: &Function) -> Result<String> {
        let mut args = Vec::with_capacity(function.args.len());
        for arg in &function.args {
            args.push(match arg {
                FnArg::Star => "*".to_string(),
                FnArg::Column(column) => self.column(column)?,
                FnArg::Value(value) => self.literal(value)?,
            });
        }
        Ok(format!("{}({})", function.kind, args.join(", ")))
    }

    /// Output alias of a function: its own alias, or the function's default
    /// name with a numeric suffix when the name is already taken.
    pub fn function_alias(&mut self, function: &Function) -> String {
        let base = function
            .alias
            .clone()
            .unwrap_or_else(|| function.kind.default_alias().to_string());
        let seen = self.function_aliases.entry(base.clone()).or_insert(0);
        *seen += 1;
        if *seen == 1 {
            base
        } else {
            format!("{}_{}", base, *seen - 1)
        }
    }

    pub fn comparer(&mut self, comparer: &Comparer) -> Result<String> {
        let left = self.operand(comparer.left())?;
        match comparer.op() {
            CompareOp::Regexp => {
                let pattern = self.operand(comparer.right())?;
                let flags = comparer
                    .flags()
                    .map(|f| self.literal(&Value::Text(f.to_string())))
                    .transpose()?;
                Ok(self.dialect.regex_sql(&left, &pattern, flags.as_deref()))
            }
            CompareOp::In | CompareOp::NotIn => {
                let list = match comparer.right() {
                    Operand::Value(Value::Array(_)) => self.operand(comparer.right())?,
                    other => format!("({})", self.operand(other)?),
                };
                Ok(format!("{} {} {}", left, comparer.op(), list))
            }
            op => {
                let right = self.operand(comparer.right())?;
                Ok(format!("{} {} {}", left, op, right))
            }
        }
    }

    /// Render a condition tree. Children of AND/OR nodes are always
    /// parenthesized.
    pub fn condition(&mut self, condition: &Condition) -> Result<String> {
        match condition {
            Condition::Compare(comparer) => self.comparer(comparer),
            Condition::And(items) => self.combined(items, " AND "),
            Condition::Or(items) => self.combined(items, " OR "),
        }
    }

    fn combined(&mut self, items: &[Condition], connective: &str) -> Result<String> {
        if items.is_empty() {
            return Err(Error::expression(
                ExpressionErrorKind::InvalidItem,
                "an AND/OR condition needs at least one member",
            ));
        }
        let mut parts = Vec::with_capacity(items.len());
        for item in items {
            parts.push(format!("({})", self.condition(item)?));
        }
        Ok(parts.join(connective))
    }

    pub(crate) fn push_group(&mut self, group: OutputGroup) {
        self.groups.push(group);
    }

    pub(crate) fn take_groups(&mut self) -> Vec<OutputGroup> {
        std::mem::take(&mut self.groups)
    }
}
