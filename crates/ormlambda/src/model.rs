//! Per-table query and write handle.
//!
//! A [`Model`] accumulates clauses through closures over the table's proxy,
//! then one terminal call (`select`, `count`, `update`, `delete`, ...) builds
//! the statement, hands it to the repository and clears the accumulated
//! state, whether or not the call succeeded.
//!
//! ```rust,ignore
//! let rows = engine
//!     .model::<D>()?
//!     .where_(|d| d.c().b().data_b().eq("x"))
//!     .order(|d| d.pk_d(), Order::Desc)?
//!     .limit(10)?
//!     .select()?;
//! ```

use std::marker::PhantomData;
use std::ptr;

use ormlambda_core::{
    ColumnInfo, Error, IfExists, Result, Row, Table, TablePath, TableRef, Value, ValueError,
    ValueErrorKind,
};
use ormlambda_query::{
    CompiledQuery, Condition, Directions, Filter, GroupBy, InsertBuilder, IntoOrderItems,
    IntoSelection, JoinClause, JoinType, Limit, Offset, Order, OrderBy, Select, SelectItem,
    count as count_all, create_table_sql, delete_by_primary_key,
};
use tracing::{debug, warn};

use crate::engine::Engine;
use crate::marshal::{Flavour, FromGroups, cast_row};

/// Target of one UPDATE assignment: a column name or a typed column.
#[derive(Debug, Clone)]
pub enum UpdateKey {
    Name(String),
    Column(&'static ColumnInfo),
}

impl From<&str> for UpdateKey {
    fn from(name: &str) -> Self {
        UpdateKey::Name(name.to_string())
    }
}

impl From<String> for UpdateKey {
    fn from(name: String) -> Self {
        UpdateKey::Name(name)
    }
}

impl<V> From<ormlambda_query::Column<V>> for UpdateKey {
    fn from(column: ormlambda_query::Column<V>) -> Self {
        UpdateKey::Column(column.info())
    }
}

fn unknown_column<T: Table>(column: &str, message: String) -> Error {
    Error::Value(
        ValueError {
            kind: ValueErrorKind::UnknownColumn,
            table: None,
            column: None,
            message,
        }
        .with_table(T::TABLE_NAME)
        .with_column(column),
    )
}

impl UpdateKey {
    /// The column of `T` this key names.
    fn resolve<T: Table>(self) -> Result<&'static ColumnInfo> {
        match self {
            UpdateKey::Name(name) => T::meta().column(&name).ok_or_else(|| {
                unknown_column::<T>(&name, format!("'{}' has no column '{}'", T::TABLE_NAME, name))
            }),
            UpdateKey::Column(info) => {
                if T::columns().iter().any(|c| ptr::eq(c, info)) {
                    Ok(info)
                } else {
                    Err(unknown_column::<T>(
                        info.name,
                        format!(
                            "column {}.{} does not belong to '{}'",
                            info.table, info.name, T::TABLE_NAME
                        ),
                    ))
                }
            }
        }
    }
}

/// Query and write operations on table `T`.
pub struct Model<'e, T: Table> {
    engine: &'e Engine,
    builder: ormlambda_query::QueryBuilder,
    _table: PhantomData<fn() -> T>,
}

impl<T: Table> std::fmt::Debug for Model<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("table", &T::TABLE_NAME)
            .field("builder", &self.builder)
            .finish_non_exhaustive()
    }
}

impl<'e, T: Table> Model<'e, T> {
    pub(crate) fn new(engine: &'e Engine) -> Self {
        Self {
            engine,
            builder: ormlambda_query::QueryBuilder::for_table::<T>()
                .join_type(engine.config().join_type),
            _table: PhantomData,
        }
    }

    /// Physical name of `T`, after any rename by `create_table`.
    pub fn table_name(&self) -> String {
        self.engine.registry().table_name(TableRef::of::<T>())
    }

    /// The accumulated clauses.
    pub fn query(&self) -> &ormlambda_query::QueryBuilder {
        &self.builder
    }

    // ==================== Accumulating ====================

    /// Add a WHERE condition, AND-ed with earlier ones.
    #[doc(alias = "where")]
    pub fn where_<C: Into<Condition>>(&mut self, f: impl FnOnce(T::Proxy) -> C) -> &mut Self {
        self.builder.filter(Filter::and(f(T::proxy())));
        self
    }

    /// Add a WHERE condition, OR-ed with earlier ones.
    pub fn or_where<C: Into<Condition>>(&mut self, f: impl FnOnce(T::Proxy) -> C) -> &mut Self {
        self.builder.filter(Filter::or(f(T::proxy())));
        self
    }

    pub fn having<C: Into<Condition>>(&mut self, f: impl FnOnce(T::Proxy) -> C) -> &mut Self {
        self.builder.having(Filter::and(f(T::proxy())));
        self
    }

    /// Join type for the joins inferred from relationship paths in this
    /// statement. The engine's default is restored once it is built.
    pub fn by(&mut self, join_type: JoinType) -> &mut Self {
        self.builder.set_join_type(join_type);
        self
    }

    /// Join `R` explicitly on the condition `f` builds from both proxies.
    pub fn join<R: Table, C: Into<Condition>>(
        &mut self,
        join_type: JoinType,
        f: impl FnOnce(T::Proxy, R::Proxy) -> C,
    ) -> Result<&mut Self> {
        self.engine.register::<R>()?;
        let on = f(T::proxy(), R::proxy()).into();
        self.builder.add(JoinClause::new(TableRef::of::<R>(), join_type, on));
        Ok(self)
    }

    /// Like [`join`](Self::join), naming the joined table `alias`.
    pub fn join_as<R: Table, C: Into<Condition>>(
        &mut self,
        join_type: JoinType,
        alias: &str,
        f: impl FnOnce(T::Proxy, R::Proxy) -> C,
    ) -> Result<&mut Self> {
        self.engine.register::<R>()?;
        let on = f(T::proxy(), R::proxy()).into();
        self.builder
            .add(JoinClause::new(TableRef::of::<R>(), join_type, on).alias(alias));
        Ok(self)
    }

    /// Order by the columns or functions `f` selects.
    ///
    /// One direction applies to every item; a list gives one per item and
    /// must match the item count.
    pub fn order<I: IntoOrderItems>(
        &mut self,
        f: impl FnOnce(T::Proxy) -> I,
        directions: impl Into<Directions>,
    ) -> Result<&mut Self> {
        let items = directions
            .into()
            .apply(f(T::proxy()).into_order_items(Order::Asc))?;
        self.builder.add(OrderBy::new(items));
        Ok(self)
    }

    pub fn group_by<S: IntoSelection>(&mut self, f: impl FnOnce(T::Proxy) -> S) -> &mut Self {
        self.builder.add(GroupBy::new(f(T::proxy()).into_selection()));
        self
    }

    /// Set LIMIT; a later call replaces an earlier one.
    pub fn limit(&mut self, count: i64) -> Result<&mut Self> {
        self.builder.add(Limit::new(count)?);
        Ok(self)
    }

    /// Set OFFSET; a later call replaces an earlier one.
    pub fn offset(&mut self, count: i64) -> Result<&mut Self> {
        self.builder.add(Offset::new(count)?);
        Ok(self)
    }

    /// Compile the accumulated SELECT without running it, then clear.
    pub fn build(&mut self) -> Result<CompiledQuery> {
        self.builder.build(self.engine.dialect(), self.engine.registry())
    }

    // ==================== Reading ====================

    fn fetch(&mut self, items: Vec<SelectItem>) -> Result<(CompiledQuery, Vec<Row>)> {
        self.builder.add(Select::new(items));
        let compiled = self.build()?;
        debug!(sql = %compiled.sql, "running select");
        let rows = self.engine.repository().read_sql(&compiled.sql)?;
        debug!(rows = rows.len(), "select returned");
        Ok((compiled, rows))
    }

    /// Every accumulated row of `T`.
    #[tracing::instrument(level = "debug", skip_all, fields(table = T::TABLE_NAME))]
    pub fn select(&mut self) -> Result<Vec<T>> {
        self.select_as(|_| TablePath::root(TableRef::of::<T>()))
    }

    /// Read the tables `f` selects, one `Vec` per table.
    #[tracing::instrument(level = "debug", skip_all, fields(table = T::TABLE_NAME))]
    pub fn select_as<S: FromGroups, I: IntoSelection>(
        &mut self,
        f: impl FnOnce(T::Proxy) -> I,
    ) -> Result<S> {
        let items = f(T::proxy()).into_selection();
        let (compiled, rows) = self.fetch(items)?;
        S::from_groups(&rows, &compiled.groups, self.engine.dialect().caster())
    }

    /// The first row of `T`, if any. Forces `LIMIT 1`.
    pub fn select_one(&mut self) -> Result<Option<T>> {
        self.select_one_as::<Vec<T>, _>(|_| TablePath::root(TableRef::of::<T>()))
    }

    /// The first row of the tables `f` selects. Forces `LIMIT 1`.
    #[tracing::instrument(level = "debug", skip_all, fields(table = T::TABLE_NAME))]
    pub fn select_one_as<S: FromGroups, I: IntoSelection>(
        &mut self,
        f: impl FnOnce(T::Proxy) -> I,
    ) -> Result<Option<S::First>> {
        self.builder.add(Limit::new(1)?);
        let items = f(T::proxy()).into_selection();
        let (compiled, rows) = self.fetch(items)?;
        rows.first()
            .map(|row| S::first(row, &compiled.groups, self.engine.dialect().caster()))
            .transpose()
    }

    /// Read any selection (columns, functions, tables) row by row as `F`.
    #[tracing::instrument(level = "debug", skip_all, fields(table = T::TABLE_NAME))]
    pub fn select_flavour<F: Flavour, I: IntoSelection>(
        &mut self,
        f: impl FnOnce(T::Proxy) -> I,
    ) -> Result<Vec<F>> {
        let items = f(T::proxy()).into_selection();
        let (compiled, rows) = self.fetch(items)?;
        let caster = self.engine.dialect().caster();
        rows.iter()
            .map(|row| F::from_row(&cast_row(row, &compiled.groups, caster)?))
            .collect()
    }

    /// `COUNT(*)` over the accumulated query.
    #[tracing::instrument(level = "debug", skip_all, fields(table = T::TABLE_NAME))]
    pub fn count(&mut self) -> Result<i64> {
        let (_, rows) = self.fetch(vec![SelectItem::Function(count_all())])?;
        match rows.first() {
            Some(row) => row.get_as::<i64>(0),
            None => Ok(0),
        }
    }

    // ==================== Writing ====================

    fn write_batch(&self, insert: &InsertBuilder<'_, T>) -> Result<()> {
        let Some(statement) = insert.build(self.engine.dialect(), self.engine.registry())? else {
            debug!(table = T::TABLE_NAME, "nothing to insert");
            return Ok(());
        };
        debug!(sql = %statement.sql, rows = statement.rows.len(), "inserting");
        self.engine
            .repository()
            .executemany_with_values(&statement.sql, &statement.rows)
    }

    /// INSERT every instance in one batch. An empty slice is a no-op.
    #[tracing::instrument(level = "debug", skip_all, fields(table = T::TABLE_NAME, rows = rows.len()))]
    pub fn insert(&mut self, rows: &[T]) -> Result<()> {
        self.write_batch(&InsertBuilder::new(rows))
    }

    pub fn insert_one(&mut self, row: &T) -> Result<()> {
        self.insert(std::slice::from_ref(row))
    }

    /// INSERT, updating the existing row on a duplicate key.
    #[tracing::instrument(level = "debug", skip_all, fields(table = T::TABLE_NAME, rows = rows.len()))]
    pub fn upsert(&mut self, rows: &[T]) -> Result<()> {
        self.write_batch(&InsertBuilder::new(rows).upsert())
    }

    /// UPDATE the rows the accumulated WHERE selects.
    ///
    /// Keys are column names or typed columns of `T`. Auto-generated columns
    /// are skipped with a warning.
    #[tracing::instrument(level = "debug", skip_all, fields(table = T::TABLE_NAME))]
    pub fn update<K, V>(&mut self, values: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: Into<UpdateKey>,
        V: Into<Value>,
    {
        let result = self.run_update(values);
        self.builder.clear();
        result
    }

    fn run_update<K, V>(&mut self, values: impl IntoIterator<Item = (K, V)>) -> Result<()>
    where
        K: Into<UpdateKey>,
        V: Into<Value>,
    {
        let mut assignments = Vec::new();
        for (key, value) in values {
            let info = key.into().resolve::<T>()?;
            if info.auto_generated {
                warn!(
                    table = T::TABLE_NAME,
                    column = info.name,
                    "skipping auto-generated column in update"
                );
                continue;
            }
            assignments.push((info, value.into()));
        }
        if assignments.is_empty() {
            debug!(table = T::TABLE_NAME, "nothing to update");
            return Ok(());
        }
        let compiled =
            self.builder
                .render_update(self.engine.dialect(), self.engine.registry(), &assignments)?;
        debug!(sql = %compiled.sql, "updating");
        self.engine
            .repository()
            .execute_with_values(&compiled.sql, &compiled.params)
    }

    /// DELETE the rows the accumulated query selects, by primary key.
    #[tracing::instrument(level = "debug", skip_all, fields(table = T::TABLE_NAME))]
    pub fn delete(&mut self) -> Result<()> {
        let rows = self.select()?;
        if rows.is_empty() {
            return Ok(());
        }
        self.delete_instances(&rows)
    }

    /// DELETE the given instances by primary key.
    ///
    /// Fails with `MissingPrimaryKey` if any instance has no key value.
    #[tracing::instrument(level = "debug", skip_all, fields(table = T::TABLE_NAME, rows = instances.len()))]
    pub fn delete_instances(&mut self, instances: &[T]) -> Result<()> {
        let keys: Vec<Value> = instances
            .iter()
            .map(|instance| instance.primary_key_value().unwrap_or(Value::Null))
            .collect();
        let compiled = delete_by_primary_key(
            TableRef::of::<T>(),
            &keys,
            self.engine.dialect(),
            self.engine.registry(),
        )?;
        debug!(sql = %compiled.sql, "deleting");
        self.engine
            .repository()
            .execute_with_values(&compiled.sql, &compiled.params)
    }

    // ==================== Table management ====================

    pub fn table_exists(&self) -> Result<bool> {
        self.engine.repository().table_exists(&self.table_name())
    }

    /// CREATE TABLE for `T` and return the physical name used.
    ///
    /// - `Fail`: create under the current name; the repository reports a
    ///   clash.
    /// - `Replace`: drop an existing table first.
    /// - `Append`: create under the first free `name`, `name_1`, `name_2`,
    ///   ... and route later statements for `T` to it.
    #[tracing::instrument(level = "debug", skip(self), fields(table = T::TABLE_NAME))]
    pub fn create_table(&mut self, if_exists: IfExists) -> Result<String> {
        let table = TableRef::of::<T>();
        let repository = self.engine.repository();
        let name = match if_exists {
            IfExists::Fail => self.table_name(),
            IfExists::Replace => {
                let name = self.table_name();
                if repository.table_exists(&name)? {
                    debug!(table = %name, "dropping existing table");
                    repository.drop_table(&name)?;
                }
                name
            }
            IfExists::Append => {
                let name = self.free_table_name()?;
                if name != self.table_name() {
                    self.engine.registry().rename(table, name.clone());
                }
                name
            }
        };
        let sql = create_table_sql(table, &name, self.engine.dialect(), self.engine.registry());
        debug!(sql = %sql, "creating table");
        repository.execute(&sql)?;
        Ok(name)
    }

    fn free_table_name(&self) -> Result<String> {
        let repository = self.engine.repository();
        let base = T::TABLE_NAME;
        if !repository.table_exists(base)? {
            return Ok(base.to_string());
        }
        let limit = self.engine.config().append_suffix_limit;
        for suffix in 1..=limit {
            let candidate = format!("{}_{}", base, suffix);
            if !repository.table_exists(&candidate)? {
                return Ok(candidate);
            }
        }
        Err(Error::Value(
            ValueError {
                kind: ValueErrorKind::TableExists,
                table: None,
                column: None,
                message: format!("no free name for '{}' within {} suffixes", base, limit),
            }
            .with_table(base),
        ))
    }
}
