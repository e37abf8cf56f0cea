//! Typed query compiler for ormlambda.
//!
//! `ormlambda-query` is the **query construction layer**. It turns conditions
//! and selections built from typed table proxies into dialect-specific SQL.
//!
//! # Role In The Architecture
//!
//! - **Expression tree**: [`Column`] handles produce [`Comparer`]s that
//!   combine into [`Condition`]s with `&` and `|`.
//! - **Join resolution**: every column remembers the relationship path it was
//!   reached through; the [`resolver`] turns those paths into JOINs with
//!   deterministic aliases.
//! - **Clauses and builder**: [`QueryBuilder`] renders accumulated clauses in
//!   fixed statement order.
//! - **Dialect seam**: [`Dialect`] carries quoting, placeholders, casting,
//!   upsert and DDL rules; `ormlambda-mysql` provides the MySQL family.
//!
//! Most users reach this through the `ormlambda` facade crate.

pub mod alias;
pub mod builder;
pub mod clause;
pub mod context;
pub mod dialect;
pub mod expr;
pub mod function;
pub mod inspect;
pub mod join;
pub mod order;
pub mod resolver;
pub mod selection;
pub mod statements;

#[cfg(test)]
mod testing;

pub use alias::AliasContext;
pub use builder::{CompiledQuery, QueryBuilder};
pub use clause::{Clause, ClauseKind, Connective, Filter, GroupBy, Limit, Offset, OrderBy, Select};
pub use context::{CompileContext, OutputColumn, OutputGroup};
pub use dialect::{AnsiDialect, Dialect};
pub use expr::{Column, ColumnRef, Comparer, Condition, IntoOperand, Operand};
pub use function::{
    FnArg, Function, FunctionKind, abs, avg, ceil, concat, count, count_of, floor, max, min,
    modulo, pow, rand, round, sqrt, sum, truncate,
};
pub use inspect::{ComparisonChain, NestedElement, decompose};
pub use join::{JoinClause, JoinType, RenderedJoin};
pub use order::{Directions, IntoOrderItems, Order, OrderItem};
pub use selection::{IntoSelectItem, IntoSelection, SelectItem};
pub use statements::{BatchStatement, InsertBuilder, create_table_sql, delete_by_primary_key};
