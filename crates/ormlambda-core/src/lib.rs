//! Core types and traits for ormlambda.
//!
//! This crate provides the foundations every other ormlambda crate builds on:
//!
//! - [`Value`] and the host types it carries ([`Date`], [`Timestamp`], [`Point`], ...)
//! - [`Table`], [`ColumnInfo`] and [`ForeignKeyInfo`] schema metadata
//! - [`TablePath`] for explicit foreign-key traversal
//! - [`SchemaRegistry`] owned by an engine
//! - [`Caster`] for value transcoding in both directions
//! - [`Repository`], the contract a database driver wrapper implements

pub mod caster;
pub mod column;
pub mod connection_url;
pub mod error;
pub mod foreign_key;
pub mod identifiers;
pub mod operator;
pub mod path;
pub mod registry;
pub mod repository;
pub mod row;
pub mod spatial;
pub mod table;
pub mod temporal;
pub mod types;
pub mod value;

#[cfg(test)]
mod testing;

pub use caster::{Caster, ReadCast, WriteCast, quote_string};
pub use column::ColumnInfo;
pub use connection_url::ConnectionUrl;
pub use error::{
    ConfigError, DeclarationError, DeclarationErrorKind, Error, ExpressionError,
    ExpressionErrorKind, RepositoryError, ResolutionError, ResolutionErrorKind, Result,
    TypeError, ValueError, ValueErrorKind,
};
pub use foreign_key::{ForeignKey, ForeignKeyInfo};
pub use identifiers::{is_valid_identifier, quote_ident, quote_ident_mysql};
pub use operator::CompareOp;
pub use path::{PATH_DELIMITER, TablePath};
pub use registry::{SchemaRegistry, StatementScope};
pub use repository::{IfExists, Repository};
pub use row::{FromValue, Row, RowColumns};
pub use spatial::Point;
pub use table::{Table, TableId, TableMeta, TableProxy, TableRef};
pub use temporal::{Date, Time, Timestamp};
pub use types::{SqlType, TypeInfo};
pub use value::{Decimal, Value, ValueKind};
