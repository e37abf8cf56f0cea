//! MySQL dialect for ormlambda.
//!
//! This crate holds everything MySQL spells its own way:
//!
//! - Backtick-quoted identifiers and `%s` parameter markers
//! - Backslash string escaping
//! - Spatial points written through `ST_GeomFromText` and read back from WKT
//! - `INSERT ... AS _val ON DUPLICATE KEY UPDATE` upserts
//! - MySQL column types and `AUTO_INCREMENT` in DDL
//!
//! It does not talk to a server; statements are executed by whatever
//! `Repository` the caller plugs into the engine.
//!
//! # Example
//!
//! ```rust,ignore
//! use ormlambda_mysql::MySqlDialect;
//! use ormlambda_query::QueryBuilder;
//!
//! let sql = QueryBuilder::for_table::<Hero>()
//!     .render(&MySqlDialect::new(), &registry)?
//!     .sql;
//! ```

pub mod dialect;
pub mod types;

pub use dialect::{MySqlDialect, UPSERT_ROW_ALIAS};
pub use types::{escape_string, mysql_caster, mysql_type_name};
