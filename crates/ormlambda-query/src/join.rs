//! JOIN clause types.

use ormlambda_core::{TablePath, TableRef};

use crate::expr::Condition;

/// Types of SQL joins.
///
/// The seven variants are the vocabulary callers use; only three SQL
/// keywords come out of them (see [`JoinType::keyword`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum JoinType {
    RightInclusive,
    LeftInclusive,
    RightExclusive,
    LeftExclusive,
    FullOuterInclusive,
    FullOuterExclusive,
    #[default]
    InnerJoin,
}

impl JoinType {
    pub const ALL: [JoinType; 7] = [
        JoinType::RightInclusive,
        JoinType::LeftInclusive,
        JoinType::RightExclusive,
        JoinType::LeftExclusive,
        JoinType::FullOuterInclusive,
        JoinType::FullOuterExclusive,
        JoinType::InnerJoin,
    ];

    /// Get the SQL keyword for this join type.
    ///
    /// Both FULL OUTER variants render as `RIGHT JOIN`, like the two RIGHT
    /// variants. There is no real FULL OUTER JOIN support.
    pub const fn keyword(&self) -> &'static str {
        match self {
            JoinType::InnerJoin => "INNER JOIN",
            JoinType::LeftInclusive | JoinType::LeftExclusive => "LEFT JOIN",
            JoinType::RightInclusive
            | JoinType::RightExclusive
            | JoinType::FullOuterInclusive
            | JoinType::FullOuterExclusive => "RIGHT JOIN",
        }
    }
}

/// An explicit JOIN of another table, with a caller-written ON condition.
#[derive(Debug, Clone)]
pub struct JoinClause {
    /// Joined table
    pub table: TableRef,
    /// Alias of the joined table; its declared name when `None`
    pub alias: Option<String>,
    /// Type of join
    pub join_type: JoinType,
    /// ON condition
    pub on: Condition,
}

impl JoinClause {
    pub fn new(table: TableRef, join_type: JoinType, on: Condition) -> Self {
        Self {
            table,
            alias: None,
            join_type,
            on,
        }
    }

    /// Set an alias for the joined table.
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Path rooted at the joined table; columns reached through it resolve
    /// against this join's alias.
    pub fn root(&self) -> TablePath {
        TablePath::root(self.table)
    }
}

/// A join ready to be placed in the statement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedJoin {
    /// Alias the join defines
    pub alias: String,
    /// Aliases that must be defined before this join
    pub depends_on: Vec<String>,
    pub sql: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_type_collapse() {
        let keywords: Vec<_> = JoinType::ALL.iter().map(JoinType::keyword).collect();
        assert_eq!(
            keywords,
            vec![
                "RIGHT JOIN",
                "LEFT JOIN",
                "RIGHT JOIN",
                "LEFT JOIN",
                "RIGHT JOIN",
                "RIGHT JOIN",
                "INNER JOIN"
            ]
        );
        assert_eq!(JoinType::default(), JoinType::InnerJoin);
    }
}
