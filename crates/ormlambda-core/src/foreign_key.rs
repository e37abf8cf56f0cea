//! Foreign-key relationships between tables.

use std::hash::{Hash, Hasher};

use crate::operator::CompareOp;
use crate::table::TableRef;

/// Declared relationship from the owning (left) table to a referenced table.
///
/// The referenced table is reached through a function pointer so tables may
/// reference each other (or themselves) without ordering their declarations.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKeyInfo {
    /// Relationship name, also the accessor name on the table proxy
    pub name: &'static str,
    /// Column of the owning table
    pub left_column: &'static str,
    /// Predicate operator, `=` unless declared otherwise
    pub op: CompareOp,
    /// Column of the referenced table
    pub right_column: &'static str,
    /// Referenced table
    pub right: fn() -> TableRef,
}

impl ForeignKeyInfo {
    pub const fn new(
        name: &'static str,
        left_column: &'static str,
        right: fn() -> TableRef,
        right_column: &'static str,
    ) -> Self {
        Self {
            name,
            left_column,
            op: CompareOp::Eq,
            right_column,
            right,
        }
    }

    /// Set the predicate operator.
    pub const fn op(mut self, op: CompareOp) -> Self {
        self.op = op;
        self
    }
}

/// A relationship as seen from a concrete left table.
///
/// Identity is (left table, right table, relationship name), so the same
/// relation is recognized no matter which query walked it.
#[derive(Debug, Clone, Copy)]
pub struct ForeignKey {
    pub left: TableRef,
    pub info: &'static ForeignKeyInfo,
}

impl ForeignKey {
    pub fn new(left: TableRef, info: &'static ForeignKeyInfo) -> Self {
        Self { left, info }
    }

    pub fn right(&self) -> TableRef {
        (self.info.right)()
    }

    pub fn name(&self) -> &'static str {
        self.info.name
    }
}

impl PartialEq for ForeignKey {
    fn eq(&self, other: &Self) -> bool {
        self.left == other.left && self.right() == other.right() && self.name() == other.name()
    }
}

impl Eq for ForeignKey {}

impl Hash for ForeignKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.left.hash(state);
        self.right().hash(state);
        self.name().hash(state);
    }
}
