//! Foreign-key traversal paths.
//!
//! A [`TablePath`] is the explicit replacement for an ambient "current
//! traversal" state: every proxy carries the chain of relationships walked to
//! reach it, so two expressions built side by side can never corrupt each
//! other's path.

use std::fmt;

use crate::foreign_key::{ForeignKey, ForeignKeyInfo};
use crate::table::TableRef;

/// Separator between segments of a path key.
pub const PATH_DELIMITER: char = '.';

/// An ordered sequence of relationship steps starting at a base table.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct TablePath {
    root: TableRef,
    steps: Vec<ForeignKey>,
}

impl TablePath {
    /// Path that stays on `table`.
    pub fn root(table: TableRef) -> Self {
        Self {
            root: table,
            steps: Vec::new(),
        }
    }

    /// New path extended by one relationship declared on the current table.
    pub fn traverse(&self, relationship: &'static ForeignKeyInfo) -> Self {
        let mut steps = self.steps.clone();
        steps.push(ForeignKey::new(self.table(), relationship));
        Self {
            root: self.root,
            steps,
        }
    }

    /// The table the path starts from.
    pub fn base(&self) -> TableRef {
        self.root
    }

    /// The table the path ends at.
    pub fn table(&self) -> TableRef {
        self.steps.last().map_or(self.root, ForeignKey::right)
    }

    pub fn steps(&self) -> &[ForeignKey] {
        &self.steps
    }

    pub fn is_root(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn depth(&self) -> usize {
        self.steps.len()
    }

    /// The path without its last step.
    pub fn parent(&self) -> Option<TablePath> {
        if self.steps.is_empty() {
            return None;
        }
        Some(Self {
            root: self.root,
            steps: self.steps[..self.steps.len() - 1].to_vec(),
        })
    }

    /// Every non-root prefix of this path, shortest first, ending with `self`.
    pub fn prefixes(&self) -> Vec<TablePath> {
        (1..=self.steps.len())
            .map(|len| Self {
                root: self.root,
                steps: self.steps[..len].to_vec(),
            })
            .collect()
    }

    /// Whether `other` is this path or one of its prefixes.
    pub fn starts_with(&self, other: &TablePath) -> bool {
        self.root == other.root
            && self.steps.len() >= other.steps.len()
            && self.steps[..other.steps.len()] == other.steps[..]
    }

    /// Registry key: base table name then each relationship name.
    ///
    /// ```text
    /// d.c.b.a
    /// ```
    pub fn key(&self) -> String {
        let mut key = self.root.name().to_string();
        for step in &self.steps {
            key.push(PATH_DELIMITER);
            key.push_str(step.name());
        }
        key
    }

    /// Relationship names walked, without the base table.
    pub fn relationship_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.steps.iter().map(ForeignKey::name)
    }
}

impl fmt::Debug for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TablePath({})", self.key())
    }
}

impl fmt::Display for TablePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}
