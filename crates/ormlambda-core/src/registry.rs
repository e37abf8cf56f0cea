//! Schema registry owned by an engine.
//!
//! Tables are keyed by [`TableId`] (their Rust type), never by name, so two
//! schemas declaring a table with the same name cannot collide. The registry
//! also remembers every relationship path a statement has walked; the
//! per-statement part of that state is handled by [`StatementScope`].

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};
use std::thread::{self, ThreadId};

use indexmap::{IndexMap, IndexSet};

use crate::Result;
use crate::foreign_key::ForeignKey;
use crate::table::{Table, TableId, TableRef};

#[derive(Debug, Default)]
struct ScopeState {
    depth: usize,
    pending: Vec<String>,
}

/// Registered tables, their relationships and the walked-path cache.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    tables: RwLock<IndexMap<TableId, TableRef>>,
    relationships: RwLock<IndexSet<ForeignKey>>,
    renamed: RwLock<HashMap<TableId, String>>,
    walked: Mutex<IndexSet<String>>,
    scopes: Mutex<HashMap<ThreadId, ScopeState>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `T` and every table reachable through its relationships.
    pub fn register<T: Table>(&self) -> Result<()> {
        self.register_ref(TableRef::of::<T>())
    }

    /// Register a table by handle; a no-op if already registered.
    ///
    /// Declarations are validated here, before any statement can use them.
    pub fn register_ref(&self, table: TableRef) -> Result<()> {
        if self.contains(table.id()) {
            return Ok(());
        }
        table.meta().validate()?;

        self.tables
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.id(), table);
        tracing::debug!(table = table.name(), "registered table");

        for info in table.meta().foreign_keys {
            let fk = ForeignKey::new(table, info);
            self.relationships
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(fk);
            self.register_ref(fk.right())?;
        }
        Ok(())
    }

    pub fn contains(&self, id: TableId) -> bool {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&id)
    }

    /// Registered tables in registration order.
    pub fn tables(&self) -> Vec<TableRef> {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .copied()
            .collect()
    }

    /// Whether this exact relationship was declared by a registered table.
    pub fn has_relationship(&self, fk: &ForeignKey) -> bool {
        self.relationships
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(fk)
    }

    /// Relationships declared on `left`.
    pub fn relationships_of(&self, left: TableRef) -> Vec<ForeignKey> {
        self.relationships
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|fk| fk.left == left)
            .copied()
            .collect()
    }

    /// Name the table currently has in the database.
    ///
    /// This is the declared name unless the table was created under a
    /// different one (see [`SchemaRegistry::rename`]).
    pub fn table_name(&self, table: TableRef) -> String {
        self.renamed
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&table.id())
            .cloned()
            .unwrap_or_else(|| table.name().to_string())
    }

    /// Point `table` at a different physical name.
    pub fn rename(&self, table: TableRef, name: impl Into<String>) {
        let name = name.into();
        tracing::debug!(table = table.name(), renamed = %name, "table renamed");
        self.renamed
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(table.id(), name);
    }

    /// Every path key any committed statement has walked.
    pub fn walked_paths(&self) -> Vec<String> {
        lock(&self.walked).iter().cloned().collect()
    }

    /// Enter the compilation of one statement.
    ///
    /// Paths recorded through the scope are kept pending until
    /// [`StatementScope::commit`]; dropping the scope without committing
    /// discards them. A nested scope stashes the outer scope's pending paths
    /// and hands them back when it ends. Scopes on different threads are
    /// independent.
    pub fn enter_statement(&self) -> StatementScope<'_> {
        let thread = thread::current().id();
        let outer = self.with_scope(thread, |state| {
            state.depth += 1;
            if state.depth > 1 {
                Some(std::mem::take(&mut state.pending))
            } else {
                state.pending.clear();
                None
            }
        });
        StatementScope {
            registry: self,
            thread,
            outer,
            committed: false,
        }
    }

    fn with_scope<R>(&self, thread: ThreadId, f: impl FnOnce(&mut ScopeState) -> R) -> R {
        f(lock(&self.scopes).entry(thread).or_default())
    }
}

/// Scoped per-statement state; see [`SchemaRegistry::enter_statement`].
#[derive(Debug)]
pub struct StatementScope<'r> {
    registry: &'r SchemaRegistry,
    thread: ThreadId,
    outer: Option<Vec<String>>,
    committed: bool,
}

impl StatementScope<'_> {
    pub fn registry(&self) -> &SchemaRegistry {
        self.registry
    }

    /// Nesting depth of this scope, 1 for the outermost.
    pub fn depth(&self) -> usize {
        self.registry.with_scope(self.thread, |state| state.depth)
    }

    /// Note that the statement walked `path_key`.
    pub fn record_path(&self, path_key: String) {
        self.registry.with_scope(self.thread, |state| {
            if !state.pending.contains(&path_key) {
                state.pending.push(path_key);
            }
        });
    }

    /// Paths recorded so far in this scope.
    pub fn pending_paths(&self) -> Vec<String> {
        self.registry
            .with_scope(self.thread, |state| state.pending.clone())
    }

    /// Keep the recorded paths once the scope ends.
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for StatementScope<'_> {
    fn drop(&mut self) {
        let pending = {
            let mut scopes = lock(&self.registry.scopes);
            let state = scopes.entry(self.thread).or_default();
            let pending = std::mem::take(&mut state.pending);
            if let Some(outer) = self.outer.take() {
                state.pending = outer;
            }
            state.depth = state.depth.saturating_sub(1);
            if state.depth == 0 {
                scopes.remove(&self.thread);
            }
            pending
        };
        if self.committed && !pending.is_empty() {
            tracing::trace!(paths = ?pending, "caching walked relationship paths");
            lock(&self.registry.walked).extend(pending);
        }
    }
}
