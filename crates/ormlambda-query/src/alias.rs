//! Per-statement alias memo.

use indexmap::IndexMap;
use ormlambda_core::{Error, ResolutionErrorKind, Result, TablePath};

/// Maps path keys to the SQL alias chosen for them.
///
/// An alias is derived from the path alone: the alias of the parent path,
/// an underscore, then the relationship name. The same path therefore
/// always gets the same alias, and two paths reaching one physical table
/// through different relationships always get different ones.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasContext {
    aliases: IndexMap<String, String>,
}

impl AliasContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fix the alias of a path key, typically a root path.
    ///
    /// Binding a key twice to the same alias is a no-op; binding it to a
    /// different alias, or binding an alias already used by another key, is
    /// an alias collision.
    pub fn bind(&mut self, key: impl Into<String>, alias: impl Into<String>) -> Result<()> {
        let key = key.into();
        let alias = alias.into();
        if let Some(existing) = self.aliases.get(&key) {
            if *existing == alias {
                return Ok(());
            }
            return Err(collision(
                &key,
                format!("'{}' is already aliased as '{}', not '{}'", key, existing, alias),
            ));
        }
        if let Some((other, _)) = self.aliases.iter().find(|(_, a)| **a == alias) {
            return Err(collision(
                &key,
                format!("alias '{}' is already used by '{}'", alias, other),
            ));
        }
        self.aliases.insert(key, alias);
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.aliases.get(key).map(String::as_str)
    }

    /// Alias for `path`, minting it (and its ancestors') on first use.
    ///
    /// The root of `path` must already be bound.
    pub fn alias_for(&mut self, path: &TablePath) -> Result<String> {
        let key = path.key();
        if let Some(alias) = self.aliases.get(&key) {
            return Ok(alias.clone());
        }
        let Some(parent) = path.parent() else {
            return Err(Error::resolution(
                ResolutionErrorKind::UnreachableTable,
                Some(key),
                "the table is neither the statement's base table nor explicitly joined",
            ));
        };
        let parent_alias = self.alias_for(&parent)?;
        let step = path.relationship_names().last().unwrap_or_default();
        let alias = format!("{}_{}", parent_alias, step);
        tracing::trace!(path = %key, alias = %alias, "minted join alias");
        self.bind(key, alias.clone())?;
        Ok(alias)
    }

    /// Fold another context into this one.
    pub fn merge(&mut self, other: &AliasContext) -> Result<()> {
        for (key, alias) in &other.aliases {
            self.bind(key.clone(), alias.clone())?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.aliases.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

fn collision(key: &str, message: String) -> Error {
    Error::resolution(
        ResolutionErrorKind::AliasCollision,
        Some(key.to_string()),
        message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::D;
    use ormlambda_core::{Table, TableProxy};

    #[test]
    fn test_aliases_follow_the_path() {
        let d = D::proxy();
        let mut ctx = AliasContext::new();
        ctx.bind("d", "d").unwrap();

        let alias = ctx.alias_for(d.c().b().a().path()).unwrap();
        assert_eq!(alias, "d_c_b_a");
        assert_eq!(ctx.get("d.c"), Some("d_c"));
        assert_eq!(ctx.get("d.c.b"), Some("d_c_b"));
        assert_eq!(ctx.len(), 4);

        assert_eq!(ctx.alias_for(d.c().b().a().path()).unwrap(), alias);
    }

    #[test]
    fn test_unbound_root_is_unreachable() {
        let mut ctx = AliasContext::new();
        let err = ctx.alias_for(D::proxy().c().path()).unwrap_err();
        assert_eq!(
            err.resolution_kind(),
            Some(ResolutionErrorKind::UnreachableTable)
        );
    }

    #[test]
    fn test_merge_detects_collisions() {
        let mut left = AliasContext::new();
        left.bind("d", "d").unwrap();

        let mut same = AliasContext::new();
        same.bind("d", "d").unwrap();
        assert!(left.merge(&same).is_ok());

        let mut renamed = AliasContext::new();
        renamed.bind("d", "other").unwrap();
        let err = left.merge(&renamed).unwrap_err();
        assert_eq!(
            err.resolution_kind(),
            Some(ResolutionErrorKind::AliasCollision)
        );

        let mut stolen = AliasContext::new();
        stolen.bind("a", "d").unwrap();
        assert!(left.merge(&stolen).is_err());
    }
}
