//! Compile-time validation for the Table derive macro.
//!
//! Declaration mistakes are reported here, with spans pointing at the
//! offending struct, field or attribute, instead of surfacing at query time.

use std::collections::HashSet;

use proc_macro2::Span;
use syn::{Error, Type};

use crate::parse::{FieldDef, TableDef, option_inner};

/// Validate a parsed table definition.
///
/// Performs all validations and returns combined errors if any issues are found.
/// This allows reporting multiple problems at once rather than failing on the first.
pub fn validate_table(table: &TableDef) -> Result<(), Error> {
    let mut errors = Vec::new();

    validate_not_generic(table, &mut errors);
    validate_has_fields(table, &mut errors);
    match &table.table_name {
        Some(name) => validate_identifier("table name", &name.value(), name.span(), &mut errors),
        None => errors.push(Error::new(
            table.name.span(),
            "missing table name; add #[ormlambda(table = \"...\")] to the struct",
        )),
    }
    validate_no_duplicate_columns(table, &mut errors);

    for field in &table.fields {
        validate_field(field, &mut errors);
    }

    validate_single_primary_key(table, &mut errors);
    validate_foreign_keys(table, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        let mut combined = errors.remove(0);
        for err in errors {
            combined.combine(err);
        }
        Err(combined)
    }
}

fn validate_not_generic(table: &TableDef, errors: &mut Vec<Error>) {
    if !table.generics.params.is_empty() {
        errors.push(Error::new_spanned(
            &table.generics,
            "Table cannot be derived for generic structs; table metadata is static",
        ));
    }
}

fn validate_has_fields(table: &TableDef, errors: &mut Vec<Error>) {
    if table.column_fields().next().is_none() {
        errors.push(Error::new(
            table.name.span(),
            "Table struct must have at least one column",
        ));
    }
}

/// Names must be plain SQL identifiers: a letter or underscore followed by
/// letters, digits or underscores.
fn validate_identifier(what: &str, name: &str, span: Span, errors: &mut Vec<Error>) {
    if name.trim().is_empty() {
        errors.push(Error::new(span, format!("{what} cannot be empty")));
        return;
    }
    let mut chars = name.chars();
    if let Some(first) = chars.next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            errors.push(Error::new(
                span,
                format!("{what} must start with a letter or underscore, got '{first}'"),
            ));
            return;
        }
    }
    if let Some(bad) = chars.find(|c| !c.is_ascii_alphanumeric() && *c != '_') {
        errors.push(Error::new(
            span,
            format!(
                "{what} contains invalid character '{bad}'; \
                 only letters, digits and underscores are allowed"
            ),
        ));
    }
}

fn validate_no_duplicate_columns(table: &TableDef, errors: &mut Vec<Error>) {
    let mut seen: HashSet<&str> = HashSet::new();
    for field in table.column_fields() {
        if !seen.insert(&field.column_name) {
            errors.push(Error::new(
                field.name.span(),
                format!(
                    "duplicate column name '{}'; another field already maps to this column",
                    field.column_name
                ),
            ));
        }
    }
}

fn validate_single_primary_key(table: &TableDef, errors: &mut Vec<Error>) {
    let mut pks = table.column_fields().filter(|f| f.primary_key);
    if pks.next().is_some() {
        for extra in pks {
            errors.push(Error::new(
                extra.name.span(),
                "only one column may be marked primary_key",
            ));
        }
    }
}

fn validate_field(field: &FieldDef, errors: &mut Vec<Error>) {
    let span = field.name.span();
    if field.skip {
        if field.primary_key || field.auto_increment || field.auto_generated || field.unique {
            errors.push(Error::new(
                span,
                "a skipped field is not a column and cannot carry column flags",
            ));
        }
        return;
    }

    validate_identifier("column name", &field.column_name, span, errors);
    validate_type(&field.ty, span, errors);

    if field.auto_increment && field.auto_generated {
        errors.push(Error::new(
            span,
            "auto_increment and auto_generated are exclusive; an auto-generated column is never written",
        ));
    }
}

fn validate_type(ty: &Type, span: Span, errors: &mut Vec<Error>) {
    if option_inner(ty).is_some_and(|inner| option_inner(inner).is_some()) {
        errors.push(Error::new(
            span,
            "nested Option<Option<T>> is ambiguous and not supported; \
             use a single Option<T> or a custom type",
        ));
    }

    if matches!(ty, Type::Reference(_)) {
        errors.push(Error::new(
            span,
            "reference types (&T) are not supported; use owned types instead",
        ));
    }

    if matches!(ty, Type::Ptr(_)) {
        errors.push(Error::new(
            span,
            "raw pointer types (*const T, *mut T) are not supported; use owned types instead",
        ));
    }
}

fn validate_foreign_keys(table: &TableDef, errors: &mut Vec<Error>) {
    let mut names: HashSet<String> = HashSet::new();
    for fk in &table.foreign_keys {
        let name = fk.name.value();
        validate_identifier("relationship name", &name, fk.name.span(), errors);

        if !names.insert(name.clone()) {
            errors.push(Error::new(
                fk.span,
                format!("relationship '{name}' is declared twice"),
            ));
        }
        // The accessor shares the proxy's namespace with column accessors.
        if table.column_fields().any(|f| f.name == name) {
            errors.push(Error::new(
                fk.name.span(),
                format!("relationship '{name}' has the same name as a field"),
            ));
        }
        if !table.column_fields().any(|f| f.column_name == fk.left.value()) {
            errors.push(Error::new(
                fk.left.span(),
                format!(
                    "relationship '{}' uses unknown local column '{}'",
                    name,
                    fk.left.value()
                ),
            ));
        }
        if let Some(op) = &fk.op {
            if crate::infer::join_operator(&op.value()).is_none() {
                errors.push(Error::new(
                    op.span(),
                    format!("'{}' cannot join tables; use =, !=, <, <=, > or >=", op.value()),
                ));
            }
        }
    }
}
